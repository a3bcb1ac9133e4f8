//! Per-identity portal context.
//!
//! A [`PortalContext`] holds what the service needs to know about a
//! signed-in identity (its profile, hence role and onboarding state). It is
//! created when the identity signs in and dropped when it signs out;
//! [`ContextListener`] applies those lifecycle events from the bus.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fellowship_core::profile::{Profile, PROFILES_TABLE};
use fellowship_core::roles::Role;
use fellowship_platform::{PlatformClient, PlatformError, RowQuery};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::bus::{PortalEvent, PROFILE_UPDATED, SESSION_SIGNED_IN, SESSION_SIGNED_OUT};

#[derive(Debug, Clone)]
pub struct PortalContext {
    pub user_id: Uuid,
    pub email: String,
    /// `None` when the identity has no profile row yet.
    pub profile: Option<Profile>,
    pub loaded_at: DateTime<Utc>,
}

impl PortalContext {
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().and_then(Profile::portal_role)
    }

    /// Onboarding flag; `None` when there is no profile.
    pub fn onboarding_completed(&self) -> Option<bool> {
        self.profile.as_ref().map(|p| p.onboarding_completed)
    }
}

/// Load the profile row for `user_id`, if any.
pub async fn fetch_profile(
    platform: &dyn PlatformClient,
    user_id: Uuid,
) -> Result<Option<Profile>, PlatformError> {
    let rows = platform
        .select(
            PROFILES_TABLE,
            &RowQuery::new().eq("id", user_id.to_string()).page(1, 0),
        )
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Shared map of live contexts keyed by platform user id.
#[derive(Clone, Default)]
pub struct PortalContexts {
    inner: Arc<RwLock<HashMap<Uuid, PortalContext>>>,
}

impl PortalContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: Uuid) -> Option<PortalContext> {
        self.inner.read().await.get(&user_id).cloned()
    }

    pub async fn insert(&self, context: PortalContext) {
        self.inner.write().await.insert(context.user_id, context);
    }

    /// Drop the context; returns whether one existed.
    pub async fn remove(&self, user_id: Uuid) -> bool {
        self.inner.write().await.remove(&user_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Build a fresh context from the platform without caching it.
    pub async fn load(
        platform: &dyn PlatformClient,
        user_id: Uuid,
        email: &str,
    ) -> Result<PortalContext, PlatformError> {
        let profile = fetch_profile(platform, user_id).await?;
        Ok(PortalContext {
            user_id,
            email: email.to_string(),
            profile,
            loaded_at: Utc::now(),
        })
    }

    /// Cached context, or load and cache it.
    ///
    /// Covers requests that race ahead of the sign-in event, and tokens
    /// issued before the service started.
    pub async fn resolve(
        &self,
        platform: &dyn PlatformClient,
        user_id: Uuid,
        email: &str,
    ) -> Result<PortalContext, PlatformError> {
        if let Some(context) = self.get(user_id).await {
            return Ok(context);
        }
        let context = Self::load(platform, user_id, email).await?;
        self.insert(context.clone()).await;
        Ok(context)
    }
}

/// Background task applying session and profile events to [`PortalContexts`].
pub struct ContextListener;

impl ContextListener {
    /// Run until the bus is dropped.
    pub async fn run(
        platform: Arc<dyn PlatformClient>,
        contexts: PortalContexts,
        mut receiver: broadcast::Receiver<PortalEvent>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::apply(platform.as_ref(), &contexts, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to apply event to portal context"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Context listener lagged, some events were skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, context listener shutting down");
                    break;
                }
            }
        }
    }

    /// Apply one event. Events without an actor are ignored.
    pub async fn apply(
        platform: &dyn PlatformClient,
        contexts: &PortalContexts,
        event: &PortalEvent,
    ) -> Result<(), PlatformError> {
        let Some(user_id) = event.actor_user_id else {
            return Ok(());
        };

        match event.event_type.as_str() {
            SESSION_SIGNED_IN => {
                // The sign-in request may already have resolved it.
                if contexts.get(user_id).await.is_none() {
                    let email = event.payload["email"].as_str().unwrap_or_default();
                    let context = PortalContexts::load(platform, user_id, email).await?;
                    tracing::debug!(user_id = %user_id, has_profile = context.profile.is_some(), "Portal context initialized");
                    contexts.insert(context).await;
                }
            }
            SESSION_SIGNED_OUT => {
                if contexts.remove(user_id).await {
                    tracing::debug!(user_id = %user_id, "Portal context torn down");
                }
            }
            PROFILE_UPDATED => {
                // Only refresh identities that are signed in.
                if let Some(existing) = contexts.get(user_id).await {
                    let context = PortalContexts::load(platform, user_id, &existing.email).await?;
                    contexts.insert(context).await;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBus, APPLICATION_SUBMITTED};
    use fellowship_platform::InMemoryPlatform;
    use serde_json::json;

    fn platform_with_profile(role: &str, onboarded: bool) -> (Arc<InMemoryPlatform>, Uuid) {
        let platform = Arc::new(InMemoryPlatform::new("secret"));
        let id = Uuid::new_v4();
        platform.seed(
            PROFILES_TABLE,
            json!({
                "id": id.to_string(),
                "email": "fellow@example.org",
                "role": role,
                "onboarding_completed": onboarded,
            }),
        );
        (platform, id)
    }

    fn signed_in(id: Uuid) -> PortalEvent {
        PortalEvent::new(SESSION_SIGNED_IN)
            .with_actor(id)
            .with_payload(json!({ "email": "fellow@example.org" }))
    }

    #[tokio::test]
    async fn sign_in_then_sign_out_lifecycle() {
        let (platform, id) = platform_with_profile("fellow", true);
        let contexts = PortalContexts::new();

        ContextListener::apply(platform.as_ref(), &contexts, &signed_in(id))
            .await
            .unwrap();
        let context = contexts.get(id).await.expect("context after sign-in");
        assert_eq!(context.role(), Some(Role::Fellow));
        assert_eq!(context.onboarding_completed(), Some(true));

        let out = PortalEvent::new(SESSION_SIGNED_OUT).with_actor(id);
        ContextListener::apply(platform.as_ref(), &contexts, &out)
            .await
            .unwrap();
        assert!(contexts.get(id).await.is_none());
    }

    #[tokio::test]
    async fn missing_profile_yields_no_role() {
        let platform = InMemoryPlatform::new("secret");
        let contexts = PortalContexts::new();
        let id = Uuid::new_v4();

        let context = contexts.resolve(&platform, id, "new@example.org").await.unwrap();
        assert!(context.profile.is_none());
        assert_eq!(context.role(), None);
        assert_eq!(context.onboarding_completed(), None);
        assert_eq!(contexts.len().await, 1);
    }

    #[tokio::test]
    async fn profile_update_refreshes_signed_in_identity() {
        let (platform, id) = platform_with_profile("fellow", false);
        let contexts = PortalContexts::new();
        ContextListener::apply(platform.as_ref(), &contexts, &signed_in(id))
            .await
            .unwrap();

        platform
            .update(
                PROFILES_TABLE,
                &RowQuery::new().eq("id", id.to_string()),
                json!({ "onboarding_completed": true }),
            )
            .await
            .unwrap();
        let updated = PortalEvent::new(PROFILE_UPDATED).with_actor(id);
        ContextListener::apply(platform.as_ref(), &contexts, &updated)
            .await
            .unwrap();

        let context = contexts.get(id).await.unwrap();
        assert_eq!(context.onboarding_completed(), Some(true));
    }

    #[tokio::test]
    async fn listener_drains_bus_until_closed() {
        let (platform, id) = platform_with_profile("alumni", true);
        let contexts = PortalContexts::new();
        let bus = EventBus::default();
        let rx = bus.subscribe();

        bus.publish(PortalEvent::new(APPLICATION_SUBMITTED));
        bus.publish(signed_in(id));
        drop(bus);

        ContextListener::run(platform, contexts.clone(), rx).await;
        assert_eq!(contexts.get(id).await.unwrap().role(), Some(Role::Alumni));
    }
}
