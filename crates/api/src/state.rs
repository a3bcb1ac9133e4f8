use std::sync::Arc;

use fellowship_cache::{Analytics, ApplicationMirror, LocalStore};
use fellowship_events::bus::APPLICATION_SUBMITTED;
use fellowship_events::{EventBus, PortalContexts, PortalEvent};
use fellowship_pipeline::{IntakeSessions, SubmissionPipeline};
use fellowship_platform::PlatformClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// External platform (rows, storage, functions, auth).
    pub platform: Arc<dyn PlatformClient>,
    /// In-progress application forms.
    pub sessions: IntakeSessions,
    /// Local copy of submitted applications.
    pub mirror: ApplicationMirror,
    /// Page-view and visitor counters.
    pub analytics: Analytics,
    /// Event bus for session and submission events.
    pub event_bus: Arc<EventBus>,
    /// Per-identity profile context.
    pub contexts: PortalContexts,
}

impl AppState {
    /// Wire the intake pipeline and its completion hook around the given
    /// platform and local store.
    pub fn new(
        config: ServerConfig,
        platform: Arc<dyn PlatformClient>,
        store: Arc<dyn LocalStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mirror = ApplicationMirror::new(Arc::clone(&store));
        let analytics = Analytics::new(store);

        let pipeline = SubmissionPipeline::new(
            Arc::clone(&platform),
            mirror.clone(),
            config.platform.storage_bucket.clone(),
            config.intake.confirmation_function.clone(),
            config.intake.settle_delay,
        );

        let bus = Arc::clone(&event_bus);
        let sessions = IntakeSessions::new(Arc::new(pipeline)).with_completion_hook(Arc::new(
            move |summary| {
                let mut event = PortalEvent::new(APPLICATION_SUBMITTED).with_payload(
                    serde_json::json!({
                        "session_id": summary.session_id,
                        "variant": summary.variant,
                        "email": summary.email,
                        "full_name": summary.full_name,
                    }),
                );
                if let Some(id) = &summary.record_id {
                    event = event.with_source("application", id.clone());
                }
                bus.publish(event);
            },
        ));

        Self {
            config: Arc::new(config),
            platform,
            sessions,
            mirror,
            analytics,
            event_bus,
            contexts: PortalContexts::new(),
        }
    }
}
