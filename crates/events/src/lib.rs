//! Fellowship portal event bus and session context.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PortalEvent`] -- the domain event envelope.
//! - [`PortalContexts`] -- per-identity profile context, kept current by
//!   [`ContextListener`] from session and profile events.

pub mod bus;
pub mod context;

pub use bus::{EventBus, PortalEvent};
pub use context::{ContextListener, PortalContext, PortalContexts};
