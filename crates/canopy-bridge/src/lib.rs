//! Surface-side bridge between embedded web content and its native host.
//!
//! A [`BridgeSession`] owns everything one render surface needs:
//!
//! - **transport**: fire-and-forget sends and request/reply calls to the host
//! - **router**: host-pushed events fanned out to typed and wildcard handlers
//! - **chrome**: layered declarations of native chrome, flushed once per burst
//! - **broker**: parent/child/broadcast messaging between surfaces
//!
//! ```rust,no_run
//! use canopy_bridge::{chrome::areas, BridgeSession, ChannelHost};
//! use serde_json::json;
//!
//! let (host, _frames) = ChannelHost::new();
//! let session = BridgeSession::create(host);
//!
//! let title = session.declare([areas::title_bar(json!({ "text": "Inbox" }))]);
//! session.run_microtasks();
//! title.dispose();
//! ```

pub mod broker;
pub mod chrome;
pub mod disposer;
pub mod host;
pub mod identity;
pub mod relay;
pub mod router;
pub mod scheduler;
pub mod session;
pub mod testing;
pub mod transport;

pub use broker::{MessagingBroker, RelayLink};
pub use chrome::{ChromeSync, ElementDescriptor, LayerId};
pub use disposer::Disposer;
pub use host::{ChannelHost, DetachedHost, HostLink};
pub use identity::{SurfaceIdentity, SURFACE_ENV};
pub use relay::RelayConnection;
pub use router::{BridgeEvent, CallbackSlots, EventRouter, Handler, WILDCARD};
pub use scheduler::{LocalTaskScheduler, MicrotaskQueue, Scheduler};
pub use session::{BridgeSession, SessionBuilder};
pub use transport::{CallFuture, Transport};
