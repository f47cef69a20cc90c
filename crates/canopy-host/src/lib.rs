//! Native-host side of the canopy bridge.
//!
//! The host owns the physical surfaces. [`HostBridge`] maps logical surface
//! names to [`SurfaceHandle`]s, answers calls coming from each surface,
//! routes broker messages between surfaces and hands every surface's
//! effective chrome state to a [`ChromeReconciler`].

pub mod dispatch;
pub mod reconcile;
pub mod registry;
pub mod surface;

pub use dispatch::{HostBridge, MethodHandler};
pub use reconcile::{AreaRenderer, ChromeReconciler, StateDiff, TrackingReconciler};
pub use registry::SurfaceRegistry;
pub use surface::SurfaceHandle;
