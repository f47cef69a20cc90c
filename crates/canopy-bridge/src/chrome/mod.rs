//! Declarative native chrome.
//!
//! Call sites declare chrome elements (a title bar, a toolbar, a sheet named
//! "settings") as layers on a stack. The stack folds into one effective state
//! that is transmitted to the host's native reconciler as a
//! `chrome.setState` call.

pub mod areas;
mod element;
mod stack;
mod sync;


pub use element::{AreaKey, ElementDescriptor};
pub use stack::{LayerId, LayerStack};
pub use sync::ChromeSync;
