//! The surface's link to its native host.
//!
//! A [`HostLink`] is whatever physically carries frames between the surface
//! and the host: a webview's `postMessage` channel, a pipe, or an in-process
//! queue. The bridge only needs to know whether a host is present, how to
//! post a frame, and, for hosts that pair replies natively, how to await one.

use std::rc::Rc;

use canopy_common::{BridgeError, Reply};
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use tokio::sync::mpsc;

pub type ReplyFuture = LocalBoxFuture<'static, Result<Reply, BridgeError>>;

pub trait HostLink {
    /// Checked on every access: a host can attach or detach over the
    /// surface's lifetime (e.g. across a reload).
    fn is_attached(&self) -> bool;

    /// Post one serialized frame to the host.
    fn post(&self, frame: String) -> Result<(), BridgeError>;

    /// Whether [`HostLink::request`] pairs replies with requests itself.
    fn supports_direct_reply(&self) -> bool {
        false
    }

    /// Post a call frame and await the host's reply on its own channel.
    fn request(&self, frame: String) -> ReplyFuture {
        let _ = frame;
        future::ready(Err(BridgeError::TransportUnavailable)).boxed_local()
    }
}

/// The link used when the surface runs without any host, e.g. in isolated
/// tests or a plain browser tab.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl HostLink for DetachedHost {
    fn is_attached(&self) -> bool {
        false
    }

    fn post(&self, _frame: String) -> Result<(), BridgeError> {
        Err(BridgeError::TransportUnavailable)
    }
}

/// Host link over an unbounded channel. The host side owns the receiver;
/// dropping it detaches the host.
#[derive(Debug, Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelHost {
    pub fn new() -> (Rc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Rc::new(Self { tx }), rx)
    }
}

impl HostLink for ChannelHost {
    fn is_attached(&self) -> bool {
        !self.tx.is_closed()
    }

    fn post(&self, frame: String) -> Result<(), BridgeError> {
        self.tx
            .send(frame)
            .map_err(|_| BridgeError::TransportUnavailable)
    }
}
