use canopy_common::HostError;

/// The host's handle on one physical render surface (a webview, a window's
/// content view). Frames pushed here reach that surface's bridge session.
pub trait SurfaceHandle {
    /// Deliver one serialized frame to the surface.
    fn push(&self, frame: &str) -> Result<(), HostError>;

    /// `false` once the surface has been torn down on the native side.
    fn is_open(&self) -> bool {
        true
    }
}
