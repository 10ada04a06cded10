//! AR/VR overlay: camera stream ownership and mode exclusivity.

use foundation::Generation;
use tracing::{debug, info, warn};

use crate::error::CameraError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    None,
    Ar,
    Vr,
}

/// An acquired camera stream. Tracks hold the hardware until stopped.
pub trait MediaStream {
    fn stop_tracks(&mut self);
    fn live_tracks(&self) -> usize;
}

/// Asynchronous rear-camera acquisition. The outcome is handed back through
/// [`OverlayController::camera_result`] with the same `ticket`.
pub trait CameraSource {
    fn request_rear_camera(&mut self, ticket: Generation);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CameraStatus {
    #[default]
    Idle,
    Requesting,
    Streaming,
    Failed(CameraError),
}

pub struct OverlayController {
    camera: Box<dyn CameraSource>,
    mode: OverlayMode,
    status: CameraStatus,
    stream: Option<Box<dyn MediaStream>>,
    ticket: Generation,
    requests: u64,
}

impl OverlayController {
    pub fn new(camera: Box<dyn CameraSource>) -> Self {
        Self {
            camera,
            mode: OverlayMode::None,
            status: CameraStatus::Idle,
            stream: None,
            ticket: Generation::default(),
            requests: 0,
        }
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn status(&self) -> &CameraStatus {
        &self.status
    }

    /// Camera acquisitions issued so far.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn live_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.live_tracks())
    }

    /// Switches to `mode`, closing whatever overlay was open. Returns whether
    /// anything changed.
    pub fn open(&mut self, mode: OverlayMode) -> bool {
        if mode == self.mode {
            return false;
        }
        self.close();
        self.mode = mode;
        info!(?mode, "overlay opened");
        if mode == OverlayMode::Ar {
            self.request();
        }
        true
    }

    /// Stops every camera track, whether or not acquisition completed.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
        }
        // Invalidates any acquisition still pending.
        self.ticket = self.ticket.next();
        self.status = CameraStatus::Idle;
        if self.mode != OverlayMode::None {
            debug!(mode = ?self.mode, "overlay closed");
        }
        self.mode = OverlayMode::None;
    }

    /// Applies an acquisition outcome. A stream arriving for a closed or
    /// replaced request is stopped on the spot.
    pub fn camera_result(
        &mut self,
        ticket: Generation,
        result: Result<Box<dyn MediaStream>, CameraError>,
    ) -> bool {
        if ticket != self.ticket || self.mode != OverlayMode::Ar {
            debug!(ticket = ticket.get(), "discarding stale camera result");
            if let Ok(mut stream) = result {
                stream.stop_tracks();
            }
            return false;
        }
        match result {
            Ok(stream) => {
                self.stream = Some(stream);
                self.status = CameraStatus::Streaming;
            }
            Err(err) => {
                warn!(%err, "camera acquisition failed");
                self.status = CameraStatus::Failed(err);
            }
        }
        true
    }

    /// Re-requests the camera after a failure in AR mode.
    pub fn retry(&mut self) -> bool {
        if self.mode != OverlayMode::Ar || !matches!(self.status, CameraStatus::Failed(_)) {
            return false;
        }
        self.ticket = self.ticket.next();
        self.request();
        true
    }

    fn request(&mut self) {
        self.status = CameraStatus::Requesting;
        self.requests += 1;
        self.camera.request_rear_camera(self.ticket);
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraStatus, OverlayController, OverlayMode};
    use crate::error::CameraError;
    use crate::testing::{FakeStream, RecordingCamera};

    #[test]
    fn ar_replaces_vr_with_one_camera_request() {
        let camera = RecordingCamera::new();
        let mut overlay = OverlayController::new(Box::new(camera.clone()));
        assert!(overlay.open(OverlayMode::Vr));
        assert_eq!(camera.tickets().len(), 0);

        assert!(overlay.open(OverlayMode::Ar));
        assert_eq!(overlay.mode(), OverlayMode::Ar);
        assert_eq!(camera.tickets().len(), 1);
        assert_eq!(overlay.status(), &CameraStatus::Requesting);
    }

    #[test]
    fn vr_replaces_ar_and_stops_tracks() {
        let camera = RecordingCamera::new();
        let mut overlay = OverlayController::new(Box::new(camera.clone()));
        overlay.open(OverlayMode::Ar);
        let (stream, live) = FakeStream::new(2);
        assert!(overlay.camera_result(camera.last_ticket(), Ok(Box::new(stream))));
        assert_eq!(overlay.live_tracks(), 2);

        overlay.open(OverlayMode::Vr);
        assert_eq!(live.get(), 0);
        assert_eq!(overlay.mode(), OverlayMode::Vr);
    }

    #[test]
    fn close_without_acquisition_is_harmless() {
        let mut overlay = OverlayController::new(Box::new(RecordingCamera::new()));
        overlay.close();
        overlay.open(OverlayMode::Ar);
        overlay.close();
        overlay.close();
        assert_eq!(overlay.live_tracks(), 0);
        assert_eq!(overlay.mode(), OverlayMode::None);
    }

    #[test]
    fn late_stream_after_close_is_stopped() {
        let camera = RecordingCamera::new();
        let mut overlay = OverlayController::new(Box::new(camera.clone()));
        overlay.open(OverlayMode::Ar);
        let ticket = camera.last_ticket();
        overlay.close();

        let (stream, live) = FakeStream::new(1);
        assert!(!overlay.camera_result(ticket, Ok(Box::new(stream))));
        assert_eq!(live.get(), 0);
        assert_eq!(overlay.live_tracks(), 0);
    }

    #[test]
    fn denied_permission_can_be_retried() {
        let camera = RecordingCamera::new();
        let mut overlay = OverlayController::new(Box::new(camera.clone()));
        overlay.open(OverlayMode::Ar);
        overlay.camera_result(camera.last_ticket(), Err(CameraError::PermissionDenied));
        assert_eq!(
            overlay.status(),
            &CameraStatus::Failed(CameraError::PermissionDenied)
        );

        assert!(overlay.retry());
        assert_eq!(camera.tickets().len(), 2);
        let (stream, _live) = FakeStream::new(1);
        assert!(overlay.camera_result(camera.last_ticket(), Ok(Box::new(stream))));
        assert_eq!(overlay.status(), &CameraStatus::Streaming);
    }

    #[test]
    fn retry_is_ignored_unless_failed() {
        let mut overlay = OverlayController::new(Box::new(RecordingCamera::new()));
        assert!(!overlay.retry());
        overlay.open(OverlayMode::Ar);
        assert!(!overlay.retry());
    }
}
