//! Capture on/off state. The webview owns the actual media stream; Rust
//! decides whether the frame loop keeps running and what to request.

use serde::Serialize;

pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    pub capturing: bool,
}

/// What the frontend must do with the media stream after a toggle.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub capturing: bool,
    pub width: u32,
    pub height: u32,
    /// Stop every track of the current stream
    pub release_tracks: bool,
}

impl CameraState {
    pub fn toggle(&mut self) -> CaptureRequest {
        self.set_capturing(!self.capturing)
    }

    pub fn set_capturing(&mut self, capturing: bool) -> CaptureRequest {
        let was_capturing = self.capturing;
        self.capturing = capturing;
        CaptureRequest {
            capturing,
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            release_tracks: was_capturing && !capturing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_off_releases_tracks() {
        let mut camera = CameraState::default();

        let on = camera.toggle();
        assert!(on.capturing);
        assert!(!on.release_tracks);
        assert_eq!((on.width, on.height), (640, 480));

        let off = camera.toggle();
        assert!(!off.capturing);
        assert!(off.release_tracks);
    }

    #[test]
    fn disabling_while_off_releases_nothing() {
        let mut camera = CameraState::default();
        assert!(!camera.set_capturing(false).release_tracks);
    }
}
