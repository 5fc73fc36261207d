/// モックカメラアダプタ
///
/// テスト・開発用のカメラモック実装。合成テストパターンをPNGに
/// エンコードして撮影写真として返す。実デバイスのセッション管理は
/// 行わないが、認可・セッション開始/停止の契約は実装と同じに振る舞う。

use crate::domain::{
    config::{CameraConfig, TestPattern},
    AuthorizationStatus, CameraPort, CapturedPhoto, DomainError, DomainResult,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::Cursor;

/// モックカメラアダプタ
pub struct MockCameraAdapter {
    width: u32,
    height: u32,
    pattern: TestPattern,
    solid_color: [u8; 3],
    authorization: AuthorizationStatus,
    running: bool,
    shot_count: u64,
}

impl MockCameraAdapter {
    /// 新しいモックカメラを作成（認可済み状態）
    pub fn new(width: u32, height: u32, pattern: TestPattern, solid_color: [u8; 3]) -> Self {
        Self {
            width,
            height,
            pattern,
            solid_color,
            authorization: AuthorizationStatus::Authorized,
            running: false,
            shot_count: 0,
        }
    }

    /// カメラ設定からモックカメラを作成
    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.width, config.height, config.pattern, config.solid_color)
    }

    /// 初期の認可ステータスを指定（認可フローのテスト用）
    #[allow(dead_code)]
    pub fn with_authorization(mut self, status: AuthorizationStatus) -> Self {
        self.authorization = status;
        self
    }

    /// これまでの撮影枚数
    #[allow(dead_code)]
    pub fn shot_count(&self) -> u64 {
        self.shot_count
    }

    /// テストパターンの1フレームを合成
    fn render_pattern(&self) -> DynamicImage {
        let [r, g, b] = self.solid_color;
        match self.pattern {
            TestPattern::Solid => {
                DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                    self.width,
                    self.height,
                    Rgba([r, g, b, 255]),
                ))
            }
            TestPattern::Gradient => {
                let (w, h) = (self.width.max(1), self.height.max(1));
                DynamicImage::ImageRgba8(RgbaImage::from_fn(self.width, self.height, |x, y| {
                    Rgba([
                        (x * 255 / w) as u8,
                        (y * 255 / h) as u8,
                        ((x + y) * 255 / (w + h)) as u8,
                        255,
                    ])
                }))
            }
        }
    }
}

impl CameraPort for MockCameraAdapter {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.authorization
    }

    fn request_access(&mut self) -> DomainResult<bool> {
        match self.authorization {
            AuthorizationStatus::Authorized => Ok(true),
            AuthorizationStatus::NotDetermined => {
                // モック実装: 要求は常に許可される
                self.authorization = AuthorizationStatus::Authorized;
                Ok(true)
            }
            AuthorizationStatus::Denied => Ok(false),
        }
    }

    fn start_session(&mut self) -> DomainResult<()> {
        if self.authorization != AuthorizationStatus::Authorized {
            return Err(DomainError::PermissionDenied);
        }
        self.running = true;

        #[cfg(debug_assertions)]
        tracing::debug!("MockCamera: session started ({}x{})", self.width, self.height);

        Ok(())
    }

    fn stop_session(&mut self) -> DomainResult<()> {
        self.running = false;

        #[cfg(debug_assertions)]
        tracing::debug!("MockCamera: session stopped");

        Ok(())
    }

    fn capture_photo(&mut self) -> DomainResult<CapturedPhoto> {
        if !self.running {
            return Err(DomainError::Capture("session is not running".to_string()));
        }

        let frame = self.render_pattern();
        let mut encoded = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .map_err(|e| DomainError::Capture(format!("failed to encode photo: {}", e)))?;

        self.shot_count += 1;

        #[cfg(debug_assertions)]
        tracing::debug!("MockCamera: captured photo #{} ({} bytes)", self.shot_count, encoded.len());

        Ok(CapturedPhoto::new(encoded))
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_requires_running_session() {
        let mut camera = MockCameraAdapter::new(4, 4, TestPattern::Solid, [255, 0, 0]);
        assert!(matches!(
            camera.capture_photo(),
            Err(DomainError::Capture(_))
        ));

        camera.start_session().unwrap();
        assert!(camera.is_running());
        assert!(camera.capture_photo().is_ok());
        assert_eq!(camera.shot_count(), 1);
    }

    #[test]
    fn test_captured_photo_decodes_to_pattern() {
        let mut camera = MockCameraAdapter::new(3, 2, TestPattern::Solid, [0, 255, 0]);
        camera.start_session().unwrap();

        let photo = camera.capture_photo().unwrap();
        let decoded = image::load_from_memory(&photo.data).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 1).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_authorization_flow() {
        let mut camera = MockCameraAdapter::new(2, 2, TestPattern::Solid, [0, 0, 0])
            .with_authorization(AuthorizationStatus::NotDetermined);

        // 未認可のままセッションは開始できない
        assert!(matches!(
            camera.start_session(),
            Err(DomainError::PermissionDenied)
        ));

        assert!(camera.request_access().unwrap());
        assert_eq!(camera.authorization_status(), AuthorizationStatus::Authorized);
        assert!(camera.start_session().is_ok());
    }

    #[test]
    fn test_denied_access_stays_denied() {
        let mut camera = MockCameraAdapter::new(2, 2, TestPattern::Solid, [0, 0, 0])
            .with_authorization(AuthorizationStatus::Denied);

        assert!(!camera.request_access().unwrap());
        assert_eq!(camera.authorization_status(), AuthorizationStatus::Denied);
    }

    #[test]
    fn test_stop_session() {
        let mut camera = MockCameraAdapter::new(2, 2, TestPattern::Gradient, [0, 0, 0]);
        camera.start_session().unwrap();
        camera.stop_session().unwrap();
        assert!(!camera.is_running());
        assert!(camera.capture_photo().is_err());
    }
}
