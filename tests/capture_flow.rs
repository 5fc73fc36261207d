//! 撮影フロー統合テスト
//!
//! モックカメラ → 変換 → 分類のend-to-endテスト。
//! 実デバイス・実モデルは不要で、CI環境でも常に実行される。

use snaplabel::application::pipeline::{PipelineConfig, PipelineRunner};
use snaplabel::domain::config::{AppConfig, ClassifierMode, TestPattern};
use snaplabel::domain::ports::{CameraPort, ClassifyPort, ConvertPort};
use snaplabel::domain::{DomainError, PixelFormat};
use snaplabel::infrastructure::classify_selector::ClassifySelector;
use snaplabel::infrastructure::color_classify::{LABEL_DARK, LABEL_RED};
use snaplabel::infrastructure::convert::ImageConvertAdapter;
use snaplabel::infrastructure::mock_camera::MockCameraAdapter;

/// 設定からパイプライン一式を構築（main.rsと同じ配線）
fn build_pipeline(config: &AppConfig) -> snaplabel::application::pipeline::PipelineHandle {
    let camera = MockCameraAdapter::from_config(&config.camera);
    let converter = ImageConvertAdapter::new(
        PixelFormat::from(config.converter.pixel_format),
        config.converter.row_alignment,
    );
    let classifier = ClassifySelector::from_config(&config.classifier, converter.output_format());

    PipelineRunner::new(
        camera,
        converter,
        classifier,
        PipelineConfig {
            stats_interval: config.pipeline.stats_interval(),
            result_timeout: config.pipeline.result_timeout(),
        },
    )
    .start()
    .expect("pipeline should start")
}

#[test]
fn test_default_config_classifies_red_pattern() {
    // デフォルト設定: 640x480の赤単色パターン、BGRA32、色プロファイル分類
    let config = AppConfig::default();
    config.validate().unwrap();

    let handle = build_pipeline(&config);

    handle.take_photo().unwrap();
    assert!(handle.session().is_taken());

    let evaluation = handle.evaluate().unwrap();
    assert_eq!(evaluation.classification.label, LABEL_RED);
    assert!(evaluation.classification.confidence > 0.9);
    assert!(handle.session().is_evaluated());

    handle.shutdown().unwrap();
}

#[test]
fn test_black_pattern_is_dark() {
    let mut config = AppConfig::default();
    config.camera.width = 16;
    config.camera.height = 16;
    config.camera.solid_color = [0, 0, 0];

    let handle = build_pipeline(&config);
    handle.take_photo().unwrap();

    let evaluation = handle.evaluate().unwrap();
    assert_eq!(evaluation.classification.label, LABEL_DARK);

    handle.shutdown().unwrap();
}

#[test]
fn test_mock_classifier_backend() {
    let mut config = AppConfig::default();
    config.camera.width = 8;
    config.camera.height = 8;
    config.camera.pattern = TestPattern::Gradient;
    config.classifier.mode = ClassifierMode::Mock;

    let handle = build_pipeline(&config);
    handle.take_photo().unwrap();

    let evaluation = handle.evaluate().unwrap();
    assert_eq!(evaluation.classification.label, "mock");

    handle.shutdown().unwrap();
}

#[test]
fn test_rgba_format_flows_through_pipeline() {
    // 変換器の出力フォーマットを分類器の入力契約として配線するため、
    // bgra32以外でもパイプラインは成立する
    let mut config = AppConfig::default();
    config.camera.width = 32;
    config.camera.height = 32;
    config.converter.pixel_format = snaplabel::domain::config::PixelFormatConfig::Rgba32;

    let handle = build_pipeline(&config);
    handle.take_photo().unwrap();

    let evaluation = handle.evaluate().unwrap();
    assert_eq!(evaluation.classification.label, LABEL_RED);

    handle.shutdown().unwrap();
}

#[test]
fn test_repeated_cycles_are_deterministic() {
    let mut config = AppConfig::default();
    config.camera.width = 16;
    config.camera.height = 16;

    let handle = build_pipeline(&config);

    handle.take_photo().unwrap();
    let first = handle.evaluate().unwrap();

    handle.retake().unwrap();
    handle.take_photo().unwrap();
    let second = handle.evaluate().unwrap();

    // 同一パターンの撮影・評価は同一の分類結果になる
    assert_eq!(first.classification, second.classification);

    handle.shutdown().unwrap();
}

#[test]
fn test_converted_buffer_matches_capture_dimensions() {
    // ポート単位の結合: カメラが返した写真を変換すると、
    // バッファの寸法は撮影解像度と一致し、ストライドは width*4 以上になる
    let mut camera = MockCameraAdapter::new(100, 50, TestPattern::Gradient, [0, 0, 0]);
    camera.start_session().unwrap();
    let photo = camera.capture_photo().unwrap();

    let converter = ImageConvertAdapter::default();
    let buffer = converter.convert(&photo).unwrap();

    assert_eq!(buffer.width(), 100);
    assert_eq!(buffer.height(), 50);
    assert_eq!(buffer.format(), PixelFormat::Bgra32);
    assert!(buffer.bytes_per_row() >= 400);
}

#[test]
fn test_corrupt_photo_surfaces_decode_error() {
    let converter = ImageConvertAdapter::default();
    let photo = snaplabel::domain::CapturedPhoto::new(vec![0; 16]);

    assert!(matches!(
        converter.convert(&photo),
        Err(DomainError::Decode(_))
    ));
}

#[test]
fn test_classifier_format_contract_is_enforced() {
    // 分類器が宣言した入力フォーマットと異なるバッファは拒否される
    let mut classifier = ClassifySelector::from_config(
        &snaplabel::domain::config::ClassifierConfig::default(),
        PixelFormat::Bgra32,
    );

    let buffer =
        snaplabel::domain::PixelBuffer::allocate(PixelFormat::Bgr24, 4, 4, 64).unwrap();
    assert!(matches!(
        classifier.classify(&buffer),
        Err(DomainError::Classify(_))
    ));
}
