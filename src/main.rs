mod domain;
mod logging;
mod application;
mod infrastructure;

use crate::application::pipeline::{PipelineConfig, PipelineRunner};
use crate::domain::config::AppConfig;
use crate::domain::ports::{CameraPort, ClassifyPort, ConvertPort}; // traitメソッド使用のため
use crate::domain::{AuthorizationStatus, DomainError, PixelFormat};
use crate::infrastructure::classify_selector::ClassifySelector;
use crate::infrastructure::convert::ImageConvertAdapter;
use crate::infrastructure::mock_camera::MockCameraAdapter;
use crate::logging::init_logging;
use std::path::PathBuf;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("snaplabel starting...");

    // 初期化処理を実行
    match run() {
        Ok(_) => {
            tracing::info!("snaplabel terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    // 設定の検証
    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Camera: {}x{}, pattern={:?}",
        config.camera.width,
        config.camera.height,
        config.camera.pattern
    );

    let pixel_format = PixelFormat::from(config.converter.pixel_format);
    tracing::info!(
        "Converter: format={}, row_alignment={}",
        pixel_format.as_str(),
        config.converter.row_alignment
    );
    tracing::info!("Classifier: mode={}", config.classifier.mode.as_str());

    // モックカメラアダプタの初期化（実デバイスのセッションは外部コラボレータ）
    tracing::info!("Initializing mock camera adapter...");
    let mut camera = MockCameraAdapter::from_config(&config.camera);

    // カメラアクセスの認可チェック（拒否はクラッシュではなくResultで伝播）
    match camera.authorization_status() {
        AuthorizationStatus::Authorized => {}
        AuthorizationStatus::NotDetermined => {
            if !camera.request_access()? {
                return Err(DomainError::PermissionDenied.into());
            }
        }
        AuthorizationStatus::Denied => {
            return Err(DomainError::PermissionDenied.into());
        }
    }

    // 変換アダプタの初期化
    let converter = ImageConvertAdapter::new(pixel_format, config.converter.row_alignment);

    // 分類アダプタの初期化（変換器の出力フォーマットをそのまま入力契約にする）
    let classifier = ClassifySelector::from_config(&config.classifier, converter.output_format());
    tracing::info!("Classifier backend: {}", classifier.backend_name());

    // パイプライン設定
    let pipeline_config = PipelineConfig {
        stats_interval: config.pipeline.stats_interval(),
        result_timeout: config.pipeline.result_timeout(),
    };

    tracing::info!("Starting pipeline worker...");
    let handle = PipelineRunner::new(camera, converter, classifier, pipeline_config).start()?;

    // 撮影→評価の1サイクルを実行
    handle.take_photo()?;
    tracing::info!("Photo taken");

    let evaluation = handle.evaluate()?;
    tracing::info!(
        "Result: label={}, confidence={:.3}, latency={:.2}ms",
        evaluation.classification.label,
        evaluation.classification.confidence,
        evaluation.latency().as_secs_f64() * 1000.0
    );
    for (label, probability) in &evaluation.classification.probabilities {
        tracing::info!("  {}: {:.3}", label, probability);
    }

    handle.shutdown()?;

    Ok(())
}
