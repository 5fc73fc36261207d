//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult, PixelFormat};

/// 分類バックエンド
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierMode {
    /// 色プロファイル分類（チャンネル平均による主要色ラベル付け）
    #[default]
    ColorProfile,
    /// モック分類（常に固定結果を返す、テスト・開発用）
    Mock,
}

impl ClassifierMode {
    /// ログ・設定表示用の名前
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColorProfile => "color-profile",
            Self::Mock => "mock",
        }
    }
}

/// ピクセルバッファの出力フォーマット（設定値）
///
/// 下流の分類バックエンドが期待するチャンネル順に合わせて選択する。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormatConfig {
    /// 32bit BGRA、pre-multiplied-firstアルファ、リトルエンディアン（デフォルト）
    #[default]
    Bgra32,
    /// 32bit RGBA、ストレートアルファ
    Rgba32,
    /// 24bit BGR、アルファなし
    Bgr24,
}

impl From<PixelFormatConfig> for PixelFormat {
    fn from(value: PixelFormatConfig) -> Self {
        match value {
            PixelFormatConfig::Bgra32 => PixelFormat::Bgra32,
            PixelFormatConfig::Rgba32 => PixelFormat::Rgba32,
            PixelFormatConfig::Bgr24 => PixelFormat::Bgr24,
        }
    }
}

/// モックカメラが生成するテストパターン
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestPattern {
    /// 単色（solid_colorで指定）
    #[default]
    Solid,
    /// 対角グラデーション
    Gradient,
}

/// アプリケーション設定のルート構造
#[allow(dead_code)]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// カメラ設定
    #[serde(default)]
    pub camera: CameraConfig,
    /// ピクセルバッファ変換設定
    #[serde(default)]
    pub converter: ConverterConfig,
    /// 分類設定
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// パイプライン設定
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// カメラ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CameraConfig {
    /// 撮影静止画の幅（ピクセル）
    ///
    /// デフォルト: 640
    pub width: u32,

    /// 撮影静止画の高さ（ピクセル）
    ///
    /// デフォルト: 480
    pub height: u32,

    /// モックカメラのテストパターン
    ///
    /// 選択肢: "solid", "gradient"
    /// デフォルト: "solid"
    #[serde(default)]
    pub pattern: TestPattern,

    /// 単色パターンの色（RGB、各0-255）
    ///
    /// デフォルト: [255, 0, 0]（赤）
    #[serde(default = "default_solid_color")]
    pub solid_color: [u8; 3],
}

fn default_solid_color() -> [u8; 3] {
    CameraConfig::DEFAULT_SOLID_COLOR
}

impl CameraConfig {
    /// デフォルトの撮影解像度（幅）
    pub const DEFAULT_WIDTH: u32 = 640;
    /// デフォルトの撮影解像度（高さ）
    pub const DEFAULT_HEIGHT: u32 = 480;
    /// 受け付ける最大解像度（片辺）
    pub const MAX_DIMENSION: u32 = 8192;
    /// デフォルトの単色パターン色（赤）
    pub const DEFAULT_SOLID_COLOR: [u8; 3] = [255, 0, 0];
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            pattern: TestPattern::default(),
            solid_color: Self::DEFAULT_SOLID_COLOR,
        }
    }
}

/// ピクセルバッファ変換設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConverterConfig {
    /// 出力ピクセルフォーマット
    ///
    /// 選択肢: "bgra32", "rgba32", "bgr24"
    /// デフォルト: "bgra32"
    #[serde(default)]
    pub pixel_format: PixelFormatConfig,

    /// 行ストライドのアライメント（バイト、2の冪であること）
    ///
    /// デフォルト: 64
    #[serde(default = "default_row_alignment")]
    pub row_alignment: usize,
}

fn default_row_alignment() -> usize {
    ConverterConfig::DEFAULT_ROW_ALIGNMENT
}

impl ConverterConfig {
    /// デフォルトの行アライメント（バイト）
    pub const DEFAULT_ROW_ALIGNMENT: usize = 64;
    /// 受け付ける最大アライメント（バイト）
    pub const MAX_ROW_ALIGNMENT: usize = 4096;
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormatConfig::default(),
            row_alignment: Self::DEFAULT_ROW_ALIGNMENT,
        }
    }
}

/// 分類設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifierConfig {
    /// 分類バックエンド
    ///
    /// 選択肢: "color-profile", "mock"
    /// デフォルト: "color-profile"
    #[serde(default)]
    pub mode: ClassifierMode,

    /// 最小信頼度（これ未満のトップ確率は "uncertain" ラベルになる）
    ///
    /// デフォルト: 0.25
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_min_confidence() -> f32 {
    ClassifierConfig::DEFAULT_MIN_CONFIDENCE
}

impl ClassifierConfig {
    /// デフォルトの最小信頼度
    pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::default(),
            min_confidence: Self::DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// パイプライン設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// 統計出力間隔（秒）
    ///
    /// デフォルト: 10
    #[serde(default = "default_stats_interval_sec")]
    pub stats_interval_sec: u64,

    /// 評価結果待ちのタイムアウト（ミリ秒）
    ///
    /// デフォルト: 5000
    #[serde(default = "default_result_timeout_ms")]
    pub result_timeout_ms: u64,
}

fn default_stats_interval_sec() -> u64 {
    PipelineConfig::DEFAULT_STATS_INTERVAL_SEC
}

fn default_result_timeout_ms() -> u64 {
    PipelineConfig::DEFAULT_RESULT_TIMEOUT_MS
}

impl PipelineConfig {
    /// デフォルトの統計出力間隔（秒）
    pub const DEFAULT_STATS_INTERVAL_SEC: u64 = 10;
    /// デフォルトの結果待ちタイムアウト（ミリ秒）
    pub const DEFAULT_RESULT_TIMEOUT_MS: u64 = 5000;

    #[allow(dead_code)]
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec)
    }

    #[allow(dead_code)]
    pub fn result_timeout(&self) -> Duration {
        Duration::from_millis(self.result_timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_interval_sec: Self::DEFAULT_STATS_INTERVAL_SEC,
            result_timeout_ms: Self::DEFAULT_RESULT_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    ///
    /// # Arguments
    /// - `path`: config.tomlのパス
    ///
    /// # Returns
    /// - `Ok(AppConfig)`: 読み込み成功
    /// - `Err(DomainError::Configuration)`: ファイル読み込み・パース失敗
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DomainError::Configuration(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("failed to parse config: {}", e)))
    }

    /// 設定値の妥当性を検証
    ///
    /// # Returns
    /// - `Ok(())`: すべての設定値が妥当
    /// - `Err(DomainError::Configuration)`: 不正な設定値
    pub fn validate(&self) -> DomainResult<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(DomainError::Configuration(format!(
                "camera dimensions must be positive, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        if self.camera.width > CameraConfig::MAX_DIMENSION
            || self.camera.height > CameraConfig::MAX_DIMENSION
        {
            return Err(DomainError::Configuration(format!(
                "camera dimensions exceed {} px",
                CameraConfig::MAX_DIMENSION
            )));
        }

        if self.converter.row_alignment == 0 || !self.converter.row_alignment.is_power_of_two() {
            return Err(DomainError::Configuration(format!(
                "converter.row_alignment must be a power of two, got {}",
                self.converter.row_alignment
            )));
        }
        if self.converter.row_alignment > ConverterConfig::MAX_ROW_ALIGNMENT {
            return Err(DomainError::Configuration(format!(
                "converter.row_alignment exceeds {} bytes",
                ConverterConfig::MAX_ROW_ALIGNMENT
            )));
        }

        if !(0.0..=1.0).contains(&self.classifier.min_confidence) {
            return Err(DomainError::Configuration(format!(
                "classifier.min_confidence must be within [0, 1], got {}",
                self.classifier.min_confidence
            )));
        }

        if self.pipeline.result_timeout_ms == 0 {
            return Err(DomainError::Configuration(
                "pipeline.result_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
