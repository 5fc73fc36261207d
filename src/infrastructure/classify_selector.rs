//! 分類アダプタのセレクタ（実行時選択用）
//!
//! ビルド時のfeatureフラグではなく、実行時に設定で分類方式を選択するための列挙型。
//! vtableのオーバーヘッドを避けるため、trait objectではなくenumでディスパッチ。

use crate::domain::{
    config::{ClassifierConfig, ClassifierMode},
    Classification, ClassifyPort, DomainResult, PixelBuffer, PixelFormat,
};
use crate::infrastructure::color_classify::ColorProfileClassifyAdapter;
use crate::infrastructure::mock_classify::MockClassifyAdapter;

/// 分類アダプタの選択
pub enum ClassifySelector {
    /// 色プロファイル分類（チャンネル平均による主要色ラベル付け）
    ColorProfile(ColorProfileClassifyAdapter),
    /// モック分類（固定結果、テスト・開発用）
    Mock(MockClassifyAdapter),
}

impl ClassifySelector {
    /// 設定から分類アダプタを構築
    ///
    /// # Arguments
    /// - `config`: 分類設定
    /// - `input_format`: 変換器が出力するピクセルフォーマット
    pub fn from_config(config: &ClassifierConfig, input_format: PixelFormat) -> Self {
        match config.mode {
            ClassifierMode::ColorProfile => Self::ColorProfile(ColorProfileClassifyAdapter::new(
                input_format,
                config.min_confidence,
            )),
            ClassifierMode::Mock => {
                Self::Mock(MockClassifyAdapter::new().with_input_format(input_format))
            }
        }
    }

    /// 色プロファイルバックエンドか
    #[allow(dead_code)]
    pub fn is_color_profile(&self) -> bool {
        matches!(self, Self::ColorProfile(_))
    }

    /// モックバックエンドか
    #[allow(dead_code)]
    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }
}

impl ClassifyPort for ClassifySelector {
    fn classify(&mut self, buffer: &PixelBuffer) -> DomainResult<Classification> {
        match self {
            Self::ColorProfile(adapter) => adapter.classify(buffer),
            Self::Mock(adapter) => adapter.classify(buffer),
        }
    }

    fn input_format(&self) -> PixelFormat {
        match self {
            Self::ColorProfile(adapter) => adapter.input_format(),
            Self::Mock(adapter) => adapter.input_format(),
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::ColorProfile(adapter) => adapter.backend_name(),
            Self::Mock(adapter) => adapter.backend_name(),
        }
    }
}
