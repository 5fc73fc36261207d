/// モック分類アダプタ
///
/// テスト・開発用の分類モック実装。
/// 常に固定ラベルで分類成功を返す。

use crate::domain::{Classification, ClassifyPort, DomainResult, PixelBuffer, PixelFormat};
use std::collections::BTreeMap;

/// モック分類アダプタ
pub struct MockClassifyAdapter {
    input_format: PixelFormat,
}

impl MockClassifyAdapter {
    /// モック結果のラベル
    pub const LABEL: &'static str = "mock";

    /// 新しいモック分類アダプタを作成
    pub fn new() -> Self {
        Self {
            input_format: PixelFormat::default(),
        }
    }

    /// 期待する入力フォーマットを指定
    #[allow(dead_code)]
    pub fn with_input_format(mut self, format: PixelFormat) -> Self {
        self.input_format = format;
        self
    }
}

impl Default for MockClassifyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifyPort for MockClassifyAdapter {
    fn classify(&mut self, buffer: &PixelBuffer) -> DomainResult<Classification> {
        // モック実装: バッファ内容は見ず、固定結果を返す
        #[cfg(debug_assertions)]
        tracing::debug!(
            "MockClassify: {}x{} {} buffer",
            buffer.width(),
            buffer.height(),
            buffer.format().as_str()
        );
        #[cfg(not(debug_assertions))]
        let _ = buffer;

        let mut probabilities = BTreeMap::new();
        probabilities.insert(Self::LABEL.to_string(), 1.0);

        Ok(Classification::new(Self::LABEL, 1.0, probabilities))
    }

    fn input_format(&self) -> PixelFormat {
        self.input_format
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_always_succeeds() {
        let buffer = PixelBuffer::allocate(PixelFormat::Bgra32, 2, 2, 64).unwrap();
        let mut classifier = MockClassifyAdapter::new();

        let result = classifier.classify(&buffer).unwrap();
        assert_eq!(result.label, MockClassifyAdapter::LABEL);
        assert_eq!(result.confidence, 1.0);
    }
}
