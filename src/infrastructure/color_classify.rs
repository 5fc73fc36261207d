/// 色プロファイル分類アダプタ
///
/// ピクセルバッファのチャンネル平均から主要色を推定し、ラベルと
/// クラス別確率を返す分類バックエンド。事前学習モデルの差し替え先と
/// 同じ契約（バッファ1つを受け取りClassificationを返す）で動く。
///
/// 入力はバッファが宣言するフォーマットのまま解釈する。ストライドは
/// 行アクセサ経由で尊重され、`width * bytes_per_pixel` とは仮定しない。

use crate::domain::{
    Classification, ClassifyPort, DomainError, DomainResult, PixelBuffer, PixelFormat,
};
use std::collections::BTreeMap;

/// 分類クラスのラベル
pub const LABEL_RED: &str = "red";
pub const LABEL_GREEN: &str = "green";
pub const LABEL_BLUE: &str = "blue";
pub const LABEL_DARK: &str = "dark";
/// トップ確率がmin_confidence未満の場合のラベル
pub const LABEL_UNCERTAIN: &str = "uncertain";

/// 色プロファイル分類アダプタ
pub struct ColorProfileClassifyAdapter {
    expected_format: PixelFormat,
    min_confidence: f32,
}

impl ColorProfileClassifyAdapter {
    /// ほぼ黒と見なすチャンネル平均合計の閾値
    const DARK_THRESHOLD: f64 = 1.0;

    /// 新しい色プロファイル分類アダプタを作成
    ///
    /// # Arguments
    /// - `expected_format`: 受け付ける入力フォーマット
    /// - `min_confidence`: トップ確率がこれ未満なら "uncertain" を返す
    pub fn new(expected_format: PixelFormat, min_confidence: f32) -> Self {
        Self {
            expected_format,
            min_confidence,
        }
    }

    /// バッファ全体のRGBチャンネル平均を計算
    ///
    /// バッファのフォーマットに従ってチャンネル位置を解釈する。
    fn channel_means(buffer: &PixelBuffer) -> (f64, f64, f64) {
        let bpp = buffer.format().bytes_per_pixel();
        // フォーマットごとの (R, G, B) バイトオフセット
        let (ri, gi, bi) = match buffer.format() {
            PixelFormat::Bgra32 => (2, 1, 0),
            PixelFormat::Rgba32 => (0, 1, 2),
            PixelFormat::Bgr24 => (2, 1, 0),
        };

        let mut sum_r = 0u64;
        let mut sum_g = 0u64;
        let mut sum_b = 0u64;

        for y in 0..buffer.height() {
            for px in buffer.row(y).chunks_exact(bpp) {
                sum_r += px[ri] as u64;
                sum_g += px[gi] as u64;
                sum_b += px[bi] as u64;
            }
        }

        let count = buffer.width() as f64 * buffer.height() as f64;
        (
            sum_r as f64 / count,
            sum_g as f64 / count,
            sum_b as f64 / count,
        )
    }
}

impl ClassifyPort for ColorProfileClassifyAdapter {
    fn classify(&mut self, buffer: &PixelBuffer) -> DomainResult<Classification> {
        if buffer.format() != self.expected_format {
            return Err(DomainError::Classify(format!(
                "expected {} input, got {}",
                self.expected_format.as_str(),
                buffer.format().as_str()
            )));
        }

        let (mean_r, mean_g, mean_b) = Self::channel_means(buffer);
        let total = mean_r + mean_g + mean_b;

        let mut probabilities = BTreeMap::new();

        if total < Self::DARK_THRESHOLD {
            probabilities.insert(LABEL_RED.to_string(), 0.0);
            probabilities.insert(LABEL_GREEN.to_string(), 0.0);
            probabilities.insert(LABEL_BLUE.to_string(), 0.0);
            probabilities.insert(LABEL_DARK.to_string(), 1.0);
            return Ok(Classification::new(LABEL_DARK, 1.0, probabilities));
        }

        let p_r = (mean_r / total) as f32;
        let p_g = (mean_g / total) as f32;
        let p_b = (mean_b / total) as f32;

        probabilities.insert(LABEL_RED.to_string(), p_r);
        probabilities.insert(LABEL_GREEN.to_string(), p_g);
        probabilities.insert(LABEL_BLUE.to_string(), p_b);
        probabilities.insert(LABEL_DARK.to_string(), 0.0);

        let (label, confidence) = [(LABEL_RED, p_r), (LABEL_GREEN, p_g), (LABEL_BLUE, p_b)]
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((LABEL_UNCERTAIN, 0.0));

        if confidence < self.min_confidence {
            return Ok(Classification::new(LABEL_UNCERTAIN, confidence, probabilities));
        }

        Ok(Classification::new(label, confidence, probabilities))
    }

    fn input_format(&self) -> PixelFormat {
        self.expected_format
    }

    fn backend_name(&self) -> &'static str {
        "color-profile"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_buffer(format: PixelFormat, width: u32, height: u32, pixel: &[u8]) -> PixelBuffer {
        let mut buffer = PixelBuffer::allocate(format, width, height, 64).unwrap();
        {
            let mut plane = buffer.plane_mut();
            for y in 0..height {
                for dst in plane.row_mut(y).chunks_exact_mut(pixel.len()) {
                    dst.copy_from_slice(pixel);
                }
            }
        }
        buffer
    }

    #[test]
    fn test_classifies_solid_red_bgra() {
        let buffer = solid_buffer(PixelFormat::Bgra32, 4, 4, &[0, 0, 255, 255]);
        let mut classifier = ColorProfileClassifyAdapter::new(PixelFormat::Bgra32, 0.25);

        let result = classifier.classify(&buffer).unwrap();
        assert_eq!(result.label, LABEL_RED);
        assert!((result.confidence - 1.0).abs() < 1e-6);
        assert!((result.probabilities[LABEL_RED] - 1.0).abs() < 1e-6);
        assert_eq!(result.probabilities[LABEL_GREEN], 0.0);
    }

    #[test]
    fn test_classifies_solid_blue_rgba() {
        let buffer = solid_buffer(PixelFormat::Rgba32, 2, 2, &[0, 0, 200, 255]);
        let mut classifier = ColorProfileClassifyAdapter::new(PixelFormat::Rgba32, 0.25);

        let result = classifier.classify(&buffer).unwrap();
        assert_eq!(result.label, LABEL_BLUE);
    }

    #[test]
    fn test_black_buffer_is_dark() {
        let buffer = solid_buffer(PixelFormat::Bgra32, 4, 4, &[0, 0, 0, 255]);
        let mut classifier = ColorProfileClassifyAdapter::new(PixelFormat::Bgra32, 0.25);

        let result = classifier.classify(&buffer).unwrap();
        assert_eq!(result.label, LABEL_DARK);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_gray_buffer_is_uncertain() {
        // 均等な灰色は各チャンネル確率1/3 → min_confidence 0.5では不確定
        let buffer = solid_buffer(PixelFormat::Bgra32, 4, 4, &[128, 128, 128, 255]);
        let mut classifier = ColorProfileClassifyAdapter::new(PixelFormat::Bgra32, 0.5);

        let result = classifier.classify(&buffer).unwrap();
        assert_eq!(result.label, LABEL_UNCERTAIN);
        assert!(result.confidence < 0.5);
    }

    #[test]
    fn test_rejects_format_mismatch() {
        let buffer = solid_buffer(PixelFormat::Rgba32, 2, 2, &[1, 2, 3, 4]);
        let mut classifier = ColorProfileClassifyAdapter::new(PixelFormat::Bgra32, 0.25);

        assert!(matches!(
            classifier.classify(&buffer),
            Err(DomainError::Classify(_))
        ));
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let buffer = solid_buffer(PixelFormat::Bgra32, 3, 3, &[50, 100, 150, 255]);
        let mut classifier = ColorProfileClassifyAdapter::new(PixelFormat::Bgra32, 0.0);

        let result = classifier.classify(&buffer).unwrap();
        let sum: f32 = result.probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }
}
