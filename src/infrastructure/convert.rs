/// 画像→ピクセルバッファ変換アダプタ
///
/// デコード済み静止画を、下流の分類ルーチンが期待する固定レイアウトの
/// 生ピクセルバッファへ再エンコードする。デフォルトは32bit BGRA
/// （pre-multiplied-first、リトルエンディアン、メモリ上はB,G,R,Aの順）。
///
/// 1回の呼び出しで1つのバッファを確保し、描画して返すだけの同期処理。
/// 呼び出しをまたぐ状態を持たないため、別スレッドからの並行呼び出しは
/// 競合しない。変換処理自体はログを出さない。

use crate::domain::{
    CapturedPhoto, ConvertPort, DomainError, DomainResult, PixelBuffer, PixelFormat,
};
use image::{DynamicImage, GenericImageView};

/// 画像→ピクセルバッファ変換アダプタ
pub struct ImageConvertAdapter {
    format: PixelFormat,
    row_alignment: usize,
}

impl ImageConvertAdapter {
    /// 新しい変換アダプタを作成
    ///
    /// # Arguments
    /// - `format`: 出力ピクセルフォーマット
    /// - `row_alignment`: 行ストライドのアライメント（2の冪、バイト）
    pub fn new(format: PixelFormat, row_alignment: usize) -> Self {
        Self {
            format,
            row_alignment,
        }
    }

    /// デコード済み画像をピクセルバッファへ変換する
    ///
    /// # Steps
    /// 1. `width × height` のバッファを確保（ゼロ次元・オーバーフローは
    ///    `Allocation` エラー、確保は一度きりでフォールバックなし）
    /// 2. バッキングメモリへの排他的書き込みスコープを取得
    /// 3. 全行を書き切る（チャンネル並べ替え + Bgra32はアルファ事前乗算）
    /// 4. スコープを抜けてアクセスを解放し、バッファを返す
    ///
    /// # Result guarantees
    /// 成功時、バッファの寸法は入力画像と一致し、全ピクセルが書き込み済み
    /// （部分的に書かれた行は観測できない）。
    pub fn convert_image(&self, image: &DynamicImage) -> DomainResult<PixelBuffer> {
        let (width, height) = image.dimensions();

        let mut buffer = PixelBuffer::allocate(self.format, width, height, self.row_alignment)?;

        let rgba = image.to_rgba8();
        let src = rgba.as_raw();
        let src_row_bytes = width as usize * 4;

        {
            // 排他的書き込み区間。早期リターンを含む全経路でスコープ終了時に解放される。
            let mut plane = buffer.plane_mut();
            for y in 0..height {
                let src_row =
                    &src[y as usize * src_row_bytes..(y as usize + 1) * src_row_bytes];
                Self::write_row(self.format, src_row, plane.row_mut(y));
            }
        }

        Ok(buffer)
    }

    /// RGBA行を出力フォーマットの1行へ描画する
    fn write_row(format: PixelFormat, src_row: &[u8], dst_row: &mut [u8]) {
        match format {
            PixelFormat::Bgra32 => {
                for (dst, px) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                    let a = px[3];
                    dst[0] = premultiply(px[2], a); // B
                    dst[1] = premultiply(px[1], a); // G
                    dst[2] = premultiply(px[0], a); // R
                    dst[3] = a;
                }
            }
            PixelFormat::Rgba32 => {
                dst_row.copy_from_slice(&src_row[..dst_row.len()]);
            }
            PixelFormat::Bgr24 => {
                for (dst, px) in dst_row.chunks_exact_mut(3).zip(src_row.chunks_exact(4)) {
                    dst[0] = px[2]; // B
                    dst[1] = px[1]; // G
                    dst[2] = px[0]; // R
                }
            }
        }
    }
}

impl Default for ImageConvertAdapter {
    fn default() -> Self {
        Self::new(PixelFormat::default(), PixelBuffer::DEFAULT_ROW_ALIGNMENT)
    }
}

impl ConvertPort for ImageConvertAdapter {
    fn convert(&self, photo: &CapturedPhoto) -> DomainResult<PixelBuffer> {
        // 画像ハンドルが壊れている場合は強制アンラップではなくDecodeエラーを返す
        let image = image::load_from_memory(&photo.data)
            .map_err(|e| DomainError::Decode(format!("failed to decode photo: {}", e)))?;

        self.convert_image(&image)
    }

    fn output_format(&self) -> PixelFormat {
        self.format
    }
}

/// アルファ事前乗算（四捨五入付き）
#[inline]
fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}
