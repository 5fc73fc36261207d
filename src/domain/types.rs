/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// すべての処理で共有される不変の型。

use std::collections::BTreeMap;
use std::time::Instant;

use crate::domain::{DomainError, DomainResult};

/// ピクセルバッファの出力フォーマット
///
/// 下流の推論ルーチンが期待するチャンネル順・ビット深度は
/// バックエンドごとに異なるため、ハードコード定数ではなく
/// 列挙型で明示的に指定する。デフォルトはBgra32。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32bit BGRA、pre-multiplied-firstアルファ、リトルエンディアン
    /// （メモリ上のバイト順: B, G, R, A）
    #[default]
    Bgra32,
    /// 32bit RGBA、ストレートアルファ
    Rgba32,
    /// 24bit BGR、アルファなし
    Bgr24,
}

impl PixelFormat {
    /// 1ピクセルあたりのバイト数
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Bgra32 | Self::Rgba32 => 4,
            Self::Bgr24 => 3,
        }
    }

    /// アルファチャンネルを持つか
    #[allow(dead_code)]
    pub fn has_alpha(&self) -> bool {
        !matches!(self, Self::Bgr24)
    }

    /// ログ・設定表示用の名前
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bgra32 => "bgra32",
            Self::Rgba32 => "rgba32",
            Self::Bgr24 => "bgr24",
        }
    }
}

/// 変換済みピクセルバッファ
///
/// 幅×高さの密なピクセルブロック。行ストライド（bytes_per_row）は
/// 確保時にアライメント込みで決定されるため、`width * bytes_per_pixel`
/// より大きい場合がある。消費側は必ずbytes_per_rowを使うこと。
///
/// 所有権: 変換器が確保して呼び出し側に返し、以後は呼び出し側が所有する。
/// 呼び出しをまたぐ共有状態はない（プーリング・再利用なし）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    bytes_per_row: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// デフォルトの行アライメント（バイト）
    ///
    /// CVPixelBuffer等のプラットフォーム実装が返すストライドに合わせ、
    /// 64バイト境界に切り上げる。
    pub const DEFAULT_ROW_ALIGNMENT: usize = 64;

    /// 新しいピクセルバッファを確保
    ///
    /// # Arguments
    /// - `format`: ピクセルフォーマット
    /// - `width`, `height`: ピクセル単位の寸法（どちらも正であること）
    /// - `row_alignment`: 行ストライドのアライメント（2の冪、バイト）
    ///
    /// # Returns
    /// - `Ok(PixelBuffer)`: ゼロ初期化済みバッファ
    /// - `Err(DomainError::Allocation)`: ゼロ次元、不正アライメント、サイズ計算オーバーフロー
    ///
    /// 確保は一度きり。失敗時のリトライやフォーマットのフォールバックは行わない。
    pub fn allocate(
        format: PixelFormat,
        width: u32,
        height: u32,
        row_alignment: usize,
    ) -> DomainResult<Self> {
        if width == 0 || height == 0 {
            return Err(DomainError::Allocation(format!(
                "invalid dimensions {}x{}",
                width, height
            )));
        }
        if row_alignment == 0 || !row_alignment.is_power_of_two() {
            return Err(DomainError::Allocation(format!(
                "row alignment must be a power of two, got {}",
                row_alignment
            )));
        }

        let row_bytes = (width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or_else(|| DomainError::Allocation("row size overflow".to_string()))?;

        // ストライドをアライメント境界に切り上げ
        let bytes_per_row = row_bytes
            .checked_add(row_alignment - 1)
            .map(|v| v & !(row_alignment - 1))
            .ok_or_else(|| DomainError::Allocation("stride overflow".to_string()))?;

        let total = bytes_per_row
            .checked_mul(height as usize)
            .ok_or_else(|| DomainError::Allocation("buffer size overflow".to_string()))?;

        Ok(Self {
            format,
            width,
            height,
            bytes_per_row,
            data: vec![0u8; total],
        })
    }

    /// ピクセルフォーマットを取得
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// 幅（ピクセル）を取得
    pub fn width(&self) -> u32 {
        self.width
    }

    /// 高さ（ピクセル）を取得
    pub fn height(&self) -> u32 {
        self.height
    }

    /// 行ストライド（バイト）を取得
    ///
    /// `width * bytes_per_pixel` 以上であることが保証される。
    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// バッキングメモリ全体への読み取りアクセス（パディング込み）
    #[allow(dead_code)]
    pub fn plane(&self) -> &[u8] {
        &self.data
    }

    /// 指定行の有効ピクセル部分を取得（パディング除く）
    ///
    /// # Panics
    /// `y >= height` の場合パニックする。
    pub fn row(&self, y: u32) -> &[u8] {
        debug_assert!(y < self.height, "row {} out of range (height {})", y, self.height);
        let start = y as usize * self.bytes_per_row;
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        &self.data[start..start + row_bytes]
    }

    /// 指定座標のピクセルバイト列を取得
    ///
    /// 戻り値の長さは `format.bytes_per_pixel()`。
    ///
    /// # Panics
    /// `x >= width` または `y >= height` の場合パニックする。
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) out of range ({}x{})",
            x,
            y,
            self.width,
            self.height
        );
        let bpp = self.format.bytes_per_pixel();
        let start = y as usize * self.bytes_per_row + x as usize * bpp;
        &self.data[start..start + bpp]
    }

    /// バッキングメモリへの排他的書き込みアクセスを取得
    ///
    /// 返されるガードの借用スコープが排他区間そのもの。描画全体を
    /// このスコープ内で行うことで、早期リターンを含むあらゆる経路で
    /// 解放が保証される（手動lock/unlock対の排除）。
    pub fn plane_mut(&mut self) -> PlaneMut<'_> {
        PlaneMut {
            bytes_per_row: self.bytes_per_row,
            row_bytes: self.width as usize * self.format.bytes_per_pixel(),
            data: &mut self.data,
        }
    }
}

/// ピクセルバッファへのスコープ付き書き込みガード
///
/// 1回の変換呼び出しで確保した1つのバッファに対してのみ有効。
/// バッファ間で共有される状態はないため、別スレッドからの並行変換とは
/// 競合しない。
pub struct PlaneMut<'a> {
    bytes_per_row: usize,
    row_bytes: usize,
    data: &'a mut [u8],
}

impl PlaneMut<'_> {
    /// 指定行の有効ピクセル部分への書き込みアクセス（パディング除く）
    ///
    /// # Panics
    /// `y` がバッファの高さ以上の場合パニックする。
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.bytes_per_row;
        debug_assert!(
            start + self.row_bytes <= self.data.len(),
            "row {} out of range",
            y
        );
        &mut self.data[start..start + self.row_bytes]
    }
}

/// 撮影された静止画（エンコード済みバイト列）
///
/// カメラポートが返す、デコード前の写真データ。
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    /// エンコード済み画像データ（PNG/JPEG等）
    pub data: Vec<u8>,
    /// 撮影時刻
    pub captured_at: Instant,
}

impl CapturedPhoto {
    /// 新しい撮影写真を作成
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            captured_at: Instant::now(),
        }
    }
}

/// 分類結果
///
/// 下流の分類ルーチンが返すラベルとクラス別確率のマッピング。
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// 最も確率の高いクラスのラベル
    pub label: String,
    /// labelに対応する確率
    pub confidence: f32,
    /// クラス別確率（順序決定性のためBTreeMap）
    pub probabilities: BTreeMap<String, f32>,
}

impl Classification {
    /// 新しい分類結果を作成
    pub fn new(label: impl Into<String>, confidence: f32, probabilities: BTreeMap<String, f32>) -> Self {
        Self {
            label: label.into(),
            confidence,
            probabilities,
        }
    }
}

/// カメラアクセスの認可ステータス
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// 許可済み
    Authorized,
    /// 未確認（ユーザーへの確認が必要）
    NotDetermined,
    /// 拒否
    Denied,
}
