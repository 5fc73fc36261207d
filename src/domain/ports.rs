/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。

use crate::domain::{
    AuthorizationStatus, CapturedPhoto, Classification, DomainResult, PixelBuffer, PixelFormat,
};

/// カメラポート: 静止画撮影セッションを抽象化
///
/// プラットフォームのカメラセッション（デバイス選択・プレビュー・
/// 撮影デリゲート）は外部コラボレータ。このtraitがその境界になる。
#[allow(dead_code)]
pub trait CameraPort: Send {
    /// カメラアクセスの認可ステータスを取得
    fn authorization_status(&self) -> AuthorizationStatus;

    /// カメラアクセスの許可をユーザーへ要求
    ///
    /// # Returns
    /// - `Ok(true)`: 許可された
    /// - `Ok(false)`: 拒否された
    fn request_access(&mut self) -> DomainResult<bool>;

    /// 撮影セッションを開始（プレビュー再開に相当）
    fn start_session(&mut self) -> DomainResult<()>;

    /// 撮影セッションを停止
    fn stop_session(&mut self) -> DomainResult<()>;

    /// 静止画を1枚撮影する
    ///
    /// # Returns
    /// - `Ok(CapturedPhoto)`: エンコード済み写真データ
    /// - `Err(DomainError::Capture)`: セッション未開始・デバイスエラー
    fn capture_photo(&mut self) -> DomainResult<CapturedPhoto>;

    /// セッションが動作中か
    fn is_running(&self) -> bool;
}

/// 変換ポート: 画像→ピクセルバッファ変換を抽象化
///
/// デコード済み画像を、下流の分類ルーチンが期待する固定レイアウトの
/// 生ピクセルバッファへ再エンコードする。呼び出しごとに独立しており、
/// 呼び出しをまたぐ共有状態を持たないこと（並行呼び出し安全）。
pub trait ConvertPort: Send {
    /// 撮影写真をデコードし、ピクセルバッファへ変換する
    ///
    /// # Arguments
    /// - `photo`: エンコード済み写真データ
    ///
    /// # Returns
    /// - `Ok(PixelBuffer)`: 変換済みバッファ（所有権は呼び出し側へ移る）
    /// - `Err(DomainError::Decode)`: 写真データが破損・未対応
    /// - `Err(DomainError::Allocation)`: バッファ確保失敗（唯一の変換失敗経路）
    fn convert(&self, photo: &CapturedPhoto) -> DomainResult<PixelBuffer>;

    /// 出力するピクセルフォーマット
    fn output_format(&self) -> PixelFormat;
}

/// 分類ポート: ピクセルバッファの分類を抽象化
///
/// バッファを唯一の構造化入力として受け取り、ラベルとクラス別確率を
/// 返す。入力フォーマットの契約は実装側が宣言し、パイプラインは
/// それに従う。
pub trait ClassifyPort: Send {
    /// ピクセルバッファを分類する
    ///
    /// # Arguments
    /// - `buffer`: `input_format()` のレイアウトに従うピクセルバッファ
    ///
    /// # Returns
    /// - `Ok(Classification)`: ラベルとクラス別確率
    /// - `Err(DomainError::Classify)`: 入力フォーマット不一致等
    fn classify(&mut self, buffer: &PixelBuffer) -> DomainResult<Classification>;

    /// この分類器が期待する入力フォーマット
    fn input_format(&self) -> PixelFormat;

    /// バックエンド名（ログ・統計表示用）
    fn backend_name(&self) -> &'static str;
}
