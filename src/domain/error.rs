/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - カメラ取得・画像デコード・分類器初期化の失敗はプロセスabortではなく
///   すべて明示的なエラーバリアントとして呼び出し側へ伝播する

use thiserror::Error;

/// Domain層の統一エラー型
#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum DomainError {
    /// ピクセルバッファ確保失敗
    ///
    /// 変換器が宣言する唯一の失敗経路。ゼロ次元・サイズ計算のオーバーフロー等。
    /// リトライもフォールバックフォーマットも行わない。
    #[error("Pixel buffer allocation failed: {0}")]
    Allocation(String),

    /// 撮影（カメラセッション）関連のエラー
    #[error("Capture error: {0}")]
    Capture(String),

    /// 写真データのデコード失敗（破損・未対応フォーマット）
    #[error("Decode error: {0}")]
    Decode(String),

    /// 分類関連のエラー
    #[error("Classify error: {0}")]
    Classify(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// カメラアクセス拒否
    ///
    /// 認可ステータスがDeniedの場合。呼び出し側がフローを中断するか
    /// 警告を出すかを決める。
    #[error("Camera access denied")]
    PermissionDenied,

    /// 初期化エラー
    #[error("Initialization failed: {0}")]
    Initialization(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
