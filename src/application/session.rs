//! 撮影セッション状態管理（Application層）
//!
//! 「撮影済みか」「評価済みか」のフラグをワーカースレッドと呼び出し側で
//! 共有します。`Arc<AtomicBool>`を使用したロックフリー設計により、
//! 読み取り側は数CPUサイクルで状態を確認できます。

use std::sync::{atomic::{AtomicBool, Ordering}, Arc};

/// 撮影セッション状態（スレッド間で共有、ロックフリー）
///
/// シャッターを切ると「撮影済み」になり、分類が完了すると「評価済み」に
/// なる。再撮影で両フラグがリセットされ、プレビュー状態へ戻る。
///
/// # メモリオーダー
/// - 読み書きとも `Ordering::Relaxed` - 厳密な順序保証は不要（少し古い値でも無害）
#[derive(Clone)]
pub struct CaptureSession {
    /// 静止画を撮影済みか
    taken: Arc<AtomicBool>,
    /// 撮影した静止画の評価（分類）が完了したか
    evaluated: Arc<AtomicBool>,
}

impl CaptureSession {
    /// 新しいCaptureSessionを作成（プレビュー状態）
    pub fn new() -> Self {
        Self {
            taken: Arc::new(AtomicBool::new(false)),
            evaluated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 撮影済みかどうかを確認（ロックフリー）
    #[inline]
    pub fn is_taken(&self) -> bool {
        self.taken.load(Ordering::Relaxed)
    }

    /// 評価済みかどうかを確認（ロックフリー）
    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.evaluated.load(Ordering::Relaxed)
    }

    /// 撮影完了を記録
    pub fn mark_taken(&self) {
        self.taken.store(true, Ordering::Relaxed);
    }

    /// 再撮影を記録（両フラグをリセットしてプレビューへ戻る）
    pub fn mark_retaken(&self) {
        self.taken.store(false, Ordering::Relaxed);
        self.evaluated.store(false, Ordering::Relaxed);
    }

    /// 評価完了を記録
    pub fn mark_evaluated(&self) {
        self.evaluated.store(true, Ordering::Relaxed);
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_starts_in_preview() {
        let session = CaptureSession::new();
        assert!(!session.is_taken());
        assert!(!session.is_evaluated());
    }

    #[test]
    fn test_take_evaluate_retake_cycle() {
        let session = CaptureSession::new();

        session.mark_taken();
        assert!(session.is_taken());
        assert!(!session.is_evaluated());

        session.mark_evaluated();
        assert!(session.is_taken());
        assert!(session.is_evaluated());

        session.mark_retaken();
        assert!(!session.is_taken());
        assert!(!session.is_evaluated());
    }

    #[test]
    fn test_clones_share_state() {
        let session = CaptureSession::new();
        let view = session.clone();

        session.mark_taken();
        assert!(view.is_taken());
    }
}
