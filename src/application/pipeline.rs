//! パイプライン制御モジュール
//!
//! 撮影 → デコード → ピクセルバッファ変換 → 分類 の流れを
//! ワーカースレッド1本で制御します。呼び出し側（mainスレッド）は
//! コマンドを送り、イベントで結果を受け取る。

use crate::application::session::CaptureSession;
use crate::application::stats::{StatKind, StatsCollector};
use crate::domain::{
    CameraPort, CapturedPhoto, Classification, ClassifyPort, ConvertPort, DomainError,
    DomainResult,
};
use crate::logging::SpanTimer;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::cell::Cell;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// パイプライン設定
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 統計出力間隔
    pub stats_interval: Duration,
    /// コマンドの結果待ちタイムアウト
    pub result_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_interval: Duration::from_secs(10),
            result_timeout: Duration::from_secs(5),
        }
    }
}

/// シャッター操作コマンド（呼び出し側 → ワーカー）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterCommand {
    /// 静止画を1枚撮影してセッションを止める
    TakePhoto,
    /// 撮影済み写真を変換して分類する
    Evaluate,
    /// 撮影をやり直す（セッション再開、状態リセット）
    Retake,
    /// ワーカーを終了する
    Shutdown,
}

/// 評価結果（分類結果とタイムスタンプ）
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub classification: Classification,
    pub captured_at: Instant,
    pub evaluated_at: Instant,
}

impl Evaluation {
    /// 撮影から分類完了までのレイテンシ
    pub fn latency(&self) -> Duration {
        self.evaluated_at.duration_since(self.captured_at)
    }
}

/// パイプラインイベント（ワーカー → 呼び出し側）
#[derive(Debug)]
pub enum PipelineEvent {
    /// 撮影完了
    PhotoTaken,
    /// プレビュー再開（Retake完了）
    PreviewResumed,
    /// 評価完了
    Evaluated(Evaluation),
    /// コマンド失敗
    Failed(DomainError),
}

/// パイプライン実行コンテキスト
///
/// ポート実装はワーカースレッドへ所有権ごと移動する。
/// 変換は呼び出しごとに自己完結しており、共有状態を持たない。
pub struct PipelineRunner<C, V, K>
where
    C: CameraPort,
    V: ConvertPort,
    K: ClassifyPort,
{
    camera: C,
    converter: V,
    classifier: K,
    config: PipelineConfig,
    session: CaptureSession,
}

impl<C, V, K> PipelineRunner<C, V, K>
where
    C: CameraPort + 'static,
    V: ConvertPort + 'static,
    K: ClassifyPort + 'static,
{
    /// 新しいPipelineRunnerを作成
    pub fn new(camera: C, converter: V, classifier: K, config: PipelineConfig) -> Self {
        Self {
            camera,
            converter,
            classifier,
            config,
            session: CaptureSession::new(),
        }
    }

    /// パイプラインを起動し、操作ハンドルを返す
    ///
    /// カメラセッションの開始に失敗した場合はワーカーを立てずにエラーを返す。
    pub fn start(mut self) -> DomainResult<PipelineHandle> {
        self.camera.start_session()?;

        // コマンドとイベントはシーケンス番号で対応付ける。タイムアウト後に
        // 遅れて届いたイベントを次のコマンドの応答と取り違えないため。
        let (command_tx, command_rx) = bounded::<(u64, ShutterCommand)>(1);
        let (event_tx, event_rx) = bounded::<(u64, PipelineEvent)>(1);

        let session = self.session.clone();
        let result_timeout = self.config.result_timeout;

        let worker = std::thread::spawn(move || {
            Self::worker_thread(
                self.camera,
                self.converter,
                self.classifier,
                self.session,
                StatsCollector::new(self.config.stats_interval),
                command_rx,
                event_tx,
            );
        });

        Ok(PipelineHandle {
            command_tx,
            event_rx,
            worker,
            session,
            result_timeout,
            next_seq: Cell::new(0),
        })
    }

    /// ワーカースレッドのメインループ
    fn worker_thread(
        mut camera: C,
        converter: V,
        mut classifier: K,
        session: CaptureSession,
        mut stats: StatsCollector,
        command_rx: Receiver<(u64, ShutterCommand)>,
        event_tx: Sender<(u64, PipelineEvent)>,
    ) {
        let mut pending: Option<CapturedPhoto> = None;

        loop {
            let (seq, command) = match command_rx.recv() {
                Ok(pair) => pair,
                Err(_) => break, // 呼び出し側がハンドルを破棄した
            };

            let event = match command {
                ShutterCommand::TakePhoto => {
                    Self::take_photo(&mut camera, &session, &mut stats, &mut pending)
                }
                ShutterCommand::Evaluate => Self::evaluate(
                    &converter,
                    &mut classifier,
                    &session,
                    &mut stats,
                    pending.as_ref(),
                ),
                ShutterCommand::Retake => {
                    pending = None;
                    match camera.start_session() {
                        Ok(()) => {
                            session.mark_retaken();
                            PipelineEvent::PreviewResumed
                        }
                        Err(e) => PipelineEvent::Failed(e),
                    }
                }
                ShutterCommand::Shutdown => {
                    if let Err(e) = camera.stop_session() {
                        #[cfg(debug_assertions)]
                        tracing::warn!("Failed to stop camera session: {:?}", e);
                        #[cfg(not(debug_assertions))]
                        let _ = e;
                    }
                    stats.report_and_reset();
                    break;
                }
            };

            if event_tx.send((seq, event)).is_err() {
                break;
            }

            if stats.should_report() {
                stats.report_and_reset();
            }
        }
    }

    /// 静止画を撮影し、セッションを停止する
    fn take_photo(
        camera: &mut C,
        session: &CaptureSession,
        stats: &mut StatsCollector,
        pending: &mut Option<CapturedPhoto>,
    ) -> PipelineEvent {
        let timer = SpanTimer::new("capture");

        match camera.capture_photo() {
            Ok(photo) => {
                stats.record_duration(StatKind::Capture, timer.elapsed());
                stats.record_shutter();

                // 撮影後はセッションを止めてプレビューを固定する
                if let Err(e) = camera.stop_session() {
                    #[cfg(debug_assertions)]
                    tracing::warn!("Failed to stop session after capture: {:?}", e);
                    #[cfg(not(debug_assertions))]
                    let _ = e;
                }

                *pending = Some(photo);
                session.mark_taken();
                PipelineEvent::PhotoTaken
            }
            Err(e) => {
                stats.record_failure();
                PipelineEvent::Failed(e)
            }
        }
    }

    /// 撮影済み写真をデコード・変換・分類する
    fn evaluate(
        converter: &V,
        classifier: &mut K,
        session: &CaptureSession,
        stats: &mut StatsCollector,
        pending: Option<&CapturedPhoto>,
    ) -> PipelineEvent {
        let Some(photo) = pending else {
            return PipelineEvent::Failed(DomainError::Capture(
                "no photo has been taken".to_string(),
            ));
        };

        // 変換時間にはポート内部の写真デコードが含まれる
        let convert_timer = SpanTimer::new("convert");
        let buffer = match converter.convert(photo) {
            Ok(buffer) => buffer,
            Err(e) => {
                stats.record_failure();
                return PipelineEvent::Failed(e);
            }
        };
        stats.record_duration(StatKind::Convert, convert_timer.elapsed());

        let classify_timer = SpanTimer::new("classify");
        let classification = match classifier.classify(&buffer) {
            Ok(classification) => classification,
            Err(e) => {
                stats.record_failure();
                return PipelineEvent::Failed(e);
            }
        };
        stats.record_duration(StatKind::Classify, classify_timer.elapsed());

        let evaluated_at = Instant::now();
        stats.record_duration(
            StatKind::EndToEnd,
            evaluated_at.duration_since(photo.captured_at),
        );

        session.mark_evaluated();

        #[cfg(debug_assertions)]
        tracing::info!(
            "Evaluated photo: label={}, confidence={:.3}",
            classification.label,
            classification.confidence
        );

        PipelineEvent::Evaluated(Evaluation {
            classification,
            captured_at: photo.captured_at,
            evaluated_at,
        })
    }
}

/// パイプライン操作ハンドル
///
/// コマンドは1つずつ送られ、対応するイベントが返るまで待つ同期API。
/// 各コマンドにシーケンス番号を振り、タイムアウト後に遅れて届いた
/// 前コマンドのイベントは破棄する（応答の取り違え防止）。
pub struct PipelineHandle {
    command_tx: Sender<(u64, ShutterCommand)>,
    event_rx: Receiver<(u64, PipelineEvent)>,
    worker: JoinHandle<()>,
    session: CaptureSession,
    result_timeout: Duration,
    next_seq: Cell<u64>,
}

impl PipelineHandle {
    /// セッション状態ビューを取得
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// 静止画を1枚撮影する
    pub fn take_photo(&self) -> DomainResult<()> {
        match self.roundtrip(ShutterCommand::TakePhoto)? {
            PipelineEvent::PhotoTaken => Ok(()),
            PipelineEvent::Failed(e) => Err(e),
            other => Err(Self::unexpected(other)),
        }
    }

    /// 撮影済み写真を評価（変換 + 分類）する
    pub fn evaluate(&self) -> DomainResult<Evaluation> {
        match self.roundtrip(ShutterCommand::Evaluate)? {
            PipelineEvent::Evaluated(evaluation) => Ok(evaluation),
            PipelineEvent::Failed(e) => Err(e),
            other => Err(Self::unexpected(other)),
        }
    }

    /// 撮影をやり直し、プレビューへ戻る
    pub fn retake(&self) -> DomainResult<()> {
        match self.roundtrip(ShutterCommand::Retake)? {
            PipelineEvent::PreviewResumed => Ok(()),
            PipelineEvent::Failed(e) => Err(e),
            other => Err(Self::unexpected(other)),
        }
    }

    /// ワーカーを終了して合流する
    pub fn shutdown(self) -> DomainResult<()> {
        // ワーカーが既に終了していてもエラーにしない
        let _ = self
            .command_tx
            .send((self.next_seq.get(), ShutterCommand::Shutdown));
        self.worker
            .join()
            .map_err(|_| DomainError::Initialization("pipeline worker panicked".to_string()))
    }

    /// コマンドを送り、対応するイベントを待つ
    ///
    /// シーケンス番号の一致しないイベントは、過去のコマンドが
    /// タイムアウト後に完了した名残なので読み捨てる。
    fn roundtrip(&self, command: ShutterCommand) -> DomainResult<PipelineEvent> {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);

        self.command_tx.send((seq, command)).map_err(|_| {
            DomainError::Initialization("pipeline worker has terminated".to_string())
        })?;

        let deadline = Instant::now() + self.result_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.event_rx.recv_timeout(remaining) {
                Ok((event_seq, event)) if event_seq == seq => return Ok(event),
                Ok(_) => continue, // 古いイベントを破棄
                Err(RecvTimeoutError::Timeout) => {
                    return Err(DomainError::Capture(format!(
                        "timed out waiting for {:?} result",
                        command
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(DomainError::Initialization(
                        "pipeline worker has terminated".to_string(),
                    ))
                }
            }
        }
    }

    fn unexpected(event: PipelineEvent) -> DomainError {
        DomainError::Initialization(format!("unexpected pipeline event: {:?}", event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::TestPattern;
    use crate::domain::{AuthorizationStatus, PixelFormat};
    use crate::infrastructure::color_classify::{ColorProfileClassifyAdapter, LABEL_RED};
    use crate::infrastructure::convert::ImageConvertAdapter;
    use crate::infrastructure::mock_camera::MockCameraAdapter;

    /// 初回の撮影だけ指定時間ブロックするカメラ（タイムアウト動作の検証用）
    struct SlowFirstShotCamera {
        inner: MockCameraAdapter,
        first_delay: Duration,
        shots: u32,
    }

    impl CameraPort for SlowFirstShotCamera {
        fn authorization_status(&self) -> AuthorizationStatus {
            self.inner.authorization_status()
        }

        fn request_access(&mut self) -> DomainResult<bool> {
            self.inner.request_access()
        }

        fn start_session(&mut self) -> DomainResult<()> {
            self.inner.start_session()
        }

        fn stop_session(&mut self) -> DomainResult<()> {
            self.inner.stop_session()
        }

        fn capture_photo(&mut self) -> DomainResult<CapturedPhoto> {
            if self.shots == 0 {
                std::thread::sleep(self.first_delay);
            }
            self.shots += 1;
            self.inner.capture_photo()
        }

        fn is_running(&self) -> bool {
            self.inner.is_running()
        }
    }

    fn red_pipeline() -> PipelineHandle {
        let camera = MockCameraAdapter::new(8, 8, TestPattern::Solid, [255, 0, 0]);
        let converter = ImageConvertAdapter::default();
        let classifier = ColorProfileClassifyAdapter::new(PixelFormat::Bgra32, 0.25);

        PipelineRunner::new(camera, converter, classifier, PipelineConfig::default())
            .start()
            .unwrap()
    }

    #[test]
    fn test_take_and_evaluate_red_photo() {
        let handle = red_pipeline();

        handle.take_photo().unwrap();
        assert!(handle.session().is_taken());
        assert!(!handle.session().is_evaluated());

        let evaluation = handle.evaluate().unwrap();
        assert_eq!(evaluation.classification.label, LABEL_RED);
        assert!(handle.session().is_evaluated());
        assert!(evaluation.latency() > Duration::ZERO);

        handle.shutdown().unwrap();
    }

    #[test]
    fn test_evaluate_without_photo_fails() {
        let handle = red_pipeline();

        assert!(matches!(
            handle.evaluate(),
            Err(DomainError::Capture(_))
        ));

        handle.shutdown().unwrap();
    }

    #[test]
    fn test_retake_resets_session() {
        let handle = red_pipeline();

        handle.take_photo().unwrap();
        handle.evaluate().unwrap();

        handle.retake().unwrap();
        assert!(!handle.session().is_taken());
        assert!(!handle.session().is_evaluated());

        // 再撮影後にもう一度評価できる
        handle.take_photo().unwrap();
        let evaluation = handle.evaluate().unwrap();
        assert_eq!(evaluation.classification.label, LABEL_RED);

        handle.shutdown().unwrap();
    }

    #[test]
    fn test_late_event_does_not_desync_handle() {
        // 撮影がタイムアウトした後、遅れて届く撮影完了イベントが
        // 次のコマンドの応答と取り違えられないこと
        let camera = SlowFirstShotCamera {
            inner: MockCameraAdapter::new(8, 8, TestPattern::Solid, [255, 0, 0]),
            first_delay: Duration::from_millis(400),
            shots: 0,
        };
        let converter = ImageConvertAdapter::default();
        let classifier = ColorProfileClassifyAdapter::new(PixelFormat::Bgra32, 0.25);
        let config = PipelineConfig {
            stats_interval: Duration::from_secs(10),
            result_timeout: Duration::from_millis(100),
        };

        let handle = PipelineRunner::new(camera, converter, classifier, config)
            .start()
            .unwrap();

        // 初回撮影は呼び出し側ではタイムアウトするが、ワーカー側では完了する
        assert!(matches!(
            handle.take_photo(),
            Err(DomainError::Capture(_))
        ));

        // ワーカーの撮影完了を待つ（遅延イベントがチャネルに残る状態を作る）
        std::thread::sleep(Duration::from_millis(500));

        // 次のコマンドは遅延イベントを読み飛ばし、正しい評価結果を返す
        let evaluation = handle.evaluate().unwrap();
        assert_eq!(evaluation.classification.label, LABEL_RED);

        handle.shutdown().unwrap();
    }

    #[test]
    fn test_evaluate_after_retake_without_photo_fails() {
        let handle = red_pipeline();

        handle.take_photo().unwrap();
        handle.retake().unwrap();

        // Retakeで撮影済み写真は破棄されている
        assert!(handle.evaluate().is_err());

        handle.shutdown().unwrap();
    }
}
