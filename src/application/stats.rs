//! 統計情報管理モジュール
//!
//! 撮影枚数、各処理段階のレイテンシ、失敗回数などの統計を収集・出力します。

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// 統計情報の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// 撮影処理時間
    Capture,
    /// ピクセルバッファ変換時間（写真デコード込み）
    Convert,
    /// 分類時間
    Classify,
    /// エンドツーエンドのレイテンシ（撮影→分類結果）
    EndToEnd,
}

/// パーセンタイル統計値
#[derive(Debug, Clone)]
pub struct PercentileStats {
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub count: usize,
}

/// 統計情報コレクター
#[derive(Debug)]
pub struct StatsCollector {
    /// 各処理段階の所要時間（最大1000サンプル保持）
    durations: std::collections::HashMap<StatKind, VecDeque<Duration>>,
    /// シャッター回数（撮影成功数）
    shutter_count: u64,
    /// 評価失敗回数
    failure_count: u64,
    /// 最後の統計出力時刻
    last_report: Instant,
    /// 統計出力間隔
    report_interval: Duration,
}

impl StatsCollector {
    /// 新しいStatsCollectorを作成
    ///
    /// # Arguments
    /// * `report_interval` - 統計出力間隔（例: 10秒）
    pub fn new(report_interval: Duration) -> Self {
        Self {
            durations: std::collections::HashMap::new(),
            shutter_count: 0,
            failure_count: 0,
            last_report: Instant::now(),
            report_interval,
        }
    }

    /// 最大サンプル保持数（パーセンタイル計算用）
    const MAX_DURATION_SAMPLES: usize = 1000;

    /// 撮影成功を記録
    pub fn record_shutter(&mut self) {
        self.shutter_count += 1;
    }

    /// 評価失敗を記録
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
    }

    /// 処理時間を記録
    ///
    /// # Arguments
    /// * `kind` - 統計種別
    /// * `duration` - 処理時間
    pub fn record_duration(&mut self, kind: StatKind, duration: Duration) {
        let queue = self.durations.entry(kind).or_default();
        queue.push_back(duration);

        // 最大サンプル数を超えたら古いデータを破棄
        if queue.len() > Self::MAX_DURATION_SAMPLES {
            queue.pop_front();
        }
    }

    /// 撮影成功数を取得
    pub fn shutter_count(&self) -> u64 {
        self.shutter_count
    }

    /// 評価失敗数を取得
    #[allow(dead_code)]
    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    /// パーセンタイル統計を計算
    ///
    /// # Arguments
    /// * `kind` - 統計種別
    ///
    /// # Returns
    /// パーセンタイル統計値。データがない場合は None
    pub fn percentile_stats(&self, kind: StatKind) -> Option<PercentileStats> {
        let queue = self.durations.get(&kind)?;
        if queue.is_empty() {
            return None;
        }

        let mut sorted: Vec<Duration> = queue.iter().copied().collect();
        sorted.sort();

        let count = sorted.len();
        let p50 = sorted[count * 50 / 100];
        let p95 = sorted[count * 95 / 100];
        let p99 = sorted[count * 99 / 100];

        Some(PercentileStats {
            p50,
            p95,
            p99,
            count,
        })
    }

    /// 統計レポートを出力すべきか判定
    ///
    /// # Returns
    /// 出力すべき場合は true
    #[allow(dead_code)]
    pub fn should_report(&self) -> bool {
        self.last_report.elapsed() >= self.report_interval
    }

    /// 統計レポートを出力してタイマーをリセット
    #[cfg(debug_assertions)]
    pub fn report_and_reset(&mut self) {
        use tracing::info;

        info!("=== Pipeline Statistics ===");
        info!("Shutter count: {}", self.shutter_count);

        for kind in [
            StatKind::Capture,
            StatKind::Convert,
            StatKind::Classify,
            StatKind::EndToEnd,
        ] {
            if let Some(stats) = self.percentile_stats(kind) {
                info!(
                    "{:?}: p50={:.2}ms, p95={:.2}ms, p99={:.2}ms (n={})",
                    kind,
                    stats.p50.as_secs_f64() * 1000.0,
                    stats.p95.as_secs_f64() * 1000.0,
                    stats.p99.as_secs_f64() * 1000.0,
                    stats.count
                );
            }
        }

        info!("Failure count: {}", self.failure_count);
        info!("===========================");

        self.last_report = Instant::now();
    }

    /// Release build用のダミー実装
    #[cfg(not(debug_assertions))]
    pub fn report_and_reset(&mut self) {
        self.last_report = Instant::now();
    }
}
