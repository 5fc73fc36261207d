//! Application Layer
//!
//! パイプライン制御、セッション状態、統計管理などのユースケースを実装します。
//!
//! ## モジュール構成
//! - `pipeline`: ワーカースレッドによる撮影→変換→分類フロー制御
//! - `session`: 撮影セッション状態（撮影済み/評価済みフラグ）
//! - `stats`: 統計情報管理（シャッター数、段階別レイテンシ）

pub mod pipeline;
pub mod session;
pub mod stats;
