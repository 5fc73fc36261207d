//! Infrastructure層: 外部技術の統合
//!
//! Domain層のtraitを実装し、外部ライブラリ（imageクレート等）と接続する。

pub mod classify_selector;
pub mod color_classify;
pub mod convert;
pub mod mock_camera;
pub mod mock_classify;

#[allow(unused_imports)]
pub use classify_selector::ClassifySelector;
#[allow(unused_imports)]
pub use convert::ImageConvertAdapter;
#[allow(unused_imports)]
pub use mock_camera::MockCameraAdapter;
