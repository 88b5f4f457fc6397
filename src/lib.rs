//! openidcs-i18n
//!
//! OpenIDCS 管理コンソール向けの翻訳オーバーレイ。ページ上のテキストノードと
//! 一部の属性をバックエンドから取得した翻訳表で置き換える。

pub mod config;
pub mod dom;
pub mod loader;
pub mod overlay;
pub mod phrase;
pub mod storage;
pub mod store;
pub mod walker;
pub mod watcher;

// TranslationOverlay を再エクスポート
pub use overlay::{
    LoadOutcome,
    TranslationOverlay,
};
