//! アダプター（ポートの実装）
//!
//! usecase はポートの trait 経由でのみカタログサービスに触れる。
//! 実装は HTTP クライアント・Dispatcher の標準実装や、テスト用のスタブを注入する。

pub mod config;
pub mod dispatch;
pub mod http_catalog;
pub mod stub_catalog;

pub use config::{resolve_config, ClientConfig, ConfigOverrides};
pub use dispatch::{InlineDispatcher, ThreadedDispatcher};
pub use http_catalog::HttpCatalog;
#[cfg(test)]
pub use stub_catalog::{ManualDispatcher, StubCatalog};
