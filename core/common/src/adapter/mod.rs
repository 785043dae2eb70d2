//! アダプター（ポートの標準実装）
//!
//! usecase はポートの trait 経由でのみログ・環境変数に触れる。
//! 実装は標準実装（Std*）やテスト用のもの（Noop / Memory / Map）を注入する。

pub mod file_json_log;
pub mod human_log;
pub mod std_env_resolver;

pub use file_json_log::{FileJsonLog, NoopLog};
pub use human_log::{format_line, MemoryLog, StderrLog, TeeLog};
pub use std_env_resolver::{MapEnvResolver, StdEnvResolver};
