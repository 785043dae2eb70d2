//! 環境変数解決 Outbound ポート
//!
//! ホームディレクトリ・設定値を環境変数から解決する。
//! usecase / adapter はこの trait 経由でのみ環境変数にアクセスする。

use crate::domain::HomeDir;
use crate::error::Error;
use std::path::PathBuf;

/// 環境変数解決抽象（Outbound ポート）
///
/// 実装は `common::adapter::StdEnvResolver` やテスト用の `MapEnvResolver` など。
pub trait EnvResolver: Send + Sync {
    /// 環境変数を 1 つ読む（未設定・空文字は None）
    fn var(&self, name: &str) -> Option<String>;

    /// ホームディレクトリを環境変数から解決する
    ///
    /// 優先順位:
    /// 1. GITPLM_HOME（設定されていれば）
    /// 2. $XDG_CONFIG_HOME/gitplm（XDG_CONFIG_HOME が設定されていれば）
    /// 3. $HOME/.config/gitplm
    fn resolve_home_dir(&self) -> Result<HomeDir, Error> {
        if let Some(home) = self.var("GITPLM_HOME") {
            return Ok(HomeDir::new(PathBuf::from(home)));
        }
        let config_base = self
            .var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| self.var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .ok_or_else(|| Error::env("HOME is not set"))?;
        Ok(HomeDir::new(config_base.join("gitplm")))
    }
}
