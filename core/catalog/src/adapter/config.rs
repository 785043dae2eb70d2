//! クライアント設定の解決（adapter 層）
//!
//! 優先順位: 既定値 < <home>/config.json < 環境変数 GITPLM_API_BASE < CLI 引数

use common::error::Error;
use common::ports::outbound::EnvResolver;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 解決済みのクライアント設定
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// カタログサービスのベース URL（末尾の / は除く）
    pub base_url: String,
    /// 1 要求あたりのタイムアウト
    pub timeout: Duration,
    /// JSONL ログの出力先（None なら出さない）
    pub log_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_file: None,
        }
    }
}

/// CLI から渡される上書き値
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// config.json の中身
#[derive(Debug, Default, Deserialize)]
struct ClientConfigRaw {
    #[serde(alias = "api_base")]
    base_url: Option<String>,
    #[serde(alias = "timeout")]
    timeout_secs: Option<u64>,
    log_file: Option<PathBuf>,
}

impl ClientConfigRaw {
    fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn read_config_file(path: &Path) -> Result<ClientConfigRaw, Error> {
    if !path.exists() {
        return Ok(ClientConfigRaw::default());
    }
    let content = fs::read_to_string(path)?;
    ClientConfigRaw::parse(&content)
        .map_err(|e| Error::env(format!("Invalid config file {}: {}", path.display(), e)))
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// 設定を解決する。ホームディレクトリが分からなければ設定ファイルとログは使わない。
pub fn resolve_config(
    env: &dyn EnvResolver,
    overrides: &ConfigOverrides,
) -> Result<ClientConfig, Error> {
    let home = env.resolve_home_dir().ok();
    let raw = match &home {
        Some(home) => read_config_file(&home.config_file())?,
        None => ClientConfigRaw::default(),
    };

    let base_url = overrides
        .base_url
        .clone()
        .or_else(|| env.var("GITPLM_API_BASE"))
        .or(raw.base_url)
        .map(|u| normalize_base_url(&u))
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let timeout_secs = overrides
        .timeout_secs
        .or(raw.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::invalid_argument("timeout must be at least 1 second"));
    }

    let log_file = raw
        .log_file
        .or_else(|| home.as_ref().map(|h| h.default_log_file()));

    Ok(ClientConfig {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
        log_file,
    })
}
