//! 配線: 標準アダプタで App を組み立てる

use std::sync::Arc;

use common::adapter::{FileJsonLog, NoopLog, StderrLog, TeeLog};
use common::error::Error;
use common::ports::outbound::{Log, LogLevel};

use crate::adapter::{ClientConfig, HttpCatalog, ThreadedDispatcher};
use crate::app::App;
use crate::ports::outbound::CatalogService;
use crate::usecase::CatalogSession;

/// ログを組み立てる: 設定があれば JSONL ファイル、-v なら stderr にも出す
pub fn build_log(config: &ClientConfig, verbose: bool) -> Arc<dyn Log> {
    let mut logs: Vec<Arc<dyn Log>> = Vec::new();
    if let Some(path) = &config.log_file {
        logs.push(Arc::new(FileJsonLog::new(path)));
    }
    if verbose {
        logs.push(Arc::new(StderrLog::new(LogLevel::Debug)));
    }
    match logs.len() {
        0 => Arc::new(NoopLog),
        1 => logs.remove(0),
        _ => Arc::new(TeeLog::new(logs)),
    }
}

/// 配線: HTTP クライアント + ワーカースレッドの Dispatcher で App を組み立てる
pub fn wire_catalog(config: &ClientConfig, log: Arc<dyn Log>) -> Result<App, Error> {
    let service: Arc<dyn CatalogService> = Arc::new(HttpCatalog::new(
        &config.base_url,
        config.timeout,
        Arc::clone(&log),
    )?);
    let dispatcher = ThreadedDispatcher::new(Arc::clone(&service));
    let session = CatalogSession::new(Box::new(dispatcher), Arc::clone(&log));
    Ok(App::new(session, service, log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ports::outbound::LogRecord;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn log_goes_to_configured_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log").join("catalog.jsonl");
        let config = ClientConfig {
            log_file: Some(path.clone()),
            ..ClientConfig::default()
        };
        let log = build_log(&config, false);
        log.log(&LogRecord::new(LogLevel::Info, "hello")).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"hello\""));
    }

    #[test]
    fn wiring_rejects_invalid_base_url() {
        let config = ClientConfig {
            base_url: "::nope".to_string(),
            timeout: Duration::from_secs(1),
            log_file: None,
        };
        let err = wire_catalog(&config, build_log(&config, false)).err().unwrap();
        assert_eq!(err.exit_code(), 78);
    }
}
