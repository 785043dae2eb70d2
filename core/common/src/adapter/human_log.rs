//! 人間向けログ（LogRecord → stderr へ要点のみ出力）と複数 Log への配信

use crate::error::Error;
use crate::ports::outbound::{Log, LogLevel, LogRecord};
use std::sync::Arc;

const FIELDS_SUMMARY_MAX: usize = 200;

/// fields の要点だけを短い文字列にする（巨大化防止）
fn fields_summary(record: &LogRecord) -> String {
    let Some(fields) = record.fields.as_ref() else {
        return String::new();
    };
    let s = serde_json::to_string(fields).unwrap_or_default();
    let len = s.chars().count();
    if len <= FIELDS_SUMMARY_MAX {
        return s;
    }
    let truncated = s.chars().take(FIELDS_SUMMARY_MAX).collect::<String>();
    format!("{}... (len={})", truncated, len)
}

/// 1 行に整形する（`[catalog] warn usecase/stale: message {...}`）
pub fn format_line(record: &LogRecord) -> String {
    let mut line = format!("[catalog] {}", record.level.as_str());
    match (&record.layer, &record.kind) {
        (Some(layer), Some(kind)) => line.push_str(&format!(" {}/{}", layer, kind)),
        (Some(layer), None) => line.push_str(&format!(" {}", layer)),
        (None, Some(kind)) => line.push_str(&format!(" {}", kind)),
        (None, None) => {}
    }
    line.push_str(": ");
    line.push_str(&record.message);
    let summary = fields_summary(record);
    if !summary.is_empty() {
        line.push(' ');
        line.push_str(&summary);
    }
    line
}

/// stderr へ整形出力する Log 実装（-v 指定時）
pub struct StderrLog {
    max_level: LogLevel,
}

impl StderrLog {
    pub fn new(max_level: LogLevel) -> Self {
        Self { max_level }
    }
}

impl Log for StderrLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        if record.level <= self.max_level {
            eprintln!("{}", format_line(record));
        }
        Ok(())
    }
}

/// 複数の Log へ順に配信する。1 つが失敗しても残りへは配信を続ける（best-effort）。
pub struct TeeLog {
    logs: Vec<Arc<dyn Log>>,
}

impl TeeLog {
    pub fn new(logs: Vec<Arc<dyn Log>>) -> Self {
        Self { logs }
    }
}

impl Log for TeeLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        let mut first_err = None;
        for log in &self.logs {
            if let Err(e) = log.log(record) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// テスト用: 受け取った LogRecord を蓄積する Log
#[derive(Default)]
pub struct MemoryLog {
    records: std::sync::Mutex<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録済みレコードの message 一覧
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|r| r.iter().map(|rec| rec.message.clone()).collect())
            .unwrap_or_default()
    }

    /// kind が一致するレコード数
    pub fn count_kind(&self, kind: &str) -> usize {
        self.records
            .lock()
            .map(|r| r.iter().filter(|rec| rec.kind.as_deref() == Some(kind)).count())
            .unwrap_or(0)
    }
}

impl Log for MemoryLog {
    fn log(&self, record: &LogRecord) -> Result<(), Error> {
        self.records
            .lock()
            .map_err(|_| Error::system("log lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLog;

    impl Log for FailingLog {
        fn log(&self, _record: &LogRecord) -> Result<(), Error> {
            Err(Error::io_msg("disk full"))
        }
    }

    #[test]
    fn format_line_with_layer_kind_and_fields() {
        let rec = LogRecord::new(LogLevel::Warn, "stale reply discarded")
            .layer("usecase")
            .kind("stale")
            .field("ticket", 2);
        assert_eq!(
            format_line(&rec),
            "[catalog] warn usecase/stale: stale reply discarded {\"ticket\":2}"
        );
    }

    #[test]
    fn format_line_truncates_large_fields() {
        let rec = LogRecord::new(LogLevel::Debug, "big").field("body", "x".repeat(500));
        let line = format_line(&rec);
        assert!(line.contains("... (len="));
    }

    #[test]
    fn format_line_counts_multibyte_fields_in_chars() {
        let rec = LogRecord::new(LogLevel::Debug, "desc").field("body", "抵抗".repeat(80));
        let line = format_line(&rec);
        assert!(!line.contains("... (len="));
        assert!(line.ends_with("\"}"));
    }

    #[test]
    fn tee_log_continues_after_failure() {
        let memory = Arc::new(MemoryLog::new());
        let tee = TeeLog::new(vec![Arc::new(FailingLog), memory.clone()]);
        let result = tee.log(&LogRecord::new(LogLevel::Info, "hello"));
        assert!(result.is_err());
        assert_eq!(memory.messages(), vec!["hello".to_string()]);
    }
}
