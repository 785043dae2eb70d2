//! カタログ操作のエラー分類
//!
//! 通信層のエラー（common::error::Error）は要求を発行した箇所でここへ変換し、
//! 生の通信エラーとしては外へ出さない。

use crate::domain::PartId;
use common::error::Error;

/// カタログ操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// 取得系の通信失敗（カテゴリ一覧・部品一覧・部品詳細）
    #[error("failed to fetch {what}: {reason}")]
    FetchFailed { what: String, reason: String },
    /// 応答の形が契約と違う（部品一覧が配列でない等）
    #[error("malformed response for {what}: {reason}")]
    MalformedResponse { what: String, reason: String },
    #[error("failed to save part {part}: {reason}")]
    SaveFailed { part: PartId, reason: String },
    #[error("failed to create part {part}: {reason}")]
    CreateFailed { part: PartId, reason: String },
    #[error("failed to start a new revision of {part}: {reason}")]
    RevisionFailed { part: PartId, reason: String },
    /// 保存・リビジョン作成の実行中に次の保存・リビジョン作成が要求された
    #[error("{operation} is already in progress for part {part}")]
    OperationInProgress {
        operation: &'static str,
        part: PartId,
    },
    /// ソース番号が上限を超えた（デコード打ち切り）
    #[error("field map is malformed: more than {limit} sources")]
    MalformedFieldMap { limit: usize },
    /// 現在の状態では受け付けない操作
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
    /// 存在しない位置のソースを指定した（位置は 1 始まり）
    #[error("source #{position} does not exist (part has {len} source(s))")]
    SourceOutOfRange { position: usize, len: usize },
}

impl CatalogError {
    pub fn fetch_failed(what: impl Into<String>, cause: &Error) -> Self {
        Self::FetchFailed {
            what: what.into(),
            reason: cause.to_string(),
        }
    }

    pub fn malformed(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            what: what.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }
}

impl From<CatalogError> for Error {
    fn from(e: CatalogError) -> Self {
        let msg = e.to_string();
        match e {
            CatalogError::FetchFailed { .. }
            | CatalogError::SaveFailed { .. }
            | CatalogError::CreateFailed { .. }
            | CatalogError::RevisionFailed { .. } => Error::http(msg),
            CatalogError::MalformedResponse { .. } | CatalogError::MalformedFieldMap { .. } => {
                Error::json(msg)
            }
            CatalogError::InvalidState { .. } | CatalogError::SourceOutOfRange { .. } => {
                Error::invalid_argument(msg)
            }
            CatalogError::OperationInProgress { .. } => Error::system(msg),
        }
    }
}
