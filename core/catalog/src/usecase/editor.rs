//! 部品エディタ: 1 部品の読み込み・編集・保存・リビジョン作成
//!
//! 編集は手元の Draft だけを変え、保持中の Part（フィールドマップ）は保存応答でしか置き換えない。
//! 保存とリビジョン作成は同時に 1 つまで。応答はチケットと状態の両方で照合する。

use crate::domain::{
    diff_fields, CatalogError, EditField, EditorState, FieldChange, Part, PartId, PartUpdate,
    SourceRecord, Ticket, TicketCounter,
};
use crate::ports::outbound::{Envelope, Request};
use crate::usecase::ReplyOutcome;
use common::error::Error;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use std::sync::Arc;

/// 編集中の説明文とソース列（ソースは常に 1 件以上）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub description: String,
    pub sources: Vec<SourceRecord>,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            description: String::new(),
            sources: vec![SourceRecord::default()],
        }
    }
}

impl Draft {
    fn from_part(part: &Part) -> Result<Self, CatalogError> {
        Ok(Self {
            description: part.description(),
            sources: part.sources()?,
        })
    }

    fn to_update(&self) -> PartUpdate {
        PartUpdate::from_draft(&self.description, &self.sources)
    }

    fn source_mut(&mut self, position: usize) -> Result<&mut SourceRecord, CatalogError> {
        let len = self.sources.len();
        position
            .checked_sub(1)
            .and_then(|i| self.sources.get_mut(i))
            .ok_or(CatalogError::SourceOutOfRange { position, len })
    }
}

pub struct PartEditor {
    state: EditorState,
    /// 次に load する対象（リビジョン作成後は新しい ID）
    target: Option<PartId>,
    part: Option<Part>,
    draft: Draft,
    pending: Option<Ticket>,
    tickets: TicketCounter,
    log: Arc<dyn Log>,
}

impl PartEditor {
    pub fn new(log: Arc<dyn Log>) -> Self {
        Self {
            state: EditorState::Unloaded,
            target: None,
            part: None,
            draft: Draft::default(),
            pending: None,
            tickets: TicketCounter::default(),
            log,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn target(&self) -> Option<&PartId> {
        self.target.as_ref()
    }

    /// 最後に読み込んだ（または保存で受け取った）部品
    pub fn part(&self) -> Option<&Part> {
        self.part.as_ref()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    fn issue(&mut self, request: Request) -> Envelope {
        let ticket = self.tickets.issue();
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, "request issued")
                .layer("usecase")
                .kind("request")
                .field("request", request.name())
                .field("subject", request.subject())
                .field("ticket", ticket.value()),
        );
        self.pending = Some(ticket);
        Envelope { ticket, request }
    }

    /// 応答が今待っているものか（状態とチケットの両方が一致）
    fn is_current(&self, ticket: Ticket, expected: EditorState, what: &str) -> bool {
        if self.state == expected && self.pending == Some(ticket) {
            return true;
        }
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, "stale reply discarded")
                .layer("usecase")
                .kind("stale")
                .field("reply", what)
                .field("ticket", ticket.value())
                .field("state", self.state.to_string()),
        );
        false
    }

    /// 保存・リビジョン作成の実行中なら OperationInProgress
    fn ensure_idle(&self) -> Result<(), CatalogError> {
        if !self.state.is_busy() {
            return Ok(());
        }
        let operation = match self.state {
            EditorState::RevisionPending => "revision",
            _ => "save",
        };
        Err(CatalogError::OperationInProgress {
            operation,
            part: self.target.clone().unwrap_or_default(),
        })
    }

    /// 部品詳細を要求する。読み込み中に呼べば前の応答は捨てられる。
    /// 未保存の編集があるときは受け付けない（discard_edits か save を先に）。
    pub fn load(&mut self, id: PartId) -> Result<Envelope, CatalogError> {
        self.ensure_idle()?;
        if self.state == EditorState::Editing {
            return Err(CatalogError::invalid_state("load a part", "there are unsaved edits"));
        }
        self.target = Some(id.clone());
        self.state = EditorState::Loading;
        Ok(self.issue(Request::GetPart(id)))
    }

    /// 現在の対象を読み直す
    pub fn reload(&mut self) -> Result<Envelope, CatalogError> {
        let id = self
            .target
            .clone()
            .ok_or_else(|| CatalogError::invalid_state("reload", "no part is selected"))?;
        self.load(id)
    }

    /// 部品詳細の応答を反映する
    pub fn apply_part(
        &mut self,
        ticket: Ticket,
        result: Result<Part, Error>,
    ) -> Result<ReplyOutcome, CatalogError> {
        if !self.is_current(ticket, EditorState::Loading, "part") {
            return Ok(ReplyOutcome::Stale);
        }
        self.pending = None;
        let loaded = result
            .map_err(|e| {
                let what = format!("part {}", self.target.clone().unwrap_or_default());
                CatalogError::fetch_failed(what, &e)
            })
            .and_then(|part| Draft::from_part(&part).map(|draft| (part, draft)));
        match loaded {
            Ok((part, draft)) => {
                self.target = Some(part.id().clone());
                self.part = Some(part);
                self.draft = draft;
                self.state = EditorState::Loaded;
                Ok(ReplyOutcome::Applied)
            }
            Err(e) => {
                self.restore_after_failed_load();
                Err(e)
            }
        }
    }

    /// 読み込み失敗: 保持中の部品があればそれに戻る
    fn restore_after_failed_load(&mut self) {
        match &self.part {
            Some(part) => {
                self.target = Some(part.id().clone());
                self.state = EditorState::Loaded;
            }
            None => self.state = EditorState::Unloaded,
        }
    }

    fn ensure_editable(&self, operation: &'static str) -> Result<(), CatalogError> {
        self.ensure_idle()?;
        if !self.state.is_editable() {
            return Err(CatalogError::invalid_state(operation, self.state));
        }
        Ok(())
    }

    /// 手元の値だけを変える（通信しない）
    pub fn edit(&mut self, field: EditField, value: &str) -> Result<(), CatalogError> {
        self.ensure_editable("edit")?;
        match field {
            EditField::Description => self.draft.description = value.to_string(),
            EditField::Manufacturer { position } => {
                self.draft.source_mut(position)?.manufacturer = value.to_string()
            }
            EditField::Mpn { position } => self.draft.source_mut(position)?.mpn = value.to_string(),
        }
        self.state = EditorState::Editing;
        Ok(())
    }

    /// 空のソースを末尾に足す。足した位置（1 始まり）を返す。
    pub fn add_source(&mut self) -> Result<usize, CatalogError> {
        self.ensure_editable("add a source")?;
        self.draft.sources.push(SourceRecord::default());
        self.state = EditorState::Editing;
        Ok(self.draft.sources.len())
    }

    /// ソースを 1 件消す。最後の 1 件を消したら空の 1 件を残す。
    pub fn remove_source(&mut self, position: usize) -> Result<(), CatalogError> {
        self.ensure_editable("remove a source")?;
        let len = self.draft.sources.len();
        if position == 0 || position > len {
            return Err(CatalogError::SourceOutOfRange { position, len });
        }
        self.draft.sources.remove(position - 1);
        if self.draft.sources.is_empty() {
            self.draft.sources.push(SourceRecord::default());
        }
        self.state = EditorState::Editing;
        Ok(())
    }

    /// 編集を捨てて保持中の部品から作り直す
    pub fn discard_edits(&mut self) -> Result<(), CatalogError> {
        self.ensure_editable("discard edits")?;
        if let Some(part) = &self.part {
            self.draft = Draft::from_part(part)?;
        }
        self.state = EditorState::Loaded;
        Ok(())
    }

    /// 保存したら何が変わるか
    pub fn pending_changes(&self) -> Result<Vec<FieldChange>, CatalogError> {
        let part = self
            .part
            .as_ref()
            .ok_or_else(|| CatalogError::invalid_state("compare edits", self.state))?;
        diff_fields(part, &self.draft.to_update())
    }

    /// 編集内容を送る。Editing からだけ。
    pub fn save(&mut self) -> Result<Envelope, CatalogError> {
        self.ensure_idle()?;
        if self.state != EditorState::Editing {
            return Err(CatalogError::invalid_state("save", self.state));
        }
        let id = self
            .part
            .as_ref()
            .map(|p| p.id().clone())
            .ok_or_else(|| CatalogError::invalid_state("save", "no part is loaded"))?;
        let update = self.draft.to_update();
        self.state = EditorState::Saving;
        Ok(self.issue(Request::UpdatePart(id, update)))
    }

    /// 保存応答を反映する。成功ならサーバーの部品で置き換え、失敗なら編集を残して Editing に戻る。
    pub fn apply_updated(
        &mut self,
        ticket: Ticket,
        result: Result<Part, Error>,
    ) -> Result<ReplyOutcome, CatalogError> {
        if !self.is_current(ticket, EditorState::Saving, "updated") {
            return Ok(ReplyOutcome::Stale);
        }
        self.pending = None;
        let part_id = self.target.clone().unwrap_or_default();
        let saved = result
            .map_err(|e| CatalogError::SaveFailed {
                part: part_id,
                reason: e.to_string(),
            })
            .and_then(|part| Draft::from_part(&part).map(|draft| (part, draft)));
        match saved {
            Ok((part, draft)) => {
                self.target = Some(part.id().clone());
                self.part = Some(part);
                self.draft = draft;
                self.state = EditorState::Loaded;
                Ok(ReplyOutcome::Applied)
            }
            Err(e) => {
                self.state = EditorState::Editing;
                Err(e)
            }
        }
    }

    /// 保持中の部品の新しいリビジョンを要求する。Loaded からだけ。
    pub fn start_revision(&mut self) -> Result<Envelope, CatalogError> {
        self.ensure_idle()?;
        if self.state != EditorState::Loaded {
            return Err(CatalogError::invalid_state("start a revision", self.state));
        }
        let id = self
            .part
            .as_ref()
            .map(|p| p.id().clone())
            .ok_or_else(|| CatalogError::invalid_state("start a revision", "no part is loaded"))?;
        self.state = EditorState::RevisionPending;
        Ok(self.issue(Request::StartRevision(id)))
    }

    /// リビジョン作成の応答を反映する。成功したら古い部品を捨て、新しい ID の読み込みを続けて返す。
    pub fn apply_revision(
        &mut self,
        ticket: Ticket,
        result: Result<PartId, Error>,
    ) -> Result<ReplyOutcome, CatalogError> {
        if !self.is_current(ticket, EditorState::RevisionPending, "revision") {
            return Ok(ReplyOutcome::Stale);
        }
        self.pending = None;
        match result {
            Ok(new_id) => {
                self.part = None;
                self.draft = Draft::default();
                self.state = EditorState::Unloaded;
                Ok(ReplyOutcome::FollowUp(self.load(new_id)?))
            }
            Err(e) => {
                self.state = EditorState::Loaded;
                Err(CatalogError::RevisionFailed {
                    part: self.target.clone().unwrap_or_default(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
