//! セッション: ナビゲータ・エディタ・ディスパッチャを 1 つの状態コンテナにまとめる
//!
//! 要求はすべてここから Dispatcher に渡し、届いた応答を発行元のコンポーネントへ振り分ける。
//! 状態を変えるのは応答を受け取ったコンポーネントだけ。

use crate::domain::{
    CatalogError, Category, CategoryId, EditField, FieldChange, PartId, Ticket,
};
use crate::ports::outbound::{Delivery, Envelope, Reply, RequestDispatcher};
use crate::usecase::{CatalogNavigator, PartEditor, ReplyOutcome};
use common::ports::outbound::{Log, LogLevel, LogRecord};
use std::sync::Arc;

/// 応答 1 件を処理した結果
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// カテゴリ一覧を受け取った（件数）
    CategoriesLoaded(usize),
    /// 選択中カテゴリの部品一覧を受け取った
    PartsLoaded(CategoryId),
    PartLoaded(PartId),
    Saved(PartId),
    /// 新しいリビジョンの ID。続けてその読み込みが発行される。
    RevisionCreated(PartId),
    PartCreated(PartId),
    /// 古い応答を捨てた
    Discarded(Ticket),
    Failed(CatalogError),
}

pub struct CatalogSession {
    navigator: CatalogNavigator,
    editor: PartEditor,
    dispatcher: Box<dyn RequestDispatcher>,
    outstanding: usize,
    log: Arc<dyn Log>,
}

impl CatalogSession {
    pub fn new(dispatcher: Box<dyn RequestDispatcher>, log: Arc<dyn Log>) -> Self {
        Self {
            navigator: CatalogNavigator::new(Arc::clone(&log)),
            editor: PartEditor::new(Arc::clone(&log)),
            dispatcher,
            outstanding: 0,
            log,
        }
    }

    pub fn navigator(&self) -> &CatalogNavigator {
        &self.navigator
    }

    pub fn editor(&self) -> &PartEditor {
        &self.editor
    }

    /// 応答待ちの要求が無い
    pub fn is_idle(&self) -> bool {
        self.outstanding == 0
    }

    fn submit(&mut self, envelope: Envelope) {
        self.outstanding += 1;
        self.dispatcher.submit(envelope);
    }

    fn submit_result(&mut self, envelope: Result<Envelope, CatalogError>) -> Result<(), CatalogError> {
        self.submit(envelope?);
        Ok(())
    }

    /// セッション開始: カテゴリ一覧を要求する（取得済みなら何もしない）
    pub fn start(&mut self) {
        if let Some(envelope) = self.navigator.list_categories() {
            self.submit(envelope);
        }
    }

    pub fn set_filter(&mut self, term: &str) {
        self.navigator.set_filter(term);
    }

    pub fn visible_categories(&self) -> Vec<&Category> {
        self.navigator.visible_categories()
    }

    /// カテゴリを選ぶ。一覧の取得を発行したら true。
    pub fn select_category(&mut self, id: CategoryId) -> bool {
        match self.navigator.select_category(id) {
            Some(envelope) => {
                self.submit(envelope);
                true
            }
            None => false,
        }
    }

    pub fn refresh_parts(&mut self) -> Result<(), CatalogError> {
        let envelope = self.navigator.refresh_parts();
        self.submit_result(envelope)
    }

    pub fn create_part(&mut self, id: &str, name: &str) -> Result<(), CatalogError> {
        let envelope = self.navigator.create_part(id, name);
        self.submit_result(envelope)
    }

    pub fn load_part(&mut self, id: PartId) -> Result<(), CatalogError> {
        let envelope = self.editor.load(id);
        self.submit_result(envelope)
    }

    pub fn reload(&mut self) -> Result<(), CatalogError> {
        let envelope = self.editor.reload();
        self.submit_result(envelope)
    }

    pub fn edit(&mut self, field: EditField, value: &str) -> Result<(), CatalogError> {
        self.editor.edit(field, value)
    }

    pub fn add_source(&mut self) -> Result<usize, CatalogError> {
        self.editor.add_source()
    }

    pub fn remove_source(&mut self, position: usize) -> Result<(), CatalogError> {
        self.editor.remove_source(position)
    }

    pub fn discard_edits(&mut self) -> Result<(), CatalogError> {
        self.editor.discard_edits()
    }

    pub fn pending_changes(&self) -> Result<Vec<FieldChange>, CatalogError> {
        self.editor.pending_changes()
    }

    pub fn save(&mut self) -> Result<(), CatalogError> {
        let envelope = self.editor.save();
        self.submit_result(envelope)
    }

    pub fn start_revision(&mut self) -> Result<(), CatalogError> {
        let envelope = self.editor.start_revision();
        self.submit_result(envelope)
    }

    /// 届いている応答をすべて反映する（待たない）
    pub fn pump(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(delivery) = self.dispatcher.try_recv() {
            events.push(self.handle(delivery));
        }
        events
    }

    /// 応答待ちが無くなるまで待って反映する（続けて発行された要求も含む）
    pub fn wait_idle(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while self.outstanding > 0 {
            match self.dispatcher.recv() {
                Some(delivery) => events.push(self.handle(delivery)),
                None => {
                    let _ = self.log.log(
                        &LogRecord::new(LogLevel::Warn, "dispatcher closed with requests outstanding")
                            .layer("usecase")
                            .kind("error")
                            .field("outstanding", self.outstanding),
                    );
                    self.outstanding = 0;
                }
            }
        }
        events
    }

    fn handle(&mut self, delivery: Delivery) -> SessionEvent {
        self.outstanding = self.outstanding.saturating_sub(1);
        let Delivery { ticket, reply } = delivery;
        let creating = self.navigator.creating().cloned();
        let (kind, outcome) = match reply {
            Reply::Categories(r) => (ReplyKind::Categories, self.navigator.apply_categories(ticket, r)),
            Reply::Parts(r) => (ReplyKind::Parts, self.navigator.apply_parts(ticket, r)),
            Reply::Created(r) => (ReplyKind::Created, self.navigator.apply_created(ticket, r)),
            Reply::Part(r) => (ReplyKind::Part, self.editor.apply_part(ticket, r)),
            Reply::Updated(r) => (ReplyKind::Updated, self.editor.apply_updated(ticket, r)),
            Reply::Revision(r) => (ReplyKind::Revision, self.editor.apply_revision(ticket, r)),
        };
        let follow_up = match outcome {
            Ok(ReplyOutcome::Stale) => return SessionEvent::Discarded(ticket),
            Ok(ReplyOutcome::Applied) => None,
            Ok(ReplyOutcome::FollowUp(next)) => Some(next),
            Err(e) => {
                let _ = self.log.log(
                    &LogRecord::new(LogLevel::Warn, e.to_string())
                        .layer("usecase")
                        .kind("error")
                        .field("reply", kind.as_str())
                        .field("ticket", ticket.value()),
                );
                return SessionEvent::Failed(e);
            }
        };
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, "reply applied")
                .layer("usecase")
                .kind("reply")
                .field("reply", kind.as_str())
                .field("ticket", ticket.value()),
        );

        let current_part = || self.editor.target().cloned().unwrap_or_default();
        let event = match kind {
            ReplyKind::Categories => SessionEvent::CategoriesLoaded(self.navigator.categories().len()),
            ReplyKind::Parts => {
                SessionEvent::PartsLoaded(self.navigator.selected().cloned().unwrap_or_default())
            }
            ReplyKind::Created => SessionEvent::PartCreated(creating.unwrap_or_default()),
            ReplyKind::Part => SessionEvent::PartLoaded(current_part()),
            ReplyKind::Updated => SessionEvent::Saved(current_part()),
            ReplyKind::Revision => SessionEvent::RevisionCreated(current_part()),
        };
        if let Some(next) = follow_up {
            self.submit(next);
        }
        event
    }
}

#[derive(Debug, Clone, Copy)]
enum ReplyKind {
    Categories,
    Parts,
    Created,
    Part,
    Updated,
    Revision,
}

impl ReplyKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Parts => "parts",
            Self::Created => "created",
            Self::Part => "part",
            Self::Updated => "updated",
            Self::Revision => "revision",
        }
    }
}
