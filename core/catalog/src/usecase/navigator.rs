//! カタログナビゲータ: カテゴリ一覧と、選択中カテゴリの部品一覧を保持する
//!
//! 要求は Envelope として返すだけで、実行はセッションが Dispatcher に任せる。
//! 応答はチケットで照合し、もう待っていない応答は捨てる。

use crate::domain::{
    filter_categories, CatalogError, Category, CategoryId, NewPart, PartId, PartSummary, Ticket,
    TicketCounter,
};
use crate::ports::outbound::{Envelope, Request};
use crate::usecase::ReplyOutcome;
use common::error::Error;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use serde_json::Value;
use std::sync::Arc;

/// カテゴリ一覧の取得状況（起動時に 1 回だけ取る）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoriesFetch {
    NotRequested,
    Pending(Ticket),
    Ready,
}

/// 作成要求の応答待ち
#[derive(Debug, Clone)]
struct PendingCreate {
    ticket: Ticket,
    part: PartId,
    category: CategoryId,
}

pub struct CatalogNavigator {
    categories: Vec<Category>,
    categories_fetch: CategoriesFetch,
    filter: String,
    selected: Option<CategoryId>,
    parts: Vec<PartSummary>,
    parts_pending: Option<Ticket>,
    create_pending: Option<PendingCreate>,
    tickets: TicketCounter,
    log: Arc<dyn Log>,
}

impl CatalogNavigator {
    pub fn new(log: Arc<dyn Log>) -> Self {
        Self {
            categories: Vec::new(),
            categories_fetch: CategoriesFetch::NotRequested,
            filter: String::new(),
            selected: None,
            parts: Vec::new(),
            parts_pending: None,
            create_pending: None,
            tickets: TicketCounter::default(),
            log,
        }
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
        Envelope { ticket, request }
    }

    fn discard(&self, what: &str, ticket: Ticket) -> ReplyOutcome {
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Debug, "stale reply discarded")
                .layer("usecase")
                .kind("stale")
                .field("reply", what)
                .field("ticket", ticket.value()),
        );
        ReplyOutcome::Stale
    }

    /// カテゴリ一覧を要求する。取得済み・取得中なら None（1 回だけ）。
    pub fn list_categories(&mut self) -> Option<Envelope> {
        if self.categories_fetch != CategoriesFetch::NotRequested {
            return None;
        }
        let envelope = self.issue(Request::ListCategories);
        self.categories_fetch = CategoriesFetch::Pending(envelope.ticket);
        Some(envelope)
    }

    /// カテゴリ一覧の応答を反映する。失敗したら再要求できる状態に戻す。
    pub fn apply_categories(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Category>, Error>,
    ) -> Result<ReplyOutcome, CatalogError> {
        if self.categories_fetch != CategoriesFetch::Pending(ticket) {
            return Ok(self.discard("categories", ticket));
        }
        match result {
            Ok(categories) => {
                self.categories = categories;
                self.categories_fetch = CategoriesFetch::Ready;
                Ok(ReplyOutcome::Applied)
            }
            Err(e) => {
                self.categories_fetch = CategoriesFetch::NotRequested;
                Err(CatalogError::fetch_failed("categories", &e))
            }
        }
    }

    /// 保持しているカテゴリ全件（フィルタ前）
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// 表示用のフィルタ語を設定する。保持している一覧は変えず、通信もしない。
    pub fn set_filter(&mut self, term: &str) {
        self.filter = term.to_string();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// フィルタを適用した表示用の一覧
    pub fn visible_categories(&self) -> Vec<&Category> {
        filter_categories(&self.categories, &self.filter)
    }

    pub fn selected(&self) -> Option<&CategoryId> {
        self.selected.as_ref()
    }

    /// 選択中カテゴリの部品一覧
    pub fn parts(&self) -> &[PartSummary] {
        &self.parts
    }

    /// 部品一覧の応答待ちか
    pub fn is_loading_parts(&self) -> bool {
        self.parts_pending.is_some()
    }

    /// カテゴリを選ぶ。選択中と同じなら何もしない（None）。
    /// 違えば部品一覧をすぐ空にしてから一覧を要求する。
    pub fn select_category(&mut self, id: CategoryId) -> Option<Envelope> {
        if self.selected.as_ref() == Some(&id) {
            return None;
        }
        self.parts.clear();
        self.selected = Some(id.clone());
        let envelope = self.issue(Request::ListParts(id));
        self.parts_pending = Some(envelope.ticket);
        Some(envelope)
    }

    /// 選択中カテゴリの部品一覧を取り直す（同一カテゴリの抑止を通さない）
    pub fn refresh_parts(&mut self) -> Result<Envelope, CatalogError> {
        let id = self
            .selected
            .clone()
            .ok_or_else(|| CatalogError::invalid_state("refresh parts", "no category is selected"))?;
        let envelope = self.issue(Request::ListParts(id));
        self.parts_pending = Some(envelope.ticket);
        Ok(envelope)
    }

    /// 部品一覧の応答を反映する。配列でない応答・失敗は空の一覧にする。
    pub fn apply_parts(
        &mut self,
        ticket: Ticket,
        result: Result<Value, Error>,
    ) -> Result<ReplyOutcome, CatalogError> {
        if self.parts_pending != Some(ticket) {
            return Ok(self.discard("parts", ticket));
        }
        self.parts_pending = None;
        let Some(category) = self.selected.clone() else {
            return Ok(self.discard("parts", ticket));
        };
        let decoded = result
            .map_err(|e| CatalogError::fetch_failed(format!("parts of {}", category), &e))
            .and_then(|value| PartSummary::list_from_json(&category, value));
        match decoded {
            Ok(parts) => {
                self.parts = parts;
                Ok(ReplyOutcome::Applied)
            }
            Err(e) => {
                self.parts.clear();
                Err(e)
            }
        }
    }

    /// 選択中カテゴリに部品を作る
    pub fn create_part(&mut self, id: &str, name: &str) -> Result<Envelope, CatalogError> {
        let category = self
            .selected
            .clone()
            .ok_or_else(|| CatalogError::invalid_state("create a part", "no category is selected"))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(CatalogError::invalid_state("create a part", "the part id is empty"));
        }
        if let Some(pending) = &self.create_pending {
            return Err(CatalogError::OperationInProgress {
                operation: "create",
                part: pending.part.clone(),
            });
        }
        let part = PartId::new(id);
        let envelope = self.issue(Request::CreatePart(NewPart {
            id: part.clone(),
            name: name.trim().to_string(),
            category: category.clone(),
        }));
        self.create_pending = Some(PendingCreate {
            ticket: envelope.ticket,
            part,
            category,
        });
        Ok(envelope)
    }

    /// 作成の応答を反映する。成功し、まだ同じカテゴリを選んでいれば一覧を取り直す。
    pub fn apply_created(
        &mut self,
        ticket: Ticket,
        result: Result<Option<PartSummary>, Error>,
    ) -> Result<ReplyOutcome, CatalogError> {
        let pending = match self.create_pending.take() {
            Some(p) if p.ticket == ticket => p,
            other => {
                self.create_pending = other;
                return Ok(self.discard("created", ticket));
            }
        };
        if let Err(e) = result {
            return Err(CatalogError::CreateFailed {
                part: pending.part,
                reason: e.to_string(),
            });
        }
        if self.selected.as_ref() != Some(&pending.category) {
            return Ok(ReplyOutcome::Applied);
        }
        Ok(ReplyOutcome::FollowUp(self.refresh_parts()?))
    }

    /// 作成した部品の ID（応答待ちの間だけ）
    pub fn creating(&self) -> Option<&PartId> {
        self.create_pending.as_ref().map(|p| &p.part)
    }
}
