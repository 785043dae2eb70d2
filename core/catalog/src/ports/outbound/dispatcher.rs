//! 要求ディスパッチャ Outbound ポート
//!
//! 要求（Request）をチケット付きで投げ、応答（Reply）を同じチケット付きで受け取る。
//! 応答の到着順は発行順と一致するとは限らない。

use crate::domain::{
    Category, CategoryId, NewPart, Part, PartId, PartSummary, PartUpdate, Ticket,
};
use crate::ports::outbound::CatalogService;
use common::error::Error;
use serde_json::Value;

/// カタログサービスへの要求 1 件
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListCategories,
    ListParts(CategoryId),
    GetPart(PartId),
    CreatePart(NewPart),
    UpdatePart(PartId, PartUpdate),
    StartRevision(PartId),
}

impl Request {
    /// サービスを呼んで応答を作る（ディスパッチャ実装から呼ぶ）
    pub fn run(&self, service: &dyn CatalogService) -> Reply {
        match self {
            Self::ListCategories => Reply::Categories(service.list_categories()),
            Self::ListParts(category) => Reply::Parts(service.list_parts(category)),
            Self::GetPart(part) => Reply::Part(service.get_part(part)),
            Self::CreatePart(new_part) => Reply::Created(service.create_part(new_part)),
            Self::UpdatePart(part, update) => Reply::Updated(service.update_part(part, update)),
            Self::StartRevision(part) => Reply::Revision(service.start_revision(part)),
        }
    }

    /// ログ用の短い名前
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListCategories => "list_categories",
            Self::ListParts(_) => "list_parts",
            Self::GetPart(_) => "get_part",
            Self::CreatePart(_) => "create_part",
            Self::UpdatePart(..) => "update_part",
            Self::StartRevision(_) => "start_revision",
        }
    }

    /// ログ用の対象 ID（無ければ空文字）
    pub fn subject(&self) -> &str {
        match self {
            Self::ListCategories => "",
            Self::ListParts(category) => category.as_str(),
            Self::GetPart(part) | Self::UpdatePart(part, _) | Self::StartRevision(part) => {
                part.as_str()
            }
            Self::CreatePart(new_part) => new_part.id.as_str(),
        }
    }
}

/// 要求 1 件に対する応答
#[derive(Debug, Clone)]
pub enum Reply {
    Categories(Result<Vec<Category>, Error>),
    Parts(Result<Value, Error>),
    Part(Result<Part, Error>),
    Created(Result<Option<PartSummary>, Error>),
    Updated(Result<Part, Error>),
    Revision(Result<PartId, Error>),
}

/// チケット付きの要求
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub ticket: Ticket,
    pub request: Request,
}

/// チケット付きの応答
#[derive(Debug, Clone)]
pub struct Delivery {
    pub ticket: Ticket,
    pub reply: Reply,
}

/// 要求を実行し応答を返す Outbound ポート
///
/// 実装は `InlineDispatcher`（その場で実行）や `ThreadedDispatcher`（ワーカースレッドで実行）。
pub trait RequestDispatcher: Send {
    /// 要求を投げる。呼び出し元をブロックしない実装が望ましい。
    fn submit(&mut self, envelope: Envelope);

    /// 届いている応答を 1 件取り出す（無ければ None、待たない）
    fn try_recv(&mut self) -> Option<Delivery>;

    /// 応答を 1 件待って取り出す。もう届く見込みが無ければ None。
    fn recv(&mut self) -> Option<Delivery>;
}
