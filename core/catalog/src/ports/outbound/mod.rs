//! Outbound ポート: アプリが外界（カタログサービス・要求の実行）を使うための trait

pub mod catalog_service;
pub mod dispatcher;

pub use catalog_service::CatalogService;
pub use dispatcher::{Delivery, Envelope, Reply, Request, RequestDispatcher};
