//! カタログサービス Outbound ポート
//!
//! リモートのカタログ（カテゴリ・部品・リビジョン）への 1 往復を 1 メソッドで表す。
//! 失敗は common::error::Error（Http / Json）で返し、usecase 側で CatalogError に変換する。

use crate::domain::{Category, CategoryId, NewPart, Part, PartId, PartSummary, PartUpdate};
use common::error::Error;
use serde_json::Value;

/// カタログサービス抽象（Outbound ポート）
///
/// 実装は `crate::adapter::HttpCatalog` やテスト用の `StubCatalog` など。
pub trait CatalogService: Send + Sync {
    /// カテゴリ一覧
    fn list_categories(&self) -> Result<Vec<Category>, Error>;

    /// カテゴリ内の部品一覧。形の検査は呼び出し側で行うため生の JSON を返す。
    fn list_parts(&self, category: &CategoryId) -> Result<Value, Error>;

    /// 部品詳細
    fn get_part(&self, part: &PartId) -> Result<Part, Error>;

    /// 部品を作る。応答本文が空なら None。
    fn create_part(&self, new_part: &NewPart) -> Result<Option<PartSummary>, Error>;

    /// 説明文・ソースを更新し、サーバー側の正となる部品を返す
    fn update_part(&self, part: &PartId, update: &PartUpdate) -> Result<Part, Error>;

    /// 新しいリビジョンを作り、その部品 ID を返す
    fn start_revision(&self, part: &PartId) -> Result<PartId, Error>;

    /// 疎通確認
    fn health(&self) -> Result<(), Error>;
}
