//! catalog コマンドの enum（Command Pattern）
//!
//! CLI 引数の解析結果をサブコマンドごとに明示する。

use crate::domain::{CategoryId, PartId};

/// catalog の実行モード
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogCommand {
    /// カテゴリ一覧（部分一致フィルタ付き）
    Categories { filter: Option<String> },
    /// カテゴリ内の部品一覧
    Parts { category: CategoryId },
    /// 部品詳細
    Show { part: PartId },
    /// 説明文・ソースの編集と保存
    Edit {
        part: PartId,
        edits: Vec<EditOp>,
        dry_run: bool,
    },
    /// 新しいリビジョンを作る
    Revise { part: PartId },
    /// カテゴリに部品を作る
    Create {
        category: CategoryId,
        id: PartId,
        name: String,
    },
    /// サーバーの疎通確認
    Ping,
}

/// 編集 1 件（position は 1 始まり）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Description(String),
    Manufacturer { position: usize, value: String },
    Mpn { position: usize, value: String },
    AddSource { manufacturer: String, mpn: String },
    RemoveSource { position: usize },
}
