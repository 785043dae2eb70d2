//! カテゴリと部品一覧の要約

use crate::domain::{CatalogError, CategoryId, PartId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// カテゴリ（クライアントからは不変。作成・削除はバックエンドのみ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
            description: None,
        }
    }

    /// 大文字小文字を無視して id または name に部分一致するか
    pub fn matches(&self, term_lower: &str) -> bool {
        self.id.to_lowercase().contains(term_lower)
            || self
                .name
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(term_lower)
    }
}

/// 表示用の部分集合を返す（元の一覧は変更しない）。空の term は全件。
pub fn filter_categories<'a>(categories: &'a [Category], term: &str) -> Vec<&'a Category> {
    let term = term.trim().to_lowercase();
    categories.iter().filter(|c| c.matches(&term)).collect()
}

/// 部品一覧の 1 件（Part の読み取り専用の射影）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSummary {
    pub id: PartId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PartSummary {
    /// 部品一覧の応答を解釈する。配列でなければ MalformedResponse。
    pub fn list_from_json(category: &CategoryId, value: Value) -> Result<Vec<Self>, CatalogError> {
        let what = format!("parts of {}", category);
        match value {
            Value::Array(_) => serde_json::from_value(value)
                .map_err(|e| CatalogError::malformed(what, e.to_string())),
            Value::Null => Err(CatalogError::malformed(what, "expected an array, got null")),
            other => Err(CatalogError::malformed(
                what,
                format!("expected an array, got {}", json_kind(&other)),
            )),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
