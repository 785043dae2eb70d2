//! 部品（リビジョン付き）と更新ペイロード
//!
//! フィールドマップが説明文・ソースの唯一の正。`description()` / `sources()` は
//! そこから導出するだけで、別に保持しない。

use crate::domain::source::{self, SourceRecord};
use crate::domain::{CatalogError, CategoryId, PartId, RevisionLabel};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// フィールド値のラッパー。`value` 以外のメタデータ（visible 等）はそのまま保持する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            extra: Map::new(),
        }
    }
}

/// キー → フィールド値
pub type FieldMap = BTreeMap<String, FieldValue>;

/// 部品詳細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    id: PartId,
    #[serde(default)]
    revision: RevisionLabel,
    #[serde(default)]
    fields: FieldMap,
    /// name / symbolIdStr / exclude_from_bom などバックエンドが付ける属性
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Part {
    pub fn new(id: impl Into<PartId>, revision: impl Into<RevisionLabel>) -> Self {
        Self {
            id: id.into(),
            revision: revision.into(),
            fields: FieldMap::new(),
            extra: Map::new(),
        }
    }

    /// フィールドを 1 つ足したものを返す（組み立て用）
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), FieldValue::new(value));
        self
    }

    pub fn id(&self) -> &PartId {
        &self.id
    }

    pub fn revision(&self) -> &RevisionLabel {
        &self.revision
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// バックエンドが付けた表示名（無ければ None）
    pub fn name(&self) -> Option<&str> {
        self.extra
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// フィールド以外の属性（表示用にそのまま渡す）
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn description(&self) -> String {
        source::decode_description(&self.fields)
    }

    pub fn sources(&self) -> Result<Vec<SourceRecord>, CatalogError> {
        source::decode_sources(&self.fields)
    }
}

/// 更新要求の本文 `{description, sources}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartUpdate {
    pub description: String,
    pub sources: Vec<SourceRecord>,
}

impl PartUpdate {
    /// 編集中の状態から作る。末尾の空ソースはここで落とす。
    pub fn from_draft(description: &str, sources: &[SourceRecord]) -> Self {
        Self {
            description: description.to_string(),
            sources: source::trim_trailing_empty(sources).to_vec(),
        }
    }

    /// 番号付きキーでの表現
    pub fn fields(&self) -> Vec<(String, String)> {
        source::encode(&self.sources, &self.description)
    }
}

/// 作成要求の本文 `{id, name, category}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPart {
    pub id: PartId,
    pub name: String,
    pub category: CategoryId,
}

/// 保存前の差分 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Added { key: String, value: String },
    Changed { key: String, before: String, after: String },
    Removed { key: String, before: String },
}

impl FieldChange {
    pub fn key(&self) -> &str {
        match self {
            Self::Added { key, .. } | Self::Changed { key, .. } | Self::Removed { key, .. } => key,
        }
    }
}

/// 保持中の部品に対して、更新で何が変わるかを返す。
///
/// 無いキーと空文字は同じとみなす。末尾で落とされたソースのキーは Removed になる。
pub fn diff_fields(part: &Part, update: &PartUpdate) -> Result<Vec<FieldChange>, CatalogError> {
    let mut changes = Vec::new();
    for (key, after) in update.fields() {
        match current_value(part, &key) {
            Some(before) if before == after => {}
            Some(before) => changes.push(FieldChange::Changed {
                key,
                before: before.to_string(),
                after,
            }),
            None if after.is_empty() => {}
            None => changes.push(FieldChange::Added { key, value: after }),
        }
    }

    let held = part.sources()?;
    let kept = update.sources.len();
    for position in kept + 1..=held.len() {
        for key in [source::manufacturer_key(position), source::mpn_key(position)] {
            if let Some(before) = current_value(part, &key).filter(|v| !v.is_empty()) {
                changes.push(FieldChange::Removed {
                    key,
                    before: before.to_string(),
                });
            }
        }
    }
    Ok(changes)
}

fn current_value<'a>(part: &'a Part, key: &str) -> Option<&'a str> {
    part.fields.get(key).map(|f| f.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op_amp() -> Part {
        Part::new("IC-001-0001", "0001")
            .with_field("Description", "dual op-amp")
            .with_field("Manufacturer", "TI")
            .with_field("MPN", "LM358")
            .with_field("Manufacturer2", "ON")
            .with_field("MPN2", "NE555")
    }

    #[test]
    fn part_deserializes_detail_and_keeps_extra() {
        let part: Part = serde_json::from_value(json!({
            "id": "RES-001-0001",
            "name": "10k 0603",
            "symbolIdStr": "Device:R",
            "exclude_from_bom": "false",
            "revision": "0001",
            "fields": {
                "Description": { "value": "10k 0603" },
                "Manufacturer": { "value": "Yageo", "visible": "False" },
                "MPN": { "value": "RC0603FR-0710KL" }
            }
        }))
        .unwrap();
        assert_eq!(part.id().as_str(), "RES-001-0001");
        assert_eq!(part.revision().as_str(), "0001");
        assert_eq!(part.name(), Some("10k 0603"));
        assert_eq!(part.extra()["symbolIdStr"], "Device:R");
        assert_eq!(
            part.fields()["Manufacturer"].extra["visible"],
            json!("False")
        );
        assert_eq!(part.description(), "10k 0603");
        assert_eq!(
            part.sources().unwrap(),
            vec![SourceRecord::new("Yageo", "RC0603FR-0710KL")]
        );

        let back = serde_json::to_value(&part).unwrap();
        assert_eq!(back["fields"]["Manufacturer"]["visible"], "False");
        assert_eq!(back["exclude_from_bom"], "false");
    }

    #[test]
    fn part_without_fields_or_revision() {
        let part: Part = serde_json::from_value(json!({ "id": "DOC-001-0001" })).unwrap();
        assert!(part.fields().is_empty());
        assert_eq!(part.revision().as_str(), "");
        assert_eq!(part.sources().unwrap(), vec![SourceRecord::default()]);
    }

    #[test]
    fn update_serializes_request_body() {
        let update = PartUpdate::from_draft(
            "dual op-amp",
            &[SourceRecord::new("TI", "LM358"), SourceRecord::default()],
        );
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "description": "dual op-amp",
                "sources": [{ "manufacturer": "TI", "mpn": "LM358" }]
            })
        );
    }

    #[test]
    fn new_part_serializes_request_body() {
        let req = NewPart {
            id: PartId::new("CAP-002-0001"),
            name: "100nF".to_string(),
            category: CategoryId::new("CAP"),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "id": "CAP-002-0001", "name": "100nF", "category": "CAP" })
        );
    }

    #[test]
    fn diff_reports_changed_added_and_removed() {
        let part = op_amp();
        let update = PartUpdate::from_draft(
            "dual op-amp, SOIC",
            &[SourceRecord::new("TI", "LM358DR")],
        );
        let changes = diff_fields(&part, &update).unwrap();
        assert_eq!(
            changes,
            vec![
                FieldChange::Changed {
                    key: "Description".to_string(),
                    before: "dual op-amp".to_string(),
                    after: "dual op-amp, SOIC".to_string(),
                },
                FieldChange::Changed {
                    key: "MPN".to_string(),
                    before: "LM358".to_string(),
                    after: "LM358DR".to_string(),
                },
                FieldChange::Removed {
                    key: "Manufacturer2".to_string(),
                    before: "ON".to_string(),
                },
                FieldChange::Removed {
                    key: "MPN2".to_string(),
                    before: "NE555".to_string(),
                },
            ]
        );
    }

    #[test]
    fn diff_is_empty_when_nothing_changed() {
        let part = op_amp();
        let update = PartUpdate::from_draft(&part.description(), &part.sources().unwrap());
        assert!(diff_fields(&part, &update).unwrap().is_empty());
    }

    #[test]
    fn diff_treats_missing_key_as_empty() {
        let part = Part::new("IC-002-0001", "0001");
        let update = PartUpdate::from_draft("", &[SourceRecord::new("ST", "")]);
        let changes = diff_fields(&part, &update).unwrap();
        assert_eq!(
            changes,
            vec![FieldChange::Added {
                key: "Manufacturer".to_string(),
                value: "ST".to_string(),
            }]
        );
        assert_eq!(changes[0].key(), "Manufacturer");
    }

    #[test]
    fn diff_ignores_trailing_empty_source_in_held_part() {
        let part = Part::new("RES-003-0001", "0001")
            .with_field("Manufacturer", "Yageo")
            .with_field("MPN", "RC0603")
            .with_field("Manufacturer2", "")
            .with_field("MPN2", "");
        let update = PartUpdate::from_draft(&part.description(), &part.sources().unwrap());
        assert!(diff_fields(&part, &update).unwrap().is_empty());
    }
}
