//! ソース（メーカー / 型番の組）とフィールドマップの相互変換
//!
//! バックエンドはソースを番号付きキーで平坦に持つ:
//! 1 番目は `Manufacturer` / `MPN`、n 番目（n >= 2）は `Manufacturer{n}` / `MPN{n}`。
//! 番号付きキーを扱うのはこのモジュールだけで、他は `Vec<SourceRecord>` だけを見る。

use crate::domain::{CatalogError, FieldMap};
use serde::{Deserialize, Serialize};

pub const DESCRIPTION_KEY: &str = "Description";
pub const MANUFACTURER_KEY: &str = "Manufacturer";
pub const MPN_KEY: &str = "MPN";

/// デコードで辿るソース番号の上限。超えたら MalformedFieldMap。
pub const MAX_SOURCES: usize = 10_000;

/// メーカーと型番の組。位置（1 始まり）だけが識別子。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub manufacturer: String,
    pub mpn: String,
}

impl SourceRecord {
    pub fn new(manufacturer: impl Into<String>, mpn: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            mpn: mpn.into(),
        }
    }

    /// メーカー・型番ともに空
    pub fn is_empty(&self) -> bool {
        self.manufacturer.is_empty() && self.mpn.is_empty()
    }
}

/// position 番目（1 始まり）のメーカーキー
pub fn manufacturer_key(position: usize) -> String {
    indexed_key(MANUFACTURER_KEY, position)
}

/// position 番目（1 始まり）の型番キー
pub fn mpn_key(position: usize) -> String {
    indexed_key(MPN_KEY, position)
}

fn indexed_key(base: &str, position: usize) -> String {
    if position <= 1 {
        base.to_string()
    } else {
        format!("{}{}", base, position)
    }
}

/// 説明文・ソースを表すキーか（`Description` / `Manufacturer{n}` / `MPN{n}`）
pub fn is_codec_key(key: &str) -> bool {
    key == DESCRIPTION_KEY
        || key
            .strip_prefix(MANUFACTURER_KEY)
            .or_else(|| key.strip_prefix(MPN_KEY))
            .map_or(false, |rest| rest.chars().all(|c| c.is_ascii_digit()))
}

/// フィールドマップから説明文を取り出す（無ければ空文字）
pub fn decode_description(fields: &FieldMap) -> String {
    fields
        .get(DESCRIPTION_KEY)
        .map(|f| f.value.clone())
        .unwrap_or_default()
}

/// フィールドマップからソース列を取り出す。
///
/// 1 番から順に見て、メーカー・型番の両方が無い番号で止まる（番号は連続している前提）。
/// 片方だけ無ければ空文字で補う。1 件も無ければ空の 1 件を返すので、結果は空にならない。
pub fn decode_sources(fields: &FieldMap) -> Result<Vec<SourceRecord>, CatalogError> {
    let mut sources = Vec::new();
    for position in 1.. {
        let manufacturer = fields.get(&manufacturer_key(position));
        let mpn = fields.get(&mpn_key(position));
        if manufacturer.is_none() && mpn.is_none() {
            break;
        }
        if position > MAX_SOURCES {
            return Err(CatalogError::MalformedFieldMap { limit: MAX_SOURCES });
        }
        sources.push(SourceRecord {
            manufacturer: manufacturer.map(|f| f.value.clone()).unwrap_or_default(),
            mpn: mpn.map(|f| f.value.clone()).unwrap_or_default(),
        });
    }
    if sources.is_empty() {
        sources.push(SourceRecord::default());
    }
    Ok(sources)
}

/// 末尾に続く空のソースを除いた部分
pub fn trim_trailing_empty(sources: &[SourceRecord]) -> &[SourceRecord] {
    let keep = sources
        .iter()
        .rposition(|s| !s.is_empty())
        .map_or(0, |last| last + 1);
    &sources[..keep]
}

/// 説明文とソース列を更新用のキー・値の組へ変換する。
///
/// 位置は現在の並び順から振り直す。途中の空ソースは位置を占めるので残すが、
/// 末尾に続く空ソースは落とす（全部消して保存すればキーごと消える）。
/// 戻り値は `Description` の後にソース順でキーが並ぶ。
pub fn encode(sources: &[SourceRecord], description: &str) -> Vec<(String, String)> {
    let sources = trim_trailing_empty(sources);
    let mut out = Vec::with_capacity(1 + sources.len() * 2);
    out.push((DESCRIPTION_KEY.to_string(), description.to_string()));
    for (i, source) in sources.iter().enumerate() {
        let position = i + 1;
        out.push((manufacturer_key(position), source.manufacturer.clone()));
        out.push((mpn_key(position), source.mpn.clone()));
    }
    out
}
