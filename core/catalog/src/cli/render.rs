//! 端末向けの表示（一覧・部品詳細・差分）

use crate::domain::source::is_codec_key;
use crate::domain::{Category, FieldChange, Part, PartSummary, SourceRecord};
use serde_json::Value;
use std::io::{self, Write};

/// id 列の幅（最長の id に合わせる）
fn id_width<'a>(ids: impl Iterator<Item = &'a str>) -> usize {
    ids.map(|id| id.chars().count()).max().unwrap_or(0)
}

pub fn write_categories(out: &mut dyn Write, categories: &[&Category]) -> io::Result<()> {
    let width = id_width(categories.iter().map(|c| c.id.as_str()));
    for c in categories {
        let name = c.name.as_deref().unwrap_or("");
        writeln!(out, "{:<width$}  {}", c.id.as_str(), name, width = width)?;
    }
    Ok(())
}

pub fn write_parts(out: &mut dyn Write, parts: &[PartSummary]) -> io::Result<()> {
    if parts.is_empty() {
        return writeln!(out, "(no parts)");
    }
    let width = id_width(parts.iter().map(|p| p.id.as_str()));
    for p in parts {
        let label = p
            .name
            .as_deref()
            .or(p.description.as_deref())
            .unwrap_or("");
        writeln!(out, "{:<width$}  {}", p.id.as_str(), label, width = width)?;
    }
    Ok(())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 部品詳細。sources はエディタが保持している（デコード済みの）並び。
pub fn write_part(out: &mut dyn Write, part: &Part, sources: &[SourceRecord]) -> io::Result<()> {
    writeln!(out, "Part:        {}", part.id())?;
    if let Some(name) = part.name() {
        writeln!(out, "Name:        {}", name)?;
    }
    writeln!(out, "Revision:    {}", part.revision())?;
    writeln!(out, "Description: {}", part.description())?;
    writeln!(out, "Sources:")?;
    for (i, s) in sources.iter().enumerate() {
        let manufacturer = if s.manufacturer.is_empty() { "-" } else { &s.manufacturer };
        let mpn = if s.mpn.is_empty() { "-" } else { &s.mpn };
        writeln!(out, "  {}. {} {}", i + 1, manufacturer, mpn)?;
    }

    let others: Vec<_> = part
        .fields()
        .iter()
        .filter(|(key, _)| !is_codec_key(key))
        .collect();
    if !others.is_empty() {
        writeln!(out, "Fields:")?;
        for (key, field) in others {
            writeln!(out, "  {}: {}", key, field.value)?;
        }
    }

    let attributes: Vec<_> = part
        .extra()
        .iter()
        .filter(|(key, value)| key.as_str() != "name" && !value.is_null())
        .collect();
    if !attributes.is_empty() {
        writeln!(out, "Attributes:")?;
        for (key, value) in attributes {
            writeln!(out, "  {}: {}", key, scalar(value))?;
        }
    }
    Ok(())
}

pub fn write_changes(out: &mut dyn Write, changes: &[FieldChange]) -> io::Result<()> {
    if changes.is_empty() {
        return writeln!(out, "(no changes)");
    }
    for change in changes {
        match change {
            FieldChange::Added { key, value } => writeln!(out, "+ {}: {}", key, value)?,
            FieldChange::Changed { key, before, after } => {
                writeln!(out, "~ {}: {} -> {}", key, before, after)?
            }
            FieldChange::Removed { key, before } => writeln!(out, "- {}: {}", key, before)?,
        }
    }
    Ok(())
}
