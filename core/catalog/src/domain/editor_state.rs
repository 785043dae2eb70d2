//! 部品エディタの状態と編集対象

use std::fmt;

/// 部品エディタの状態
///
/// `Unloaded → Loading → Loaded → Editing → Saving → Loaded`。
/// 保存失敗は `Editing` に戻る（編集内容は保持）。
/// `Loaded → RevisionPending → Loading` で新しいリビジョンへ移る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Unloaded,
    Loading,
    Loaded,
    Editing,
    Saving,
    RevisionPending,
}

impl EditorState {
    /// 保存・リビジョン作成のどちらかが応答待ち
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Saving | Self::RevisionPending)
    }

    /// 編集操作を受け付ける状態
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Loaded | Self::Editing)
    }
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Editing => "editing",
            Self::Saving => "saving",
            Self::RevisionPending => "creating a revision",
        };
        f.write_str(s)
    }
}

/// 編集対象のフィールド（position は 1 始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Description,
    Manufacturer { position: usize },
    Mpn { position: usize },
}
