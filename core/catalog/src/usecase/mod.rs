//! ユースケース層: ナビゲータ・エディタと、それらを束ねるセッション

pub mod editor;
pub mod navigator;
pub mod session;

pub use editor::{Draft, PartEditor};
pub use navigator::CatalogNavigator;
pub use session::{CatalogSession, SessionEvent};

use crate::ports::outbound::Envelope;

/// 応答を反映した結果
#[derive(Debug)]
pub enum ReplyOutcome {
    /// 状態に反映した
    Applied,
    /// もう待っていない応答なので捨てた
    Stale,
    /// 反映した上で、続けて送る要求がある（作成後の一覧再取得・リビジョン後の読み込み）
    FollowUp(Envelope),
}
