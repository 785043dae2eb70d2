//! Ports & Adapters のポート定義
//!
//! - inbound: ドライバ（CLI）がアプリを呼ぶ入口
//! - outbound: アプリが外界（カタログサービス）に依頼するための trait

pub mod inbound;
pub mod outbound;
