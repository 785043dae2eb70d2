//! GitPLM 部品カタログの閲覧・編集クライアント
//!
//! - domain: 部品・ソースのデータモデルとソースコーデック
//! - ports: カタログサービス・要求ディスパッチャ（outbound）、アプリ実行（inbound）
//! - adapter: HTTP クライアント、ディスパッチャ実装、設定
//! - usecase: カタログナビゲータ・部品エディタ・セッション
//! - cli / app / wiring: catalog コマンド

pub mod adapter;
pub mod app;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod usecase;
pub mod wiring;

#[cfg(test)]
mod tests;
