//! GitPLM クライアント共通ライブラリ
//!
//! `catalog` コマンドとその周辺で共有される機能を提供します。

/// エラーハンドリング
pub mod error;

/// ドメイン型（Newtype）
pub mod domain;

/// Outbound ポート（trait）
pub mod ports;

/// ポートの標準実装
pub mod adapter;
