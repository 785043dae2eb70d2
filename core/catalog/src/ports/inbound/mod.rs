//! Inbound ポート: ドライバ（CLI）がアプリを呼び出すインターフェース

use crate::domain::CatalogCommand;
use common::error::Error;
use std::io::Write;

/// catalog アプリケーションを実行する Inbound ポート
///
/// main はこの trait を実装した型（App）の run を呼び出す。
pub trait RunCatalogApp {
    /// コマンドを実行し、結果を out に書き出して終了コードを返す
    fn run(&mut self, command: CatalogCommand, out: &mut dyn Write) -> Result<i32, Error>;
}
