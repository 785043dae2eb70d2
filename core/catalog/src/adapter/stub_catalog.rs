//! テスト用: メモリ上のカタログと、応答を手で配る Dispatcher


#[cfg(test)]
pub use stub::{ManualDispatcher, StubCatalog};
