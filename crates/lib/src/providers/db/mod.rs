pub mod sqlite;
pub mod storage;

pub use sqlite::SqliteExecutor;
pub use storage::QueryExecutor;
