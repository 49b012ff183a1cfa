mod backend;
mod base;

pub use backend::SqliteBackend;
pub use base::Storage;
