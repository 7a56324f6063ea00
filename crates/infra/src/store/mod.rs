//! Entity storage: the `EngineStore` boundary, its in-memory implementation
//! and the optional durable journal behind it.

pub mod in_memory;
pub mod journal;
pub mod r#trait;
pub mod unit_of_work;

pub use in_memory::InMemoryStore;
pub use journal::Journal;
pub use r#trait::{DealFilter, EngineStore, TransactionFilter};
pub use unit_of_work::{JournalEntry, Staged, UnitOfWork, Write};
