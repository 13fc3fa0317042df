//! Persistent key-value slot for the token record.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::PersistenceError;

/// Default storage key of the serialized token pair.
pub const TOKENS_KEY: &str = "auth_tokens";

/// Synchronous key-value storage.
///
/// Calls return once the write is durable or has failed.
pub trait TokenStorage: Send + Sync + 'static {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}
