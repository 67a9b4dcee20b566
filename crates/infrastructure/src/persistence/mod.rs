//! Session storage backends.

mod file_storage;
mod memory_storage;

pub use file_storage::FileSessionStorage;
pub use memory_storage::MemorySessionStorage;
