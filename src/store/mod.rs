//! Persistence layer: the registry is stored as one JSON document,
//! overwritten wholesale on every mutation.

pub mod json_file;
pub mod memory;
pub mod traits;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::SessionStore;
