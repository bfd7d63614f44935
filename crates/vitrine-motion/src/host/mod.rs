//! Document hosts

mod memory;

pub use memory::MemoryDocument;
