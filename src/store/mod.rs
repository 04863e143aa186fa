//! Result Store
//!
//! The store is an external collaborator; this module defines the capability the
//! queue and the unpacker rely on, plus an in-memory implementation used by the
//! standalone binary and the tests.

pub mod memory;
pub mod types;

pub use memory::MemoryResultStore;
pub use types::{ResultStore, StoreError};
