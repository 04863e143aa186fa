//! Task-spec unpacking: request body + stored reference data -> backend-ready specs
//! or per-item error markers.

pub mod tasks;
pub mod types;

pub use tasks::TaskUnpacker;
pub use types::{UnpackError, UnpackedItem, Unpacker};
