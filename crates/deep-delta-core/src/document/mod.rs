/// Delta document IO: writer, reader and the per-thread pool
/// Per-thread document pool
pub mod pool;
/// Streaming and random-access reader
pub mod reader;
/// Append-only writer with nested scopes
pub mod writer;

pub use reader::DeltaReader;
pub use writer::{DeltaWriter, NestedScope};
