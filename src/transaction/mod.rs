mod snapshot;
mod write_batch;

pub use snapshot::Snapshot;
pub use write_batch::{WriteBatch, WriteOp};
