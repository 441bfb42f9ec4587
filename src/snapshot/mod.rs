pub mod client;
pub mod lenient;
pub mod mutation;
pub mod parse;
pub mod storage;
pub mod types;

pub use client::{BackendClient, BackendError};
pub use mutation::{parse_late_minutes, BatchOp, Mutation, MutationError};
pub use parse::SnapshotError;
pub use types::*;
