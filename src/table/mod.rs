//! Declarative test tables and their expansion into execution cases.

pub mod expand;
pub mod format;
pub mod replay_id;

pub use expand::{expand, ExecutionCase};
pub use format::{ExceptionExpectation, TestTableFile, TestTableItem};
pub use replay_id::{derive_id, validate_id};
