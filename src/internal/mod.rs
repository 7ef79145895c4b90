//! Internal implementation details.

pub(crate) mod panic;
pub(crate) mod pool;

pub(crate) use panic::{catch_hook, catch_provider};
