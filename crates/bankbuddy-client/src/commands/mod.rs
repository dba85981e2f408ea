pub mod accounts;
pub mod analyze;
pub(crate) mod common;
pub mod import;
pub mod report;

pub use common::SplitArgs;
