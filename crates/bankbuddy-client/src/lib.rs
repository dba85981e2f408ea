//! Local ledger for personal bank CSV exports: import with deduplication,
//! per-account analysis, two-person expense splitting and a Markdown report.

pub mod analysis;
pub mod commands;
pub mod contracts;
pub mod error;
mod import;
pub mod migrations;
pub mod money;
pub mod report;
pub mod setup;
pub mod split;
pub mod state;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
