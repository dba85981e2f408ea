//! Read-side aggregation over the stored ledger. Everything here is a pure
//! function of the loaded transactions plus explicit reference dates.

pub mod aggregate;
pub mod date;
pub mod policy;
pub mod query;
pub mod summary;
pub mod types;

pub use aggregate::{cash_flow, category_totals, monthly_trends, payment_patterns, recent_activity};
pub use policy::{SETTLEMENT_POLICY_V1, SETTLEMENT_POLICY_VERSION, SettlementPolicy};
pub use summary::{account_summary, data_quality};
pub use types::LedgerTransaction;
