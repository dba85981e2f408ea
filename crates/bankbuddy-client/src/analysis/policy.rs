use rust_decimal::Decimal;

use crate::analysis::types::LedgerTransaction;

/// Settlement-detection policy identifier, reported alongside split results
/// so threshold changes stay visible in output diffs.
pub const SETTLEMENT_POLICY_VERSION: &str = "settlement/v1";

/// v1 settlement policy.
///
/// A transfer group settles the outstanding shared balance when
/// `| |group sum| - outstanding | <= max(tolerance_floor, outstanding * tolerance_ratio)`
/// and every transfer in the group falls within `window_days` of its first.
#[derive(Debug, Clone, Copy)]
pub struct SettlementPolicy {
    pub window_days: i64,
    pub tolerance_floor: Decimal,
    pub tolerance_ratio: Decimal,
    pub transfer_patterns: &'static [&'static str],
    pub recent_payment_limit: usize,
}

impl SettlementPolicy {
    pub fn tolerance(self, outstanding: Decimal) -> Decimal {
        (outstanding.abs() * self.tolerance_ratio).max(self.tolerance_floor)
    }

    pub fn settles(self, group_sum: Decimal, outstanding: Decimal) -> bool {
        outstanding > Decimal::ZERO
            && (group_sum.abs() - outstanding).abs() <= self.tolerance(outstanding)
    }

    /// Card payments, Zelle/Venmo moves and similar money shuffles between
    /// accounts or people.
    pub fn is_transfer(self, transaction: &LedgerTransaction) -> bool {
        let description = transaction.description.to_lowercase();
        let category = transaction
            .category
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.transfer_patterns
            .iter()
            .any(|pattern| description.contains(pattern) || category.contains(pattern))
    }

    /// Negative-amount, non-transfer rows are the expenses both people share.
    pub fn is_shared_expense(self, transaction: &LedgerTransaction) -> bool {
        transaction.is_withdrawal() && !self.is_transfer(transaction)
    }
}

pub const SETTLEMENT_POLICY_V1: SettlementPolicy = SettlementPolicy {
    window_days: 30,
    tolerance_floor: Decimal::from_parts(100, 0, 0, false, 2),
    tolerance_ratio: Decimal::from_parts(2, 0, 0, false, 2),
    transfer_patterns: &["payment", "transfer", "zelle", "venmo", "autopay", "thank you"],
    recent_payment_limit: 4,
};
