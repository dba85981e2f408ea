use bankbuddy_client::analysis::{LedgerTransaction, SETTLEMENT_POLICY_V1};
use bankbuddy_client::split::{SplitRatio, balance_split, detect_settlements, expense_split};
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap_or(NaiveDate::MIN)
}

fn txn(id: &str, posted_at: NaiveDate, description: &str, cents: i64) -> LedgerTransaction {
    LedgerTransaction {
        txn_id: id.to_string(),
        account_key: "joint_checking".to_string(),
        posted_at,
        description: description.to_string(),
        amount: Decimal::new(cents, 2),
        category: None,
    }
}

fn ratio(raw: &str) -> SplitRatio {
    let parsed = SplitRatio::parse(raw);
    assert!(parsed.is_ok(), "ratio {raw}");
    parsed.unwrap_or_else(|_| SplitRatio::even())
}

#[test]
fn allocations_always_add_back_to_the_amount() {
    for raw in ["0", "12.5", "33.3", "50", "60", "66.67", "99.99", "100"] {
        let split = ratio(raw);
        let mut cents = -100_007_i64;
        while cents <= 100_007 {
            let amount = Decimal::new(cents, 2);
            let allocation = split.allocate(amount);
            assert_eq!(allocation.total(), amount, "{amount} at {raw}%");
            assert!(allocation.person1.scale() <= 2);
            assert!(allocation.person2.scale() <= 2);
            cents += 9_973;
        }
    }
}

#[test]
fn out_of_range_percentages_are_rejected() {
    for raw in ["120", "-5", "abc", "", "100.01"] {
        let parsed = SplitRatio::parse(raw);
        assert!(parsed.is_err(), "{raw} should be rejected");
        if let Err(error) = parsed {
            assert_eq!(error.code, "invalid_split_percentage");
            assert!(!error.is_internal());
        }
    }
    assert!(SplitRatio::parse("60%").is_ok());
    assert!(SplitRatio::new(Decimal::new(100, 0)).is_ok());
}

#[test]
fn settlement_pair_is_excluded_from_new_expenses() {
    let rows = vec![
        txn("a", date(1, 2), "GROCERY MART", -30_000),
        txn("b", date(1, 9), "RENT SHARE", -20_000),
        txn("c", date(1, 20), "ZELLE FROM SAM", 25_000),
        txn("d", date(1, 28), "VENMO FROM ALEX", 24_950),
        txn("e", date(2, 3), "GROCERY MART", -4_500),
        txn("f", date(2, 10), "CORNER CAFE", -1_234),
    ];

    let split = expense_split(&rows, ratio("60"), date(2, 15), SETTLEMENT_POLICY_V1);
    assert_eq!(split.period, "Since last settlement on 2025-01-28");
    assert_eq!(split.last_settlement_date, Some(date(1, 28)));
    assert_eq!(split.settlements.len(), 1);
    assert_eq!(split.expense_count, 2);
    assert_eq!(split.total_expenses, Decimal::new(5_734, 2));
    assert_eq!(split.shares.person1, Decimal::new(3_440, 2));
    assert_eq!(split.shares.person2, Decimal::new(2_294, 2));

    let scan = detect_settlements(&rows, SETTLEMENT_POLICY_V1);
    assert!(scan.is_settlement(&rows[2]));
    assert!(scan.is_settlement(&rows[3]));
    assert!(!scan.is_settlement(&rows[4]));
}

#[test]
fn no_settlement_falls_back_to_trailing_thirty_days() {
    let rows = vec![
        txn("a", date(1, 2), "GROCERY MART", -30_000),
        txn("b", date(2, 10), "CORNER CAFE", -1_000),
        txn("c", date(3, 1), "HARDWARE", -2_000),
    ];

    let split = expense_split(&rows, SplitRatio::even(), date(3, 1), SETTLEMENT_POLICY_V1);
    assert_eq!(split.period, "Last 30 days (no settlement pattern detected)");
    assert_eq!(split.last_settlement_date, None);
    assert_eq!(split.expense_count, 2);
    assert_eq!(split.total_expenses, Decimal::new(3_000, 2));
    assert_eq!(split.outstanding, Decimal::new(33_000, 2));
}

#[test]
fn tolerance_is_one_dollar_or_two_percent() {
    let small = |transfer_cents: i64| {
        vec![
            txn("a", date(1, 2), "BOOKSTORE", -3_000),
            txn("b", date(1, 5), "PAYMENT THANK YOU", transfer_cents),
        ]
    };
    assert_eq!(detect_settlements(&small(3_100), SETTLEMENT_POLICY_V1).settlements.len(), 1);
    assert_eq!(detect_settlements(&small(2_900), SETTLEMENT_POLICY_V1).settlements.len(), 1);
    assert!(detect_settlements(&small(3_101), SETTLEMENT_POLICY_V1).settlements.is_empty());

    let large = |transfer_cents: i64| {
        vec![
            txn("a", date(1, 2), "FURNITURE", -100_000),
            txn("b", date(1, 5), "AUTOPAY", transfer_cents),
        ]
    };
    assert_eq!(detect_settlements(&large(102_000), SETTLEMENT_POLICY_V1).settlements.len(), 1);
    assert!(detect_settlements(&large(102_001), SETTLEMENT_POLICY_V1).settlements.is_empty());
}

#[test]
fn balance_split_covers_full_history() {
    let rows = vec![
        txn("a", date(1, 2), "GROCERY MART", -10_001),
        txn("b", date(1, 20), "ZELLE FROM SAM", 5_000),
        txn("c", date(2, 3), "REFUND", 1_000),
    ];

    let split = balance_split(&rows, SplitRatio::even(), SETTLEMENT_POLICY_V1);
    assert_eq!(split.total_balance, Decimal::new(-4_001, 2));
    assert_eq!(split.balance_shares.total(), split.total_balance);
    assert_eq!(split.total_expenses, Decimal::new(10_001, 2));
    assert_eq!(split.expense_count, 1);
    assert_eq!(split.total_payments_credits, Decimal::new(6_000, 2));
}
