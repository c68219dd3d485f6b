//! Property-based tests for fingerprint derivation.

use proptest::prelude::*;

use bledger_shared::types::{AccountId, Currency, Money};

use super::fingerprint::Fingerprint;
use crate::ledger::Direction;

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Debit), Just(Direction::Credit)]
}

fn currency_code() -> impl Strategy<Value = Currency> {
    "[A-Za-z]{3}".prop_map(|code| Currency::try_from(code).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Same fields give the same fingerprint; the encoding is URL-safe.
    #[test]
    fn prop_fingerprint_is_stable(
        amount in 1u64..,
        currency in currency_code(),
        direction in direction_strategy(),
    ) {
        let account_id = AccountId::new();
        let money = Money::new(amount, currency);
        let first = Fingerprint::derive(account_id, &money, direction).unwrap();
        let second = Fingerprint::derive(account_id, &money, direction).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(first
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    /// Changing the amount changes the fingerprint.
    #[test]
    fn prop_fingerprint_binds_amount(a in 1u64..1_000_000, b in 1u64..1_000_000) {
        prop_assume!(a != b);
        let account_id = AccountId::new();
        let first = Fingerprint::derive(account_id, &Money::new(a, Currency::usd()), Direction::Debit).unwrap();
        let second = Fingerprint::derive(account_id, &Money::new(b, Currency::usd()), Direction::Debit).unwrap();
        prop_assert_ne!(first, second);
    }
}
