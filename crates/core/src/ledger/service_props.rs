//! Property-based tests for LedgerService.
//!
//! - Balance never goes negative and never wraps
//! - Reversal of a completed transaction restores the balance
//! - Currency mismatch is never applied

use proptest::prelude::*;

use bledger_shared::PendingSettlement;
use bledger_shared::types::{AccountId, Currency, Money};

use super::error::LedgerError;
use super::service::{LedgerService, PendingOutcome};
use super::types::{Direction, TransactionRequest, TransactionState};

/// Strategy to generate balances and amounts.
fn amount() -> impl Strategy<Value = u64> {
    prop_oneof![0u64..1_000_000u64, Just(u64::MAX), (u64::MAX - 1000)..=u64::MAX]
}

/// Strategy to generate direction.
fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Debit), Just(Direction::Credit)]
}

/// Strategy to generate currency codes, including a lowercase variant.
fn currency_code() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just("USD".to_string()),
        Just("usd".to_string()),
        Just("EUR".to_string()),
        Just("IDR".to_string()),
    ]
    .prop_map(|code| Currency::try_from(code).unwrap())
}

fn usd(amount: u64) -> Money {
    Money::new(amount, Currency::usd())
}

fn make_request(money: Money, direction: Direction) -> TransactionRequest {
    TransactionRequest {
        money,
        memo: None,
        direction,
        account_id: AccountId::new(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A debit lands at balance - amount when it fits and is rejected otherwise.
    #[test]
    fn prop_debit_never_goes_negative(balance in amount(), debit in amount()) {
        let request = make_request(usd(debit), Direction::Debit);
        match LedgerService::clear(&usd(balance), &request) {
            Ok(t) => {
                prop_assert!(debit <= balance);
                prop_assert_eq!(t.new_balance.amount, balance - debit);
            }
            Err(LedgerError::InsufficientFunds { .. }) => prop_assert!(debit > balance),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// A credit either adds exactly or reports overflow.
    #[test]
    fn prop_credit_never_wraps(balance in amount(), credit in amount()) {
        let request = make_request(usd(credit), Direction::Credit);
        match LedgerService::clear(&usd(balance), &request) {
            Ok(t) => prop_assert_eq!(Some(t.new_balance.amount), balance.checked_add(credit)),
            Err(LedgerError::BalanceOverflow) => prop_assert!(balance.checked_add(credit).is_none()),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// Reversing a cleared transaction restores the starting balance.
    #[test]
    fn prop_reverse_restores_balance(
        start in 0u64..1_000_000u64,
        value in 1u64..1_000_000u64,
        direction in direction_strategy(),
    ) {
        let request = make_request(usd(value), direction);
        if let Ok(cleared) = LedgerService::clear(&usd(start), &request) {
            let reversed = LedgerService::reverse(
                cleared.new_state,
                &cleared.new_balance,
                &request.money,
                cleared.direction,
            ).unwrap();
            prop_assert_eq!(reversed.new_balance, usd(start));
            prop_assert_eq!(reversed.direction, direction.flipped());
            prop_assert_eq!(reversed.new_state, TransactionState::Reversed);
        }
    }

    /// Mismatched currencies fail on every path.
    #[test]
    fn prop_currency_mismatch_never_applies(
        account in currency_code(),
        txn in currency_code(),
        value in 1u64..1000u64,
        direction in direction_strategy(),
    ) {
        prop_assume!(account != txn);
        let balance = Money::new(1_000, account);
        let request = make_request(Money::new(value, txn), direction);

        prop_assert_eq!(
            LedgerService::open_pending(&balance, &request).unwrap(),
            PendingOutcome::Failed { reason: "invalid currency" }
        );
        let cleared = LedgerService::clear(&balance, &request);
        prop_assert!(matches!(cleared, Err(LedgerError::CurrencyMismatch { .. })), "clear applied a mismatched currency");
        let executed = LedgerService::execute(
            TransactionState::Pending,
            &balance,
            &request.money,
            direction,
            PendingSettlement::Reapply,
        );
        prop_assert!(matches!(executed, Err(LedgerError::CurrencyMismatch { .. })), "execute applied a mismatched currency");
    }

    /// Only PENDING executes and only COMPLETED reverses.
    #[test]
    fn prop_transitions_guarded(
        state in prop_oneof![
            Just(TransactionState::Pending),
            Just(TransactionState::Completed),
            Just(TransactionState::Failed),
            Just(TransactionState::Reversed),
        ],
        direction in direction_strategy(),
    ) {
        let balance = usd(1_000);
        let money = usd(10);
        let executed = LedgerService::execute(state, &balance, &money, direction, PendingSettlement::StateOnly);
        prop_assert_eq!(executed.is_ok(), state == TransactionState::Pending);
        let reversed = LedgerService::reverse(state, &balance, &money, direction);
        prop_assert_eq!(reversed.is_ok(), state == TransactionState::Completed);
    }
}
