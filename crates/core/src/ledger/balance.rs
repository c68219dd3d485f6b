//! Balance mutation for a single account.
//!
//! A DEBIT subtracts from the balance and fails rather than go below zero. A
//! CREDIT adds to it and fails rather than wrap past `u64::MAX`.

use bledger_shared::types::Money;

use super::error::LedgerError;
use super::types::Direction;

/// Fails unless `amount` is in the same currency as `balance`.
///
/// # Errors
///
/// Returns `LedgerError::CurrencyMismatch` when the codes differ.
pub fn ensure_same_currency(balance: &Money, amount: &Money) -> Result<(), LedgerError> {
    if balance.same_currency(amount) {
        Ok(())
    } else {
        Err(LedgerError::CurrencyMismatch {
            expected: balance.currency.clone(),
            actual: amount.currency.clone(),
        })
    }
}

/// Computes the balance after moving `amount` in `direction`.
///
/// # Errors
///
/// - `CurrencyMismatch` if the currencies differ
/// - `InsufficientFunds` if a debit exceeds the balance
/// - `BalanceOverflow` if a credit does not fit in `u64`
pub fn apply_delta(
    balance: &Money,
    amount: &Money,
    direction: Direction,
) -> Result<Money, LedgerError> {
    ensure_same_currency(balance, amount)?;

    let next = match direction {
        Direction::Debit => balance.amount.checked_sub(amount.amount).ok_or(
            LedgerError::InsufficientFunds {
                balance: balance.amount,
                requested: amount.amount,
            },
        )?,
        Direction::Credit => balance
            .amount
            .checked_add(amount.amount)
            .ok_or(LedgerError::BalanceOverflow)?,
    };

    Ok(Money::new(next, balance.currency.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bledger_shared::types::Currency;
    use rstest::rstest;

    fn usd(amount: u64) -> Money {
        Money::new(amount, Currency::usd())
    }

    #[rstest]
    #[case(100, 40, Direction::Debit, 60)]
    #[case(100, 100, Direction::Debit, 0)]
    #[case(0, 100, Direction::Credit, 100)]
    #[case(60, 40, Direction::Credit, 100)]
    fn test_apply_delta(
        #[case] balance: u64,
        #[case] amount: u64,
        #[case] direction: Direction,
        #[case] expected: u64,
    ) {
        let result = apply_delta(&usd(balance), &usd(amount), direction).unwrap();
        assert_eq!(result, usd(expected));
    }

    #[test]
    fn test_debit_beyond_balance_fails() {
        let err = apply_delta(&usd(100), &usd(150), Direction::Debit).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                balance: 100,
                requested: 150
            }
        ));
    }

    #[test]
    fn test_credit_overflow_fails() {
        let err = apply_delta(&usd(u64::MAX), &usd(1), Direction::Credit).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow));
    }

    #[test]
    fn test_currency_mismatch_fails_before_arithmetic() {
        let eur = Money::new(1, "EUR".parse().unwrap());
        let err = apply_delta(&usd(100), &eur, Direction::Credit).unwrap_err();
        assert!(matches!(err, LedgerError::CurrencyMismatch { .. }));

        let lower = Money::new(1, "usd".parse().unwrap());
        assert!(ensure_same_currency(&usd(0), &lower).is_err());
    }
}
