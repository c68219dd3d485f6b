//! Request fingerprints.
//!
//! A fingerprint is the URL-safe base64 of
//! `"{account_id}-{amount}-{currency}-{direction}"`. It is deterministic and
//! order-sensitive but not a content hash: it binds a key to the request
//! fields, nothing more.

use serde::{Deserialize, Serialize};
use std::fmt;

use bledger_shared::types::{AccountId, Money};

use super::error::IdempotencyError;
use crate::ledger::{Direction, TransactionRequest};

/// Fingerprint of a transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derives the fingerprint for the given fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a nil account id or a zero amount.
    pub fn derive(
        account_id: AccountId,
        money: &Money,
        direction: Direction,
    ) -> Result<Self, IdempotencyError> {
        if account_id.into_inner().is_nil() {
            return Err(IdempotencyError::InvalidRequest(
                "account_id is required".to_string(),
            ));
        }
        if money.is_zero() {
            return Err(IdempotencyError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }

        let raw = format!(
            "{account_id}-{}-{}-{}",
            money.amount,
            money.currency,
            direction.as_str()
        );
        Ok(Self(base64_url::encode(&raw)))
    }

    /// Derives the fingerprint of a request body.
    ///
    /// # Errors
    ///
    /// See [`Fingerprint::derive`].
    pub fn of_request(request: &TransactionRequest) -> Result<Self, IdempotencyError> {
        Self::derive(request.account_id, &request.money, request.direction)
    }

    /// Returns the encoded fingerprint.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if a client-supplied key equals this fingerprint.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.0 == key
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bledger_shared::types::Currency;
    use std::str::FromStr;

    #[test]
    fn test_known_encoding() {
        let account_id = AccountId::from_str("0190b2a4-6c1e-7d2a-9f00-000000000001").unwrap();
        let fp = Fingerprint::derive(account_id, &Money::new(100, Currency::usd()), Direction::Debit)
            .unwrap();
        let decoded = base64_url::decode(fp.as_str()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "0190b2a4-6c1e-7d2a-9f00-000000000001-100-USD-DEBIT"
        );
    }

    #[test]
    fn test_deterministic_and_field_sensitive() {
        let account_id = AccountId::new();
        let money = Money::new(100, Currency::usd());
        let a = Fingerprint::derive(account_id, &money, Direction::Credit).unwrap();
        let b = Fingerprint::derive(account_id, &money, Direction::Credit).unwrap();
        let c = Fingerprint::derive(account_id, &money, Direction::Debit).unwrap();
        let d = Fingerprint::derive(AccountId::new(), &money, Direction::Credit).unwrap();

        assert_eq!(a, b);
        assert!(a.matches(b.as_str()));
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_rejects_zero_amount_and_nil_account() {
        let zero = Money::zero(Currency::usd());
        assert!(matches!(
            Fingerprint::derive(AccountId::new(), &zero, Direction::Credit),
            Err(IdempotencyError::InvalidRequest(_))
        ));

        let nil = AccountId::from_uuid(uuid::Uuid::nil());
        assert!(matches!(
            Fingerprint::derive(nil, &Money::new(1, Currency::usd()), Direction::Credit),
            Err(IdempotencyError::InvalidRequest(_))
        ));
    }
}
