//! External value transfer.
//!
//! [`Treasury`] is the seam where value leaves the ledger. The ledger never
//! calls it directly: [`crate::service::LedgerService`] executes a
//! [`Transfer`] only after the ledger has zeroed its balance.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use super::{Address, Transfer, Wei};
use crate::error::EscrowError;

/// Moves value out of the escrow to an external account.
pub trait Treasury: Send + Sync + fmt::Debug {
    /// Executes `transfer`.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::TransferFailed`] if the recipient cannot be
    /// paid. The service then restores the ledger to its pre-call state.
    fn transfer(&self, transfer: &Transfer) -> Result<(), EscrowError>;
}

/// Treasury that credits recipients in memory.
///
/// Used when the escrow runs standalone and in tests.
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    credited: Mutex<HashMap<Address, Wei>>,
}

impl InMemoryTreasury {
    /// Creates a treasury with no credits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total credited to `address` so far.
    #[must_use]
    pub fn credited(&self, address: Address) -> Wei {
        self.credited
            .lock()
            .map(|map| map.get(&address).copied().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl Treasury for InMemoryTreasury {
    fn transfer(&self, transfer: &Transfer) -> Result<(), EscrowError> {
        let mut map = self
            .credited
            .lock()
            .map_err(|_| EscrowError::TransferFailed("treasury lock poisoned".to_string()))?;
        let entry = map.entry(transfer.to).or_default();
        *entry = entry.checked_add(transfer.amount)?;
        tracing::debug!(to = %transfer.to, amount = %transfer.amount, "treasury credited");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        if let Some(b) = bytes.last_mut() {
            *b = last;
        }
        Address::from_bytes(bytes)
    }

    #[test]
    fn credits_accumulate_per_address() {
        let treasury = InMemoryTreasury::new();
        let to = addr(1);
        assert!(
            treasury
                .transfer(&Transfer {
                    to,
                    amount: Wei::new(100)
                })
                .is_ok()
        );
        assert!(
            treasury
                .transfer(&Transfer {
                    to,
                    amount: Wei::new(50)
                })
                .is_ok()
        );
        assert_eq!(treasury.credited(to), Wei::new(150));
        assert_eq!(treasury.credited(addr(2)), Wei::ZERO);
    }

    #[test]
    fn credit_overflow_is_an_error() {
        let treasury = InMemoryTreasury::new();
        let to = addr(1);
        let max = Transfer {
            to,
            amount: Wei::new(u128::MAX),
        };
        assert!(treasury.transfer(&max).is_ok());
        assert!(treasury.transfer(&max).is_err());
        assert_eq!(treasury.credited(to), Wei::new(u128::MAX));
    }
}
