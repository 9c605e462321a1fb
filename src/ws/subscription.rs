//! Per-connection subscription manager.
//!
//! Tracks which addresses a WebSocket client follows and provides
//! server-side event filtering.

use std::collections::HashSet;

use crate::domain::{Address, LedgerEvent};

/// Manages the set of address subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed addresses. If `subscribe_all` is true, this set is ignored.
    addresses: HashSet<Address>,
    /// Whether the client follows every event (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds addresses to the subscription set and optionally enables the
    /// wildcard.
    pub fn subscribe(&mut self, addresses: &[Address], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.addresses.extend(addresses.iter().copied());
    }

    /// Removes addresses from the subscription set. `"*"` clears the
    /// wildcard.
    pub fn unsubscribe(&mut self, addresses: &[Address], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for address in addresses {
            self.addresses.remove(address);
        }
    }

    /// Returns `true` if `event` should be forwarded.
    ///
    /// Events without an address (round resets) go to every connection
    /// with at least one active subscription.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        if self.subscribe_all {
            return true;
        }
        match event.address() {
            Some(address) => self.addresses.contains(&address),
            None => !self.addresses.is_empty(),
        }
    }

    /// Returns the number of explicitly followed addresses.
    #[must_use]
    pub fn count(&self) -> usize {
        self.addresses.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Wei;
    use chrono::Utc;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        if let Some(b) = bytes.last_mut() {
            *b = last;
        }
        Address::from_bytes(bytes)
    }

    fn staked(participant: Address) -> LedgerEvent {
        LedgerEvent::Staked {
            participant,
            amount: Wei::new(1),
            round: 1,
            timestamp: Utc::now(),
        }
    }

    fn reset() -> LedgerEvent {
        LedgerEvent::RoundReset {
            round: 2,
            cleared: 0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&staked(addr(1))));
        assert!(!mgr.matches(&reset()));
    }

    #[test]
    fn subscribe_specific_address() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[addr(1)], false);
        assert!(mgr.matches(&staked(addr(1))));
        assert!(!mgr.matches(&staked(addr(2))));
        assert!(mgr.matches(&reset()));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(&staked(addr(1))));
        assert!(mgr.matches(&reset()));
    }

    #[test]
    fn unsubscribe_removes_address_and_wildcard() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[addr(1)], true);
        mgr.unsubscribe(&[addr(1)], true);
        assert!(!mgr.is_subscribed_all());
        assert!(!mgr.matches(&staked(addr(1))));
        assert_eq!(mgr.count(), 0);
    }
}
