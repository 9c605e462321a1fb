//! Ledger service: serializes ledger calls, pays out, and emits events.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    Address, EventBus, Ledger, LedgerView, RecordedEvent, Settlement, Treasury, Wei,
};
use crate::error::EscrowError;

/// Outcome of an accepted stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeReceipt {
    /// Journaled `staked` event.
    pub event: RecordedEvent,
    /// Pool balance right after the stake.
    pub balance: Wei,
}

/// Orchestration layer for all ledger operations.
///
/// Owns the [`Ledger`] behind a single mutex so that every call is one
/// indivisible state transition. Mutation methods follow the pattern:
/// acquire lock → apply to ledger → execute transfer (if any) → publish
/// events → release lock. Events are published before the lock is released
/// so that bus order always matches journal order.
#[derive(Debug, Clone)]
pub struct LedgerService {
    ledger: Arc<Mutex<Ledger>>,
    treasury: Arc<dyn Treasury>,
    event_bus: EventBus,
}

impl LedgerService {
    /// Creates a new `LedgerService`.
    #[must_use]
    pub fn new(ledger: Ledger, treasury: Arc<dyn Treasury>, event_bus: EventBus) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            treasury,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Accepts a stake from `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::WrongAmount`] or [`EscrowError::AlreadyStaked`]
    /// when the ledger rejects the stake.
    pub async fn stake(&self, caller: Address, amount: Wei) -> Result<StakeReceipt, EscrowError> {
        let mut ledger = self.ledger.lock().await;
        let recorded = ledger.stake(caller, amount).inspect_err(|err| {
            tracing::debug!(%caller, %amount, error = %err, "stake rejected");
        })?;
        let balance = ledger.balance();

        let _ = self.event_bus.publish(recorded.clone());
        drop(ledger);

        tracing::info!(%caller, %amount, %balance, sequence = recorded.sequence, "stake accepted");
        Ok(StakeReceipt {
            event: recorded,
            balance,
        })
    }

    /// Returns whether `identity` staked in the current round, together
    /// with that round's number.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::StakeTrackingDisabled`] under the unlimited
    /// policy.
    pub async fn verify_stake(&self, identity: Address) -> Result<(bool, u64), EscrowError> {
        let ledger = self.ledger.lock().await;
        let staked = ledger.verify_stake(identity)?;
        Ok((staked, ledger.round()))
    }

    /// Sends the whole pool to the owner. Returns the amount moved, which is
    /// zero when there was nothing to withdraw.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::NotOwner`] for non-owner callers and
    /// [`EscrowError::TransferFailed`] if the treasury rejects the payout.
    pub async fn withdraw(&self, caller: Address) -> Result<Wei, EscrowError> {
        let Some(settlement) = self.settle(caller, |ledger| ledger.withdraw(caller)).await?
        else {
            tracing::debug!(%caller, "withdraw on empty pool; nothing moved");
            return Ok(Wei::ZERO);
        };
        let amount = settlement.transfer.amount;
        tracing::info!(%caller, %amount, "pool withdrawn by owner");
        Ok(amount)
    }

    /// Sends the whole pool to `recipient`. Returns the amount moved.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::NotOwner`], [`EscrowError::InvalidRecipient`],
    /// [`EscrowError::EmptyBalance`], or [`EscrowError::TransferFailed`].
    pub async fn send_funds_to(
        &self,
        caller: Address,
        recipient: Address,
    ) -> Result<Wei, EscrowError> {
        let settlement = self
            .settle(caller, |ledger| {
                ledger.send_funds_to(caller, recipient).map(Some)
            })
            .await?;
        let amount = settlement.map_or(Wei::ZERO, |s| s.transfer.amount);
        tracing::info!(%recipient, %amount, "pool sent to recipient");
        Ok(amount)
    }

    /// Clears the staked set and opens the next round.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::NotOwner`] or [`EscrowError::RoundInProgress`].
    pub async fn reset_round(&self, caller: Address) -> Result<RecordedEvent, EscrowError> {
        let mut ledger = self.ledger.lock().await;
        let recorded = ledger
            .reset_round(caller)
            .inspect_err(|err| log_owner_rejection(caller, err))?;

        let _ = self.event_bus.publish(recorded.clone());
        let round = ledger.round();
        drop(ledger);

        tracing::info!(round, "new round opened");
        Ok(recorded)
    }

    /// Returns a summary of the ledger.
    pub async fn state(&self) -> LedgerView {
        self.ledger.lock().await.view()
    }

    /// Returns the current round and the stakes accepted in it, in
    /// acceptance order.
    pub async fn participants(&self) -> (u64, Vec<Address>) {
        let ledger = self.ledger.lock().await;
        (ledger.round(), ledger.participants().to_vec())
    }

    /// Returns up to `limit` journaled events after sequence `after`.
    pub async fn events_after(&self, after: u64, limit: usize) -> Vec<RecordedEvent> {
        self.ledger.lock().await.events_after(after, limit)
    }

    /// Applies an outgoing operation and executes its transfer.
    ///
    /// The ledger has already zeroed its balance when the treasury is
    /// called. If the treasury fails, the ledger is rolled back to the
    /// checkpoint taken before `op` and nothing is published.
    async fn settle<F>(&self, caller: Address, op: F) -> Result<Option<Settlement>, EscrowError>
    where
        F: FnOnce(&mut Ledger) -> Result<Option<Settlement>, EscrowError>,
    {
        let mut ledger = self.ledger.lock().await;
        let checkpoint = ledger.checkpoint();

        let settlement = op(&mut ledger).inspect_err(|err| log_owner_rejection(caller, err))?;
        let Some(settlement) = settlement else {
            return Ok(None);
        };

        if let Err(err) = self.treasury.transfer(&settlement.transfer) {
            ledger.rollback(checkpoint);
            tracing::error!(
                to = %settlement.transfer.to,
                amount = %settlement.transfer.amount,
                error = %err,
                "transfer failed; ledger restored"
            );
            return Err(err);
        }

        let _ = self.event_bus.publish(settlement.event.clone());
        drop(ledger);
        Ok(Some(settlement))
    }
}

fn log_owner_rejection(caller: Address, err: &EscrowError) {
    match err {
        EscrowError::NotOwner(_) => {
            tracing::warn!(%caller, "owner-gated call rejected");
        }
        other => tracing::debug!(%caller, error = %other, "owner call rejected"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{InMemoryTreasury, LedgerEvent, StakePolicy, Transfer};

    const STAKE: Wei = Wei::new(200_000_000_000_000);

    #[derive(Debug)]
    struct RejectingTreasury;

    impl Treasury for RejectingTreasury {
        fn transfer(&self, transfer: &Transfer) -> Result<(), EscrowError> {
            Err(EscrowError::TransferFailed(format!(
                "{} refused payment",
                transfer.to
            )))
        }
    }

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        if let Some(b) = bytes.last_mut() {
            *b = last;
        }
        Address::from_bytes(bytes)
    }

    fn owner() -> Address {
        addr(0xff)
    }

    fn make_service(treasury: Arc<dyn Treasury>) -> LedgerService {
        let Ok(ledger) = Ledger::new(owner(), STAKE, StakePolicy::Unique) else {
            panic!("valid ledger");
        };
        LedgerService::new(ledger, treasury, EventBus::new(100))
    }

    #[tokio::test]
    async fn stake_emits_event() {
        let service = make_service(Arc::new(InMemoryTreasury::new()));
        let mut rx = service.event_bus().subscribe();

        let Ok(receipt) = service.stake(addr(1), STAKE).await else {
            panic!("stake rejected");
        };
        assert_eq!(receipt.balance, STAKE);

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event, receipt.event);
        assert_eq!(event.event.event_type_str(), "staked");
        assert_eq!(event.sequence, 1);
    }

    #[tokio::test]
    async fn rejected_stake_emits_nothing() {
        let service = make_service(Arc::new(InMemoryTreasury::new()));
        let mut rx = service.event_bus().subscribe();

        assert!(service.stake(addr(1), Wei::new(1)).await.is_err());
        assert!(rx.try_recv().is_err());
        assert_eq!(service.state().await.balance, Wei::ZERO);
    }

    #[tokio::test]
    async fn winner_is_credited_by_treasury() {
        let treasury = Arc::new(InMemoryTreasury::new());
        let service = make_service(Arc::clone(&treasury) as Arc<dyn Treasury>);
        for i in 1..=3 {
            assert!(service.stake(addr(i), STAKE).await.is_ok());
        }
        let mut rx = service.event_bus().subscribe();

        let Ok(amount) = service.send_funds_to(owner(), addr(3)).await else {
            panic!("distribution failed");
        };
        assert_eq!(amount, Wei::new(STAKE.get() * 3));
        assert_eq!(treasury.credited(addr(3)), amount);
        assert_eq!(service.state().await.balance, Wei::ZERO);

        let Ok(event) = rx.recv().await else {
            panic!("expected funds_sent");
        };
        assert!(matches!(
            event.event,
            LedgerEvent::FundsSent { recipient, amount: a, .. } if recipient == addr(3) && a == amount
        ));
    }

    #[tokio::test]
    async fn failed_transfer_restores_ledger() {
        let service = make_service(Arc::new(RejectingTreasury));
        assert!(service.stake(addr(1), STAKE).await.is_ok());
        let before = service.state().await;
        let mut rx = service.event_bus().subscribe();

        let result = service.send_funds_to(owner(), addr(1)).await;
        assert!(matches!(result, Err(EscrowError::TransferFailed(_))));

        let result = service.withdraw(owner()).await;
        assert!(matches!(result, Err(EscrowError::TransferFailed(_))));

        assert_eq!(service.state().await, before);
        assert_eq!(service.events_after(0, 10).await.len(), 1);
        assert!(rx.try_recv().is_err());

        let Ok(receipt) = service.stake(addr(2), STAKE).await else {
            panic!("stake after failed payout rejected");
        };
        assert_eq!(receipt.event.sequence, 2);
    }

    #[tokio::test]
    async fn withdraw_empty_is_zero_noop() {
        let treasury = Arc::new(InMemoryTreasury::new());
        let service = make_service(Arc::clone(&treasury) as Arc<dyn Treasury>);
        let mut rx = service.event_bus().subscribe();

        let Ok(amount) = service.withdraw(owner()).await else {
            panic!("withdraw failed");
        };
        assert_eq!(amount, Wei::ZERO);
        assert_eq!(treasury.credited(owner()), Wei::ZERO);
        assert_eq!(service.state().await.last_sequence, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_owner_withdraw_leaves_balance() {
        let service = make_service(Arc::new(InMemoryTreasury::new()));
        assert!(service.stake(addr(1), STAKE).await.is_ok());

        let result = service.withdraw(addr(1)).await;
        assert!(matches!(result, Err(EscrowError::NotOwner(_))));
        assert_eq!(service.state().await.balance, STAKE);
    }

    #[tokio::test]
    async fn concurrent_stakes_are_serialized() {
        let service = make_service(Arc::new(InMemoryTreasury::new()));
        let mut handles = Vec::new();
        for i in 1..=20u8 {
            let svc = service.clone();
            handles.push(tokio::spawn(async move { svc.stake(addr(i), STAKE).await }));
        }
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("task panicked");
            };
            assert!(result.is_ok());
        }

        let state = service.state().await;
        assert_eq!(state.balance, Wei::new(STAKE.get() * 20));
        assert_eq!(state.last_sequence, 20);
        assert_eq!(service.participants().await.1.len(), 20);
    }

    #[tokio::test]
    async fn reset_round_emits_event_and_clears_lobby() {
        let service = make_service(Arc::new(InMemoryTreasury::new()));
        assert!(service.stake(addr(1), STAKE).await.is_ok());
        assert!(service.withdraw(owner()).await.is_ok());

        let Ok(recorded) = service.reset_round(owner()).await else {
            panic!("reset failed");
        };
        assert_eq!(recorded.event.event_type_str(), "round_reset");
        assert_eq!(service.participants().await, (2, Vec::new()));
        assert!(matches!(service.verify_stake(addr(1)).await, Ok((false, 2))));
        assert_eq!(service.events_after(0, 10).await.len(), 3);
    }

    #[tokio::test]
    async fn verify_stake_reports_round_of_the_answer() {
        let service = make_service(Arc::new(InMemoryTreasury::new()));
        assert!(service.stake(addr(1), STAKE).await.is_ok());
        assert!(matches!(service.verify_stake(addr(1)).await, Ok((true, 1))));
        assert!(matches!(service.verify_stake(addr(2)).await, Ok((false, 1))));
    }
}
