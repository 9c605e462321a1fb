//! Escrow ledger state machine.
//!
//! [`Ledger`] holds the pooled stakes, tracks who staked in the current
//! round, and lets the owner release the whole pool. It is a plain,
//! synchronous value: callers serialize access (see
//! [`crate::service::LedgerService`]) and every method either commits all
//! of its effects or returns an error with the ledger untouched.
//!
//! Outgoing operations follow checks-effects-interactions: they validate,
//! then zero the balance and journal the event, and only then hand back a
//! [`Transfer`] for the caller to execute against the treasury.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Address, LedgerEvent, RecordedEvent, Wei};
use crate::error::EscrowError;

/// Number of events kept in memory unless configured otherwise.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 100_000;

/// Duplicate-stake policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakePolicy {
    /// Each address may stake at most once per round.
    #[default]
    Unique,
    /// Any address may stake any number of times. Stake membership is not
    /// tracked.
    Unlimited,
}

impl StakePolicy {
    /// Returns the policy name as used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::Unlimited => "unlimited",
        }
    }
}

impl FromStr for StakePolicy {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unique" => Ok(Self::Unique),
            "unlimited" => Ok(Self::Unlimited),
            other => Err(EscrowError::InvalidRequest(format!(
                "unknown stake policy: {other}"
            ))),
        }
    }
}

impl fmt::Display for StakePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value that must leave the ledger once its effects are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Receiving address.
    pub to: Address,
    /// Amount to move.
    pub amount: Wei,
}

/// Result of an outgoing operation: the external transfer still to be
/// performed and the event already journaled for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Transfer to execute.
    pub transfer: Transfer,
    /// Journaled event describing the distribution.
    pub event: RecordedEvent,
}

/// The fields an outgoing operation touches, captured before it runs.
///
/// Restoring a checkpoint with [`Ledger::rollback`] undoes a payout whose
/// transfer failed without copying the staked set or the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    balance: Wei,
    total_distributed: Wei,
    sequence: u64,
}

/// Read-only summary of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerView {
    /// Ledger owner.
    pub owner: Address,
    /// Fixed stake amount.
    pub stake_amount: Wei,
    /// Active duplicate-stake policy.
    pub policy: StakePolicy,
    /// Value currently held.
    pub balance: Wei,
    /// Current round number.
    pub round: u64,
    /// Stakes accepted in the current round.
    pub participant_count: usize,
    /// Value accepted over the ledger's lifetime.
    pub total_staked: Wei,
    /// Value paid out over the ledger's lifetime.
    pub total_distributed: Wei,
    /// Sequence number of the most recent event (0 if none).
    pub last_sequence: u64,
}

/// Pooled-stake escrow.
#[derive(Debug, Clone)]
pub struct Ledger {
    owner: Address,
    stake_amount: Wei,
    policy: StakePolicy,
    balance: Wei,
    /// Addresses that staked this round (unique policy only).
    staked: HashSet<Address>,
    /// One entry per accepted stake this round, in acceptance order.
    lobby: Vec<Address>,
    round: u64,
    total_staked: Wei,
    total_distributed: Wei,
    /// Most recent events, oldest first, at most `journal_capacity` long.
    journal: VecDeque<RecordedEvent>,
    journal_capacity: usize,
    /// Sequence of the latest event, retained or not.
    sequence: u64,
}

impl Ledger {
    /// Creates an empty ledger in round 1.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InvalidRequest`] if `stake_amount` is zero or
    /// `owner` is the zero address.
    pub fn new(owner: Address, stake_amount: Wei, policy: StakePolicy) -> Result<Self, EscrowError> {
        if stake_amount.is_zero() {
            return Err(EscrowError::InvalidRequest(
                "stake amount must be positive".to_string(),
            ));
        }
        if owner.is_zero() {
            return Err(EscrowError::InvalidRequest(
                "owner must not be the zero address".to_string(),
            ));
        }
        Ok(Self {
            owner,
            stake_amount,
            policy,
            balance: Wei::ZERO,
            staked: HashSet::new(),
            lobby: Vec::new(),
            round: 1,
            total_staked: Wei::ZERO,
            total_distributed: Wei::ZERO,
            journal: VecDeque::new(),
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            sequence: 0,
        })
    }

    /// Rebuilds a ledger by replaying a stored event history, oldest first.
    ///
    /// The configured `owner`, `stake_amount` and `policy` apply from here
    /// on; replayed events keep the values they were recorded with.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InvalidRequest`] for an invalid configuration
    /// and [`EscrowError::CorruptJournal`] if the history has gaps or does
    /// not describe a reachable ledger state.
    pub fn from_journal<I>(
        owner: Address,
        stake_amount: Wei,
        policy: StakePolicy,
        events: I,
    ) -> Result<Self, EscrowError>
    where
        I: IntoIterator<Item = RecordedEvent>,
    {
        let mut ledger = Self::new(owner, stake_amount, policy)?;
        for recorded in events {
            ledger.replay(recorded)?;
        }
        Ok(ledger)
    }

    /// Limits how many events are kept in memory. Older events are dropped
    /// first; sequence numbering is unaffected.
    #[must_use]
    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity.max(1);
        while self.journal.len() > self.journal_capacity {
            self.journal.pop_front();
        }
        self
    }

    /// Returns the owner address.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Returns the fixed stake amount.
    #[must_use]
    pub const fn stake_amount(&self) -> Wei {
        self.stake_amount
    }

    /// Returns the active duplicate-stake policy.
    #[must_use]
    pub const fn policy(&self) -> StakePolicy {
        self.policy
    }

    /// Returns the value currently held.
    #[must_use]
    pub const fn balance(&self) -> Wei {
        self.balance
    }

    /// Returns the current round number.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Returns the stakes accepted this round, in acceptance order.
    #[must_use]
    pub fn participants(&self) -> &[Address] {
        &self.lobby
    }

    /// Returns a read-only summary.
    #[must_use]
    pub fn view(&self) -> LedgerView {
        LedgerView {
            owner: self.owner,
            stake_amount: self.stake_amount,
            policy: self.policy,
            balance: self.balance,
            round: self.round,
            participant_count: self.lobby.len(),
            total_staked: self.total_staked,
            total_distributed: self.total_distributed,
            last_sequence: self.last_sequence(),
        }
    }

    /// Returns the sequence number of the latest journaled event.
    #[must_use]
    pub const fn last_sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns up to `limit` retained events with a sequence greater than
    /// `after`, oldest first.
    #[must_use]
    pub fn events_after(&self, after: u64, limit: usize) -> Vec<RecordedEvent> {
        let Some(first) = self.journal.front().map(|e| e.sequence) else {
            return Vec::new();
        };
        // Retained sequences are dense, so the offset from the oldest one
        // is an index.
        let start = usize::try_from(after.saturating_sub(first.saturating_sub(1)))
            .unwrap_or(usize::MAX);
        self.journal
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Accepts a stake of exactly [`Ledger::stake_amount`] from `caller`.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::WrongAmount`] if `amount` differs from the fixed
    ///   stake.
    /// - [`EscrowError::AlreadyStaked`] if the unique policy is active and
    ///   `caller` already staked this round.
    /// - [`EscrowError::ArithmeticOverflow`] if the balance would overflow.
    pub fn stake(&mut self, caller: Address, amount: Wei) -> Result<RecordedEvent, EscrowError> {
        if amount != self.stake_amount {
            return Err(EscrowError::WrongAmount {
                expected: self.stake_amount,
                actual: amount,
            });
        }
        if self.policy == StakePolicy::Unique && self.staked.contains(&caller) {
            return Err(EscrowError::AlreadyStaked(caller));
        }

        let balance = self.balance.checked_add(amount)?;
        let total_staked = self.total_staked.checked_add(amount)?;

        self.balance = balance;
        self.total_staked = total_staked;
        if self.policy == StakePolicy::Unique {
            self.staked.insert(caller);
        }
        self.lobby.push(caller);

        Ok(self.record(LedgerEvent::Staked {
            participant: caller,
            amount,
            round: self.round,
            timestamp: Utc::now(),
        }))
    }

    /// Returns whether `identity` staked in the current round.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::StakeTrackingDisabled`] under the unlimited
    /// policy, where membership is not tracked.
    pub fn verify_stake(&self, identity: Address) -> Result<bool, EscrowError> {
        match self.policy {
            StakePolicy::Unique => Ok(self.staked.contains(&identity)),
            StakePolicy::Unlimited => Err(EscrowError::StakeTrackingDisabled),
        }
    }

    /// Moves the entire balance to the owner.
    ///
    /// Returns `None` when the balance is already zero: the call succeeds
    /// without a transfer or an event.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::NotOwner`] if `caller` is not the owner.
    pub fn withdraw(&mut self, caller: Address) -> Result<Option<Settlement>, EscrowError> {
        self.ensure_owner(caller)?;
        if self.balance.is_zero() {
            return Ok(None);
        }

        let transfer = self.drain_to(self.owner)?;
        let event = self.record(LedgerEvent::Withdrawn {
            owner: self.owner,
            amount: transfer.amount,
            timestamp: Utc::now(),
        });
        Ok(Some(Settlement { transfer, event }))
    }

    /// Moves the entire balance to `recipient`.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::NotOwner`] if `caller` is not the owner.
    /// - [`EscrowError::InvalidRecipient`] if `recipient` is the zero
    ///   address.
    /// - [`EscrowError::EmptyBalance`] if there is nothing to send.
    pub fn send_funds_to(
        &mut self,
        caller: Address,
        recipient: Address,
    ) -> Result<Settlement, EscrowError> {
        self.ensure_owner(caller)?;
        if recipient.is_zero() {
            return Err(EscrowError::InvalidRecipient);
        }
        if self.balance.is_zero() {
            return Err(EscrowError::EmptyBalance);
        }

        let transfer = self.drain_to(recipient)?;
        let event = self.record(LedgerEvent::FundsSent {
            recipient,
            amount: transfer.amount,
            timestamp: Utc::now(),
        });
        Ok(Settlement { transfer, event })
    }

    /// Clears the staked set and opens the next round.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::NotOwner`] if `caller` is not the owner.
    /// - [`EscrowError::RoundInProgress`] if the pool still holds value.
    /// - [`EscrowError::ArithmeticOverflow`] if the round counter is
    ///   exhausted.
    pub fn reset_round(&mut self, caller: Address) -> Result<RecordedEvent, EscrowError> {
        self.ensure_owner(caller)?;
        if !self.balance.is_zero() {
            return Err(EscrowError::RoundInProgress(self.balance));
        }
        let round = self
            .round
            .checked_add(1)
            .ok_or(EscrowError::ArithmeticOverflow)?;

        let cleared = self.lobby.len();
        self.staked.clear();
        self.lobby.clear();
        self.round = round;

        Ok(self.record(LedgerEvent::RoundReset {
            round,
            cleared,
            timestamp: Utc::now(),
        }))
    }

    /// Captures the state an outgoing operation may change.
    #[must_use]
    pub const fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            balance: self.balance,
            total_distributed: self.total_distributed,
            sequence: self.sequence,
        }
    }

    /// Undoes a settled operation whose transfer failed.
    ///
    /// Only valid for [`Ledger::withdraw`] and [`Ledger::send_funds_to`]
    /// applied after `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.balance = checkpoint.balance;
        self.total_distributed = checkpoint.total_distributed;
        while self
            .journal
            .back()
            .is_some_and(|e| e.sequence > checkpoint.sequence)
        {
            self.journal.pop_back();
        }
        self.sequence = checkpoint.sequence;
    }

    /// Applies one stored event on top of the current state.
    fn replay(&mut self, recorded: RecordedEvent) -> Result<(), EscrowError> {
        let expected = self.sequence.saturating_add(1);
        if recorded.sequence != expected {
            return Err(EscrowError::CorruptJournal(format!(
                "expected sequence {expected}, found {}",
                recorded.sequence
            )));
        }
        let corrupt = |what: &str| {
            EscrowError::CorruptJournal(format!("event {}: {what}", recorded.sequence))
        };

        match &recorded.event {
            LedgerEvent::Staked {
                participant,
                amount,
                round,
                ..
            } => {
                if *round != self.round {
                    return Err(corrupt("stake outside the current round"));
                }
                self.balance = self
                    .balance
                    .checked_add(*amount)
                    .map_err(|_| corrupt("balance overflow"))?;
                self.total_staked = self
                    .total_staked
                    .checked_add(*amount)
                    .map_err(|_| corrupt("total staked overflow"))?;
                if self.policy == StakePolicy::Unique {
                    self.staked.insert(*participant);
                }
                self.lobby.push(*participant);
            }
            LedgerEvent::FundsSent { amount, .. } | LedgerEvent::Withdrawn { amount, .. } => {
                self.balance = self
                    .balance
                    .checked_sub(*amount)
                    .map_err(|_| corrupt("payout exceeds balance"))?;
                self.total_distributed = self
                    .total_distributed
                    .checked_add(*amount)
                    .map_err(|_| corrupt("total distributed overflow"))?;
            }
            LedgerEvent::RoundReset { round, .. } => {
                if *round != self.round.saturating_add(1) {
                    return Err(corrupt("round reset out of order"));
                }
                self.staked.clear();
                self.lobby.clear();
                self.round = *round;
            }
        }

        self.push(recorded);
        Ok(())
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), EscrowError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(EscrowError::NotOwner(caller))
        }
    }

    /// Zeroes the balance and books the outflow. Must run before the
    /// transfer it returns is executed.
    fn drain_to(&mut self, to: Address) -> Result<Transfer, EscrowError> {
        let amount = self.balance;
        let total_distributed = self.total_distributed.checked_add(amount)?;

        self.balance = Wei::ZERO;
        self.total_distributed = total_distributed;
        Ok(Transfer { to, amount })
    }

    fn record(&mut self, event: LedgerEvent) -> RecordedEvent {
        let recorded = RecordedEvent {
            sequence: self.sequence.saturating_add(1),
            event,
        };
        self.push(recorded.clone());
        recorded
    }

    fn push(&mut self, recorded: RecordedEvent) {
        self.sequence = recorded.sequence;
        if self.journal.len() >= self.journal_capacity {
            self.journal.pop_front();
        }
        self.journal.push_back(recorded);
    }
}
