//! Withdrawal/deposit processor.
//!
//! Validates and commits single-asset transfers: user withdrawal
//! requests, administrator-entered deposits and withdrawals, and the
//! status updates a settlement watcher feeds back.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use tonvault_common::{amount, AccountId, Asset, TxId, TxKind, TxStatus, VaultError, VaultResult};
use tonvault_ledger::{
    AccountLocks, ApplyOptions, BalanceDelta, BalanceSet, Journal, Ledger, TxDraft, TxRecord,
};

use crate::settings::SettingsStore;

/// A user-initiated withdrawal request.
///
/// `gross` is the amount the account loses; the network `fee` is already
/// included in it, so the amount actually sent is `gross - fee`.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub account: AccountId,
    pub asset: Asset,
    pub gross: Decimal,
    pub fee: Decimal,
    pub destination: String,
    pub comment: Option<String>,
}

/// An administrator-entered transaction for reconciliation.
#[derive(Debug, Clone)]
pub struct AdminTxRequest {
    pub account: AccountId,
    pub kind: TxKind,
    pub asset: Asset,
    pub amount: Decimal,
    pub status: TxStatus,
    pub destination: Option<String>,
    pub comment: Option<String>,
}

/// Result of a committed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub tx: TxRecord,
    pub balances: BalanceSet,
}

/// Validates and commits single-asset transfers through the ledger and
/// journal.
pub struct TransferProcessor {
    ledger: Arc<Ledger>,
    journal: Arc<Journal>,
    settings: Arc<SettingsStore>,
    locks: Arc<AccountLocks>,
}

impl TransferProcessor {
    /// Create a new processor over explicitly constructed dependencies.
    pub fn new(
        ledger: Arc<Ledger>,
        journal: Arc<Journal>,
        settings: Arc<SettingsStore>,
        locks: Arc<AccountLocks>,
    ) -> Self {
        Self {
            ledger,
            journal,
            settings,
            locks,
        }
    }

    /// Commit a user withdrawal: debit the gross amount and journal one
    /// `pending` record carrying the net amount, with the fee as
    /// metadata. Settlement happens externally; see
    /// [`TransferProcessor::update_status`].
    #[instrument(skip(self, request), fields(account = %request.account, asset = %request.asset))]
    pub fn create_withdrawal(&self, request: WithdrawalRequest) -> VaultResult<TransferReceipt> {
        let gross = amount::positive(request.gross)?;
        let fee = amount::non_negative(request.fee, "fee")?;
        if request.destination.trim().is_empty() {
            return Err(VaultError::Validation {
                field: "destination",
                message: "withdrawal requires a destination address".to_string(),
            });
        }

        let net = gross - fee;
        if net <= Decimal::ZERO {
            return Err(VaultError::AmountBelowFee { gross, fee });
        }

        let minimum = self.settings.get().minimum_for(request.asset);
        if gross < minimum {
            return Err(VaultError::BelowMinimum {
                asset: request.asset,
                amount: gross,
                minimum,
            });
        }

        let lock = self.locks.acquire(request.account);
        let _guard = lock.lock();

        // Debit first: an insufficient balance must leave no journal
        // trace. The draft below is pre-validated, so the append after a
        // successful debit cannot fail and leave the two out of step.
        let balances = self.ledger.apply_delta(
            request.account,
            &BalanceDelta::new().debit(request.asset, gross),
            ApplyOptions::provisioning(),
        )?;

        let mut draft = TxDraft::new(request.account, TxKind::Withdraw, request.asset, net)
            .fee(fee)
            .destination(request.destination)
            .reserved();
        if let Some(comment) = request.comment {
            draft = draft.comment(comment);
        }
        let tx = self.journal.record(draft)?;

        info!(tx = %tx.id, net = %net, fee = %fee, "withdrawal created");
        Ok(TransferReceipt { tx, balances })
    }

    /// Record an administrator-entered deposit or withdrawal.
    ///
    /// A record created `completed` settles in the same step: the signed
    /// delta is applied immediately, since it represents an already
    /// settled external event entered after the fact. A `pending` record
    /// touches no balance until its status update arrives.
    #[instrument(skip(self, request), fields(account = %request.account, kind = %request.kind))]
    pub fn record_admin_tx(&self, request: AdminTxRequest) -> VaultResult<TransferReceipt> {
        if request.kind == TxKind::Exchange {
            return Err(VaultError::Validation {
                field: "kind",
                message: "admin transactions must be deposit or withdraw".to_string(),
            });
        }
        let amount = amount::positive(request.amount)?;

        let mut draft = TxDraft::new(request.account, request.kind, request.asset, amount)
            .status(request.status);
        if let Some(destination) = request.destination {
            draft = draft.destination(destination);
        }
        if let Some(comment) = request.comment {
            draft = draft.comment(comment);
        }
        // Reject bad drafts before the delta lands; the append below must
        // not be able to fail and orphan a committed balance change.
        draft.validate()?;

        let lock = self.locks.acquire(request.account);
        let _guard = lock.lock();

        let balances = if request.status == TxStatus::Completed {
            let delta = match request.kind {
                TxKind::Deposit => BalanceDelta::new().credit(request.asset, amount),
                _ => BalanceDelta::new().debit(request.asset, amount),
            };
            self.ledger
                .apply_delta(request.account, &delta, ApplyOptions::provisioning())?
        } else {
            self.ledger.get_or_provision(request.account)
        };

        let tx = self.journal.record(draft)?;
        info!(tx = %tx.id, status = %tx.status, "admin transaction recorded");
        Ok(TransferReceipt { tx, balances })
    }

    /// Transition a transaction's status, applying any ledger effect.
    ///
    /// - A reserved withdrawal moving to `failed` re-credits the original
    ///   gross amount. The re-check that the record is still `pending`
    ///   happens inside the per-account lock, so applying this twice
    ///   cannot double-credit.
    /// - An admin-entered (unreserved) withdrawal moving to `completed`
    ///   debits the gross amount at that point; on insufficient funds the
    ///   record stays `pending`.
    /// - A deposit moving to `completed` credits the amount.
    #[instrument(skip(self), fields(tx = %id, status = %status))]
    pub fn update_status(
        &self,
        id: TxId,
        status: TxStatus,
        settlement_ref: Option<String>,
    ) -> VaultResult<TxRecord> {
        let record = self.journal.get(id)?;

        let lock = self.locks.acquire(record.account);
        let _guard = lock.lock();

        // Re-read under the lock; a concurrent updater may have won.
        let record = self.journal.get(id)?;
        if !record.status.can_transition_to(status) {
            return Err(VaultError::InvalidTransition {
                from: record.status,
                to: status,
            });
        }

        match (record.kind, status) {
            (TxKind::Withdraw, TxStatus::Failed) if record.reserved => {
                let updated = self.journal.update_status(id, status, settlement_ref)?;
                self.ledger.apply_delta(
                    record.account,
                    &BalanceDelta::new().credit(record.asset, record.gross()),
                    ApplyOptions::provisioning(),
                )?;
                info!(refunded = %record.gross(), "failed withdrawal re-credited");
                Ok(updated)
            }
            (TxKind::Withdraw, TxStatus::Completed) if !record.reserved => {
                self.ledger.apply_delta(
                    record.account,
                    &BalanceDelta::new().debit(record.asset, record.gross()),
                    ApplyOptions::provisioning(),
                )?;
                self.journal.update_status(id, status, settlement_ref)
            }
            (TxKind::Deposit, TxStatus::Completed) => {
                self.ledger.apply_delta(
                    record.account,
                    &BalanceDelta::new().credit(record.asset, record.amount),
                    ApplyOptions::provisioning(),
                )?;
                self.journal.update_status(id, status, settlement_ref)
            }
            _ => self.journal.update_status(id, status, settlement_ref),
        }
    }
}
