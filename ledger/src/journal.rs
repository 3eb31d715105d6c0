//! Append-mostly journal of balance-affecting events.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tonvault_common::{amount, AccountId, Asset, TxId, TxKind, TxStatus, VaultError, VaultResult};

/// Destination used for records that never leave the ledger.
pub const INTERNAL_DESTINATION: &str = "internal";

/// A single transaction record.
///
/// Immutable once created except for the completion fields: `status`
/// (monotonic), `settlement_ref`, and the admin-patchable metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    /// Unique, time-ordered identifier.
    pub id: TxId,
    /// Owning account.
    pub account: AccountId,
    /// Kind of event.
    pub kind: TxKind,
    /// Asset affected.
    pub asset: Asset,
    /// Payable amount. For withdrawals this is the net amount actually
    /// sent (gross minus fee); for deposits and exchange legs the amount
    /// credited or debited.
    pub amount: Decimal,
    /// Network or processing fee, if any.
    pub fee: Decimal,
    /// External address, or `"internal"` for ledger-internal events.
    pub destination: String,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Lifecycle status.
    pub status: TxStatus,
    /// Whether the gross amount was debited from the balance when this
    /// record was created. Reserved funds are returned if the operation
    /// fails.
    pub reserved: bool,
    /// The other leg of an exchange, if this record is one side of it.
    pub linked_tx: Option<TxId>,
    /// External confirmation (e.g. a chain transaction hash), attached
    /// once the operation settles.
    pub settlement_ref: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TxRecord {
    /// Gross amount this record moved out of the balance (withdrawals
    /// carry the fee on top of the payable amount).
    pub fn gross(&self) -> Decimal {
        self.amount + self.fee
    }
}

/// Input for a new journal record.
#[derive(Debug, Clone)]
pub struct TxDraft {
    pub account: AccountId,
    pub kind: TxKind,
    pub asset: Asset,
    pub amount: Decimal,
    pub fee: Decimal,
    pub destination: String,
    pub comment: Option<String>,
    pub status: TxStatus,
    pub reserved: bool,
}

impl TxDraft {
    /// A draft with no fee, an internal destination and `pending` status.
    pub fn new(account: AccountId, kind: TxKind, asset: Asset, amount: Decimal) -> Self {
        Self {
            account,
            kind,
            asset,
            amount,
            fee: Decimal::ZERO,
            destination: INTERNAL_DESTINATION.to_string(),
            comment: None,
            status: TxStatus::Pending,
            reserved: false,
        }
    }

    /// Mark the gross amount as debited at creation time.
    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }

    pub fn fee(mut self, fee: Decimal) -> Self {
        self.fee = fee;
        self
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Assert immediate settlement (e.g. an internal exchange leg).
    pub fn completed(mut self) -> Self {
        self.status = TxStatus::Completed;
        self
    }

    pub fn status(mut self, status: TxStatus) -> Self {
        self.status = status;
        self
    }

    /// Validate the draft without recording it. Callers that mutate a
    /// balance before appending use this to reject bad input while the
    /// two are still in step.
    pub fn validate(&self) -> VaultResult<()> {
        amount::positive(self.amount)?;
        amount::non_negative(self.fee, "fee")?;
        if self.destination.trim().is_empty() {
            return Err(VaultError::Validation {
                field: "destination",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn into_record(self, id: TxId, linked_tx: Option<TxId>) -> TxRecord {
        let now = Utc::now();
        TxRecord {
            id,
            account: self.account,
            kind: self.kind,
            asset: self.asset,
            amount: amount::quantize(self.amount),
            fee: amount::quantize(self.fee),
            destination: self.destination,
            comment: self.comment,
            status: self.status,
            reserved: self.reserved,
            linked_tx,
            settlement_ref: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin correction of non-status metadata; valid on terminal records.
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub settlement_ref: Option<String>,
    pub fee: Option<Decimal>,
    pub comment: Option<String>,
}

/// Filter for [`Journal::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TxFilter {
    pub account: Option<AccountId>,
    pub id: Option<TxId>,
}

impl TxFilter {
    pub fn for_account(account: AccountId) -> Self {
        Self {
            account: Some(account),
            id: None,
        }
    }

    fn matches(&self, record: &TxRecord) -> bool {
        self.account.map_or(true, |a| record.account == a)
            && self.id.map_or(true, |id| record.id == id)
    }
}

/// One bounded page of records, newest first.
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<TxRecord>,
    /// Pass back to [`Journal::list`] to resume after the last record.
    pub next_cursor: Option<TxId>,
}

/// The transaction journal.
///
/// Records are appended by the exchange engine and the transfer
/// processor; status changes go through [`Journal::update_status`], which
/// enforces the monotonic lifecycle.
pub struct Journal {
    records: DashMap<TxId, TxRecord>,
    /// Creation order; ids are UUID v7 so this stays time-sorted.
    order: RwLock<Vec<TxId>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Append a new record.
    pub fn record(&self, draft: TxDraft) -> VaultResult<TxRecord> {
        draft.validate()?;
        let record = draft.into_record(TxId::new(), None);
        self.append(record.clone());
        Ok(record)
    }

    /// Append the two legs of an exchange, cross-linked to each other.
    pub fn record_linked_pair(
        &self,
        debit: TxDraft,
        credit: TxDraft,
    ) -> VaultResult<(TxRecord, TxRecord)> {
        debit.validate()?;
        credit.validate()?;

        let debit_id = TxId::new();
        let credit_id = TxId::new();
        let debit = debit.into_record(debit_id, Some(credit_id));
        let credit = credit.into_record(credit_id, Some(debit_id));
        self.append(debit.clone());
        self.append(credit.clone());
        Ok((debit, credit))
    }

    /// Fetch one record by id.
    pub fn get(&self, id: TxId) -> VaultResult<TxRecord> {
        self.records
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| VaultError::tx_not_found(id))
    }

    /// Transition a record's status.
    ///
    /// Transitions are monotonic: `pending` → `completed` or `failed`,
    /// nothing else. A terminal record fails with `InvalidTransition`;
    /// metadata on terminal records is corrected through
    /// [`Journal::patch_metadata`] instead.
    pub fn update_status(
        &self,
        id: TxId,
        status: TxStatus,
        settlement_ref: Option<String>,
    ) -> VaultResult<TxRecord> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| VaultError::tx_not_found(id))?;

        if !record.status.can_transition_to(status) {
            return Err(VaultError::InvalidTransition {
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        if settlement_ref.is_some() {
            record.settlement_ref = settlement_ref;
        }
        record.updated_at = Utc::now();

        info!(tx = %id, status = %status, "transaction status updated");
        Ok(record.clone())
    }

    /// Correct non-status metadata on a record. This is the recognized
    /// escape hatch for administrators and works on terminal records.
    pub fn patch_metadata(&self, id: TxId, patch: MetadataPatch) -> VaultResult<TxRecord> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| VaultError::tx_not_found(id))?;

        if let Some(fee) = patch.fee {
            record.fee = amount::non_negative(fee, "fee")?;
        }
        if patch.settlement_ref.is_some() {
            record.settlement_ref = patch.settlement_ref;
        }
        if patch.comment.is_some() {
            record.comment = patch.comment;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    /// List records newest first, optionally filtered, as one bounded
    /// page. Pass the previous page's `next_cursor` to resume.
    ///
    /// If the cursor record was purged meanwhile, the scan resumes from
    /// the first id older than it (ids are time-ordered) instead of
    /// ending pagination early.
    pub fn list(&self, filter: TxFilter, page_size: usize, cursor: Option<TxId>) -> Page {
        let order = self.order.read();
        let cursor_present = cursor.map_or(false, |c| self.records.contains_key(&c));
        let mut records = Vec::with_capacity(page_size.min(64));
        let mut resumed = cursor.is_none();

        for id in order.iter().rev() {
            if !resumed {
                if let Some(c) = cursor {
                    if cursor_present {
                        if *id == c {
                            resumed = true;
                        }
                        continue;
                    }
                    if *id >= c {
                        continue;
                    }
                    resumed = true;
                }
            }
            if records.len() == page_size {
                break;
            }
            if let Some(record) = self.records.get(id) {
                if filter.matches(&record) {
                    records.push(record.clone());
                }
            }
        }

        let next_cursor = if records.len() == page_size {
            records.last().map(|r| r.id)
        } else {
            None
        };
        Page {
            records,
            next_cursor,
        }
    }

    /// Administrative purge of one record.
    ///
    /// Refuses to delete a `pending` record, since that may still
    /// represent an in-flight operation tied to reserved funds.
    pub fn purge(&self, id: TxId) -> VaultResult<TxRecord> {
        let record = self.get(id)?;
        if record.status == TxStatus::Pending {
            return Err(VaultError::Validation {
                field: "status",
                message: format!("cannot purge pending transaction {id}"),
            });
        }
        self.records.remove(&id);
        self.order.write().retain(|o| *o != id);
        info!(tx = %id, "transaction purged");
        Ok(record)
    }

    /// Number of records in the journal.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the journal holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn append(&self, record: TxRecord) {
        debug!(tx = %record.id, kind = %record.kind, status = %record.status, "journal append");
        let mut order = self.order.write();
        order.push(record.id);
        self.records.insert(record.id, record);
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
