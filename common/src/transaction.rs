//! Transaction kind and lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of balance-affecting transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// Funds leaving an account toward an external destination.
    Withdraw,
    /// Funds arriving at an account.
    Deposit,
    /// One leg of an internal asset conversion.
    Exchange,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxKind::Withdraw => "withdraw",
            TxKind::Deposit => "deposit",
            TxKind::Exchange => "exchange",
        };
        write!(f, "{s}")
    }
}

/// Transaction status representing the lifecycle state.
///
/// Transitions are monotonic: `pending` may move to `completed` or
/// `failed`; terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Accepted, awaiting external settlement.
    Pending,
    /// Settled successfully.
    Completed,
    /// Settlement failed; any reserved funds are returned.
    Failed,
}

impl TxStatus {
    /// Check if this is a final state.
    pub fn is_final(&self) -> bool {
        matches!(self, TxStatus::Completed | TxStatus::Failed)
    }

    /// Get valid next states from current state.
    pub fn valid_transitions(&self) -> &[TxStatus] {
        match self {
            TxStatus::Pending => &[TxStatus::Completed, TxStatus::Failed],
            TxStatus::Completed => &[],
            TxStatus::Failed => &[],
        }
    }

    /// Check if transition to given state is valid.
    pub fn can_transition_to(&self, next: TxStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
