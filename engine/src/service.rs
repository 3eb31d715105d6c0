//! Assembled operation surface of the TonVault core.

use std::sync::Arc;

use rust_decimal::Decimal;

use tonvault_common::{AccountId, Asset, TxId, TxStatus, VaultResult};
use tonvault_ledger::{
    AccountLocks, BalanceSet, Journal, Ledger, MetadataPatch, Page, TxFilter, TxRecord,
};
use tonvault_oracle::{OracleConfig, PriceOracle, PriceProvider};

use crate::exchange::{ExchangeEngine, ExchangeReceipt, Quote};
use crate::settings::{Settings, SettingsStore};
use crate::transfer::{AdminTxRequest, TransferProcessor, TransferReceipt, WithdrawalRequest};

/// One assembled core: ledger, journal, oracle, settings and the two
/// processors wired together. The price provider is the only external
/// collaborator; everything else is owned here with a defined lifecycle.
pub struct VaultService {
    ledger: Arc<Ledger>,
    journal: Arc<Journal>,
    settings: Arc<SettingsStore>,
    exchange: ExchangeEngine,
    transfers: TransferProcessor,
}

impl VaultService {
    /// Assemble the core around a price provider.
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        oracle_config: OracleConfig,
        settings: Settings,
    ) -> VaultResult<Self> {
        let ledger = Arc::new(Ledger::new());
        let journal = Arc::new(Journal::new());
        let locks = Arc::new(AccountLocks::new());
        let settings = Arc::new(SettingsStore::new(settings)?);
        let oracle = Arc::new(PriceOracle::new(provider, oracle_config));

        let exchange = ExchangeEngine::new(
            Arc::clone(&ledger),
            Arc::clone(&journal),
            oracle,
            Arc::clone(&settings),
        );
        let transfers = TransferProcessor::new(
            Arc::clone(&ledger),
            Arc::clone(&journal),
            Arc::clone(&settings),
            locks,
        );

        Ok(Self {
            ledger,
            journal,
            settings,
            exchange,
            transfers,
        })
    }

    /// Price a conversion without committing it.
    pub async fn quote_exchange(
        &self,
        account: AccountId,
        from: Asset,
        to: Asset,
        amount: Decimal,
    ) -> VaultResult<Quote> {
        self.exchange.quote(account, from, to, amount).await
    }

    /// Convert one asset into another for an account.
    pub async fn commit_exchange(
        &self,
        account: AccountId,
        from: Asset,
        to: Asset,
        amount: Decimal,
    ) -> VaultResult<ExchangeReceipt> {
        self.exchange.commit(account, from, to, amount).await
    }

    /// Debit a withdrawal and journal it as pending.
    pub fn create_withdrawal(&self, request: WithdrawalRequest) -> VaultResult<TransferReceipt> {
        self.transfers.create_withdrawal(request)
    }

    /// Record an administrator-entered deposit or withdrawal.
    pub fn record_admin_tx(&self, request: AdminTxRequest) -> VaultResult<TransferReceipt> {
        self.transfers.record_admin_tx(request)
    }

    /// Transition a transaction's status, applying any balance effect
    /// (including the failed-withdrawal re-credit).
    pub fn update_transaction_status(
        &self,
        id: TxId,
        status: TxStatus,
        settlement_ref: Option<String>,
    ) -> VaultResult<TxRecord> {
        self.transfers.update_status(id, status, settlement_ref)
    }

    /// Admin correction of non-status metadata on any record.
    pub fn patch_transaction(&self, id: TxId, patch: MetadataPatch) -> VaultResult<TxRecord> {
        self.journal.patch_metadata(id, patch)
    }

    /// Administrative purge of a terminal record.
    pub fn purge_transaction(&self, id: TxId) -> VaultResult<TxRecord> {
        self.journal.purge(id)
    }

    /// Current balances for an account, provisioning it on first
    /// reference.
    pub fn get_balances(&self, account: AccountId) -> BalanceSet {
        self.ledger.get_or_provision(account)
    }

    /// One page of transactions, newest first.
    pub fn list_transactions(
        &self,
        account: Option<AccountId>,
        page_size: usize,
        cursor: Option<TxId>,
    ) -> Page {
        let filter = TxFilter {
            account,
            id: None,
        };
        self.journal.list(filter, page_size, cursor)
    }

    /// Fetch one transaction by id.
    pub fn get_transaction(&self, id: TxId) -> VaultResult<TxRecord> {
        self.journal.get(id)
    }

    /// Current fee and minimum settings.
    pub fn get_settings(&self) -> Settings {
        self.settings.get()
    }

    /// Replace fee and minimum settings (administrator operation).
    pub fn set_settings(&self, settings: Settings) -> VaultResult<Settings> {
        self.settings.set(settings)
    }
}
