//! Asset-to-asset exchange engine.
//!
//! A request moves Quoted → Validated → Committed, or is Rejected with a
//! typed error at whichever check fails first. The commit lands both legs
//! in one atomic ledger call and appends two linked journal records.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use tonvault_common::{amount, AccountId, Asset, TxKind, VaultError, VaultResult};
use tonvault_ledger::{ApplyOptions, BalanceDelta, BalanceSet, Journal, Ledger, TxDraft, TxRecord};
use tonvault_oracle::PriceOracle;

use crate::settings::SettingsStore;

/// The outcome of the quote stage: amounts the commit will move.
#[derive(Debug, Clone)]
pub struct Quote {
    pub account: AccountId,
    pub from: Asset,
    pub to: Asset,
    /// Source-asset amount to debit.
    pub amount: Decimal,
    /// USD value of the input at the quoted prices.
    pub usd_value: Decimal,
    /// Destination-asset amount before the fee.
    pub gross_out: Decimal,
    /// Fee withheld, in the destination asset.
    pub fee_amount: Decimal,
    /// Destination-asset amount actually credited.
    pub credited_amount: Decimal,
}

/// A committed exchange: both journal legs and the resulting balances.
#[derive(Debug, Clone)]
pub struct ExchangeReceipt {
    pub debit_tx: TxRecord,
    pub credit_tx: TxRecord,
    pub balances: BalanceSet,
}

/// Orchestrates conversions between two assets for one account.
pub struct ExchangeEngine {
    ledger: Arc<Ledger>,
    journal: Arc<Journal>,
    oracle: Arc<PriceOracle>,
    settings: Arc<SettingsStore>,
}

impl ExchangeEngine {
    /// Create a new engine over explicitly constructed dependencies.
    pub fn new(
        ledger: Arc<Ledger>,
        journal: Arc<Journal>,
        oracle: Arc<PriceOracle>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            ledger,
            journal,
            oracle,
            settings,
        }
    }

    /// Run the validation and pricing stages without committing.
    #[instrument(skip(self), fields(account = %account, from = %from, to = %to))]
    pub async fn quote(
        &self,
        account: AccountId,
        from: Asset,
        to: Asset,
        amount: Decimal,
    ) -> VaultResult<Quote> {
        if from == to {
            return Err(VaultError::SameAsset { asset: from });
        }
        let amount = amount::positive(amount)?;

        // 1. Sufficiency against the current source balance.
        let balances = self.ledger.get_or_provision(account);
        let available = balances.amount(from);
        if amount > available {
            return Err(VaultError::InsufficientFunds {
                asset: from,
                requested: amount,
                available,
            });
        }

        // 2. Prices for both sides, positive and fresh.
        let snapshot = self.oracle.snapshot(&[from, to]).await?;
        let price_from = snapshot
            .usd_price(from)
            .ok_or_else(|| price_missing(from))?;
        let price_to = snapshot.usd_price(to).ok_or_else(|| price_missing(to))?;

        // 3. Per-asset minimum, checked on the source asset.
        let settings = self.settings.get();
        let minimum = settings.minimum_for(from);
        if amount < minimum {
            return Err(VaultError::BelowMinimum {
                asset: from,
                amount,
                minimum,
            });
        }

        // 4. USD cross-rate math; fee withheld in the destination asset.
        let usd_value = amount * price_from;
        let gross_out = usd_value / price_to;
        let fee_raw = gross_out * settings.fee_percent / Decimal::ONE_HUNDRED;
        let credited = amount::quantize((gross_out - fee_raw).max(Decimal::ZERO));
        if credited.is_zero() {
            return Err(VaultError::Validation {
                field: "amount",
                message: format!("input of {amount} {from} converts to a zero {to} credit"),
            });
        }

        Ok(Quote {
            account,
            from,
            to,
            amount,
            usd_value,
            gross_out: amount::quantize(gross_out),
            fee_amount: amount::quantize(fee_raw),
            credited_amount: credited,
        })
    }

    /// Quote and commit in one call.
    ///
    /// The debit and credit land through a single atomic ledger update,
    /// then both legs are journaled `completed`, cross-referencing each
    /// other.
    #[instrument(skip(self), fields(account = %account, from = %from, to = %to))]
    pub async fn commit(
        &self,
        account: AccountId,
        from: Asset,
        to: Asset,
        amount: Decimal,
    ) -> VaultResult<ExchangeReceipt> {
        let quote = self.quote(account, from, to, amount).await?;

        let delta = BalanceDelta::new()
            .debit(from, quote.amount)
            .credit(to, quote.credited_amount);
        let balances = self
            .ledger
            .apply_delta(account, &delta, ApplyOptions::provisioning())?;

        let note = format!(
            "exchange {} {} -> {} {}",
            quote.amount, from, quote.credited_amount, to
        );
        let debit = TxDraft::new(account, TxKind::Exchange, from, quote.amount)
            .comment(note.clone())
            .completed();
        let credit = TxDraft::new(account, TxKind::Exchange, to, quote.credited_amount)
            .fee(quote.fee_amount)
            .comment(note)
            .completed();
        let (debit_tx, credit_tx) = self.journal.record_linked_pair(debit, credit)?;

        info!(
            debit_tx = %debit_tx.id,
            credit_tx = %credit_tx.id,
            credited = %quote.credited_amount,
            fee = %quote.fee_amount,
            "exchange committed"
        );

        Ok(ExchangeReceipt {
            debit_tx,
            credit_tx,
            balances,
        })
    }
}

fn price_missing(asset: Asset) -> VaultError {
    VaultError::PriceUnavailable {
        reason: format!("no usable USD price for {asset}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tonvault_oracle::{MockPriceProvider, OracleConfig, PriceOracle};

    fn engine_with_prices(prices: &[(Asset, Decimal)]) -> (ExchangeEngine, Arc<Ledger>) {
        let provider = MockPriceProvider::new("test");
        for (asset, price) in prices {
            provider.set_price(*asset, *price);
        }
        let ledger = Arc::new(Ledger::new());
        let engine = ExchangeEngine::new(
            Arc::clone(&ledger),
            Arc::new(Journal::new()),
            Arc::new(PriceOracle::new(Arc::new(provider), OracleConfig::default())),
            Arc::new(SettingsStore::default()),
        );
        (engine, ledger)
    }

    fn fund(ledger: &Ledger, account: AccountId, asset: Asset, amount: Decimal) {
        ledger
            .apply_delta(
                account,
                &BalanceDelta::new().credit(asset, amount),
                ApplyOptions::provisioning(),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_same_asset_rejected() {
        let (engine, _) = engine_with_prices(&[(Asset::Usdt, dec!(1))]);
        let err = engine
            .quote(AccountId::new(1), Asset::Usdt, Asset::Usdt, dec!(5))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::SameAsset { asset: Asset::Usdt }));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let (engine, _) = engine_with_prices(&[(Asset::Ton, dec!(3)), (Asset::Usdt, dec!(1))]);
        let err = engine
            .quote(AccountId::new(1), Asset::Ton, Asset::Usdt, dec!(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_insufficient_funds_checked_before_price() {
        // No prices set at all: sufficiency must reject first.
        let (engine, _) = engine_with_prices(&[]);
        let err = engine
            .quote(AccountId::new(1), Asset::Ton, Asset::Usdt, dec!(5))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn test_missing_price_rejected() {
        let (engine, ledger) = engine_with_prices(&[(Asset::Ton, dec!(3))]);
        fund(&ledger, AccountId::new(1), Asset::Ton, dec!(10));
        let err = engine
            .quote(AccountId::new(1), Asset::Ton, Asset::Usdt, dec!(5))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::PriceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_below_minimum_rejected() {
        let (engine, ledger) = engine_with_prices(&[(Asset::Ton, dec!(3)), (Asset::Usdt, dec!(1))]);
        fund(&ledger, AccountId::new(1), Asset::Ton, dec!(10));

        let mut settings = engine.settings.get();
        settings.minimums.insert(Asset::Ton, dec!(2));
        engine.settings.set(settings).unwrap();

        let err = engine
            .quote(AccountId::new(1), Asset::Ton, Asset::Usdt, dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VaultError::BelowMinimum {
                asset: Asset::Ton,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_quote_math_matches_policy() {
        let (engine, ledger) = engine_with_prices(&[(Asset::Ton, dec!(3)), (Asset::Usdt, dec!(1))]);
        fund(&ledger, AccountId::new(1), Asset::Ton, dec!(10));

        let quote = engine
            .quote(AccountId::new(1), Asset::Ton, Asset::Usdt, dec!(10))
            .await
            .unwrap();
        assert_eq!(quote.usd_value, dec!(30));
        assert_eq!(quote.gross_out, dec!(30));
        assert_eq!(quote.fee_amount, dec!(0.3));
        assert_eq!(quote.credited_amount, dec!(29.7));
    }

    #[tokio::test]
    async fn test_credited_rounds_down() {
        // 1 TON at $1 into BTC at $3: gross = 0.33333333..., fee 1%.
        let (engine, ledger) = engine_with_prices(&[(Asset::Ton, dec!(1)), (Asset::Btc, dec!(3))]);
        fund(&ledger, AccountId::new(1), Asset::Ton, dec!(1));

        let quote = engine
            .quote(AccountId::new(1), Asset::Ton, Asset::Btc, dec!(1))
            .await
            .unwrap();
        // gross 0.33333333..., fee 0.0033333333..., credited truncated at 8 dp.
        assert_eq!(quote.credited_amount, dec!(0.33));
        assert!(quote.credited_amount <= quote.gross_out - quote.fee_amount);
    }

    #[tokio::test]
    async fn test_commit_moves_both_legs_atomically() {
        let (engine, ledger) = engine_with_prices(&[(Asset::Ton, dec!(3)), (Asset::Usdt, dec!(1))]);
        let account = AccountId::new(1);
        fund(&ledger, account, Asset::Ton, dec!(10));

        let receipt = engine
            .commit(account, Asset::Ton, Asset::Usdt, dec!(10))
            .await
            .unwrap();
        assert_eq!(receipt.balances.amount(Asset::Ton), dec!(0));
        assert_eq!(receipt.balances.amount(Asset::Usdt), dec!(29.7));
        assert_eq!(receipt.debit_tx.linked_tx, Some(receipt.credit_tx.id));
        assert_eq!(receipt.credit_tx.linked_tx, Some(receipt.debit_tx.id));
        assert_eq!(receipt.credit_tx.fee, dec!(0.3));
    }
}
