//! End-to-end scenarios against the assembled service.

use std::sync::Arc;

use rust_decimal_macros::dec;

use tonvault_common::{AccountId, Asset, TxKind, TxStatus, VaultError};
use tonvault_engine::{AdminTxRequest, Settings, VaultService, WithdrawalRequest};
use tonvault_oracle::{MockPriceProvider, OracleConfig};

fn vault_with_prices(prices: &[(Asset, rust_decimal::Decimal)]) -> VaultService {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let provider = MockPriceProvider::new("feed");
    for (asset, price) in prices {
        provider.set_price(*asset, *price);
    }
    VaultService::new(
        Arc::new(provider),
        OracleConfig::default(),
        Settings::default(),
    )
    .unwrap()
}

fn deposit(vault: &VaultService, account: AccountId, asset: Asset, amount: rust_decimal::Decimal) {
    vault
        .record_admin_tx(AdminTxRequest {
            account,
            kind: TxKind::Deposit,
            asset,
            amount,
            status: TxStatus::Completed,
            destination: None,
            comment: None,
        })
        .unwrap();
}

// Scenario A: 10 TON at $3 into USDT at $1 with a 1% fee nets 29.7 USDT.
#[tokio::test]
async fn exchange_ton_to_usdt_with_one_percent_fee() {
    let vault = vault_with_prices(&[(Asset::Ton, dec!(3)), (Asset::Usdt, dec!(1))]);
    let account = AccountId::new(1);
    deposit(&vault, account, Asset::Ton, dec!(10));

    let quote = vault
        .quote_exchange(account, Asset::Ton, Asset::Usdt, dec!(10))
        .await
        .unwrap();
    assert_eq!(quote.gross_out, dec!(30));
    assert_eq!(quote.fee_amount, dec!(0.3));
    assert_eq!(quote.credited_amount, dec!(29.7));

    let receipt = vault
        .commit_exchange(account, Asset::Ton, Asset::Usdt, dec!(10))
        .await
        .unwrap();
    assert_eq!(receipt.balances.amount(Asset::Ton), dec!(0));
    assert_eq!(receipt.balances.amount(Asset::Usdt), dec!(29.7));

    // Exactly two linked, completed legs exist.
    let page = vault.list_transactions(Some(account), 10, None);
    let legs: Vec<_> = page
        .records
        .iter()
        .filter(|r| r.kind == TxKind::Exchange)
        .collect();
    assert_eq!(legs.len(), 2);
    assert!(legs.iter().all(|r| r.status == TxStatus::Completed));
    assert_eq!(legs[0].linked_tx, Some(legs[1].id));
    assert_eq!(legs[1].linked_tx, Some(legs[0].id));
}

// Scenario B: gross exceeds balance -> rejected, no mutation, no record.
#[tokio::test]
async fn withdrawal_exceeding_balance_leaves_no_trace() {
    let vault = vault_with_prices(&[]);
    let account = AccountId::new(2);
    deposit(&vault, account, Asset::Ton, dec!(4.9));
    let records_before = vault.list_transactions(Some(account), 50, None).records.len();

    let err = vault
        .create_withdrawal(WithdrawalRequest {
            account,
            asset: Asset::Ton,
            gross: dec!(5),
            fee: dec!(0.5),
            destination: "EQAddr".to_string(),
            comment: None,
        })
        .unwrap_err();

    assert!(matches!(err, VaultError::InsufficientFunds { .. }));
    assert_eq!(vault.get_balances(account).amount(Asset::Ton), dec!(4.9));
    assert_eq!(
        vault.list_transactions(Some(account), 50, None).records.len(),
        records_before
    );
}

// Scenario C: fee swallows the gross amount -> rejected, no state change.
#[tokio::test]
async fn withdrawal_below_fee_rejected() {
    let vault = vault_with_prices(&[]);
    let account = AccountId::new(3);
    deposit(&vault, account, Asset::Ton, dec!(10));

    let err = vault
        .create_withdrawal(WithdrawalRequest {
            account,
            asset: Asset::Ton,
            gross: dec!(2),
            fee: dec!(2.5),
            destination: "EQAddr".to_string(),
            comment: None,
        })
        .unwrap_err();

    assert!(matches!(err, VaultError::AmountBelowFee { .. }));
    assert_eq!(vault.get_balances(account).amount(Asset::Ton), dec!(10));
}

// Scenario D: exchanging an asset into itself is rejected.
#[tokio::test]
async fn exchange_same_asset_rejected() {
    let vault = vault_with_prices(&[(Asset::Usdt, dec!(1))]);
    let account = AccountId::new(4);
    deposit(&vault, account, Asset::Usdt, dec!(50));

    let err = vault
        .commit_exchange(account, Asset::Usdt, Asset::Usdt, dec!(10))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::SameAsset { asset: Asset::Usdt }));
    assert_eq!(vault.get_balances(account).amount(Asset::Usdt), dec!(50));
}

// Scenario E: admin-entered completed deposit provisions the account.
#[tokio::test]
async fn admin_deposit_provisions_fresh_account() {
    let vault = vault_with_prices(&[]);
    let account = AccountId::new(5);

    let receipt = vault
        .record_admin_tx(AdminTxRequest {
            account,
            kind: TxKind::Deposit,
            asset: Asset::Eth,
            amount: dec!(10),
            status: TxStatus::Completed,
            destination: None,
            comment: Some("cold-wallet reconciliation".into()),
        })
        .unwrap();

    let balances = vault.get_balances(account);
    assert_eq!(balances.amount(Asset::Eth), dec!(10));
    for asset in Asset::ALL {
        if asset != Asset::Eth {
            assert_eq!(balances.amount(asset), dec!(0));
        }
    }

    let page = vault.list_transactions(Some(account), 10, None);
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].id, receipt.tx.id);
    assert_eq!(page.records[0].status, TxStatus::Completed);
}

// A quote does not reserve funds: draining the account between quote and
// commit rejects the commit with no half-applied state.
#[tokio::test]
async fn stale_quote_cannot_half_apply() {
    let vault = vault_with_prices(&[(Asset::Ton, dec!(3)), (Asset::Usdt, dec!(1))]);
    let account = AccountId::new(6);
    deposit(&vault, account, Asset::Ton, dec!(10));

    vault
        .quote_exchange(account, Asset::Ton, Asset::Usdt, dec!(10))
        .await
        .unwrap();

    // Concurrent withdrawal drains most of the balance.
    vault
        .create_withdrawal(WithdrawalRequest {
            account,
            asset: Asset::Ton,
            gross: dec!(8),
            fee: dec!(0.1),
            destination: "EQAddr".to_string(),
            comment: None,
        })
        .unwrap();

    let err = vault
        .commit_exchange(account, Asset::Ton, Asset::Usdt, dec!(10))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::InsufficientFunds { .. }));

    let balances = vault.get_balances(account);
    assert_eq!(balances.amount(Asset::Ton), dec!(2));
    assert_eq!(balances.amount(Asset::Usdt), dec!(0));
}

// Failure reversal is idempotent: a second `failed` attempt cannot
// double-credit.
#[tokio::test]
async fn failed_withdrawal_reversal_is_idempotent() {
    let vault = vault_with_prices(&[]);
    let account = AccountId::new(7);
    deposit(&vault, account, Asset::Btc, dec!(1));

    let receipt = vault
        .create_withdrawal(WithdrawalRequest {
            account,
            asset: Asset::Btc,
            gross: dec!(0.5),
            fee: dec!(0.0005),
            destination: "bc1qaddr".to_string(),
            comment: None,
        })
        .unwrap();
    assert_eq!(vault.get_balances(account).amount(Asset::Btc), dec!(0.5));

    vault
        .update_transaction_status(receipt.tx.id, TxStatus::Failed, None)
        .unwrap();
    let after_once = vault.get_balances(account).amount(Asset::Btc);
    assert_eq!(after_once, dec!(1));

    let err = vault
        .update_transaction_status(receipt.tx.id, TxStatus::Failed, None)
        .unwrap_err();
    assert!(matches!(err, VaultError::InvalidTransition { .. }));
    assert_eq!(vault.get_balances(account).amount(Asset::Btc), after_once);
}

// Terminal records accept metadata corrections but never status changes.
#[tokio::test]
async fn terminal_record_patchable_but_immutable_status() {
    let vault = vault_with_prices(&[]);
    let account = AccountId::new(8);
    deposit(&vault, account, Asset::Ton, dec!(10));

    let receipt = vault
        .create_withdrawal(WithdrawalRequest {
            account,
            asset: Asset::Ton,
            gross: dec!(5),
            fee: dec!(0.1),
            destination: "EQAddr".to_string(),
            comment: None,
        })
        .unwrap();
    vault
        .update_transaction_status(receipt.tx.id, TxStatus::Completed, Some("0xcafe".into()))
        .unwrap();

    let patched = vault
        .patch_transaction(
            receipt.tx.id,
            tonvault_ledger::MetadataPatch {
                settlement_ref: Some("0xcafe-corrected".into()),
                fee: None,
                comment: None,
            },
        )
        .unwrap();
    assert_eq!(patched.settlement_ref.as_deref(), Some("0xcafe-corrected"));
    assert_eq!(patched.status, TxStatus::Completed);

    assert!(vault
        .update_transaction_status(receipt.tx.id, TxStatus::Failed, None)
        .is_err());
}

// Purge refuses in-flight records and removes terminal ones.
#[tokio::test]
async fn purge_guards_pending_records() {
    let vault = vault_with_prices(&[]);
    let account = AccountId::new(9);
    deposit(&vault, account, Asset::Ton, dec!(10));

    let receipt = vault
        .create_withdrawal(WithdrawalRequest {
            account,
            asset: Asset::Ton,
            gross: dec!(5),
            fee: dec!(0.1),
            destination: "EQAddr".to_string(),
            comment: None,
        })
        .unwrap();

    assert!(vault.purge_transaction(receipt.tx.id).is_err());

    vault
        .update_transaction_status(receipt.tx.id, TxStatus::Completed, None)
        .unwrap();
    vault.purge_transaction(receipt.tx.id).unwrap();
    assert!(vault.get_transaction(receipt.tx.id).is_err());
}

// Settings validation holds at the service boundary.
#[tokio::test]
async fn settings_roundtrip_and_validation() {
    let vault = vault_with_prices(&[]);

    let mut settings = vault.get_settings();
    settings.fee_percent = dec!(2.5);
    settings.minimums.insert(Asset::Ton, dec!(1));
    vault.set_settings(settings).unwrap();
    assert_eq!(vault.get_settings().fee_percent, dec!(2.5));

    let mut bad = vault.get_settings();
    bad.fee_percent = dec!(100);
    assert!(vault.set_settings(bad).is_err());
    assert_eq!(vault.get_settings().fee_percent, dec!(2.5));
}
