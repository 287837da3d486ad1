//! Integration tests for the transaction repository.
//!
//! These exercise the full begin/lock/patch/commit path against a real
//! database: balance round trips, delta-based rebalancing on edits, and
//! the per-kind field gating.

mod common;

use uuid::Uuid;

use cashbook_core::ledger::{EntityStatus, LedgerError as DomainError, TransactionKind};
use cashbook_core::validation::ValidationError;
use cashbook_db::TransactionRepository;
use cashbook_db::repositories::account::UpdateAccountInput;
use cashbook_db::repositories::transaction::{
    TransactionError, TransactionFilter, TransactionPatch,
};
use cashbook_db::{AccountRepository, repositories::account::CreateAccountInput};

use common::{OCCURRED_AT, balance_of, setup_ledger, try_connect};

#[tokio::test]
async fn test_expense_round_trip_restores_balance() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let row = repo
        .create_expense(
            data.ledger_id,
            data.cash_account_id,
            data.expense_category_id,
            2_500,
            OCCURRED_AT,
            Some("groceries"),
        )
        .await
        .expect("create expense");

    assert_eq!(balance_of(&db, data.cash_account_id).await, 97_500);

    repo.remove(data.ledger_id, row.id).await.expect("delete");

    assert_eq!(balance_of(&db, data.cash_account_id).await, 100_000);
}

#[tokio::test]
async fn test_transfer_moves_both_balances_and_reverses() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let row = repo
        .create_transfer(
            data.ledger_id,
            data.cash_account_id,
            data.bank_account_id,
            40_000,
            OCCURRED_AT,
            None,
        )
        .await
        .expect("create transfer");

    assert_eq!(balance_of(&db, data.cash_account_id).await, 60_000);
    assert_eq!(balance_of(&db, data.bank_account_id).await, 140_000);

    repo.remove(data.ledger_id, row.id).await.expect("delete");

    assert_eq!(balance_of(&db, data.cash_account_id).await, 100_000);
    assert_eq!(balance_of(&db, data.bank_account_id).await, 100_000);
}

#[tokio::test]
async fn test_update_amount_applies_only_the_delta() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let row = repo
        .create_expense(
            data.ledger_id,
            data.cash_account_id,
            data.expense_category_id,
            1_000,
            OCCURRED_AT,
            None,
        )
        .await
        .expect("create expense");
    assert_eq!(balance_of(&db, data.cash_account_id).await, 99_000);

    let updated = repo
        .update(
            data.ledger_id,
            row.id,
            TransactionPatch {
                amount: Some(1_500),
                ..TransactionPatch::default()
            },
        )
        .await
        .expect("update amount");

    assert_eq!(updated.amount, 1_500);
    assert_eq!(balance_of(&db, data.cash_account_id).await, 98_500);
}

#[tokio::test]
async fn test_update_account_change_moves_full_amount() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let row = repo
        .create_expense(
            data.ledger_id,
            data.cash_account_id,
            data.expense_category_id,
            1_000,
            OCCURRED_AT,
            None,
        )
        .await
        .expect("create expense");

    repo.update(
        data.ledger_id,
        row.id,
        TransactionPatch {
            account_id: Some(data.bank_account_id),
            ..TransactionPatch::default()
        },
    )
    .await
    .expect("move to bank");

    assert_eq!(balance_of(&db, data.cash_account_id).await, 100_000);
    assert_eq!(balance_of(&db, data.bank_account_id).await, 99_000);
}

#[tokio::test]
async fn test_update_rejects_fields_foreign_to_kind() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let expense = repo
        .create_expense(
            data.ledger_id,
            data.cash_account_id,
            data.expense_category_id,
            1_000,
            OCCURRED_AT,
            None,
        )
        .await
        .expect("create expense");

    let result = repo
        .update(
            data.ledger_id,
            expense.id,
            TransactionPatch {
                transfer_account_id: Some(data.bank_account_id),
                ..TransactionPatch::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(TransactionError::FieldNotApplicable {
            field: "transfer_account_id"
        })
    ));

    let transfer = repo
        .create_transfer(
            data.ledger_id,
            data.cash_account_id,
            data.bank_account_id,
            500,
            OCCURRED_AT,
            None,
        )
        .await
        .expect("create transfer");

    let result = repo
        .update(
            data.ledger_id,
            transfer.id,
            TransactionPatch {
                category_id: Some(data.expense_category_id),
                ..TransactionPatch::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(TransactionError::Domain(
            DomainError::TransferCannotHaveCategory
        ))
    ));
}

#[tokio::test]
async fn test_note_patch_and_clear() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let row = repo
        .create_expense(
            data.ledger_id,
            data.cash_account_id,
            data.expense_category_id,
            1_000,
            OCCURRED_AT,
            Some("lunch"),
        )
        .await
        .expect("create expense");
    assert_eq!(row.note.as_deref(), Some("lunch"));

    let cleared = repo
        .update(
            data.ledger_id,
            row.id,
            TransactionPatch {
                clear_note: true,
                ..TransactionPatch::default()
            },
        )
        .await
        .expect("clear note");
    assert_eq!(cleared.note, None);

    let renamed = repo
        .update(
            data.ledger_id,
            row.id,
            TransactionPatch {
                note: Some("team lunch".to_string()),
                ..TransactionPatch::default()
            },
        )
        .await
        .expect("set note");
    assert_eq!(renamed.note.as_deref(), Some("team lunch"));

    let result = repo
        .update(
            data.ledger_id,
            row.id,
            TransactionPatch {
                note: Some("x".to_string()),
                clear_note: true,
                ..TransactionPatch::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(TransactionError::Validation(ValidationError::NoteConflict))
    ));
}

#[tokio::test]
async fn test_update_only_newly_introduced_accounts_must_be_active() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());
    let account_repo = AccountRepository::new(db.clone());

    let row = repo
        .create_expense(
            data.ledger_id,
            data.cash_account_id,
            data.expense_category_id,
            1_000,
            OCCURRED_AT,
            None,
        )
        .await
        .expect("create expense");

    // Deactivating the account must not freeze its existing history.
    account_repo
        .update(
            data.ledger_id,
            data.cash_account_id,
            UpdateAccountInput {
                status: Some(EntityStatus::Inactive),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .expect("deactivate cash");

    repo.update(
        data.ledger_id,
        row.id,
        TransactionPatch {
            amount: Some(2_000),
            ..TransactionPatch::default()
        },
    )
    .await
    .expect("amount edit on inactive account still works");
    assert_eq!(balance_of(&db, data.cash_account_id).await, 98_000);

    // Moving the transaction onto an inactive account is rejected.
    let frozen = account_repo
        .create(CreateAccountInput {
            ledger_id: data.ledger_id,
            name: "Frozen".to_string(),
            kind: cashbook_core::ledger::AccountKind::Wallet,
            initial_balance: 0,
        })
        .await
        .expect("create wallet");
    account_repo
        .update(
            data.ledger_id,
            frozen.id,
            UpdateAccountInput {
                status: Some(EntityStatus::Inactive),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .expect("deactivate wallet");

    let result = repo
        .update(
            data.ledger_id,
            row.id,
            TransactionPatch {
                account_id: Some(frozen.id),
                ..TransactionPatch::default()
            },
        )
        .await;
    match result {
        Err(TransactionError::Domain(DomainError::AccountInactive(id))) => {
            assert_eq!(id, frozen.id);
        }
        other => panic!("expected AccountInactive, got {other:?}"),
    }
    // The rejected edit must not have leaked a balance change.
    assert_eq!(balance_of(&db, data.cash_account_id).await, 98_000);
    assert_eq!(balance_of(&db, frozen.id).await, 0);
}

#[tokio::test]
async fn test_create_rejects_category_kind_mismatch() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let result = repo
        .create_expense(
            data.ledger_id,
            data.cash_account_id,
            data.income_category_id,
            1_000,
            OCCURRED_AT,
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(TransactionError::Domain(
            DomainError::CategoryKindMismatch { .. }
        ))
    ));
    assert_eq!(balance_of(&db, data.cash_account_id).await, 100_000);
}

#[tokio::test]
async fn test_mutations_on_missing_transaction_return_not_found() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let missing = Uuid::new_v4();

    let result = repo
        .update(data.ledger_id, missing, TransactionPatch::default())
        .await;
    assert!(matches!(result, Err(TransactionError::NotFound(id)) if id == missing));

    let result = repo.remove(data.ledger_id, missing).await;
    assert!(matches!(result, Err(TransactionError::NotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_listing_matches_account_in_either_role() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = TransactionRepository::new(db.clone());

    repo.create_expense(
        data.ledger_id,
        data.cash_account_id,
        data.expense_category_id,
        1_000,
        OCCURRED_AT,
        Some("coffee beans"),
    )
    .await
    .expect("expense");
    repo.create_transfer(
        data.ledger_id,
        data.cash_account_id,
        data.bank_account_id,
        5_000,
        OCCURRED_AT + 1,
        None,
    )
    .await
    .expect("transfer");

    // The bank account only ever appears as a transfer destination.
    let rows = repo
        .list(
            data.ledger_id,
            TransactionFilter {
                account_id: Some(data.bank_account_id),
                ..TransactionFilter::default()
            },
        )
        .await
        .expect("list by account");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].transfer_account_id, Some(data.bank_account_id));

    let rows = repo
        .list(
            data.ledger_id,
            TransactionFilter {
                kind: Some(TransactionKind::Expense),
                note_contains: Some("COFFEE".to_string()),
                ..TransactionFilter::default()
            },
        )
        .await
        .expect("list by kind and note");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, 1_000);
}
