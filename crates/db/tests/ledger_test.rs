//! Integration tests for ledger bootstrap and account adjustments.

mod common;

use uuid::Uuid;

use cashbook_core::ledger::CategoryKind;
use cashbook_db::repositories::account::AccountError;
use cashbook_db::{AccountRepository, CategoryRepository, LedgerRepository};

use common::{setup_ledger, try_connect};

#[tokio::test]
async fn test_ensure_default_is_idempotent_and_flagged() {
    let Some(db) = try_connect().await else { return };
    let repo = LedgerRepository::new(db.clone());
    let user_id = Uuid::new_v4();

    let first = repo.ensure_default(user_id).await.expect("first call");
    assert!(first.is_default);
    assert_eq!(first.owner_user_id, user_id);

    let second = repo.ensure_default(user_id).await.expect("second call");
    assert_eq!(second.id, first.id, "must resolve to the same ledger");
}

#[tokio::test]
async fn test_default_ledger_seeds_system_categories() {
    let Some(db) = try_connect().await else { return };
    let ledger = LedgerRepository::new(db.clone())
        .ensure_default(Uuid::new_v4())
        .await
        .expect("default ledger");

    let repo = CategoryRepository::new(db.clone());
    let expense = repo
        .list(ledger.id, Some(CategoryKind::Expense), None)
        .await
        .expect("expense categories");
    let income = repo
        .list(ledger.id, Some(CategoryKind::Income), None)
        .await
        .expect("income categories");

    assert_eq!(expense.len(), 5);
    assert_eq!(income.len(), 4);
    assert!(expense.iter().chain(&income).all(|c| c.is_system));
}

#[tokio::test]
async fn test_adjustment_audit_records_before_and_after() {
    let Some(db) = try_connect().await else { return };
    let data = setup_ledger(&db).await;
    let repo = AccountRepository::new(db.clone());

    let account = repo
        .adjust_balance(
            data.ledger_id,
            data.cash_account_id,
            data.user_id,
            -7_500,
            Some("bank statement reconciliation"),
        )
        .await
        .expect("adjust");
    assert_eq!(account.current_balance, 92_500);

    let rows = repo
        .list_adjustments(data.ledger_id, Some(data.cash_account_id), None)
        .await
        .expect("list adjustments");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].delta, -7_500);
    assert_eq!(rows[0].balance_before, 100_000);
    assert_eq!(rows[0].balance_after, 92_500);
    assert_eq!(rows[0].actor_user_id, data.user_id);
}

#[tokio::test]
async fn test_adjustment_listing_rejects_foreign_account_filter() {
    let Some(db) = try_connect().await else { return };
    let mine = setup_ledger(&db).await;
    let theirs = setup_ledger(&db).await;
    let repo = AccountRepository::new(db.clone());

    let result = repo
        .list_adjustments(mine.ledger_id, Some(theirs.cash_account_id), None)
        .await;
    assert!(matches!(result, Err(AccountError::NotInLedger)));

    let missing = Uuid::new_v4();
    let result = repo.list_adjustments(mine.ledger_id, Some(missing), None).await;
    assert!(matches!(result, Err(AccountError::NotFound(id)) if id == missing));
}
