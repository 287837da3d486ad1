//! Initial schema: ledgers, accounts, categories, transactions,
//! balance adjustments.
//!
//! Money columns are BIGINT minor units; timestamp columns are BIGINT
//! milliseconds since epoch. Balance writes happen inside transactions
//! that lock the account rows, so no triggers maintain balances here.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(LEDGERS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(BALANCE_ADJUSTMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE transaction_kind AS ENUM ('expense', 'income', 'transfer');
CREATE TYPE account_kind AS ENUM ('cash', 'bank', 'credit', 'wallet');
CREATE TYPE category_kind AS ENUM ('expense', 'income');
CREATE TYPE entity_status AS ENUM ('active', 'inactive');
";

const LEDGERS_SQL: &str = r"
-- One ledger per budget scope, owned by exactly one user
CREATE TABLE ledgers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_user_id UUID NOT NULL,
    name VARCHAR(120) NOT NULL,
    is_default BOOLEAN NOT NULL DEFAULT FALSE,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);

-- Index for a user's ledger listing
CREATE INDEX idx_ledgers_owner ON ledgers(owner_user_id, created_at);

-- At most one default ledger per user
CREATE UNIQUE INDEX uq_ledgers_default ON ledgers(owner_user_id) WHERE is_default;
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ledger_id UUID NOT NULL REFERENCES ledgers(id) ON DELETE CASCADE,
    name VARCHAR(120) NOT NULL,
    kind account_kind NOT NULL,
    status entity_status NOT NULL DEFAULT 'active',
    initial_balance BIGINT NOT NULL DEFAULT 0,
    current_balance BIGINT NOT NULL DEFAULT 0,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);

CREATE INDEX idx_accounts_ledger ON accounts(ledger_id, created_at);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ledger_id UUID NOT NULL REFERENCES ledgers(id) ON DELETE CASCADE,
    name VARCHAR(120) NOT NULL,
    kind category_kind NOT NULL,
    status entity_status NOT NULL DEFAULT 'active',
    is_system BOOLEAN NOT NULL DEFAULT FALSE,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);

CREATE INDEX idx_categories_ledger ON categories(ledger_id, kind);

-- Case-insensitive uniqueness per ledger and kind
CREATE UNIQUE INDEX uq_categories_name ON categories(ledger_id, kind, lower(name));
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ledger_id UUID NOT NULL REFERENCES ledgers(id) ON DELETE CASCADE,
    kind transaction_kind NOT NULL,
    amount BIGINT NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    transfer_account_id UUID REFERENCES accounts(id),
    category_id UUID REFERENCES categories(id),
    note TEXT,
    occurred_at BIGINT NOT NULL,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transfer_shape CHECK (
        (kind = 'transfer' AND transfer_account_id IS NOT NULL AND category_id IS NULL)
        OR (kind <> 'transfer' AND transfer_account_id IS NULL)
    ),
    CONSTRAINT chk_transfer_accounts_differ CHECK (
        transfer_account_id IS NULL OR transfer_account_id <> account_id
    )
);

-- Listing fallback: full ledger scan by time
CREATE INDEX idx_transactions_ledger_time ON transactions(ledger_id, occurred_at DESC);

-- Selective listing paths
CREATE INDEX idx_transactions_kind_time ON transactions(ledger_id, kind, occurred_at DESC);
CREATE INDEX idx_transactions_category_time ON transactions(ledger_id, category_id, occurred_at DESC);
";

const BALANCE_ADJUSTMENTS_SQL: &str = r"
-- Audit trail of manual balance corrections
CREATE TABLE balance_adjustments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ledger_id UUID NOT NULL REFERENCES ledgers(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    actor_user_id UUID NOT NULL,
    delta BIGINT NOT NULL,
    balance_before BIGINT NOT NULL,
    balance_after BIGINT NOT NULL,
    reason TEXT,
    created_at BIGINT NOT NULL,
    CONSTRAINT chk_delta_nonzero CHECK (delta <> 0),
    CONSTRAINT chk_balances_consistent CHECK (balance_after = balance_before + delta)
);

CREATE INDEX idx_adjustments_ledger ON balance_adjustments(ledger_id, created_at DESC);
CREATE INDEX idx_adjustments_account ON balance_adjustments(account_id, created_at DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS balance_adjustments CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS ledgers CASCADE;
DROP TYPE IF EXISTS entity_status;
DROP TYPE IF EXISTS category_kind;
DROP TYPE IF EXISTS account_kind;
DROP TYPE IF EXISTS transaction_kind;
";
