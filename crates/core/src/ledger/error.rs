//! Domain errors for ledger mutations.

use cashbook_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while assembling or rebalancing a transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Transfer source and destination are the same account.
    #[error("transfer source and destination accounts must differ")]
    SameTransferAccount,

    /// Transfer is missing its destination account.
    #[error("transfer requires a destination account")]
    MissingTransferAccount,

    /// Referenced account belongs to a different ledger.
    #[error("account does not belong to this ledger")]
    AccountNotInLedger,

    /// Referenced category belongs to a different ledger.
    #[error("category does not belong to this ledger")]
    CategoryNotInLedger,

    /// Referenced account has been deactivated.
    #[error("account {0} is inactive")]
    AccountInactive(Uuid),

    /// Referenced category has been deactivated.
    #[error("category {0} is inactive")]
    CategoryInactive(Uuid),

    /// Category kind does not match the transaction kind.
    #[error("category kind mismatch: expected {expected}, found {found}")]
    CategoryKindMismatch {
        /// Kind required by the transaction.
        expected: crate::ledger::CategoryKind,
        /// Kind of the supplied category.
        found: crate::ledger::CategoryKind,
    },

    /// Transfers never carry a category.
    #[error("transfers cannot have a category")]
    TransferCannotHaveCategory,
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SameTransferAccount => Self::InvalidArgument(err.to_string()),
            LedgerError::MissingTransferAccount => Self::Internal(err.to_string()),
            LedgerError::AccountNotInLedger
            | LedgerError::CategoryNotInLedger
            | LedgerError::AccountInactive(_)
            | LedgerError::CategoryInactive(_)
            | LedgerError::CategoryKindMismatch { .. }
            | LedgerError::TransferCannotHaveCategory => Self::Conflict(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_transfer_account_is_invalid_argument() {
        let err: AppError = LedgerError::SameTransferAccount.into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_cross_ledger_reference_is_conflict() {
        let err: AppError = LedgerError::AccountNotInLedger.into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "DOMAIN_CONFLICT");
    }

    #[test]
    fn test_inactive_account_carries_id() {
        let id = Uuid::new_v4();
        assert_eq!(
            LedgerError::AccountInactive(id).to_string(),
            format!("account {id} is inactive")
        );
    }
}
