//! Balance effects and the delta-based rebalance algorithm.
//!
//! Every transaction is reduced to a set of [`AccountEffect`]s: signed
//! deltas against account balances. Creating a transaction applies its
//! effects; deleting applies the reverse; editing applies the difference
//! between the old and new effect sets. Accumulating per account before
//! applying keeps edits that touch the same account in both the old and
//! new shape down to a single balance write.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::LedgerError;
use super::types::TransactionKind;

/// A signed balance change against a single account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountEffect {
    /// Account whose balance changes.
    pub account_id: Uuid,
    /// Signed delta in minor currency units.
    pub delta: i64,
}

impl AccountEffect {
    /// Creates an effect.
    #[must_use]
    pub const fn new(account_id: Uuid, delta: i64) -> Self {
        Self { account_id, delta }
    }
}

/// Computes the balance effects of a transaction.
///
/// Expenses subtract from the account, incomes add to it, transfers
/// subtract from the source and add to the destination.
///
/// # Errors
///
/// Returns `LedgerError::MissingTransferAccount` if a transfer has no
/// destination and `LedgerError::SameTransferAccount` if source and
/// destination coincide.
pub fn transaction_effects(
    kind: TransactionKind,
    amount: i64,
    account_id: Uuid,
    transfer_account_id: Option<Uuid>,
) -> Result<Vec<AccountEffect>, LedgerError> {
    match kind {
        TransactionKind::Expense => Ok(vec![AccountEffect::new(account_id, -amount)]),
        TransactionKind::Income => Ok(vec![AccountEffect::new(account_id, amount)]),
        TransactionKind::Transfer => {
            let destination =
                transfer_account_id.ok_or(LedgerError::MissingTransferAccount)?;
            if destination == account_id {
                return Err(LedgerError::SameTransferAccount);
            }
            Ok(vec![
                AccountEffect::new(account_id, -amount),
                AccountEffect::new(destination, amount),
            ])
        }
    }
}

/// Accumulator of per-account deltas.
///
/// Keyed by account id in a `BTreeMap` so the resulting patches come out
/// in a deterministic order. Callers that lock account rows in this order
/// cannot deadlock against each other.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeltaMap(BTreeMap<Uuid, i64>);

impl DeltaMap {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single delta for an account.
    pub fn add(&mut self, account_id: Uuid, delta: i64) {
        *self.0.entry(account_id).or_insert(0) += delta;
    }

    /// Accumulates all effects as-is.
    pub fn apply(&mut self, effects: &[AccountEffect]) {
        for effect in effects {
            self.add(effect.account_id, effect.delta);
        }
    }

    /// Accumulates all effects negated.
    pub fn reverse(&mut self, effects: &[AccountEffect]) {
        for effect in effects {
            self.add(effect.account_id, -effect.delta);
        }
    }

    /// Drains the accumulator into net per-account patches.
    ///
    /// Accounts whose deltas cancel out are omitted, so a no-op edit
    /// produces no balance writes at all.
    #[must_use]
    pub fn into_patches(self) -> Vec<AccountEffect> {
        self.0
            .into_iter()
            .filter(|&(_, delta)| delta != 0)
            .map(|(account_id, delta)| AccountEffect::new(account_id, delta))
            .collect()
    }
}

/// Computes the net balance patches for replacing one effect set with
/// another, as happens when a transaction is edited.
#[must_use]
pub fn rebalance(old: &[AccountEffect], new: &[AccountEffect]) -> Vec<AccountEffect> {
    let mut deltas = DeltaMap::new();
    deltas.reverse(old);
    deltas.apply(new);
    deltas.into_patches()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_expense_subtracts() {
        let acct = uuid(1);
        let effects =
            transaction_effects(TransactionKind::Expense, 2500, acct, None).expect("effects");
        assert_eq!(effects, vec![AccountEffect::new(acct, -2500)]);
    }

    #[test]
    fn test_income_adds() {
        let acct = uuid(1);
        let effects =
            transaction_effects(TransactionKind::Income, 900, acct, None).expect("effects");
        assert_eq!(effects, vec![AccountEffect::new(acct, 900)]);
    }

    #[test]
    fn test_transfer_is_symmetric() {
        let from = uuid(1);
        let to = uuid(2);
        let effects = transaction_effects(TransactionKind::Transfer, 5000, from, Some(to))
            .expect("effects");
        assert_eq!(
            effects,
            vec![AccountEffect::new(from, -5000), AccountEffect::new(to, 5000)]
        );
        let total: i64 = effects.iter().map(|e| e.delta).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_transfer_to_self_rejected() {
        let acct = uuid(1);
        assert_eq!(
            transaction_effects(TransactionKind::Transfer, 100, acct, Some(acct)),
            Err(LedgerError::SameTransferAccount)
        );
    }

    #[test]
    fn test_transfer_without_destination_rejected() {
        assert_eq!(
            transaction_effects(TransactionKind::Transfer, 100, uuid(1), None),
            Err(LedgerError::MissingTransferAccount)
        );
    }

    #[test]
    fn test_rebalance_noop_produces_no_patches() {
        let effects =
            transaction_effects(TransactionKind::Expense, 1000, uuid(1), None).expect("effects");
        assert!(rebalance(&effects, &effects).is_empty());
    }

    #[test]
    fn test_rebalance_amount_change() {
        let acct = uuid(1);
        let old =
            transaction_effects(TransactionKind::Expense, 1000, acct, None).expect("effects");
        let new =
            transaction_effects(TransactionKind::Expense, 1500, acct, None).expect("effects");
        // Expense grows by 500, so the account loses another 500.
        assert_eq!(rebalance(&old, &new), vec![AccountEffect::new(acct, -500)]);
    }

    #[test]
    fn test_rebalance_account_change_moves_full_amount() {
        let a = uuid(1);
        let b = uuid(2);
        let old = transaction_effects(TransactionKind::Expense, 1000, a, None).expect("effects");
        let new = transaction_effects(TransactionKind::Expense, 1000, b, None).expect("effects");
        assert_eq!(
            rebalance(&old, &new),
            vec![AccountEffect::new(a, 1000), AccountEffect::new(b, -1000)]
        );
    }

    #[test]
    fn test_rebalance_transfer_destination_change() {
        let from = uuid(1);
        let old_to = uuid(2);
        let new_to = uuid(3);
        let old = transaction_effects(TransactionKind::Transfer, 700, from, Some(old_to))
            .expect("effects");
        let new = transaction_effects(TransactionKind::Transfer, 700, from, Some(new_to))
            .expect("effects");
        // The source is untouched: only the destinations move.
        assert_eq!(
            rebalance(&old, &new),
            vec![
                AccountEffect::new(old_to, -700),
                AccountEffect::new(new_to, 700)
            ]
        );
    }

    #[test]
    fn test_rebalance_kind_and_account_overlap() {
        let a = uuid(1);
        let b = uuid(2);
        // Expense of 300 on A becomes a transfer of 300 from A to B.
        let old = transaction_effects(TransactionKind::Expense, 300, a, None).expect("effects");
        let new =
            transaction_effects(TransactionKind::Transfer, 300, a, Some(b)).expect("effects");
        // A's -300 cancels; only B gains.
        assert_eq!(rebalance(&old, &new), vec![AccountEffect::new(b, 300)]);
    }

    #[test]
    fn test_patches_come_out_in_account_order() {
        let mut deltas = DeltaMap::new();
        deltas.add(uuid(9), 1);
        deltas.add(uuid(3), 2);
        deltas.add(uuid(6), 3);
        let patches = deltas.into_patches();
        let ids: Vec<Uuid> = patches.iter().map(|p| p.account_id).collect();
        assert_eq!(ids, vec![uuid(3), uuid(6), uuid(9)]);
    }

    fn arb_kind() -> impl Strategy<Value = TransactionKind> {
        prop_oneof![
            Just(TransactionKind::Expense),
            Just(TransactionKind::Income),
            Just(TransactionKind::Transfer),
        ]
    }

    // Effects over a small pool of accounts, so edits overlap often.
    fn arb_effects() -> impl Strategy<Value = Vec<AccountEffect>> {
        (arb_kind(), 1_i64..1_000_000, 0_u128..4, 0_u128..4).prop_filter_map(
            "transfer to self",
            |(kind, amount, a, b)| {
                transaction_effects(kind, amount, uuid(a), Some(uuid(b))).ok()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_transfer_effects_always_net_zero(
            amount in 1_i64..1_000_000,
            a in 0_u128..8,
            b in 0_u128..8,
        ) {
            prop_assume!(a != b);
            let effects = transaction_effects(
                TransactionKind::Transfer, amount, uuid(a), Some(uuid(b)),
            ).unwrap();
            prop_assert_eq!(effects.iter().map(|e| e.delta).sum::<i64>(), 0);
        }

        #[test]
        fn prop_rebalance_equals_delete_then_recreate(
            old in arb_effects(),
            new in arb_effects(),
        ) {
            // Applying the rebalance patches must leave every account at
            // the same balance as reversing the old effects and applying
            // the new ones separately.
            let mut via_rebalance = DeltaMap::new();
            via_rebalance.apply(&rebalance(&old, &new));

            let mut via_two_steps = DeltaMap::new();
            via_two_steps.reverse(&old);
            via_two_steps.apply(&new);

            prop_assert_eq!(
                via_rebalance.into_patches(),
                via_two_steps.into_patches()
            );
        }

        #[test]
        fn prop_create_then_delete_is_identity(effects in arb_effects()) {
            let mut deltas = DeltaMap::new();
            deltas.apply(&effects);
            deltas.reverse(&effects);
            prop_assert!(deltas.into_patches().is_empty());
        }

        #[test]
        fn prop_edit_chain_ends_at_final_shape(
            chain in proptest::collection::vec(arb_effects(), 1..8),
        ) {
            // A transaction edited through a chain of shapes ends with the
            // balance impact of its final shape alone.
            let mut balances = DeltaMap::new();
            balances.apply(&chain[0]);
            for window in chain.windows(2) {
                balances.apply(&rebalance(&window[0], &window[1]));
            }

            let mut expected = DeltaMap::new();
            expected.apply(chain.last().unwrap());

            prop_assert_eq!(balances.into_patches(), expected.into_patches());
        }
    }
}
