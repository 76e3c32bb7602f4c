//! Payment ledger reducer
//!
//! Folds a student's transactions over a [`FeeSet`]. The result is fully
//! derived: recomputing from the same inputs always yields the same ledger.

use std::cmp::Ordering;

use shared::models::{
    Amount, FeeSet, Ledger, LedgerEntry, PaymentTransaction, UnallocatedPool,
};

use super::FeeError;
use super::status::classify;

/// Reduce `transactions` against `fee_set`
///
/// - Unverified transactions are listed for audit and excluded from totals.
/// - Targeted transactions count toward their component; a target outside the
///   fee set makes the transaction `detached` credit.
/// - Untargeted transactions form a pool applied earliest-due-first (undated
///   components last, ties in fee-set order), capped at what each item still owes.
pub fn reduce(
    fee_set: &FeeSet,
    transactions: &[PaymentTransaction],
) -> Result<Ledger, FeeError> {
    let mut direct = vec![Amount::ZERO; fee_set.components.len()];
    let mut received = Amount::ZERO;
    let mut detached = Vec::new();
    let mut unverified = Vec::new();

    for tx in transactions {
        if !tx.verified {
            unverified.push(tx.clone());
            continue;
        }
        match tx.fee_component_ref {
            None => received += tx.amount,
            Some(target) => match fee_set.components.iter().position(|c| c.id == target) {
                Some(idx) => direct[idx] += tx.amount,
                None => detached.push(tx.clone()),
            },
        }
    }

    if received.is_negative() {
        return Err(FeeError::NegativeUnallocated(received));
    }

    let mut allocated = vec![Amount::ZERO; fee_set.components.len()];
    let mut remaining = received;
    for idx in allocation_order(fee_set) {
        if !remaining.is_positive() {
            break;
        }
        let owed = (fee_set.components[idx].amount - direct[idx]).clamp_non_negative();
        let take = owed.min(remaining);
        allocated[idx] = take;
        remaining -= take;
    }

    let entries = fee_set
        .components
        .iter()
        .enumerate()
        .map(|(idx, component)| {
            let paid = direct[idx] + allocated[idx];
            LedgerEntry {
                component_id: component.id,
                label: component.label.clone(),
                amount: component.amount,
                due_date: component.due_date,
                paid_direct: direct[idx],
                paid_allocated: allocated[idx],
                paid,
                pending: (component.amount - paid).clamp_non_negative(),
                overpaid: (paid - component.amount).clamp_non_negative(),
                status: classify(paid, component.amount),
            }
        })
        .collect();

    Ok(Ledger {
        entries,
        unallocated: UnallocatedPool {
            received,
            applied: received - remaining,
            remaining,
        },
        detached,
        unverified,
    })
}

/// Component indices, earliest due date first
fn allocation_order(fee_set: &FeeSet) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fee_set.components.len()).collect();
    order.sort_by(|&a, &b| {
        let (da, db) = (
            fee_set.components[a].due_date,
            fee_set.components[b].due_date,
        );
        match (da, db) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then(a.cmp(&b))
    });
    order
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::models::{FeeScope, FeeSource, FeeStatus};

    use crate::fees::aggregate::tests::component;

    pub(crate) fn tx(id: i64, target: Option<i64>, amount: i64, verified: bool) -> PaymentTransaction {
        PaymentTransaction {
            id,
            student_id: 7,
            fee_component_ref: target,
            amount: Amount::from_minor(amount),
            method: "online".to_string(),
            reference_no: format!("ref-{id}"),
            order_id: None,
            payment_id: None,
            note: None,
            verified,
            timestamp: id,
        }
    }

    pub(crate) fn fee_set(amounts: &[(i64, i64, Option<NaiveDate>)]) -> FeeSet {
        let mut set = FeeSet::empty(7, 10, "A");
        for &(id, amount, due) in amounts {
            let mut c = component(id, FeeSource::AdHocFeeRecord, "Fee", amount, FeeScope::student(10, 7));
            c.due_date = due;
            set.total_amount += c.amount;
            set.components.push(c);
        }
        set
    }

    fn date(m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, m, d)
    }

    #[test]
    fn partial_payment_leaves_pending() {
        let set = fee_set(&[(1, 5000, None)]);
        let ledger = reduce(&set, &[tx(1, None, 2000, true)]).unwrap();
        let entry = &ledger.entries[0];
        assert_eq!(entry.status, FeeStatus::Partial);
        assert_eq!(entry.pending, Amount::from_minor(3000));
        assert_eq!(entry.paid, Amount::from_minor(2000));
    }

    #[test]
    fn overpayment_is_kept_exact() {
        let set = fee_set(&[(1, 5000, None)]);
        let ledger = reduce(&set, &[tx(1, Some(1), 5000, true), tx(2, Some(1), 500, true)]).unwrap();
        let entry = &ledger.entries[0];
        assert_eq!(entry.status, FeeStatus::Paid);
        assert_eq!(entry.pending, Amount::ZERO);
        assert_eq!(entry.overpaid, Amount::from_minor(500));
    }

    #[test]
    fn untargeted_overpayment_stays_in_the_pool() {
        let set = fee_set(&[(1, 5000, None)]);
        let ledger = reduce(&set, &[tx(1, None, 5000, true), tx(2, None, 500, true)]).unwrap();
        assert_eq!(ledger.entries[0].status, FeeStatus::Paid);
        assert_eq!(ledger.entries[0].pending, Amount::ZERO);
        assert_eq!(
            ledger.unallocated,
            UnallocatedPool {
                received: Amount::from_minor(5500),
                applied: Amount::from_minor(5000),
                remaining: Amount::from_minor(500),
            }
        );
    }

    #[test]
    fn unverified_transactions_never_count() {
        let set = fee_set(&[(1, 5000, None)]);
        let ledger = reduce(&set, &[tx(1, Some(1), 5000, false), tx(2, None, 100, false)]).unwrap();
        assert_eq!(ledger.entries[0].paid, Amount::ZERO);
        assert_eq!(ledger.entries[0].status, FeeStatus::Pending);
        assert_eq!(ledger.unverified.len(), 2);
        assert_eq!(ledger.unallocated.received, Amount::ZERO);
    }

    #[test]
    fn pool_is_applied_earliest_due_first() {
        let set = fee_set(&[
            (1, 1000, None),
            (2, 1000, date(10, 1)),
            (3, 1000, date(7, 1)),
        ]);
        let ledger = reduce(&set, &[tx(1, Some(3), 400, true), tx(2, None, 1500, true)]).unwrap();
        let allocated: Vec<i64> = ledger.entries.iter().map(|e| e.paid_allocated.minor()).collect();
        // component 3 owes 600 and is due first, then component 2
        assert_eq!(allocated, vec![0, 900, 600]);
        assert_eq!(ledger.unallocated.remaining, Amount::ZERO);
    }

    #[test]
    fn payments_against_components_outside_the_set_are_detached() {
        let set = fee_set(&[(1, 1000, None)]);
        let ledger = reduce(&set, &[tx(1, Some(99), 300, true)]).unwrap();
        assert_eq!(ledger.detached.len(), 1);
        assert_eq!(ledger.entries[0].paid, Amount::ZERO);
    }

    #[test]
    fn negative_pool_is_an_invariant_violation() {
        let set = fee_set(&[(1, 1000, None)]);
        let err = reduce(&set, &[tx(1, None, -50, true)]).unwrap_err();
        assert_eq!(err, FeeError::NegativeUnallocated(Amount::from_minor(-50)));
    }

    #[test]
    fn ledger_invariant_holds_for_every_entry() {
        let set = fee_set(&[(1, 3000, date(4, 1)), (2, 0, None), (3, 2500, date(5, 1))]);
        for paid in [0, 1, 2999, 3000, 3001, 9000] {
            for pool in [0, 1, 2500, 7000] {
                let ledger = reduce(
                    &set,
                    &[tx(1, Some(1), paid, true), tx(2, None, pool, true), tx(3, Some(3), -100, true)],
                )
                .unwrap();
                for e in &ledger.entries {
                    if e.paid <= e.amount {
                        assert_eq!(e.paid + e.pending, e.amount);
                        assert_eq!(e.overpaid, Amount::ZERO);
                    } else {
                        assert_eq!(e.pending, Amount::ZERO);
                        assert_eq!(e.paid - e.overpaid, e.amount);
                    }
                }
                let pool = ledger.unallocated;
                assert_eq!(pool.applied + pool.remaining, pool.received);
            }
        }
    }

    #[test]
    fn reduction_is_reproducible() {
        let set = fee_set(&[(1, 3000, date(4, 1)), (2, 2000, None)]);
        let txs = [tx(1, None, 3500, true), tx(2, Some(2), 100, true)];
        assert_eq!(reduce(&set, &txs).unwrap(), reduce(&set, &txs).unwrap());
    }
}
