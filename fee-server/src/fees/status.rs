//! Status classifier
//!
//! Status is re-derived on every computation, never stored.

use shared::models::{Amount, FeeSet, FeeStatus, Ledger, LedgerSummary, QuarterEntry};

/// Item-level status. A zero-amount item is paid.
pub fn classify(paid: Amount, amount: Amount) -> FeeStatus {
    if paid >= amount {
        FeeStatus::Paid
    } else if !paid.is_positive() {
        FeeStatus::Pending
    } else {
        FeeStatus::Partial
    }
}

/// Group status: `Paid`/`Pending` only by unanimity, otherwise `Partial`
///
/// `Unknown` members carry no information and are skipped; a group with no
/// known member is `Unknown`.
pub fn roll_up(statuses: impl IntoIterator<Item = FeeStatus>) -> FeeStatus {
    let mut seen: Option<FeeStatus> = None;
    for status in statuses {
        match (status, seen) {
            (FeeStatus::Unknown, _) => {}
            (s, None) => seen = Some(s),
            (s, Some(prev)) if s == prev => {}
            _ => return FeeStatus::Partial,
        }
    }
    seen.unwrap_or(FeeStatus::Unknown)
}

/// Student-level totals over a reduced ledger
///
/// Pool remainder and detached credit count toward `paid` and `overpaid`,
/// never toward an item, so `paid + pending - overpaid == total_amount` holds.
pub fn summarize(fee_set: &FeeSet, ledger: &Ledger) -> LedgerSummary {
    let extra: Amount = ledger.unallocated.remaining
        + ledger.detached.iter().map(|tx| tx.amount).sum::<Amount>();

    let paid: Amount = ledger.entries.iter().map(|e| e.paid).sum::<Amount>() + extra;
    let pending: Amount =
        ledger.entries.iter().map(|e| e.pending).sum::<Amount>() + (-extra).clamp_non_negative();
    let overpaid: Amount =
        ledger.entries.iter().map(|e| e.overpaid).sum::<Amount>() + extra.clamp_non_negative();

    LedgerSummary {
        total_amount: fee_set.total_amount,
        paid,
        pending,
        overpaid,
        status: roll_up(ledger.entries.iter().map(|e| e.status)),
    }
}

/// Per-quarter view over components that define a split
///
/// Each component's paid amount, clamped to `[0, amount]`, fills its
/// installments Q1 to Q4 in order. A quarter with no contributing component
/// is `Unknown`.
pub fn quarter_breakdown(fee_set: &FeeSet, ledger: &Ledger) -> [QuarterEntry; 4] {
    let mut amounts = [Amount::ZERO; 4];
    let mut paid = [Amount::ZERO; 4];
    let mut statuses: [Vec<FeeStatus>; 4] = Default::default();

    for (component, entry) in fee_set.components.iter().zip(&ledger.entries) {
        let Some(split) = component.quarter_split else {
            continue;
        };
        let mut left = entry.paid.clamp_non_negative().min(component.amount);
        for (q, installment) in split.to_array().into_iter().enumerate() {
            let covered = left.min(installment);
            left -= covered;
            amounts[q] += installment;
            paid[q] += covered;
            statuses[q].push(classify(covered, installment));
        }
    }

    std::array::from_fn(|q| QuarterEntry {
        quarter: q as u8 + 1,
        amount: amounts[q],
        paid: paid[q],
        pending: amounts[q] - paid[q],
        status: roll_up(statuses[q].iter().copied()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::SplitPolicy;

    use crate::fees::ledger::reduce;
    use crate::fees::ledger::tests::{fee_set, tx};
    use crate::fees::quarter;

    fn a(v: i64) -> Amount {
        Amount::from_minor(v)
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(a(0), a(100)), FeeStatus::Pending);
        assert_eq!(classify(a(-10), a(100)), FeeStatus::Pending);
        assert_eq!(classify(a(1), a(100)), FeeStatus::Partial);
        assert_eq!(classify(a(99), a(100)), FeeStatus::Partial);
        assert_eq!(classify(a(100), a(100)), FeeStatus::Paid);
        assert_eq!(classify(a(150), a(100)), FeeStatus::Paid);
        assert_eq!(classify(a(0), a(0)), FeeStatus::Paid);
    }

    #[test]
    fn roll_up_requires_unanimity_for_extremes() {
        use FeeStatus::*;
        let all = [Paid, Partial, Pending];
        // every combination of up to three members
        for x in all {
            for y in all {
                for z in all {
                    let group = [x, y, z];
                    let result = roll_up(group);
                    assert_eq!(result == Paid, group.iter().all(|s| *s == Paid));
                    assert_eq!(result == Pending, group.iter().all(|s| *s == Pending));
                    if result != Paid && result != Pending {
                        assert_eq!(result, Partial);
                    }
                }
            }
        }
    }

    #[test]
    fn roll_up_skips_unknown_members() {
        use FeeStatus::*;
        assert_eq!(roll_up(Vec::new()), Unknown);
        assert_eq!(roll_up([Unknown, Unknown]), Unknown);
        assert_eq!(roll_up([Paid, Unknown]), Paid);
        assert_eq!(roll_up([Pending, Unknown, Pending]), Pending);
        assert_eq!(roll_up([Pending, Unknown, Paid]), Partial);
    }

    #[test]
    fn summary_balances_with_pool_overpayment() {
        let set = fee_set(&[(1, 5000, None)]);
        let ledger = reduce(&set, &[tx(1, None, 5000, true), tx(2, None, 500, true)]).unwrap();
        let summary = summarize(&set, &ledger);
        assert_eq!(summary.status, FeeStatus::Paid);
        assert_eq!(summary.overpaid, a(500));
        assert_eq!(summary.pending, a(0));
        assert_eq!(summary.paid, a(5500));
        assert_eq!(summary.paid + summary.pending - summary.overpaid, summary.total_amount);
    }

    #[test]
    fn summary_balances_with_detached_credit() {
        let set = fee_set(&[(1, 1000, None), (2, 1000, None)]);
        for detached in [-300, 0, 300] {
            let ledger = reduce(
                &set,
                &[tx(1, Some(1), 400, true), tx(2, Some(42), detached, true)],
            )
            .unwrap();
            let s = summarize(&set, &ledger);
            assert_eq!(s.paid + s.pending - s.overpaid, s.total_amount);
            assert_eq!(s.status, FeeStatus::Partial);
        }
    }

    #[test]
    fn empty_fee_set_is_unknown() {
        let set = fee_set(&[]);
        let ledger = reduce(&set, &[]).unwrap();
        let summary = summarize(&set, &ledger);
        assert_eq!(summary.status, FeeStatus::Unknown);
        assert_eq!(summary.total_amount, Amount::ZERO);
    }

    #[test]
    fn quarters_fill_in_order() {
        let mut set = fee_set(&[(1, 12000, None), (2, 500, None)]);
        set.components[0].quarter_split =
            Some(quarter::split(a(12000), SplitPolicy::Equal, None).unwrap());
        let ledger = reduce(&set, &[tx(1, Some(1), 4500, true), tx(2, Some(2), 500, true)]).unwrap();
        let quarters = quarter_breakdown(&set, &ledger);

        let statuses: Vec<FeeStatus> = quarters.iter().map(|q| q.status).collect();
        assert_eq!(
            statuses,
            vec![FeeStatus::Paid, FeeStatus::Partial, FeeStatus::Pending, FeeStatus::Pending]
        );
        assert_eq!(quarters[1].paid, a(1500));
        assert_eq!(quarters[1].pending, a(1500));
        // component 2 has no split and is not laid over any quarter
        let total: Amount = quarters.iter().map(|q| q.amount).sum();
        assert_eq!(total, a(12000));
    }

    #[test]
    fn quarters_without_any_split_are_unknown() {
        let set = fee_set(&[(1, 800, None)]);
        let ledger = reduce(&set, &[]).unwrap();
        let quarters = quarter_breakdown(&set, &ledger);
        assert!(quarters.iter().all(|q| q.status == FeeStatus::Unknown));
        assert_eq!(quarters[3].quarter, 4);
    }
}
