//! Quarter splitter
//!
//! Divides an annual amount into four installments. Pure and deterministic:
//! identical inputs always produce identical splits, so a fee structure can be
//! re-derived after an edit and displayed reproducibly.

use shared::models::{Amount, AmountInput, QuarterSplit, SplitPolicy};

use super::FeeError;

/// Split `total` into Q1..Q4 under `policy`
///
/// - `Equal`: integer division by 4; the 0-3 minor-unit remainder goes to
///   Q1, Q2, Q3 in that order so the quarters always sum to `total`.
/// - `Custom`: `custom` is accepted as-is if it sums to `total`.
pub fn split(
    total: Amount,
    policy: SplitPolicy,
    custom: Option<[Amount; 4]>,
) -> Result<QuarterSplit, FeeError> {
    if total.is_negative() {
        return Err(FeeError::NegativeAmount {
            what: "annual amount",
            amount: total,
        });
    }

    match policy {
        SplitPolicy::Equal => Ok(split_equal(total)),
        SplitPolicy::Custom => {
            let quarters = custom.ok_or(FeeError::MissingCustomSplit)?;
            let split = QuarterSplit::from_array(quarters);
            validate(total, &split)?;
            Ok(split)
        }
    }
}

fn split_equal(total: Amount) -> QuarterSplit {
    let base = total.minor() / 4;
    let remainder = total.minor() % 4;
    let mut quarters = [Amount::from_minor(base); 4];
    for q in quarters.iter_mut().take(remainder as usize) {
        *q += Amount::from_minor(1);
    }
    QuarterSplit::from_array(quarters)
}

/// Check that every quarter is non-negative and the four sum exactly to `amount`
pub fn validate(amount: Amount, split: &QuarterSplit) -> Result<(), FeeError> {
    if let Some(negative) = split.to_array().into_iter().find(|q| q.is_negative()) {
        return Err(FeeError::NegativeAmount {
            what: "quarter installment",
            amount: negative,
        });
    }
    let sum = split.checked_total().ok_or(FeeError::SplitOverflow)?;
    if sum != amount {
        return Err(FeeError::SplitMismatch {
            total: amount,
            split: sum,
        });
    }
    Ok(())
}

/// Parse four boundary amounts (minor units or exact-decimal strings)
pub fn parse_inputs(inputs: Option<[AmountInput; 4]>) -> Result<Option<[Amount; 4]>, FeeError> {
    let Some([q1, q2, q3, q4]) = inputs else {
        return Ok(None);
    };
    Ok(Some([
        q1.into_amount()?,
        q2.into_amount()?,
        q3.into_amount()?,
        q4.into_amount()?,
    ]))
}

/// Interpret four independently nullable quarter fields from a stored record
///
/// All present is a split, all absent is "no split"; anything in between is
/// rejected rather than read as zeros.
pub fn from_fields(
    component_id: i64,
    fields: [Option<Amount>; 4],
) -> Result<Option<QuarterSplit>, FeeError> {
    match fields {
        [Some(q1), Some(q2), Some(q3), Some(q4)] => {
            Ok(Some(QuarterSplit::from_array([q1, q2, q3, q4])))
        }
        [None, None, None, None] => Ok(None),
        _ => Err(FeeError::IncompleteQuarterFields { component_id }),
    }
}
