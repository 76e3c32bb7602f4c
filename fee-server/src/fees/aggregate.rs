//! Fee aggregator
//!
//! Merges the four fee sources for one student into a normalized [`FeeSet`].
//! Deduplication is by source identity `(source, id)`, never by label: a
//! student may owe a standard "Tuition" and an ad-hoc "Tuition" at once.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use shared::models::{Amount, FeeComponent, FeeSet, FeeSource, QuarterSplit, StudentRef};

use super::{FeeError, quarter};
use crate::db::FeeComponentStore;
use crate::error::ServiceResult;

/// Raw components as fetched, one list per source
#[derive(Debug, Clone, Default)]
pub struct FeeSources {
    pub class_fees: Vec<FeeComponent>,
    pub section_extras: Vec<FeeComponent>,
    pub services: Vec<FeeComponent>,
    pub ad_hoc: Vec<FeeComponent>,
}

impl FeeSources {
    fn into_components(self) -> impl Iterator<Item = FeeComponent> {
        self.class_fees
            .into_iter()
            .chain(self.section_extras)
            .chain(self.services)
            .chain(self.ad_hoc)
    }
}

/// Fetch every source for `student` and merge them
pub async fn aggregate(
    store: &dyn FeeComponentStore,
    school_id: i64,
    student: &StudentRef,
    today: NaiveDate,
) -> ServiceResult<FeeSet> {
    let sources = FeeSources {
        class_fees: store.class_fees(school_id, student.class_id).await?,
        section_extras: store
            .section_extra_fees(school_id, student.class_id, &student.section)
            .await?,
        services: store
            .student_services(school_id, student.student_id)
            .await?,
        ad_hoc: store.ad_hoc_fees(school_id, student.student_id).await?,
    };
    tracing::debug!(
        school_id,
        student_id = student.student_id,
        class_fees = sources.class_fees.len(),
        section_extras = sources.section_extras.len(),
        services = sources.services.len(),
        ad_hoc = sources.ad_hoc.len(),
        "Aggregating fee sources"
    );
    Ok(merge(student, sources, today)?)
}

/// Merge already-fetched sources into a fee set
///
/// Totals are always recomputed from the merged list. Components outside the
/// student's scope are dropped; inactive components and services outside their
/// validity window go to `historical`.
pub fn merge(
    student: &StudentRef,
    sources: FeeSources,
    today: NaiveDate,
) -> Result<FeeSet, FeeError> {
    let mut current: BTreeMap<(FeeSource, i64), FeeComponent> = BTreeMap::new();
    let mut historical: BTreeMap<(FeeSource, i64), FeeComponent> = BTreeMap::new();

    for component in sources.into_components() {
        if !component
            .scope
            .applies_to(student.student_id, student.class_id, &student.section)
        {
            continue;
        }
        let key = (component.source, component.id);
        if is_current(&component, today) {
            check_component(&component)?;
            current.insert(key, component);
        } else {
            historical.insert(key, component);
        }
    }

    let active_class_fees = current
        .keys()
        .filter(|(source, _)| *source == FeeSource::StandardClassFee)
        .count();
    if active_class_fees > 1 {
        return Err(FeeError::DuplicateClassFee {
            class_id: student.class_id,
            count: active_class_fees,
        });
    }

    let components: Vec<FeeComponent> = current.into_values().collect();
    let total_amount: Amount = components.iter().map(|c| c.amount).sum();
    let quarter_totals = quarter_totals(&components);

    Ok(FeeSet {
        student_id: student.student_id,
        class_id: student.class_id,
        section: student.section.clone(),
        components,
        historical: historical.into_values().collect(),
        total_amount,
        quarter_totals,
    })
}

fn is_current(component: &FeeComponent, today: NaiveDate) -> bool {
    component.active
        && (component.source != FeeSource::StudentService || component.in_effect_on(today))
}

fn check_component(component: &FeeComponent) -> Result<(), FeeError> {
    if component.amount.is_negative() {
        return Err(FeeError::NegativeAmount {
            what: "fee component amount",
            amount: component.amount,
        });
    }
    if let Some(split) = &component.quarter_split {
        quarter::validate(component.amount, split)?;
    }
    Ok(())
}

/// Σ per quarter over components that define a split
fn quarter_totals(components: &[FeeComponent]) -> QuarterSplit {
    let mut totals = [Amount::ZERO; 4];
    for split in components.iter().filter_map(|c| c.quarter_split) {
        for (total, q) in totals.iter_mut().zip(split.to_array()) {
            *total += q;
        }
    }
    QuarterSplit::from_array(totals)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use shared::models::{FeeScope, SplitPolicy};

    pub(crate) fn component(
        id: i64,
        source: FeeSource,
        label: &str,
        amount: i64,
        scope: FeeScope,
    ) -> FeeComponent {
        FeeComponent {
            id,
            source,
            label: label.to_string(),
            amount: Amount::from_minor(amount),
            quarter_split: None,
            scope,
            active: true,
            due_date: None,
            start_date: None,
            end_date: None,
            created_at: 0,
        }
    }

    pub(crate) fn student() -> StudentRef {
        StudentRef {
            student_id: 7,
            class_id: 10,
            section: "A".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    #[test]
    fn class_fee_with_equal_policy() {
        let mut fee = component(
            1,
            FeeSource::StandardClassFee,
            "Tuition",
            12000,
            FeeScope::class(10),
        );
        fee.quarter_split = Some(
            quarter::split(fee.amount, SplitPolicy::Equal, None).unwrap(),
        );
        let sources = FeeSources {
            class_fees: vec![fee],
            ..Default::default()
        };

        let set = merge(&student(), sources, today()).unwrap();
        assert_eq!(set.total_amount, Amount::from_minor(12000));
        assert_eq!(
            set.quarter_totals.to_array(),
            [3000, 3000, 3000, 3000].map(Amount::from_minor)
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let sources = FeeSources {
            class_fees: vec![component(
                1,
                FeeSource::StandardClassFee,
                "Tuition",
                12000,
                FeeScope::class(10),
            )],
            ad_hoc: vec![component(
                9,
                FeeSource::AdHocFeeRecord,
                "Tuition",
                500,
                FeeScope::student(10, 7),
            )],
            ..Default::default()
        };

        let first = merge(&student(), sources.clone(), today()).unwrap();
        let second = merge(&student(), sources, today()).unwrap();
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        // same label, different source identity: both kept
        assert_eq!(first.components.len(), 2);
        assert_eq!(first.total_amount, Amount::from_minor(12500));
    }

    #[test]
    fn repeated_source_rows_do_not_accumulate() {
        let fee = component(3, FeeSource::SectionExtraFee, "Lab", 800, FeeScope::section(10, "A"));
        let sources = FeeSources {
            section_extras: vec![fee.clone(), fee],
            ..Default::default()
        };
        let set = merge(&student(), sources, today()).unwrap();
        assert_eq!(set.components.len(), 1);
        assert_eq!(set.total_amount, Amount::from_minor(800));
    }

    #[test]
    fn section_extra_without_split_counts_only_toward_total() {
        let mut class_fee = component(
            1,
            FeeSource::StandardClassFee,
            "Tuition",
            4000,
            FeeScope::class(10),
        );
        class_fee.quarter_split =
            Some(quarter::split(class_fee.amount, SplitPolicy::Equal, None).unwrap());
        let sources = FeeSources {
            class_fees: vec![class_fee],
            section_extras: vec![component(
                2,
                FeeSource::SectionExtraFee,
                "Lab",
                600,
                FeeScope::section(10, "A"),
            )],
            ..Default::default()
        };
        let set = merge(&student(), sources, today()).unwrap();
        assert_eq!(set.total_amount, Amount::from_minor(4600));
        assert_eq!(set.quarter_totals.total(), Amount::from_minor(4000));
    }

    #[test]
    fn inactive_and_expired_services_are_historical() {
        let mut inactive = component(
            4,
            FeeSource::StudentService,
            "Hostel",
            900,
            FeeScope::student(10, 7),
        );
        inactive.active = false;
        let mut expired = component(
            5,
            FeeSource::StudentService,
            "Transport",
            300,
            FeeScope::student(10, 7),
        );
        expired.end_date = NaiveDate::from_ymd_opt(2026, 6, 30);
        let mut running = component(
            6,
            FeeSource::StudentService,
            "Library",
            100,
            FeeScope::student(10, 7),
        );
        running.start_date = NaiveDate::from_ymd_opt(2026, 4, 1);

        let sources = FeeSources {
            services: vec![inactive, expired, running],
            ..Default::default()
        };
        let set = merge(&student(), sources, today()).unwrap();
        assert_eq!(set.components.iter().map(|c| c.id).collect::<Vec<_>>(), vec![6]);
        assert_eq!(
            set.historical.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![4, 5]
        );
        assert_eq!(set.total_amount, Amount::from_minor(100));
    }

    #[test]
    fn no_components_is_an_empty_set() {
        let set = merge(&student(), FeeSources::default(), today()).unwrap();
        assert_eq!(set, FeeSet::empty(7, 10, "A"));
    }

    #[test]
    fn other_sections_and_students_are_out_of_scope() {
        let sources = FeeSources {
            section_extras: vec![component(
                2,
                FeeSource::SectionExtraFee,
                "Lab",
                600,
                FeeScope::section(10, "B"),
            )],
            services: vec![component(
                3,
                FeeSource::StudentService,
                "Bus",
                200,
                FeeScope::student(10, 8),
            )],
            ..Default::default()
        };
        let set = merge(&student(), sources, today()).unwrap();
        assert!(set.is_empty());
        assert!(set.historical.is_empty());
    }

    #[test]
    fn second_active_class_fee_is_an_invariant_violation() {
        let sources = FeeSources {
            class_fees: vec![
                component(1, FeeSource::StandardClassFee, "Tuition", 100, FeeScope::class(10)),
                component(2, FeeSource::StandardClassFee, "Tuition", 100, FeeScope::class(10)),
            ],
            ..Default::default()
        };
        let err = merge(&student(), sources, today()).unwrap_err();
        assert_eq!(
            err,
            FeeError::DuplicateClassFee {
                class_id: 10,
                count: 2
            }
        );
    }

    #[test]
    fn stored_split_that_does_not_sum_is_rejected() {
        let mut fee = component(1, FeeSource::StandardClassFee, "Tuition", 100, FeeScope::class(10));
        fee.quarter_split = Some(QuarterSplit::from_array([25, 25, 25, 24].map(Amount::from_minor)));
        let sources = FeeSources {
            class_fees: vec![fee],
            ..Default::default()
        };
        assert!(matches!(
            merge(&student(), sources, today()),
            Err(FeeError::SplitMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn aggregate_reads_through_the_store() {
        use crate::db::MemoryStore;

        let store = MemoryStore::new();
        store
            .insert_component(
                1,
                &component(1, FeeSource::StandardClassFee, "Tuition", 5000, FeeScope::class(10)),
            )
            .await
            .unwrap();
        // different school, same ids
        store
            .insert_component(
                2,
                &component(1, FeeSource::StandardClassFee, "Tuition", 9999, FeeScope::class(10)),
            )
            .await
            .unwrap();

        let set = aggregate(&store, 1, &student(), today()).await.unwrap();
        assert_eq!(set.total_amount, Amount::from_minor(5000));

        store.set_unavailable(true);
        assert!(aggregate(&store, 1, &student(), today()).await.is_err());
    }
}
