//! Before vs after improvement.
//!
//! `pct = (before_avg - after_avg) / before_avg * 100`. Positive means the
//! after period is faster. A zero baseline yields [`Improvement::NotComputable`]
//! instead of a division fault.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{aggregate_where, Aggregate, GroupBy, GroupKey};
use crate::models::{Dataset, Operation, Period, Technology};

/// Relative improvement of the after period over the before period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "percent", rename_all = "camelCase")]
pub enum Improvement {
    Computed(f64),
    NotComputable,
}

impl Improvement {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Computed(p) => Some(*p),
            Self::NotComputable => None,
        }
    }
}

/// Percentage improvement from `before` to `after`.
pub fn improvement_pct(before: f64, after: f64) -> Improvement {
    if before == 0.0 || !before.is_finite() || !after.is_finite() {
        return Improvement::NotComputable;
    }
    Improvement::Computed((before - after) / before * 100.0)
}

/// One paired comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<Technology>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    pub before_avg_us: f64,
    pub after_avg_us: f64,
    pub before_count: usize,
    pub after_count: usize,
    pub improvement: Improvement,
    /// Same formula over average allocation, when both sides have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_improvement: Option<Improvement>,
}

impl ImprovementRow {
    fn pair(key: GroupKey, before: &Aggregate, after: &Aggregate) -> Self {
        let memory_improvement = match (before.avg_allocated_kb, after.avg_allocated_kb) {
            (Some(b), Some(a)) => Some(improvement_pct(b, a)),
            _ => None,
        };
        Self {
            technology: key.technology,
            operation: key.operation,
            before_avg_us: before.avg_time_us,
            after_avg_us: after.avg_time_us,
            before_count: before.count,
            after_count: after.count,
            improvement: improvement_pct(before.avg_time_us, after.avg_time_us),
            memory_improvement,
        }
    }
}

/// A group measured in only one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<Technology>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    /// The period that does have records.
    pub present_in: Period,
}

/// Paired improvements plus the groups that could not be paired.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementReport {
    pub pairs: Vec<ImprovementRow>,
    pub unmatched: Vec<UnmatchedGroup>,
}

/// Pair before and after groups of `group_by` (which must not group on period).
fn paired(dataset: &Dataset, group_by: GroupBy) -> ImprovementReport {
    let side = |period: Period| -> BTreeMap<GroupKey, Aggregate> {
        aggregate_where(dataset, group_by, |r| r.period == period)
            .into_iter()
            .map(|a| (a.key, a))
            .collect()
    };
    let before = side(Period::Before);
    let after = side(Period::After);

    let mut report = ImprovementReport::default();
    for (key, b) in &before {
        match after.get(key) {
            Some(a) => report.pairs.push(ImprovementRow::pair(*key, b, a)),
            None => report.unmatched.push(UnmatchedGroup {
                technology: key.technology,
                operation: key.operation,
                present_in: Period::Before,
            }),
        }
    }
    for key in after.keys().filter(|k| !before.contains_key(k)) {
        report.unmatched.push(UnmatchedGroup {
            technology: key.technology,
            operation: key.operation,
            present_in: Period::After,
        });
    }
    report
}

/// Improvement per (technology, operation).
///
/// Pairs missing either side are listed as unmatched rather than reported.
pub fn improvement_by_technology_operation(dataset: &Dataset) -> ImprovementReport {
    paired(dataset, GroupBy::TechnologyOperation)
}

/// Improvement of one (technology, operation) pair. `None` if either side is empty.
pub fn improvement(
    dataset: &Dataset,
    technology: Technology,
    operation: Operation,
) -> Option<ImprovementRow> {
    let side = |period: Period| {
        aggregate_where(dataset, GroupBy::TechnologyOperation, |r| {
            r.technology == technology && r.operation == operation && r.period == period
        })
        .pop()
    };
    let before = side(Period::Before)?;
    let after = side(Period::After)?;
    Some(ImprovementRow::pair(before.key, &before, &after))
}

/// Improvement per technology, across all operations.
pub fn improvement_by_technology(dataset: &Dataset) -> Vec<ImprovementRow> {
    paired(dataset, GroupBy::Technology).pairs
}

/// Overall before vs after improvement.
pub fn overall_improvement(dataset: &Dataset) -> Option<ImprovementRow> {
    paired(dataset, GroupBy::All).pairs.pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{record, sample};

    #[test]
    fn test_improvement_pct() {
        assert_eq!(improvement_pct(100.0, 60.0), Improvement::Computed(40.0));
        assert_eq!(improvement_pct(0.0, 5.0), Improvement::NotComputable);
        assert_eq!(improvement_pct(50.0, 100.0), Improvement::Computed(-100.0));
    }

    #[test]
    fn test_pairs_and_unmatched() {
        let report = improvement_by_technology_operation(&sample());

        // Only EF Create exists in both periods
        assert_eq!(report.pairs.len(), 1);
        let ef_create = &report.pairs[0];
        assert_eq!(ef_create.technology, Some(Technology::EfCore));
        assert_eq!(ef_create.operation, Some(Operation::Create));
        assert_eq!(ef_create.improvement, Improvement::Computed(40.0));
        assert_eq!(ef_create.memory_improvement, Some(Improvement::Computed(40.0)));

        // Read (before) and Query (after) do not pair under the default policy
        assert!(report.unmatched.iter().any(|u| u.operation == Some(Operation::Read)
            && u.present_in == Period::Before));
        assert!(report.unmatched.iter().any(|u| u.operation == Some(Operation::Query)
            && u.present_in == Period::After));
        assert_eq!(report.unmatched.len(), 5);
    }

    #[test]
    fn test_single_pair_lookup() {
        let ds = sample();
        let row = improvement(&ds, Technology::EfCore, Operation::Create).unwrap();
        assert_eq!(row.improvement.percent(), Some(40.0));
        assert!(improvement(&ds, Technology::Dapper, Operation::Create).is_none());
    }

    #[test]
    fn test_zero_baseline_not_computable() {
        let ds: Dataset = vec![
            record(Technology::AdoNet, Period::Before, Operation::Read, "ReadX", 0.0, None),
            record(Technology::AdoNet, Period::After, Operation::Read, "ReadX", 3.0, None),
        ]
        .into_iter()
        .collect();
        let row = improvement(&ds, Technology::AdoNet, Operation::Read).unwrap();
        assert_eq!(row.improvement, Improvement::NotComputable);
    }

    #[test]
    fn test_per_technology_and_overall() {
        let ds = sample();
        let by_tech = improvement_by_technology(&ds);
        assert_eq!(by_tech.len(), 2);
        // EF: before (100 + 50) / 2 = 75, after (60 + 30) / 2 = 45
        assert_eq!(by_tech[0].technology, Some(Technology::EfCore));
        assert_eq!(by_tech[0].improvement, Improvement::Computed(40.0));

        let overall = overall_improvement(&ds).unwrap();
        assert_eq!(overall.before_avg_us, 52.5);
        assert_eq!(overall.after_avg_us, 100.0 / 3.0);
        assert!(overall.technology.is_none());
        assert!(overall_improvement(&Dataset::default()).is_none());
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_value(Improvement::Computed(40.0)).unwrap();
        assert_eq!(json["status"], "computed");
        assert_eq!(json["percent"], 40.0);
        let json = serde_json::to_value(Improvement::NotComputable).unwrap();
        assert_eq!(json["status"], "notComputable");
    }
}
