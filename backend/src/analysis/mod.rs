//! Aggregation engine over a loaded [`Dataset`].
//!
//! Everything here is a pure function of the dataset: no caching, no hidden
//! state, same input same output. Groups are emitted in key order (period,
//! then technology, then operation, each in declaration order), and a
//! group with no records is simply absent.
//!
//! ```text
//! Dataset ──▶ GroupBy key ──▶ ┌ Aggregate     (count, averages)
//!                             ├ Distribution  (min/max/percentiles)
//!                             └ Improvement   (before vs after)
//! ```
//!
//! - [`stats`] - descriptive statistics
//! - [`improvement`] - before/after improvement percentages
//! - [`views`] - named report views

pub mod improvement;
pub mod stats;
pub mod views;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Dataset, Operation, Period, Technology, UnifiedRecord};
use stats::Distribution;

pub use improvement::{
    improvement, improvement_by_technology, improvement_by_technology_operation,
    improvement_pct, overall_improvement, Improvement, ImprovementReport, ImprovementRow,
    UnmatchedGroup,
};
pub use views::{compute_view, AnalysisView, ViewOutput};

// =============================================================================
// Grouping keys
// =============================================================================

/// Key of one aggregation group. Dimensions not grouped on are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<Technology>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
}

/// Dimensions to group records on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// One group for the whole dataset.
    All,
    Technology,
    Period,
    TechnologyOperation,
    PeriodTechnology,
    PeriodOperation,
}

impl GroupBy {
    pub fn key(&self, record: &UnifiedRecord) -> GroupKey {
        let (t, p, o) = (Some(record.technology), Some(record.period), Some(record.operation));
        let none = GroupKey::default();
        match self {
            Self::All => none,
            Self::Technology => GroupKey { technology: t, ..none },
            Self::Period => GroupKey { period: p, ..none },
            Self::TechnologyOperation => GroupKey { technology: t, operation: o, ..none },
            Self::PeriodTechnology => GroupKey { period: p, technology: t, ..none },
            Self::PeriodOperation => GroupKey { period: p, operation: o, ..none },
        }
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Count and averages of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    #[serde(flatten)]
    pub key: GroupKey,
    pub count: usize,
    pub avg_time_us: f64,
    /// Average over the records that carry an allocation; absent if none do.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_allocated_kb: Option<f64>,
}

/// Accumulates one group's sums while scanning the dataset.
#[derive(Default)]
struct GroupAccumulator {
    count: usize,
    time_sum: f64,
    allocated_sum: f64,
    allocated_count: usize,
}

impl GroupAccumulator {
    fn add(&mut self, record: &UnifiedRecord) {
        self.count += 1;
        self.time_sum += record.mean_time_us;
        if let Some(kb) = record.allocated_kb {
            self.allocated_sum += kb;
            self.allocated_count += 1;
        }
    }

    fn build(self, key: GroupKey) -> Aggregate {
        Aggregate {
            key,
            count: self.count,
            avg_time_us: self.time_sum / self.count as f64,
            avg_allocated_kb: (self.allocated_count > 0)
                .then(|| self.allocated_sum / self.allocated_count as f64),
        }
    }
}

/// Aggregate the records selected by `filter`, grouped by `group_by`.
pub fn aggregate_where<F>(dataset: &Dataset, group_by: GroupBy, filter: F) -> Vec<Aggregate>
where
    F: Fn(&UnifiedRecord) -> bool,
{
    let mut groups: BTreeMap<GroupKey, GroupAccumulator> = BTreeMap::new();
    for record in dataset.records().iter().filter(|r| filter(r)) {
        groups.entry(group_by.key(record)).or_default().add(record);
    }
    groups.into_iter().map(|(key, acc)| acc.build(key)).collect()
}

/// Aggregate every record, grouped by `group_by`.
pub fn aggregate(dataset: &Dataset, group_by: GroupBy) -> Vec<Aggregate> {
    aggregate_where(dataset, group_by, |_| true)
}

pub fn by_technology(dataset: &Dataset) -> Vec<Aggregate> {
    aggregate(dataset, GroupBy::Technology)
}

pub fn by_period(dataset: &Dataset) -> Vec<Aggregate> {
    aggregate(dataset, GroupBy::Period)
}

pub fn by_technology_operation(dataset: &Dataset) -> Vec<Aggregate> {
    aggregate(dataset, GroupBy::TechnologyOperation)
}

/// Averages of one technology. `None` if it has no records.
pub fn technology_average(dataset: &Dataset, technology: Technology) -> Option<Aggregate> {
    aggregate_where(dataset, GroupBy::Technology, |r| r.technology == technology).pop()
}

/// Averages of one period. `None` if it has no records.
pub fn period_average(dataset: &Dataset, period: Period) -> Option<Aggregate> {
    aggregate_where(dataset, GroupBy::Period, |r| r.period == period).pop()
}

/// Averages of one (technology, operation) pair, optionally within one period.
pub fn technology_operation_average(
    dataset: &Dataset,
    technology: Technology,
    operation: Operation,
    period: Option<Period>,
) -> Option<Aggregate> {
    aggregate_where(dataset, GroupBy::TechnologyOperation, |r| {
        r.technology == technology
            && r.operation == operation
            && period.map_or(true, |p| r.period == p)
    })
    .pop()
}

// =============================================================================
// Distributions
// =============================================================================

/// Time and memory distributions of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDistribution {
    #[serde(flatten)]
    pub key: GroupKey,
    pub time_us: Distribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated_kb: Option<Distribution>,
}

/// Distribution summaries grouped by `group_by`.
pub fn distribution(dataset: &Dataset, group_by: GroupBy) -> Vec<GroupDistribution> {
    let mut groups: BTreeMap<GroupKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in dataset.records() {
        let (times, allocations) = groups.entry(group_by.key(record)).or_default();
        times.push(record.mean_time_us);
        allocations.extend(record.allocated_kb);
    }

    groups
        .into_iter()
        .filter_map(|(key, (times, allocations))| {
            Some(GroupDistribution {
                key,
                time_us: Distribution::from_values(times)?,
                allocated_kb: Distribution::from_values(allocations),
            })
        })
        .collect()
}

// =============================================================================
// Counts
// =============================================================================

/// Number of records in one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    #[serde(flatten)]
    pub key: GroupKey,
    pub count: usize,
}

/// Record counts grouped by `group_by`.
pub fn counts(dataset: &Dataset, group_by: GroupBy) -> Vec<GroupCount> {
    let mut groups: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for record in dataset.records() {
        *groups.entry(group_by.key(record)).or_default() += 1;
    }
    groups
        .into_iter()
        .map(|(key, count)| GroupCount { key, count })
        .collect()
}

// =============================================================================
// Per-method comparison
// =============================================================================

/// One method label measured by several technologies in the same period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodComparison {
    pub method: String,
    pub operation: Operation,
    /// Mean time per technology (averaged if the label repeats).
    pub time_us: BTreeMap<Technology, f64>,
    pub allocated_kb: BTreeMap<Technology, f64>,
}

/// Compare technologies method by method within one period.
///
/// Labels are matched case-insensitively; rows come out in first-seen order.
pub fn method_comparison(dataset: &Dataset, period: Period) -> Vec<MethodComparison> {
    struct Entry {
        method: String,
        operation: Operation,
        times: BTreeMap<Technology, Vec<f64>>,
        allocations: BTreeMap<Technology, Vec<f64>>,
    }

    let mut entries: Vec<Entry> = Vec::new();
    for record in dataset.filter(move |r| r.period == period) {
        let existing = entries.iter().position(|e| {
            e.method.eq_ignore_ascii_case(&record.method) && e.operation == record.operation
        });
        let idx = match existing {
            Some(i) => i,
            None => {
                entries.push(Entry {
                    method: record.method.clone(),
                    operation: record.operation,
                    times: BTreeMap::new(),
                    allocations: BTreeMap::new(),
                });
                entries.len() - 1
            }
        };
        let entry = &mut entries[idx];
        entry.times.entry(record.technology).or_default().push(record.mean_time_us);
        if let Some(kb) = record.allocated_kb {
            entry.allocations.entry(record.technology).or_default().push(kb);
        }
    }

    let averages = |m: BTreeMap<Technology, Vec<f64>>| -> BTreeMap<Technology, f64> {
        m.into_iter()
            .filter_map(|(t, v)| stats::mean(&v).map(|avg| (t, avg)))
            .collect()
    };

    entries
        .into_iter()
        .map(|e| MethodComparison {
            method: e.method,
            operation: e.operation,
            time_us: averages(e.times),
            allocated_kb: averages(e.allocations),
        })
        .collect()
}

/// Before-period comparison of the CRUD methods.
pub fn crud_comparison(dataset: &Dataset) -> Vec<MethodComparison> {
    method_comparison(dataset, Period::Before)
        .into_iter()
        .filter(|m| m.operation.is_crud())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(
        technology: Technology,
        period: Period,
        operation: Operation,
        method: &str,
        time: f64,
        allocated: Option<f64>,
    ) -> UnifiedRecord {
        UnifiedRecord {
            technology,
            period,
            operation,
            method: method.into(),
            mean_time_us: time,
            allocated_kb: allocated,
            ambiguous: false,
        }
    }

    pub(crate) fn sample() -> Dataset {
        use Operation::*;
        use Period::*;
        use Technology::*;
        vec![
            record(EfCore, Before, Create, "CreateCustomer", 100.0, Some(10.0)),
            record(EfCore, Before, Read, "ReadCustomer", 50.0, None),
            record(Dapper, Before, Create, "CreateCustomer", 40.0, Some(2.0)),
            record(Dapper, Before, Read, "ReadCustomer", 20.0, Some(4.0)),
            record(EfCore, After, Create, "CreateCustomer", 60.0, Some(6.0)),
            record(EfCore, After, Query, "Get customers", 30.0, Some(3.0)),
            record(Dapper, After, Query, "Get customers", 10.0, None),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_group_by_technology() {
        let groups = by_technology(&sample());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.technology, Some(Technology::EfCore));
        assert_eq!(groups[0].count, 4);
        assert_eq!(groups[0].avg_time_us, 60.0);
        // Only records with an allocation are averaged
        assert_eq!(groups[0].avg_allocated_kb, Some(19.0 / 3.0));
        assert_eq!(groups[1].key.technology, Some(Technology::Dapper));
    }

    #[test]
    fn test_absent_groups() {
        let ds = sample();
        assert!(technology_average(&ds, Technology::AdoNet).is_none());
        assert!(technology_operation_average(&ds, Technology::Dapper, Operation::Update, None).is_none());
        assert!(by_period(&Dataset::default()).is_empty());
        assert!(distribution(&Dataset::default(), GroupBy::All).is_empty());

        let only_time: Dataset = vec![record(
            Technology::AdoNet,
            Period::Before,
            Operation::Read,
            "ReadCustomer",
            5.0,
            None,
        )]
        .into_iter()
        .collect();
        let avg = technology_average(&only_time, Technology::AdoNet).unwrap();
        assert_eq!(avg.avg_allocated_kb, None);
    }

    #[test]
    fn test_period_average_and_lookup() {
        let ds = sample();
        let before = period_average(&ds, Period::Before).unwrap();
        assert_eq!(before.count, 4);
        assert_eq!(before.avg_time_us, 52.5);

        let ef_create_after =
            technology_operation_average(&ds, Technology::EfCore, Operation::Create, Some(Period::After))
                .unwrap();
        assert_eq!(ef_create_after.avg_time_us, 60.0);
    }

    #[test]
    fn test_distribution() {
        let groups = distribution(&sample(), GroupBy::PeriodTechnology);
        assert_eq!(groups.len(), 4);
        let dapper_after = groups
            .iter()
            .find(|g| g.key.period == Some(Period::After) && g.key.technology == Some(Technology::Dapper))
            .unwrap();
        assert_eq!(dapper_after.time_us.values, vec![10.0]);
        assert!(dapper_after.allocated_kb.is_none());
    }

    #[test]
    fn test_counts() {
        let c = counts(&sample(), GroupBy::PeriodTechnology);
        let total: usize = c.iter().map(|g| g.count).sum();
        assert_eq!(total, 7);
        assert_eq!(c[0].key.period, Some(Period::Before));
        assert_eq!(c[0].key.technology, Some(Technology::EfCore));
        assert_eq!(c[0].count, 2);
    }

    #[test]
    fn test_crud_comparison() {
        let rows = crud_comparison(&sample());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].method, "CreateCustomer");
        assert_eq!(rows[0].time_us[&Technology::EfCore], 100.0);
        assert_eq!(rows[0].time_us[&Technology::Dapper], 40.0);
        assert!(!rows[1].allocated_kb.contains_key(&Technology::EfCore));
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let ds = sample();
        assert_eq!(by_technology_operation(&ds), by_technology_operation(&ds));
    }
}
