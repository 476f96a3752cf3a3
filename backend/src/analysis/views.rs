//! Named report views.
//!
//! Each view bundles the aggregates a dashboard panel needs. They are
//! computed on demand from the dataset and serialize as
//! `{ "view": "<name>", "data": { ... } }`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::{
    aggregate, aggregate_where, counts, crud_comparison, distribution, improvement_by_technology,
    improvement_by_technology_operation, method_comparison, overall_improvement, Aggregate,
    GroupBy, GroupCount, GroupDistribution, ImprovementReport, ImprovementRow, MethodComparison,
};
use crate::models::{Dataset, Period};

/// The available views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisView {
    /// Before vs after, per technology: averages and distributions.
    BeforeAfterComplete,
    /// Before-period CRUD methods compared across technologies.
    CrudGeneral,
    /// After-period query methods compared across technologies.
    QueryGeneral,
    /// Overall, per-technology and per-operation improvement.
    PerformanceImprovement,
    /// Technology averages over the before-period CRUD benchmarks.
    TechComparison,
    /// Averages per operation type and technology, over the
    /// before-period CRUD benchmarks.
    OperationType,
    /// Per (period, technology) summary with record counts.
    DetailedSummary,
}

impl AnalysisView {
    pub const ALL: [AnalysisView; 7] = [
        Self::BeforeAfterComplete,
        Self::CrudGeneral,
        Self::QueryGeneral,
        Self::PerformanceImprovement,
        Self::TechComparison,
        Self::OperationType,
        Self::DetailedSummary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeAfterComplete => "before_after_complete",
            Self::CrudGeneral => "crud_general",
            Self::QueryGeneral => "query_general",
            Self::PerformanceImprovement => "performance_improvement",
            Self::TechComparison => "tech_comparison",
            Self::OperationType => "operation_type",
            Self::DetailedSummary => "detailed_summary",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::BeforeAfterComplete => "Complete comparison: before vs after",
            Self::CrudGeneral => "CRUD operations (before)",
            Self::QueryGeneral => "Query operations (after)",
            Self::PerformanceImprovement => "Performance improvement",
            Self::TechComparison => "Technology comparison",
            Self::OperationType => "Analysis by operation type",
            Self::DetailedSummary => "Detailed summary",
        }
    }
}

impl fmt::Display for AnalysisView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisView {
    type Err = String;

    /// Accepts the view name with `_` or `-`, and the original dashboard
    /// name of the first view (`antes_despues_complete`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        if normalized == "antes_despues_complete" {
            return Ok(Self::BeforeAfterComplete);
        }
        Self::ALL
            .into_iter()
            .find(|v| v.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|v| v.name()).collect();
                format!("unknown view '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

// ===== View payloads =====

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeAfterComplete {
    /// Averages per (period, technology).
    pub averages: Vec<Aggregate>,
    /// Distributions per (period, technology).
    pub distributions: Vec<GroupDistribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodView {
    pub period: Period,
    pub methods: Vec<MethodComparison>,
    /// Averages per technology within the period.
    pub technology_averages: Vec<Aggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceImprovement {
    pub overall: Option<ImprovementRow>,
    pub by_technology: Vec<ImprovementRow>,
    pub by_operation: ImprovementReport,
    /// Operation mix of each period.
    pub operation_counts: Vec<GroupCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedSummary {
    pub rows: Vec<Aggregate>,
    pub overall: Option<ImprovementRow>,
    pub total_records: usize,
}

/// A computed view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ViewOutput {
    BeforeAfterComplete(BeforeAfterComplete),
    CrudGeneral(MethodView),
    QueryGeneral(MethodView),
    PerformanceImprovement(PerformanceImprovement),
    TechComparison(Vec<Aggregate>),
    OperationType(Vec<Aggregate>),
    DetailedSummary(DetailedSummary),
}

impl ViewOutput {
    /// Which view this is.
    pub fn view(&self) -> AnalysisView {
        match self {
            Self::BeforeAfterComplete(_) => AnalysisView::BeforeAfterComplete,
            Self::CrudGeneral(_) => AnalysisView::CrudGeneral,
            Self::QueryGeneral(_) => AnalysisView::QueryGeneral,
            Self::PerformanceImprovement(_) => AnalysisView::PerformanceImprovement,
            Self::TechComparison(_) => AnalysisView::TechComparison,
            Self::OperationType(_) => AnalysisView::OperationType,
            Self::DetailedSummary(_) => AnalysisView::DetailedSummary,
        }
    }

    /// The view's main aggregate table, for views that have one.
    pub fn aggregates(&self) -> Option<&[Aggregate]> {
        match self {
            Self::BeforeAfterComplete(v) => Some(&v.averages),
            Self::CrudGeneral(v) | Self::QueryGeneral(v) => Some(&v.technology_averages),
            Self::TechComparison(rows) | Self::OperationType(rows) => Some(rows),
            Self::DetailedSummary(v) => Some(&v.rows),
            Self::PerformanceImprovement(_) => None,
        }
    }
}

/// Compute one view.
pub fn compute_view(dataset: &Dataset, view: AnalysisView) -> ViewOutput {
    match view {
        AnalysisView::BeforeAfterComplete => ViewOutput::BeforeAfterComplete(BeforeAfterComplete {
            averages: aggregate(dataset, GroupBy::PeriodTechnology),
            distributions: distribution(dataset, GroupBy::PeriodTechnology),
        }),
        AnalysisView::CrudGeneral => ViewOutput::CrudGeneral(MethodView {
            period: Period::Before,
            methods: crud_comparison(dataset),
            technology_averages: period_technology_averages(dataset, Period::Before),
        }),
        AnalysisView::QueryGeneral => ViewOutput::QueryGeneral(MethodView {
            period: Period::After,
            methods: method_comparison(dataset, Period::After),
            technology_averages: period_technology_averages(dataset, Period::After),
        }),
        AnalysisView::PerformanceImprovement => {
            ViewOutput::PerformanceImprovement(PerformanceImprovement {
                overall: overall_improvement(dataset),
                by_technology: improvement_by_technology(dataset),
                by_operation: improvement_by_technology_operation(dataset),
                operation_counts: counts(dataset, GroupBy::PeriodOperation),
            })
        }
        AnalysisView::TechComparison => ViewOutput::TechComparison(aggregate_where(
            dataset,
            GroupBy::Technology,
            |r| r.period == Period::Before && r.operation.is_crud(),
        )),
        AnalysisView::OperationType => ViewOutput::OperationType(aggregate_where(
            dataset,
            GroupBy::TechnologyOperation,
            |r| r.period == Period::Before && r.operation.is_crud(),
        )),
        AnalysisView::DetailedSummary => ViewOutput::DetailedSummary(DetailedSummary {
            rows: aggregate(dataset, GroupBy::PeriodTechnology),
            overall: overall_improvement(dataset),
            total_records: dataset.len(),
        }),
    }
}

fn period_technology_averages(dataset: &Dataset, period: Period) -> Vec<Aggregate> {
    aggregate_where(dataset, GroupBy::Technology, |r| r.period == period)
}
