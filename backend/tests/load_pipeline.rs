//! End-to-end: report files on disk → dataset → views.

use benchdiff::{
    by_technology, compute_view, improvement, load_directory, load_files, overall_improvement,
    AnalysisConfig, AnalysisView, Classifier, Improvement, Operation, Period, RowError,
    SourceError, Technology, ViewOutput,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const EF_BEFORE: &str = "CrudBenchmarks-report.csv";
const ADO_BEFORE: &str = "AdonetBenchmarks-report.csv";
const DAPPER_BEFORE: &str = "DapperBenchmarks-report.csv";
const EF_AFTER: &str = "PruebasDeRendimiento.BenchMarks_Despues.EfBenchmarkTests-report.csv";
const ADO_AFTER: &str = "PruebasDeRendimiento.BenchMarks_Despues.AdoNetBenchmarkTests-report.csv";
const DAPPER_AFTER: &str =
    "PruebasDeRendimiento.BenchMarks_Despues.DapperBenchmarkTests-report.csv";

const HEADER: &str = "Method;Job;Mean;Error;StdDev;Allocated";

fn write_report(dir: &Path, name: &str, rows: &[&str]) {
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    fs::write(dir.join(name), content).unwrap();
}

/// Five of the six reports; the ADO.NET after-period report is missing and
/// the Dapper before-period report has one unparseable `Mean`.
fn write_reports(dir: &Path) {
    write_report(
        dir,
        EF_BEFORE,
        &[
            "CreateCustomer;DefaultJob;100.0 μs;1.0 μs;2.0 μs;10 KB",
            "ReadCustomer;DefaultJob;0.05 ms;0.1 μs;0.2 μs;-",
            "UpdateCustomer;DefaultJob;80 μs;1 μs;1 μs;4 KB",
            "DeleteCustomer;DefaultJob;70 μs;1 μs;1 μs;2 KB",
        ],
    );
    write_report(
        dir,
        ADO_BEFORE,
        &[
            "CreateCustomer;DefaultJob;40 μs;1 μs;1 μs;2 KB",
            "ReadCustomer;DefaultJob;20 μs;1 μs;1 μs;1 KB",
        ],
    );
    write_report(
        dir,
        DAPPER_BEFORE,
        &[
            "CreateCustomer;DefaultJob;30 μs;1 μs;1 μs;2 KB",
            "ReadCustomer;DefaultJob;NA;1 μs;1 μs;1 KB",
            "DeleteCustomer;DefaultJob;25,5 μs;1 μs;1 μs;1 KB",
        ],
    );
    write_report(
        dir,
        EF_AFTER,
        &[
            "'EF: CreateCustomer';DefaultJob;60 μs;1 μs;1 μs;6 KB",
            "'EF: Get customers by city';DefaultJob;1,234.5 μs;1 μs;1 μs;1.5 MB",
        ],
    );
    write_report(
        dir,
        DAPPER_AFTER,
        &["'Dapper: Get customers by city';DefaultJob;500 ns;1 ns;1 ns;512 B"],
    );
}

#[test]
fn test_one_missing_table_loads_the_other_five() {
    let dir = tempdir().unwrap();
    write_reports(dir.path());

    let report = load_directory(dir.path(), &Classifier::default());

    assert_eq!(report.tables.len(), 5);
    assert_eq!(report.failed_table_count(), 1);
    assert_eq!(report.failed_tables[0].identity, ADO_AFTER);
    assert!(matches!(
        report.failed_tables[0].error,
        SourceError::SourceUnavailable { .. }
    ));

    // 4 + 2 + 3 + 2 + 1 rows, one of them unparseable
    assert_eq!(report.dataset.len(), 11);
    assert_eq!(report.skipped_row_count(), 1);
    let skipped = &report.skipped_rows[0];
    assert_eq!(skipped.table, DAPPER_BEFORE);
    assert_eq!(skipped.line, 3);
    assert!(matches!(skipped.error, RowError::MalformedUnit(_)));

    let dapper_before = report
        .tables
        .iter()
        .find(|t| t.identity == DAPPER_BEFORE)
        .unwrap();
    assert_eq!(dapper_before.rows_read, 3);
    assert_eq!(dapper_before.rows_loaded, 2);
    assert!(report.loaded_at.to_rfc3339().contains('T'));
}

#[test]
fn test_records_are_normalized_and_ordered() {
    let dir = tempdir().unwrap();
    write_reports(dir.path());
    let report = load_directory(dir.path(), &Classifier::default());
    let records = report.dataset.records();

    // Catalog order: EF before first, Dapper after last
    assert_eq!(records[0].technology, Technology::EfCore);
    assert_eq!(records[0].period, Period::Before);
    assert_eq!(records.last().unwrap().technology, Technology::Dapper);
    assert_eq!(records.last().unwrap().period, Period::After);

    let read = &records[1];
    assert_eq!(read.operation, Operation::Read);
    assert_eq!(read.mean_time_us, 50.0);
    assert_eq!(read.allocated_kb, Some(0.0));

    let ef_query = records
        .iter()
        .find(|r| r.technology == Technology::EfCore && r.operation == Operation::Query)
        .unwrap();
    assert_eq!(ef_query.method, "Get customers by city");
    assert_eq!(ef_query.mean_time_us, 1234.5);
    assert_eq!(ef_query.allocated_kb, Some(1536.0));

    let dapper_query = records.last().unwrap();
    assert_eq!(dapper_query.mean_time_us, 0.5);
    assert_eq!(dapper_query.allocated_kb, Some(0.5));

    let dapper_delete = records
        .iter()
        .find(|r| r.technology == Technology::Dapper && r.operation == Operation::Delete)
        .unwrap();
    assert_eq!(dapper_delete.mean_time_us, 25.5);
}

#[test]
fn test_unparseable_row_excluded_from_aggregates() {
    let dir = tempdir().unwrap();
    write_reports(dir.path());
    let report = load_directory(dir.path(), &Classifier::default());

    let groups = by_technology(&report.dataset);
    let dapper = groups
        .iter()
        .find(|g| g.key.technology == Some(Technology::Dapper))
        .unwrap();
    assert_eq!(dapper.count, 3);
    assert_eq!(dapper.avg_time_us, (30.0 + 25.5 + 0.5) / 3.0);

    // No ADO.NET after-period data: no pair for it
    assert!(improvement(&report.dataset, Technology::AdoNet, Operation::Create).is_none());
}

#[test]
fn test_improvement_and_views() {
    let dir = tempdir().unwrap();
    write_reports(dir.path());
    let report = load_directory(dir.path(), &Classifier::default());

    let ef_create = improvement(&report.dataset, Technology::EfCore, Operation::Create).unwrap();
    assert_eq!(ef_create.improvement, Improvement::Computed(40.0));

    assert!(overall_improvement(&report.dataset).is_some());

    for view in AnalysisView::ALL {
        let json = serde_json::to_value(compute_view(&report.dataset, view)).unwrap();
        assert_eq!(json["view"], view.name());
    }

    let ViewOutput::PerformanceImprovement(view) =
        compute_view(&report.dataset, AnalysisView::PerformanceImprovement)
    else {
        panic!("wrong view");
    };
    assert!(view
        .by_operation
        .unmatched
        .iter()
        .any(|u| u.technology == Some(Technology::AdoNet) && u.present_in == Period::Before));
}

#[test]
fn test_explicit_files_and_unknown_source() {
    let dir = tempdir().unwrap();
    write_reports(dir.path());
    fs::write(dir.path().join("notes.csv"), "Method;Mean\nA;1 ms").unwrap();

    let report = load_files(
        &[
            dir.path().join(DAPPER_AFTER),
            dir.path().join("notes.csv"),
            dir.path().join(EF_BEFORE),
        ],
        &Classifier::default(),
    );

    assert_eq!(report.tables.len(), 2);
    assert_eq!(report.tables[0].identity, EF_BEFORE);
    assert_eq!(report.failed_table_count(), 1);
    assert!(matches!(
        report.failed_tables[0].error,
        SourceError::UnknownSource(ref s) if s == "notes.csv"
    ));
}

#[test]
fn test_config_override_drives_loading() {
    let dir = tempdir().unwrap();
    write_report(
        dir.path(),
        "ef-old.csv",
        &["ReadCustomer;DefaultJob;100 μs;1 μs;1 μs;1 KB"],
    );
    write_report(
        dir.path(),
        "ef-new.csv",
        &["Get customers;DefaultJob;60 μs;1 μs;1 μs;1 KB"],
    );

    let config = AnalysisConfig::from_json_str(&format!(
        r#"{{
            "data_dir": {:?},
            "sources": [
                {{ "file": "ef-old.csv", "technology": "EFCore", "period": "Before" }},
                {{ "file": "ef-new.csv", "technology": "EFCore", "period": "After" }}
            ],
            "rules": {{
                "groups": [{{ "target": "read_like", "keywords": ["read", "get"] }}],
                "read_policy": {{ "before": "Read", "after": "Read" }}
            }}
        }}"#,
        dir.path().display().to_string()
    ))
    .unwrap();

    let report = load_directory(&config.data_dir, &config.classifier());
    assert!(report.is_complete());

    // With a uniform read policy, before and after reads pair up
    let row = improvement(&report.dataset, Technology::EfCore, Operation::Read).unwrap();
    assert_eq!(row.improvement, Improvement::Computed(40.0));
}
