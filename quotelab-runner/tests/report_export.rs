//! Report assembly and export artifacts.

use chrono::{NaiveDate, TimeZone, Utc};
use quotelab_core::{DataSource, Quote, Symbol};
use quotelab_runner::{
    export_json, export_quotes_csv, import_json, load_report, save_report, PortfolioReport,
    RunStats, SCHEMA_VERSION,
};

fn series(symbol: &str, closes: &[f64]) -> Vec<Quote> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| Quote {
            symbol: Symbol::parse(symbol).unwrap(),
            company_name: format!("{symbol}, Inc."),
            price: *c,
            volume: 1_200_000,
            change_percent: if i == 0 { 0.0 } else { 1.0 },
            observed_date: start + chrono::Duration::days(i as i64),
            source: DataSource::RealProvider,
            captured_at: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
        })
        .collect()
}

fn sample_report() -> (PortfolioReport, Vec<Quote>) {
    let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
    let mut history = series("AAPL", &closes);
    history.extend(series("MSFT", &closes));
    let latest = vec![history[24].clone(), history[49].clone()];
    let stats = RunStats {
        total: 2,
        real: 2,
        ..RunStats::default()
    };
    let generated_at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 0).unwrap();
    (
        PortfolioReport::build(latest, &history, Some(stats), generated_at),
        history,
    )
}

#[test]
fn report_uses_history_for_trends() {
    let (report, _) = sample_report();
    assert_eq!(report.trends.len(), 2);
    assert!(report.trends.iter().all(|t| t.long_ma.is_some()));
    assert!(!report.has_synthetic);
    assert_eq!(report.price_stats[0].count, 25);
}

#[test]
fn json_round_trip_preserves_report() {
    let (report, _) = sample_report();
    let json = export_json(&report).unwrap();
    let back = import_json(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn json_rejects_newer_schema() {
    let (mut report, _) = sample_report();
    report.schema_version = SCHEMA_VERSION + 1;
    let json = export_json(&report).unwrap();
    let err = import_json(&json).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version"));
}

#[test]
fn csv_has_header_and_one_row_per_quote() {
    let (report, _) = sample_report();
    let csv = export_quotes_csv(&report.quotes).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "symbol,company_name,observed_date,price,volume,change_percent,source,captured_at"
    );
    // Company name contains a comma, so it is quoted.
    assert!(lines[1].starts_with("AAPL,\"AAPL, Inc.\",2024-01-25,124.00,1200000,1.00,real_provider,"));
}

#[test]
fn save_and_load_report_directory() {
    let dir = tempfile::tempdir().unwrap();
    let (report, history) = sample_report();
    let paths = save_report(&report, &history, dir.path()).unwrap();

    assert!(paths.report_json.exists());
    assert!(paths.quotes_csv.exists());
    let history_csv = std::fs::read_to_string(paths.history_csv.unwrap()).unwrap();
    assert_eq!(history_csv.lines().count(), 51);

    let loaded = load_report(&paths.dir).unwrap();
    assert_eq!(loaded, report);
}
