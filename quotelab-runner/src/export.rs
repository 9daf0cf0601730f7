//! Report export: CSV quote tables and JSON reports.
//!
//! JSON reports carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use quotelab_core::Quote;

use crate::report::{PortfolioReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &PortfolioReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize PortfolioReport to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<PortfolioReport> {
    let report: PortfolioReport =
        serde_json::from_str(json).context("failed to deserialize PortfolioReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: symbol, company_name, observed_date, price, volume,
/// change_percent, source, captured_at
pub fn export_quotes_csv(quotes: &[Quote]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "company_name",
        "observed_date",
        "price",
        "volume",
        "change_percent",
        "source",
        "captured_at",
    ])?;

    for q in quotes {
        wtr.write_record([
            q.symbol.as_str(),
            q.company_name.as_str(),
            q.observed_date.to_string().as_str(),
            format!("{:.2}", q.price).as_str(),
            q.volume.to_string().as_str(),
            format!("{:.2}", q.change_percent).as_str(),
            q.source.as_str(),
            q.captured_at.to_rfc3339().as_str(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Paths written by [`save_report`].
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub dir: PathBuf,
    pub report_json: PathBuf,
    pub quotes_csv: PathBuf,
    pub history_csv: Option<PathBuf>,
}

/// Write `report.json`, `quotes.csv` and (when non-empty) `history.csv` into
/// a `portfolio_{timestamp}/` directory under `output_dir`.
pub fn save_report(
    report: &PortfolioReport,
    history: &[Quote],
    output_dir: &Path,
) -> Result<ReportPaths> {
    let dirname = format!("portfolio_{}", report.generated_at.format("%Y%m%d_%H%M%S"));
    let dir = output_dir.join(dirname);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create report dir: {}", dir.display()))?;

    let report_json = dir.join("report.json");
    std::fs::write(&report_json, export_json(report)?)
        .with_context(|| format!("failed to write {}", report_json.display()))?;

    let quotes_csv = dir.join("quotes.csv");
    std::fs::write(&quotes_csv, export_quotes_csv(&report.quotes)?)
        .with_context(|| format!("failed to write {}", quotes_csv.display()))?;

    let history_csv = if history.is_empty() {
        None
    } else {
        let path = dir.join("history.csv");
        std::fs::write(&path, export_quotes_csv(history)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Some(path)
    };

    tracing::info!(dir = %dir.display(), "report saved");
    Ok(ReportPaths {
        dir,
        report_json,
        quotes_csv,
        history_csv,
    })
}

/// Load a report from a directory written by [`save_report`].
pub fn load_report(dir: &Path) -> Result<PortfolioReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
