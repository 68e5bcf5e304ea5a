use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::models::{RetentionCurve, VariantRetention};
use crate::report::format_number;

pub const AB_TABLE_FILE: &str = "ab_d1_retention.csv";
pub const CURVE_TABLE_FILE: &str = "retention_curve.csv";
pub const CURVE_CHART_FILE: &str = "retention_curve.svg";
pub const SUMMARY_FILE: &str = "summary.txt";

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub ab_table: PathBuf,
    pub curve_table: PathBuf,
    pub curve_chart: PathBuf,
    pub summary: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(out_dir: &Path) -> Self {
        Self {
            ab_table: out_dir.join(AB_TABLE_FILE),
            curve_table: out_dir.join(CURVE_TABLE_FILE),
            curve_chart: out_dir.join(CURVE_CHART_FILE),
            summary: out_dir.join(SUMMARY_FILE),
        }
    }

    /// The artifacts listed in the summary, which does not list itself.
    pub fn listed(&self) -> Vec<PathBuf> {
        vec![
            self.ab_table.clone(),
            self.curve_table.clone(),
            self.curve_chart.clone(),
        ]
    }
}

pub fn write_ab_table(path: &Path, rows: &[VariantRetention]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    if rows.is_empty() {
        writer.write_record(["variant", "total_users", "retained_d1", "d1_retention_pct"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = rows.len(), "A/B table written");
    Ok(())
}

pub fn write_curve_table(path: &Path, curve: &RetentionCurve) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec!["day".to_string()];
    header.extend(curve.series.iter().map(|s| s.column.clone()));
    writer.write_record(&header)?;

    for (index, day) in curve.days.iter().enumerate() {
        let mut record = vec![day.to_string()];
        record.extend(
            curve
                .series
                .iter()
                .map(|s| s.rates.get(index).copied().map(format_number).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    tracing::info!(path = %path.display(), days = curve.days.len(), "retention curve written");
    Ok(())
}

pub fn write_text(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "artifact written");
    Ok(())
}
