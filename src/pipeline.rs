use std::path::Path;

use anyhow::Context;

use crate::artifacts::{self, ArtifactPaths};
use crate::chart;
use crate::config::{AnalysisConfig, COMPARISON_DAY, SUMMARY_LONG_DAY};
use crate::error::AnalysisError;
use crate::ingest;
use crate::models::{AnalysisResult, Comparison, EventRecord, VariantRetention};
use crate::report;
use crate::retention::{CohortFilter, RetentionEngine};
use crate::stats;

/// Lift and significance for the configured pair, if both variants exist.
///
/// A table with a zero row or column total has no defined statistic. The run
/// does not abort on it: the comparison keeps its lift, `test` is `None`, and
/// the p-value reads as "N/A" downstream.
pub fn compare(table: &[VariantRetention], config: &AnalysisConfig) -> Option<Comparison> {
    let control = table.iter().find(|row| row.variant == config.control)?;
    let treatment = table.iter().find(|row| row.variant == config.treatment)?;

    let lift = stats::lift(control.d1_retention_pct, treatment.d1_retention_pct);
    let contingency = stats::contingency_table(control, treatment);
    let test = match stats::chi2_contingency_2x2(contingency, config.yates_correction) {
        Ok(test) => Some(test),
        Err(err) => {
            tracing::warn!(error = %err, "significance test skipped");
            None
        }
    };

    Some(Comparison {
        control: control.variant.clone(),
        treatment: treatment.variant.clone(),
        lift,
        test,
    })
}

pub fn analyze(
    dataset: &str,
    events: &[EventRecord],
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    config.validate()?;

    let engine = RetentionEngine::from_events(events, config.duplicate_policy)?;
    let d1_retention = engine.day_retention(COMPARISON_DAY, CohortFilter::All);
    let d7_retention = engine.day_retention(SUMMARY_LONG_DAY, CohortFilter::All);
    let variants = engine.variant_table();

    let comparison = compare(&variants, config);
    if comparison.is_none() {
        tracing::info!(
            control = %config.control,
            treatment = %config.treatment,
            "variant pair not present; lift and significance skipped"
        );
    }

    let curve = engine.curve(config.max_day);
    let decision = report::decide(comparison.as_ref(), config.significance_level);

    Ok(AnalysisResult {
        dataset: dataset.to_string(),
        total_users: engine.total_users(),
        d1_retention,
        d7_retention,
        variants,
        comparison,
        curve,
        decision,
        config: config.clone(),
    })
}

pub fn write_artifacts(
    result: &AnalysisResult,
    config: &AnalysisConfig,
    out_dir: &Path,
) -> anyhow::Result<ArtifactPaths> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;
    let paths = ArtifactPaths::in_dir(out_dir);

    artifacts::write_ab_table(&paths.ab_table, &result.variants)?;
    artifacts::write_curve_table(&paths.curve_table, &result.curve)?;
    artifacts::write_text(&paths.curve_chart, &chart::render_svg(&result.curve))?;
    let summary = report::build_summary(result, config, &paths.listed());
    artifacts::write_text(&paths.summary, &summary)?;

    Ok(paths)
}

/// load, anchor, aggregate, test, curve, summarize, persist
pub fn run(
    input: &Path,
    out_dir: &Path,
    config: &AnalysisConfig,
) -> anyhow::Result<(AnalysisResult, ArtifactPaths)> {
    let events = ingest::load_events(input)?;
    let result = analyze(&input.display().to_string(), &events, config)?;
    let paths = write_artifacts(&result, config, out_dir)?;
    Ok((result, paths))
}
