use std::fmt::Write;
use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::models::{AnalysisResult, Comparison, Decision};
use crate::stats::round_to;

/// Shortest representation that reads back to the same value, e.g. `50.0`.
pub fn format_number(value: f64) -> String {
    format!("{value:?}")
}

fn format_pct(rate: f64) -> String {
    format_number(round_to(rate * 100.0, 2))
}

pub fn decide(comparison: Option<&Comparison>, significance_level: f64) -> Decision {
    match comparison {
        Some(comparison) => match comparison.p_value() {
            Some(p) if p < significance_level => Decision::Significant {
                treatment: comparison.treatment.clone(),
            },
            _ => Decision::LiftNotSignificant {
                treatment: comparison.treatment.clone(),
            },
        },
        None => Decision::NoDifference,
    }
}

pub fn build_summary(
    result: &AnalysisResult,
    config: &AnalysisConfig,
    artifacts: &[PathBuf],
) -> String {
    let mut output = String::new();
    let lift = result
        .comparison
        .as_ref()
        .map(|c| format!("{}%", format_number(c.lift)))
        .unwrap_or_else(|| "N/A".to_string());
    let p_value = result
        .comparison
        .as_ref()
        .and_then(Comparison::p_value)
        .map(|p| format_number(round_to(p, 4)))
        .unwrap_or_else(|| "N/A".to_string());

    let _ = writeln!(output, "SUMMARY");
    let _ = writeln!(output, "Dataset: {}", result.dataset);
    let _ = writeln!(output, "Users: {}", result.total_users);
    let _ = writeln!(output, "D1 retention: {}%", format_pct(result.d1_retention));
    let _ = writeln!(output, "D7 retention: {}%", format_pct(result.d7_retention));
    let _ = writeln!(
        output,
        "Lift ({} vs {}) on D1: {}",
        config.treatment, config.control, lift
    );
    let _ = writeln!(output, "p-value (D1): {p_value}");
    let _ = writeln!(output, "Decision: {}", result.decision);
    let _ = writeln!(output);
    let _ = write!(output, "Artifacts:");
    for path in artifacts {
        let _ = write!(output, "\n- {}", path.display());
    }

    output
}

pub fn build_console_report(result: &AnalysisResult, config: &AnalysisConfig) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "----- DAY-LEVEL RETENTION -----");
    let _ = writeln!(output, "D1 Retention: {}%", format_pct(result.d1_retention));
    let _ = writeln!(output, "D7 Retention: {}%", format_pct(result.d7_retention));
    let _ = writeln!(output);
    let _ = writeln!(output, "----- A/B D1 RETENTION -----");

    if result.variants.is_empty() {
        let _ = writeln!(output, "No signups recorded.");
    } else {
        let _ = writeln!(
            output,
            "{:>8} {:>12} {:>12} {:>17}",
            "variant", "total_users", "retained_d1", "d1_retention_pct"
        );
        for row in &result.variants {
            let _ = writeln!(
                output,
                "{:>8} {:>12} {:>12} {:>17}",
                row.variant,
                row.total_users,
                row.retained_d1,
                format_number(row.d1_retention_pct)
            );
        }
    }

    if let Some(comparison) = &result.comparison {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Variant {} Lift over {} (D1): {}%",
            comparison.treatment,
            comparison.control,
            format_number(comparison.lift)
        );
        match comparison.p_value() {
            Some(p) => {
                let _ = writeln!(output, "Chi-square p-value (D1): {}", format_number(round_to(p, 4)));
                let verdict = if p < config.significance_level {
                    "Statistically significant"
                } else {
                    "Not statistically significant"
                };
                let _ = writeln!(output, "{verdict}");
            }
            None => {
                let _ = writeln!(output, "Chi-square p-value (D1): N/A (degenerate table)");
            }
        }
    }

    output
}
