use std::path::Path;

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Probability of an `active` event on days 1 through 7 for the control arm.
pub const BASE_DAY_PROBABILITIES: [f64; 7] = [0.55, 0.45, 0.38, 0.32, 0.28, 0.25, 0.22];

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub users: u32,
    pub start: NaiveDate,
    pub signup_spread_days: u32,
    pub treatment_lift: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            users: 800,
            start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
            signup_spread_days: 10,
            treatment_lift: 0.03,
            seed: 42,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeneratedRow {
    user_id: u32,
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: NaiveDateTime,
    event: &'static str,
    variant: &'static str,
}

fn serialize_timestamp<S: serde::Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format("%Y-%m-%d %H:%M:%S"))
}

pub fn generate_events(path: &Path, config: &GeneratorConfig) -> anyhow::Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let start = config.start.and_hms_opt(0, 0, 0).unwrap_or_default();
    let mut written = 0usize;

    for user_id in 1..=config.users {
        let signup = start + Duration::days(rng.gen_range(0..=i64::from(config.signup_spread_days)));
        let variant = if rng.gen_bool(0.5) { "A" } else { "B" };

        writer.serialize(GeneratedRow {
            user_id,
            timestamp: signup,
            event: "signup",
            variant,
        })?;
        written += 1;

        for (offset, base) in BASE_DAY_PROBABILITIES.iter().enumerate() {
            let mut p = *base;
            if variant == "B" {
                p += config.treatment_lift;
            }

            if rng.gen::<f64>() < p {
                writer.serialize(GeneratedRow {
                    user_id,
                    timestamp: signup + Duration::days(offset as i64 + 1),
                    event: "active",
                    variant,
                })?;
                written += 1;
            }
        }
    }

    writer.flush()?;
    tracing::info!(rows = written, users = config.users, path = %path.display(), "synthetic events written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use crate::models::EventKind;

    #[test]
    fn same_seed_same_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("a/events.csv");
        let second = dir.path().join("b/events.csv");
        let config = GeneratorConfig {
            users: 50,
            ..GeneratorConfig::default()
        };

        generate_events(&first, &config).unwrap();
        generate_events(&second, &config).unwrap();
        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn output_round_trips_through_loader() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("events.csv");
        let config = GeneratorConfig {
            users: 25,
            ..GeneratorConfig::default()
        };
        let written = generate_events(&path, &config).unwrap();

        let events = ingest::load_events(&path).unwrap();
        assert_eq!(events.len(), written);
        let signups = events.iter().filter(|e| e.event == EventKind::Signup).count();
        assert_eq!(signups, 25);
        assert!(events.iter().all(|e| e.variant == "A" || e.variant == "B"));
    }
}
