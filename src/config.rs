use serde::Serialize;

use crate::error::AnalysisError;

pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const DEFAULT_MAX_DAY: u32 = 7;
pub const COMPARISON_DAY: i64 = 1;
pub const SUMMARY_LONG_DAY: i64 = 7;

/// How to resolve a user that carries more than one signup row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateSignupPolicy {
    /// The last signup row in file order becomes the anchor.
    LastWins,
    /// Any duplicate aborts the run.
    Strict,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    pub significance_level: f64,
    pub max_day: u32,
    pub control: String,
    pub treatment: String,
    pub yates_correction: bool,
    pub duplicate_policy: DuplicateSignupPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            max_day: DEFAULT_MAX_DAY,
            control: "A".to_string(),
            treatment: "B".to_string(),
            yates_correction: true,
            duplicate_policy: DuplicateSignupPolicy::LastWins,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "significance level must be in (0, 1), got {}",
                self.significance_level
            )));
        }
        if self.max_day < 1 {
            return Err(AnalysisError::InvalidConfig(
                "max day must be at least 1".to_string(),
            ));
        }
        if self.control.is_empty() || self.treatment.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "variant labels must not be empty".to_string(),
            ));
        }
        if self.control == self.treatment {
            return Err(AnalysisError::InvalidConfig(format!(
                "control and treatment must differ, both are '{}'",
                self.control
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        let config = AnalysisConfig::default();
        assert_eq!(config.significance_level, 0.05);
        assert_eq!(config.max_day, 7);
        assert_eq!(config.control, "A");
        assert_eq!(config.treatment, "B");
        assert!(config.yates_correction);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = AnalysisConfig {
            significance_level: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        config.significance_level = 0.05;
        config.max_day = 0;
        assert!(config.validate().is_err());

        config.max_day = 7;
        config.treatment = "A".to_string();
        assert!(config.validate().is_err());
    }
}
