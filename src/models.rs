use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::AnalysisConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Signup,
    Active,
    Other(String),
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "signup" => EventKind::Signup,
            "active" => EventKind::Active,
            _ => EventKind::Other(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    pub event: EventKind,
    pub variant: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CohortEntry {
    pub user_id: String,
    pub signup_time: NaiveDateTime,
    pub variant: String,
}

/// An event joined to its user's signup anchor. Both anchor fields are
/// `None` when the user never signed up.
#[derive(Debug, Clone)]
pub struct EnrichedEvent {
    pub user_id: String,
    pub event: EventKind,
    pub signup_time: Option<NaiveDateTime>,
    pub days_since_signup: Option<i64>,
}

/// One row of the A/B retention table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRetention {
    pub variant: String,
    pub total_users: usize,
    pub retained_d1: usize,
    pub d1_retention_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSeries {
    pub label: String,
    pub column: String,
    pub rates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionCurve {
    pub days: Vec<u32>,
    pub series: Vec<CurveSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceTest {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: u32,
    pub expected: [[f64; 2]; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub control: String,
    pub treatment: String,
    pub lift: f64,
    pub test: Option<SignificanceTest>,
}

impl Comparison {
    pub fn p_value(&self) -> Option<f64> {
        self.test.as_ref().map(|test| test.p_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Decision {
    Significant { treatment: String },
    LiftNotSignificant { treatment: String },
    NoDifference,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Significant { treatment } => {
                write!(f, "Variant {treatment} is better (statistically significant)")
            }
            Decision::LiftNotSignificant { treatment } => write!(
                f,
                "Variant {treatment} shows lift, but not statistically significant"
            ),
            Decision::NoDifference => write!(f, "No significant difference yet"),
        }
    }
}

/// Everything one analysis run produces, before it is written anywhere.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub dataset: String,
    pub total_users: usize,
    pub d1_retention: f64,
    pub d7_retention: f64,
    pub variants: Vec<VariantRetention>,
    pub comparison: Option<Comparison>,
    pub curve: RetentionCurve,
    pub decision: Decision,
    pub config: AnalysisConfig,
}
