use std::collections::{BTreeSet, HashSet};

use crate::cohort;
use crate::config::{DuplicateSignupPolicy, COMPARISON_DAY};
use crate::error::AnalysisError;
use crate::models::{
    CohortEntry, CurveSeries, EnrichedEvent, EventKind, EventRecord, RetentionCurve,
    VariantRetention,
};
use crate::stats::round_to;

/// Which slice of the cohort a retention query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortFilter<'a> {
    All,
    Variant(&'a str),
}

/// Signup-anchored view of one event log. Built once, queried many times.
#[derive(Debug, Clone)]
pub struct RetentionEngine {
    cohort: Vec<CohortEntry>,
    events: Vec<EnrichedEvent>,
}

impl RetentionEngine {
    pub fn new(cohort: Vec<CohortEntry>, events: Vec<EnrichedEvent>) -> Self {
        Self { cohort, events }
    }

    pub fn from_events(
        events: &[EventRecord],
        policy: DuplicateSignupPolicy,
    ) -> Result<Self, AnalysisError> {
        let cohort = cohort::anchor_cohort(events, policy)?;
        let enriched = cohort::enrich(events, &cohort);
        let engine = Self::new(cohort, enriched);

        let unanchored = engine.unanchored_events();
        if unanchored > 0 {
            tracing::warn!(events = unanchored, "events without a signup anchor ignored for retention");
        }
        Ok(engine)
    }

    /// Events whose user never signed up; they never match a day query.
    pub fn unanchored_events(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.signup_time.is_none())
            .count()
    }

    pub fn total_users(&self) -> usize {
        self.cohort_users(CohortFilter::All).len()
    }

    /// Distinct variant labels among signed-up users, ascending.
    pub fn variants(&self) -> Vec<String> {
        self.cohort
            .iter()
            .map(|entry| entry.variant.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn cohort_users(&self, filter: CohortFilter<'_>) -> HashSet<&str> {
        self.cohort
            .iter()
            .filter(|entry| match filter {
                CohortFilter::All => true,
                CohortFilter::Variant(variant) => entry.variant == variant,
            })
            .map(|entry| entry.user_id.as_str())
            .collect()
    }

    /// Distinct users in `users` with an `active` event exactly `day` days
    /// after their signup.
    fn retained_count(&self, day: i64, users: &HashSet<&str>) -> usize {
        self.events
            .iter()
            .filter(|event| event.event == EventKind::Active)
            .filter(|event| event.days_since_signup == Some(day))
            .filter(|event| users.contains(event.user_id.as_str()))
            .map(|event| event.user_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Fraction of the filtered cohort active on exactly `day`; 0.0 for an
    /// empty cohort.
    pub fn day_retention(&self, day: i64, filter: CohortFilter<'_>) -> f64 {
        let users = self.cohort_users(filter);
        if users.is_empty() {
            return 0.0;
        }
        self.retained_count(day, &users) as f64 / users.len() as f64
    }

    pub fn variant_table(&self) -> Vec<VariantRetention> {
        self.variants()
            .into_iter()
            .map(|variant| {
                let users = self.cohort_users(CohortFilter::Variant(&variant));
                let total_users = users.len();
                let retained_d1 = self.retained_count(COMPARISON_DAY, &users);
                let d1_retention_pct = if total_users == 0 {
                    0.0
                } else {
                    round_to(retained_d1 as f64 / total_users as f64 * 100.0, 2)
                };

                VariantRetention {
                    variant,
                    total_users,
                    retained_d1,
                    d1_retention_pct,
                }
            })
            .collect()
    }

    /// Day 0 is 1.0 for every series; days `1..=max_day` are measured.
    pub fn curve(&self, max_day: u32) -> RetentionCurve {
        let days: Vec<u32> = (0..=max_day).collect();
        let series_for = |filter: CohortFilter| -> Vec<f64> {
            days.iter()
                .map(|&day| {
                    if day == 0 {
                        1.0
                    } else {
                        self.day_retention(i64::from(day), filter)
                    }
                })
                .collect()
        };

        let mut series = vec![CurveSeries {
            label: "Overall".to_string(),
            column: "overall_retention".to_string(),
            rates: series_for(CohortFilter::All),
        }];

        for variant in self.variants() {
            let rates = series_for(CohortFilter::Variant(&variant));
            tracing::debug!(variant = %variant, ?rates, "variant curve computed");
            series.push(CurveSeries {
                label: format!("Variant {variant}"),
                column: format!("retention_{variant}"),
                rates,
            });
        }

        RetentionCurve { days, series }
    }
}
