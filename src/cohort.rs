use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::config::DuplicateSignupPolicy;
use crate::error::AnalysisError;
use crate::models::{CohortEntry, EnrichedEvent, EventKind, EventRecord};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Builds one cohort entry per signed-up user, in order of first signup.
pub fn anchor_cohort(
    events: &[EventRecord],
    policy: DuplicateSignupPolicy,
) -> Result<Vec<CohortEntry>, AnalysisError> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut cohort: Vec<CohortEntry> = Vec::new();
    let mut duplicates = 0usize;

    for event in events.iter().filter(|e| e.event == EventKind::Signup) {
        let entry = CohortEntry {
            user_id: event.user_id.clone(),
            signup_time: event.timestamp,
            variant: event.variant.clone(),
        };

        match positions.get(event.user_id.as_str()) {
            Some(&index) => match policy {
                DuplicateSignupPolicy::Strict => {
                    return Err(AnalysisError::DuplicateSignup {
                        user_id: event.user_id.clone(),
                    });
                }
                DuplicateSignupPolicy::LastWins => {
                    duplicates += 1;
                    cohort[index] = entry;
                }
            },
            None => {
                positions.insert(event.user_id.as_str(), cohort.len());
                cohort.push(entry);
            }
        }
    }

    if duplicates > 0 {
        tracing::warn!(
            duplicates,
            "duplicate signup rows found; last signup per user kept"
        );
    }
    tracing::info!(users = cohort.len(), "cohort anchored");
    Ok(cohort)
}

pub fn enrich(events: &[EventRecord], cohort: &[CohortEntry]) -> Vec<EnrichedEvent> {
    let anchors: HashMap<&str, NaiveDateTime> = cohort
        .iter()
        .map(|entry| (entry.user_id.as_str(), entry.signup_time))
        .collect();

    events
        .iter()
        .map(|event| {
            let signup_time = anchors.get(event.user_id.as_str()).copied();
            EnrichedEvent {
                user_id: event.user_id.clone(),
                event: event.event.clone(),
                signup_time,
                days_since_signup: signup_time.map(|anchor| days_between(anchor, event.timestamp)),
            }
        })
        .collect()
}

/// Whole days from `from` to `to`, floored, so an event one hour before
/// signup lands on day -1.
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn event(user: &str, ts: NaiveDateTime, kind: EventKind, variant: &str) -> EventRecord {
        EventRecord {
            user_id: user.to_string(),
            timestamp: ts,
            event: kind,
            variant: variant.to_string(),
        }
    }

    #[test]
    fn day_offsets_floor_toward_negative() {
        let signup = at(5, 12);
        assert_eq!(days_between(signup, signup), 0);
        assert_eq!(days_between(signup, signup + Duration::hours(23)), 0);
        assert_eq!(days_between(signup, signup + Duration::hours(24)), 1);
        assert_eq!(days_between(signup, signup + Duration::hours(47)), 1);
        assert_eq!(days_between(signup, signup - Duration::hours(1)), -1);
    }

    #[test]
    fn one_anchor_per_user() {
        let events = vec![
            event("1", at(1, 0), EventKind::Signup, "A"),
            event("2", at(2, 0), EventKind::Signup, "B"),
            event("1", at(2, 0), EventKind::Active, "A"),
        ];
        let cohort = anchor_cohort(&events, DuplicateSignupPolicy::LastWins).unwrap();
        assert_eq!(cohort.len(), 2);
        assert_eq!(cohort[0].user_id, "1");
        assert_eq!(cohort[1].variant, "B");
    }

    #[test]
    fn duplicate_signup_last_wins_or_fails() {
        let events = vec![
            event("1", at(1, 0), EventKind::Signup, "A"),
            event("1", at(3, 0), EventKind::Signup, "B"),
        ];

        let cohort = anchor_cohort(&events, DuplicateSignupPolicy::LastWins).unwrap();
        assert_eq!(cohort.len(), 1);
        assert_eq!(cohort[0].signup_time, at(3, 0));
        assert_eq!(cohort[0].variant, "B");

        let err = anchor_cohort(&events, DuplicateSignupPolicy::Strict).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateSignup { user_id } if user_id == "1"));
    }

    #[test]
    fn enrichment_keeps_unanchored_and_early_events() {
        let events = vec![
            event("1", at(2, 0), EventKind::Signup, "A"),
            event("1", at(1, 0), EventKind::Active, "A"),
            event("9", at(3, 0), EventKind::Active, "A"),
        ];
        let cohort = anchor_cohort(&events, DuplicateSignupPolicy::LastWins).unwrap();
        let enriched = enrich(&events, &cohort);

        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[0].days_since_signup, Some(0));
        assert_eq!(enriched[1].days_since_signup, Some(-1));
        assert_eq!(enriched[2].signup_time, None);
        assert_eq!(enriched[2].days_since_signup, None);
    }
}
