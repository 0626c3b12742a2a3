//! Pause and duration arithmetic.
//!
//! Pauses are accounted in whole seconds. The minute total of a time entry is
//! derived once, at stop time, from the second-level totals so that repeated
//! pauses do not accumulate rounding drift.

use chrono::{DateTime, Utc};

use crate::constants::units::SECONDS_PER_MINUTE;
use crate::models::TimeEntryPause;

/// Whole seconds between two instants, rounded to nearest, never negative
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let millis = (to - from).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + 500) / 1000
}

/// Seconds recorded for a pause; an active pause counts up to `now`
pub fn pause_seconds(pause: &TimeEntryPause, now: DateTime<Utc>) -> i64 {
    match (pause.resumed_at, pause.duration) {
        (Some(_), Some(duration)) => i64::from(duration.max(0)),
        (Some(resumed_at), None) => elapsed_seconds(pause.paused_at, resumed_at),
        (None, _) => elapsed_seconds(pause.paused_at, now),
    }
}

pub fn total_pause_seconds(pauses: &[TimeEntryPause], now: DateTime<Utc>) -> i64 {
    pauses.iter().map(|pause| pause_seconds(pause, now)).sum()
}

/// Worked seconds between `start` and `end` minus pauses, clamped at zero
pub fn effective_seconds(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    pauses: &[TimeEntryPause],
) -> i64 {
    (elapsed_seconds(start, end) - total_pause_seconds(pauses, end)).max(0)
}

/// Round effective seconds to whole minutes (half up)
pub fn duration_minutes(effective_seconds: i64) -> i32 {
    let seconds = effective_seconds.max(0);
    let minutes = (seconds + SECONDS_PER_MINUTE / 2) / SECONDS_PER_MINUTE;
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn closed_pause(start: DateTime<Utc>, seconds: i64) -> TimeEntryPause {
        let mut pause = TimeEntryPause::begin(Uuid::new_v4(), start);
        pause.resumed_at = Some(start + Duration::seconds(seconds));
        pause.duration = Some(seconds as i32);
        pause
    }

    #[test]
    fn test_thirty_minutes_with_five_minute_pause_is_twenty_five() {
        let t0 = Utc::now();
        let pauses = vec![closed_pause(t0 + Duration::minutes(10), 300)];
        let effective = effective_seconds(t0, t0 + Duration::minutes(30), &pauses);
        assert_eq!(effective, 25 * 60);
        assert_eq!(duration_minutes(effective), 25);
    }

    #[test]
    fn test_multiple_pauses_sum_before_rounding() {
        let t0 = Utc::now();
        // Three 20s pauses: each alone would round to 0 minutes
        let pauses = vec![
            closed_pause(t0 + Duration::minutes(1), 20),
            closed_pause(t0 + Duration::minutes(2), 20),
            closed_pause(t0 + Duration::minutes(3), 20),
        ];
        let effective = effective_seconds(t0, t0 + Duration::minutes(10), &pauses);
        assert_eq!(effective, 540);
        assert_eq!(duration_minutes(effective), 9);
    }

    #[test]
    fn test_rounding_to_nearest_minute() {
        assert_eq!(duration_minutes(0), 0);
        assert_eq!(duration_minutes(29), 0);
        assert_eq!(duration_minutes(30), 1);
        assert_eq!(duration_minutes(89), 1);
        assert_eq!(duration_minutes(90), 2);
    }

    #[test]
    fn test_clock_skew_clamps_to_zero() {
        let t0 = Utc::now();
        assert_eq!(elapsed_seconds(t0, t0 - Duration::seconds(5)), 0);

        let pauses = vec![closed_pause(t0, 600)];
        assert_eq!(effective_seconds(t0, t0 + Duration::minutes(5), &pauses), 0);
        assert_eq!(duration_minutes(-42), 0);
    }

    #[test]
    fn test_active_pause_counts_until_now() {
        let t0 = Utc::now();
        let pause = TimeEntryPause::begin(Uuid::new_v4(), t0);
        assert_eq!(pause_seconds(&pause, t0 + Duration::seconds(42)), 42);
    }

    #[test]
    fn test_elapsed_seconds_rounds_to_nearest() {
        let t0 = Utc::now();
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(1499)), 1);
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(1500)), 2);
    }
}
