//! crates/reading_tracker_core/src/streak.rs
//!
//! The streak calculator: a pure projection from a user's reading
//! activity log to a `ReadingStreak` summary. It holds no state and
//! performs no I/O, so identical input always produces identical output.

use chrono::{Duration, NaiveDate};

use crate::domain::{ReadingActivity, ReadingStreak};

/// Computes the streak summary for one user's activity history.
///
/// The input may be empty, unsorted, and may contain several records for
/// the same date; records are collapsed to a set of distinct active
/// dates first. `today` is passed explicitly so callers control the
/// clock (handlers pass the current UTC calendar date, tests pass a
/// fixed one).
pub fn compute(activities: &[ReadingActivity], today: NaiveDate) -> ReadingStreak {
    let mut dates: Vec<NaiveDate> = activities.iter().map(|a| a.activity_date).collect();
    dates.sort_unstable();
    dates.dedup();

    let last_active_date = dates.last().copied();
    let yesterday = today - Duration::days(1);

    let longest_streak = longest_run(&dates);
    let current_streak = current_run(&dates, today, yesterday);

    // At risk means the streak is alive but only because of yesterday:
    // one more idle day and it resets.
    let is_at_risk = last_active_date == Some(yesterday);

    let message = status_message(current_streak, is_at_risk, last_active_date);

    ReadingStreak {
        current_streak,
        longest_streak,
        last_active_date,
        is_at_risk,
        message,
    }
}

/// Length of the longest run of consecutive calendar dates anywhere in
/// the (sorted, deduplicated) history, regardless of how long ago.
fn longest_run(dates: &[NaiveDate]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for &date in dates {
        run = match prev {
            Some(p) if date == p + Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }

    longest
}

/// Length of the run of consecutive dates ending at the most recent
/// active date, provided that date is today or yesterday. Anything
/// older means the streak has already broken.
fn current_run(dates: &[NaiveDate], today: NaiveDate, yesterday: NaiveDate) -> u32 {
    let last = match dates.last() {
        Some(&d) if d == today || d == yesterday => d,
        _ => return 0,
    };

    let mut streak = 1u32;
    let mut expected = last - Duration::days(1);
    for &date in dates.iter().rev().skip(1) {
        if date != expected {
            break;
        }
        streak += 1;
        expected = date - Duration::days(1);
    }

    streak
}

/// Picks the status line shown next to the streak. The category is
/// fully determined by (`current_streak`, `is_at_risk`); the prose
/// itself is presentation.
fn status_message(
    current_streak: u32,
    is_at_risk: bool,
    last_active_date: Option<NaiveDate>,
) -> String {
    match (current_streak, is_at_risk, last_active_date) {
        (_, _, None) => "No reading logged yet. Read a few pages to start a streak!".to_string(),
        (n, true, _) => format!(
            "You're at risk of losing your {}-day streak. Read something today!",
            n
        ),
        (n, false, _) if n > 0 => format!("You're on a {}-day reading streak. Keep it up!", n),
        (_, _, Some(last)) => format!(
            "Your streak ended. Last read on {}. Start a new one today!",
            last
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn activity(on: NaiveDate) -> ReadingActivity {
        ReadingActivity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            activity_date: on,
            pages_read: 10,
            minutes_read: 0,
        }
    }

    fn activities(dates: &[NaiveDate]) -> Vec<ReadingActivity> {
        dates.iter().map(|&d| activity(d)).collect()
    }

    const TODAY: (i32, u32, u32) = (2024, 3, 15);

    fn today() -> NaiveDate {
        let (y, m, d) = TODAY;
        date(y, m, d)
    }

    #[test]
    fn empty_history_has_no_streak() {
        let streak = compute(&[], today());
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 0);
        assert_eq!(streak.last_active_date, None);
        assert!(!streak.is_at_risk);
        assert!(streak.message.contains("No reading logged yet"));
    }

    #[test]
    fn activity_only_today_is_a_one_day_streak_not_at_risk() {
        let streak = compute(&activities(&[today()]), today());
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.last_active_date, Some(today()));
        assert!(!streak.is_at_risk);
        assert!(streak.message.contains("1-day reading streak"));
    }

    #[test]
    fn activity_only_yesterday_is_at_risk() {
        let yesterday = today() - Duration::days(1);
        let streak = compute(&activities(&[yesterday]), today());
        assert_eq!(streak.current_streak, 1);
        assert!(streak.is_at_risk);
        assert!(streak.message.contains("at risk"));
    }

    #[test]
    fn run_ending_before_yesterday_is_broken() {
        let streak = compute(
            &activities(&[
                today() - Duration::days(4),
                today() - Duration::days(3),
                today() - Duration::days(2),
            ]),
            today(),
        );
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.last_active_date, Some(today() - Duration::days(2)));
        assert!(!streak.is_at_risk);
        assert!(streak.message.contains("streak ended"));
    }

    #[test]
    fn longest_streak_is_independent_of_anchoring() {
        // Three consecutive days ending today, plus a longer run far in
        // the past. Current counts the recent run, longest the old one.
        let streak = compute(
            &activities(&[
                today(),
                today() - Duration::days(1),
                today() - Duration::days(2),
                today() - Duration::days(10),
                today() - Duration::days(11),
                today() - Duration::days(12),
                today() - Duration::days(13),
            ]),
            today(),
        );
        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 4);
    }

    #[test]
    fn gap_history_counts_longest_regardless_of_recency() {
        // D, D-1, D-2, then a gap, then D-10; anchored at today.
        let streak = compute(
            &activities(&[
                today(),
                today() - Duration::days(1),
                today() - Duration::days(2),
                today() - Duration::days(10),
            ]),
            today(),
        );
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.current_streak, 3);
    }

    #[test]
    fn duplicate_dates_collapse_to_one_active_day() {
        let streak = compute(
            &activities(&[today(), today(), today() - Duration::days(1), today()]),
            today(),
        );
        assert_eq!(streak.current_streak, 2);
        assert_eq!(streak.longest_streak, 2);
    }

    #[test]
    fn unsorted_input_is_handled() {
        let streak = compute(
            &activities(&[
                today() - Duration::days(1),
                today(),
                today() - Duration::days(2),
            ]),
            today(),
        );
        assert_eq!(streak.current_streak, 3);
    }

    #[test]
    fn today_active_is_never_at_risk_even_with_long_streak() {
        let streak = compute(
            &activities(&[today(), today() - Duration::days(1)]),
            today(),
        );
        assert!(!streak.is_at_risk);
        assert_eq!(streak.current_streak, 2);
    }

    #[test]
    fn current_never_exceeds_longest() {
        let histories: Vec<Vec<NaiveDate>> = vec![
            vec![],
            vec![today()],
            vec![today() - Duration::days(1)],
            vec![today(), today() - Duration::days(1), today() - Duration::days(5)],
            vec![today() - Duration::days(7), today() - Duration::days(6)],
        ];
        for dates in histories {
            let streak = compute(&activities(&dates), today());
            assert!(
                streak.current_streak <= streak.longest_streak,
                "violated for {:?}",
                dates
            );
        }
    }

    #[test]
    fn recompute_is_idempotent() {
        let acts = activities(&[today(), today() - Duration::days(1)]);
        assert_eq!(compute(&acts, today()), compute(&acts, today()));
    }
}
