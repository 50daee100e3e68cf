//! crates/reading_tracker_core/src/goals.rs
//!
//! The goal progress tracker: pure state transitions applied to a
//! `Goal` when a book is marked completed or un-completed. Persistence
//! of the returned value (and of the counted-book junction) is the
//! caller's responsibility.

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::{BookCompletionEvent, CompletionDirection, Goal};

/// How the counted-book membership set changed, so the caller can
/// persist the junction row alongside the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Add(Uuid),
    Remove(Uuid),
}

/// Result of applying a completion event to one goal.
#[derive(Debug, Clone)]
pub struct GoalUpdate {
    pub goal: Goal,
    /// False when the event was absorbed as a no-op (wrong user,
    /// outside the window, or a redelivery).
    pub applied: bool,
    pub membership: Option<MembershipChange>,
}

impl GoalUpdate {
    fn unchanged(goal: Goal) -> Self {
        GoalUpdate {
            goal,
            applied: false,
            membership: None,
        }
    }
}

/// Dispatches on the event's direction. This is the single entry point
/// the book-status handler uses.
pub fn apply_completion_event(
    goal: Goal,
    counted: &HashSet<Uuid>,
    event: &BookCompletionEvent,
) -> GoalUpdate {
    match event.direction {
        CompletionDirection::Completed => on_book_completed(goal, counted, event),
        CompletionDirection::Uncompleted => on_book_uncompleted(goal, counted, event),
    }
}

/// Counts a newly completed book toward the goal.
///
/// Events for another user or outside the goal window are absorbed
/// without a state change. Redelivery of an event whose book is already
/// in `counted` is a no-op, so the same completion is never counted
/// twice. Completions past the target keep incrementing `current_books`
/// (the surplus is the bonus count); `Goal::completed()` stays true.
pub fn on_book_completed(
    mut goal: Goal,
    counted: &HashSet<Uuid>,
    event: &BookCompletionEvent,
) -> GoalUpdate {
    if !qualifies(&goal, event) || counted.contains(&event.book_id) {
        return GoalUpdate::unchanged(goal);
    }

    goal.current_books += 1;
    GoalUpdate {
        goal,
        applied: true,
        membership: Some(MembershipChange::Add(event.book_id)),
    }
}

/// Removes a previously counted book from the goal.
///
/// Only books present in `counted` can be removed; un-completing a book
/// that never counted is a no-op. Because `Goal::completed()` is
/// derived from `current_books`, dropping below the target reverses the
/// completed status, while dropping from above the target merely spends
/// a bonus book and leaves the goal completed.
pub fn on_book_uncompleted(
    mut goal: Goal,
    counted: &HashSet<Uuid>,
    event: &BookCompletionEvent,
) -> GoalUpdate {
    if !qualifies(&goal, event) || !counted.contains(&event.book_id) || goal.current_books == 0 {
        return GoalUpdate::unchanged(goal);
    }

    goal.current_books -= 1;
    GoalUpdate {
        goal,
        applied: true,
        membership: Some(MembershipChange::Remove(event.book_id)),
    }
}

fn qualifies(goal: &Goal, event: &BookCompletionEvent) -> bool {
    event.user_id == goal.user_id && goal.window_contains(event.completion_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(user_id: Uuid, target: u32) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id,
            title: "Spring reading".to_string(),
            description: None,
            target_books: target,
            start_date: date(2024, 3, 1),
            end_date: date(2024, 5, 31),
            current_books: 0,
        }
    }

    fn completion(user_id: Uuid, book_id: Uuid, on: NaiveDate) -> BookCompletionEvent {
        BookCompletionEvent {
            user_id,
            book_id,
            completion_date: on,
            direction: CompletionDirection::Completed,
        }
    }

    fn uncompletion(user_id: Uuid, book_id: Uuid, on: NaiveDate) -> BookCompletionEvent {
        BookCompletionEvent {
            user_id,
            book_id,
            completion_date: on,
            direction: CompletionDirection::Uncompleted,
        }
    }

    /// Drives a goal through a sequence of events, maintaining the
    /// membership set the way the persistence layer would.
    fn run(
        mut goal: Goal,
        counted: &mut HashSet<Uuid>,
        events: &[BookCompletionEvent],
    ) -> Goal {
        for event in events {
            let update = apply_completion_event(goal, counted, event);
            goal = update.goal;
            match update.membership {
                Some(MembershipChange::Add(id)) => {
                    counted.insert(id);
                }
                Some(MembershipChange::Remove(id)) => {
                    counted.remove(&id);
                }
                None => {}
            }
        }
        goal
    }

    #[test]
    fn reaching_target_completes_the_goal() {
        let user = Uuid::new_v4();
        let mut counted = HashSet::new();
        let events: Vec<_> = (0..3)
            .map(|i| completion(user, Uuid::new_v4(), date(2024, 3, 10) + Duration::days(i)))
            .collect();

        let goal = run(goal(user, 3), &mut counted, &events);
        assert_eq!(goal.current_books, 3);
        assert!(goal.completed());
        assert_eq!(goal.bonus_count(), 0);
    }

    #[test]
    fn completions_past_target_count_as_bonus() {
        let user = Uuid::new_v4();
        let mut counted = HashSet::new();
        let events: Vec<_> = (0..4)
            .map(|i| completion(user, Uuid::new_v4(), date(2024, 3, 10) + Duration::days(i)))
            .collect();

        let goal = run(goal(user, 3), &mut counted, &events);
        assert_eq!(goal.current_books, 4);
        assert!(goal.completed());
        assert_eq!(goal.bonus_count(), 1);
    }

    #[test]
    fn uncompleting_a_bonus_book_keeps_the_goal_completed() {
        let user = Uuid::new_v4();
        let books: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut counted = HashSet::new();
        let mut events: Vec<_> = books
            .iter()
            .map(|&b| completion(user, b, date(2024, 3, 10)))
            .collect();
        events.push(uncompletion(user, books[3], date(2024, 3, 10)));

        let goal = run(goal(user, 3), &mut counted, &events);
        assert_eq!(goal.current_books, 3);
        assert!(goal.completed());
        assert_eq!(goal.bonus_count(), 0);
    }

    #[test]
    fn dropping_below_target_reverses_completion() {
        let user = Uuid::new_v4();
        let books: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut counted = HashSet::new();
        let mut events: Vec<_> = books
            .iter()
            .map(|&b| completion(user, b, date(2024, 3, 10)))
            .collect();
        events.push(uncompletion(user, books[0], date(2024, 3, 10)));

        let goal = run(goal(user, 3), &mut counted, &events);
        assert_eq!(goal.current_books, 2);
        assert!(!goal.completed());
    }

    #[test]
    fn completion_outside_window_is_a_no_op() {
        let user = Uuid::new_v4();
        let g = goal(user, 3);
        let counted = HashSet::new();

        let before_window = completion(user, Uuid::new_v4(), date(2024, 2, 28));
        let update = apply_completion_event(g.clone(), &counted, &before_window);
        assert!(!update.applied);
        assert_eq!(update.goal.current_books, 0);

        let after_window = completion(user, Uuid::new_v4(), date(2024, 6, 1));
        let update = apply_completion_event(g, &counted, &after_window);
        assert!(!update.applied);
        assert_eq!(update.goal.current_books, 0);
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let user = Uuid::new_v4();
        let g = goal(user, 3);
        let counted = HashSet::new();

        let on_start = completion(user, Uuid::new_v4(), g.start_date);
        assert!(apply_completion_event(g.clone(), &counted, &on_start).applied);

        let on_end = completion(user, Uuid::new_v4(), g.end_date);
        assert!(apply_completion_event(g, &counted, &on_end).applied);
    }

    #[test]
    fn event_for_another_user_is_ignored() {
        let user = Uuid::new_v4();
        let g = goal(user, 3);
        let counted = HashSet::new();

        let event = completion(Uuid::new_v4(), Uuid::new_v4(), date(2024, 3, 10));
        let update = apply_completion_event(g, &counted, &event);
        assert!(!update.applied);
        assert_eq!(update.goal.current_books, 0);
    }

    #[test]
    fn redelivered_completion_is_not_double_counted() {
        let user = Uuid::new_v4();
        let book = Uuid::new_v4();
        let mut counted = HashSet::new();
        let event = completion(user, book, date(2024, 3, 10));

        let goal = run(goal(user, 3), &mut counted, &[event.clone(), event]);
        assert_eq!(goal.current_books, 1);
    }

    #[test]
    fn uncompleting_an_uncounted_book_is_a_no_op() {
        let user = Uuid::new_v4();
        let g = goal(user, 3);
        let counted = HashSet::new();

        let event = uncompletion(user, Uuid::new_v4(), date(2024, 3, 10));
        let update = apply_completion_event(g, &counted, &event);
        assert!(!update.applied);
        assert_eq!(update.goal.current_books, 0);
    }

    #[test]
    fn uncompletion_never_drives_progress_negative() {
        let user = Uuid::new_v4();
        let book = Uuid::new_v4();
        // Junction claims the book counted but the stored progress is
        // already zero; the decrement must not underflow.
        let mut counted: HashSet<Uuid> = [book].into_iter().collect();
        let event = uncompletion(user, book, date(2024, 3, 10));

        let goal = run(goal(user, 3), &mut counted, &[event]);
        assert_eq!(goal.current_books, 0);
        assert!(!goal.completed());
    }

    #[test]
    fn completed_is_derived_not_sticky() {
        // Full cycle: complete to target, over-complete, then unwind
        // past the reversal point.
        let user = Uuid::new_v4();
        let books: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut counted = HashSet::new();
        let mut g = goal(user, 3);

        for &b in &books {
            g = run(g, &mut counted, &[completion(user, b, date(2024, 4, 1))]);
        }
        assert!(g.completed());

        g = run(g, &mut counted, &[uncompletion(user, books[0], date(2024, 4, 1))]);
        assert!(g.completed(), "bonus book absorbs the first removal");

        g = run(g, &mut counted, &[uncompletion(user, books[1], date(2024, 4, 1))]);
        assert!(!g.completed(), "below target must reverse completion");
        assert_eq!(g.current_books, 2);
    }
}
