//! Challenge progress and leaderboard computation.

use tracing::debug;

use fitsync_core::{
    Challenge, ChallengeCategory, ChallengeGoal, GoalId, LeaderboardEntry, MemberId,
};

use crate::error::ChallengeError;

/// Keeps member progress, ranks, and leaderboard scores consistent as
/// goal values change. Stateless; the caller owns the aggregate and is
/// responsible for persisting the mutated result.
pub struct ChallengeProgressEngine;

impl ChallengeProgressEngine {
    /// Record a new value for a goal and recompute the acting member's
    /// aggregate progress.
    ///
    /// Unknown goal or member IDs are rejected before anything is mutated.
    /// Returns the member's new progress (0-100).
    pub fn update_goal_progress(
        &self,
        challenge: &mut Challenge,
        member_id: MemberId,
        goal_id: GoalId,
        new_value: f64,
    ) -> Result<u8, ChallengeError> {
        if challenge.member(member_id).is_none() {
            return Err(ChallengeError::MemberNotFound(member_id));
        }
        if challenge.goal(goal_id).is_none() {
            return Err(ChallengeError::GoalNotFound(goal_id));
        }

        if let Some(goal) = challenge.goal_mut(goal_id) {
            goal.current_value = new_value;
            goal.completed = new_value >= goal.target_value;
        }

        let progress = aggregate_progress(&challenge.goals);
        if let Some(member) = challenge.member_mut(member_id) {
            member.progress = progress;
        }
        debug!(challenge = %challenge.id, member = %member_id, progress, "goal progress updated");

        Ok(progress)
    }

    /// Re-rank members by progress and rebuild the leaderboard.
    ///
    /// Members are sorted by progress descending; ties keep their previous
    /// relative order (stable sort). Ranks are contiguous from 1. The
    /// returned entries are ordered by rank ascending and fully rebuilt;
    /// nothing is patched incrementally.
    pub fn recompute_leaderboard(&self, challenge: &mut Challenge) -> Vec<LeaderboardEntry> {
        let category = challenge.category;
        challenge
            .members
            .sort_by(|a, b| b.progress.cmp(&a.progress));

        challenge
            .members
            .iter_mut()
            .enumerate()
            .map(|(index, member)| {
                member.rank = index as u32 + 1;
                LeaderboardEntry {
                    member_id: member.id,
                    display_name: member.display_name.clone(),
                    rank: member.rank,
                    progress: member.progress,
                    score: category_score(category, member.progress),
                }
            })
            .collect()
    }
}

impl Default for ChallengeProgressEngine {
    fn default() -> Self {
        Self
    }
}

/// Aggregate progress over a challenge's goals: the mean of each goal's
/// completion ratio capped at 100%, rounded to the nearest integer. Every
/// goal contributes equally regardless of its size. A goal with a
/// non-positive target counts as complete; no goals means zero progress.
pub fn aggregate_progress(goals: &[ChallengeGoal]) -> u8 {
    if goals.is_empty() {
        return 0;
    }

    let sum: f64 = goals
        .iter()
        .map(|goal| {
            if goal.target_value <= 0.0 {
                1.0
            } else {
                (goal.current_value / goal.target_value).min(1.0)
            }
        })
        .sum();

    ((sum / goals.len() as f64) * 100.0).round() as u8
}

/// Category-specific display score. Derived entirely from progress, so two
/// members with equal progress always tie regardless of raw goal values.
pub fn category_score(category: ChallengeCategory, progress: u8) -> u64 {
    match category {
        // Approximates a total step count
        ChallengeCategory::Steps => progress as u64 * 1000,
        // Approximates a workout count
        ChallengeCategory::Workouts => (progress as f64 / 5.0).round() as u64,
        ChallengeCategory::Meals | ChallengeCategory::Weight | ChallengeCategory::Custom => {
            progress as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fitsync_core::{ChallengeId, ChallengeMember, Time, UserId};

    fn day(d: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn challenge_with(category: ChallengeCategory, goals: Vec<ChallengeGoal>) -> Challenge {
        Challenge {
            id: ChallengeId::new(),
            name: "March Steps".to_string(),
            description: "Walk it off".to_string(),
            category,
            starts_at: day(1),
            ends_at: day(31),
            goals,
            members: vec![
                ChallengeMember::new(UserId::new("alice"), "Alice", day(1)),
                ChallengeMember::new(UserId::new("bob"), "Bob", day(2)),
            ],
            max_members: 10,
            created_at: day(1),
        }
    }

    #[test]
    fn test_single_goal_progress_and_steps_score() {
        let mut challenge = challenge_with(
            ChallengeCategory::Steps,
            vec![ChallengeGoal::new(10_000.0, "steps")],
        );
        let member_id = challenge.members[0].id;
        let goal_id = challenge.goals[0].id;

        let engine = ChallengeProgressEngine;
        let progress = engine
            .update_goal_progress(&mut challenge, member_id, goal_id, 8_500.0)
            .unwrap();
        assert_eq!(progress, 85);
        assert!(!challenge.goals[0].completed);

        let board = engine.recompute_leaderboard(&mut challenge);
        assert_eq!(board[0].score, 85_000);
    }

    #[test]
    fn test_two_goals_fully_met() {
        let mut challenge = challenge_with(
            ChallengeCategory::Meals,
            vec![
                ChallengeGoal::new(100.0, "meals"),
                ChallengeGoal::new(50.0, "meals"),
            ],
        );
        let member_id = challenge.members[0].id;
        let first = challenge.goals[0].id;
        let second = challenge.goals[1].id;

        let engine = ChallengeProgressEngine;
        engine
            .update_goal_progress(&mut challenge, member_id, first, 100.0)
            .unwrap();
        let progress = engine
            .update_goal_progress(&mut challenge, member_id, second, 50.0)
            .unwrap();

        assert_eq!(progress, 100);
        assert!(challenge.goals.iter().all(|g| g.completed));
    }

    #[test]
    fn test_overshoot_is_capped_per_goal() {
        let mut challenge = challenge_with(
            ChallengeCategory::Custom,
            vec![
                ChallengeGoal::new(100.0, "reps"),
                ChallengeGoal::new(100.0, "reps"),
            ],
        );
        let member_id = challenge.members[0].id;
        let first = challenge.goals[0].id;

        // 300% on one goal must not drag the mean past its own 100% cap.
        let engine = ChallengeProgressEngine;
        let progress = engine
            .update_goal_progress(&mut challenge, member_id, first, 300.0)
            .unwrap();
        assert_eq!(progress, 50);
    }

    #[test]
    fn test_unknown_goal_rejected_without_mutation() {
        let mut challenge = challenge_with(
            ChallengeCategory::Steps,
            vec![ChallengeGoal::new(10_000.0, "steps")],
        );
        let member_id = challenge.members[0].id;

        let engine = ChallengeProgressEngine;
        let err = engine
            .update_goal_progress(&mut challenge, member_id, GoalId::new(), 5_000.0)
            .unwrap_err();

        assert!(matches!(err, ChallengeError::GoalNotFound(_)));
        assert_eq!(challenge.goals[0].current_value, 0.0);
        assert_eq!(challenge.members[0].progress, 0);
    }

    #[test]
    fn test_unknown_member_rejected_without_mutation() {
        let mut challenge = challenge_with(
            ChallengeCategory::Steps,
            vec![ChallengeGoal::new(10_000.0, "steps")],
        );
        let goal_id = challenge.goals[0].id;

        let engine = ChallengeProgressEngine;
        let err = engine
            .update_goal_progress(&mut challenge, MemberId::new(), goal_id, 5_000.0)
            .unwrap_err();

        assert!(matches!(err, ChallengeError::MemberNotFound(_)));
        assert_eq!(challenge.goals[0].current_value, 0.0);
    }

    #[test]
    fn test_leaderboard_ranks_are_contiguous() {
        let mut challenge =
            challenge_with(ChallengeCategory::Workouts, vec![ChallengeGoal::new(20.0, "sessions")]);
        challenge
            .members
            .push(ChallengeMember::new(UserId::new("cara"), "Cara", day(3)));
        challenge.members[0].progress = 40;
        challenge.members[1].progress = 90;
        challenge.members[2].progress = 65;

        let engine = ChallengeProgressEngine;
        let board = engine.recompute_leaderboard(&mut challenge);

        let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        let progresses: Vec<u8> = board.iter().map(|e| e.progress).collect();
        assert_eq!(progresses, vec![90, 65, 40]);
        // Workouts projection: round(progress / 5)
        assert_eq!(board[0].score, 18);
        assert_eq!(board[2].score, 8);
    }

    #[test]
    fn test_leaderboard_ties_keep_insertion_order() {
        let mut challenge =
            challenge_with(ChallengeCategory::Meals, vec![ChallengeGoal::new(10.0, "meals")]);
        challenge.members[0].progress = 70;
        challenge.members[1].progress = 70;

        let engine = ChallengeProgressEngine;
        let board = engine.recompute_leaderboard(&mut challenge);

        assert_eq!(board[0].display_name, "Alice");
        assert_eq!(board[1].display_name, "Bob");
        // Equal progress always ties in score.
        assert_eq!(board[0].score, board[1].score);
    }

    #[test]
    fn test_no_goals_means_zero_progress() {
        assert_eq!(aggregate_progress(&[]), 0);
    }

    #[test]
    fn test_non_positive_target_counts_complete() {
        let goals = vec![ChallengeGoal::new(0.0, "none")];
        assert_eq!(aggregate_progress(&goals), 100);
    }
}
