//! Challenge roster management: creation, joining, and leaving.

use tracing::debug;

use fitsync_core::{
    Challenge, ChallengeCategory, ChallengeGoal, ChallengeId, ChallengeMember, MemberId, Time,
    UserId,
};

use crate::error::ChallengeError;

/// Specification for creating a challenge.
#[derive(Debug, Clone)]
pub struct ChallengeSpec {
    /// Challenge name
    pub name: String,
    /// Detailed description
    pub description: String,
    /// What kind of activity is measured
    pub category: ChallengeCategory,
    /// When the challenge starts
    pub starts_at: Time,
    /// When the challenge ends
    pub ends_at: Time,
    /// Goals contributing to member progress
    pub goals: Vec<ChallengeGoal>,
    /// Capacity cap
    pub max_members: usize,
}

/// Create a challenge from a spec. The creating user joins as admin.
///
/// Rejects specs whose end date does not follow the start date.
pub fn create_challenge(
    spec: ChallengeSpec,
    creator: UserId,
    creator_name: impl Into<String>,
    now: Time,
) -> Result<Challenge, ChallengeError> {
    if spec.ends_at <= spec.starts_at {
        return Err(ChallengeError::InvalidWindow);
    }

    let mut admin = ChallengeMember::new(creator, creator_name, now);
    admin.admin = true;

    let challenge = Challenge {
        id: ChallengeId::new(),
        name: spec.name,
        description: spec.description,
        category: spec.category,
        starts_at: spec.starts_at,
        ends_at: spec.ends_at,
        goals: spec.goals,
        members: vec![admin],
        max_members: spec.max_members.max(1),
        created_at: now,
    };
    debug!(challenge = %challenge.id, name = %challenge.name, "challenge created");
    Ok(challenge)
}

/// Add a user to the roster. Enforces the capacity cap and rejects users
/// who are already members.
pub fn join(
    challenge: &mut Challenge,
    user_id: UserId,
    display_name: impl Into<String>,
    now: Time,
) -> Result<MemberId, ChallengeError> {
    if challenge.is_full() {
        return Err(ChallengeError::Full {
            max: challenge.max_members,
        });
    }
    if challenge.member_by_user(&user_id).is_some() {
        return Err(ChallengeError::AlreadyJoined(user_id));
    }

    let member = ChallengeMember::new(user_id, display_name, now);
    let member_id = member.id;
    challenge.members.push(member);
    Ok(member_id)
}

/// Remove a member from the roster, returning the removed entity.
///
/// Ranks of the remaining members are not renumbered here; the next
/// leaderboard rebuild takes care of that.
pub fn leave(
    challenge: &mut Challenge,
    member_id: MemberId,
) -> Result<ChallengeMember, ChallengeError> {
    let index = challenge
        .members
        .iter()
        .position(|m| m.id == member_id)
        .ok_or(ChallengeError::MemberNotFound(member_id))?;
    Ok(challenge.members.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn spec(max_members: usize) -> ChallengeSpec {
        ChallengeSpec {
            name: "Spring Steps".to_string(),
            description: "10k a day".to_string(),
            category: ChallengeCategory::Steps,
            starts_at: day(1),
            ends_at: day(31),
            goals: vec![ChallengeGoal::new(10_000.0, "steps")],
            max_members,
        }
    }

    #[test]
    fn test_creator_joins_as_admin() {
        let challenge =
            create_challenge(spec(5), UserId::new("alice"), "Alice", day(1)).unwrap();
        assert_eq!(challenge.members.len(), 1);
        assert!(challenge.members[0].admin);
        assert_eq!(challenge.members[0].progress, 0);
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut bad = spec(5);
        bad.starts_at = day(31);
        bad.ends_at = day(1);
        let err = create_challenge(bad, UserId::new("alice"), "Alice", day(1)).unwrap_err();
        assert!(matches!(err, ChallengeError::InvalidWindow));

        let mut zero = spec(5);
        zero.ends_at = zero.starts_at;
        assert!(create_challenge(zero, UserId::new("alice"), "Alice", day(1)).is_err());
    }

    #[test]
    fn test_join_enforces_capacity() {
        let mut challenge =
            create_challenge(spec(2), UserId::new("alice"), "Alice", day(1)).unwrap();

        join(&mut challenge, UserId::new("bob"), "Bob", day(2)).unwrap();
        let err = join(&mut challenge, UserId::new("cara"), "Cara", day(3)).unwrap_err();
        assert!(matches!(err, ChallengeError::Full { max: 2 }));
        assert_eq!(challenge.members.len(), 2);
    }

    #[test]
    fn test_join_rejects_duplicate_user() {
        let mut challenge =
            create_challenge(spec(5), UserId::new("alice"), "Alice", day(1)).unwrap();
        let err = join(&mut challenge, UserId::new("alice"), "Alice again", day(2)).unwrap_err();
        assert!(matches!(err, ChallengeError::AlreadyJoined(_)));
    }

    #[test]
    fn test_leave_removes_member() {
        let mut challenge =
            create_challenge(spec(5), UserId::new("alice"), "Alice", day(1)).unwrap();
        let bob = join(&mut challenge, UserId::new("bob"), "Bob", day(2)).unwrap();

        let removed = leave(&mut challenge, bob).unwrap();
        assert_eq!(removed.display_name, "Bob");
        assert_eq!(challenge.members.len(), 1);

        let err = leave(&mut challenge, bob).unwrap_err();
        assert!(matches!(err, ChallengeError::MemberNotFound(_)));
    }
}
