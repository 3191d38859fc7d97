//! Domain records as the backend serves them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// XP needed per level on the portal's display scale.
///
/// Level transitions happen server-side; the client uses this only to
/// draw progress within the current level.
pub const XP_PER_LEVEL: u32 = 100;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Server-assigned user identifier.
///
/// Serialized as the bare number, and displayed the same way since it
/// goes straight into request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned reward identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardId(pub u64);

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A portal user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub level: u32,
    /// Badge labels. Order and duplicates are whatever the server sent.
    #[serde(default)]
    pub badges: Vec<String>,
}

impl User {
    /// Fraction of the current level completed, in `[0.0, 1.0]`.
    pub fn level_progress(&self) -> f64 {
        f64::from(self.xp.min(XP_PER_LEVEL)) / f64::from(XP_PER_LEVEL)
    }

    /// Returns `true` if the user holds `badge`.
    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.iter().any(|b| b == badge)
    }
}

// ---------------------------------------------------------------------------
// Reward
// ---------------------------------------------------------------------------

/// An entry in the reward catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub name: String,
    pub xp_cost: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_deserializes_with_missing_optional_fields() {
        let user: User = serde_json::from_value(json!({"id": 3, "name": "Ana"})).unwrap();
        assert_eq!(user.id, UserId(3));
        assert_eq!(user.xp, 0);
        assert!(user.badges.is_empty());
    }

    #[test]
    fn test_ids_serialize_as_bare_numbers() {
        let reward = Reward {
            id: RewardId(9),
            name: "Mug".into(),
            xp_cost: 40,
        };
        assert_eq!(
            serde_json::to_value(&reward).unwrap(),
            json!({"id": 9, "name": "Mug", "xp_cost": 40})
        );
        assert_eq!(UserId(7).to_string(), "7");
    }

    #[test]
    fn test_level_progress_is_clamped() {
        let mut user = User {
            id: UserId(1),
            name: "Ana".into(),
            xp: 50,
            level: 1,
            badges: vec![],
        };
        assert!((user.level_progress() - 0.5).abs() < f64::EPSILON);

        user.xp = 250;
        assert!((user.level_progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_has_badge() {
        let user = User {
            id: UserId(1),
            name: "Ana".into(),
            xp: 0,
            level: 1,
            badges: vec!["Early Bird".into()],
        };
        assert!(user.has_badge("Early Bird"));
        assert!(!user.has_badge("Night Owl"));
    }
}
