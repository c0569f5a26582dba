use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    pub id: i64,
    pub sender: UserProfile,
    pub receiver: UserProfile,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// The other side of the friendship from `user_id`'s point of view
    pub fn counterpart(&self, user_id: i64) -> &UserProfile {
        if self.sender.id == user_id {
            &self.receiver
        } else {
            &self.sender
        }
    }
}

/// Response to a pending friend request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendAction {
    Accept,
    Reject,
}

impl FriendAction {
    pub fn as_path(&self) -> &'static str {
        match self {
            FriendAction::Accept => "accept",
            FriendAction::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    FriendRequest,
    TournamentRequest,
    Invitation,
    MatchResult,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
