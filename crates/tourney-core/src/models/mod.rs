//! Data models for tournament server resources.
//!
//! These mirror the server's JSON representations:
//!
//! - `UserProfile`, `NewUser`, `ProfileUpdate`: accounts
//! - `Tournament`, `Participant`, `JoinRequest`: tournaments and membership
//! - `Match`, `LeagueStanding`: fixtures, results and league tables
//! - `Friendship`, `Notification`: social features

pub mod matches;
pub mod social;
pub mod tournament;
pub mod user;

pub use matches::{
    DecidedBy, LeagueStanding, Match, MatchRound, MatchStatus, ScoreSource, ScoreUpdate,
};
pub use social::{FriendAction, Friendship, FriendshipStatus, Notification, NotificationKind};
pub use tournament::{
    JoinRequest, JoinRequestStatus, NewTournament, Participant, ParticipantRole, Tournament,
    TournamentKind, TournamentStatus, Visibility,
};
pub use user::{NewUser, ProfileUpdate, UserProfile};

/// Acknowledgement body returned by action endpoints (`{"message": "..."}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ActionMessage {
    #[serde(default)]
    pub message: String,
}
