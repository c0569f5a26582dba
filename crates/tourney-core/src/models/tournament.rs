use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentKind {
    League,
    Cup,
    Both,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Private,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Draft,
    Ongoing,
    Finished,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Draft => write!(f, "Draft"),
            TournamentStatus::Ongoing => write!(f, "Ongoing"),
            TournamentStatus::Finished => write!(f, "Finished"),
            TournamentStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TournamentKind,
    pub visibility: Visibility,
    /// Only present for private tournaments the caller administers
    #[serde(default)]
    pub join_code: Option<String>,
    pub max_players: i32,
    pub status: TournamentStatus,
    pub admin: UserProfile,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub participants_count: i32,
}

impl Tournament {
    pub fn is_full(&self) -> bool {
        self.participants_count >= self.max_players
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTournament {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TournamentKind,
    pub visibility: Visibility,
    pub max_players: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Admin,
    Player,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub user: UserProfile,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinRequestStatus {
    Pending,
    Accepted,
    Rejected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: i64,
    pub user: UserProfile,
    pub tournament: i64,
    #[serde(default)]
    pub tournament_name: String,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tournament() {
        let json = r#"{
            "id": 12,
            "name": "Spring Cup",
            "description": "",
            "type": "CUP",
            "visibility": "PRIVATE",
            "join_code": "AB12CD34",
            "max_players": 8,
            "status": "ONGOING",
            "admin": {
                "id": 1, "username": "ana", "email": "ana@example.com",
                "avatar": null, "num_whatsapp": null, "is_verified": false,
                "date_joined": "2024-01-01T00:00:00Z"
            },
            "created_at": "2024-03-01T09:00:00Z",
            "participants_count": 8
        }"#;
        let tournament: Tournament = serde_json::from_str(json).unwrap();
        assert_eq!(tournament.kind, TournamentKind::Cup);
        assert_eq!(tournament.visibility, Visibility::Private);
        assert_eq!(tournament.status, TournamentStatus::Ongoing);
        assert!(tournament.is_full());
    }

    #[test]
    fn test_unknown_enum_values_do_not_fail() {
        let status: TournamentStatus = serde_json::from_str(r#""ARCHIVED""#).unwrap();
        assert_eq!(status, TournamentStatus::Unknown);
    }

    #[test]
    fn test_new_tournament_uses_type_field() {
        let body = serde_json::to_value(NewTournament {
            name: "League".to_string(),
            description: String::new(),
            kind: TournamentKind::League,
            visibility: Visibility::Public,
            max_players: 16,
        })
        .unwrap();
        assert_eq!(body["type"], "LEAGUE");
        assert_eq!(body["visibility"], "PUBLIC");
    }
}
