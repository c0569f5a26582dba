use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRound {
    #[serde(rename = "LEAGUE")]
    League,
    R16,
    QF,
    SF,
    #[serde(rename = "FINAL")]
    Final,
    #[serde(other)]
    Unknown,
}

impl MatchRound {
    pub fn display_name(&self) -> &'static str {
        match self {
            MatchRound::League => "League",
            MatchRound::R16 => "Round of 16",
            MatchRound::QF => "Quarter Final",
            MatchRound::SF => "Semi Final",
            MatchRound::Final => "Final",
            MatchRound::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecidedBy {
    Normal,
    ExtraTime,
    Penalties,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Played,
    Locked,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSource {
    #[serde(rename = "MANUAL")]
    Manual,
    AI,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub tournament: i64,
    #[serde(default)]
    pub tournament_name: String,
    pub round: MatchRound,
    pub player1: UserProfile,
    pub player2: UserProfile,
    pub score_player1: u32,
    pub score_player2: u32,
    pub decided_by: DecidedBy,
    #[serde(default)]
    pub winner: Option<UserProfile>,
    pub status: MatchStatus,
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
    #[serde(default = "default_source")]
    pub source_score: ScoreSource,
}

fn default_source() -> ScoreSource {
    ScoreSource::Manual
}

impl Match {
    pub fn scoreline(&self) -> String {
        format!(
            "{} {}-{} {}",
            self.player1.username, self.score_player1, self.score_player2, self.player2.username
        )
    }
}

/// Result entry for a match; the server recomputes standings on save
#[derive(Debug, Clone, Serialize)]
pub struct ScoreUpdate {
    pub score_player1: u32,
    pub score_player2: u32,
    pub decided_by: DecidedBy,
    pub status: MatchStatus,
    /// Winner's user id, when decided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueStanding {
    pub id: i64,
    pub player: UserProfile,
    pub played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
}
