//! Typed calls for the server's resource endpoints.

use serde_json::json;

use crate::models::{
    ActionMessage, FriendAction, Friendship, JoinRequest, LeagueStanding, Match, NewTournament,
    Notification, Participant, ScoreUpdate, Tournament, UserProfile,
};

use super::{ApiClient, ApiError, ApiRequest};

impl ApiClient {
    // ===== Users =====

    pub async fn fetch_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        self.get_json(ApiRequest::get("/users/")).await
    }

    // ===== Tournaments =====

    /// Public tournaments plus the private ones the user belongs to
    pub async fn fetch_tournaments(&self) -> Result<Vec<Tournament>, ApiError> {
        self.get_json(ApiRequest::get("/tournaments/")).await
    }

    pub async fn fetch_tournament(&self, id: i64) -> Result<Tournament, ApiError> {
        let request = ApiRequest::get(format!("/tournaments/{}/", id));
        self.get_json(request).await
    }

    /// The server answers with the fields it accepted, not the full tournament
    pub async fn create_tournament(
        &self,
        tournament: &NewTournament,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json("/tournaments/", tournament).await
    }

    /// Join a tournament. Private tournaments require their join code;
    /// public ones create a join request for the admin to approve.
    pub async fn join_tournament(
        &self,
        id: i64,
        join_code: Option<&str>,
    ) -> Result<ActionMessage, ApiError> {
        let body = match join_code {
            Some(code) => json!({ "join_code": code }),
            None => json!({}),
        };
        let path = format!("/tournaments/{}/join/", id);
        self.post_json(&path, &body).await
    }

    pub async fn fetch_participants(&self, id: i64) -> Result<Vec<Participant>, ApiError> {
        let request = ApiRequest::get(format!("/tournaments/{}/participants/", id));
        self.get_json(request).await
    }

    pub async fn fetch_join_requests(&self) -> Result<Vec<JoinRequest>, ApiError> {
        self.get_json(ApiRequest::get("/tournaments/requests/")).await
    }

    pub async fn approve_join_request(&self, id: i64) -> Result<ActionMessage, ApiError> {
        let path = format!("/tournaments/requests/{}/approve/", id);
        self.post_empty(&path).await
    }

    pub async fn reject_join_request(&self, id: i64) -> Result<ActionMessage, ApiError> {
        let path = format!("/tournaments/requests/{}/reject/", id);
        self.post_empty(&path).await
    }

    // ===== Matches =====

    pub async fn fetch_matches(&self, tournament_id: i64) -> Result<Vec<Match>, ApiError> {
        let request = ApiRequest::get("/matches/").query("tournament", tournament_id);
        self.get_json(request).await
    }

    /// League table, ordered by the server (points, goal difference, goals for)
    pub async fn fetch_standings(
        &self,
        tournament_id: i64,
    ) -> Result<Vec<LeagueStanding>, ApiError> {
        let request = ApiRequest::get("/matches/standings/").query("tournament", tournament_id);
        self.get_json(request).await
    }

    pub async fn report_score(
        &self,
        match_id: i64,
        score: &ScoreUpdate,
    ) -> Result<Match, ApiError> {
        let path = format!("/matches/{}/", match_id);
        self.patch_json(&path, score).await
    }

    // ===== Friends =====

    pub async fn fetch_friendships(&self) -> Result<Vec<Friendship>, ApiError> {
        self.get_json(ApiRequest::get("/friends/")).await
    }

    pub async fn send_friend_request(&self, username: &str) -> Result<ActionMessage, ApiError> {
        let body = json!({ "username": username });
        self.post_json("/friends/request/", &body).await
    }

    pub async fn respond_to_friend_request(
        &self,
        id: i64,
        action: FriendAction,
    ) -> Result<ActionMessage, ApiError> {
        let path = format!("/friends/{}/{}/", id, action.as_path());
        self.post_empty(&path).await
    }

    // ===== Notifications =====

    /// Newest first
    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get_json(ApiRequest::get("/notifications/")).await
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<ActionMessage, ApiError> {
        let path = format!("/notifications/{}/read/", id);
        self.post_empty(&path).await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<ActionMessage, ApiError> {
        self.post_empty("/notifications/read-all/").await
    }
}
