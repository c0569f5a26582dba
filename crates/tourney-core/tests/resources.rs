mod common;

use serde_json::json;
use tourney_core::models::{FriendAction, MatchRound, NotificationKind, TournamentStatus};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{bearer, client, jwt, profile_json, store_with};

#[tokio::test]
async fn test_fetch_tournaments_sends_bearer() {
    let server = MockServer::start().await;
    let access = jwt(600, "a");
    Mock::given(method("GET"))
        .and(path("/tournaments/"))
        .and(header("Authorization", bearer(&access).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "name": "Summer League",
            "description": "",
            "type": "LEAGUE",
            "visibility": "PUBLIC",
            "join_code": null,
            "max_players": 16,
            "status": "DRAFT",
            "admin": profile_json(),
            "created_at": "2024-06-01T12:00:00Z",
            "participants_count": 3
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, store_with(&access, "r"));
    let tournaments = api.fetch_tournaments().await.unwrap();

    assert_eq!(tournaments.len(), 1);
    assert_eq!(tournaments[0].status, TournamentStatus::Draft);
    assert!(!tournaments[0].is_full());
    server.verify().await;
}

#[tokio::test]
async fn test_fetch_matches_filters_by_tournament() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/matches/"))
        .and(query_param("tournament", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 3,
            "tournament": 7,
            "tournament_name": "Cup",
            "round": "SF",
            "player1": profile_json(),
            "player2": profile_json(),
            "score_player1": 2,
            "score_player2": 1,
            "decided_by": "EXTRA_TIME",
            "winner": null,
            "status": "PLAYED",
            "played_at": null,
            "source_score": "MANUAL"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, store_with(&jwt(600, "a"), "r"));
    let matches = api.fetch_matches(7).await.unwrap();

    assert_eq!(matches[0].round, MatchRound::SF);
    assert_eq!(matches[0].scoreline(), "ana 2-1 ana");
    server.verify().await;
}

#[tokio::test]
async fn test_friend_and_notification_actions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/friends/request/"))
        .and(body_json(json!({ "username": "ben" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "message": "Friend request sent" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/friends/9/accept/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "Friend request accepted" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notifications/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "receiver": profile_json(),
            "type": "FRIEND_REQUEST",
            "content": "ben sent you a friend request",
            "is_read": false,
            "created_at": "2024-06-01T12:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/notifications/read-all/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, store_with(&jwt(600, "a"), "r"));

    let sent = api.send_friend_request("ben").await.unwrap();
    assert_eq!(sent.message, "Friend request sent");
    api.respond_to_friend_request(9, FriendAction::Accept).await.unwrap();

    let notifications = api.fetch_notifications().await.unwrap();
    assert_eq!(notifications[0].kind, NotificationKind::FriendRequest);
    let ack = api.mark_all_notifications_read().await.unwrap();
    assert!(ack.message.is_empty());
    server.verify().await;
}
