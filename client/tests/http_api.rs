//! HttpVotingApi against a local axum server speaking the service's envelope.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use retrovote_client::{
    ApiConnector, ApiError, BearerTokens, HttpApiConfig, HttpConnector, VotingApi,
};
use retrovote_types::{Address, BallotLookup, ProjectId};
use serde_json::{json, Value};

const ROUND: &str = "7";
const ACCOUNT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

#[derive(Clone, Default)]
struct Server {
    /// Every request as `"METHOD path"` plus its JSON body, if any.
    log: Arc<Mutex<Vec<(String, Value)>>>,
    /// When set, the ballot endpoint reports "not found".
    no_ballot: bool,
    /// When set, login omits the refresh cookie.
    drop_refresh_cookie: bool,
}

impl Server {
    fn record(&self, what: String, body: Value) {
        self.log.lock().unwrap().push((what, body));
    }
}

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains("accessToken=AT") && c.contains("refreshToken=RT"))
}

fn envelope(status: i64, message: &str, data: Value) -> Json<Value> {
    Json(json!({ "statusCode": status, "message": message, "data": data, "metadata": null, "error": null }))
}

async fn nonce(State(s): State<Server>, Path(address): Path<String>) -> Json<Value> {
    s.record(format!("GET nonce {address}"), Value::Null);
    envelope(200, "ok", json!({ "nonce": format!("sign-in as {address}") }))
}

async fn login(State(s): State<Server>, Json(body): Json<Value>) -> impl IntoResponse {
    s.record("POST login".into(), body);
    let refresh = if s.drop_refresh_cookie {
        "other=1; Path=/"
    } else {
        "refreshToken=RT; Path=/; HttpOnly"
    };
    (
        AppendHeaders([
            (header::SET_COOKIE, "accessToken=AT; Path=/; HttpOnly"),
            (header::SET_COOKIE, refresh),
        ]),
        envelope(200, "Login successful", json!({})),
    )
}

async fn ballot(
    State(s): State<Server>,
    Path(round): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    s.record(format!("GET ballot {round}"), Value::Null);
    if !authed(&headers) {
        return (StatusCode::UNAUTHORIZED, envelope(401, "Unauthorized", Value::Null));
    }
    if s.no_ballot {
        return (StatusCode::NOT_FOUND, envelope(404, "Ballot not found!", Value::Null));
    }
    (
        StatusCode::OK,
        envelope(
            200,
            "ok",
            json!({
                "id": "b-1",
                "total_eligible_votes": 9,
                "used_votes": 2,
                "votes": [
                    { "id": "v-1", "is_confirmed": false, "vote_count": 2,
                      "project": { "id": "p-1", "name": "Lantern", "total_votes": 40 } }
                ]
            }),
        ),
    )
}

async fn submissions(
    State(s): State<Server>,
    Path(round): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    s.record(format!("GET submissions {round}"), json!(query));
    envelope(
        200,
        "ok",
        json!([
            { "id": "p-1", "name": "Lantern", "total_votes": 40 },
            { "id": "p-2", "name": "Harbor", "total_votes": 12, "project_rank": 2 }
        ]),
    )
}

async fn cast(
    State(s): State<Server>,
    Path((round, project)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    s.record(format!("POST vote {round} {project}"), body);
    if project == "p-bad" {
        return envelope(400, "Project is not eligible", Value::Null);
    }
    envelope(200, "Voting successful!", json!({}))
}

async fn confirm(
    State(s): State<Server>,
    Path(round): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    s.record(format!("POST confirm {round}"), body);
    envelope(200, "Votes confirmed!", json!({}))
}

async fn remove(State(s): State<Server>, Path(project): Path<String>) -> Json<Value> {
    s.record(format!("DELETE vote {project}"), Value::Null);
    envelope(200, "Vote deleted!", json!({}))
}

async fn start(server: Server) -> Arc<dyn VotingApi> {
    let router = Router::new()
        .route("/api/auth/get-nonce/:address", get(nonce))
        .route("/api/auth/login", post(login))
        .route("/api/vote/rounds/:round/ballot-votes", get(ballot))
        .route("/api/rounds/:round/submissions", get(submissions))
        .route("/api/vote/rounds/:round/projects/:project/vote", post(cast))
        .route("/api/vote/rounds/:round/confirm-votes", post(confirm))
        .route("/api/vote/projects/:project/vote", delete(remove))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let mut config = HttpApiConfig::new(ROUND);
    config.base_url = format!("http://{addr}/api");
    HttpConnector::new(config).connect(None).unwrap()
}

fn tokens() -> BearerTokens {
    BearerTokens::new("AT", "RT")
}

#[tokio::test]
async fn challenge_and_login() {
    let server = Server::default();
    let api = start(server.clone()).await;
    let address: Address = ACCOUNT.parse().unwrap();

    let challenge = api.challenge(&address).await.unwrap();
    assert_eq!(challenge, format!("sign-in as {ACCOUNT}"));

    let tokens = api.login(&address, "0xdeadbeef").await.unwrap();
    assert_eq!(tokens, BearerTokens::new("AT", "RT"));

    let log = server.log.lock().unwrap();
    assert_eq!(
        log[1].1,
        json!({ "walletAddress": ACCOUNT, "signature": "0xdeadbeef" })
    );
}

#[tokio::test]
async fn missing_cookie_is_retryable() {
    let api = start(Server {
        drop_refresh_cookie: true,
        ..Server::default()
    })
    .await;
    let address: Address = ACCOUNT.parse().unwrap();

    let err = api.login(&address, "0x00").await.unwrap_err();
    assert!(matches!(err, ApiError::Incomplete(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn ballot_found_and_not_found() {
    let api = start(Server::default()).await;
    match api.ballot(&tokens()).await.unwrap() {
        BallotLookup::Found(ballot) => {
            assert_eq!(ballot.allowance(), 7);
            assert_eq!(ballot.unconfirmed_vote_ids(), vec!["v-1".to_string()]);
        }
        BallotLookup::NotFound => panic!("expected a ballot"),
    }

    let api = start(Server {
        no_ballot: true,
        ..Server::default()
    })
    .await;
    assert_eq!(api.ballot(&tokens()).await.unwrap(), BallotLookup::NotFound);
}

#[tokio::test]
async fn unauthenticated_ballot_is_application_error() {
    let api = start(Server::default()).await;
    let err = api
        .ballot(&BearerTokens::new("wrong", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Application {
            status: 401,
            message: "Unauthorized".into()
        }
    );
}

#[tokio::test]
async fn projects_query_parameters() {
    let server = Server::default();
    let api = start(server.clone()).await;
    let projects = api.projects(&tokens()).await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].project_rank, Some(2));

    let log = server.log.lock().unwrap();
    let (what, query) = &log[0];
    assert_eq!(what, "GET submissions 7");
    assert_eq!(query["roundId"], "7");
    assert_eq!(query["perPage"], "1000");
    assert_eq!(query["sortBy"], "votes");
    assert_eq!(query["sortOrder"], "desc");
    assert_eq!(query["includeField"], "userVotes");
}

#[tokio::test]
async fn cast_confirm_delete() {
    let server = Server::default();
    let api = start(server.clone()).await;
    let tokens = tokens();

    api.cast_vote(&tokens, &ProjectId::new("p-1"), 3).await.unwrap();
    let rejected = api
        .cast_vote(&tokens, &ProjectId::new("p-bad"), 1)
        .await
        .unwrap_err();
    assert!(rejected.is_retryable());

    api.confirm_votes(&tokens, &["v-1".to_string(), "v-2".to_string()])
        .await
        .unwrap();
    api.delete_vote(&tokens, &ProjectId::new("p-1")).await.unwrap();

    let log = server.log.lock().unwrap();
    let calls: Vec<&str> = log.iter().map(|(what, _)| what.as_str()).collect();
    assert_eq!(
        calls,
        vec![
            "POST vote 7 p-1",
            "POST vote 7 p-bad",
            "POST confirm 7",
            "DELETE vote p-1"
        ]
    );
    assert_eq!(log[0].1, json!({ "voteCount": 3 }));
    assert_eq!(
        log[2].1,
        json!({ "votes": [{ "voteId": "v-1" }, { "voteId": "v-2" }] })
    );
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = HttpApiConfig::new(ROUND);
    config.base_url = format!("http://{addr}/api");
    let api = HttpConnector::new(config).connect(None).unwrap();
    let address: Address = ACCOUNT.parse().unwrap();

    let err = api.challenge(&address).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
