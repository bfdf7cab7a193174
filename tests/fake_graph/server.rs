//! In-process fake Graph server
//!
//! Routes mirror the real API paths under two prefixes so the token
//! endpoint and the REST root can live on one port:
//!
//! ```text
//!   POST  /login/{tenant}/oauth2/v2.0/token
//!   GET   /v1.0/users/{user}/mailFolders/{folder}/messages
//!   GET   /v1.0/users/{user}/messages/{id}
//!   PATCH /v1.0/users/{user}/messages/{id}
//!   POST  /v1.0/users/{user}/messages/{id}/createReply
//!   POST  /v1.0/users/{user}/messages/{id}/send
//!   POST  /v1.0/users/{user}/sendMail
//! ```
//!
//! Every API call is recorded as `"<op> <id>"` (e.g. `"send draft-m1"`)
//! so tests can assert exact call order. A call without the fake bearer
//! token gets a 401, and `fail_on` makes a chosen call return an error
//! envelope.

use super::mailbox::Mailbox;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use outlook_client::GraphConfig;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const ACCESS_TOKEN: &str = "fake-access-token";

#[derive(Debug, Default)]
struct ServerState {
    mailbox: Mailbox,
    calls: Vec<String>,
    queries: Vec<HashMap<String, String>>,
    patches: Vec<Value>,
    sent_mail: Vec<Value>,
    token_requests: Vec<String>,
    failures: HashMap<String, (u16, String)>,
    reject_token: bool,
}

type Shared = Arc<Mutex<ServerState>>;

pub struct FakeGraphServer {
    port: u16,
    state: Shared,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeGraphServer {
    /// Bind `127.0.0.1:0` and serve `mailbox` until dropped.
    pub async fn start(mailbox: Mailbox) -> Self {
        let state: Shared = Arc::new(Mutex::new(ServerState {
            mailbox,
            ..ServerState::default()
        }));

        let app = Router::new()
            .route("/login/{tenant}/oauth2/v2.0/token", post(token))
            .route(
                "/v1.0/users/{user}/mailFolders/{folder}/messages",
                get(list_messages),
            )
            .route(
                "/v1.0/users/{user}/messages/{id}",
                get(get_message).patch(patch_message),
            )
            .route(
                "/v1.0/users/{user}/messages/{id}/createReply",
                post(create_reply),
            )
            .route("/v1.0/users/{user}/messages/{id}/send", post(send))
            .route("/v1.0/users/{user}/sendMail", post(send_mail))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            port,
            state,
            _handle: handle,
        }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn api_url(&self) -> String {
        format!("http://127.0.0.1:{}/v1.0", self.port)
    }

    pub fn login_url(&self) -> String {
        format!("http://127.0.0.1:{}/login", self.port)
    }

    /// Client config pointed at this server.
    pub fn config(&self) -> GraphConfig {
        GraphConfig {
            api_url: self.api_url(),
            login_url: self.login_url(),
            ..GraphConfig::new("tenant-1", "client-1", "secret-1")
        }
    }

    /// Make `"<op> <id>"` fail with `status` and a Graph error envelope.
    pub fn fail_on(&self, call: &str, status: u16, code: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(call.to_string(), (status, code.to_string()));
    }

    /// Make the token endpoint reject the client credentials.
    pub fn reject_credentials(&self) {
        self.state.lock().unwrap().reject_token = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn list_queries(&self) -> Vec<HashMap<String, String>> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn patches(&self) -> Vec<Value> {
        self.state.lock().unwrap().patches.clone()
    }

    pub fn sent_mail(&self) -> Vec<Value> {
        self.state.lock().unwrap().sent_mail.clone()
    }

    /// Raw form bodies posted to the token endpoint.
    pub fn token_requests(&self) -> Vec<String> {
        self.state.lock().unwrap().token_requests.clone()
    }
}

fn graph_error(status: u16, code: &str, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({"error": {"code": code, "message": message}})),
    )
        .into_response()
}

/// Record the call, then check auth and injected failures.
fn begin(state: &Shared, headers: &HeaderMap, call: String) -> Result<(), Response> {
    let mut state = state.lock().unwrap();
    state.calls.push(call.clone());

    let expected = format!("Bearer {ACCESS_TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return Err(graph_error(
            401,
            "InvalidAuthenticationToken",
            "Access token is empty.",
        ));
    }

    if let Some((status, code)) = state.failures.get(&call) {
        return Err(graph_error(*status, code, "injected failure"));
    }
    Ok(())
}

async fn token(
    State(state): State<Shared>,
    Path(_tenant): Path<String>,
    body: String,
) -> Response {
    let mut state = state.lock().unwrap();
    state.token_requests.push(body);

    if state.reject_token {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })),
        )
            .into_response();
    }

    Json(json!({
        "token_type": "Bearer",
        "expires_in": 3599,
        "access_token": ACCESS_TOKEN
    }))
    .into_response()
}

async fn list_messages(
    State(state): State<Shared>,
    Path((_user, folder)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = begin(&state, &headers, format!("list {folder}")) {
        return resp;
    }

    let mut state = state.lock().unwrap();
    state.queries.push(query.clone());

    let top = query
        .get("$top")
        .and_then(|t| t.parse::<usize>().ok())
        .unwrap_or(10);
    let value: Vec<Value> = state
        .mailbox
        .newest_first()
        .into_iter()
        .take(top)
        .map(|m| {
            json!({
                "id": m.id,
                "from": sender(&m.from),
                "subject": m.subject,
                "isRead": m.is_read,
            })
        })
        .collect();

    Json(json!({ "value": value })).into_response()
}

async fn get_message(
    State(state): State<Shared>,
    Path((_user, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = begin(&state, &headers, format!("get {id}")) {
        return resp;
    }

    let state = state.lock().unwrap();
    match state.mailbox.get(&id) {
        Some(m) => Json(json!({
            "id": m.id,
            "from": sender(&m.from),
            "subject": m.subject,
        }))
        .into_response(),
        None => graph_error(
            404,
            "ErrorItemNotFound",
            "The specified object was not found in the store.",
        ),
    }
}

async fn create_reply(
    State(state): State<Shared>,
    Path((_user, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = begin(&state, &headers, format!("createReply {id}")) {
        return resp;
    }
    assert_eq!(body, json!({"comment": ""}));

    (
        StatusCode::CREATED,
        Json(json!({ "id": format!("draft-{id}"), "isDraft": true })),
    )
        .into_response()
}

async fn patch_message(
    State(state): State<Shared>,
    Path((_user, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = begin(&state, &headers, format!("patch {id}")) {
        return resp;
    }

    state.lock().unwrap().patches.push(body);
    Json(json!({ "id": id })).into_response()
}

async fn send(
    State(state): State<Shared>,
    Path((_user, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = begin(&state, &headers, format!("send {id}")) {
        return resp;
    }
    StatusCode::ACCEPTED.into_response()
}

async fn send_mail(
    State(state): State<Shared>,
    Path(user): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = begin(&state, &headers, format!("sendMail {user}")) {
        return resp;
    }

    state.lock().unwrap().sent_mail.push(body);
    StatusCode::ACCEPTED.into_response()
}

fn sender(address: &str) -> Value {
    if address.is_empty() {
        Value::Null
    } else {
        json!({ "emailAddress": { "address": address } })
    }
}
