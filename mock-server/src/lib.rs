use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// `METHOD /path?query` for every call except reads of the log itself.
pub type CallLog = Arc<RwLock<Vec<String>>>;

pub fn app() -> Router {
    let log: CallLog = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/cookies", get(read_cookies))
        .route("/cookies/set", get(set_cookies))
        .route("/redirect/{hops}", get(redirect))
        .route("/login", any(login))
        .route("/big/{bytes}", get(big))
        .route("/slow/{millis}", get(slow))
        .route("/auth", get(auth))
        .route("/log", get(read_log))
        .layer(middleware::from_fn_with_state(log.clone(), record_call))
        .with_state(log)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn record_call(State(log): State<CallLog>, request: Request, next: Next) -> Response {
    if request.uri().path() != "/log" {
        let target = request.uri().to_string();
        debug!(method = %request.method(), %target, "recording call");
        log.write().await.push(format!("{} {target}", request.method()));
    }
    next.run(request).await
}

async fn read_log(State(log): State<CallLog>) -> Json<Vec<String>> {
    Json(log.read().await.clone())
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn set_cookies() -> impl IntoResponse {
    (
        AppendHeaders([
            (SET_COOKIE, "PREF=ID; Path=/; Domain=.google.ru".to_string()),
            (
                SET_COOKIE,
                format!("SID={}; expires=Thu, 04-Feb-2016 17:29:02 GMT; Path=/; HttpOnly", Uuid::new_v4()),
            ),
        ]),
        "cookies set",
    )
}

async fn read_cookies(headers: HeaderMap) -> String {
    headers
        .get(COOKIE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

async fn redirect(Path(hops): Path<u32>) -> Response {
    if hops == 0 {
        return "arrived".into_response();
    }
    Redirect::to(&format!("/redirect/{}", hops - 1)).into_response()
}

/// Sets a session cookie on the redirect itself, then lands on `/redirect/0`.
async fn login() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, "session=abc; Path=/")]),
        Redirect::to("/redirect/0"),
    )
}

async fn big(Path(bytes): Path<usize>) -> Vec<u8> {
    vec![b'x'; bytes]
}

async fn slow(Path(millis): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "slow"
}

async fn auth(headers: HeaderMap) -> Result<String, StatusCode> {
    headers
        .get(AUTHORIZATION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .ok_or(StatusCode::UNAUTHORIZED)
}
