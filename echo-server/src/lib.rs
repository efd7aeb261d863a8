use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    routing::{any, delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// What the server saw of a request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub url: String,
    pub args: BTreeMap<String, String>,
    /// Lower-case header names; repeated headers are joined with `", "`.
    pub headers: BTreeMap<String, String>,
    pub data: String,
    pub json: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UuidBody {
    pub uuid: Uuid,
}

#[derive(Deserialize)]
pub struct RedirectTo {
    pub url: String,
    pub status_code: Option<u16>,
}

pub fn app() -> Router {
    Router::new()
        .route("/get", get(echo).options(preflight))
        .route("/post", post(echo))
        .route("/put", put(echo))
        .route("/patch", patch(echo))
        .route("/delete", delete(echo))
        .route("/anything", any(echo))
        .route("/anything/{*rest}", any(echo))
        .route("/status/{code}", any(status))
        .route("/redirect-to", any(redirect_to))
        .route("/response-headers", get(response_headers))
        .route("/uuid", get(uuid))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(args): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> Json<Echo> {
    tracing::debug!(%method, %uri, body_len = body.len(), "echo");

    let mut echoed: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        echoed
            .entry(name.as_str().to_string())
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    Json(Echo {
        method: method.to_string(),
        url: uri.to_string(),
        args,
        headers: echoed,
        data: String::from_utf8_lossy(&body).into_owned(),
        json: serde_json::from_slice(&body).ok(),
    })
}

async fn preflight() -> (StatusCode, [(HeaderName, &'static str); 1]) {
    (StatusCode::OK, [(header::ALLOW, "GET, HEAD, OPTIONS")])
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn redirect_to(
    Query(target): Query<RedirectTo>,
) -> Result<(StatusCode, [(HeaderName, String); 1]), StatusCode> {
    let status = match target.status_code {
        Some(code) => StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?,
        None => StatusCode::FOUND,
    };
    if !status.is_redirection() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok((status, [(header::LOCATION, target.url)]))
}

/// Sets every query pair as a response header, repeats included.
async fn response_headers(
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<(HeaderMap, Json<Vec<(String, String)>>), StatusCode> {
    let mut headers = HeaderMap::new();
    for (name, value) in &pairs {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| StatusCode::BAD_REQUEST)?;
        let value = HeaderValue::from_str(value).map_err(|_| StatusCode::BAD_REQUEST)?;
        headers.append(name, value);
    }
    Ok((headers, Json(pairs)))
}

async fn uuid() -> Json<UuidBody> {
    Json(UuidBody {
        uuid: Uuid::new_v4(),
    })
}
