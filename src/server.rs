use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Db;
use crate::error::{Error, OrSentinel, Result};
use crate::executor::{Executor, Ttl};

// Database and key used by the demo endpoint.
const DEMO_DB: u8 = 1;
const DEMO_KEY: &str = "20182018";
const DEMO_VALUE: &str = "test-data";
const DEMO_TTL: i64 = 60;

pub async fn run(config: Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let executor = Executor::connect(&config)?;
    let listener = TcpListener::bind((config.bind, config.port)).await?;

    info!(
        backend = ?config.backend,
        db = %executor.db(),
        "kvgate listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, router(executor)).await?;
    Ok(())
}

pub fn router(executor: Executor) -> Router {
    Router::new()
        .route("/redis/getRedis", post(demo))
        .route("/redis/get/:key", get(get_default))
        .route("/redis/set/:key/:value", get(set_default).post(set_default))
        .route(
            "/db/:db/keys/:key",
            get(get_key).put(put_key).delete(delete_key),
        )
        .route("/db/:db/keys/:key/ttl", get(key_ttl))
        .route("/db/:db/keys/:key/expire", post(expire_key))
        .route("/db/:db/keys/:key/incr", post(incr_key))
        .with_state(executor)
}

/// An error reply: the status tells the caller whose fault it was.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Argument(_) => StatusCode::BAD_REQUEST,
            Error::PoolExhausted | Error::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Command(_) => StatusCode::BAD_GATEWAY,
            Error::Serialization(_) | Error::Pool(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn not_found(key: &str) -> Response {
    let body = Json(json!({ "error": format!("no such key: {key}") }));
    (StatusCode::NOT_FOUND, body).into_response()
}

#[derive(Debug, Serialize)]
struct DemoReply {
    success: bool,
    expire: bool,
    data: Option<String>,
}

/// Writes a value in the demo database, gives it a minute to live and reads it back.
///
/// Every step degrades to its empty value on failure, so this always replies 200.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn demo(State(executor): State<Executor>) -> ApiResult<Json<DemoReply>> {
    let executor = executor.with_db(Db::new(DEMO_DB)?);

    let stored = executor.set(DEMO_KEY, DEMO_VALUE).await.is_ok();
    let expire = executor.expire(DEMO_KEY, DEMO_TTL).await.or_sentinel();
    info!(stored, expire, "demo key written");
    let data = executor.get(DEMO_KEY).await.or_sentinel();

    Ok(Json(DemoReply {
        success: data.is_some(),
        expire,
        data,
    }))
}

#[instrument(skip(executor), fields(request_id = %Uuid::new_v4()))]
async fn get_default(
    State(executor): State<Executor>,
    Path(key): Path<String>,
) -> Json<Option<String>> {
    Json(executor.get(&key).await.or_sentinel())
}

/// `true` when the value was stored. Failures are reported in the body, never as a status.
#[instrument(skip(executor), fields(request_id = %Uuid::new_v4()))]
async fn set_default(
    State(executor): State<Executor>,
    Path((key, value)): Path<(String, String)>,
) -> Json<bool> {
    Json(executor.set(&key, &value).await.is_ok())
}

#[instrument(skip(executor), fields(request_id = %Uuid::new_v4()))]
async fn get_key(
    State(executor): State<Executor>,
    Path((db, key)): Path<(u8, String)>,
) -> ApiResult<Response> {
    let executor = executor.with_db(Db::new(db)?);

    let res = match executor.get_bytes(&key).await? {
        Some(value) => {
            ([(header::CONTENT_TYPE, "application/octet-stream")], value).into_response()
        }
        None => not_found(&key),
    };
    Ok(res)
}

#[derive(Debug, Deserialize)]
struct PutParams {
    ttl: Option<u64>,
}

#[instrument(skip(executor, value), fields(request_id = %Uuid::new_v4()))]
async fn put_key(
    State(executor): State<Executor>,
    Path((db, key)): Path<(u8, String)>,
    Query(params): Query<PutParams>,
    value: Bytes,
) -> ApiResult<StatusCode> {
    let executor = executor.with_db(Db::new(db)?);

    match params.ttl {
        Some(ttl) => executor.set_ex(&key, ttl, &value).await?,
        None => executor.set_bytes(&key, &value).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(executor), fields(request_id = %Uuid::new_v4()))]
async fn delete_key(
    State(executor): State<Executor>,
    Path((db, key)): Path<(u8, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    let executor = executor.with_db(Db::new(db)?);

    let deleted = executor.del(&[&key]).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

#[instrument(skip(executor), fields(request_id = %Uuid::new_v4()))]
async fn key_ttl(
    State(executor): State<Executor>,
    Path((db, key)): Path<(u8, String)>,
) -> ApiResult<Response> {
    let executor = executor.with_db(Db::new(db)?);

    let res = match executor.ttl(&key).await? {
        Ttl::Missing => not_found(&key),
        Ttl::Persistent => Json(json!({ "ttl": null })).into_response(),
        Ttl::Expires(left) => Json(json!({ "ttl": left.as_secs() })).into_response(),
    };
    Ok(res)
}

#[derive(Debug, Deserialize)]
struct ExpireParams {
    seconds: i64,
}

#[instrument(skip(executor), fields(request_id = %Uuid::new_v4()))]
async fn expire_key(
    State(executor): State<Executor>,
    Path((db, key)): Path<(u8, String)>,
    Query(params): Query<ExpireParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let executor = executor.with_db(Db::new(db)?);

    let updated = executor.expire(&key, params.seconds).await?;
    Ok(Json(json!({ "updated": updated })))
}

#[derive(Debug, Deserialize)]
struct IncrParams {
    by: Option<i64>,
}

#[instrument(skip(executor), fields(request_id = %Uuid::new_v4()))]
async fn incr_key(
    State(executor): State<Executor>,
    Path((db, key)): Path<(u8, String)>,
    Query(params): Query<IncrParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let executor = executor.with_db(Db::new(db)?);

    let value = executor.incr_by(&key, params.by.unwrap_or(1)).await?;
    Ok(Json(json!({ "value": value })))
}
