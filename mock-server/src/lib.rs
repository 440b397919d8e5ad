//! In-memory stand-in for the platform's REST API.
//!
//! Covers the endpoints the request engine's integration tests exercise:
//! clients (with comments and related loans), loan accounts (with
//! transactions), users, search, indicators and general settings. Entities
//! are stored as raw JSON so the server sees exactly what clients send.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct Store {
    pub clients: Vec<Value>,
    pub loans: Vec<Value>,
    pub users: Vec<Value>,
    pub comments: HashMap<String, Vec<Value>>,
    pub transactions: HashMap<String, Vec<Value>>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;
type Params = Query<HashMap<String, String>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route(
            "/api/clients/{id}",
            get(get_client).patch(patch_client).delete(delete_client),
        )
        .route("/api/clients/{id}/loans", get(client_loans))
        .route(
            "/api/clients/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/loans", post(create_loan))
        .route("/api/loans/{id}", get(get_loan).patch(patch_loan))
        .route(
            "/api/loans/{id}/transactions",
            get(list_transactions).post(post_transaction),
        )
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", patch(patch_user))
        .route("/api/search", get(search))
        .route("/api/indicators", get(indicators))
        .route("/api/settings/general", get(general_settings))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock platform listening");
    axum::serve(listener, app()).await
}

/// `{"returnCode": code, "returnStatus": status}`
pub fn envelope(code: i64, status: &str) -> Value {
    json!({"returnCode": code, "returnStatus": status})
}

fn success() -> Json<Value> {
    Json(envelope(0, "SUCCESS"))
}

fn reject(status: StatusCode, code: i64, return_status: &str) -> (StatusCode, Json<Value>) {
    (status, Json(envelope(code, return_status)))
}

fn invalid_parameters() -> (StatusCode, Json<Value>) {
    reject(StatusCode::BAD_REQUEST, 4, "INVALID_PARAMETERS")
}

/// Take the object nested under `key` of an enveloped request body.
fn unwrap_body(body: Value, key: &str) -> Result<Map<String, Value>, (StatusCode, Json<Value>)> {
    match body {
        Value::Object(mut root) if root.len() == 1 => match root.remove(key) {
            Some(Value::Object(inner)) => Ok(inner),
            _ => Err(invalid_parameters()),
        },
        _ => Err(invalid_parameters()),
    }
}

fn matches_id(entity: &Value, id: &str) -> bool {
    entity["id"].as_str() == Some(id) || entity["encodedKey"].as_str() == Some(id)
}

fn new_key() -> String {
    Uuid::new_v4().simple().to_string()
}

fn full_details(params: &HashMap<String, String>) -> bool {
    params.get("fullDetails").map(String::as_str) == Some("true")
}

fn page(items: Vec<Value>, params: &HashMap<String, String>) -> Vec<Value> {
    let offset = params
        .get("offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let limit = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

/// Drop detail-only fields unless `fullDetails=true` was requested.
fn summary(mut entity: Value, detail_fields: &[&str], full: bool) -> Value {
    if !full {
        if let Value::Object(map) = &mut entity {
            for field in detail_fields {
                map.remove(*field);
            }
        }
    }
    entity
}

fn is_date_only(value: &Value) -> bool {
    value.as_str().is_some_and(|text| {
        text.len() == 10 && text.chars().enumerate().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        })
    })
}

// --- clients ---

async fn list_clients(State(db): State<Db>, Query(params): Params) -> Json<Value> {
    let store = db.read().await;
    let clients = store
        .clients
        .iter()
        .map(|c| summary(c.clone(), &["addresses"], full_details(&params)))
        .collect();
    Json(Value::Array(page(clients, &params)))
}

async fn create_client(State(db): State<Db>, Json(body): Json<Value>) -> ApiResult {
    let mut client = unwrap_body(body, "client")?;
    if client.get("firstName").and_then(Value::as_str).is_none()
        || client.get("lastName").and_then(Value::as_str).is_none()
    {
        return Err(invalid_parameters());
    }
    let key = new_key();
    client
        .entry("id")
        .or_insert_with(|| Value::String(key[..8].to_uppercase()));
    client.insert("encodedKey".to_string(), Value::String(key));
    client
        .entry("state")
        .or_insert_with(|| Value::String("INACTIVE".to_string()));
    let client = Value::Object(client);
    debug!(id = %client["id"], "created client");
    db.write().await.clients.push(client.clone());
    Ok(Json(client))
}

async fn get_client(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> ApiResult {
    let store = db.read().await;
    store
        .clients
        .iter()
        .find(|c| matches_id(c, &id))
        .map(|c| Json(summary(c.clone(), &["addresses"], full_details(&params))))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, 300, "INVALID_CLIENT_ID"))
}

async fn patch_client(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    let changes = unwrap_body(body, "client")?;
    if changes.contains_key("encodedKey") {
        return Err(invalid_parameters());
    }
    let mut store = db.write().await;
    let client = store
        .clients
        .iter_mut()
        .find(|c| matches_id(c, &id))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, 300, "INVALID_CLIENT_ID"))?;
    if let Value::Object(map) = client {
        map.extend(changes);
    }
    Ok(success())
}

async fn delete_client(State(db): State<Db>, Path(id): Path<String>) -> ApiResult {
    let mut store = db.write().await;
    let before = store.clients.len();
    store.clients.retain(|c| !matches_id(c, &id));
    if store.clients.len() == before {
        return Err(reject(StatusCode::NOT_FOUND, 300, "INVALID_CLIENT_ID"));
    }
    Ok(success())
}

async fn client_loans(State(db): State<Db>, Path(id): Path<String>) -> ApiResult {
    let store = db.read().await;
    let client = store
        .clients
        .iter()
        .find(|c| matches_id(c, &id))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, 300, "INVALID_CLIENT_ID"))?;
    let loans = store
        .loans
        .iter()
        .filter(|loan| {
            let holder = loan["accountHolderKey"].as_str().unwrap_or_default();
            matches_id(client, holder)
        })
        .map(|loan| summary(loan.clone(), &["disbursementDetails"], false))
        .collect();
    Ok(Json(Value::Array(loans)))
}

async fn list_comments(State(db): State<Db>, Path(id): Path<String>) -> Json<Value> {
    let store = db.read().await;
    Json(Value::Array(
        store.comments.get(&id).cloned().unwrap_or_default(),
    ))
}

async fn create_comment(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut comment = unwrap_body(body, "comment")?;
    if comment.get("text").and_then(Value::as_str).is_none() {
        return Err(invalid_parameters());
    }
    let mut store = db.write().await;
    let parent = store
        .clients
        .iter()
        .find(|c| matches_id(c, &id))
        .and_then(|c| c["encodedKey"].as_str().map(str::to_string))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, 300, "INVALID_CLIENT_ID"))?;
    comment.insert("encodedKey".to_string(), Value::String(new_key()));
    comment.insert("parentKey".to_string(), Value::String(parent));
    comment.insert(
        "creationDate".to_string(),
        Value::String("2024-01-01T00:00:00+0000".to_string()),
    );
    let comment = Value::Object(comment);
    store.comments.entry(id).or_default().push(comment.clone());
    Ok(Json(comment))
}

// --- loans ---

async fn create_loan(State(db): State<Db>, Json(body): Json<Value>) -> ApiResult {
    let mut loan = unwrap_body(body, "loanAccount")?;
    if loan.get("accountHolderKey").and_then(Value::as_str).is_none() {
        return Err(invalid_parameters());
    }
    let key = new_key();
    loan.entry("id")
        .or_insert_with(|| Value::String(key[..6].to_uppercase()));
    loan.insert("encodedKey".to_string(), Value::String(key));
    loan.insert(
        "accountState".to_string(),
        Value::String("PENDING_APPROVAL".to_string()),
    );
    let loan = Value::Object(loan);
    db.write().await.loans.push(loan.clone());
    Ok(Json(loan))
}

async fn get_loan(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> ApiResult {
    let store = db.read().await;
    store
        .loans
        .iter()
        .find(|l| matches_id(l, &id))
        .map(|l| Json(summary(l.clone(), &["disbursementDetails"], full_details(&params))))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, 100, "INVALID_LOAN_ACCOUNT_ID"))
}

/// Loan PATCH takes flat, date-only disbursement dates and a comma-joined
/// `fixedDaysOfMonth` string, and stores them back in the nested shape.
async fn patch_loan(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut changes = unwrap_body(body, "loanAccount")?;
    if changes.contains_key("disbursementDetails") {
        return Err(invalid_parameters());
    }
    let mut dates = Map::new();
    for field in ["expectedDisbursementDate", "firstRepaymentDate"] {
        if let Some(value) = changes.remove(field) {
            if !is_date_only(&value) {
                return Err(reject(StatusCode::BAD_REQUEST, 102, "INVALID_DATE"));
            }
            let text = value.as_str().unwrap_or_default();
            dates.insert(field.to_string(), Value::String(format!("{text}T00:00:00+0000")));
        }
    }
    if let Some(days) = changes.get("fixedDaysOfMonth") {
        let Some(text) = days.as_str() else {
            return Err(invalid_parameters());
        };
        let parsed: Result<Vec<u32>, _> = text.split(',').map(str::parse).collect();
        match parsed {
            Ok(days) => {
                changes.insert("fixedDaysOfMonth".to_string(), json!(days));
            }
            Err(_) => return Err(invalid_parameters()),
        }
    }

    let mut store = db.write().await;
    let loan = store
        .loans
        .iter_mut()
        .find(|l| matches_id(l, &id))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, 100, "INVALID_LOAN_ACCOUNT_ID"))?;
    if let Value::Object(map) = loan {
        map.extend(changes);
        if !dates.is_empty() {
            let details = map
                .entry("disbursementDetails")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(details) = details {
                details.extend(dates);
            }
        }
    }
    Ok(success())
}

async fn list_transactions(State(db): State<Db>, Path(id): Path<String>) -> ApiResult {
    let store = db.read().await;
    if !store.loans.iter().any(|l| matches_id(l, &id)) {
        return Err(reject(StatusCode::NOT_FOUND, 100, "INVALID_LOAN_ACCOUNT_ID"));
    }
    Ok(Json(Value::Array(
        store.transactions.get(&id).cloned().unwrap_or_default(),
    )))
}

async fn post_transaction(
    State(db): State<Db>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult {
    let kind = form.get("type").ok_or_else(invalid_parameters)?;
    let amount: f64 = form
        .get("amount")
        .and_then(|a| a.parse().ok())
        .filter(|a: &f64| *a > 0.0)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, 101, "INVALID_AMOUNT"))?;

    let mut store = db.write().await;
    if !store.loans.iter().any(|l| matches_id(l, &id)) {
        return Err(reject(StatusCode::NOT_FOUND, 100, "INVALID_LOAN_ACCOUNT_ID"));
    }
    let history = store.transactions.entry(id).or_default();
    let transaction = json!({
        "encodedKey": new_key(),
        "transactionId": history.len() as i64 + 1,
        "type": kind,
        "amount": amount,
        "entryDate": "2024-01-02T00:00:00+0000",
        "notes": form.get("notes"),
    });
    history.push(transaction.clone());
    Ok(Json(transaction))
}

// --- users ---

async fn create_user(State(db): State<Db>, Json(body): Json<Value>) -> ApiResult {
    let mut user = unwrap_body(body, "user")?;
    if user.contains_key("role") || user.get("username").and_then(Value::as_str).is_none() {
        return Err(invalid_parameters());
    }
    user.insert("encodedKey".to_string(), Value::String(new_key()));
    if let Some(role) = user.remove("userRole") {
        user.insert("role".to_string(), role);
    }
    let user = Value::Object(user);
    db.write().await.users.push(user.clone());
    Ok(Json(user))
}

async fn patch_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut changes = unwrap_body(body, "user")?;
    if changes.contains_key("role") {
        return Err(invalid_parameters());
    }
    let mut store = db.write().await;
    let user = store
        .users
        .iter_mut()
        .find(|u| matches_id(u, &id) || u["username"].as_str() == Some(id.as_str()))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, 301, "INVALID_USER_ID"))?;
    if let Some(key) = changes.remove("roleKey") {
        changes.insert("role".to_string(), json!({"encodedKey": key}));
    }
    if let Value::Object(map) = user {
        map.extend(changes);
    }
    Ok(success())
}

// --- search, indicators, settings ---

async fn search(State(db): State<Db>, Query(params): Params) -> Json<Value> {
    let query = params
        .get("query")
        .map(|q| q.to_lowercase())
        .unwrap_or_default();
    let store = db.read().await;
    let hits: Vec<Value> = store
        .clients
        .iter()
        .filter_map(|c| {
            let name = format!(
                "{} {}",
                c["firstName"].as_str().unwrap_or_default(),
                c["lastName"].as_str().unwrap_or_default()
            );
            name.to_lowercase().contains(&query).then(|| {
                json!({
                    "resultType": "CLIENT",
                    "resultID": c["id"],
                    "displayString": name,
                })
            })
        })
        .collect();
    Json(json!({ "CLIENT": hits }))
}

async fn indicators(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    Json(json!({
        "numberOfClients": store.clients.len().to_string(),
        "numberOfLoans": store.loans.len().to_string(),
    }))
}

async fn general_settings() -> Json<Value> {
    Json(json!({
        "decimalSeparator": "PERIOD",
        "dateFormats": {"LONG_DATE_FORMAT": "dd-MM-yyyy"}
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_has_code_and_status() {
        assert_eq!(
            envelope(0, "SUCCESS"),
            json!({"returnCode": 0, "returnStatus": "SUCCESS"})
        );
    }

    #[test]
    fn unwrap_body_requires_single_named_key() {
        assert!(unwrap_body(json!({"client": {"id": "1"}}), "client").is_ok());
        assert!(unwrap_body(json!({"client": {}, "extra": 1}), "client").is_err());
        assert!(unwrap_body(json!({"id": "1"}), "client").is_err());
        assert!(unwrap_body(json!({"client": "x"}), "client").is_err());
    }

    #[test]
    fn date_only_detection() {
        assert!(is_date_only(&json!("2020-01-01")));
        assert!(!is_date_only(&json!("2020-01-01T00:00:00+0000")));
        assert!(!is_date_only(&json!("20200101xx")));
        assert!(!is_date_only(&json!(20200101)));
    }

    #[test]
    fn summary_strips_detail_fields_unless_full() {
        let entity = json!({"id": "1", "addresses": []});
        assert_eq!(summary(entity.clone(), &["addresses"], false), json!({"id": "1"}));
        assert_eq!(summary(entity.clone(), &["addresses"], true), entity);
    }

    #[test]
    fn paging_applies_offset_and_limit() {
        let items = vec![json!(1), json!(2), json!(3)];
        let params = HashMap::from([
            ("offset".to_string(), "1".to_string()),
            ("limit".to_string(), "1".to_string()),
        ]);
        assert_eq!(page(items, &params), vec![json!(2)]);
    }
}
