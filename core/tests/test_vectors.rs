//! Verify request building and response parsing against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector names a catalog operation, its inputs and the expected wire
//! form. Payloads are compared as parsed JSON, not raw strings, so field
//! ordering never causes false negatives.

use std::sync::Arc;

use mambu_core::{
    ApiCatalog, ApiEntity, ApiError, ApiRequest, Client, Comment, HttpMethod, HttpRequest,
    HttpResponse, LoanAccount, Outcome, Registry, RequestEngine, RequestSpec, Task, Transport,
    TransportError, User,
};
use serde_json::Value;

const BASE_URL: &str = "https://demo.example.com/api";

/// Vectors never reach the network.
struct Offline;

impl Transport for Offline {
    fn send(&self, _request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Connection("offline".to_string()))
    }
}

fn setup() -> (RequestEngine<Offline>, ApiCatalog) {
    let registry = Arc::new(Registry::standard().unwrap());
    let catalog = ApiCatalog::new(&registry).unwrap();
    (RequestEngine::new(registry, Offline), catalog)
}

fn operation<'a>(catalog: &'a ApiCatalog, name: &str) -> &'a RequestSpec {
    match name {
        "get_client" => &catalog.get_client,
        "get_client_details" => &catalog.get_client_details,
        "get_clients" => &catalog.get_clients,
        "create_client" => &catalog.create_client,
        "patch_client" => &catalog.patch_client,
        "delete_client" => &catalog.delete_client,
        "get_client_loans" => &catalog.get_client_loans,
        "create_client_comment" => &catalog.create_client_comment,
        "get_loan_transactions" => &catalog.get_loan_transactions,
        "post_loan_transaction" => &catalog.post_loan_transaction,
        "patch_loan_account" => &catalog.patch_loan_account,
        "create_user" => &catalog.create_user,
        "patch_user" => &catalog.patch_user,
        "update_task" => &catalog.update_task,
        "search" => &catalog.search,
        "get_indicators" => &catalog.get_indicators,
        "get_general_settings" => &catalog.get_general_settings,
        other => panic!("unknown operation: {other}"),
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn params(case: &Value) -> Vec<(String, String)> {
    case["params"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let pair = pair.as_array().unwrap();
            (
                pair[0].as_str().unwrap().to_string(),
                pair[1].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

fn write_request<E: ApiEntity>(
    engine: &RequestEngine<Offline>,
    spec: &RequestSpec,
    input: &Value,
    object_id: Option<&str>,
) -> HttpRequest {
    let object: E = serde_json::from_value(input.clone()).unwrap();
    engine
        .build_write_request(spec, &object, object_id, None)
        .unwrap()
        .to_http(BASE_URL)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let (engine, catalog) = setup();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let spec = operation(&catalog, case["operation"].as_str().unwrap());
        let expected = &case["expected_request"];

        let req = engine
            .build_request(spec, case["object_id"].as_str(), None, params(case))
            .unwrap()
            .to_http(BASE_URL);

        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected["url"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
        assert_eq!(req.body.as_deref(), expected["body"].as_str(), "{name}: body");
    }
}

#[test]
fn request_error_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let (engine, catalog) = setup();
    for case in vectors["errors"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let spec = operation(&catalog, case["operation"].as_str().unwrap());
        let result = engine.build_request(spec, case["object_id"].as_str(), None, params(case));
        assert!(matches!(result, Err(ApiError::Validation(_))), "{name}: {result:?}");
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[test]
fn payload_test_vectors() {
    let raw = include_str!("../../test-vectors/payloads.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let (engine, catalog) = setup();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let spec = operation(&catalog, case["operation"].as_str().unwrap());
        let input = &case["input"];
        let object_id = case["object_id"].as_str();

        let req = match case["entity"].as_str().unwrap() {
            "Client" => write_request::<Client>(&engine, spec, input, object_id),
            "LoanAccount" => write_request::<LoanAccount>(&engine, spec, input, object_id),
            "User" => write_request::<User>(&engine, spec, input, object_id),
            "Comment" => write_request::<Comment>(&engine, spec, input, object_id),
            "Task" => write_request::<Task>(&engine, spec, input, object_id),
            other => panic!("{name}: unknown entity {other}"),
        };

        let expected = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected["url"].as_str().unwrap()), "{name}: url");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json; charset=UTF-8".to_string())],
            "{name}: headers"
        );

        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, case["expected_payload"], "{name}: payload");
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

#[test]
fn success_response_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let (engine, catalog) = setup();
    for case in vectors["success"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let outcome: Outcome<Value> = engine
            .parse_response(&catalog.delete_client, response(200, case["body"].as_str().unwrap()))
            .unwrap();
        assert_eq!(
            outcome.into_success().unwrap(),
            case["expected"].as_bool().unwrap(),
            "{name}"
        );
    }
}

#[test]
fn error_response_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let (engine, catalog) = setup();
    for case in vectors["errors"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let expected = &case["expected"];

        let err = engine
            .parse_response::<Client>(&catalog.get_client, response(status, case["body"].as_str().unwrap()))
            .unwrap_err();
        assert_eq!(err.is_not_found(), expected["not_found"].as_bool().unwrap(), "{name}: not_found");

        let ApiError::Remote(remote) = err else {
            panic!("{name}: expected a remote error");
        };
        assert_eq!(remote.status.map(u64::from), expected["status"].as_u64(), "{name}: status");
        assert_eq!(remote.error_code(), expected["error_code"].as_i64(), "{name}: error_code");
        assert_eq!(
            remote.return_status().as_deref(),
            expected["return_status"].as_str(),
            "{name}: return_status"
        );
    }
}
