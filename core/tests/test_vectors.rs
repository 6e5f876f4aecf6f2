//! Verify build/parse against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Query pairs are compared as maps so
//! parameter order does not matter.

use std::collections::BTreeMap;

use camunda_core::authorization::{AuthorizationQuery, AuthorizationType, GetList};
use camunda_core::process_instance::VariablesGet;
use camunda_core::{Endpoint, Error, HttpMethod, HttpRequest, HttpResponse, VariableValue};
use serde_json::Value;

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// A string body is sent verbatim; anything else is encoded as JSON.
fn simulated_response(case: &Value) -> HttpResponse {
    let response = &case["response"];
    let status = response["status"].as_u64().unwrap() as u16;
    let body = match &response["body"] {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    HttpResponse::new(status, body)
}

fn assert_request(name: &str, base_url: &str, request: &HttpRequest, expected: &Value) {
    assert_eq!(request.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(request.url, format!("{base_url}{}", expected["path"].as_str().unwrap()), "{name}: url");

    let query: BTreeMap<&str, &str> = request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let expected_query: BTreeMap<&str, &str> = expected["query"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str().unwrap()))
        .collect();
    assert_eq!(query, expected_query, "{name}: query");
    assert!(request.body.is_none(), "{name}: GET carries no body");
}

fn assert_error(name: &str, err: Error, expected: &Value) {
    assert_eq!(err.status_code(), expected["status"].as_u64().map(|s| s as u16), "{name}: status");
    match (&err, expected["type"].as_str()) {
        (Error::Engine { kind, .. }, Some(expected_kind)) => assert_eq!(kind, expected_kind, "{name}: type"),
        (Error::Status { .. }, None) => {}
        (other, kind) => panic!("{name}: expected error type {kind:?}, got {other:?}"),
    }
}

fn authorization_request(base_url: &str, input: &Value) -> GetList {
    let mut filter = AuthorizationQuery::new();
    if let Some(code) = input["type"].as_i64() {
        filter = filter.with_type(AuthorizationType::try_from(code).unwrap());
    }
    if let Some(users) = input["userIdIn"].as_array() {
        filter = filter.with_user_id_in(users.iter().map(|u| u.as_str().unwrap()));
    }
    if let Some(resource_type) = input["resourceType"].as_str() {
        filter = filter.with_resource_type(resource_type.parse().unwrap());
    }

    let mut request = GetList::new(base_url).with_filter(filter);
    if let Some(sort_by) = input["sortBy"].as_str() {
        request = request.with_sort(sort_by, input["ascending"].as_bool().unwrap_or(true));
    }
    if let (Some(first), Some(max)) = (input["firstResult"].as_u64(), input["maxResults"].as_u64()) {
        request = request.with_page(first, max);
    }
    request
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[test]
fn authorization_test_vectors() {
    let raw = include_str!("../../test-vectors/authorization.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let request = authorization_request(base_url, &case["input"]);

        // Verify build
        let http = request.build().unwrap();
        assert_request(name, base_url, &http, &case["expected_request"]);

        // Verify parse
        let result = request.parse(simulated_response(case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
            continue;
        }

        let authorizations = result.unwrap();
        let expected = case["expected"].as_array().unwrap();
        assert_eq!(authorizations.len(), expected.len(), "{name}: count");
        for (actual, expected) in authorizations.iter().zip(expected) {
            assert_eq!(actual.id, expected["id"].as_str().unwrap(), "{name}: id");
            assert_eq!(actual.authorization_type.as_str(), expected["type"].as_str().unwrap(), "{name}: type");
            assert_eq!(
                actual.resource_type.as_str(),
                expected["resourceType"].as_str().unwrap(),
                "{name}: resourceType"
            );
            assert_eq!(actual.user_id.as_deref(), expected["userId"].as_str(), "{name}: userId");
            assert_eq!(actual.group_id.as_deref(), expected["groupId"].as_str(), "{name}: groupId");
        }
    }
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

#[test]
fn variable_test_vectors() {
    let raw = include_str!("../../test-vectors/variables.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let instance = input["processInstanceId"].as_str().unwrap();
        let var_name = input["varName"].as_str().unwrap();
        let request = if input["binary"].as_bool().unwrap() {
            VariablesGet::binary(base_url, instance, var_name)
        } else {
            VariablesGet::new(base_url, instance, var_name)
        };

        // Verify build
        let http = request.build().unwrap();
        assert_request(name, base_url, &http, &case["expected_request"]);

        // Verify parse
        let result = request.parse(simulated_response(case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
            continue;
        }

        let expected = &case["expected"];
        match result.unwrap() {
            VariableValue::Typed(variable) => {
                assert_eq!(variable.value, expected["value"], "{name}: value");
                assert_eq!(variable.value_type, expected["type"].as_str().unwrap(), "{name}: type");
            }
            VariableValue::Binary(bytes) => {
                assert_eq!(bytes, expected["binary"].as_str().unwrap().as_bytes(), "{name}: bytes");
            }
        }
    }
}
