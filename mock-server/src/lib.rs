//! In-memory stand-in for the engine REST API.
//!
//! Serves the authorization, decision definition and process instance
//! variable resources under `/engine-rest`, answering failures with the
//! engine's `{"type", "message"}` error body.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const BASE_PATH: &str = "/engine-rest";

/// Resource type names accepted in query strings, indexed by engine code.
const RESOURCE_TYPES: [&str; 22] = [
    "application",
    "user",
    "group",
    "group-membership",
    "authorization",
    "filter",
    "process-definition",
    "task",
    "process-instance",
    "deployment",
    "decision-definition",
    "tenant",
    "tenant-membership",
    "batch",
    "decision-requirements-definition",
    "report",
    "dashboard",
    "operation-log-category",
    "optimize",
    "historic-task",
    "historic-process-instance",
    "system",
];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub id: String,
    #[serde(rename = "type")]
    pub authorization_type: i64,
    pub permissions: Vec<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub resource_type: i64,
    pub resource_id: String,
    pub links: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_process_instance_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationInput {
    #[serde(rename = "type", default)]
    pub authorization_type: i64,
    pub permissions: Vec<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub resource_type: i64,
    pub resource_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecisionDefinition {
    pub id: String,
    pub key: String,
    pub category: String,
    pub name: Option<String>,
    pub version: i64,
    pub resource: String,
    pub deployment_id: String,
    pub tenant_id: Option<String>,
    pub decision_requirements_definition_id: Option<String>,
    pub decision_requirements_definition_key: Option<String>,
    pub version_tag: Option<String>,
    pub history_time_to_live: Option<i64>,
    #[serde(skip)]
    pub dmn_xml: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredVariable {
    pub value: Value,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value_info: Map<String, Value>,
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInput {
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value_info: Map<String, Value>,
}

impl From<VariableInput> for StoredVariable {
    fn from(input: VariableInput) -> Self {
        let value_type = input.value_type.unwrap_or_else(|| infer_type(&input.value).to_string());
        Self {
            value: input.value,
            value_type,
            value_info: input.value_info,
            data: None,
        }
    }
}

fn infer_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(n) if n.is_i64() => "Integer",
        Value::Number(_) => "Double",
        Value::String(_) => "String",
        Value::Array(_) | Value::Object(_) => "Json",
    }
}

#[derive(Deserialize, Default)]
pub struct VariablesModification {
    #[serde(default)]
    pub modifications: BTreeMap<String, VariableInput>,
    #[serde(default)]
    pub deletions: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Engine {
    pub authorizations: Vec<Authorization>,
    pub decision_definitions: Vec<DecisionDefinition>,
    pub variables: HashMap<String, BTreeMap<String, StoredVariable>>,
}

impl Engine {
    /// An engine with two decision definitions and one running process
    /// instance, `invoice-1`.
    pub fn seeded() -> Self {
        let definition = |version: i64| DecisionDefinition {
            id: format!("invoice-classification:{version}:c3a63aaa"),
            key: "invoice-classification".to_string(),
            category: "http://camunda.org/schema/1.0/dmn".to_string(),
            name: Some("Invoice Classification".to_string()),
            version,
            resource: "invoice.dmn".to_string(),
            deployment_id: format!("deployment-{version}"),
            tenant_id: None,
            decision_requirements_definition_id: None,
            decision_requirements_definition_key: None,
            version_tag: (version > 1).then(|| format!("v{version}")),
            history_time_to_live: Some(30),
            dmn_xml: format!("<definitions id=\"invoice-v{version}\"/>"),
        };

        let mut variables = BTreeMap::new();
        variables.insert(
            "amount".to_string(),
            StoredVariable {
                value: json!(30),
                value_type: "Integer".to_string(),
                value_info: Map::new(),
                data: None,
            },
        );
        variables.insert(
            "creditor".to_string(),
            StoredVariable {
                value: json!("Great Pizza for Everyone Inc."),
                value_type: "String".to_string(),
                value_info: Map::new(),
                data: None,
            },
        );
        let mut file_info = Map::new();
        file_info.insert("filename".to_string(), json!("invoice.pdf"));
        file_info.insert("mimeType".to_string(), json!("application/pdf"));
        variables.insert(
            "invoiceDocument".to_string(),
            StoredVariable {
                value: Value::Null,
                value_type: "File".to_string(),
                value_info: file_info,
                data: Some(b"%PDF-1.4 invoice".to_vec()),
            },
        );

        Self {
            authorizations: Vec::new(),
            decision_definitions: vec![definition(1), definition(2)],
            variables: HashMap::from([("invoice-1".to_string(), variables)]),
        }
    }
}

pub type Db = Arc<RwLock<Engine>>;

/// A failure answered with the engine's error body.
#[derive(Debug)]
pub struct EngineError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl EngineError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "InvalidRequestException",
            message,
        }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "InvalidRequestException",
            message,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"type": self.kind, "message": self.message}))).into_response()
    }
}

pub fn app() -> Router {
    app_with(Engine::seeded())
}

pub fn app_with(engine: Engine) -> Router {
    let db: Db = Arc::new(RwLock::new(engine));
    let api = Router::new()
        .route("/authorization", get(list_authorizations))
        .route("/authorization/count", get(count_authorizations))
        .route("/authorization/create", post(create_authorization))
        .route(
            "/authorization/{id}",
            get(get_authorization).put(update_authorization).delete(delete_authorization),
        )
        .route("/decision-definition", get(list_definitions))
        .route("/decision-definition/count", get(count_definitions))
        .route("/decision-definition/{id}", get(get_definition))
        .route("/decision-definition/{id}/xml", get(get_definition_xml))
        .route("/decision-definition/key/{key}", get(get_definition_by_key))
        .route("/decision-definition/key/{key}/xml", get(get_definition_xml_by_key))
        .route(
            "/decision-definition/key/{key}/tenant-id/{tenant_id}",
            get(get_definition_by_key_and_tenant),
        )
        .route(
            "/process-instance/{id}/variables",
            get(list_variables).post(modify_variables),
        )
        .route(
            "/process-instance/{id}/variables/{name}",
            get(get_variable).put(put_variable).delete(delete_variable),
        )
        .route("/process-instance/{id}/variables/{name}/data", get(get_variable_data))
        .with_state(db);
    Router::new().nest(BASE_PATH, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

fn split_list(value: &Option<String>) -> Option<Vec<&str>> {
    value.as_deref().map(|v| v.split(',').collect())
}

fn parse_resource_type(raw: &str) -> Result<i64, EngineError> {
    if let Ok(code) = raw.parse::<i64>() {
        return Ok(code);
    }
    RESOURCE_TYPES
        .iter()
        .position(|name| *name == raw)
        .map(|index| index as i64)
        .ok_or_else(|| EngineError::bad_request(format!("Unknown resource type {raw}")))
}

fn sort_descending(sort_by: &Option<String>, sort_order: &Option<String>) -> Result<bool, EngineError> {
    match (sort_by, sort_order.as_deref()) {
        (None, None) => Ok(false),
        (Some(_), Some("asc")) => Ok(false),
        (Some(_), Some("desc")) => Ok(true),
        (Some(_), Some(other)) => Err(EngineError::bad_request(format!("Cannot set query parameter 'sortOrder' to value '{other}'"))),
        _ => Err(EngineError::bad_request(
            "Only a single sorting parameter specified. sortBy and sortOrder required".to_string(),
        )),
    }
}

fn paginate<T>(items: Vec<T>, first_result: Option<usize>, max_results: Option<usize>) -> Vec<T> {
    items
        .into_iter()
        .skip(first_result.unwrap_or(0))
        .take(max_results.unwrap_or(usize::MAX))
        .collect()
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationParams {
    id: Option<String>,
    #[serde(rename = "type")]
    authorization_type: Option<i64>,
    user_id_in: Option<String>,
    group_id_in: Option<String>,
    resource_type: Option<String>,
    resource_id: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    first_result: Option<usize>,
    max_results: Option<usize>,
}

fn filter_authorizations(engine: &Engine, params: &AuthorizationParams) -> Result<Vec<Authorization>, EngineError> {
    let resource_type = params.resource_type.as_deref().map(parse_resource_type).transpose()?;
    let user_ids = split_list(&params.user_id_in);
    let group_ids = split_list(&params.group_id_in);

    Ok(engine
        .authorizations
        .iter()
        .filter(|a| params.id.as_ref().map_or(true, |id| &a.id == id))
        .filter(|a| params.authorization_type.map_or(true, |t| a.authorization_type == t))
        .filter(|a| {
            user_ids
                .as_ref()
                .map_or(true, |ids| a.user_id.as_deref().is_some_and(|u| ids.contains(&u)))
        })
        .filter(|a| {
            group_ids
                .as_ref()
                .map_or(true, |ids| a.group_id.as_deref().is_some_and(|g| ids.contains(&g)))
        })
        .filter(|a| resource_type.map_or(true, |t| a.resource_type == t))
        .filter(|a| params.resource_id.as_ref().map_or(true, |r| &a.resource_id == r))
        .cloned()
        .collect())
}

fn authorization_links(id: &str) -> Vec<Value> {
    let href = format!("{BASE_PATH}/authorization/{id}");
    vec![
        json!({"method": "GET", "href": href, "rel": "self"}),
        json!({"method": "PUT", "href": href, "rel": "update"}),
        json!({"method": "DELETE", "href": href, "rel": "delete"}),
    ]
}

fn validate_owner(input: &AuthorizationInput) -> Result<(), EngineError> {
    if input.user_id.is_some() == input.group_id.is_some() {
        return Err(EngineError::bad_request(
            "Authorization must either have a 'userId' or a 'groupId'.".to_string(),
        ));
    }
    Ok(())
}

async fn list_authorizations(
    State(db): State<Db>,
    Query(params): Query<AuthorizationParams>,
) -> Result<Json<Vec<Authorization>>, EngineError> {
    let descending = sort_descending(&params.sort_by, &params.sort_order)?;
    let engine = db.read().await;
    let mut found = filter_authorizations(&engine, &params)?;

    match params.sort_by.as_deref() {
        None => {}
        Some("id") => found.sort_by(|a, b| a.id.cmp(&b.id)),
        Some("resourceType") => found.sort_by_key(|a| a.resource_type),
        Some("resourceId") => found.sort_by(|a, b| a.resource_id.cmp(&b.resource_id)),
        Some(other) => {
            return Err(EngineError::bad_request(format!(
                "Cannot set query parameter 'sortBy' to value '{other}'"
            )))
        }
    }
    if descending {
        found.reverse();
    }

    Ok(Json(paginate(found, params.first_result, params.max_results)))
}

async fn count_authorizations(
    State(db): State<Db>,
    Query(params): Query<AuthorizationParams>,
) -> Result<Json<Value>, EngineError> {
    let engine = db.read().await;
    let count = filter_authorizations(&engine, &params)?.len();
    Ok(Json(json!({ "count": count })))
}

async fn create_authorization(
    State(db): State<Db>,
    Json(input): Json<AuthorizationInput>,
) -> Result<Json<Authorization>, EngineError> {
    validate_owner(&input)?;
    let id = Uuid::new_v4().to_string();
    let authorization = Authorization {
        links: authorization_links(&id),
        id,
        authorization_type: input.authorization_type,
        permissions: input.permissions,
        user_id: input.user_id,
        group_id: input.group_id,
        resource_type: input.resource_type,
        resource_id: input.resource_id,
        removal_time: None,
        root_process_instance_id: None,
    };
    db.write().await.authorizations.push(authorization.clone());
    Ok(Json(authorization))
}

fn authorization_not_found(id: &str) -> EngineError {
    EngineError::not_found(format!("Authorization with id {id} does not exist."))
}

async fn get_authorization(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Authorization>, EngineError> {
    let engine = db.read().await;
    engine
        .authorizations
        .iter()
        .find(|a| a.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| authorization_not_found(&id))
}

async fn update_authorization(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<AuthorizationInput>,
) -> Result<StatusCode, EngineError> {
    validate_owner(&input)?;
    let mut engine = db.write().await;
    let authorization = engine
        .authorizations
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| authorization_not_found(&id))?;
    authorization.permissions = input.permissions;
    authorization.user_id = input.user_id;
    authorization.group_id = input.group_id;
    authorization.resource_type = input.resource_type;
    authorization.resource_id = input.resource_id;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_authorization(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, EngineError> {
    let mut engine = db.write().await;
    let before = engine.authorizations.len();
    engine.authorizations.retain(|a| a.id != id);
    if engine.authorizations.len() == before {
        return Err(authorization_not_found(&id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Decision definitions
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionParams {
    decision_definition_id: Option<String>,
    key: Option<String>,
    name: Option<String>,
    latest_version: Option<bool>,
    tenant_id_in: Option<String>,
    without_tenant_id: Option<bool>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    first_result: Option<usize>,
    max_results: Option<usize>,
}

fn filter_definitions(engine: &Engine, params: &DefinitionParams) -> Vec<DecisionDefinition> {
    let tenants = split_list(&params.tenant_id_in);
    let mut found: Vec<DecisionDefinition> = engine
        .decision_definitions
        .iter()
        .filter(|d| params.decision_definition_id.as_ref().map_or(true, |id| &d.id == id))
        .filter(|d| params.key.as_ref().map_or(true, |key| &d.key == key))
        .filter(|d| params.name.is_none() || d.name == params.name)
        .filter(|d| {
            tenants
                .as_ref()
                .map_or(true, |ids| d.tenant_id.as_deref().is_some_and(|t| ids.contains(&t)))
        })
        .filter(|d| params.without_tenant_id != Some(true) || d.tenant_id.is_none())
        .cloned()
        .collect();

    if params.latest_version == Some(true) {
        let latest: HashMap<String, i64> = found.iter().fold(HashMap::new(), |mut acc, d| {
            let entry = acc.entry(d.key.clone()).or_insert(d.version);
            *entry = (*entry).max(d.version);
            acc
        });
        found.retain(|d| latest.get(&d.key) == Some(&d.version));
    }
    found
}

async fn list_definitions(
    State(db): State<Db>,
    Query(params): Query<DefinitionParams>,
) -> Result<Json<Vec<DecisionDefinition>>, EngineError> {
    let descending = sort_descending(&params.sort_by, &params.sort_order)?;
    let engine = db.read().await;
    let mut found = filter_definitions(&engine, &params);

    match params.sort_by.as_deref() {
        None => {}
        Some("id") => found.sort_by(|a, b| a.id.cmp(&b.id)),
        Some("key") => found.sort_by(|a, b| a.key.cmp(&b.key)),
        Some("version") => found.sort_by_key(|d| d.version),
        Some("deploymentId") => found.sort_by(|a, b| a.deployment_id.cmp(&b.deployment_id)),
        Some(other) => {
            return Err(EngineError::bad_request(format!(
                "Cannot set query parameter 'sortBy' to value '{other}'"
            )))
        }
    }
    if descending {
        found.reverse();
    }

    Ok(Json(paginate(found, params.first_result, params.max_results)))
}

async fn count_definitions(State(db): State<Db>, Query(params): Query<DefinitionParams>) -> Json<Value> {
    let engine = db.read().await;
    Json(json!({ "count": filter_definitions(&engine, &params).len() }))
}

fn find_definition<'a>(engine: &'a Engine, id: &str) -> Result<&'a DecisionDefinition, EngineError> {
    engine
        .decision_definitions
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| EngineError::not_found(format!("No matching decision definition with id {id}")))
}

fn latest_definition<'a>(
    engine: &'a Engine,
    key: &str,
    tenant_id: Option<&str>,
) -> Result<&'a DecisionDefinition, EngineError> {
    engine
        .decision_definitions
        .iter()
        .filter(|d| d.key == key && d.tenant_id.as_deref() == tenant_id)
        .max_by_key(|d| d.version)
        .ok_or_else(|| EngineError::not_found(format!("No matching decision definition with key {key}")))
}

fn xml_of(definition: &DecisionDefinition) -> Json<Value> {
    Json(json!({"id": definition.id, "dmnXml": definition.dmn_xml}))
}

async fn get_definition(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<DecisionDefinition>, EngineError> {
    let engine = db.read().await;
    find_definition(&engine, &id).cloned().map(Json)
}

async fn get_definition_xml(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, EngineError> {
    let engine = db.read().await;
    find_definition(&engine, &id).map(xml_of)
}

async fn get_definition_by_key(
    State(db): State<Db>,
    Path(key): Path<String>,
) -> Result<Json<DecisionDefinition>, EngineError> {
    let engine = db.read().await;
    latest_definition(&engine, &key, None).cloned().map(Json)
}

async fn get_definition_xml_by_key(
    State(db): State<Db>,
    Path(key): Path<String>,
) -> Result<Json<Value>, EngineError> {
    let engine = db.read().await;
    latest_definition(&engine, &key, None).map(xml_of)
}

async fn get_definition_by_key_and_tenant(
    State(db): State<Db>,
    Path((key, tenant_id)): Path<(String, String)>,
) -> Result<Json<DecisionDefinition>, EngineError> {
    let engine = db.read().await;
    latest_definition(&engine, &key, Some(&tenant_id)).cloned().map(Json)
}

// ---------------------------------------------------------------------------
// Process instance variables
// ---------------------------------------------------------------------------

fn instance_not_found(id: &str) -> EngineError {
    EngineError::not_found(format!("Process instance with id {id} does not exist"))
}

fn variable_not_found(id: &str, name: &str) -> EngineError {
    EngineError::not_found(format!("variable {name} not found in scope {id}"))
}

async fn list_variables(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<BTreeMap<String, StoredVariable>>, EngineError> {
    let engine = db.read().await;
    engine
        .variables
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| instance_not_found(&id))
}

async fn modify_variables(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<VariablesModification>,
) -> Result<StatusCode, EngineError> {
    let mut engine = db.write().await;
    let variables = engine.variables.get_mut(&id).ok_or_else(|| instance_not_found(&id))?;
    for (name, variable) in input.modifications {
        variables.insert(name, variable.into());
    }
    for name in input.deletions {
        variables.remove(&name);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn get_variable(
    State(db): State<Db>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Json<StoredVariable>, EngineError> {
    let engine = db.read().await;
    let variables = engine.variables.get(&id).ok_or_else(|| instance_not_found(&id))?;
    variables
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| variable_not_found(&id, &name))
}

async fn get_variable_data(
    State(db): State<Db>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, EngineError> {
    let engine = db.read().await;
    let variables = engine.variables.get(&id).ok_or_else(|| instance_not_found(&id))?;
    let variable = variables.get(&name).ok_or_else(|| variable_not_found(&id, &name))?;
    let data = variable.data.clone().ok_or_else(|| {
        EngineError::bad_request(format!("Value of variable {name} is not a binary value."))
    })?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], Bytes::from(data)).into_response())
}

async fn put_variable(
    State(db): State<Db>,
    Path((id, name)): Path<(String, String)>,
    Json(input): Json<VariableInput>,
) -> Result<StatusCode, EngineError> {
    let mut engine = db.write().await;
    let variables = engine.variables.get_mut(&id).ok_or_else(|| instance_not_found(&id))?;
    variables.insert(name, input.into());
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_variable(
    State(db): State<Db>,
    Path((id, name)): Path<(String, String)>,
) -> Result<StatusCode, EngineError> {
    let mut engine = db.write().await;
    let variables = engine.variables.get_mut(&id).ok_or_else(|| instance_not_found(&id))?;
    variables.remove(&name);
    Ok(StatusCode::NO_CONTENT)
}
