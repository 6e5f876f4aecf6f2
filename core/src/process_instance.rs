//! Process instance variables (`/process-instance/{id}/variables`).

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::http::{HttpMethod, HttpResponse};
use crate::load::{self, Load};
use crate::param::Param;
use crate::request::{CamundaRequest, Endpoint};
use crate::response;
use crate::variable::{Variable, VariableInput, VariableValue};

pub const URL_SUFFIX: &str = "/process-instance";

fn process_instance_id<R: HasInstance>() -> Param<R> {
    Param::path("id", |r: &R| Some(Value::from(r.process_instance_id())))
}

trait HasInstance {
    fn process_instance_id(&self) -> &str;
}

/// All variables of a process instance, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablesGetList {
    url: String,
    pub process_instance_id: String,
    /// Let the engine deserialize object values before returning them.
    pub deserialize_values: bool,
}

impl VariablesGetList {
    pub fn new(url: &str, process_instance_id: impl Into<String>) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}/variables"),
            process_instance_id: process_instance_id.into(),
            deserialize_values: true,
        }
    }

    pub fn with_deserialize_values(mut self, deserialize_values: bool) -> Self {
        self.deserialize_values = deserialize_values;
        self
    }
}

impl HasInstance for VariablesGetList {
    fn process_instance_id(&self) -> &str {
        &self.process_instance_id
    }
}

impl CamundaRequest for VariablesGetList {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![
            process_instance_id(),
            Param::query("deserializeValues", |r: &Self| Some(Value::Bool(r.deserialize_values))),
        ]
    }
}

impl Endpoint for VariablesGetList {
    type Output = BTreeMap<String, Variable>;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<Self::Output> {
        response::check_status(&response)?;
        let data = response::json(&response)?;
        load::object(&data)?
            .iter()
            .map(|(name, value)| Variable::load(value).map(|variable| (name.clone(), variable)))
            .collect()
    }
}

/// A single variable of a process instance.
///
/// With `binary` set, the raw content of a `Bytes` or `File` variable is
/// fetched from the `/data` sub-resource instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablesGet {
    url: String,
    pub process_instance_id: String,
    pub var_name: String,
    pub deserialize_value: bool,
    binary: bool,
}

impl VariablesGet {
    pub fn new(url: &str, process_instance_id: impl Into<String>, var_name: impl Into<String>) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}/variables/{{varName}}"),
            process_instance_id: process_instance_id.into(),
            var_name: var_name.into(),
            deserialize_value: true,
            binary: false,
        }
    }

    pub fn binary(url: &str, process_instance_id: impl Into<String>, var_name: impl Into<String>) -> Self {
        let mut request = Self::new(url, process_instance_id, var_name);
        request.url.push_str("/data");
        request.binary = true;
        request
    }

    pub fn with_deserialize_value(mut self, deserialize_value: bool) -> Self {
        self.deserialize_value = deserialize_value;
        self
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }
}

impl HasInstance for VariablesGet {
    fn process_instance_id(&self) -> &str {
        &self.process_instance_id
    }
}

impl CamundaRequest for VariablesGet {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![
            process_instance_id(),
            Param::path("varName", |r: &Self| Some(Value::from(r.var_name.as_str()))),
            Param::query("deserializeValue", |r: &Self| Some(Value::Bool(r.deserialize_value)))
                .provided_if(|r: &Self| !r.binary),
        ]
    }
}

impl Endpoint for VariablesGet {
    type Output = VariableValue;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<VariableValue> {
        if self.binary {
            response::check_status(&response)?;
            return Ok(VariableValue::Binary(response.body));
        }
        response::parse_one(response).map(VariableValue::Typed)
    }
}

/// Set and delete several variables of a process instance in one call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariablesModify {
    url: String,
    pub process_instance_id: String,
    pub modifications: BTreeMap<String, VariableInput>,
    pub deletions: Vec<String>,
}

impl VariablesModify {
    pub fn new(url: &str, process_instance_id: impl Into<String>) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}/variables"),
            process_instance_id: process_instance_id.into(),
            ..Default::default()
        }
    }

    pub fn with_modification(mut self, name: impl Into<String>, variable: VariableInput) -> Self {
        self.modifications.insert(name.into(), variable);
        self
    }

    pub fn with_deletion(mut self, name: impl Into<String>) -> Self {
        self.deletions.push(name.into());
        self
    }
}

impl HasInstance for VariablesModify {
    fn process_instance_id(&self) -> &str {
        &self.process_instance_id
    }
}

impl CamundaRequest for VariablesModify {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![
            process_instance_id(),
            Param::body("modifications", |r: &Self| {
                if r.modifications.is_empty() {
                    return None;
                }
                let modifications: Map<String, Value> = r
                    .modifications
                    .iter()
                    .map(|(name, variable)| (name.clone(), variable.to_json()))
                    .collect();
                Some(Value::Object(modifications))
            })
            .opaque(),
            Param::body("deletions", |r: &Self| {
                (!r.deletions.is_empty()).then(|| Value::from(r.deletions.clone()))
            }),
        ]
    }
}

impl Endpoint for VariablesModify {
    type Output = ();

    const METHOD: HttpMethod = HttpMethod::Post;

    fn parse(&self, response: HttpResponse) -> Result<()> {
        response::parse_empty(response)
    }
}

/// Set one variable of a process instance.
#[derive(Debug, Clone, PartialEq)]
pub struct VariablesUpdate {
    url: String,
    pub process_instance_id: String,
    pub var_name: String,
    pub variable: VariableInput,
}

impl VariablesUpdate {
    pub fn new(
        url: &str,
        process_instance_id: impl Into<String>,
        var_name: impl Into<String>,
        variable: VariableInput,
    ) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}/variables/{{varName}}"),
            process_instance_id: process_instance_id.into(),
            var_name: var_name.into(),
            variable,
        }
    }
}

impl HasInstance for VariablesUpdate {
    fn process_instance_id(&self) -> &str {
        &self.process_instance_id
    }
}

impl CamundaRequest for VariablesUpdate {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![
            process_instance_id(),
            Param::path("varName", |r: &Self| Some(Value::from(r.var_name.as_str()))),
            Param::body("value", |r: &Self| Some(r.variable.value.clone())).opaque(),
            Param::body("type", |r: &Self| r.variable.wire_type().map(Value::from)),
            Param::body("valueInfo", |r: &Self| r.variable.value_info.clone().map(Value::Object)).opaque(),
        ]
    }
}

impl Endpoint for VariablesUpdate {
    type Output = ();

    const METHOD: HttpMethod = HttpMethod::Put;

    fn parse(&self, response: HttpResponse) -> Result<()> {
        response::parse_empty(response)
    }
}

/// Delete one variable of a process instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablesDelete {
    url: String,
    pub process_instance_id: String,
    pub var_name: String,
}

impl VariablesDelete {
    pub fn new(url: &str, process_instance_id: impl Into<String>, var_name: impl Into<String>) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}/variables/{{varName}}"),
            process_instance_id: process_instance_id.into(),
            var_name: var_name.into(),
        }
    }
}

impl HasInstance for VariablesDelete {
    fn process_instance_id(&self) -> &str {
        &self.process_instance_id
    }
}

impl CamundaRequest for VariablesDelete {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![
            process_instance_id(),
            Param::path("varName", |r: &Self| Some(Value::from(r.var_name.as_str()))),
        ]
    }
}

impl Endpoint for VariablesDelete {
    type Output = ();

    const METHOD: HttpMethod = HttpMethod::Delete;

    fn parse(&self, response: HttpResponse) -> Result<()> {
        response::parse_empty(response)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::error::Error;

    const URL: &str = "http://localhost:8080/engine-rest";

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn get_list_params() {
        let request = VariablesGetList::new(URL, "anId").with_deserialize_values(true);
        assert_eq!(request.resolved_url().unwrap(), format!("{URL}/process-instance/anId/variables"));
        assert_eq!(request.query_parameters(), query(&[("deserializeValues", "true")]));
        assert!(request.body_parameters().is_empty());
    }

    #[test]
    fn get_params() {
        let request = VariablesGet::new(URL, "anId", "aVar");
        assert_eq!(request.resolved_url().unwrap(), format!("{URL}/process-instance/anId/variables/aVar"));
        assert_eq!(request.query_parameters(), query(&[("deserializeValue", "true")]));
        assert!(request.body_parameters().is_empty());
    }

    #[test]
    fn binary_get_targets_data_without_deserialize_flag() {
        let request = VariablesGet::binary(URL, "anId", "aVar");
        assert!(request.is_binary());
        assert_eq!(
            request.resolved_url().unwrap(),
            format!("{URL}/process-instance/anId/variables/aVar/data")
        );
        assert!(request.query_parameters().is_empty());
    }

    #[test]
    fn binary_get_returns_raw_bytes() {
        let request = VariablesGet::binary(URL, "anId", "file");
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: vec![0, 159, 146, 150],
        };
        assert_eq!(request.parse(response).unwrap(), VariableValue::Binary(vec![0, 159, 146, 150]));
    }

    #[test]
    fn get_list_parses_map() {
        let body = json!({
            "amount": {"value": 30, "type": "Integer", "valueInfo": {}},
            "approved": {"value": true, "type": "Boolean", "valueInfo": {}}
        });
        let variables = VariablesGetList::new(URL, "anId")
            .parse(HttpResponse::new(200, body.to_string()))
            .unwrap();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables["amount"].value, json!(30));
        assert_eq!(variables["approved"].value_type, "Boolean");
    }

    #[test]
    fn missing_instance_maps_to_engine_error() {
        let response = HttpResponse::new(
            404,
            r#"{"type":"InvalidRequestException","message":"Process instance with id anId does not exist"}"#,
        );
        let err = VariablesGetList::new(URL, "anId").parse(response).unwrap_err();
        assert!(matches!(err, Error::Engine { status: 404, ref message, .. } if message.contains("anId")));
    }

    #[test]
    fn modify_body() {
        let request = VariablesModify::new(URL, "anId")
            .with_modification("amount", VariableInput::new(30).with_type("Integer"))
            .with_deletion("obsolete");
        let http = request.build().unwrap();
        assert_eq!(http.method, HttpMethod::Post);
        assert_eq!(http.url, format!("{URL}/process-instance/anId/variables"));
        let body: Value = serde_json::from_str(http.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "modifications": {"amount": {"value": 30, "type": "Integer"}},
                "deletions": ["obsolete"]
            })
        );
    }

    #[test]
    fn empty_modify_sends_empty_object() {
        let http = VariablesModify::new(URL, "anId").build().unwrap();
        assert_eq!(http.body.as_deref(), Some("{}"));
    }

    #[test]
    fn update_body() {
        let request = VariablesUpdate::new(URL, "anId", "aVar", VariableInput::new("hello"));
        assert_eq!(request.body_parameters(), json!({"value": "hello"}).as_object().unwrap().clone());
        let http = request.build().unwrap();
        assert_eq!(http.method, HttpMethod::Put);
        assert_eq!(http.url, format!("{URL}/process-instance/anId/variables/aVar"));
    }

    #[test]
    fn update_sends_json_value_verbatim() {
        let request = VariablesUpdate::new(
            URL,
            "anId",
            "order",
            VariableInput::new(json!({"a": null, "b": 1})).with_type("Json"),
        );
        let body: Value = serde_json::from_str(request.build().unwrap().body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"value": {"a": null, "b": 1}, "type": "Json"}));
    }

    #[test]
    fn update_sends_empty_value_info() {
        let request = VariablesUpdate::new(URL, "anId", "aVar", VariableInput::new(1).with_value_info(Map::new()));
        assert_eq!(request.body_parameters(), json!({"value": 1, "valueInfo": {}}).as_object().unwrap().clone());
    }

    #[test]
    fn modify_keeps_empty_object_value() {
        let request = VariablesModify::new(URL, "anId")
            .with_modification("empty", VariableInput::new(json!({})))
            .with_modification("partial", VariableInput::new(json!({"a": null})).with_type("Json"));
        let body: Value = serde_json::from_str(request.build().unwrap().body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "modifications": {
                    "empty": {"value": {}},
                    "partial": {"value": {"a": null}, "type": "Json"}
                }
            })
        );
    }

    #[test]
    fn delete_request() {
        let http = VariablesDelete::new(URL, "anId", "aVar").build().unwrap();
        assert_eq!(http.method, HttpMethod::Delete);
        assert_eq!(http.url, format!("{URL}/process-instance/anId/variables/aVar"));
        assert!(http.query.is_empty());
    }
}
