//! Authorization resource (`/authorization`).
//!
//! `GetList` and `Count` share their filter fields through
//! `AuthorizationQuery`, so a count built from the same filter serializes
//! to exactly the same query string as the list it counts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpResponse};
use crate::load::{self, Load};
use crate::param::{Param, SORT_ORDER};
use crate::request::{CamundaRequest, Endpoint};
use crate::resource::{Link, ResourceType};
use crate::response;

pub const URL_SUFFIX: &str = "/authorization";

/// Whether an authorization is global, grants or revokes permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationType {
    Global = 0,
    Grant = 1,
    Revoke = 2,
}

impl AuthorizationType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

impl fmt::Display for AuthorizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for AuthorizationType {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Global),
            1 => Ok(Self::Grant),
            2 => Ok(Self::Revoke),
            other => Err(Error::invalid_enum("authorization type", other)),
        }
    }
}

/// Accepts the name (`grant`) or the numeric code (`1`).
impl FromStr for AuthorizationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "global" => Ok(Self::Global),
            "grant" => Ok(Self::Grant),
            "revoke" => Ok(Self::Revoke),
            other => other
                .parse::<i64>()
                .map_err(|_| Error::invalid_enum("authorization type", other))
                .and_then(Self::try_from),
        }
    }
}

/// An authorization as returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorization {
    pub id: String,
    pub authorization_type: AuthorizationType,
    pub permissions: Vec<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub links: Option<Vec<Link>>,
    pub root_process_instance_id: Option<String>,
    pub removal_time: Option<DateTime<FixedOffset>>,
}

impl Load for Authorization {
    fn load(data: &Value) -> Result<Self> {
        let data = load::object(data)?;
        Ok(Self {
            id: load::required(data, "id")?,
            authorization_type: load::required_with(data, "type", |v| {
                v.as_i64()
                    .ok_or_else(|| Error::invalid_enum("authorization type", v))
                    .and_then(AuthorizationType::try_from)
            })?,
            permissions: load::required(data, "permissions")?,
            user_id: load::required(data, "userId")?,
            group_id: load::required(data, "groupId")?,
            resource_type: load::required_with(data, "resourceType", ResourceType::from_json)?,
            resource_id: load::required(data, "resourceId")?,
            links: load::optional_with(data, "links", load::load_list)?,
            root_process_instance_id: load::optional(data, "rootProcessInstanceId")?,
            removal_time: load::optional_with(data, "removalTime", load::datetime)?,
        })
    }
}

/// Filters shared by `GetList` and `Count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationQuery {
    pub id: Option<String>,
    pub authorization_type: Option<AuthorizationType>,
    /// Matches when the user id is one of these.
    pub user_id_in: Option<Vec<String>>,
    /// Matches when the group id is one of these.
    pub group_id_in: Option<Vec<String>>,
    pub resource_type: Option<ResourceType>,
    pub resource_id: Option<String>,
}

impl AuthorizationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, authorization_type: AuthorizationType) -> Self {
        self.authorization_type = Some(authorization_type);
        self
    }

    pub fn with_user_id_in<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_id_in = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_group_id_in<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_id_in = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

trait Filtered {
    fn filter(&self) -> &AuthorizationQuery;
}

fn filter_parameters<R: Filtered>() -> Vec<Param<R>> {
    vec![
        Param::query("id", |r: &R| r.filter().id.clone().map(Value::from)),
        Param::query("type", |r: &R| r.filter().authorization_type.map(|t| Value::from(t.code()))),
        Param::query("userIdIn", |r: &R| r.filter().user_id_in.clone().map(Value::from)),
        Param::query("groupIdIn", |r: &R| r.filter().group_id_in.clone().map(Value::from)),
        Param::query("resourceType", |r: &R| {
            r.filter().resource_type.map(|t| Value::from(t.as_str()))
        }),
        Param::query("resourceId", |r: &R| r.filter().resource_id.clone().map(Value::from)),
    ]
}

/// Query authorizations. The size of the full result is available via `Count`.
#[derive(Debug, Clone, PartialEq)]
pub struct GetList {
    url: String,
    pub filter: AuthorizationQuery,
    /// Engine sort key; `resource_type` and `resource_id` are accepted as aliases.
    pub sort_by: Option<String>,
    pub ascending: bool,
    pub first_result: Option<u64>,
    pub max_results: Option<u64>,
}

impl GetList {
    pub fn new(url: &str) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}"),
            filter: AuthorizationQuery::default(),
            sort_by: None,
            ascending: true,
            first_result: None,
            max_results: None,
        }
    }

    pub fn with_filter(mut self, filter: AuthorizationQuery) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, ascending: bool) -> Self {
        self.sort_by = Some(sort_by.into());
        self.ascending = ascending;
        self
    }

    pub fn with_page(mut self, first_result: u64, max_results: u64) -> Self {
        self.first_result = Some(first_result);
        self.max_results = Some(max_results);
        self
    }
}

impl Filtered for GetList {
    fn filter(&self) -> &AuthorizationQuery {
        &self.filter
    }
}

impl CamundaRequest for GetList {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        let mut params = filter_parameters();
        params.extend([
            Param::query("sortBy", |r: &Self| r.sort_by.clone().map(Value::from))
                .with_mapping(&[("resource_type", "resourceType"), ("resource_id", "resourceId")]),
            Param::query("sortOrder", |r: &Self| Some(Value::Bool(r.ascending)))
                .with_mapping(SORT_ORDER)
                .provided_if(|r: &Self| r.sort_by.is_some()),
            Param::query("firstResult", |r: &Self| r.first_result.map(Value::from)),
            Param::query("maxResults", |r: &Self| r.max_results.map(Value::from)),
        ]);
        params
    }
}

impl Endpoint for GetList {
    type Output = Vec<Authorization>;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<Self::Output> {
        response::parse_list(response)
    }
}

/// Count the authorizations matching a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Count {
    url: String,
    pub filter: AuthorizationQuery,
}

impl Count {
    pub fn new(url: &str) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/count"),
            filter: AuthorizationQuery::default(),
        }
    }

    pub fn with_filter(mut self, filter: AuthorizationQuery) -> Self {
        self.filter = filter;
        self
    }
}

impl Filtered for Count {
    fn filter(&self) -> &AuthorizationQuery {
        &self.filter
    }
}

impl CamundaRequest for Count {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        filter_parameters()
    }
}

impl Endpoint for Count {
    type Output = u64;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<u64> {
        response::parse_count(response)
    }
}

/// Fetch one authorization by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Get {
    url: String,
    pub id: String,
}

impl Get {
    pub fn new(url: &str, id: impl Into<String>) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}"),
            id: id.into(),
        }
    }
}

impl CamundaRequest for Get {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![Param::path("id", |r: &Self| Some(Value::from(r.id.as_str())))]
    }
}

impl Endpoint for Get {
    type Output = Authorization;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<Authorization> {
        response::parse_one(response)
    }
}

/// Create an authorization for a user or a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Create {
    url: String,
    pub authorization_type: AuthorizationType,
    pub permissions: Vec<String>,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
}

impl Create {
    pub fn new<I, S>(
        url: &str,
        authorization_type: AuthorizationType,
        permissions: I,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url: format!("{url}{URL_SUFFIX}/create"),
            authorization_type,
            permissions: permissions.into_iter().map(Into::into).collect(),
            resource_type,
            resource_id: resource_id.into(),
            user_id: None,
            group_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

impl CamundaRequest for Create {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![
            Param::body("type", |r: &Self| Some(Value::from(r.authorization_type.code()))),
            Param::body("permissions", |r: &Self| Some(Value::from(r.permissions.clone()))),
            Param::body("userId", |r: &Self| r.user_id.clone().map(Value::from)),
            Param::body("groupId", |r: &Self| r.group_id.clone().map(Value::from)),
            Param::body("resourceType", |r: &Self| Some(Value::from(r.resource_type.code()))),
            Param::body("resourceId", |r: &Self| Some(Value::from(r.resource_id.as_str()))),
        ]
    }
}

impl Endpoint for Create {
    type Output = Authorization;

    const METHOD: HttpMethod = HttpMethod::Post;

    fn parse(&self, response: HttpResponse) -> Result<Authorization> {
        response::parse_one(response)
    }
}

/// Replace the permissions and target of an existing authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    url: String,
    pub id: String,
    pub permissions: Vec<String>,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
}

impl Update {
    pub fn new<I, S>(
        url: &str,
        id: impl Into<String>,
        permissions: I,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}"),
            id: id.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
            resource_type,
            resource_id: resource_id.into(),
            user_id: None,
            group_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

impl CamundaRequest for Update {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![
            Param::path("id", |r: &Self| Some(Value::from(r.id.as_str()))),
            Param::body("permissions", |r: &Self| Some(Value::from(r.permissions.clone()))),
            Param::body("userId", |r: &Self| r.user_id.clone().map(Value::from)),
            Param::body("groupId", |r: &Self| r.group_id.clone().map(Value::from)),
            Param::body("resourceType", |r: &Self| Some(Value::from(r.resource_type.code()))),
            Param::body("resourceId", |r: &Self| Some(Value::from(r.resource_id.as_str()))),
        ]
    }
}

impl Endpoint for Update {
    type Output = ();

    const METHOD: HttpMethod = HttpMethod::Put;

    fn parse(&self, response: HttpResponse) -> Result<()> {
        response::parse_empty(response)
    }
}

/// Delete an authorization by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    url: String,
    pub id: String,
}

impl Delete {
    pub fn new(url: &str, id: impl Into<String>) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/{{id}}"),
            id: id.into(),
        }
    }
}

impl CamundaRequest for Delete {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        vec![Param::path("id", |r: &Self| Some(Value::from(r.id.as_str())))]
    }
}

impl Endpoint for Delete {
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

    const URL: &str = "http://localhost:8080/engine-rest";

    fn full_json() -> Value {
        json!({
            "id": "auth-1",
            "type": 1,
            "permissions": ["READ", "UPDATE"],
            "userId": "demo",
            "groupId": null,
            "resourceType": 6,
            "resourceId": "invoice",
            "links": [
                {"method": "GET", "href": "http://localhost:8080/engine-rest/authorization/auth-1", "rel": "self"},
                {"method": "DELETE", "href": "http://localhost:8080/engine-rest/authorization/auth-1", "rel": "delete"}
            ],
            "rootProcessInstanceId": "pi-9",
            "removalTime": "2021-03-04T10:00:00.000+0100"
        })
    }

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn get_list_with_resource_type_only() {
        let request = GetList::new(URL)
            .with_filter(AuthorizationQuery::new().with_resource_type("process-definition".parse().unwrap()));
        assert_eq!(request.query_parameters(), query(&[("resourceType", "process-definition")]));
        assert!(request.body_parameters().is_empty());
        assert_eq!(request.resolved_url().unwrap(), format!("{URL}/authorization"));
    }

    #[test]
    fn get_list_serializes_all_filters() {
        let request = GetList::new(URL)
            .with_filter(
                AuthorizationQuery::new()
                    .with_id("auth-1")
                    .with_type(AuthorizationType::Revoke)
                    .with_user_id_in(["anna", "ben"])
                    .with_group_id_in(["sales"])
                    .with_resource_id("invoice"),
            )
            .with_sort("resource_id", false)
            .with_page(10, 20);
        assert_eq!(
            request.query_parameters(),
            query(&[
                ("id", "auth-1"),
                ("type", "2"),
                ("userIdIn", "anna,ben"),
                ("groupIdIn", "sales"),
                ("resourceId", "invoice"),
                ("sortBy", "resourceId"),
                ("sortOrder", "desc"),
                ("firstResult", "10"),
                ("maxResults", "20"),
            ])
        );
    }

    #[test]
    fn sort_order_requires_sort_by() {
        let mut request = GetList::new(URL);
        request.ascending = false;
        assert!(!request.query_parameters().contains_key("sortOrder"));

        request.sort_by = Some("id".to_string());
        assert_eq!(request.query_parameters().get("sortOrder").map(String::as_str), Some("desc"));

        request.ascending = true;
        assert_eq!(request.query_parameters().get("sortOrder").map(String::as_str), Some("asc"));
    }

    #[test]
    fn count_shares_list_serialization() {
        let filter = AuthorizationQuery::new()
            .with_type(AuthorizationType::Grant)
            .with_user_id_in(["demo"]);
        let list = GetList::new(URL).with_filter(filter.clone());
        let count = Count::new(URL).with_filter(filter);
        assert_eq!(count.query_parameters(), list.query_parameters());
        assert_eq!(count.resolved_url().unwrap(), format!("{URL}/authorization/count"));
    }

    #[test]
    fn get_resolves_id_into_url() {
        let request = Get::new(URL, "X");
        let url = request.resolved_url().unwrap();
        assert_eq!(url, format!("{URL}/authorization/X"));
        assert!(!url.contains('{'));
        assert!(request.query_parameters().is_empty());
    }

    #[test]
    fn create_builds_post_with_codes_in_body() {
        let request = Create::new(URL, AuthorizationType::Grant, ["READ"], ResourceType::ProcessDefinition, "*")
            .with_group_id("accounting");
        let http = request.build().unwrap();
        assert_eq!(http.method, HttpMethod::Post);
        assert_eq!(http.url, format!("{URL}/authorization/create"));
        let body: Value = serde_json::from_str(http.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"type": 1, "permissions": ["READ"], "groupId": "accounting", "resourceType": 6, "resourceId": "*"})
        );
    }

    #[test]
    fn update_puts_to_id_without_type() {
        let request = Update::new(URL, "auth-1", ["ALL"], ResourceType::Task, "task-7").with_user_id("demo");
        let http = request.build().unwrap();
        assert_eq!(http.method, HttpMethod::Put);
        assert_eq!(http.url, format!("{URL}/authorization/auth-1"));
        let body = request.body_parameters();
        assert!(!body.contains_key("type"));
        assert!(!body.contains_key("groupId"));
        assert_eq!(body["userId"], "demo");
    }

    #[test]
    fn delete_has_no_body() {
        let http = Delete::new(URL, "auth-1").build().unwrap();
        assert_eq!(http.method, HttpMethod::Delete);
        assert!(http.body.is_none());
        assert!(http.headers.is_empty());
    }

    #[test]
    fn loads_full_authorization() {
        let auth = Authorization::load(&full_json()).unwrap();
        assert_eq!(auth.id, "auth-1");
        assert_eq!(auth.authorization_type, AuthorizationType::Grant);
        assert_eq!(auth.permissions, vec!["READ", "UPDATE"]);
        assert_eq!(auth.user_id.as_deref(), Some("demo"));
        assert_eq!(auth.group_id, None);
        assert_eq!(auth.resource_type, ResourceType::ProcessDefinition);
        let links = auth.links.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].rel, "self");
        assert_eq!(links[1].rel, "delete");
        assert_eq!(auth.root_process_instance_id.as_deref(), Some("pi-9"));
        assert_eq!(
            auth.removal_time.unwrap(),
            load::parse_datetime("2021-03-04T10:00:00+01:00").unwrap()
        );
    }

    #[test]
    fn loads_without_optional_fields() {
        let mut data = full_json();
        let map = data.as_object_mut().unwrap();
        map.remove("links");
        map.remove("rootProcessInstanceId");
        map.remove("removalTime");

        let auth = Authorization::load(&data).unwrap();
        assert_eq!(auth.links, None);
        assert_eq!(auth.root_process_instance_id, None);
        assert_eq!(auth.removal_time, None);
    }

    #[test]
    fn rejects_out_of_range_type() {
        let mut data = full_json();
        data["type"] = json!(7);
        let err = Authorization::load(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidEnumValue { kind: "authorization type", .. }));
    }

    #[test]
    fn missing_required_field_fails() {
        let mut data = full_json();
        data.as_object_mut().unwrap().remove("resourceId");
        assert!(matches!(Authorization::load(&data), Err(Error::MissingField("resourceId"))));
    }

    #[test]
    fn authorization_type_parses_names_and_codes() {
        assert_eq!("grant".parse::<AuthorizationType>().unwrap(), AuthorizationType::Grant);
        assert_eq!("0".parse::<AuthorizationType>().unwrap(), AuthorizationType::Global);
        assert!("allow".parse::<AuthorizationType>().is_err());
    }
}
