//! Decision definition resource (`/decision-definition`).

use serde_json::Value;

use crate::error::Result;
use crate::http::{HttpMethod, HttpResponse};
use crate::load::{self, Load};
use crate::param::{Param, SORT_ORDER};
use crate::request::{CamundaRequest, Endpoint};
use crate::response;

pub const URL_SUFFIX: &str = "/decision-definition";

/// A deployed DMN decision definition.
#[derive(Debug, Clone, PartialEq, Eq)]
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
}

impl Load for DecisionDefinition {
    fn load(data: &Value) -> Result<Self> {
        let data = load::object(data)?;
        Ok(Self {
            id: load::required(data, "id")?,
            key: load::required(data, "key")?,
            category: load::required(data, "category")?,
            name: load::required(data, "name")?,
            version: load::required(data, "version")?,
            resource: load::required(data, "resource")?,
            deployment_id: load::required(data, "deploymentId")?,
            tenant_id: load::optional(data, "tenantId")?,
            decision_requirements_definition_id: load::optional(data, "decisionRequirementsDefinitionId")?,
            decision_requirements_definition_key: load::optional(data, "decisionRequirementsDefinitionKey")?,
            version_tag: load::optional(data, "versionTag")?,
            history_time_to_live: load::optional(data, "historyTimeToLive")?,
        })
    }
}

/// The DMN XML of a decision definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionXml {
    pub id: String,
    pub dmn_xml: String,
}

impl Load for DecisionXml {
    fn load(data: &Value) -> Result<Self> {
        let data = load::object(data)?;
        Ok(Self {
            id: load::required(data, "id")?,
            dmn_xml: load::required(data, "dmnXml")?,
        })
    }
}

/// Filters shared by `GetList` and `Count`. Build with struct update syntax:
///
/// ```
/// use camunda_core::decision_definition::DecisionDefinitionQuery;
///
/// let filter = DecisionDefinitionQuery {
///     key: Some("invoice-assign-approver".to_string()),
///     latest_version: Some(true),
///     ..Default::default()
/// };
/// assert!(filter.name.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionDefinitionQuery {
    pub decision_definition_id: Option<String>,
    pub decision_definition_id_in: Option<Vec<String>>,
    pub name: Option<String>,
    pub name_like: Option<String>,
    pub deployment_id: Option<String>,
    pub key: Option<String>,
    pub key_like: Option<String>,
    pub category: Option<String>,
    pub category_like: Option<String>,
    pub version: Option<i64>,
    pub latest_version: Option<bool>,
    pub resource_name: Option<String>,
    pub resource_name_like: Option<String>,
    pub decision_requirements_definition_id: Option<String>,
    pub decision_requirements_definition_key: Option<String>,
    pub without_decision_requirements_definition: Option<bool>,
    pub tenant_id_in: Option<Vec<String>>,
    pub without_tenant_id: Option<bool>,
    pub include_decision_definitions_without_tenant_id: Option<bool>,
    pub version_tag: Option<String>,
    pub version_tag_like: Option<String>,
}

trait Filtered {
    fn filter(&self) -> &DecisionDefinitionQuery;
}

fn text(value: &Option<String>) -> Option<Value> {
    value.clone().map(Value::from)
}

fn filter_parameters<R: Filtered>() -> Vec<Param<R>> {
    vec![
        Param::query("decisionDefinitionId", |r: &R| text(&r.filter().decision_definition_id)),
        Param::query("decisionDefinitionIdIn", |r: &R| {
            r.filter().decision_definition_id_in.clone().map(Value::from)
        }),
        Param::query("name", |r: &R| text(&r.filter().name)),
        Param::query("nameLike", |r: &R| text(&r.filter().name_like)),
        Param::query("deploymentId", |r: &R| text(&r.filter().deployment_id)),
        Param::query("key", |r: &R| text(&r.filter().key)),
        Param::query("keyLike", |r: &R| text(&r.filter().key_like)),
        Param::query("category", |r: &R| text(&r.filter().category)),
        Param::query("categoryLike", |r: &R| text(&r.filter().category_like)),
        Param::query("version", |r: &R| r.filter().version.map(Value::from)),
        Param::query("latestVersion", |r: &R| r.filter().latest_version.map(Value::from)),
        Param::query("resourceName", |r: &R| text(&r.filter().resource_name)),
        Param::query("resourceNameLike", |r: &R| text(&r.filter().resource_name_like)),
        Param::query("decisionRequirementsDefinitionId", |r: &R| {
            text(&r.filter().decision_requirements_definition_id)
        }),
        Param::query("decisionRequirementsDefinitionKey", |r: &R| {
            text(&r.filter().decision_requirements_definition_key)
        }),
        Param::query("withoutDecisionRequirementsDefinition", |r: &R| {
            r.filter().without_decision_requirements_definition.map(Value::from)
        }),
        Param::query("tenantIdIn", |r: &R| r.filter().tenant_id_in.clone().map(Value::from)),
        Param::query("withoutTenantId", |r: &R| r.filter().without_tenant_id.map(Value::from)),
        Param::query("includeDecisionDefinitionsWithoutTenantId", |r: &R| {
            r.filter().include_decision_definitions_without_tenant_id.map(Value::from)
        }),
        Param::query("versionTag", |r: &R| text(&r.filter().version_tag)),
        Param::query("versionTagLike", |r: &R| text(&r.filter().version_tag_like)),
    ]
}

const SORT_KEYS: &[(&str, &str)] = &[
    ("deployment_id", "deploymentId"),
    ("tenant_id", "tenantId"),
    ("version_tag", "versionTag"),
    ("decision_requirements_definition_key", "decisionRequirementsDefinitionKey"),
];

/// Query decision definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetList {
    url: String,
    pub filter: DecisionDefinitionQuery,
    pub sort_by: Option<String>,
    pub ascending: bool,
    pub first_result: Option<u64>,
    pub max_results: Option<u64>,
}

impl GetList {
    pub fn new(url: &str) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}"),
            filter: DecisionDefinitionQuery::default(),
            sort_by: None,
            ascending: true,
            first_result: None,
            max_results: None,
        }
    }

    pub fn with_filter(mut self, filter: DecisionDefinitionQuery) -> Self {
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
    fn filter(&self) -> &DecisionDefinitionQuery {
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
            Param::query("sortBy", |r: &Self| text(&r.sort_by)).with_mapping(SORT_KEYS),
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
    type Output = Vec<DecisionDefinition>;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<Self::Output> {
        response::parse_list(response)
    }
}

/// Count the decision definitions matching a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Count {
    url: String,
    pub filter: DecisionDefinitionQuery,
}

impl Count {
    pub fn new(url: &str) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}/count"),
            filter: DecisionDefinitionQuery::default(),
        }
    }

    pub fn with_filter(mut self, filter: DecisionDefinitionQuery) -> Self {
        self.filter = filter;
        self
    }
}

impl Filtered for Count {
    fn filter(&self) -> &DecisionDefinitionQuery {
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

/// How a single decision definition is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionRef {
    Id(String),
    /// Latest version with this key.
    Key(String),
    /// Latest version with this key within a tenant.
    KeyAndTenant { key: String, tenant_id: String },
}

impl DefinitionRef {
    fn template(&self) -> &'static str {
        match self {
            Self::Id(_) => "/{id}",
            Self::Key(_) => "/key/{key}",
            Self::KeyAndTenant { .. } => "/key/{key}/tenant-id/{tenant-id}",
        }
    }

    fn id(&self) -> Option<Value> {
        match self {
            Self::Id(id) => Some(Value::from(id.as_str())),
            _ => None,
        }
    }

    fn key(&self) -> Option<Value> {
        match self {
            Self::Key(key) | Self::KeyAndTenant { key, .. } => Some(Value::from(key.as_str())),
            Self::Id(_) => None,
        }
    }

    fn tenant_id(&self) -> Option<Value> {
        match self {
            Self::KeyAndTenant { tenant_id, .. } => Some(Value::from(tenant_id.as_str())),
            _ => None,
        }
    }
}

trait Referenced {
    fn reference(&self) -> &DefinitionRef;
}

fn path_parameters<R: Referenced>() -> Vec<Param<R>> {
    vec![
        Param::path("id", |r: &R| r.reference().id()),
        Param::path("key", |r: &R| r.reference().key()),
        Param::path("tenant-id", |r: &R| r.reference().tenant_id()),
    ]
}

/// Fetch one decision definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    url: String,
    pub reference: DefinitionRef,
}

impl Get {
    pub fn new(url: &str, reference: DefinitionRef) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}{}", reference.template()),
            reference,
        }
    }

    pub fn by_id(url: &str, id: impl Into<String>) -> Self {
        Self::new(url, DefinitionRef::Id(id.into()))
    }

    pub fn by_key(url: &str, key: impl Into<String>) -> Self {
        Self::new(url, DefinitionRef::Key(key.into()))
    }
}

impl Referenced for Get {
    fn reference(&self) -> &DefinitionRef {
        &self.reference
    }
}

impl CamundaRequest for Get {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        path_parameters()
    }
}

impl Endpoint for Get {
    type Output = DecisionDefinition;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<DecisionDefinition> {
        response::parse_one(response)
    }
}

/// Fetch the DMN XML of a decision definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetXml {
    url: String,
    pub reference: DefinitionRef,
}

impl GetXml {
    pub fn new(url: &str, reference: DefinitionRef) -> Self {
        Self {
            url: format!("{url}{URL_SUFFIX}{}/xml", reference.template()),
            reference,
        }
    }
}

impl Referenced for GetXml {
    fn reference(&self) -> &DefinitionRef {
        &self.reference
    }
}

impl CamundaRequest for GetXml {
    fn url(&self) -> &str {
        &self.url
    }

    fn parameters() -> Vec<Param<Self>> {
        path_parameters()
    }
}

impl Endpoint for GetXml {
    type Output = DecisionXml;

    const METHOD: HttpMethod = HttpMethod::Get;

    fn parse(&self, response: HttpResponse) -> Result<DecisionXml> {
        response::parse_one(response)
    }
}
