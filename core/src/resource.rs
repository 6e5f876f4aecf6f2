//! Types shared across engine resources.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::load::{self, Load};

/// A hypermedia link to a related resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub method: String,
    pub href: String,
    pub rel: String,
}

impl Load for Link {
    fn load(data: &Value) -> Result<Self> {
        let data = load::object(data)?;
        Ok(Self {
            method: load::required(data, "method")?,
            href: load::required(data, "href")?,
            rel: load::required(data, "rel")?,
        })
    }
}

/// Kind of resource an authorization applies to. Discriminants are the
/// engine's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Application = 0,
    User = 1,
    Group = 2,
    GroupMembership = 3,
    Authorization = 4,
    Filter = 5,
    ProcessDefinition = 6,
    Task = 7,
    ProcessInstance = 8,
    Deployment = 9,
    DecisionDefinition = 10,
    Tenant = 11,
    TenantMembership = 12,
    Batch = 13,
    DecisionRequirementsDefinition = 14,
    Report = 15,
    Dashboard = 16,
    OperationLogCategory = 17,
    Optimize = 18,
    HistoricTask = 19,
    HistoricProcessInstance = 20,
    System = 21,
}

impl ResourceType {
    /// All variants, indexed by code.
    pub const ALL: [ResourceType; 22] = [
        Self::Application,
        Self::User,
        Self::Group,
        Self::GroupMembership,
        Self::Authorization,
        Self::Filter,
        Self::ProcessDefinition,
        Self::Task,
        Self::ProcessInstance,
        Self::Deployment,
        Self::DecisionDefinition,
        Self::Tenant,
        Self::TenantMembership,
        Self::Batch,
        Self::DecisionRequirementsDefinition,
        Self::Report,
        Self::Dashboard,
        Self::OperationLogCategory,
        Self::Optimize,
        Self::HistoricTask,
        Self::HistoricProcessInstance,
        Self::System,
    ];

    /// Numeric code used by the engine in request and response bodies.
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::User => "user",
            Self::Group => "group",
            Self::GroupMembership => "group-membership",
            Self::Authorization => "authorization",
            Self::Filter => "filter",
            Self::ProcessDefinition => "process-definition",
            Self::Task => "task",
            Self::ProcessInstance => "process-instance",
            Self::Deployment => "deployment",
            Self::DecisionDefinition => "decision-definition",
            Self::Tenant => "tenant",
            Self::TenantMembership => "tenant-membership",
            Self::Batch => "batch",
            Self::DecisionRequirementsDefinition => "decision-requirements-definition",
            Self::Report => "report",
            Self::Dashboard => "dashboard",
            Self::OperationLogCategory => "operation-log-category",
            Self::Optimize => "optimize",
            Self::HistoricTask => "historic-task",
            Self::HistoricProcessInstance => "historic-process-instance",
            Self::System => "system",
        }
    }

    /// Accepts either the numeric code or the wire name.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| Error::invalid_enum("resource type", n))
                .and_then(Self::try_from),
            Value::String(s) => s.parse(),
            other => Err(Error::invalid_enum("resource type", other)),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(code) = s.parse::<i64>() {
            return Self::try_from(code);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::invalid_enum("resource type", s))
    }
}

impl TryFrom<i64> for ResourceType {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| Error::invalid_enum("resource type", code))
    }
}
