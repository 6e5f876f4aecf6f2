//! Synchronous client for the Camunda engine REST API.
//!
//! # Overview
//! Every remote operation is a request value (`authorization::GetList`,
//! `process_instance::VariablesGet`, ...) built from typed arguments. A
//! request declares its parameters as an ordered list of descriptors, from
//! which the shared request base derives path, query and body values. The
//! request is then turned into an `HttpRequest`, executed by an `HttpClient`,
//! and the `HttpResponse` parsed into typed entities or a structured `Error`.
//!
//! # Design
//! - Requests hold no state beyond their arguments and URL template; build a
//!   new one per call.
//! - `Endpoint::build` and `Endpoint::parse` are pure. `Endpoint::send` wires
//!   them around exactly one `HttpClient::execute`.
//! - Transport failures never leak the client's own error type; they arrive
//!   as `Error::Transport`.
//!
//! ```no_run
//! use camunda_core::authorization::{AuthorizationQuery, GetList};
//! use camunda_core::{ClientConfig, Endpoint, UreqClient};
//!
//! # fn main() -> Result<(), camunda_core::Error> {
//! let config = ClientConfig::from_env()?;
//! let client = UreqClient::new(&config);
//!
//! let authorizations = GetList::new(&config.base_url)
//!     .with_filter(AuthorizationQuery::new().with_resource_type("process-definition".parse()?))
//!     .send(&client)?;
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod config;
pub mod decision_definition;
pub mod error;
pub mod http;
pub mod load;
pub mod param;
pub mod process_instance;
pub mod request;
pub mod resource;
pub mod response;
pub mod transport;
pub mod variable;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportError};
pub use load::Load;
pub use param::{Param, ParamKind};
pub use request::{CamundaRequest, Endpoint};
pub use resource::{Link, ResourceType};
pub use transport::UreqClient;
pub use variable::{Variable, VariableInput, VariableValue};
