//! Request base and endpoint contract.
//!
//! # Design
//! `CamundaRequest` turns a request's descriptor list into query pairs, a
//! JSON body and path values, and resolves the URL template. `Endpoint`
//! adds the fixed HTTP method and response parsing, and splits each call
//! into `build` (pure) and `parse` (pure) around one `HttpClient::execute`.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::param::{prune, to_text, Param, ParamKind};

/// Characters escaped when a value is substituted into a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Collects a request's declared parameters. Does no I/O.
pub trait CamundaRequest: Sized {
    /// URL template. May contain `{name}` placeholders filled from path
    /// parameters.
    fn url(&self) -> &str;

    /// Ordered parameter descriptors of this request type.
    fn parameters() -> Vec<Param<Self>>;

    fn query_parameters(&self) -> BTreeMap<String, String> {
        collect(self, ParamKind::Query)
            .filter_map(|(name, value)| to_text(&value).map(|text| (name.to_string(), text)))
            .collect()
    }

    /// Body values with null fields pruned, except for opaque descriptors,
    /// whose values are sent verbatim.
    fn body_parameters(&self) -> Map<String, Value> {
        Self::parameters()
            .into_iter()
            .filter(|param| param.kind() == ParamKind::Body)
            .filter_map(|param| {
                let value = param.read(self)?;
                let value = if param.is_opaque() { value } else { prune(value)? };
                Some((param.name().to_string(), value))
            })
            .collect()
    }

    fn path_parameters(&self) -> BTreeMap<String, String> {
        collect(self, ParamKind::Path)
            .filter_map(|(name, value)| to_text(&value).map(|text| (name.to_string(), text)))
            .collect()
    }

    /// The URL with every placeholder substituted.
    fn resolved_url(&self) -> Result<String> {
        substitute(self.url(), &self.path_parameters())
    }
}

fn collect<R: CamundaRequest>(request: &R, kind: ParamKind) -> impl Iterator<Item = (&'static str, Value)> + '_ {
    R::parameters()
        .into_iter()
        .filter(move |param| param.kind() == kind)
        .filter_map(move |param| param.read(request).map(|value| (param.name(), value)))
}

/// Replace `{name}` placeholders in `template` with encoded path values.
pub fn substitute(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut url = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            return Err(Error::Configuration(format!("unterminated placeholder in {template}")));
        };
        let name = &rest[start + 1..start + len];
        let value = values
            .get(name)
            .ok_or_else(|| Error::Configuration(format!("path parameter `{name}` is not set for {template}")))?;
        url.push_str(&rest[..start]);
        url.extend(utf8_percent_encode(value, PATH_SEGMENT));
        rest = &rest[start + len + 1..];
    }
    url.push_str(rest);

    Ok(url)
}

/// One remote operation: a request plus its method and response decoding.
pub trait Endpoint: CamundaRequest {
    type Output;

    const METHOD: HttpMethod;

    /// Decode a response, mapping failure statuses to errors first.
    fn parse(&self, response: HttpResponse) -> Result<Self::Output>;

    /// Assemble the HTTP request. Writes carry the body parameters as JSON.
    fn build(&self) -> Result<HttpRequest> {
        let url = self.resolved_url()?;
        let query = self.query_parameters().into_iter().collect();

        let (headers, body) = match Self::METHOD {
            HttpMethod::Post | HttpMethod::Put => {
                let body = serde_json::to_string(&Value::Object(self.body_parameters()))
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                (vec![("content-type".to_string(), "application/json".to_string())], Some(body))
            }
            HttpMethod::Get | HttpMethod::Delete => (Vec::new(), None),
        };

        Ok(HttpRequest {
            method: Self::METHOD,
            url,
            query,
            headers,
            body,
        })
    }

    /// Perform the call: exactly one exchange through `client`.
    fn send<C: HttpClient>(&self, client: &C) -> Result<Self::Output> {
        let request = self.build()?;
        debug!(method = %request.method, url = %request.url, "sending engine request");
        trace!(query = ?request.query, body = ?request.body);

        let response = client.execute(&request).map_err(|e| Error::Transport { message: e.0 })?;
        debug!(status = response.status, "engine responded");

        self.parse(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tracing_test::traced_test;

    use super::*;
    use crate::http::TransportError;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_all_placeholders() {
        let url = substitute(
            "http://engine/process-instance/{id}/variables/{varName}",
            &values(&[("id", "pi-1"), ("varName", "amount")]),
        )
        .unwrap();
        assert_eq!(url, "http://engine/process-instance/pi-1/variables/amount");
    }

    #[test]
    fn encodes_path_values() {
        let url = substitute("http://engine/variables/{name}", &values(&[("name", "a b/c")])).unwrap();
        assert_eq!(url, "http://engine/variables/a%20b%2Fc");
    }

    #[test]
    fn missing_placeholder_is_a_configuration_error() {
        let err = substitute("http://engine/authorization/{id}", &values(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("`id`")));
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let url = substitute("http://engine/authorization/count", &values(&[])).unwrap();
        assert_eq!(url, "http://engine/authorization/count");
    }

    struct Rename {
        url: String,
        id: String,
        name: Option<String>,
    }

    impl CamundaRequest for Rename {
        fn url(&self) -> &str {
            &self.url
        }

        fn parameters() -> Vec<Param<Self>> {
            vec![
                Param::path("id", |r: &Self| Some(Value::from(r.id.as_str()))),
                Param::body("name", |r: &Self| r.name.clone().map(Value::from)),
            ]
        }
    }

    impl Endpoint for Rename {
        type Output = ();

        const METHOD: HttpMethod = HttpMethod::Put;

        fn parse(&self, response: HttpResponse) -> Result<()> {
            crate::response::parse_empty(response)
        }
    }

    /// Replays one canned outcome and records what it was asked to send.
    struct Scripted {
        outcome: std::result::Result<HttpResponse, TransportError>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl HttpClient for Scripted {
        fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            self.outcome.clone()
        }
    }

    fn rename() -> Rename {
        Rename {
            url: "http://engine/thing/{id}".to_string(),
            id: "t1".to_string(),
            name: Some("renamed".to_string()),
        }
    }

    #[test]
    fn build_puts_json_body_and_content_type() {
        let request = rename().build().unwrap();
        assert_eq!(request.url, "http://engine/thing/t1");
        assert_eq!(request.body.as_deref(), Some(r#"{"name":"renamed"}"#));
        assert_eq!(request.headers, vec![("content-type".to_string(), "application/json".to_string())]);
    }

    #[traced_test]
    #[test]
    fn send_performs_one_exchange() {
        let client = Scripted {
            outcome: Ok(HttpResponse::new(204, "")),
            seen: RefCell::new(Vec::new()),
        };
        rename().send(&client).unwrap();

        assert_eq!(client.seen.borrow().len(), 1);
        assert!(logs_contain("sending engine request"));
    }

    #[test]
    fn transport_failure_surfaces_as_transport_error() {
        let client = Scripted {
            outcome: Err(TransportError("connection refused".to_string())),
            seen: RefCell::new(Vec::new()),
        };
        let err = rename().send(&client).unwrap_err();
        assert!(matches!(err, Error::Transport { ref message } if message == "connection refused"));
    }
}
