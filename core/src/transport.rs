//! Default blocking `HttpClient` built on `ureq`.
//!
//! Status-as-error is disabled so 4xx/5xx responses come back as data and the
//! endpoint decides how to interpret them. Every `ureq` failure is flattened
//! into a `TransportError` carrying only its message.

use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportError};

/// Blocking HTTP client for engine requests.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
    authorization: Option<String>,
}

impl UreqClient {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            authorization: config.authorization.clone(),
        }
    }

    /// Headers to send. The configured authorization is added only when the
    /// request does not carry its own.
    fn headers<'a>(&'a self, request: &'a HttpRequest) -> Vec<(&'a str, &'a str)> {
        let mut headers: Vec<(&str, &str)> = request
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let has_own = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("authorization"));
        if let (Some(auth), false) = (&self.authorization, has_own) {
            headers.push(("authorization", auth.as_str()));
        }
        headers
    }

    fn decorate<B>(&self, mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        for (name, value) in self.headers(request) {
            builder = builder.header(name, value);
        }
        builder
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl HttpClient for UreqClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => self.decorate(self.agent.get(url), request).call(),
            HttpMethod::Delete => self.decorate(self.agent.delete(url), request).call(),
            HttpMethod::Post => {
                let builder = self.decorate(self.agent.post(url), request);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = self.decorate(self.agent.put(url), request);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| {
            debug!(method = %request.method, url, error = %e, "transport failure");
            TransportError(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| header_pair(name, value))
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Header values are decoded lossily, like `HttpResponse::text`.
fn header_pair(name: &ureq::http::HeaderName, value: &ureq::http::HeaderValue) -> (String, String) {
    (
        name.as_str().to_string(),
        String::from_utf8_lossy(value.as_bytes()).into_owned(),
    )
}
