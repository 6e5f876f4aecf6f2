//! Response checking and decoding shared by all endpoints.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::http::HttpResponse;
use crate::load::{self, Load};

/// The engine's error body, e.g. `{"type": "NotFoundException", "message": "..."}`.
#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    message: String,
}

/// Map a non-2xx response to `Error::Engine` or `Error::Status`.
pub fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let status = response.status;
    match serde_json::from_slice::<EngineErrorBody>(&response.body) {
        Ok(EngineErrorBody { kind, message }) => {
            warn!(status, kind = %kind, message = %message, "engine rejected request");
            Err(Error::Engine { status, kind, message })
        }
        Err(_) => {
            warn!(status, "engine returned an unrecognised error response");
            Err(Error::Status {
                status,
                body: response.text(),
            })
        }
    }
}

/// Decode the response body as JSON.
pub fn json(response: &HttpResponse) -> Result<Value> {
    Ok(serde_json::from_slice(&response.body)?)
}

/// A JSON array of entities, in server order.
pub fn parse_list<T: Load>(response: HttpResponse) -> Result<Vec<T>> {
    check_status(&response)?;
    load::load_list(&json(&response)?)
}

/// A single JSON object entity.
pub fn parse_one<T: Load>(response: HttpResponse) -> Result<T> {
    check_status(&response)?;
    T::load(&json(&response)?)
}

/// A `{"count": n}` object.
pub fn parse_count(response: HttpResponse) -> Result<u64> {
    check_status(&response)?;
    let data = json(&response)?;
    load::required(load::object(&data)?, "count")
}

/// A response with no meaningful body.
pub fn parse_empty(response: HttpResponse) -> Result<()> {
    check_status(&response)
}
