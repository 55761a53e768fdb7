//! Remote math and formula endpoints.
//!
//! Blocking reqwest client (no Tokio runtime required). Callers that must
//! stay responsive run these calls on a worker thread and apply the result
//! only after a full success.

use super::local::sheet_to_json;
use crate::document::Sheet;
use crate::error::{MinisheetError, Result};
use log::{debug, warn};
use minisheet_engine::engine::{Aggregate, format_number};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Serialize)]
struct MathRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    values: &'a [f64],
}

#[derive(Serialize)]
struct FormulaRequest<'a> {
    formula: &'a str,
    cells: Value,
}

/// `{result}` on success, `{error}` on failure.
#[derive(Debug, Default, Deserialize)]
struct RemoteReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the math (`/math`) and formula (`/formula`) endpoints.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("minisheet/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(RemoteClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Compute an aggregate remotely.
    pub fn math(&self, aggregate: Aggregate, values: &[f64]) -> Result<f64> {
        let request = MathRequest {
            kind: aggregate.name(),
            values,
        };
        let result = self.post("math", &request)?;
        result.as_f64().ok_or_else(|| {
            MinisheetError::RemoteCallFailure(format!("non-numeric result: {}", result))
        })
    }

    /// Evaluate a condition formula remotely against the whole sheet.
    pub fn formula(&self, formula: &str, sheet: &Sheet) -> Result<String> {
        let request = FormulaRequest {
            formula,
            cells: sheet_to_json(sheet),
        };
        let result = self.post("formula", &request)?;
        Ok(scalar_text(&result))
    }

    fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {}", url);
        let response = self.http.post(&url).json(body).send().map_err(|e| {
            warn!("{} unreachable: {}", url, e);
            MinisheetError::RemoteCallFailure(e.to_string())
        })?;
        let status = response.status();
        let text = response.text().map_err(|e| {
            warn!("reading response from {} failed: {}", url, e);
            MinisheetError::RemoteCallFailure(format!("reading response from {}: {}", url, e))
        })?;
        parse_reply(status.as_u16(), status.is_success(), &text)
    }
}

fn parse_reply(status: u16, success: bool, body: &str) -> Result<Value> {
    let reply: RemoteReply = serde_json::from_str(body).unwrap_or_default();
    if let Some(error) = reply.error {
        return Err(MinisheetError::RemoteCallFailure(error));
    }
    if !success {
        return Err(MinisheetError::RemoteCallFailure(format!("HTTP {}: {}", status, body)));
    }
    reply
        .result
        .ok_or_else(|| MinisheetError::RemoteCallFailure("response has no result".to_string()))
}

/// Display text of a scalar result.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
