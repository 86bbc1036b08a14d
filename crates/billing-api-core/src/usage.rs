//! Usage recording models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_helpers::object_or_empty;

/// Body of a `duration/job` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDurationParameters {
    /// Project that ran the job.
    pub project_id: String,
    /// Job identifier.
    pub job_id: String,
    /// Component that the job executed, e.g. `keboola.ex-db-snowflake`.
    pub component_id: String,
    /// Job type, e.g. `standard`.
    pub job_type: String,
    /// Backend the job ran on, e.g. `{"type": "small"}`.
    pub backend: Map<String, Value>,
    /// Billable duration.
    pub duration_seconds: f64,
}

/// The job duration as recorded by the billing service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDurationRecord {
    /// Project that ran the job.
    pub project_id: String,
    /// Job identifier.
    pub job_id: String,
    /// Component that the job executed.
    #[serde(default)]
    pub component_id: Option<String>,
    /// Job type.
    #[serde(default)]
    pub job_type: Option<String>,
    /// Backend the job ran on.
    #[serde(default, deserialize_with = "object_or_empty")]
    pub backend: Map<String, Value>,
    /// Recorded duration.
    pub duration_seconds: f64,
}

impl JobDurationRecord {
    /// Build the record from a decoded response object.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or has the wrong type.
    pub fn from_response(data: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(data))
    }
}

/// Body of a `duration/container-sandbox` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxDurationParameters {
    /// Project owning the sandbox.
    pub project_id: String,
    /// Sandbox identifier.
    pub sandbox_id: String,
    /// Sandbox type, e.g. `python`.
    pub sandbox_type: String,
    /// Sandbox size, e.g. `small`.
    pub sandbox_size: String,
    /// Billable duration.
    pub duration_seconds: f64,
}
