//! pbd-admin library interface
//!
//! Bulk administration of ticket-tracking projects driven by a CSV work list:
//! change the project lead, reassign process schemes, or delete projects.
//!
//! Every flow runs the same pipeline: resolve configuration, authenticate once,
//! stream the work list, dispatch per-row mutations and report each outcome.

pub mod auth;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod operations;
pub mod outcome;
pub mod reporter;

pub use crate::dispatcher::{BatchRunner, Flow, FlowKind};
pub use crate::error::{RunError, RunResult};
pub use crate::outcome::OperationOutcome;
pub use crate::reporter::RunReport;

use crate::client::{ServiceClient, DEFAULT_REQUEST_TIMEOUT};
use crate::reporter::RunReporter;
use pbd_common::worklist::{DEFAULT_KEY_COLUMN, DEFAULT_WORK_LIST};
use pbd_common::{Credentials, WorkListReader};
use std::path::PathBuf;
use std::time::Duration;

/// Per-invocation settings that do not come from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub work_list: PathBuf,
    pub key_column: String,
    pub request_timeout: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            work_list: PathBuf::from(DEFAULT_WORK_LIST),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Run one flow end to end
///
/// Configuration is resolved through `lookup` before any request is sent. `Ok`
/// means the work list was fully processed, soft failures included; every fatal
/// condition comes back as `Err`.
pub async fn execute<F>(
    kind: FlowKind,
    settings: &RunSettings,
    lookup: F,
) -> RunResult<RunReport>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = Credentials::resolve(kind.requires_target(), &lookup)?;
    let flow = Flow::resolve(kind, &credentials, &lookup)?;
    tracing::info!(
        base_url = %credentials.base_endpoint,
        identity = %credentials.identity,
        "{} run configured",
        flow.name()
    );

    let client = ServiceClient::new(credentials, settings.request_timeout)
        .map_err(|e| RunError::HttpClient(e.to_string()))?;
    let session = auth::authenticate(&client).await?;

    let reader = WorkListReader::open(&settings.work_list, &settings.key_column)?;
    let mut reporter = RunReporter::new(flow.name(), session.identity().label());
    reporter.work_list_opened(reader.headers(), reader.key_column(), reader.has_key_column());

    let runner = BatchRunner::new(&client, &session, &flow, &settings.key_column);
    if let Err(err) = runner.run(reader, &mut reporter).await {
        reporter.abort(&err);
        return Err(err);
    }

    Ok(reporter.finish())
}
