//! Operation dispatcher
//!
//! Drives one flow over the work list: rows strictly in file order, operations
//! within a row in the flow's fixed order, one request in flight at a time.
//!
//! Failure boundaries:
//! - blank key → row skipped, run continues
//! - failed existence check (schemes flow) → row skipped, run continues
//! - soft failure / transport error → next operation, then next row
//! - 401/403 on a mutation → `Err(PermissionDenied)`, nothing else is sent
//! - unreadable work list record → `Err`, nothing else is sent

use crate::auth::VerifiedSession;
use crate::client::ServiceClient;
use crate::error::{RunError, RunResult};
use crate::operations::Operation;
use crate::outcome::{excerpt, OperationOutcome};
use crate::reporter::RunReporter;
use pbd_common::{Credentials, Error, SchemeSet, WorkListEntry, WorkRow};

/// Which operation family a run applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    ChangeLead,
    AssignSchemes,
    DeleteProjects,
}

impl FlowKind {
    /// Whether the flow needs `account_id` in the environment
    pub fn requires_target(self) -> bool {
        matches!(self, FlowKind::ChangeLead)
    }
}

/// A flow with its run-wide parameters resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Same new lead for every row
    ChangeLead { account_id: String },
    AssignSchemes { schemes: SchemeSet },
    DeleteProjects,
}

impl Flow {
    /// Build the flow from resolved credentials and the environment lookup
    pub fn resolve<F>(kind: FlowKind, credentials: &Credentials, lookup: F) -> RunResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match kind {
            FlowKind::ChangeLead => {
                let account_id = credentials.target_value.clone().ok_or_else(|| {
                    Error::Config("account_id is required to change project leads".to_string())
                })?;
                Ok(Flow::ChangeLead { account_id })
            }
            FlowKind::AssignSchemes => {
                let schemes = SchemeSet::resolve(lookup)?;
                if schemes.is_empty() {
                    tracing::warn!(
                        "No scheme ids configured; projects will only be checked for existence"
                    );
                } else {
                    let configured: Vec<String> = schemes
                        .iter()
                        .map(|(kind, id)| format!("{}={}", kind, id))
                        .collect();
                    tracing::info!("Schemes to assign: {}", configured.join(", "));
                }
                Ok(Flow::AssignSchemes { schemes })
            }
            FlowKind::DeleteProjects => Ok(Flow::DeleteProjects),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Flow::ChangeLead { .. } => "Project Lead change",
            Flow::AssignSchemes { .. } => "Scheme reassignment",
            Flow::DeleteProjects => "Project deletion",
        }
    }

    /// Operations applied to every row, in application order
    pub fn operations(&self) -> Vec<Operation> {
        match self {
            Flow::ChangeLead { account_id } => vec![Operation::ChangeLead {
                account_id: account_id.clone(),
            }],
            Flow::AssignSchemes { schemes } => schemes
                .iter()
                .map(|(kind, scheme_id)| Operation::AssignScheme { kind, scheme_id })
                .collect(),
            Flow::DeleteProjects => vec![Operation::DeleteProject],
        }
    }

    fn checks_existence(&self) -> bool {
        matches!(self, Flow::AssignSchemes { .. })
    }

    fn row_description(&self, project_key: &str) -> String {
        match self {
            Flow::ChangeLead { account_id } => format!(
                "Changing Project Lead of project '{}' -> (accountId: '{}') ...",
                project_key, account_id
            ),
            Flow::AssignSchemes { .. } => {
                format!("Reassigning schemes of project '{}' ...", project_key)
            }
            Flow::DeleteProjects => format!("Deleting project '{}' ...", project_key),
        }
    }

    fn row_summary(&self, project_key: &str) -> String {
        match self {
            Flow::ChangeLead { .. } => format!("Project Lead processed for '{}'", project_key),
            Flow::AssignSchemes { .. } => format!("Schemes reassigned for {}", project_key),
            Flow::DeleteProjects => format!("Deletion processed for '{}'", project_key),
        }
    }
}

/// Applies a flow to work list entries
pub struct BatchRunner<'a> {
    client: &'a ServiceClient,
    flow: &'a Flow,
    operations: Vec<Operation>,
    key_column: String,
}

impl<'a> BatchRunner<'a> {
    /// A verified session is required: the identity gate must have passed
    pub fn new(
        client: &'a ServiceClient,
        session: &'a VerifiedSession,
        flow: &'a Flow,
        key_column: &str,
    ) -> Self {
        tracing::debug!(operator = session.identity().label(), "Batch runner ready");
        Self {
            client,
            flow,
            operations: flow.operations(),
            key_column: key_column.to_string(),
        }
    }

    /// Process every entry in order
    ///
    /// Returns early, without touching later entries, on the first fatal condition.
    pub async fn run<I>(&self, entries: I, reporter: &mut RunReporter) -> RunResult<()>
    where
        I: IntoIterator<Item = pbd_common::Result<WorkListEntry>>,
    {
        for entry in entries {
            match entry? {
                WorkListEntry::Skipped { line, raw_fields } => {
                    reporter.row_skipped(line, &raw_fields, &self.key_column);
                }
                WorkListEntry::Row(row) => self.process_row(&row, reporter).await?,
            }
        }
        Ok(())
    }

    async fn process_row(&self, row: &WorkRow, reporter: &mut RunReporter) -> RunResult<()> {
        let key = row.project_key.as_str();
        reporter.row_started(row, &self.flow.row_description(key));

        if self.flow.checks_existence() && !self.project_exists(key, reporter).await {
            return Ok(());
        }

        for operation in &self.operations {
            let reply = self.client.execute(key, operation).await;
            let outcome = OperationOutcome::classify(operation.success_rule(), reply);
            reporter.record(key, operation, &outcome);

            if let OperationOutcome::HardFailure { status, body } = outcome {
                return Err(RunError::PermissionDenied {
                    project_key: key.to_string(),
                    operation: operation.clone(),
                    status,
                    body,
                });
            }
        }

        reporter.row_finished(&self.flow.row_summary(key));
        Ok(())
    }

    /// Read-only existence check; anything but 200 rejects the row
    async fn project_exists(&self, key: &str, reporter: &mut RunReporter) -> bool {
        match self.client.get_project(key).await {
            Ok(reply) if reply.status == 200 => true,
            Ok(reply) => {
                reporter.row_rejected(key, &format!("{} - {}", reply.status, excerpt(&reply.body)));
                false
            }
            Err(e) => {
                reporter.row_rejected(key, &e.to_string());
                false
            }
        }
    }
}
