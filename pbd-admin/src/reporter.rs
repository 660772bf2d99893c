//! Run reporter
//!
//! Turns per-row events and operation outcomes into process log lines and keeps
//! structured records for the final summary. It never influences control flow.

use crate::error::RunError;
use crate::operations::Operation;
use crate::outcome::OperationOutcome;
use pbd_common::WorkRow;
use std::collections::BTreeMap;

/// Outcome of one operation on one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub project_key: String,
    pub operation: Operation,
    pub outcome: OperationOutcome,
}

/// Everything that happened during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub records: Vec<OutcomeRecord>,
    /// Data rows read, valid or not
    pub rows_seen: usize,
    /// Rows without a key
    pub rows_skipped: usize,
    /// Rows dropped before any mutation (failed existence check)
    pub rows_rejected: usize,
}

impl RunReport {
    pub fn successes(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::Success { .. }))
    }

    pub fn soft_failures(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::SoftFailure { .. }))
    }

    pub fn transport_errors(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::TransportError { .. }))
    }

    /// Records for one project, in execution order
    pub fn for_project<'a>(
        &'a self,
        project_key: &'a str,
    ) -> impl Iterator<Item = &'a OutcomeRecord> + 'a {
        self.records.iter().filter(move |r| r.project_key == project_key)
    }

    fn count(&self, pred: impl Fn(&OperationOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Accumulates outcomes and writes the audit trail
pub struct RunReporter {
    flow_name: &'static str,
    operator: String,
    report: RunReport,
    /// Index of the first record belonging to the current row
    row_start: usize,
}

impl RunReporter {
    /// `operator` names the authenticated account in the summary lines
    pub fn new(flow_name: &'static str, operator: &str) -> Self {
        Self {
            flow_name,
            operator: operator.to_string(),
            report: RunReport::default(),
            row_start: 0,
        }
    }

    pub fn work_list_opened(&self, headers: &[String], key_column: &str, has_key_column: bool) {
        tracing::info!("Work list headers detected: {:?}", headers);
        if !has_key_column {
            tracing::warn!(
                key_column,
                "Work list has no '{}' column; every row will be skipped",
                key_column
            );
        }
    }

    pub fn row_skipped(
        &mut self,
        line: u64,
        raw_fields: &BTreeMap<String, String>,
        key_column: &str,
    ) {
        self.report.rows_seen += 1;
        self.report.rows_skipped += 1;
        tracing::warn!(
            line,
            "Row with empty or missing '{}' skipped: {:?}",
            key_column,
            raw_fields
        );
    }

    pub fn row_started(&mut self, row: &WorkRow, description: &str) {
        self.report.rows_seen += 1;
        self.row_start = self.report.records.len();
        tracing::info!(project_key = %row.project_key, line = row.line, "{}", description);
    }

    /// Existence check failed; no mutation will be attempted for this row
    pub fn row_rejected(&mut self, project_key: &str, reason: &str) {
        self.report.rows_rejected += 1;
        tracing::error!(
            project_key,
            "Project '{}' not found or not readable, row skipped: {}",
            project_key,
            reason
        );
    }

    /// Summarize the operations recorded since the last `row_started`
    pub fn row_finished(&self, summary: &str) {
        let current = &self.report.records[self.row_start..];
        let succeeded = current.iter().filter(|r| r.outcome.is_success()).count();
        tracing::info!(
            succeeded,
            attempted = current.len(),
            "{} ({}/{} succeeded)",
            summary,
            succeeded,
            current.len()
        );
    }

    pub fn record(&mut self, project_key: &str, operation: &Operation, outcome: &OperationOutcome) {
        let op = operation.to_string();
        match outcome {
            OperationOutcome::Success { status } => {
                tracing::info!(
                    project_key,
                    operation = %op,
                    status,
                    "{}",
                    operation.success_message(project_key)
                );
            }
            OperationOutcome::SoftFailure { status, body } => {
                tracing::error!(
                    project_key,
                    operation = %op,
                    status,
                    "Error during {} on '{}': {} - {}",
                    op,
                    project_key,
                    status,
                    body
                );
            }
            OperationOutcome::HardFailure { status, body } => {
                tracing::error!(
                    project_key,
                    operation = %op,
                    status,
                    "Authentication or permission error during {} on '{}': {} - {}",
                    op,
                    project_key,
                    status,
                    body
                );
            }
            OperationOutcome::TransportError { cause } => {
                tracing::error!(
                    project_key,
                    operation = %op,
                    "Exception during {} on '{}': {}",
                    op,
                    project_key,
                    cause
                );
            }
        }

        self.report.records.push(OutcomeRecord {
            project_key: project_key.to_string(),
            operation: operation.clone(),
            outcome: outcome.clone(),
        });
    }

    /// Log progress made before a fatal error
    pub fn abort(&self, error: &RunError) {
        tracing::warn!(
            operator = %self.operator,
            rows = self.report.rows_seen,
            succeeded = self.report.successes(),
            failed = self.report.soft_failures() + self.report.transport_errors(),
            "{} interrupted: {}",
            self.flow_name,
            error
        );
    }

    pub fn finish(self) -> RunReport {
        let report = self.report;
        tracing::info!(
            operator = %self.operator,
            rows = report.rows_seen,
            skipped = report.rows_skipped,
            rejected = report.rows_rejected,
            succeeded = report.successes(),
            failed = report.soft_failures(),
            transport_errors = report.transport_errors(),
            "{} finished",
            self.flow_name
        );
        report
    }
}
