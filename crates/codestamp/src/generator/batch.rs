//! Generating several files in one call.
//!
//! Requests run in order and independently. A failure never undoes files
//! written by earlier requests; the [`BatchReport`] tells the caller exactly
//! which requests failed and why.

use std::path::PathBuf;

use super::{CodeGenerator, GenerationRequest};
use crate::error::Error;

/// What to do after a request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Run the remaining requests.
    #[default]
    ContinueOnError,
    /// Skip the remaining requests.
    StopOnError,
}

/// A failed request within a batch.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the request in the batch.
    pub index: usize,
    pub template_id: String,
    pub output_path: PathBuf,
    pub error: Error,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written, in request order.
    pub written: Vec<PathBuf>,
    /// Failed requests, in request order.
    pub failures: Vec<BatchFailure>,
    /// Requests not attempted because of [`BatchPolicy::StopOnError`].
    pub skipped: usize,
}

impl BatchReport {
    /// True if every request was attempted and succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }

    /// The first failure, if any.
    pub fn first_failure(&self) -> Option<&BatchFailure> {
        self.failures.first()
    }
}

impl CodeGenerator {
    /// Generates every request, continuing past failures.
    pub fn generate_multiple(&self, requests: &[GenerationRequest]) -> BatchReport {
        self.generate_multiple_with(requests, BatchPolicy::default())
    }

    /// Generates every request under the given policy.
    pub fn generate_multiple_with(
        &self,
        requests: &[GenerationRequest],
        policy: BatchPolicy,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, request) in requests.iter().enumerate() {
            match self.generate(request) {
                Ok(path) => report.written.push(path),
                Err(error) => {
                    tracing::warn!(
                        index,
                        template_id = %request.template_id,
                        path = ?request.output_path,
                        error = %error,
                        "Batch request failed"
                    );
                    report.failures.push(BatchFailure {
                        index,
                        template_id: request.template_id.clone(),
                        output_path: request.output_path.clone(),
                        error,
                    });
                    if policy == BatchPolicy::StopOnError {
                        report.skipped = requests.len() - index - 1;
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            written = report.written.len(),
            failed = report.failures.len(),
            skipped = report.skipped,
            "Batch finished"
        );
        report
    }
}
