/*
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */

// reconcile.rs
// Shared pieces of the per-resource apply flows: the operator-facing report,
// outcome-to-report mapping, and the error translation done at the
// operation boundary.

use serde::Serialize;
use serde_json::Value;

use crate::{diff::Diff, poll::PollOutcome, OmevvError};

pub const CHANGES_FOUND_MSG: &str = "Changes found to be applied.";
pub const NO_CHANGES_FOUND_MSG: &str = "No changes found to be applied.";
pub const FAILED_CONN_MSG: &str =
    "Unable to complete the operation. Please check the connection details.";
pub const GENERIC_FAILED_MSG: &str = "Unable to complete the operation.";
pub const UNKNOWN_STATUS_MSG: &str =
    "The profile reported an unrecognized status. The last known profile state is returned.";
pub const TIMED_OUT_MSG: &str = "The operation did not reach a terminal status within the \
    polling window. The last known profile state is returned.";

// Error codes whose server message is worth showing verbatim. Everything
// else collapses to the generic failure message.
const RECOGNIZED_ERROR_CODES: [&str; 3] = ["500", "501", "18001"];

/// Structured outcome of one apply invocation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OperationReport {
    pub msg: String,
    pub changed: bool,
    pub failed: bool,
    pub unreachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    /// Last known server-side state of the profile, when one was read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

impl OperationReport {
    pub fn changed(msg: &str) -> OperationReport {
        OperationReport {
            msg: msg.to_string(),
            changed: true,
            ..Default::default()
        }
    }

    pub fn unchanged(msg: &str) -> OperationReport {
        OperationReport {
            msg: msg.to_string(),
            ..Default::default()
        }
    }

    pub fn failure(msg: &str) -> OperationReport {
        OperationReport {
            msg: msg.to_string(),
            failed: true,
            ..Default::default()
        }
    }

    pub fn with_diff(mut self, diff: Diff) -> OperationReport {
        self.diff = Some(diff);
        self
    }

    pub fn with_profile(mut self, profile: Value) -> OperationReport {
        self.profile = Some(profile);
        self
    }

    /// Boundary translation of anything the layers below can raise.
    /// Connectivity problems are "unreachable", not failures; recognized
    /// console error codes surface the server's own message.
    pub fn from_error(err: OmevvError) -> OperationReport {
        match err {
            OmevvError::Network { .. } => OperationReport {
                msg: err.to_string(),
                unreachable: true,
                ..Default::default()
            },
            OmevvError::Api { code, message, .. } => {
                if RECOGNIZED_ERROR_CODES.contains(&code.as_str()) {
                    OperationReport::failure(&message)
                } else {
                    OperationReport::failure(GENERIC_FAILED_MSG)
                }
            }
            other => OperationReport::failure(&other.to_string()),
        }
    }
}

/// Map a finished poll loop onto the operator report. The mutating call has
/// already been issued by this point, so every arm reports `changed` except
/// terminal job failure.
pub(crate) fn report_from_outcome(
    outcome: PollOutcome,
    success_msg: &str,
    failure_msg: &str,
) -> OperationReport {
    match outcome {
        PollOutcome::Success(state) => OperationReport::changed(success_msg).with_profile(state),
        PollOutcome::Failed(state) => {
            let mut report = OperationReport::failure(failure_msg).with_profile(state);
            report.changed = true;
            report
        }
        PollOutcome::Unknown(state) => {
            OperationReport::changed(UNKNOWN_STATUS_MSG).with_profile(state)
        }
        PollOutcome::TimedOut(state) => OperationReport::changed(TIMED_OUT_MSG).with_profile(state),
    }
}
