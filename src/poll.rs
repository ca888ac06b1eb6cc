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
use std::{thread, time::Duration};

use serde_json::Value;
use tracing::debug;

use crate::{model::ProfileStatus, OmevvError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_ATTEMPTS: u32 = 240;

/// Cadence and budget for watching an asynchronous profile job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

/// How a poll loop ended. Every variant carries the last fetched resource
/// state so the caller can report it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Success(Value),
    Failed(Value),
    /// The resource reported a status outside the known vocabulary.
    Unknown(Value),
    /// The attempt budget ran out before a terminal status appeared.
    TimedOut(Value),
}

/// Re-fetch the resource until its status leaves the pending states, the
/// budget runs out, or the fetch itself errors. Transport and API errors
/// from `fetch` propagate as-is; there is no retry beyond the cadence.
pub fn wait_for_terminal<F>(policy: &PollPolicy, mut fetch: F) -> Result<PollOutcome, OmevvError>
where
    F: FnMut() -> Result<Value, OmevvError>,
{
    let mut last = Value::Null;
    for attempt in 0..policy.attempts {
        if attempt > 0 {
            thread::sleep(policy.interval);
        }
        let state = fetch()?;
        let raw = state.get("status").and_then(|s| s.as_str()).unwrap_or("");
        match ProfileStatus::from_raw(raw) {
            ProfileStatus::Success => return Ok(PollOutcome::Success(state)),
            ProfileStatus::Failed => return Ok(PollOutcome::Failed(state)),
            ProfileStatus::Unknown => return Ok(PollOutcome::Unknown(state)),
            ProfileStatus::Pending => {
                debug!("profile status {raw}, attempt {}/{}", attempt + 1, policy.attempts);
                last = state;
            }
        }
    }
    Ok(PollOutcome::TimedOut(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn zero_interval(attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            attempts,
        }
    }

    type Fetch = Box<dyn FnMut() -> Result<Value, OmevvError>>;

    fn scripted(statuses: &[&str]) -> (Fetch, std::rc::Rc<std::cell::Cell<u32>>) {
        let fetches = std::rc::Rc::new(std::cell::Cell::new(0u32));
        let counter = fetches.clone();
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        let fetch = Box::new(move || {
            let n = counter.get();
            counter.set(n + 1);
            Ok(json!({"id": 1000, "status": statuses[n as usize]}))
        });
        (fetch, fetches)
    }

    // test_polls_until_success tests that three pending-then-successful
    // statuses take exactly three fetches.
    #[test]
    fn test_polls_until_success() {
        let (fetch, fetches) = scripted(&["CREATING", "CREATING", "SUCCESSFUL"]);
        let outcome = wait_for_terminal(&zero_interval(10), fetch).unwrap();
        assert_eq!(fetches.get(), 3);
        match outcome {
            PollOutcome::Success(state) => assert_eq!(state["status"], "SUCCESSFUL"),
            other => panic!("expected success, got {other:?}"),
        }
    }

    // test_failed_stops_immediately tests that a terminal failure takes a
    // single fetch.
    #[test]
    fn test_failed_stops_immediately() {
        let (fetch, fetches) = scripted(&["FAILED"]);
        let outcome = wait_for_terminal(&zero_interval(10), fetch).unwrap();
        assert_eq!(fetches.get(), 1);
        assert!(matches!(outcome, PollOutcome::Failed(_)));
    }

    // test_unknown_status_is_terminal tests that an out-of-vocabulary status
    // ends the loop instead of burning the whole budget.
    #[test]
    fn test_unknown_status_is_terminal() {
        let (fetch, fetches) = scripted(&["Parsing", "Reticulating"]);
        let outcome = wait_for_terminal(&zero_interval(10), fetch).unwrap();
        assert_eq!(fetches.get(), 2);
        assert!(matches!(outcome, PollOutcome::Unknown(_)));
    }

    // test_budget_exhaustion_returns_last_state tests the soft timeout.
    #[test]
    fn test_budget_exhaustion_returns_last_state() {
        let (fetch, fetches) = scripted(&["Parsing", "Parsing", "Parsing"]);
        let outcome = wait_for_terminal(&zero_interval(3), fetch).unwrap();
        assert_eq!(fetches.get(), 3);
        match outcome {
            PollOutcome::TimedOut(state) => assert_eq!(state["status"], "Parsing"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    // test_fetch_error_propagates tests that a transport error aborts the
    // loop instead of being swallowed.
    #[test]
    fn test_fetch_error_propagates() {
        let result = wait_for_terminal(&zero_interval(5), || {
            Err(OmevvError::Validation("boom".to_string()))
        });
        assert!(result.is_err());
    }
}
