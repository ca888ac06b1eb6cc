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

// baseline.rs
// Baseline compliance profiles: the REST accessor, payload construction,
// and the idempotent present/absent apply flow. Cluster-group membership is
// reconciled with targeted add/remove sets rather than list replacement.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{
    diff::{group_delta, map_diff, trimmed_view, Diff, GroupDelta},
    firmware::FirmwareProfiles,
    model::{BaselineProfile, DesiredState, JobSchedule},
    network::{Method, Response, RestClient},
    poll::{wait_for_terminal, PollPolicy},
    reconcile::{report_from_outcome, OperationReport, CHANGES_FOUND_MSG, NO_CHANGES_FOUND_MSG},
    OmevvError,
};

pub const BASELINE_PROFILE_URI: &str = "/BaselineProfiles";

pub const SUCCESS_CREATION_MSG: &str = "Successfully created the baseline profile.";
pub const FAILED_CREATION_MSG: &str = "Unable to create the baseline profile.";
pub const SUCCESS_MODIFY_MSG: &str = "Successfully modified the baseline profile.";
pub const FAILED_MODIFY_MSG: &str = "Unable to modify the baseline profile.";
pub const SUCCESS_DELETION_MSG: &str = "Successfully deleted the baseline profile.";

/// Accessor for the `/BaselineProfiles` resource family. Each method issues
/// exactly one REST call.
pub struct BaselineProfiles<'a> {
    rest: &'a dyn RestClient,
}

impl<'a> BaselineProfiles<'a> {
    pub fn new(rest: &'a dyn RestClient) -> Self {
        BaselineProfiles { rest }
    }

    pub fn list(&self) -> Result<Vec<BaselineProfile>, OmevvError> {
        let resp = self
            .rest
            .invoke_request(Method::GET, BASELINE_PROFILE_URI, None)?;
        serde_json::from_value(resp.json_data.clone()).map_err(|e| OmevvError::JsonDeserialize {
            url: BASELINE_PROFILE_URI.to_string(),
            body: resp.json_data.to_string(),
            source: e,
        })
    }

    /// Lists all profiles and filters client-side by exact name. First match
    /// wins; absence is an empty result, not an error.
    pub fn get_by_name(&self, name: &str) -> Result<Option<BaselineProfile>, OmevvError> {
        let profiles = self.list()?;
        Ok(profiles.into_iter().find(|p| p.name == name))
    }

    pub fn get_by_id(&self, profile_id: i64) -> Result<Response, OmevvError> {
        self.rest.invoke_request(
            Method::GET,
            &format!("{BASELINE_PROFILE_URI}/{profile_id}"),
            None,
        )
    }

    pub fn create(
        &self,
        name: &str,
        description: Option<&str>,
        firmware_repo_id: i64,
        group_ids: &[i64],
        job_schedule: Option<&JobSchedule>,
    ) -> Result<Response, OmevvError> {
        let payload = create_payload(name, description, firmware_repo_id, group_ids, job_schedule);
        self.rest
            .invoke_request(Method::POST, BASELINE_PROFILE_URI, Some(&payload))
    }

    pub fn modify(
        &self,
        profile_id: i64,
        description: Option<&str>,
        firmware_repo_id: Option<i64>,
        delta: &GroupDelta,
        job_schedule: Option<&JobSchedule>,
    ) -> Result<Response, OmevvError> {
        let payload = modify_payload(description, firmware_repo_id, delta, job_schedule);
        self.rest.invoke_request(
            Method::PUT,
            &format!("{BASELINE_PROFILE_URI}/{profile_id}"),
            Some(&payload),
        )
    }

    pub fn delete(&self, profile_id: i64) -> Result<Response, OmevvError> {
        self.rest.invoke_request(
            Method::DELETE,
            &format!("{BASELINE_PROFILE_URI}/{profile_id}"),
            None,
        )
    }
}

/// Desired-state body for POST. Optionals left unset stay off the wire.
pub fn create_payload(
    name: &str,
    description: Option<&str>,
    firmware_repo_id: i64,
    group_ids: &[i64],
    job_schedule: Option<&JobSchedule>,
) -> Value {
    let mut payload = Map::new();
    payload.insert("name".to_string(), json!(name));
    if let Some(description) = description {
        payload.insert("description".to_string(), json!(description));
    }
    payload.insert("firmwareRepoId".to_string(), json!(firmware_repo_id));
    payload.insert("groupIds".to_string(), json!(group_ids));
    if let Some(schedule) = job_schedule {
        payload.insert("jobSchedule".to_string(), json!(schedule));
    }
    Value::Object(payload)
}

/// Desired-state body for PUT. Group membership travels as add/remove sets;
/// untouched fields stay off the wire so the console leaves them alone.
pub fn modify_payload(
    description: Option<&str>,
    firmware_repo_id: Option<i64>,
    delta: &GroupDelta,
    job_schedule: Option<&JobSchedule>,
) -> Value {
    let mut payload = Map::new();
    if let Some(description) = description {
        payload.insert("description".to_string(), json!(description));
    }
    if let Some(repo_id) = firmware_repo_id {
        payload.insert("firmwareRepoId".to_string(), json!(repo_id));
    }
    if !delta.add.is_empty() {
        payload.insert("addGroupIds".to_string(), json!(delta.add));
    }
    if !delta.remove.is_empty() {
        payload.insert("removeGroupIds".to_string(), json!(delta.remove));
    }
    if let Some(schedule) = job_schedule {
        payload.insert("jobSchedule".to_string(), json!(schedule));
    }
    Value::Object(payload)
}

/// Everything the operator can say about one baseline profile.
#[derive(Debug, Clone)]
pub struct BaselineProfileConfig {
    pub name: String,
    pub state: DesiredState,
    pub description: Option<String>,
    /// Name of the firmware repository profile backing this baseline.
    pub repository_profile: Option<String>,
    /// Target cluster group ids. `None` leaves the stored membership alone.
    pub cluster_group_ids: Option<Vec<i64>>,
    pub job_schedule: Option<JobSchedule>,
    /// Report the diff without applying it.
    pub check_mode: bool,
    /// Poll the asynchronous job after a mutating call.
    pub wait: bool,
    pub poll: PollPolicy,
}

impl Default for BaselineProfileConfig {
    fn default() -> Self {
        BaselineProfileConfig {
            name: String::new(),
            state: DesiredState::Present,
            description: None,
            repository_profile: None,
            cluster_group_ids: None,
            job_schedule: None,
            check_mode: false,
            wait: true,
            poll: PollPolicy::default(),
        }
    }
}

impl BaselineProfileConfig {
    /// Boundary validation, before any network call.
    fn validate(&self) -> Result<(), OmevvError> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.state == DesiredState::Present {
            if self.repository_profile.is_none() {
                missing.push("repository_profile");
            }
            if self.cluster_group_ids.is_none() {
                missing.push("cluster_group_ids");
            }
        }
        if !missing.is_empty() {
            return Err(OmevvError::MissingParameters(missing.join(", ")));
        }
        if let Some(schedule) = &self.job_schedule {
            schedule.validate()?;
        }
        Ok(())
    }
}

/// Reconcile one baseline profile to its desired state. All errors are
/// translated into the report at this boundary.
pub fn apply_baseline_profile(
    rest: &dyn RestClient,
    config: &BaselineProfileConfig,
) -> OperationReport {
    match run(rest, config) {
        Ok(report) => report,
        Err(err) => OperationReport::from_error(err),
    }
}

fn run(
    rest: &dyn RestClient,
    config: &BaselineProfileConfig,
) -> Result<OperationReport, OmevvError> {
    config.validate()?;
    let profiles = BaselineProfiles::new(rest);
    let current = profiles.get_by_name(&config.name)?;
    match (config.state, current) {
        (DesiredState::Present, None) => create_profile(rest, &profiles, config),
        (DesiredState::Present, Some(profile)) => modify_profile(rest, &profiles, config, &profile),
        (DesiredState::Absent, Some(profile)) => delete_profile(&profiles, config, &profile),
        (DesiredState::Absent, None) => Ok(OperationReport::unchanged(NO_CHANGES_FOUND_MSG)),
    }
}

// The baseline references its firmware repository by server-assigned id;
// the operator hands us the repository's name.
fn resolve_repository(rest: &dyn RestClient, name: &str) -> Result<i64, OmevvError> {
    match FirmwareProfiles::new(rest).get_by_name(name)? {
        Some(repo) => Ok(repo.id),
        None => Err(OmevvError::Validation(format!(
            "Unable to complete the operation because the '{name}' is not a valid 'repository_profile'."
        ))),
    }
}

fn create_profile(
    rest: &dyn RestClient,
    profiles: &BaselineProfiles<'_>,
    config: &BaselineProfileConfig,
) -> Result<OperationReport, OmevvError> {
    // validate() guarantees these for the present state
    let repo_name = config.repository_profile.as_deref().unwrap_or_default();
    let group_ids = config.cluster_group_ids.clone().unwrap_or_default();

    let repo_id = resolve_repository(rest, repo_name)?;
    let payload = create_payload(
        &config.name,
        config.description.as_deref(),
        repo_id,
        &group_ids,
        config.job_schedule.as_ref(),
    );
    let diff = Diff {
        before: Map::new(),
        after: payload.as_object().cloned().unwrap_or_default(),
    };
    if config.check_mode {
        return Ok(OperationReport::changed(CHANGES_FOUND_MSG).with_diff(diff));
    }
    let resp = profiles.create(
        &config.name,
        config.description.as_deref(),
        repo_id,
        &group_ids,
        config.job_schedule.as_ref(),
    )?;
    if !resp.success {
        return Ok(OperationReport::failure(FAILED_CREATION_MSG));
    }
    // fresh read to learn the server-assigned id
    let Some(created) = profiles.get_by_name(&config.name)? else {
        return Ok(OperationReport::failure(FAILED_CREATION_MSG));
    };
    debug!("created baseline profile id {}", created.id);
    if !config.wait {
        return Ok(OperationReport::changed(SUCCESS_CREATION_MSG)
            .with_diff(diff)
            .with_profile(serde_json::to_value(&created).unwrap_or(Value::Null)));
    }
    let outcome = wait_for_terminal(&config.poll, || {
        profiles.get_by_id(created.id).map(|r| r.json_data)
    })?;
    Ok(report_from_outcome(outcome, SUCCESS_CREATION_MSG, FAILED_CREATION_MSG).with_diff(diff))
}

fn modify_profile(
    rest: &dyn RestClient,
    profiles: &BaselineProfiles<'_>,
    config: &BaselineProfileConfig,
    profile: &BaselineProfile,
) -> Result<OperationReport, OmevvError> {
    let repo_id = match config.repository_profile.as_deref() {
        Some(name) => {
            let id = resolve_repository(rest, name)?;
            // unchanged reference stays out of the payload
            (profile.firmware_repo_id != Some(id)).then_some(id)
        }
        None => None,
    };

    let mut desired = Map::new();
    if let Some(description) = &config.description {
        desired.insert("description".to_string(), json!(description));
    }
    if let Some(repo_id) = repo_id {
        desired.insert("firmwareRepoId".to_string(), json!(repo_id));
    }
    if let Some(schedule) = &config.job_schedule {
        desired.insert("jobSchedule".to_string(), json!(schedule));
    }

    let current_map = serde_json::to_value(profile)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default();
    let current_view = trimmed_view(&current_map, &desired);
    let mut diff = map_diff(&current_view, &desired);

    let delta = match &config.cluster_group_ids {
        Some(group_ids) => group_delta(&profile.cluster_groups, group_ids),
        None => GroupDelta::default(),
    };
    if !delta.is_empty() {
        diff.before
            .insert("clusterGroups".to_string(), json!(profile.cluster_groups));
        if !delta.add.is_empty() {
            diff.after.insert("addGroupIds".to_string(), json!(delta.add));
        }
        if !delta.remove.is_empty() {
            diff.after
                .insert("removeGroupIds".to_string(), json!(delta.remove));
        }
    }

    if diff.is_empty() {
        return Ok(OperationReport::unchanged(NO_CHANGES_FOUND_MSG)
            .with_profile(Value::Object(current_map)));
    }
    if config.check_mode {
        return Ok(OperationReport::changed(CHANGES_FOUND_MSG).with_diff(diff));
    }
    let resp = profiles.modify(
        profile.id,
        config.description.as_deref(),
        repo_id,
        &delta,
        config.job_schedule.as_ref(),
    )?;
    if !resp.success {
        return Ok(OperationReport::failure(FAILED_MODIFY_MSG));
    }
    if !config.wait {
        return Ok(OperationReport::changed(SUCCESS_MODIFY_MSG).with_diff(diff));
    }
    let outcome = wait_for_terminal(&config.poll, || {
        profiles.get_by_id(profile.id).map(|r| r.json_data)
    })?;
    Ok(report_from_outcome(outcome, SUCCESS_MODIFY_MSG, FAILED_MODIFY_MSG).with_diff(diff))
}

fn delete_profile(
    profiles: &BaselineProfiles<'_>,
    config: &BaselineProfileConfig,
    profile: &BaselineProfile,
) -> Result<OperationReport, OmevvError> {
    let diff = Diff {
        before: deletion_view(profile),
        after: Map::new(),
    };
    if config.check_mode {
        return Ok(OperationReport::changed(CHANGES_FOUND_MSG).with_diff(diff));
    }
    profiles.delete(profile.id)?;
    Ok(OperationReport::changed(SUCCESS_DELETION_MSG).with_diff(diff))
}

// The user-settable keys of an existing profile, for deletion diffs.
fn deletion_view(profile: &BaselineProfile) -> Map<String, Value> {
    let mut view = Map::new();
    view.insert("name".to_string(), json!(profile.name));
    if let Some(description) = &profile.description {
        view.insert("description".to_string(), json!(description));
    }
    if let Some(repo_id) = profile.firmware_repo_id {
        view.insert("firmwareRepoId".to_string(), json!(repo_id));
    }
    view.insert("clusterGroups".to_string(), json!(profile.cluster_groups));
    if let Some(schedule) = &profile.job_schedule {
        view.insert("jobSchedule".to_string(), json!(schedule));
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    // test_create_payload_omits_absent_optionals tests null-optional
    // omission for description and jobSchedule.
    #[test]
    fn test_create_payload_omits_absent_optionals() {
        let payload = create_payload("TestProfile", None, 1001, &[1, 2], None);
        let map = payload.as_object().unwrap();
        assert!(!map.contains_key("description"));
        assert!(!map.contains_key("jobSchedule"));
        assert_eq!(map["name"], "TestProfile");
        assert_eq!(map["firmwareRepoId"], 1001);
        assert_eq!(map["groupIds"], json!([1, 2]));
    }

    // test_create_payload_with_schedule tests schedule serialization on the
    // wire names.
    #[test]
    fn test_create_payload_with_schedule() {
        let schedule = JobSchedule {
            saturday: true,
            time: "05:30".to_string(),
            ..Default::default()
        };
        let payload = create_payload(
            "TestProfile",
            Some("Baseline profile for testing"),
            1001,
            &[1032],
            Some(&schedule),
        );
        assert_eq!(payload["jobSchedule"]["saturday"], true);
        assert_eq!(payload["jobSchedule"]["monday"], false);
        assert_eq!(payload["jobSchedule"]["time"], "05:30");
    }

    // test_modify_payload_group_sets tests targeted add/remove instead of
    // list replacement.
    #[test]
    fn test_modify_payload_group_sets() {
        let delta = GroupDelta {
            add: vec![1038],
            remove: vec![1032],
        };
        let payload = modify_payload(None, None, &delta, None);
        let map = payload.as_object().unwrap();
        assert_eq!(map["addGroupIds"], json!([1038]));
        assert_eq!(map["removeGroupIds"], json!([1032]));
        assert!(!map.contains_key("groupIds"));
        assert!(!map.contains_key("description"));
    }

    // test_modify_payload_empty_delta tests that an unchanged membership
    // sends neither group key.
    #[test]
    fn test_modify_payload_empty_delta() {
        let payload = modify_payload(Some("new text"), None, &GroupDelta::default(), None);
        let map = payload.as_object().unwrap();
        assert!(!map.contains_key("addGroupIds"));
        assert!(!map.contains_key("removeGroupIds"));
        assert_eq!(map["description"], "new text");
    }

    // test_validate_reports_missing_parameters tests pre-network validation
    // for the present state.
    #[test]
    fn test_validate_reports_missing_parameters() {
        let config = BaselineProfileConfig {
            name: "TestProfile".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required parameters such as: repository_profile, cluster_group_ids"
        );
    }

    // test_validate_rejects_bad_schedule_time tests schedule validation at
    // the boundary.
    #[test]
    fn test_validate_rejects_bad_schedule_time() {
        let config = BaselineProfileConfig {
            name: "TestProfile".to_string(),
            repository_profile: Some("TestRepo".to_string()),
            cluster_group_ids: Some(vec![1032]),
            job_schedule: Some(JobSchedule {
                sunday: true,
                time: "26:90".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
