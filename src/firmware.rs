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

// firmware.rs
// Firmware repository profiles: the REST accessor, payload construction,
// and the idempotent present/absent apply flow.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{
    diff::{map_diff, trimmed_view, Diff},
    model::{DesiredState, FirmwareRepositoryProfile, ProtocolType, ShareCredential},
    network::{Method, Response, RestClient},
    poll::{wait_for_terminal, PollPolicy},
    reconcile::{
        report_from_outcome, OperationReport, CHANGES_FOUND_MSG, FAILED_CONN_MSG,
        NO_CHANGES_FOUND_MSG,
    },
    OmevvError,
};

pub const PROFILE_URI: &str = "/RepositoryProfiles";
pub const TEST_CONNECTION_URI: &str = "/RepositoryProfiles/TestConnection";

pub const SUCCESS_CREATION_MSG: &str =
    "Successfully created the OMEVV firmware repository profile.";
pub const FAILED_CREATION_MSG: &str = "Unable to create the OMEVV firmware repository profile.";
pub const SUCCESS_MODIFY_MSG: &str =
    "Successfully modified the OMEVV firmware repository profile.";
pub const FAILED_MODIFY_MSG: &str = "Unable to modify the OMEVV firmware repository profile.";
pub const SUCCESS_DELETION_MSG: &str =
    "Successfully deleted the OMEVV firmware repository profile.";

/// Accessor for the `/RepositoryProfiles` resource family. Each method
/// issues exactly one REST call.
pub struct FirmwareProfiles<'a> {
    rest: &'a dyn RestClient,
}

impl<'a> FirmwareProfiles<'a> {
    pub fn new(rest: &'a dyn RestClient) -> Self {
        FirmwareProfiles { rest }
    }

    pub fn list(&self) -> Result<Vec<FirmwareRepositoryProfile>, OmevvError> {
        let resp = self.rest.invoke_request(Method::GET, PROFILE_URI, None)?;
        serde_json::from_value(resp.json_data.clone()).map_err(|e| OmevvError::JsonDeserialize {
            url: PROFILE_URI.to_string(),
            body: resp.json_data.to_string(),
            source: e,
        })
    }

    /// Lists all profiles and filters client-side by exact name. First match
    /// wins; absence is an empty result, not an error.
    pub fn get_by_name(
        &self,
        profile_name: &str,
    ) -> Result<Option<FirmwareRepositoryProfile>, OmevvError> {
        let profiles = self.list()?;
        Ok(profiles
            .into_iter()
            .find(|p| p.profile_name == profile_name))
    }

    pub fn get_by_id(&self, profile_id: i64) -> Result<Response, OmevvError> {
        self.rest
            .invoke_request(Method::GET, &format!("{PROFILE_URI}/{profile_id}"), None)
    }

    pub fn test_connection(
        &self,
        protocol_type: ProtocolType,
        catalog_path: &str,
        credential: &ShareCredential,
    ) -> Result<bool, OmevvError> {
        let payload = conn_payload(protocol_type, catalog_path, credential);
        let resp = self
            .rest
            .invoke_request(Method::POST, TEST_CONNECTION_URI, Some(&payload))?;
        Ok(resp.success)
    }

    pub fn create(
        &self,
        name: &str,
        catalog_path: &str,
        description: Option<&str>,
        protocol_type: ProtocolType,
        credential: &ShareCredential,
    ) -> Result<Response, OmevvError> {
        let payload = create_payload(name, catalog_path, description, protocol_type, credential);
        self.rest
            .invoke_request(Method::POST, PROFILE_URI, Some(&payload))
    }

    pub fn modify(
        &self,
        profile_id: i64,
        name: &str,
        catalog_path: &str,
        description: Option<&str>,
        credential: &ShareCredential,
    ) -> Result<Response, OmevvError> {
        let payload = modify_payload(name, catalog_path, description, credential);
        self.rest.invoke_request(
            Method::PUT,
            &format!("{PROFILE_URI}/{profile_id}"),
            Some(&payload),
        )
    }

    pub fn delete(&self, profile_id: i64) -> Result<Response, OmevvError> {
        self.rest
            .invoke_request(Method::DELETE, &format!("{PROFILE_URI}/{profile_id}"), None)
    }
}

/// Desired-state body for POST. Optionals left unset stay off the wire.
pub fn create_payload(
    name: &str,
    catalog_path: &str,
    description: Option<&str>,
    protocol_type: ProtocolType,
    credential: &ShareCredential,
) -> Value {
    let mut payload = Map::new();
    payload.insert("profileName".to_string(), json!(name));
    payload.insert("protocolType".to_string(), json!(protocol_type));
    payload.insert("sharePath".to_string(), json!(catalog_path));
    if let Some(description) = description {
        payload.insert("description".to_string(), json!(description));
    }
    payload.insert("profileType".to_string(), json!("Firmware"));
    payload.insert("shareCredential".to_string(), json!(credential));
    Value::Object(payload)
}

/// Desired-state body for PUT. The console rejects changing `protocolType`
/// or `profileType` after creation, so neither appears here.
pub fn modify_payload(
    name: &str,
    catalog_path: &str,
    description: Option<&str>,
    credential: &ShareCredential,
) -> Value {
    let mut payload = Map::new();
    payload.insert("profileName".to_string(), json!(name));
    payload.insert("sharePath".to_string(), json!(catalog_path));
    if let Some(description) = description {
        payload.insert("description".to_string(), json!(description));
    }
    payload.insert("shareCredential".to_string(), json!(credential));
    Value::Object(payload)
}

pub fn conn_payload(
    protocol_type: ProtocolType,
    catalog_path: &str,
    credential: &ShareCredential,
) -> Value {
    json!({
        "protocolType": protocol_type,
        "catalogPath": catalog_path,
        "shareCredential": credential,
        "checkCertificate": false,
    })
}

/// Everything the operator can say about one firmware repository profile.
#[derive(Debug, Clone)]
pub struct FirmwareRepositoryConfig {
    pub name: String,
    pub state: DesiredState,
    pub description: Option<String>,
    pub protocol_type: Option<ProtocolType>,
    pub catalog_path: Option<String>,
    pub share_username: Option<String>,
    pub share_password: Option<String>,
    pub share_domain: Option<String>,
    /// Report the diff without applying it.
    pub check_mode: bool,
    /// Poll the asynchronous job after a mutating call.
    pub wait: bool,
    pub poll: PollPolicy,
}

impl Default for FirmwareRepositoryConfig {
    fn default() -> Self {
        FirmwareRepositoryConfig {
            name: String::new(),
            state: DesiredState::Present,
            description: None,
            protocol_type: None,
            catalog_path: None,
            share_username: None,
            share_password: None,
            share_domain: None,
            check_mode: false,
            wait: true,
            poll: PollPolicy::default(),
        }
    }
}

impl FirmwareRepositoryConfig {
    /// Boundary validation, before any network call.
    fn validate(&self) -> Result<(), OmevvError> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.state == DesiredState::Present {
            if self.catalog_path.is_none() {
                missing.push("catalog_path");
            }
            if self.protocol_type.is_none() {
                missing.push("protocol_type");
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OmevvError::MissingParameters(missing.join(", ")))
        }
    }

    fn credential(&self) -> ShareCredential {
        ShareCredential::from_parts(
            self.share_username.as_deref(),
            self.share_password.as_deref(),
            self.share_domain.as_deref(),
        )
    }
}

/// Reconcile one firmware repository profile to its desired state. All
/// errors are translated into the report at this boundary.
pub fn apply_firmware_repository(
    rest: &dyn RestClient,
    config: &FirmwareRepositoryConfig,
) -> OperationReport {
    match run(rest, config) {
        Ok(report) => report,
        Err(err) => OperationReport::from_error(err),
    }
}

fn run(
    rest: &dyn RestClient,
    config: &FirmwareRepositoryConfig,
) -> Result<OperationReport, OmevvError> {
    config.validate()?;
    let profiles = FirmwareProfiles::new(rest);
    let current = profiles.get_by_name(&config.name)?;
    match (config.state, current) {
        (DesiredState::Present, None) => create_profile(&profiles, config),
        (DesiredState::Present, Some(profile)) => modify_profile(&profiles, config, &profile),
        (DesiredState::Absent, Some(profile)) => delete_profile(&profiles, config, &profile),
        (DesiredState::Absent, None) => Ok(OperationReport::unchanged(NO_CHANGES_FOUND_MSG)),
    }
}

fn create_profile(
    profiles: &FirmwareProfiles<'_>,
    config: &FirmwareRepositoryConfig,
) -> Result<OperationReport, OmevvError> {
    // validate() guarantees these for the present state
    let catalog_path = config.catalog_path.as_deref().unwrap_or_default();
    let protocol_type = config.protocol_type.unwrap_or(ProtocolType::HTTPS);
    let credential = config.credential();

    let payload = create_payload(
        &config.name,
        catalog_path,
        config.description.as_deref(),
        protocol_type,
        &credential,
    );
    let diff = Diff {
        before: Map::new(),
        after: redacted(&payload),
    };
    if config.check_mode {
        return Ok(OperationReport::changed(CHANGES_FOUND_MSG).with_diff(diff));
    }
    if !profiles.test_connection(protocol_type, catalog_path, &credential)? {
        return Ok(OperationReport::failure(FAILED_CONN_MSG));
    }
    let resp = profiles.create(
        &config.name,
        catalog_path,
        config.description.as_deref(),
        protocol_type,
        &credential,
    )?;
    if !resp.success {
        return Ok(OperationReport::failure(FAILED_CREATION_MSG));
    }
    // fresh read to learn the server-assigned id
    let Some(created) = profiles.get_by_name(&config.name)? else {
        return Ok(OperationReport::failure(FAILED_CREATION_MSG));
    };
    debug!("created firmware repository profile id {}", created.id);
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
    profiles: &FirmwareProfiles<'_>,
    config: &FirmwareRepositoryConfig,
    profile: &FirmwareRepositoryProfile,
) -> Result<OperationReport, OmevvError> {
    let catalog_path = config
        .catalog_path
        .as_deref()
        .or(profile.share_path.as_deref())
        .unwrap_or_default();
    let credential = config.credential();

    let desired = modify_payload(
        &config.name,
        catalog_path,
        config.description.as_deref(),
        &credential,
    );
    let desired_view = redacted(&desired);
    let current_map = serde_json::to_value(profile)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default();
    let current_view = trimmed_view(&current_map, &desired_view);
    let diff = map_diff(&current_view, &desired_view);
    if diff.is_empty() {
        return Ok(OperationReport::unchanged(NO_CHANGES_FOUND_MSG)
            .with_profile(Value::Object(current_map)));
    }
    if config.check_mode {
        return Ok(OperationReport::changed(CHANGES_FOUND_MSG).with_diff(diff));
    }
    let protocol_type = profile
        .protocol_type
        .as_deref()
        .and_then(ProtocolType::from_raw)
        .or(config.protocol_type)
        .unwrap_or(ProtocolType::HTTPS);
    if !profiles.test_connection(protocol_type, catalog_path, &credential)? {
        return Ok(OperationReport::failure(FAILED_CONN_MSG));
    }
    let resp = profiles.modify(
        profile.id,
        &config.name,
        catalog_path,
        config.description.as_deref(),
        &credential,
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
    profiles: &FirmwareProfiles<'_>,
    config: &FirmwareRepositoryConfig,
    profile: &FirmwareRepositoryProfile,
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
fn deletion_view(profile: &FirmwareRepositoryProfile) -> Map<String, Value> {
    let mut view = Map::new();
    view.insert("profileName".to_string(), json!(profile.profile_name));
    if let Some(path) = &profile.share_path {
        view.insert("sharePath".to_string(), json!(path));
    }
    if let Some(protocol) = &profile.protocol_type {
        view.insert("protocolType".to_string(), json!(protocol));
    }
    if let Some(description) = &profile.description {
        view.insert("description".to_string(), json!(description));
    }
    view
}

// Strip the write-only credential from a payload before it is compared or
// shown to the operator.
fn redacted(payload: &Value) -> Map<String, Value> {
    let mut map = payload.as_object().cloned().unwrap_or_default();
    map.remove("shareCredential");
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    // test_create_payload_omits_absent_description tests null-optional
    // omission and the fixed profileType.
    #[test]
    fn test_create_payload_omits_absent_description() {
        let payload = create_payload(
            "Dell Default Catalog",
            "https://downloads.dell.com/catalog/catalog.xml.gz",
            None,
            ProtocolType::HTTPS,
            &ShareCredential::default(),
        );
        let map = payload.as_object().unwrap();
        assert!(!map.contains_key("description"));
        assert_eq!(map["profileName"], "Dell Default Catalog");
        assert_eq!(map["protocolType"], "HTTPS");
        assert_eq!(map["profileType"], "Firmware");
        assert_eq!(map["shareCredential"]["username"], "");
    }

    // test_create_payload_includes_given_description tests value
    // passthrough.
    #[test]
    fn test_create_payload_includes_given_description() {
        let payload = create_payload(
            "test",
            "/catalog/",
            Some("Latest Firmware From Dell"),
            ProtocolType::CIFS,
            &ShareCredential::from_parts(Some("user"), Some("pass"), Some("dom")),
        );
        let map = payload.as_object().unwrap();
        assert_eq!(map["description"], "Latest Firmware From Dell");
        assert_eq!(map["shareCredential"]["domain"], "dom");
    }

    // test_modify_payload_excludes_immutable_keys tests that protocolType
    // and profileType stay out of PUT bodies.
    #[test]
    fn test_modify_payload_excludes_immutable_keys() {
        let payload = modify_payload("test", "/catalog/", None, &ShareCredential::default());
        let map = payload.as_object().unwrap();
        assert!(!map.contains_key("protocolType"));
        assert!(!map.contains_key("profileType"));
        assert!(map.contains_key("shareCredential"));
    }

    // test_conn_payload_shape tests the TestConnection body.
    #[test]
    fn test_conn_payload_shape() {
        let payload = conn_payload(
            ProtocolType::HTTPS,
            "https://downloads.dell.com/catalog/catalog.xml.gz",
            &ShareCredential::default(),
        );
        assert_eq!(payload["checkCertificate"], false);
        assert_eq!(payload["catalogPath"], "https://downloads.dell.com/catalog/catalog.xml.gz");
        assert_eq!(payload["shareCredential"]["password"], "");
    }

    // test_validate_reports_missing_parameters tests the pre-network
    // validation message.
    #[test]
    fn test_validate_reports_missing_parameters() {
        let config = FirmwareRepositoryConfig {
            name: "test".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required parameters such as: catalog_path, protocol_type"
        );

        let config = FirmwareRepositoryConfig {
            name: "test".to_string(),
            state: DesiredState::Absent,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    // test_redacted_strips_credential tests credential redaction for diffs.
    #[test]
    fn test_redacted_strips_credential() {
        let payload = create_payload(
            "test",
            "/catalog/",
            None,
            ProtocolType::NFS,
            &ShareCredential::from_parts(Some("user"), Some("secret"), None),
        );
        let view = redacted(&payload);
        assert!(!view.contains_key("shareCredential"));
        assert!(view.contains_key("profileName"));
    }
}
