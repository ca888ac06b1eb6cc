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
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::OmevvError;

/// A firmware repository profile as stored on the console. Fields the API
/// may add in newer appliance versions are tolerated and ignored.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirmwareRepositoryProfile {
    pub id: i64,
    pub profile_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// A baseline profile: a firmware repository bound to a set of cluster
/// groups, with an optional recurring compliance-check schedule.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselineProfile {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_repo_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_repo_name: Option<String>,
    pub cluster_groups: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_schedule: Option<JobSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_updated_time: Option<String>,
}

/// Share credential for reaching a firmware catalog. Write-only on the wire:
/// the console never echoes it back, so it is excluded from diffs.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShareCredential {
    pub username: String,
    pub password: String,
    pub domain: String,
}

impl ShareCredential {
    pub fn from_parts(
        username: Option<&str>,
        password: Option<&str>,
        domain: Option<&str>,
    ) -> Self {
        ShareCredential {
            username: username.unwrap_or_default().to_string(),
            password: password.unwrap_or_default().to_string(),
            domain: domain.unwrap_or_default().to_string(),
        }
    }
}

/// Recurring compliance-check schedule: day-of-week flags plus a HH:MM time.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSchedule {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub time: String,
}

impl JobSchedule {
    /// The console expects a 24h HH:MM string.
    pub fn validate(&self) -> Result<(), OmevvError> {
        chrono::NaiveTime::parse_from_str(&self.time, "%H:%M").map_err(|_| {
            OmevvError::Validation(format!(
                "Invalid schedule time '{}'. Expected HH:MM in 24 hour format.",
                self.time
            ))
        })?;
        Ok(())
    }
}

/// Protocol used to reach a firmware catalog share.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, clap::ValueEnum, Copy, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub enum ProtocolType {
    NFS,
    CIFS,
    HTTP,
    HTTPS,
}

impl ProtocolType {
    pub fn from_raw(raw: &str) -> Option<ProtocolType> {
        match raw {
            "NFS" => Some(ProtocolType::NFS),
            "CIFS" => Some(ProtocolType::CIFS),
            "HTTP" => Some(ProtocolType::HTTP),
            "HTTPS" => Some(ProtocolType::HTTPS),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Whether the operator wants the profile to exist.
#[derive(Debug, clap::ValueEnum, Copy, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Profile job status, decoded from the raw strings the console embeds in
/// the profile resource. The two resource types spell their terminal states
/// differently ("Success" vs "SUCCESSFUL"); both map here. Strings outside
/// the known vocabulary decode to `Unknown` so a bad spelling cannot keep a
/// poll loop alive forever.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum ProfileStatus {
    Pending,
    Success,
    Failed,
    Unknown,
}

impl ProfileStatus {
    pub fn from_raw(raw: &str) -> ProfileStatus {
        match raw {
            "Success" | "SUCCESSFUL" => ProfileStatus::Success,
            "Failed" | "FAILED" => ProfileStatus::Failed,
            "Parsing" | "Downloading" | "CREATING" | "MODIFYING" => ProfileStatus::Pending,
            _ => ProfileStatus::Unknown,
        }
    }

    /// Terminal states end polling; `Unknown` is deliberately terminal.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProfileStatus::Pending)
    }
}

impl FromStr for ProfileStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ProfileStatus::from_raw(s))
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // test_status_vocabulary tests the raw-string mapping for both resource
    // types' spellings.
    #[test]
    fn test_status_vocabulary() {
        assert_eq!(ProfileStatus::from_raw("Success"), ProfileStatus::Success);
        assert_eq!(
            ProfileStatus::from_raw("SUCCESSFUL"),
            ProfileStatus::Success
        );
        assert_eq!(ProfileStatus::from_raw("Failed"), ProfileStatus::Failed);
        assert_eq!(ProfileStatus::from_raw("FAILED"), ProfileStatus::Failed);
        assert_eq!(ProfileStatus::from_raw("Parsing"), ProfileStatus::Pending);
        assert_eq!(ProfileStatus::from_raw("CREATING"), ProfileStatus::Pending);
        assert_eq!(ProfileStatus::from_raw("MODIFYING"), ProfileStatus::Pending);
    }

    // test_status_unrecognized_is_unknown tests that out-of-vocabulary
    // strings become Unknown and terminal.
    #[test]
    fn test_status_unrecognized_is_unknown() {
        let status = ProfileStatus::from_raw("Reticulating");
        assert_eq!(status, ProfileStatus::Unknown);
        assert!(status.is_terminal());
        assert!(!ProfileStatus::Pending.is_terminal());
    }

    // test_firmware_profile_wire_names tests camelCase decode of a console
    // response and that unknown fields don't break deserialization.
    #[test]
    fn test_firmware_profile_wire_names() {
        let profile: FirmwareRepositoryProfile = serde_json::from_value(json!({
            "id": 1000,
            "profileName": "Dell Default Catalog",
            "protocolType": "HTTPS",
            "sharePath": "https://downloads.dell.com/catalog/catalog.xml.gz",
            "status": "Success",
            "somethingNew": true
        }))
        .unwrap();
        assert_eq!(profile.id, 1000);
        assert_eq!(profile.profile_name, "Dell Default Catalog");
        assert_eq!(profile.protocol_type.as_deref(), Some("HTTPS"));
        assert_eq!(profile.description, None);
    }

    // test_firmware_profile_serialize_omits_none tests that absent optionals
    // stay off the wire.
    #[test]
    fn test_firmware_profile_serialize_omits_none() {
        let profile = FirmwareRepositoryProfile {
            id: 1,
            profile_name: "test".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&profile).unwrap();
        let map = value.as_object().unwrap();
        assert!(!map.contains_key("description"));
        assert!(!map.contains_key("sharePath"));
    }

    // test_job_schedule_time_validation tests HH:MM boundary validation.
    #[test]
    fn test_job_schedule_time_validation() {
        let mut schedule = JobSchedule {
            saturday: true,
            time: "05:30".to_string(),
            ..Default::default()
        };
        assert!(schedule.validate().is_ok());

        schedule.time = "25:00".to_string();
        assert!(schedule.validate().is_err());

        schedule.time = "half past nine".to_string();
        assert!(schedule.validate().is_err());
    }

    // test_share_credential_from_parts tests empty-string defaults for
    // unset credential parts.
    #[test]
    fn test_share_credential_from_parts() {
        let cred = ShareCredential::from_parts(Some("svc"), None, None);
        assert_eq!(cred.username, "svc");
        assert_eq!(cred.password, "");
        assert_eq!(cred.domain, "");
    }
}
