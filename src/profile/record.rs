//! Self-contained export format for a single profile

use super::Profile;
use crate::error::ProfileError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version written by this build; newer records are refused
pub const FORMAT_VERSION: u32 = 1;

/// Device the exported profile was made for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub model: String,
    /// `vvvv:pppp` vendor/product pairs known for the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub device: DeviceIdentity,
    pub profile: Profile,
}

impl ProfileRecord {
    pub fn new(profile: Profile) -> Self {
        let signatures = profile
            .model()
            .map(|m| m.signatures.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        Self {
            format_version: FORMAT_VERSION,
            exported_at: Utc::now(),
            device: DeviceIdentity {
                model: profile.device.clone(),
                signatures,
            },
            profile,
        }
    }

    pub fn to_yaml(&self) -> Result<String, ProfileError> {
        serde_yaml::to_string(self).map_err(|source| ProfileError::Serialize {
            name: self.profile.name.clone(),
            source,
        })
    }

    /// Parse a record; `origin` names the source in errors
    pub fn from_yaml(text: &str, origin: &str) -> Result<Self, ProfileError> {
        let mut record: ProfileRecord =
            serde_yaml::from_str(text).map_err(|e| ProfileError::Corrupt {
                name: origin.to_string(),
                reason: e.to_string(),
            })?;
        if record.format_version > FORMAT_VERSION {
            return Err(ProfileError::Corrupt {
                name: origin.to_string(),
                reason: format!(
                    "format version {} is newer than supported version {}",
                    record.format_version, FORMAT_VERSION
                ),
            });
        }
        // The device block wins if the embedded profile disagrees
        if record.profile.device != record.device.model {
            record.profile.device = record.device.model.clone();
        }
        Ok(record)
    }
}
