// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles app names and target lists in simple or detailed form.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::TargetConfig;
use crate::types::AppName;

pub fn deserialize_app_name<'de, D>(deserializer: D) -> Result<AppName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_targets<'de, D>(deserializer: D) -> Result<NonEmpty<TargetConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<TargetEntry> = Vec::deserialize(deserializer)?;
    let targets = values
        .into_iter()
        .map(|entry| entry.into_target_config())
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(targets)
        .ok_or_else(|| serde::de::Error::custom("at least one target is required"))
}

pub fn deserialize_targets_option<'de, D>(
    deserializer: D,
) -> Result<Option<NonEmpty<TargetConfig>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<TargetEntry>> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(values) => {
            let targets = values
                .into_iter()
                .map(|entry| entry.into_target_config())
                .collect::<Result<Vec<_>, _>>()
                .map_err(serde::de::Error::custom)?;

            let nonempty = NonEmpty::from_vec(targets).ok_or_else(|| {
                serde::de::Error::custom("destination targets list cannot be empty")
            })?;
            Ok(Some(nonempty))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Simple(String),
    Detailed(TargetConfig),
}

impl TargetEntry {
    fn into_target_config(self) -> Result<TargetConfig, String> {
        match self {
            TargetEntry::Simple(s) => TargetConfig::parse(&s),
            TargetEntry::Detailed(c) => Ok(c),
        }
    }
}
