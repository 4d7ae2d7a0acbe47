use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Metadata
///
/// A string-keyed profile metadata map as stored by Supabase Auth
/// (`user_metadata` or `app_metadata`). Values are arbitrary JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub HashMap<String, Value>);

impl Metadata {
    /// Returns the `username` entry when it is a non-empty string.
    ///
    /// Only strings count. Other truthy JSON values (numbers, objects, `true`)
    /// are treated as absent and send the visitor to onboarding.
    pub fn username(&self) -> Option<&str> {
        self.0
            .get("username")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Metadata {
    fn from(entries: [(&str, Value); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }
}

/// User
///
/// The visitor identity returned by the identity resolver. Mirrors the subset of the
/// Supabase Auth user object this service reads. Built fresh on every request and
/// dropped once the entry decision is made.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// auth.users.id
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Profile fields the user can edit themselves.
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub user_metadata: Metadata,
    /// Profile fields assigned by the backend.
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub app_metadata: Metadata,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// The profile username. User metadata takes precedence over app metadata;
    /// `None` means onboarding has not been completed.
    pub fn username(&self) -> Option<&str> {
        self.user_metadata
            .username()
            .or_else(|| self.app_metadata.username())
    }
}

// Supabase may send `null` for a metadata map, in API payloads and in token claims.
pub(crate) fn nullable_metadata<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}
