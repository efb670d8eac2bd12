//! Model identity
//!
//! A model is addressed by its party model id (`role#partyId#id`) and a
//! version string. Every on-disk path is derived from this pair.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the role, party id and model id parts
pub const PARTY_MODEL_ID_SEPARATOR: char = '#';

/// Identity of one model version held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentity {
    role: String,
    party_id: String,
    model_id: String,
    model_version: String,
}

impl ModelIdentity {
    /// Parse a party model id of the form `role#partyId#id` together with a version.
    ///
    /// The id part may itself contain `#`; only the first two separators split.
    pub fn parse(party_model_id: &str, model_version: &str) -> StoreResult<Self> {
        let mut parts = party_model_id.splitn(3, PARTY_MODEL_ID_SEPARATOR);
        let (role, party_id, model_id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(role), Some(party_id), Some(model_id)) => (role, party_id, model_id),
            _ => {
                return Err(StoreError::invalid_identity(format!(
                    "party model id '{}' must have the form role#partyId#modelId",
                    party_model_id
                )))
            }
        };
        Self::new(role, party_id, model_id, model_version)
    }

    /// Build an identity from its parts.
    pub fn new(
        role: impl Into<String>,
        party_id: impl Into<String>,
        model_id: impl Into<String>,
        model_version: impl Into<String>,
    ) -> StoreResult<Self> {
        let identity = Self {
            role: role.into(),
            party_id: party_id.into(),
            model_id: model_id.into(),
            model_version: model_version.into(),
        };
        for (field, value) in [
            ("role", &identity.role),
            ("party_id", &identity.party_id),
            ("model_id", &identity.model_id),
            ("model_version", &identity.model_version),
        ] {
            if value.is_empty() {
                return Err(StoreError::invalid_identity(format!("{} is empty", field)));
            }
            if value.contains('/')
                || value.contains('\\')
                || value.as_str() == "."
                || value.as_str() == ".."
            {
                return Err(StoreError::invalid_identity(format!(
                    "{} '{}' is not a valid path segment",
                    field, value
                )));
            }
        }
        // The model id part may contain '#', the prefix parts may not
        for (field, value) in [("role", &identity.role), ("party_id", &identity.party_id)] {
            if value.contains(PARTY_MODEL_ID_SEPARATOR) {
                return Err(StoreError::invalid_identity(format!(
                    "{} '{}' must not contain '{}'",
                    field, value, PARTY_MODEL_ID_SEPARATOR
                )));
            }
        }
        Ok(identity)
    }

    /// Same model, different version.
    pub fn with_version(&self, model_version: impl Into<String>) -> StoreResult<Self> {
        Self::new(
            self.role.clone(),
            self.party_id.clone(),
            self.model_id.clone(),
            model_version,
        )
    }

    /// Role of the local party (e.g. `guest`, `host`)
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Party id as recorded in the party model id
    pub fn party_id(&self) -> &str {
        &self.party_id
    }

    /// Party id as a number, as required by the import descriptor
    pub fn numeric_party_id(&self) -> StoreResult<u64> {
        self.party_id.parse().map_err(|_| {
            StoreError::invalid_identity(format!("party id '{}' is not numeric", self.party_id))
        })
    }

    /// Bare model id without role and party prefix
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Full `role#partyId#id` string
    pub fn party_model_id(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.role,
            self.party_id,
            self.model_id,
            sep = PARTY_MODEL_ID_SEPARATOR
        )
    }

    /// Model version
    pub fn model_version(&self) -> &str {
        &self.model_version
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.party_model_id(), self.model_version)
    }
}
