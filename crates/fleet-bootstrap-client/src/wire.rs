// crates/fleet-bootstrap-client/src/wire.rs
// ============================================================================
// Module: Fleet Wire Envelopes
// Description: Response and request envelopes of the Fleet REST API.
// Purpose: Unwrap list and item responses into core model types.
// Dependencies: fleet-bootstrap-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Fleet wraps collections in `items` and single documents in `item`. Package
//! endpoints also send the deprecated `response` key, alone on older versions
//! and next to the current key on newer ones, so each envelope reads both.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fleet_bootstrap_core::ControlPlaneError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Collection response.
///
/// # Invariants
/// - `items` wins over the deprecated `response` key when both are sent.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    /// Returned documents.
    items: Option<Vec<T>>,
    /// Deprecated key carrying the same documents.
    response: Option<Vec<T>>,
}

impl<T> ListResponse<T> {
    /// Returns the documents; a response without either key is empty.
    pub(crate) fn into_items(self) -> Vec<T> {
        self.items.or(self.response).unwrap_or_default()
    }
}

/// Single document response.
///
/// # Invariants
/// - `item` wins over the deprecated `response` key when both are sent.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemResponse<T> {
    /// Returned document.
    item: Option<T>,
    /// Deprecated key carrying the same document.
    response: Option<T>,
}

impl<T> ItemResponse<T> {
    /// Returns the document.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::Decode`] when neither key is present.
    pub(crate) fn into_item(self) -> Result<T, ControlPlaneError> {
        self.item
            .or(self.response)
            .ok_or_else(|| ControlPlaneError::Decode("missing field `item`".to_string()))
    }
}

/// Batch delete request body.
#[derive(Debug, Serialize)]
pub(crate) struct DeleteRequest<'a> {
    /// Package policy identifiers to delete.
    #[serde(rename = "packagePolicyIds")]
    pub(crate) package_policy_ids: &'a [String],
}

/// Returns the ids reported as not deleted by a batch delete response.
///
/// Entries without a `success` flag are treated as deleted.
pub(crate) fn failed_deletions(response: &Value) -> Vec<String> {
    let Some(entries) = response.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|entry| entry.get("success").and_then(Value::as_bool) == Some(false))
        .map(|entry| entry.get("id").and_then(Value::as_str).unwrap_or("<unknown>").to_string())
        .collect()
}
