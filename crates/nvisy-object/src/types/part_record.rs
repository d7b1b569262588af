//! Proof-of-upload for a single part.

use serde::{Deserialize, Serialize};

/// One uploaded part: its 1-based number and the entity tag the store
/// returned for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRecord {
    /// 1-based, dense part number.
    pub part_number: u32,
    /// Opaque entity tag returned by the store.
    pub entity_tag: String,
}

impl PartRecord {
    /// Creates a new part record.
    pub fn new(part_number: u32, entity_tag: impl Into<String>) -> Self {
        Self {
            part_number,
            entity_tag: entity_tag.into(),
        }
    }
}
