use std::fmt;

use serde::Deserialize;

/// Opaque provider identifier of a single readings series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One physical meter/commodity: a quantity series and the matching cost
/// series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackedResource {
    pub name: String,
    pub quantity_id: ResourceId,
    pub cost_id: ResourceId,
}

impl TrackedResource {
    pub fn new(name: impl Into<String>, quantity_id: impl Into<ResourceId>, cost_id: impl Into<ResourceId>) -> Self {
        Self {
            name: name.into(),
            quantity_id: quantity_id.into(),
            cost_id: cost_id.into(),
        }
    }

    /// Both series ids, quantity first.
    pub fn resource_ids(&self) -> [&ResourceId; 2] {
        [&self.quantity_id, &self.cost_id]
    }
}
