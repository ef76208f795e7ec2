//! Asset descriptors and the fixed, ordered catalog built from them at startup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PlacementError, Result};

/// Logical asset identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for AssetId {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Immutable mapping from a logical id to its source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: AssetId,
    /// Human readable name used in status messages
    pub name: String,
    pub uri: String,
}

impl AssetDescriptor {
    #[must_use]
    pub fn new(id: impl Into<AssetId>, name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            uri: uri.into(),
        }
    }
}

/// The ordered descriptor list. Order defines the "advance to next asset" cycle.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    descriptors: Vec<AssetDescriptor>,
}

impl AssetCatalog {
    /// Builds a catalog, rejecting empty lists and duplicate ids.
    pub fn new(descriptors: Vec<AssetDescriptor>) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(PlacementError::EmptyCatalog);
        }
        for (i, d) in descriptors.iter().enumerate() {
            if descriptors[..i].iter().any(|other| other.id == d.id) {
                return Err(PlacementError::InvalidConfig(format!(
                    "duplicate asset id {}",
                    d.id
                )));
            }
        }
        Ok(Self { descriptors })
    }

    #[must_use]
    pub fn get(&self, id: AssetId) -> Option<&AssetDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: AssetId) -> bool {
        self.get(id).is_some()
    }

    /// The first descriptor, shown when the application starts.
    #[must_use]
    pub fn first(&self) -> AssetId {
        self.descriptors[0].id
    }

    /// The id following `id`, wrapping around at the end of the list.
    ///
    /// Returns `None` if `id` is not part of the catalog.
    #[must_use]
    pub fn next(&self, id: AssetId) -> Option<AssetId> {
        let pos = self.descriptors.iter().position(|d| d.id == id)?;
        Some(self.descriptors[(pos + 1) % self.descriptors.len()].id)
    }

    /// Display name of `id`, falling back to the id itself.
    #[must_use]
    pub fn name(&self, id: AssetId) -> String {
        self.get(id)
            .map_or_else(|| id.to_string(), |d| d.name.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.descriptors.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.descriptors.iter().map(|d| d.id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
