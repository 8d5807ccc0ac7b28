//! Package manifests and the installed-package registry.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Dependency sets recorded for one installed package.
///
/// The on-disk field names (`python`, `apt`) match the legacy state
/// files so an existing install base keeps working.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Dependencies {
    #[serde(rename = "python")]
    pub runtime: Vec<String>,
    #[serde(rename = "apt")]
    pub system: Vec<String>,
}

/// Recorded metadata for one installed package.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PackageManifest {
    /// Paths of discovered command artifacts, in walk order.
    pub commands: Vec<String>,
    pub dependencies: Dependencies,
}

/// A registry entry: either a well-formed manifest or whatever malformed
/// value was found in the state file. Malformed entries are skipped by
/// batch operations but preserved on save rather than silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestRecord {
    Manifest(PackageManifest),
    Malformed(Value),
}

impl ManifestRecord {
    pub fn as_manifest(&self) -> Option<&PackageManifest> {
        match self {
            ManifestRecord::Manifest(m) => Some(m),
            ManifestRecord::Malformed(_) => None,
        }
    }
}

/// Installed-package registry: an ordered map of package name to record.
///
/// Insertion order is preserved across save/load; command resolution
/// depends on it (first-registered-wins).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entries: Vec<(String, ManifestRecord)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Look up a well-formed manifest by package name.
    pub fn get(&self, name: &str) -> Option<&PackageManifest> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, record)| record.as_manifest())
    }

    /// Insert or replace a manifest. A replaced entry keeps its position;
    /// a new entry goes to the end.
    pub fn insert(&mut self, name: &str, manifest: PackageManifest) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, record)) => *record = ManifestRecord::Manifest(manifest),
            None => self
                .entries
                .push((name.to_string(), ManifestRecord::Manifest(manifest))),
        }
    }

    /// Remove an entry. Returns true if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() != before
    }

    /// Iterate entries in insertion order, malformed records included.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManifestRecord)> {
        self.entries.iter().map(|(n, r)| (n, r))
    }

    /// Package names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}

// Serialized as a plain JSON object so the state file keeps the legacy
// shape; the Vec keeps the object's key order.
impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, record) in &self.entries {
            match record {
                ManifestRecord::Manifest(m) => map.serialize_entry(name, m)?,
                ManifestRecord::Malformed(v) => map.serialize_entry(name, v)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Registry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = Registry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of package name to manifest")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Registry, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    // A value that does not parse as a manifest is kept as-is
                    // and skipped by consumers instead of failing the load
                    let record = match serde_json::from_value::<PackageManifest>(value.clone()) {
                        Ok(manifest) => ManifestRecord::Manifest(manifest),
                        Err(_) => ManifestRecord::Malformed(value),
                    };
                    entries.push((name, record));
                }
                Ok(Registry { entries })
            }
        }

        deserializer.deserialize_map(RegistryVisitor)
    }
}
