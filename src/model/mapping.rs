//! Translation between species labels and the integer type IDs written to CFG files.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while constructing or loading a [`TypeMap`].
#[derive(Debug, Error)]
pub enum TypeMapError {
    #[error("failed to read type map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse type map: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("species label must not be empty")]
    EmptyLabel,

    #[error("species '{0}' is mapped more than once")]
    DuplicateLabel(String),

    #[error("type ID {type_id} is assigned to both '{first}' and '{second}'")]
    DuplicateTypeId {
        type_id: u32,
        first: String,
        second: String,
    },
}

/// Bidirectional association between species labels and wire type IDs.
///
/// The writer looks up `type_id` for every atom and the reader looks up `label`;
/// a `None` from either side is reported as an unknown species or type ID.
pub trait TypeMapping {
    fn type_id(&self, label: &str) -> Option<u32>;

    fn label(&self, type_id: u32) -> Option<&str>;
}

impl<M: TypeMapping + ?Sized> TypeMapping for &M {
    fn type_id(&self, label: &str) -> Option<u32> {
        (**self).type_id(label)
    }

    fn label(&self, type_id: u32) -> Option<&str> {
        (**self).label(type_id)
    }
}

/// A bijective label ↔ type-ID table.
///
/// ```
/// use mtp_cfg::{TypeMap, TypeMapping};
///
/// let types = TypeMap::from_labels(["Si", "O"])?;
/// assert_eq!(types.type_id("O"), Some(2));
/// assert_eq!(types.label(1), Some("Si"));
/// # Ok::<(), mtp_cfg::TypeMapError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMap {
    by_label: BTreeMap<String, u32>,
    by_id: BTreeMap<u32, String>,
}

#[derive(Debug, Deserialize)]
struct TypeMapFile {
    types: BTreeMap<String, u32>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one association, keeping the table bijective.
    pub fn insert(&mut self, label: impl Into<String>, type_id: u32) -> Result<(), TypeMapError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(TypeMapError::EmptyLabel);
        }
        if self.by_label.contains_key(&label) {
            return Err(TypeMapError::DuplicateLabel(label));
        }
        if let Some(first) = self.by_id.get(&type_id) {
            return Err(TypeMapError::DuplicateTypeId {
                type_id,
                first: first.clone(),
                second: label,
            });
        }
        self.by_label.insert(label.clone(), type_id);
        self.by_id.insert(type_id, label);
        Ok(())
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, TypeMapError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (label, type_id) in pairs {
            map.insert(label, type_id)?;
        }
        Ok(map)
    }

    /// Assigns sequential type IDs starting at 1 in the given label order.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, TypeMapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_pairs(labels.into_iter().zip(1u32..))
    }

    /// Parses a TOML document with a `[types]` table of `label = id` entries.
    pub fn from_toml_str(text: &str) -> Result<Self, TypeMapError> {
        let file: TypeMapFile = toml::from_str(text)?;
        Self::from_pairs(file.types)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TypeMapError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates `(label, type_id)` pairs in ascending type-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.by_id.iter().map(|(id, label)| (label.as_str(), *id))
    }
}

impl TypeMapping for TypeMap {
    fn type_id(&self, label: &str) -> Option<u32> {
        self.by_label.get(label).copied()
    }

    fn label(&self, type_id: u32) -> Option<&str> {
        self.by_id.get(&type_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_labels_numbers_from_one() {
        let map = TypeMap::from_labels(["A", "B", "C"]).unwrap();
        assert_eq!(map.type_id("A"), Some(1));
        assert_eq!(map.type_id("C"), Some(3));
        assert_eq!(map.label(2), Some("B"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn lookups_miss_for_unknown_entries() {
        let map = TypeMap::from_labels(["A"]).unwrap();
        assert_eq!(map.type_id("Z"), None);
        assert_eq!(map.label(0), None);
        assert_eq!(map.label(2), None);
    }

    #[test]
    fn insert_rejects_duplicate_type_id() {
        let mut map = TypeMap::new();
        map.insert("Si", 0).unwrap();
        let err = map.insert("O", 0).unwrap_err();
        match err {
            TypeMapError::DuplicateTypeId {
                type_id,
                first,
                second,
            } => {
                assert_eq!(type_id, 0);
                assert_eq!(first, "Si");
                assert_eq!(second, "O");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn insert_rejects_duplicate_and_empty_labels() {
        let mut map = TypeMap::new();
        map.insert("Si", 1).unwrap();
        assert!(matches!(
            map.insert("Si", 2),
            Err(TypeMapError::DuplicateLabel(label)) if label == "Si"
        ));
        assert!(matches!(map.insert("  ", 3), Err(TypeMapError::EmptyLabel)));
    }

    #[test]
    fn parses_toml_types_table() {
        let map = TypeMap::from_toml_str("[types]\nSi = 0\nO = 1\n").unwrap();
        assert_eq!(map.type_id("Si"), Some(0));
        assert_eq!(map.label(1), Some("O"));
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![("Si", 0), ("O", 1)]);
    }

    #[test]
    fn toml_without_types_table_fails() {
        let err = TypeMap::from_toml_str("[species]\nSi = 0\n").unwrap_err();
        assert!(matches!(err, TypeMapError::Parse(_)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.toml");
        std::fs::write(&path, "[types]\nHf = 1\nO = 2\n").unwrap();

        let map = TypeMap::load(&path).unwrap();
        assert_eq!(map.type_id("Hf"), Some(1));
        assert_eq!(map.type_id("O"), Some(2));
    }

    #[test]
    fn reference_implements_mapping() {
        fn lookup<M: TypeMapping>(types: M) -> Option<u32> {
            types.type_id("B")
        }
        let map = TypeMap::from_labels(["A", "B"]).unwrap();
        assert_eq!(lookup(&map), Some(2));
    }
}
