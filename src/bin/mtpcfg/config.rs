use anyhow::{Context, Result, bail};

use mtp_cfg::TypeMap;

use crate::cli::TypeOptions;

pub fn build_type_map(opts: &TypeOptions) -> Result<TypeMap> {
    if let Some(path) = &opts.type_map {
        return TypeMap::load(path)
            .with_context(|| format!("Failed to load type map: {}", path.display()));
    }

    if opts.types.is_empty() {
        bail!("No type mapping given. Use --types or --type-map.");
    }

    TypeMap::from_labels(opts.types.iter().map(|s| s.trim())).context("Invalid --types list")
}

pub fn describe_type_map(types: &TypeMap) -> String {
    types
        .iter()
        .map(|(label, id)| format!("{label}={id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtp_cfg::TypeMapping;

    fn options(types: &[&str]) -> TypeOptions {
        TypeOptions {
            types: types.iter().map(|s| s.to_string()).collect(),
            type_map: None,
        }
    }

    #[test]
    fn labels_are_numbered_from_one() {
        let map = build_type_map(&options(&["Si", " O"])).unwrap();
        assert_eq!(map.type_id("Si"), Some(1));
        assert_eq!(map.type_id("O"), Some(2));
        assert_eq!(describe_type_map(&map), "Si=1, O=2");
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        assert!(build_type_map(&options(&["Si", "Si"])).is_err());
    }

    #[test]
    fn type_map_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.toml");
        std::fs::write(&path, "[types]\nO = 8\nSi = 14\n").unwrap();

        let map = build_type_map(&TypeOptions {
            types: Vec::new(),
            type_map: Some(path),
        })
        .unwrap();
        assert_eq!(map.label(14), Some("Si"));
        assert_eq!(describe_type_map(&map), "O=8, Si=14");
    }
}
