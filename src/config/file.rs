//! YAML config files: where they are looked up and how they are read.

use super::types::{AppConfig, MergeConfig, DEFAULT_INDENT};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Discovery
// ============================================================================

/// File names probed in every search directory, in priority order.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".sbom-merge.yaml",
    ".sbom-merge.yml",
    "sbom-merge.yaml",
    "sbom-merge.yml",
];

/// Locate the config file to use.
///
/// An explicit path wins when it exists. Otherwise the working directory,
/// the enclosing git checkout, `<config dir>/sbom-merge` and the home
/// directory are probed in that order.
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path.filter(|path| path.exists()) {
        return Some(path.to_path_buf());
    }
    search_dirs()
        .into_iter()
        .find_map(|dir| find_config_in_dir(&dir))
}

fn search_dirs() -> Vec<PathBuf> {
    let cwd = std::env::current_dir().ok();
    let git_root = cwd.as_deref().and_then(enclosing_git_root);
    [
        cwd,
        git_root,
        dirs::config_dir().map(|dir| dir.join("sbom-merge")),
        dirs::home_dir(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Nearest ancestor of `start` (inclusive) holding a `.git` entry.
fn enclosing_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Loading
// ============================================================================

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Read and deserialize one YAML config file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// The discovered config and where it came from; defaults when there is
/// none or it is unusable.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    let Some(path) = discover_config_file(explicit_path) else {
        return (AppConfig::default(), None);
    };
    match load_config_file(&path) {
        Ok(config) => (config, Some(path)),
        Err(err) => {
            tracing::warn!("Ignoring {}: {err}", path.display());
            (AppConfig::default(), None)
        }
    }
}

// ============================================================================
// Layering
// ============================================================================

impl AppConfig {
    /// Layer `other` (usually built from CLI flags) over this config.
    ///
    /// A field of `other` still at its default is treated as unset.
    pub fn merge(&mut self, other: &Self) {
        let merge_defaults = MergeConfig::default();
        if other.merge.format.is_some() {
            self.merge.format = other.merge.format;
        }
        if other.merge.default_first_flavour != merge_defaults.default_first_flavour {
            self.merge.default_first_flavour = other.merge.default_first_flavour;
        }
        if other.merge.default_flavour != merge_defaults.default_flavour {
            self.merge.default_flavour = other.merge.default_flavour;
        }

        let defaults = Self::default();
        if other.provenance.base_image_property != defaults.provenance.base_image_property {
            self.provenance
                .base_image_property
                .clone_from(&other.provenance.base_image_property);
        }
        if other.provenance.platform.is_some() {
            self.provenance.platform.clone_from(&other.provenance.platform);
        }

        if other.base_images.annotator != defaults.base_images.annotator {
            self.base_images.annotator.clone_from(&other.base_images.annotator);
        }
        if other.base_images.builder_property != defaults.base_images.builder_property {
            self.base_images
                .builder_property
                .clone_from(&other.base_images.builder_property);
        }

        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.indent != DEFAULT_INDENT {
            self.output.indent = other.output.indent;
        }
    }
}

// ============================================================================
// Example
// ============================================================================

/// Commented YAML of the default config, for `sbom-merge config example`.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# sbom-merge configuration
# Looked up as .sbom-merge.yaml in the working directory, the git checkout,
# ~/.config/sbom-merge/ and the home directory. Command-line flags take
# precedence over values set here.

{}",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::Flavour;
    use crate::model::SbomFormat;
    use tempfile::TempDir;

    #[test]
    fn test_dotfile_preferred_in_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sbom-merge.yml"), "{}\n").unwrap();
        let dotfile = dir.path().join(".sbom-merge.yaml");
        std::fs::write(&dotfile, "output:\n  indent: 4\n").unwrap();

        assert_eq!(find_config_in_dir(dir.path()), Some(dotfile));
    }

    #[test]
    fn test_empty_dir_has_no_config() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(dir.path()), None);
    }

    #[test]
    fn test_git_root_found_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(enclosing_git_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("merge.yaml");

        let yaml = r#"
merge:
  format: spdx
  default_first_flavour: syft
provenance:
  platform: linux/arm64
"#;
        std::fs::write(&path, yaml).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.merge.format, Some(SbomFormat::Spdx));
        assert_eq!(config.merge.default_first_flavour, Flavour::Syft);
        assert_eq!(config.provenance.platform.as_deref(), Some("linux/arm64"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        assert!(matches!(
            load_config_file(Path::new("/nonexistent/sbom-merge.yaml")),
            Err(ConfigFileError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("merge.yaml");
        std::fs::write(&path, "merge:\n  format: xml\n").unwrap();
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::builder()
            .platform(Some("linux/s390x".to_string()))
            .indent(4)
            .build();
        let overrides = AppConfig::builder()
            .format(SbomFormat::Spdx)
            .output_file(Some("out.json".into()))
            .build();

        base.merge(&overrides);

        assert_eq!(base.merge.format, Some(SbomFormat::Spdx));
        assert_eq!(base.provenance.platform.as_deref(), Some("linux/s390x"));
        assert_eq!(base.output.indent, 4);
        assert_eq!(base.output.file, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_generate_example_config_round_trips() {
        let example = generate_example_config();
        assert!(example.contains("base_image_property"));
        let parsed: AppConfig = serde_yaml::from_str(&example).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ci.yaml");
        std::fs::write(&path, "output:\n  indent: 0\n").unwrap();

        assert_eq!(discover_config_file(Some(&path)), Some(path));
    }

    #[test]
    fn test_unusable_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "output: [\n").unwrap();

        let (config, loaded_from) = load_or_default(Some(&path));
        assert_eq!(config, AppConfig::default());
        assert_eq!(loaded_from, None);
    }
}
