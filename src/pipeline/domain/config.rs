//! The per-task configuration artifact handed to the plugin.
//!
//! Agents render it, config delivery commits it as `plugin/config.yaml`, and
//! the plugin runner reads it back.

use super::PipelineError;
use crate::store::domain::{ImageName, Registry};
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full plugin configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// What to mirror.
    pub default: PushOptions,
    /// Callback and task identity.
    pub plugin: PluginOptions,
    /// Push destination.
    pub registry: RegistryCredentials,
    /// Kubernetes release whose images to mirror.
    pub kubernetes: KubernetesOptions,
    /// Explicit source images.
    pub images: Vec<String>,
}

/// Selects the image sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushOptions {
    /// Mirror the images listed in [`PluginConfig::images`].
    pub push_images: bool,
    /// Mirror the control-plane images of [`KubernetesOptions::version`].
    pub push_kubernetes: bool,
}

/// Identity of the task and where to report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginOptions {
    /// Base URL of the status callback.
    pub callback: String,
    /// Task the run belongs to.
    pub task_id: i64,
    /// Report outcomes back when set.
    pub synced: bool,
}

/// Registry host, namespace and login.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryCredentials {
    /// Registry host.
    pub repository: String,
    /// Namespace under the host.
    pub namespace: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("repository", &self.repository)
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<&Registry> for RegistryCredentials {
    fn from(registry: &Registry) -> Self {
        Self {
            repository: registry.repository().to_owned(),
            namespace: registry.namespace().to_owned(),
            username: registry.username().to_owned(),
            password: registry.password().to_owned(),
        }
    }
}

/// Kubernetes release selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesOptions {
    /// Release tag such as `v1.29.0`.
    pub version: String,
}

impl PluginConfig {
    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the document is not valid.
    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineError> {
        serde_yaml::from_str(yaml).map_err(|err| PipelineError::config(err.to_string()))
    }

    /// Renders the document as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when serialisation fails.
    pub fn to_yaml(&self) -> Result<String, PipelineError> {
        serde_yaml::to_string(self).map_err(|err| PipelineError::config(err.to_string()))
    }

    /// Reads and parses the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the file cannot be read or
    /// parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, PipelineError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| PipelineError::config(format!("{path} is not a file path")))?;
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| PipelineError::config(format!("failed to open {parent}: {err}")))?;
        let yaml = dir
            .read_to_string(file_name)
            .map_err(|err| PipelineError::config(format!("failed to read {path}: {err}")))?;
        Self::from_yaml(&yaml)
    }

    /// Returns the validated explicit images.
    ///
    /// Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for an entry with embedded
    /// whitespace.
    pub fn listed_images(&self) -> Result<Vec<ImageName>, PipelineError> {
        self.images
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                ImageName::new(raw.as_str()).map_err(|err| PipelineError::config(err.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{PluginConfig, PluginOptions, PushOptions, RegistryCredentials};
    use crate::pipeline::domain::PipelineError;
    use rstest::rstest;

    const SAMPLE: &str = r"
default:
  pushImages: true
  pushKubernetes: false
plugin:
  callback: http://mirrorfleet.internal:8090
  taskId: 7
  synced: true
registry:
  repository: harbor.example.com
  namespace: mirrors
  username: robot
  password: s3cret
kubernetes:
  version: v1.29.0
images:
  - nginx:1.25
  - '  '
  - redis:7
";

    #[rstest]
    fn parses_camel_case_document() {
        let config = PluginConfig::from_yaml(SAMPLE).expect("valid config");

        assert_eq!(
            config.default,
            PushOptions {
                push_images: true,
                push_kubernetes: false
            }
        );
        assert_eq!(
            config.plugin,
            PluginOptions {
                callback: "http://mirrorfleet.internal:8090".to_owned(),
                task_id: 7,
                synced: true
            }
        );
        assert_eq!(config.kubernetes.version, "v1.29.0");
    }

    #[rstest]
    fn yaml_survives_a_render_and_parse_cycle() {
        let config = PluginConfig::from_yaml(SAMPLE).expect("valid config");

        let rendered = config.to_yaml().expect("render");

        assert!(rendered.contains("pushImages: true"));
        assert_eq!(PluginConfig::from_yaml(&rendered).expect("reparse"), config);
    }

    #[rstest]
    fn listed_images_skip_blank_entries() {
        let config = PluginConfig::from_yaml(SAMPLE).expect("valid config");

        let names: Vec<_> = config
            .listed_images()
            .expect("valid images")
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(names, vec!["nginx:1.25", "redis:7"]);
    }

    #[rstest]
    fn listed_images_reject_embedded_whitespace() {
        let config = PluginConfig {
            images: vec!["nginx 1.25".to_owned()],
            ..PluginConfig::default()
        };

        assert!(matches!(
            config.listed_images(),
            Err(PipelineError::Config(reason)) if reason.contains("error image format")
        ));
    }

    #[rstest]
    fn credentials_debug_hides_password() {
        let credentials = RegistryCredentials {
            password: "s3cret".to_owned(),
            ..RegistryCredentials::default()
        };

        assert!(!format!("{credentials:?}").contains("s3cret"));
    }

    #[rstest]
    fn load_reads_document_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, SAMPLE).expect("write config");
        let utf8 = camino::Utf8PathBuf::from_path_buf(path).expect("utf8 path");

        let config = PluginConfig::load(&utf8).expect("load");

        assert_eq!(config.registry.namespace, "mirrors");
    }
}
