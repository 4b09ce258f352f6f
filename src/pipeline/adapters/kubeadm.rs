//! Kubernetes image lists from the kubeadm CLI.

use crate::exec::{CommandRunner, CommandSpec};
use crate::pipeline::{
    domain::{DEFAULT_WARNING_PREFIX, PipelineError, strip_warning_lines},
    ports::ImageListSource,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const KUBEADM: &str = "kubeadm";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KubeadmVersion {
    client_version: ClientVersion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientVersion {
    git_version: String,
}

#[derive(Debug, Deserialize)]
struct KubeadmImages {
    #[serde(default)]
    images: Vec<String>,
}

/// [`ImageListSource`] backed by `kubeadm`.
#[derive(Clone)]
pub struct KubeadmImageSource {
    runner: Arc<dyn CommandRunner>,
    warning_prefix: String,
}

impl KubeadmImageSource {
    /// Creates a source running kubeadm through `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            warning_prefix: DEFAULT_WARNING_PREFIX.to_owned(),
        }
    }

    /// Overrides the prefix of warning lines stripped before parsing.
    #[must_use]
    pub fn with_warning_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.warning_prefix = prefix.into();
        self
    }
}

#[async_trait]
impl ImageListSource for KubeadmImageSource {
    async fn client_version(&self) -> Result<String, PipelineError> {
        let output = self
            .runner
            .run(&CommandSpec::new(KUBEADM).args(["version", "-o", "json"]))
            .await?;
        let json = strip_warning_lines(&output.stdout, &self.warning_prefix);
        let version: KubeadmVersion =
            serde_json::from_str(json).map_err(|err| PipelineError::Malformed {
                what: "kubeadm version",
                reason: err.to_string(),
            })?;
        Ok(version.client_version.git_version)
    }

    async fn list_images(&self, kubernetes_version: &str) -> Result<Vec<String>, PipelineError> {
        let output = self
            .runner
            .run(&CommandSpec::new(KUBEADM).args([
                "config",
                "images",
                "list",
                "--kubernetes-version",
                kubernetes_version,
                "-o",
                "json",
            ]))
            .await?;
        let json = strip_warning_lines(&output.stdout, &self.warning_prefix);
        let listed: KubeadmImages =
            serde_json::from_str(json).map_err(|err| PipelineError::Malformed {
                what: "kubeadm images list",
                reason: err.to_string(),
            })?;
        debug!(
            version = kubernetes_version,
            images = listed.images.len(),
            "listed kubernetes images"
        );
        Ok(listed.images)
    }
}

#[cfg(test)]
mod tests {
    use super::KubeadmImageSource;
    use crate::exec::{CommandOutput, MockCommandRunner, ToolError};
    use crate::pipeline::{domain::PipelineError, ports::ImageListSource};
    use rstest::rstest;
    use std::sync::Arc;

    fn source_returning(stdout: &'static str) -> KubeadmImageSource {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(move |_| Ok(CommandOutput::stdout(stdout)));
        KubeadmImageSource::new(Arc::new(runner))
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn client_version_reads_git_version() {
        let source = source_returning(
            r#"{"clientVersion":{"gitVersion":"v1.29.0","platform":"linux/amd64"}}"#,
        );

        assert_eq!(source.client_version().await.expect("version"), "v1.29.0");
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn list_images_strips_warnings_before_parsing() {
        let source = source_returning(concat!(
            "W0508 12:00:00.000 version.go:104] could not fetch a Kubernetes version\n",
            "W0508 12:00:00.001 version.go:105] falling back to the local client version\n",
            r#"{"kind":"Images","images":["#,
            r#""registry.k8s.io/kube-apiserver:v1.29.0","registry.k8s.io/pause:3.9"]}"#,
        ));

        let images = source.list_images("v1.29.0").await.expect("images");

        assert_eq!(
            images,
            vec![
                "registry.k8s.io/kube-apiserver:v1.29.0".to_owned(),
                "registry.k8s.io/pause:3.9".to_owned()
            ]
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unparseable_output_is_malformed() {
        let source = source_returning("not json");

        assert!(matches!(
            source.list_images("v1.29.0").await,
            Err(PipelineError::Malformed { .. })
        ));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn tool_failure_is_propagated() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|command| {
            Err(ToolError::Failed {
                command: command.to_string(),
                status: Some(1),
                output: "unknown version".to_owned(),
            })
        });
        let source = KubeadmImageSource::new(Arc::new(runner));

        assert!(matches!(
            source.list_images("v0.0.0").await,
            Err(PipelineError::Tool(ToolError::Failed { .. }))
        ));
    }
}
