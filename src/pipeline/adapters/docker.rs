//! Registry transport that shells out to the docker CLI.

use crate::exec::{CommandRunner, CommandSpec, ToolError};
use crate::pipeline::{domain::RegistryCredentials, ports::RegistryTransport};
use async_trait::async_trait;
use std::sync::Arc;

const DOCKER: &str = "docker";

/// [`RegistryTransport`] backed by `docker login/pull/tag/push`.
#[derive(Clone)]
pub struct DockerCliTransport {
    runner: Arc<dyn CommandRunner>,
}

impl DockerCliTransport {
    /// Creates a transport running docker through `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn docker(&self, command: CommandSpec) -> Result<(), ToolError> {
        self.runner.run(&command).await.map(|_| ())
    }
}

#[async_trait]
impl RegistryTransport for DockerCliTransport {
    async fn login(&self, registry: &RegistryCredentials) -> Result<(), ToolError> {
        let mut command = CommandSpec::new(DOCKER)
            .args(["login", "-u", registry.username.as_str(), "--password-stdin"])
            .secret_stdin(registry.password.as_str());
        if !registry.repository.is_empty() {
            command = command.arg(registry.repository.as_str());
        }
        self.docker(command).await
    }

    async fn pull(&self, image: &str) -> Result<(), ToolError> {
        self.docker(CommandSpec::new(DOCKER).args(["pull", image]))
            .await
    }

    async fn tag(&self, source: &str, target: &str) -> Result<(), ToolError> {
        self.docker(CommandSpec::new(DOCKER).args(["tag", source, target]))
            .await
    }

    async fn push(&self, target: &str) -> Result<(), ToolError> {
        self.docker(CommandSpec::new(DOCKER).args(["push", target]))
            .await
    }
}
