//! Delivery through a per-task branch of the plugin repository.

use crate::delivery::ports::{ConfigDelivery, DeliveryError};
use crate::exec::{CommandRunner, CommandSpec};
use crate::store::domain::TaskId;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory under the data dir holding the plugin repository template.
pub const PLUGIN_DIR: &str = "plugin";
/// File the rendered config is written to inside the plugin checkout.
pub const CONFIG_FILE: &str = "config.yaml";
/// Sibling of the checkout that receives the template copy before it is
/// renamed into place.
const STAGING_DIR: &str = "plugin.partial";

/// [`ConfigDelivery`] that commits the config to branch `<taskId>` and
/// force-pushes it.
///
/// Each task gets `<data_dir>/<taskId>/plugin`, copied once from
/// `<data_dir>/plugin`. The checkout only appears once the copy is complete.
pub struct GitConfigDelivery<C = DefaultClock> {
    data_dir: Utf8PathBuf,
    runner: Arc<dyn CommandRunner>,
    clock: Arc<C>,
}

impl GitConfigDelivery {
    /// Creates a delivery rooted at `data_dir`, stamped by the system clock.
    #[must_use]
    pub fn new(data_dir: impl Into<Utf8PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_clock(data_dir, runner, Arc::new(DefaultClock))
    }
}

impl<C: Clock + Send + Sync> GitConfigDelivery<C> {
    /// Creates a delivery stamped by `clock`.
    #[must_use]
    pub fn with_clock(
        data_dir: impl Into<Utf8PathBuf>,
        runner: Arc<dyn CommandRunner>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            runner,
            clock,
        }
    }

    /// Returns the checkout used for `task_id`.
    #[must_use]
    pub fn checkout_dir(&self, task_id: TaskId) -> Utf8PathBuf {
        self.data_dir.join(task_id.to_string()).join(PLUGIN_DIR)
    }

    async fn git<I, S>(&self, checkout: &Utf8Path, args: I) -> Result<(), DeliveryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = CommandSpec::new("git").args(args).current_dir(checkout);
        self.runner.run(&command).await?;
        Ok(())
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> ConfigDelivery for GitConfigDelivery<C> {
    async fn deliver(&self, task_id: TaskId, config_yaml: &str) -> Result<(), DeliveryError> {
        let branch = task_id.to_string();
        let data_dir = self.data_dir.clone();
        let task_dir = branch.clone();
        tokio::task::spawn_blocking(move || prepare_checkout(&data_dir, &task_dir))
            .await
            .map_err(|err| DeliveryError::Worker(err.to_string()))??;

        let checkout = self.checkout_dir(task_id);
        self.git(&checkout, ["checkout", "-B", branch.as_str()]).await?;

        let yaml = config_yaml.to_owned();
        let target = checkout.clone();
        tokio::task::spawn_blocking(move || write_config(&target, &yaml))
            .await
            .map_err(|err| DeliveryError::Worker(err.to_string()))??;

        let message = format!("{branch}-{}", self.clock.utc().to_rfc3339());
        self.git(&checkout, ["add", CONFIG_FILE]).await?;
        self.git(&checkout, ["commit", "--allow-empty", "-m", message.as_str()])
            .await?;
        self.git(&checkout, ["push", "-f", "origin", branch.as_str()])
            .await?;
        info!(task_id = %task_id, "delivered plugin configuration");
        Ok(())
    }
}

fn prepare_checkout(data_dir: &Utf8Path, task_dir: &str) -> Result<(), DeliveryError> {
    let root = Dir::open_ambient_dir(data_dir, ambient_authority())
        .map_err(|err| DeliveryError::io("open", data_dir, err))?;
    root.create_dir_all(task_dir)
        .map_err(|err| DeliveryError::io("create", data_dir.join(task_dir), err))?;
    let task = root
        .open_dir(task_dir)
        .map_err(|err| DeliveryError::io("open", data_dir.join(task_dir), err))?;
    if task.exists(PLUGIN_DIR) {
        return Ok(());
    }

    let template = root
        .open_dir(PLUGIN_DIR)
        .map_err(|err| DeliveryError::io("open", data_dir.join(PLUGIN_DIR), err))?;
    let staging = data_dir.join(task_dir).join(STAGING_DIR);
    if task.exists(STAGING_DIR) {
        task.remove_dir_all(STAGING_DIR)
            .map_err(|err| DeliveryError::io("remove", &staging, err))?;
    }
    task.create_dir(STAGING_DIR)
        .map_err(|err| DeliveryError::io("create", &staging, err))?;
    debug!(staging = %staging, "copying plugin template");
    if let Err(err) = copy_into(&task, &template, &staging) {
        if let Err(cleanup) = task.remove_dir_all(STAGING_DIR) {
            warn!(path = %staging, error = %cleanup, "failed to remove partial plugin copy");
        }
        return Err(err);
    }
    task.rename(STAGING_DIR, &task, PLUGIN_DIR).map_err(|err| {
        DeliveryError::io("rename", data_dir.join(task_dir).join(PLUGIN_DIR), err)
    })
}

fn copy_into(task: &Dir, template: &Dir, staging: &Utf8Path) -> Result<(), DeliveryError> {
    let copy = task
        .open_dir(STAGING_DIR)
        .map_err(|err| DeliveryError::io("open", staging, err))?;
    copy_tree(template, &copy, staging)
}

fn copy_tree(from: &Dir, to: &Dir, path: &Utf8Path) -> Result<(), DeliveryError> {
    let entries = from
        .entries()
        .map_err(|err| DeliveryError::io("list", path, err))?;
    for item in entries {
        let entry = item.map_err(|err| DeliveryError::io("list", path, err))?;
        let name = entry
            .file_name()
            .map_err(|err| DeliveryError::io("read", path, err))?;
        let entry_path = path.join(&name);
        let file_type = entry
            .file_type()
            .map_err(|err| DeliveryError::io("inspect", &entry_path, err))?;
        if file_type.is_dir() {
            to.create_dir(&name)
                .map_err(|err| DeliveryError::io("create", &entry_path, err))?;
            let source = from
                .open_dir(&name)
                .map_err(|err| DeliveryError::io("open", &entry_path, err))?;
            let target = to
                .open_dir(&name)
                .map_err(|err| DeliveryError::io("open", &entry_path, err))?;
            copy_tree(&source, &target, &entry_path)?;
        } else if file_type.is_file() {
            from.copy(&name, to, &name)
                .map_err(|err| DeliveryError::io("copy", &entry_path, err))?;
        }
    }
    Ok(())
}

fn write_config(checkout: &Utf8Path, yaml: &str) -> Result<(), DeliveryError> {
    let dir = Dir::open_ambient_dir(checkout, ambient_authority())
        .map_err(|err| DeliveryError::io("open", checkout, err))?;
    dir.write(CONFIG_FILE, yaml)
        .map_err(|err| DeliveryError::io("write", checkout.join(CONFIG_FILE), err))
}
