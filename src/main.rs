//! Mirrorfleet command line: runs the server, an agent or the plugin.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use mirrorfleet::agent::{AgentController, AgentOptions, TaskReconciler};
use mirrorfleet::config::Settings;
use mirrorfleet::delivery::adapters::GitConfigDelivery;
use mirrorfleet::exec::{CommandRunner, TokioCommandRunner};
use mirrorfleet::pipeline::adapters::{
    DockerCliTransport, HttpStatusReporter, KubeadmImageSource, StoreStatusReporter,
};
use mirrorfleet::pipeline::domain::PluginConfig;
use mirrorfleet::pipeline::ports::StatusReporter;
use mirrorfleet::pipeline::services::{PluginRunner, SyncPipeline};
use mirrorfleet::server::ServerController;
use mirrorfleet::store::adapters::postgres;
use mirrorfleet::store::ports::Repositories;
use mirrorfleet::store::services::TaskService;
use mirrorfleet::telemetry::init_tracing;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Distributed container image mirroring.
#[derive(Debug, Parser)]
#[command(name = "mirrorfleet", version, about, long_about = None)]
struct Cli {
    /// Settings file. Built-in defaults apply when omitted.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the scheduler and liveness monitor.
    Server,
    /// Run an agent that reconciles the tasks assigned to it.
    Agent {
        /// Agent name, overriding `agent.name`.
        #[arg(long)]
        name: Option<String>,
        /// Worker count, overriding `agent.workers`.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Mirror the images of one rendered plugin config.
    Plugin {
        /// Plugin config written by the agent.
        #[arg(long, value_name = "FILE")]
        plugin_config: Utf8PathBuf,
        /// Write status to the store instead of the callback URL.
        #[arg(long)]
        direct: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => {
            Settings::load(path).wrap_err_with(|| format!("failed to load settings from {path}"))?
        }
        None => Settings::default(),
    };
    if let Command::Agent { name, workers } = &cli.command {
        if let Some(agent_name) = name {
            agent_name.clone_into(&mut settings.agent.name);
        }
        if let Some(count) = workers {
            settings.agent.workers = *count;
        }
    }
    settings.validate().wrap_err("invalid settings")?;
    init_tracing(settings.log.format).wrap_err("failed to install tracing subscriber")?;

    match cli.command {
        Command::Server => run_server(&settings).await,
        Command::Agent { .. } => run_agent(&settings).await,
        Command::Plugin {
            plugin_config,
            direct,
        } => run_plugin(&settings, &plugin_config, direct).await,
    }
}

fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
        }
        info!("shutdown requested");
        trigger.cancel();
    });
    cancel
}

fn store(settings: &Settings) -> Result<Repositories> {
    let pool = postgres::build_pool(&settings.database.url, settings.database.max_connections)
        .wrap_err("failed to connect to the store")?;
    Ok(postgres::repositories(&pool))
}

async fn run_server(settings: &Settings) -> Result<()> {
    let repositories = store(settings)?;
    let controller = ServerController::new(&settings.server, &repositories);
    controller.run(&shutdown_token()).await;
    Ok(())
}

async fn run_agent(settings: &Settings) -> Result<()> {
    let options = AgentOptions::from_settings(&settings.agent, settings.server.page_size)?;
    let repositories = store(settings)?;
    let runner: Arc<dyn CommandRunner> =
        Arc::new(TokioCommandRunner::new(settings.pipeline.command_timeout));
    let delivery = GitConfigDelivery::new(settings.agent.data_dir.clone(), runner);
    let reconciler = TaskReconciler::new(
        options.name.clone(),
        settings.agent.callback.clone(),
        repositories.clone(),
        Arc::new(delivery),
    );
    let controller = Arc::new(AgentController::new(options, repositories, reconciler));
    controller
        .run(shutdown_token())
        .await
        .wrap_err("agent failed")?;
    Ok(())
}

async fn run_plugin(settings: &Settings, path: &Utf8Path, direct: bool) -> Result<()> {
    let config = PluginConfig::load(path).wrap_err("failed to load plugin config")?;
    let runner: Arc<dyn CommandRunner> =
        Arc::new(TokioCommandRunner::new(settings.pipeline.command_timeout));
    let reporter: Arc<dyn StatusReporter> = if direct {
        let repositories = store(settings)?;
        Arc::new(StoreStatusReporter::new(TaskService::new(
            repositories.tasks,
            repositories.registries,
            repositories.images,
        )))
    } else {
        Arc::new(
            HttpStatusReporter::new(
                config.plugin.callback.as_str(),
                settings.pipeline.callback_timeout,
            )
            .wrap_err("failed to build callback client")?,
        )
    };
    let images = KubeadmImageSource::new(Arc::clone(&runner))
        .with_warning_prefix(settings.pipeline.warning_prefix.as_str());
    let pipeline = SyncPipeline::new(Arc::new(DockerCliTransport::new(runner)));
    let plugin = PluginRunner::new(Arc::new(images), pipeline, reporter);

    plugin
        .run(&config)
        .await
        .wrap_err_with(|| format!("plugin run for task {} failed", config.plugin.task_id))?;
    info!(task_id = config.plugin.task_id, "plugin run succeeded");
    Ok(())
}
