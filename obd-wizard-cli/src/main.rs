//! OceanBase deploy wizard, command line front end
//!
//! Reads a wizard file, walks it through the same steps as the interactive
//! wizard, submits the deployment to the deployer service and follows the
//! install task.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use obd_wizard_client::HttpDeployerClient;
use obd_wizard_core::types::InstallStatus;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::WizardFile;

#[derive(Parser, Debug)]
#[command(name = "obd-wizard", version, about = "OceanBase deploy wizard")]
struct Args {
    /// Wizard file
    #[arg(short, long, env = "OBD_WIZARD_CONFIG", default_value = "wizard.toml")]
    config: PathBuf,

    /// Deployer service URL, overrides `server.base_url`
    #[arg(long, env = "OBD_DEPLOYER_URL")]
    server: Option<String>,

    /// Deployment name, overrides `deployment.appname`
    #[arg(long)]
    name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the wizard file without contacting the deployer
    Validate,
    /// Create the deployment configuration on the deployer
    Submit,
    /// Follow the install task of an existing deployment
    Watch,
    /// Submit, then follow the install task to the end
    Deploy,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut file = WizardFile::load(&args.config)?;
    if let Some(server) = args.server {
        file.server.base_url = server;
    }
    if let Some(name) = args.name {
        file.deployment.appname = name;
    }

    let status = match args.command {
        Command::Validate => {
            commands::validate(&file)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Submit => {
            commands::submit(&file, &connect(&file)?).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Watch => {
            let client = connect(&file)?;
            commands::watch(&client, &file.deployment.appname, &file).await?
        }
        Command::Deploy => {
            let client = connect(&file)?;
            let mut wizard = commands::submit(&file, &client).await?;
            let name = wizard.config().name().to_string();
            let status = commands::watch(&client, &name, &file).await?;
            wizard.finish_install(&status)?;
            status
        }
    };

    Ok(exit_code(&status))
}

fn connect(file: &WizardFile) -> anyhow::Result<HttpDeployerClient> {
    let client = HttpDeployerClient::new(&file.server.base_url, file.server.timeout())?;
    tracing::info!("Using deployer at {}", client.base_url());
    Ok(client)
}

fn exit_code(status: &InstallStatus) -> ExitCode {
    if *status == InstallStatus::Successful {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
