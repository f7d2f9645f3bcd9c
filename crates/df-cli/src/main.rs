use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use df_core::models::{FleetConfig, Play, Playbook};
use df_core::services::planner::{self, Planner};
use df_core::services::state::BackendMapStore;
use df_core::services::{compose, config_loader, inventory};

/// Remote root for per-instance deployment directories.
const DEPLOY_ROOT: &str = "/home/{{ansible_user}}/deployments";

#[derive(Parser)]
#[command(name = "docker-fleet", about = "Deploy and manage compose instances")]
struct Cli {
    /// Topology config file.
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// Where the generated playbook is written.
    #[arg(long, default_value = "generated_playbook.yml")]
    playbook_out: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy instances
    Deploy { count: u32 },
    /// Destroy an instance by ID, or "all"
    Destroy { target: String },
    /// Restart an instance by ID, or "all"
    Restart { target: String },
    /// List all instance IDs
    Ids,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = setup_logging();

    let config = config_loader::load(&cli.config)?;
    let store = BackendMapStore::new(&config.output.backend_map);
    let mut map = store
        .load_or_init(&config.lb_endpoint, &config.boxes)
        .await?;

    let inventory_hosts =
        inventory::load_hostnames(config.inventory.as_deref().map(Path::new))?;
    let planner = Planner::new(
        DEPLOY_ROOT,
        format!("{DEPLOY_ROOT}/docker"),
        inventory_hosts,
    );

    let mut plays = vec![planner.bootstrap_play()];

    match cli.command {
        Command::Deploy { count } => {
            let template = load_template(&config)?;
            plays.extend(planner.deploy(count, &mut map, &config, &template)?);
            emit_playbook(&plays, &cli.playbook_out, &config).await?;
            store.save(&map).await?;
            run_hook_hint(&config);
        }
        Command::Destroy { target } => {
            if target == "all" {
                plays.extend(planner.destroy_all(&mut map));
            } else {
                plays.extend(planner.destroy(&target, &mut map)?);
            }
            emit_playbook(&plays, &cli.playbook_out, &config).await?;
            store.save(&map).await?;
            run_hook_hint(&config);
        }
        Command::Restart { target } => {
            if target == "all" {
                plays.extend(planner.restart_all(&map));
            } else {
                plays.extend(planner.restart(&target, &map)?);
            }
            emit_playbook(&plays, &cli.playbook_out, &config).await?;
        }
        Command::Ids => {
            for id in planner::list_ids(&map) {
                println!("{id}");
            }
        }
    }

    Ok(())
}

fn load_template(config: &FleetConfig) -> color_eyre::Result<String> {
    let path = Path::new(&config.target).join("docker-compose.yml");
    let template = std::fs::read_to_string(&path)?;

    if let Some(registry) = &config.registry {
        // Image substitution happens outside this tool; surface what would
        // need pushing so the operator notices an unprepared template.
        let images = compose::image_references(&template)?;
        if !images.is_empty() || compose::has_buildable_services(&template)? {
            warn!(
                registry = %registry,
                ?images,
                "template references images or build sections; substitute them \
                 against the registry before executing the playbook"
            );
        }
    }

    Ok(template)
}

async fn emit_playbook(
    plays: &[Play],
    out: &Path,
    config: &FleetConfig,
) -> color_eyre::Result<()> {
    Playbook(plays.to_vec()).write(out).await?;
    let mut command = format!("ansible-playbook {}", out.display());
    if let Some(inventory) = &config.inventory {
        command.push_str(&format!(" -i {inventory}"));
    }
    info!(playbook = %out.display(), "playbook written; execute with: {command}");
    println!("{command}");
    Ok(())
}

fn run_hook_hint(config: &FleetConfig) {
    if let Some(hook) = &config.launch_command {
        info!(
            command = %hook.command,
            context = %hook.context,
            "map updated; run the launch command to reload the load balancer"
        );
    }
}

/// File-based tracing to `deploy.log` in CWD. The returned guard must stay
/// alive for the duration of the program.
fn setup_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "deploy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .init();

    guard
}
