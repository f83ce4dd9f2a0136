use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tercio::db::{PgStore, migrate};
use tercio::error::GuildError;
use tercio::{AppConfig, GuildRepository, flush, planner, titles};

#[derive(Parser, Debug)]
#[command(name = "tercio")]
#[command(about = "Guild administration for Tercio de Guarnicion")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the document table and change trigger
    Migrate,
    /// Write the default catalog if none exists
    Seed,
    /// List battle plans, newest first
    Plans,
    /// Export a battle plan as CSV
    Export {
        plan_id: String,
        /// Output directory (defaults to TERCIO_EXPORT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the per-member title counts of a season
    Summary { season_id: String },
    /// Snapshot every collection to JSONL files
    Dump { dir: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), GuildError> {
    let config = AppConfig::from_env()?;
    let store = PgStore::connect(config.database_url()?).await?;

    if let Command::Migrate = command {
        return migrate(store.pool()).await;
    }

    let repo = GuildRepository::new(store);
    match command {
        Command::Migrate => {}
        Command::Seed => {
            let catalog = repo.ensure_catalog().await?;
            println!(
                "Catalog ready: {} troops, {} weapons, {} artillery, {} titles",
                catalog.troops.len(),
                catalog.weapons.len(),
                catalog.artillery.len(),
                catalog.nobility_titles.len()
            );
        }
        Command::Plans => {
            let plans = repo.plans().await?;
            for plan in planner::plans_for_loading(&plans) {
                let contents = plan.contents();
                println!(
                    "{}  {}  {:<10} {}",
                    contents.date,
                    contents.id,
                    format!("{:?}", plan.status()).to_lowercase(),
                    contents.name
                );
            }
        }
        Command::Export { plan_id, out } => {
            let plan = repo.plan(&plan_id).await?;
            let catalog = repo.catalog().await?;
            let roster = repo.members().await?;
            let dir = out.unwrap_or(config.export_dir);
            let path = flush::write_plan_csv(&plan, &catalog, &roster, &dir)
                .map_err(|e| GuildError::Store(format!("cannot write export: {e}")))?;
            println!("Wrote {}", path.display());
        }
        Command::Summary { season_id } => {
            let catalog = repo.catalog().await?;
            let season = catalog
                .seasons
                .iter()
                .find(|s| s.id == season_id)
                .ok_or_else(|| GuildError::not_found("season", season_id.as_str()))?;
            let assignments = repo.assignments(&season.id).await?;
            let members = repo.members().await?;
            let rows = titles::season_summary(
                &season.id,
                &assignments,
                &catalog.nobility_titles,
                &members,
            );
            println!("{} (desde {})", season.name, season.start_date);
            for row in rows {
                let counts: Vec<String> = catalog
                    .nobility_titles
                    .iter()
                    .map(|t| format!("{}: {}", t.name, row.counts.get(&t.id).copied().unwrap_or(0)))
                    .collect();
                println!("  {:<24} {}", row.member_name, counts.join(", "));
            }
        }
        Command::Dump { dir } => {
            let written = flush::dump_collections(repo.store(), &dir).await?;
            println!("Wrote {} files to {}", written.len(), dir.display());
        }
    }
    Ok(())
}
