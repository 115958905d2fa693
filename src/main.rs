use clap::{Parser, Subcommand};
use crosswiki::error::{ErrorKind, Result};
use crosswiki::format_link;
use crosswiki::maintenance::{self, DumpSource};
use crosswiki_config::Config;
use crosswiki_store::{Database, IndexStore};
use crosswiki_title::{LinkTarget, Namespace};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crosswiki", version, about = "Maintain the cross-site title index", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register the sites listed in a JSON-lines site dump
    PopulateSites { file: PathBuf },
    /// Index every page of this site from a JSON-lines page dump
    PopulatePages {
        file: PathBuf,
        /// First page ID to process
        #[arg(long)]
        start: Option<u64>,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Remove index rows for pages missing from a JSON-lines page dump
    PurgeDeleted {
        file: PathBuf,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Recompute the normalized key of every title
    RecalculateHashes {
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove every page recorded for a site
    DeleteSitePages { dbname: String },
    /// Print the cross-site links for a page of this site
    Links { namespace: Namespace, title: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn site(config: &Config) -> Result<&str> {
    if config.db_name.is_empty() {
        exn::bail!(ErrorKind::InvalidArgument("db_name is not configured"));
    }
    Ok(&config.db_name)
}

async fn load_dump(file: &Path) -> Result<DumpSource> {
    let source = DumpSource::load(file).await?;
    if source.is_empty() {
        tracing::warn!(file = %file.display(), "Page dump is empty");
    } else {
        tracing::info!(file = %file.display(), pages = source.len(), "Loaded page dump");
    }
    Ok(source)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(parent) = config.database.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Io)?;
    }
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Store)?;
    let store = IndexStore::from(&db).with_read_only(config.read_only);
    let result = execute(cli.command, &config, &store).await;
    db.close().await;
    result
}

async fn execute(command: Command, config: &Config, store: &IndexStore) -> Result<()> {
    match command {
        Command::PopulateSites { file } => {
            let sites = maintenance::read_sites(&file).await?;
            let inserted =
                maintenance::populate_sites(store, sites.iter().map(|site| (&site.dbname, &site.interwiki))).await?;
            println!("Inserted {inserted} of {} sites.", sites.len());
        },
        Command::PopulatePages { file, start, batch_size } => {
            let source = load_dump(&file).await?;
            let batch_size = batch_size.unwrap_or(config.batch_size);
            let summary = maintenance::populate_pages(store, &source, site(config)?, &config.namespaces, start, batch_size)
                .await?;
            println!(
                "Read {} pages in {} batches, inserted {} titles and {} pages.",
                summary.pages_read, summary.batches, summary.titles_inserted, summary.pages_inserted,
            );
        },
        Command::PurgeDeleted { file, batch_size, dry_run } => {
            let source = load_dump(&file).await?;
            let batch_size = batch_size.unwrap_or(config.batch_size);
            let summary = maintenance::purge_deleted_pages(store, &source, site(config)?, batch_size, dry_run).await?;
            let verb = if dry_run { "would delete" } else { "deleted" };
            println!("Processed {} rows, {verb} {}.", summary.processed, summary.deleted);
        },
        Command::RecalculateHashes { batch_size, dry_run } => {
            let batch_size = batch_size.unwrap_or(config.batch_size);
            let summary = maintenance::recalculate_normalized_hashes(store, batch_size, dry_run).await?;
            let verb = if dry_run { "would update" } else { "updated" };
            println!("Processed {} titles, {verb} {}.", summary.processed, summary.updated);
        },
        Command::DeleteSitePages { dbname } => {
            if store.is_read_only() {
                exn::bail!(ErrorKind::ReadOnly);
            }
            let deleted = store.delete_pages_for_site(&dbname).await.or_raise(|| ErrorKind::Store)?;
            println!("Deleted {deleted} pages of {dbname}.");
        },
        Command::Links { namespace, title } => {
            let target = LinkTarget::new(namespace, title.replace(' ', "_"));
            let details =
                store.select_link_details_for_page(site(config)?, &target).await.or_raise(|| ErrorKind::Store)?;
            for link in details.iter().map(format_link) {
                println!("{link}");
            }
        },
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
