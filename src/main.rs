use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use headlines::app::App;
use headlines::config::{validate_page_size, Config, API_KEY_ENV};
use headlines::controller::HeadlinesController;
use headlines::keybindings::KeybindingRegistry;
use headlines::news::{build_http_client, Category, NewsApiClient};
use headlines::storage::{
    Database, DatabaseError, FlagStore, MemoryFlagStore, SESSION_CATEGORY_KEY,
};
use headlines::ui;

/// Get the config directory path (~/.config/headlines/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("headlines"))
}

/// Send tracing output to `headlines.log`, but only when `RUST_LOG` is set.
///
/// The TUI owns stdout, so logs can't go to the terminal.
fn init_logging(config_dir: &Path) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let log_path = config_dir.join("headlines.log");
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let log_file = options
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "headlines", about = "Terminal reader for NewsAPI top headlines")]
struct Args {
    /// Category to open: general, business, entertainment, health, science,
    /// sports or technology (default: the last one viewed)
    #[arg(long, short)]
    category: Option<Category>,

    /// Config file (default: ~/.config/headlines/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Articles per request (1-100)
    #[arg(long, value_name = "N")]
    page_size: Option<u32>,

    /// Forget all read/favorite flags and the remembered category
    #[arg(long)]
    reset_db: bool,

    /// Keep flags in memory only; nothing is read from or written to disk
    #[arg(long, conflicts_with = "reset_db")]
    ephemeral: bool,
}

/// Everything a session needs besides the flag store.
struct Session {
    client: NewsApiClient,
    category: Category,
    page_size: u32,
    keybindings: KeybindingRegistry,
    mark_read_on_open: bool,
}

async fn run_session<S: FlagStore>(
    session: Session,
    store: S,
    preferences: Option<Database>,
) -> Result<()> {
    tracing::info!(
        category = %session.category,
        page_size = session.page_size,
        "Starting session"
    );

    let controller = Arc::new(HeadlinesController::new(
        session.client,
        session.category,
        session.page_size,
    ));
    let state_rx = controller.subscribe();

    let feed = controller.state();
    let mut app = App::new(Arc::clone(&controller), store, session.keybindings, feed);
    if let Some(db) = preferences {
        app = app.with_preferences(db);
    }
    app.mark_read_on_open = session.mark_read_on_open;
    app.load_flags().await?;

    ui::run(&mut app, state_rx).await
}

/// CLI flag, then the remembered category, then the config default.
async fn starting_category(args: &Args, db: &Database, config: &Config) -> Category {
    if let Some(category) = args.category {
        return category;
    }
    match db.get_preference(SESSION_CATEGORY_KEY).await {
        Ok(Some(stored)) => match stored.parse() {
            Ok(category) => return category,
            Err(e) => tracing::warn!(error = %e, "Ignoring stored category"),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read stored category"),
    }
    config.default_category
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // User-only access
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!(
                "Warning: failed to restrict {} to 0700: {}",
                config_dir.display(),
                e
            );
        }
    }

    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let page_size = args.page_size.unwrap_or(config.page_size);
    validate_page_size(page_size)?;

    let Some(api_key) = config.resolve_api_key() else {
        eprintln!("Error: No NewsAPI key configured.");
        eprintln!();
        eprintln!("Get a free key at https://newsapi.org/register, then either:");
        eprintln!("  export {}=<your key>", API_KEY_ENV);
        eprintln!("or add to {}:", config_path.display());
        eprintln!("  api_key = \"<your key>\"");
        std::process::exit(1);
    };

    let http = build_http_client().context("Failed to build HTTP client")?;
    let client = NewsApiClient::new(http, &config.base_url, api_key, config.country.clone())
        .with_context(|| format!("Invalid base_url '{}'", config.base_url))?;

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!("{}", warning);
        eprintln!("Warning: {}", warning);
    }

    let mut session = Session {
        client,
        category: args.category.unwrap_or(config.default_category),
        page_size,
        keybindings,
        mark_read_on_open: config.mark_read_on_open,
    };

    if args.ephemeral {
        run_session(session, MemoryFlagStore::new(), None).await?;
        return Ok(());
    }

    let db_path = config_dir.join("headlines.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of headlines appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    if args.reset_db {
        db.reset().await.context("Failed to reset database")?;
        println!("Database reset.");
    }

    session.category = starting_category(&args, &db, &config).await;
    if args.category.is_some() {
        db.set_preference(SESSION_CATEGORY_KEY, session.category.as_str())
            .await
            .context("Failed to save selected category")?;
    }

    let result = run_session(session, db.clone(), Some(db.clone())).await;
    db.close().await;
    result
}
