use std::fs;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apotek::auth::{PasswordHasher, SessionKey};
use apotek::config::ServerConfig;
use apotek::server::{AppState, create_router};
use apotek::store::{SqliteStore, Store};
use apotek::types::SUPERADMIN_ROLE;

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

fn generate_password() -> String {
    let mut bytes = [0u8; 9];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[derive(Parser)]
#[command(name = "apotek")]
#[command(about = "A pharmacy POS and inventory server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "5000")]
        port: u16,

        /// Data directory for the database and session secret
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database, session secret, and superadmin account)
    Init {
        /// Data directory for the database and session secret
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: data_dir.into(),
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let secret_path = config.session_secret_path();
    if !secret_path.exists() {
        let key = SessionKey::generate();
        fs::write(&secret_path, key.to_hex())?;

        #[cfg(unix)]
        set_restrictive_permissions(&secret_path);
    }

    if store.has_superadmin()? {
        bail!("Server already initialized. A superadmin account exists.");
    }

    let password = if non_interactive {
        generate_password()
    } else {
        prompt_password()?
    };
    let show_password = non_interactive;

    let hasher = PasswordHasher::new();
    let password_hash = hasher.hash(&password)?;
    store.create_user("superadmin", &password_hash, SUPERADMIN_ROLE, None, "active")?;

    let password_file = config.data_dir.join(".superadmin_password");
    fs::write(&password_file, &password)?;

    #[cfg(unix)]
    set_restrictive_permissions(&password_file);

    println!();
    println!("========================================");
    println!("Created the 'superadmin' account.");
    if show_password {
        println!();
        println!("Password (save this, it won't be shown again):");
        println!();
        println!("  {password}");
    }
    println!();
    println!("Password also written to: {}", password_file.display());
    println!("========================================");
    println!();

    Ok(())
}

fn prompt_password() -> anyhow::Result<String> {
    let password = inquire::Password::new("Superadmin password:")
        .with_validator(|input: &str| {
            if input.len() < 8 {
                Err("Password must be at least 8 characters".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(password)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("apotek=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            let secret_path = config.session_secret_path();
            if !secret_path.exists() {
                bail!(
                    "Server not initialized. Run 'apotek admin init' first to create the database and superadmin account."
                );
            }
            let session_key = SessionKey::from_hex(&fs::read_to_string(&secret_path)?)?;

            let store = SqliteStore::new(config.db_path())?;
            // Schema bootstrap and seeds are idempotent; re-running them at
            // every startup is how additive migrations are applied.
            store.initialize()?;
            if !store.has_superadmin()? {
                bail!(
                    "Server not initialized. Run 'apotek admin init' first to create the database and superadmin account."
                );
            }

            let state = Arc::new(AppState::new(Arc::new(store), session_key));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
