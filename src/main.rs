//! CLI entry point for quillpress

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quillpress")]
#[command(version)]
#[command(about = "A small server-rendered Markdown blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to config, then the PORT variable)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// File name for the post, without `.md`
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// List all posts
    List,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "quillpress=debug,tower_http=debug,info"
    } else {
        "quillpress=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let blog = quillpress::Blog::new(&base_dir)?;
            let port = port.unwrap_or(blog.config.port);
            let ip = ip.unwrap_or_else(|| blog.config.ip.clone());
            quillpress::server::start(&blog, &ip, port).await?;
        }

        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            quillpress::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::New { title, slug } => {
            let blog = quillpress::Blog::new(&base_dir)?;
            let path = quillpress::commands::new::create_post(&blog, &title, slug.as_deref())?;
            println!("Created: {:?}", path);
        }

        Commands::List => {
            let blog = quillpress::Blog::new(&base_dir)?;
            quillpress::commands::list::run(&blog).await?;
        }

        Commands::Version => {
            println!("quillpress version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
