use std::{
    fs, io,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docshell::{
    serve,
    shell::{fallback_title, render_page, sibling_pages, toc_for_markdown, ShellContext},
    EnhanceConfig,
};

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to a standalone enhanced HTML page
    Render {
        /// Path to the markdown file
        file: PathBuf,
        /// Write the page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JSON file overriding the page settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the table of contents of a markdown file as JSON
    Toc {
        /// Path to the markdown file
        file: PathBuf,
        /// JSON file overriding the page settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Serve the directory of a markdown file over HTTP
    Serve {
        /// Path to the entry markdown file
        file: PathBuf,
        /// Interface address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Starting port number for the HTTP server
        #[arg(long, default_value = "3333")]
        port: u16,
        /// JSON file overriding the page settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Parser)]
#[command(
    name = "docshell",
    version,
    about = "Render and preview markdown as enhanced documentation pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Print `message` and exit non-zero.
fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

fn load_config(path: Option<&Path>) -> EnhanceConfig {
    match path {
        Some(p) => EnhanceConfig::load(p).unwrap_or_else(|e| fail(e)),
        None => EnhanceConfig::default(),
    }
}

/// Read a markdown file, exiting with a readable message on failure.
fn read_markdown(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("md" | "markdown" | "mdx" | "mdown" | "mkd" | "mkdn") => {}
        Some(ext) => fail(format!("'{ext}' is not a recognized markdown extension")),
        None => fail(format!("'{}' has no file extension", path.display())),
    }
    fs::read_to_string(path).unwrap_or_else(|e| match e.kind() {
        io::ErrorKind::NotFound => fail(format!("file not found: {}", path.display())),
        io::ErrorKind::PermissionDenied => {
            fail(format!("permission denied: {}", path.display()))
        }
        _ => fail(format!("reading '{}': {e}", path.display())),
    })
}

fn run_render(file: &Path, output: Option<&Path>, config: &EnhanceConfig) -> io::Result<()> {
    let source = read_markdown(file);
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let pages = sibling_pages(dir, str::to_owned);
    let fallback = fallback_title(file);
    let ctx = ShellContext {
        site_title: &fallback,
        pages: &pages,
        fallback_title: &fallback,
    };
    let page = render_page(&source, &ctx, config);
    match output {
        Some(out) => {
            fs::write(out, &page.html)?;
            tracing::info!(path = %out.display(), title = %page.title, "page written");
        }
        None => print!("{}", page.html),
    }
    Ok(())
}

fn run_toc(file: &Path, config: &EnhanceConfig) -> io::Result<()> {
    let source = read_markdown(file);
    let tree = toc_for_markdown(&source, config);
    let json = serde_json::to_string_pretty(&tree).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}

fn main() -> io::Result<()> {
    init_tracing();
    match Cli::parse().command {
        Commands::Render {
            file,
            output,
            config,
        } => run_render(&file, output.as_deref(), &load_config(config.as_deref())),
        Commands::Toc { file, config } => run_toc(&file, &load_config(config.as_deref())),
        Commands::Serve {
            file,
            bind,
            port,
            config,
        } => {
            let config = load_config(config.as_deref());
            // Fail on a bad entry file before binding a port.
            read_markdown(&file);
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(serve::run_serve(&file, &bind, port, config))
        }
    }
}
