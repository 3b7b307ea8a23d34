use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use ssr_adapter::build::{BuildTarget, CommandBundler, Integration, ToolConfig};
use ssr_adapter::config::{BuildConfig, Options, DEFAULT_CONFIG_PATH};
use ssr_adapter::server::signal;
use ssr_adapter::{logger, Exports, StaticSiteEngine};

#[derive(Parser)]
#[command(name = "ssr-adapter", version, about = "Build and serve server-rendered sites")]
struct Cli {
    /// Options file, without extension
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve a built site's static output
    Serve {
        /// Directory of the bundled server entry; the client tree is its `../client`
        #[arg(long, conflicts_with_all = ["client_root", "build_config"])]
        server_dir: Option<PathBuf>,
        /// Static output directory, used as-is
        #[arg(long, conflicts_with = "build_config")]
        client_root: Option<PathBuf>,
        /// TOML build metadata; its client_root is served
        #[arg(long)]
        build_config: Option<PathBuf>,
        /// Base path the site is mounted under
        #[arg(long, default_value = "")]
        base: String,
    },
    /// Run the post-build hooks against a finished framework build
    Build {
        /// TOML file with server_entry, server_root and client_root
        #[arg(long, default_value = "build.toml")]
        build_config: PathBuf,
        /// JSON build-tool configuration of the server pass
        #[arg(long)]
        tool_config: Option<PathBuf>,
        /// esbuild-compatible executable
        #[arg(long, default_value = "esbuild")]
        bundler: PathBuf,
    },
    /// Print the adapter descriptor as JSON
    Describe,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let options = Options::load_from(&cli.config)?;
    logger::init(&options.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli.command, options))
}

async fn async_main(command: Command, options: Options) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Serve {
            server_dir,
            client_root,
            build_config,
            base,
        } => {
            let client_root = match (client_root, build_config, server_dir) {
                (Some(root), _, _) => root,
                (None, Some(path), _) => BuildConfig::from_toml_file(&path)?.client_root,
                (None, None, Some(dir)) => BuildConfig::client_root_for(&dir),
                (None, None, None) => BuildConfig::client_root_for(&std::env::current_dir()?),
            };
            serve(options, client_root, &base).await
        }
        Command::Build {
            build_config,
            tool_config,
            bundler,
        } => build(options, &build_config, tool_config, bundler).await,
        Command::Describe => {
            let integration = Integration::new(options, CommandBundler::default());
            println!("{}", serde_json::to_string_pretty(&integration.descriptor())?);
            Ok(())
        }
    }
}

async fn serve(
    options: Options,
    client_root: PathBuf,
    base: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut exports = Exports::new(Arc::new(StaticSiteEngine::new(base)), options, client_root);
    exports.start()?;
    if !exports.running() {
        return Ok(());
    }

    let name = signal::wait_for_shutdown().await?;
    logger::log_info(&format!("Received {name}, shutting down"));
    exports.stop().await;
    Ok(())
}

async fn build(
    options: Options,
    build_config: &std::path::Path,
    tool_config: Option<PathBuf>,
    bundler: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let build_config = BuildConfig::from_toml_file(build_config)?;
    let mut tool_config: ToolConfig = match tool_config {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => ToolConfig::default(),
    };

    let mut integration = Integration::new(options, CommandBundler::new(bundler));
    integration.config_done(build_config);
    integration.build_setup(BuildTarget::Server, &mut tool_config);
    integration.build_done().await?;
    logger::log_build_step("Server entry bundled");
    Ok(())
}
