use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wbs_planner::{
    api::{self, AppState},
    cli::{self, PlanArgs},
    config::AppConfig,
    engine::HourAllocationEngine,
    mcp,
};

#[derive(Parser)]
#[command(name = "wbsp")]
#[command(about = "Work breakdown structure planner with 8+2 hour allocation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API (default: WBS_PLANNER_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Expand a feature file into a WBS and print it
    Plan(PlanArgs),
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "wbs_planner=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // stdout carries the MCP protocol or the plan output
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(config: AppConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting wbs-planner server on port {}", port);
    if config.ai.is_none() {
        tracing::warn!("WBS_PLANNER_AI_URL is not set; AI-backed routes will answer 503");
    }

    let state = AppState::from_config(&config)?;
    let app = api::create_router_with_config(state, config.security);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("wbs-planner listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Some(Commands::Mcp) | Some(Commands::Plan(_)));
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve { port }) => {
            let config = AppConfig::from_env();
            let port = port.unwrap_or(config.port);
            serve(config, port).await?;
        }
        Some(Commands::Mcp) => {
            mcp::run_stdio_server(HourAllocationEngine::default()).await?;
        }
        Some(Commands::Plan(args)) => {
            let output = cli::run_plan(&args, &HourAllocationEngine::default())?;
            print!("{}", output);
        }
        None => {
            let config = AppConfig::from_env();
            let port = config.port;
            serve(config, port).await?;
        }
    }

    Ok(())
}
