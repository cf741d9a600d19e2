use anyhow::Result;
use axum::Router;
use clap::{ArgGroup, Parser};
use recipe_core::dataset::DatasetOptions;
use recipe_core::{TfScheme, WeightingConfig};
use recipe_server::{build_app, provision, IndexSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(group(ArgGroup::new("source").required(true).args(["data", "index"])))]
struct Args {
    /// Recipe dataset (.csv, .json or .jsonl) to fit at startup
    #[arg(long)]
    data: Option<PathBuf>,
    /// Index directory written by `indexer build`
    #[arg(long)]
    index: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Title column (defaults to Recipe_name, then Title)
    #[arg(long)]
    title_column: Option<String>,
    #[arg(long, default_value = "Ingredients")]
    ingredients_column: String,
    /// Use 1 + ln(tf) instead of raw counts when fitting
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    /// Use idf = ln(N/df) + 1 instead of ln((1+N)/(1+df)) + 1 when fitting
    #[arg(long, default_value_t = false)]
    no_smooth_idf: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let source = match (args.data, args.index) {
        (Some(data), _) => IndexSource::Fit {
            data,
            dataset: DatasetOptions { title_column: args.title_column, ingredients_column: args.ingredients_column },
            weighting: WeightingConfig {
                tf: if args.sublinear_tf { TfScheme::Sublinear } else { TfScheme::Raw },
                smooth_idf: !args.no_smooth_idf,
            },
        },
        (None, Some(index_dir)) => IndexSource::Prefit { index_dir },
        (None, None) => anyhow::bail!("either --data or --index is required"),
    };
    let index = provision(&source)?;
    tracing::info!(recipes = index.len(), terms = index.vocabulary().len(), "corpus index ready");
    let app: Router = build_app(index);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
