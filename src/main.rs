use anyhow::{Context, Result};
use fxrates::{api, config::Config, pipeline};
use reqwest::Client;
use std::{fs::OpenOptions, path::Path, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config (.env first, then the real environment) ──────────
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;

    // ─── 2) init logging ─────────────────────────────────────────────
    init_tracing(config.log_file.as_deref())?;
    info!(url = %config.zip_url, member = %config.file_to_extract, "startup");

    std::panic::set_hook(Box::new(|info| {
        error!("panic: {}", info);
    }));

    // ─── 3) download + unzip + parse, once ───────────────────────────
    let client = Client::new();
    let table = match pipeline::load_rate_table(&client, &config).await {
        Ok(table) => Arc::new(table),
        Err(e) => {
            error!("cannot start without a rate table: {}", e);
            return Err(e.into());
        }
    };

    // ─── 4) serve lookups ────────────────────────────────────────────
    let router = api::app_router(table);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);
    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder().with_env_filter(env);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}
