use anyhow::{Context, Result};
use tracing::{Level, info};

use silica_credit::{
    Address, CreditConfig, CreditEvent, ScoringEngine,
    config::sanitize_for_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates the signer and inputs
    let config = CreditConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check CHERT_CREDIT_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    let events_path = config
        .input
        .events_path
        .clone()
        .context("CHERT_CREDIT_EVENTS_PATH must be set")?;
    let user: Address = config
        .input
        .user_address
        .as_deref()
        .context("CHERT_CREDIT_USER must be set")?
        .parse()
        .context("Invalid CHERT_CREDIT_USER value")?;

    let shown_path = events_path.display().to_string();
    info!(
        "Loading events from {}",
        if config.logging.sanitize_logs {
            sanitize_for_logging(&shown_path)
        } else {
            shown_path
        }
    );

    let raw = std::fs::read_to_string(&events_path)
        .with_context(|| format!("Failed to read events file {}", events_path.display()))?;
    let events: Vec<CreditEvent> =
        serde_json::from_str(&raw).context("Failed to parse events file")?;

    let as_of = config.as_of();
    info!(user = %user, events = events.len(), as_of = %as_of, "Scoring credit history");

    let engine = ScoringEngine::with_cache_capacity(config.engine.tree_cache_capacity);
    let bundle = {
        // Key material lives only for the signing call
        let signer = config.signer()?;
        info!(
            signer = %config.signer.entity_id,
            public_key = %hex::encode(signer.verifying_key().to_bytes()),
            "Signer loaded"
        );
        engine.build_bundle(&user, &events, as_of, &signer).await?
    };

    info!(
        total_score = bundle.total_score,
        merkle_root = %hex::encode(bundle.merkle_root),
        "Credit score bundle ready"
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&bundle).context("Failed to serialize bundle")?
    );

    Ok(())
}

fn init_logging(config: &CreditConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only the bundle
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    if config.logging.sanitize_logs {
        info!("Logging initialized with data sanitization enabled");
    }

    Ok(())
}
