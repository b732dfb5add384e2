use anyhow::Context;
use dotenv::dotenv;
use quant_norm::config::AppConfig;
use quant_norm::{CanonicalField, CanonicalTable, JsonFileSupplier, Normalizer, RawTableSupplier};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs how well each canonical column was populated.
///
/// For every resolved column this reports the source column it came from and
/// how many of its cells ended up missing.
fn log_summary(table: &CanonicalTable) {
    info!(
        domain = %table.domain(),
        rows = table.len(),
        columns = ?table.columns(),
        "normalized table"
    );

    for field in CanonicalField::ALL {
        match table.source_column(field) {
            Some(source) => info!(
                column = %field,
                source,
                missing = table.null_count(field),
                "column resolved"
            ),
            None => info!(column = %field, "column not present in source"),
        }
    }
}

/// Reads one raw table, normalizes it and prints the canonical records.
///
/// # Workflow Steps
/// - Load environment variables from .env file
/// - Initialize logging to stderr, filtered by `RUST_LOG`
/// - Read `QUANT_NORM_INPUT` and `QUANT_NORM_DOMAIN`
/// - Fetch the raw table from the JSON file supplier
/// - Normalize it for the configured domain
/// - Print the canonical table as pretty JSON on stdout
///
/// # Returns
/// Returns `Ok(())` if all steps complete successfully,
/// otherwise returns an error
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging; stdout is reserved for the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let supplier = JsonFileSupplier::new(&config.input);

    let raw = supplier.fetch().await?;

    let table = Normalizer::new(config.domain)
        .normalize(&raw)
        .with_context(|| format!("failed to normalize {}", supplier.name()))?;

    log_summary(&table);

    println!("{}", serde_json::to_string_pretty(&table.to_json_records())?);

    Ok(())
}
