use clap::Parser;
use report_relocator::config::credentials::load_dotenv;
use report_relocator::utils::{logger, validation::Validate};
use report_relocator::{
    CliConfig, Credentials, MappingTable, RelocatorConfig, RelocatorError, RelocatorOptions,
    ReportRelocator, SalesforceClient,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    // .env has to be in the environment before RUST_LOG and ${VAR} settings are read
    let dotenv = load_dotenv();

    // 初始化日誌
    logger::init_logger(cli.verbose, cli.log_format);

    match dotenv {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("⚠️ Ignoring unreadable .env file: {}", e),
    }

    tracing::info!("🚀 Starting report-relocator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Program failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }
}

async fn run(cli: &CliConfig) -> Result<(), RelocatorError> {
    cli.validate()?;

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading settings from: {}", path);
            RelocatorConfig::from_file(path)?
        }
        None => RelocatorConfig::default(),
    };
    cli.apply_to(&mut config);
    config.validate()?;

    // The mapping file is read and schema-checked before any remote call.
    let table = MappingTable::from_path(&cli.mapping_file).inspect_err(|e| {
        tracing::error!("Error processing mapping file {}: {}", cli.mapping_file, e);
    })?;
    tracing::info!(
        "📄 Loaded {} rows from {}",
        table.len(),
        cli.mapping_file
    );

    let credentials = Credentials::from_env()?;
    tracing::info!(
        "🔐 Connecting to Salesforce ({}, {})",
        config.salesforce.environment(),
        config.salesforce.login_base_url()
    );

    let client =
        SalesforceClient::login(&credentials, &config.salesforce, config.retry.policy())
            .await
            .inspect_err(|e| tracing::error!("Failed to connect to Salesforce: {}", e))?;
    tracing::info!(
        "✅ Successfully connected to Salesforce ({})",
        client.instance_url()
    );

    let relocator = ReportRelocator::with_options(
        client,
        RelocatorOptions {
            dry_run: cli.dry_run,
            on_ambiguous: config.folders.on_ambiguous,
        },
    );
    let summary = relocator.process_table(&table).await;

    tracing::info!("✅ Report organization completed");
    println!(
        "✅ Done: {} rows, {} moved, {} planned, {} skipped, {} failed",
        summary.total_rows, summary.succeeded, summary.planned, summary.skipped, summary.failed
    );

    Ok(())
}
