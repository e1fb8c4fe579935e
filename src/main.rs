use report_backup::analytics::AnalyticsReportingClient;
use report_backup::analytics::auth::ServiceAccountKey;
use report_backup::catalog::{DisplayNames, ReportCatalog, load_views};
use report_backup::pipeline::{BackupPlan, ColumnNaming, RunOptions, run_backup};
use report_backup::telemetry::init_telemetry;
use report_backup::{AppResult, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let telemetry_guard = init_telemetry(&config)?;

    let result = run(&config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Backup aborted during start-up");
    }

    telemetry_guard.shutdown();

    Ok(result?)
}

/// Loads inputs, builds the client and runs the backup. Start-up failures are
/// returned so the caller can flush telemetry first.
async fn run(config: &Config) -> AppResult<()> {
    tracing::info!(
        environment = %config.environment,
        period = %config.report_period,
        end_date = %config.end_date,
        output_dir = %config.output_dir.display(),
        "Starting analytics-report-backup"
    );

    let views = load_views(&config.views_file)?;

    let catalog = match &config.report_catalog_file {
        Some(path) => ReportCatalog::from_file(path)?,
        None => ReportCatalog::builtin(),
    };

    let naming = match &config.display_names_file {
        Some(path) => ColumnNaming::Lookup(DisplayNames::from_file(path)?),
        None => ColumnNaming::Suffix,
    };

    let key = ServiceAccountKey::from_file(&config.credentials_file)?;
    tracing::info!(
        client_email = %key.client_email,
        views = views.len(),
        reports = catalog.len(),
        "Reporting client initialized"
    );
    let client = AnalyticsReportingClient::new(key, &config.analytics_endpoint);

    let plan = BackupPlan {
        views,
        catalog,
        output_dir: config.output_dir.clone(),
        period: config.report_period.clone(),
        end_date: config.end_date,
        options: RunOptions {
            page_size: config.page_size,
            naming,
            row_index_mode: config.row_index_mode,
        },
    };

    let summary = run_backup(&client, &plan).await;

    for failure in &summary.failures {
        tracing::warn!(
            view = %failure.view,
            category = %failure.category,
            report = %failure.sub_report,
            error = %failure.error,
            "Report not backed up"
        );
    }
    tracing::info!(
        written = summary.written.len(),
        failed = summary.failures.len(),
        "Backup complete"
    );

    Ok(())
}
