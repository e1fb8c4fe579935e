use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use opentelemetry::KeyValue;

use crate::analytics::{DateRange, ReportSpecification, ReportingBackend};
use crate::catalog::{CatalogEntry, ReportCatalog, View};
use crate::error::{AppError, AppResult};
use crate::export::write_csv_file;
use crate::table::{ReportTable, RowIndexMode};
use crate::telemetry::metrics::{REPORT_DURATION, REPORT_FAILURES, REPORT_ROWS, REPORTS_WRITTEN};

use super::fetch::{DEFAULT_PAGE_SIZE, PageFetcher};
use super::format::format_report;
use super::naming::ColumnNaming;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub page_size: u32,
    pub naming: ColumnNaming,
    pub row_index_mode: RowIndexMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            naming: ColumnNaming::default(),
            row_index_mode: RowIndexMode::default(),
        }
    }
}

/// Fetches every page of one report and stacks the formatted pages in fetch
/// order. A failed page fetch fails the whole report.
#[tracing::instrument(
    name = "pipeline report",
    skip(backend, spec, options),
    fields(
        report.pages,
        report.rows,
        report.degraded_pages,
    )
)]
pub async fn run_report(
    backend: &dyn ReportingBackend,
    spec: &ReportSpecification,
    view_id: &str,
    options: &RunOptions,
) -> AppResult<ReportTable> {
    let mut fetcher = PageFetcher::new(backend, spec, view_id, options.page_size);
    let mut table = ReportTable::empty();
    let mut degraded_pages = 0usize;

    while let Some(page) = fetcher.next_page().await {
        let formatted = format_report(&page?, &options.naming);
        if formatted.is_degraded() {
            degraded_pages += 1;
        }
        table = table.append_rows(formatted.table, options.row_index_mode);
    }

    let span = tracing::Span::current();
    span.record("report.pages", fetcher.pages_fetched());
    span.record("report.rows", table.row_count());
    span.record("report.degraded_pages", degraded_pages);

    Ok(table)
}

/// Everything one backup run needs: which views, which reports, where to.
#[derive(Debug, Clone)]
pub struct BackupPlan {
    pub views: Vec<View>,
    pub catalog: ReportCatalog,
    pub output_dir: PathBuf,
    pub period: String,
    pub end_date: NaiveDate,
    pub options: RunOptions,
}

impl BackupPlan {
    /// `<output_dir>/<view name>/<period>_<category>_<sub-report>.csv`
    pub fn output_path(&self, view: &View, entry: &CatalogEntry) -> PathBuf {
        self.output_dir.join(&view.name).join(format!(
            "{}_{}_{}.csv",
            self.period, entry.category, entry.name
        ))
    }
}

#[derive(Debug)]
pub struct ReportFailure {
    pub view: String,
    pub category: String,
    pub sub_report: String,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct BackupSummary {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ReportFailure>,
}

/// Runs every catalog report for every view, one at a time. A report that
/// fails is logged and recorded; the run moves on to the next one.
#[tracing::instrument(
    name = "pipeline backup",
    skip_all,
    fields(
        backup.views = plan.views.len(),
        backup.reports = plan.catalog.len(),
        backup.period = %plan.period,
    )
)]
pub async fn run_backup(backend: &dyn ReportingBackend, plan: &BackupPlan) -> BackupSummary {
    let mut summary = BackupSummary::default();

    if plan.catalog.is_empty() || plan.views.is_empty() {
        tracing::warn!(
            views = plan.views.len(),
            reports = plan.catalog.len(),
            "Nothing to back up"
        );
        return summary;
    }

    for view in &plan.views {
        if view.start_date > plan.end_date {
            tracing::warn!(
                view = %view.name,
                start_date = %view.start_date,
                end_date = %plan.end_date,
                "View starts after the end date, reports will be empty"
            );
        }
        let date_range = DateRange {
            start_date: view.start_date,
            end_date: plan.end_date,
        };

        for entry in plan.catalog.entries() {
            let path = plan.output_path(view, entry);
            let spec = entry.definition.specification(&plan.period, date_range);
            let labels = [
                KeyValue::new("report.category", entry.category.clone()),
                KeyValue::new("report.name", entry.name.clone()),
            ];

            let start = Instant::now();
            let result = backup_report(backend, &spec, &view.id, &path, &plan.options).await;
            REPORT_DURATION.record(start.elapsed().as_secs_f64(), &labels);

            match result {
                Ok(rows) => {
                    REPORTS_WRITTEN.add(1, &labels);
                    REPORT_ROWS.record(rows as f64, &labels);
                    tracing::info!(
                        view = %view.name,
                        category = %entry.category,
                        report = %entry.name,
                        rows,
                        path = %path.display(),
                        "Report written"
                    );
                    summary.written.push(path);
                }
                Err(error) => {
                    REPORT_FAILURES.add(1, &labels);
                    tracing::error!(
                        view = %view.name,
                        category = %entry.category,
                        report = %entry.name,
                        error = %error,
                        "Report failed, continuing with the next one"
                    );
                    summary.failures.push(ReportFailure {
                        view: view.name.clone(),
                        category: entry.category.clone(),
                        sub_report: entry.name.clone(),
                        error,
                    });
                }
            }
        }
    }

    tracing::info!(
        written = summary.written.len(),
        failed = summary.failures.len(),
        "Backup finished"
    );

    summary
}

async fn backup_report(
    backend: &dyn ReportingBackend,
    spec: &ReportSpecification,
    view_id: &str,
    path: &Path,
    options: &RunOptions,
) -> AppResult<usize> {
    let table = run_report(backend, spec, view_id, options).await?;
    write_csv_file(&table, path)?;
    Ok(table.row_count())
}
