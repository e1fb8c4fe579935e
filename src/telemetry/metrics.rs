use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("analytics-report-backup"));

// --- Reporting API ---

pub static ANALYTICS_PAGES_FETCHED: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("analytics.pages.fetched")
        .with_description("Number of report pages fetched from the reporting API")
        .with_unit("{page}")
        .build()
});

pub static ANALYTICS_FETCH_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("analytics.fetch.duration")
        .with_description("Duration of one batchGet call in seconds")
        .with_unit("s")
        .build()
});

pub static ANALYTICS_FETCH_ERRORS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("analytics.fetch.errors")
        .with_description("Number of failed batchGet calls")
        .with_unit("{error}")
        .build()
});

// --- Formatting ---

pub static PAGE_EXTRACTION_FAILURES: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("report.page.extraction_failures")
        .with_description("Number of summary or pivot tables replaced by an empty table")
        .with_unit("{table}")
        .build()
});

// --- Reports ---

pub static REPORT_ROWS: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("report.rows")
        .with_description("Number of rows written per report")
        .with_unit("{row}")
        .build()
});

pub static REPORT_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("report.duration")
        .with_description("Time to fetch, format and write one report in seconds")
        .with_unit("s")
        .build()
});

pub static REPORTS_WRITTEN: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("report.written")
        .with_description("Number of report CSV files written")
        .with_unit("{report}")
        .build()
});

pub static REPORT_FAILURES: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("report.failures")
        .with_description("Number of reports abandoned after an error")
        .with_unit("{report}")
        .build()
});
