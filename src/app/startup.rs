//! Application startup
//!
//! Configuration is resolved and validated before logging starts and before
//! any AWS call, so a bad setting exits with status 2 without side effects.

use crate::app::cli::api::{load_config, Args, InventoryConfig};
use crate::app::spinner::{should_show_spinner, ProgressSpinner};
use crate::aws::api::{AwsContext, OrganizationsDirectory, StsDelegator};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, resolve_log_level};
use crate::core::shutdown::{ShutdownCoordinator, INTERRUPTED_EXIT_CODE};
use crate::core::styles::StyleRole;
use crate::inventory::api::{LogProgress, ProgressObserver, ScanOrchestrator};
use crate::report::api::{S3Uploader, SummaryPrinter};
use crate::scanner::api::ScannerRegistry;
use clap::Parser;
use prettytable::{format, Cell, Row, Table};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::sync::broadcast;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

/// Run the application and return the process exit status
pub async fn run() -> i32 {
    let args = Args::parse();

    let config = match load_config(&args).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return EXIT_CONFIG;
        }
    };

    let use_color = config
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    let level = resolve_log_level(config.log_level.as_deref(), args.verbose, args.quiet);
    let log_file = config
        .log_file
        .as_ref()
        .map(|p| p.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        Some(level),
        Some(&config.log_format),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Warning: failed to start logging: {}", e);
    }
    log::debug!("Effective configuration: {:?}", config);

    if args.list_scanners {
        return list_scanners(use_color);
    }

    ShutdownCoordinator::guard_with_coordinator(|coordinator, shutdown_rx| async move {
        let status = sweep(&config, use_color, shutdown_rx).await;
        if status == EXIT_SUCCESS && coordinator.is_shutdown_requested() {
            INTERRUPTED_EXIT_CODE
        } else {
            status
        }
    })
    .await
}

fn list_scanners(use_color: bool) -> i32 {
    let registry = match ScannerRegistry::builtin(&AwsContext::offline()) {
        Ok(registry) => registry,
        Err(e) => {
            log_error_with_context(&e, "building scanner registry");
            return EXIT_FAILURE;
        }
    };

    let header = StyleRole::Header.to_prettytable_spec(use_color);
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(Row::new(vec![
        Cell::new("Resource Type").style_spec(&header),
        Cell::new("Name").style_spec(&header),
        Cell::new("Scope").style_spec(&header),
    ]));
    for descriptor in registry.descriptors() {
        let scope = if descriptor.is_global { "global" } else { "regional" };
        table.add_row(Row::new(vec![
            Cell::new(descriptor.resource_type)
                .style_spec(&StyleRole::Label.to_prettytable_spec(use_color)),
            Cell::new(descriptor.display_name),
            Cell::new(scope).style_spec(&StyleRole::Dim.to_prettytable_spec(use_color)),
        ]));
    }
    table.printstd();
    EXIT_SUCCESS
}

/// One full sweep: scan, write reports, upload, summarize
async fn sweep(
    config: &InventoryConfig,
    use_color: bool,
    shutdown_rx: broadcast::Receiver<()>,
) -> i32 {
    let settings = match config.scan_settings() {
        Ok(settings) => settings,
        Err(e) => {
            log_error_with_context(&e, "validating configuration");
            return EXIT_CONFIG;
        }
    };

    let home_region = settings
        .regions()
        .first()
        .map(String::as_str)
        .unwrap_or("us-east-1");
    let context = AwsContext::load(home_region).await;

    let registry = match ScannerRegistry::builtin(&context) {
        Ok(registry) => registry,
        Err(e) => {
            log_error_with_context(&e, "building scanner registry");
            return EXIT_FAILURE;
        }
    };

    let progress: Arc<dyn ProgressObserver> = if should_show_spinner() {
        Arc::new(ProgressSpinner::new())
    } else {
        Arc::new(LogProgress)
    };
    let orchestrator = ScanOrchestrator::new(
        Arc::new(StsDelegator::new(
            &context,
            config.role_name.as_str(),
            config.session_duration,
        )),
        Arc::new(OrganizationsDirectory::new(&context)),
        Arc::new(registry),
        settings,
    )
    .with_progress(progress);

    let report = match orchestrator.run(shutdown_rx).await {
        Ok(report) => report,
        Err(e) => {
            log_error_with_context(&e, "inventory sweep");
            return EXIT_FAILURE;
        }
    };

    let mut written = Vec::new();
    for format in &config.formats {
        match format.writer().write(&report, &config.output_dir) {
            Ok(paths) => written.extend(paths),
            Err(e) => {
                log_error_with_context(&e, "writing report");
                return EXIT_FAILURE;
            }
        }
    }

    if let Some(bucket) = &config.s3_bucket {
        let uploader = S3Uploader::new(&context, bucket.as_str(), config.s3_prefix.as_deref());
        let uploads = uploader.upload_all(&written, &config.output_dir).await;
        if !uploads.is_complete() {
            log::warn!(
                "{} of {} report files were not uploaded to s3://{}",
                uploads.failed.len(),
                written.len(),
                uploader.bucket()
            );
        }
    }

    SummaryPrinter::new(use_color, config.error_display_limit).print(&report);
    for path in &written {
        println!(
            "{} {}",
            StyleRole::Dim.paint("wrote", use_color),
            path.display()
        );
    }

    if report.interrupted() {
        INTERRUPTED_EXIT_CODE
    } else {
        EXIT_SUCCESS
    }
}
