//! Groupscope CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{Level, LevelFilter, debug, info, log};

use groupscope_cli::{
    Args,
    error_adapter::{Reportable, to_reportables},
};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Groupscope");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = groupscope_cli::run(&args) {
        let handler = miette::GraphicalReportHandler::new();
        for report in to_reportables(&err) {
            render(&handler, &report);
        }
        process::exit(1);
    }

    info!("Completed successfully");
}

/// Log a report at the level matching its severity.
fn render(handler: &miette::GraphicalReportHandler, report: &Reportable<'_>) {
    let level = match report.severity() {
        Some(miette::Severity::Warning) => Level::Warn,
        Some(miette::Severity::Advice) => Level::Info,
        _ => Level::Error,
    };

    let mut rendered = String::new();
    handler
        .render_report(&mut rendered, report.as_ref())
        .expect("Writing to String buffer is infallible");
    log!(level, "{rendered}");
}
