mod cli;
mod config;
mod run;

use std::process::ExitCode;

use book_logging::{book_error, book_info};
use clap::Parser;

fn main() -> ExitCode {
    let args = cli::Args::parse();
    book_logging::initialize(args.log_destination(), args.log_level());

    match run::run(&args) {
        Ok(report) if report.failed.is_empty() => {
            for (name, summary) in &report.built {
                book_info!("{}: {} chapter files", name, summary.chapter_files);
            }
            ExitCode::SUCCESS
        }
        Ok(report) => {
            book_error!("Failed profiles: {}", report.failed.join(", "));
            ExitCode::FAILURE
        }
        Err(err) => {
            book_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
