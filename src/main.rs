use clap::Parser;
use log::{debug, info, LevelFilter};
use snafu::ErrorCompat;
use std::error::Error;

mod args;
mod leaderboard;

use crate::args::Args;
use crate::leaderboard::config_reader::resolve_settings;
use crate::leaderboard::run_report;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    debug!("args: {:?}", args);

    let res = resolve_settings(&args).and_then(|settings| run_report(&settings));
    match res {
        Ok(Some(reports)) => {
            info!("Done: {} reports", reports.len());
        }
        Ok(None) => {
            info!("Done: no report");
        }
        Err(e) => {
            eprintln!("An error occured {}", e);
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  caused by: {}", s);
                source = s.source();
            }
            if let Some(bt) = ErrorCompat::backtrace(&*e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
