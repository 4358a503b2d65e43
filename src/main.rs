/*
 * File: /main.rs
 * Created Date: Tuesday November 21st 2023
 * Author: Zihan
 * -----
 * Last Modified: Monday, 19th October 2026 11:05:20 am
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-17		Zihan	Inspect one optimizer run from the command line
 */

use std::process;

use gcp_inspect::config::Config;
use log::{error, LevelFilter};

fn setup_logger() -> Result<(), fern::InitError> {
    // Configure the logger
    fern::Dispatch::new()
        // Format the logs
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        // Set the default log level
        .level(LevelFilter::Info)
        // Add stderr logging, stdout carries the report
        .chain(std::io::stderr())
        // Apply the configuration
        .apply()?;
    Ok(())
}

fn main() {
    if let Err(e) = setup_logger() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let config = Config::new(std::env::args()).unwrap_or_else(|e| {
        eprintln!("{}", e);
        eprintln!("usage: gcp_inspect <matrix> <partition.json> <meta.txt> [--strict] [--trace <optim_data.csv>] [--tol <f64>] [--trace-tol <f64>]");
        process::exit(2);
    });

    let inspection = match gcp_inspect::run(&config) {
        Ok(inspection) => inspection,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let out = serde_json::json!({
        "metadata": inspection.metadata,
        "report": inspection.report,
        "check": inspection.check,
        "linear_penalty": inspection.linear_penalty,
    });
    match serde_json::to_string_pretty(&out) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }

    if !inspection.check.is_consistent() {
        process::exit(3);
    }
}
