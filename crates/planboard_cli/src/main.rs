//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `planboard_core` linkage.
//! - Exercise config, logging and database bootstrap end to end.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use planboard_core::db::migrations::current_user_version;
use planboard_core::CoreConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = CoreConfig::from_env();

    if let Err(err) = config.init_logging() {
        eprintln!("planboard logging error: {err}");
        return ExitCode::FAILURE;
    }

    let conn = match config.open_connection() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("planboard database error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let schema_version = match current_user_version(&conn) {
        Ok(version) => version,
        Err(err) => {
            eprintln!("planboard database error: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("event=cli_probe module=cli status=ok schema_version={schema_version}");
    println!("planboard_core ping={}", planboard_core::ping());
    println!("planboard_core version={}", planboard_core::core_version());
    println!("planboard_core schema_version={schema_version}");
    ExitCode::SUCCESS
}
