//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `tasklist_core` linkage.
//! - Start file logging under the system temp directory.
//! - Exercise storage bootstrap against an in-memory slot store.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use tasklist_core::StorageConfig;

fn main() -> ExitCode {
    println!("tasklist_core ping={}", tasklist_core::ping());
    println!("tasklist_core version={}", tasklist_core::core_version());

    let log_dir = std::env::temp_dir().join("tasklist-logs");
    match tasklist_core::init_logging(
        tasklist_core::default_log_level(),
        &log_dir.to_string_lossy(),
    ) {
        Ok(()) => println!("tasklist_core logging=ok dir={}", log_dir.display()),
        Err(err) => eprintln!("tasklist_core logging=error error={err}"),
    }

    match StorageConfig::default().open_task_store() {
        Ok(store) => {
            let counts = store.counts();
            println!(
                "tasklist_core storage=ok filter={} active={} completed={}",
                store.filter(),
                counts.active,
                counts.completed
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("tasklist_core storage=error error={err}");
            ExitCode::FAILURE
        }
    }
}
