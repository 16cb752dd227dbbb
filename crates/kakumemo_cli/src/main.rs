//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `kakumemo_core` linkage.
//! - Optionally open a store file and print its counters.
//!
//! Usage: `kakumemo_cli [DB_PATH]`. Set `KAKUMEMO_LOG_DIR` to an absolute
//! directory to also write core logs there.

use std::process::ExitCode;

fn main() -> ExitCode {
    println!("kakumemo_core ping={}", kakumemo_core::ping());
    println!("kakumemo_core version={}", kakumemo_core::core_version());

    if let Ok(log_dir) = std::env::var("KAKUMEMO_LOG_DIR") {
        let level = kakumemo_core::LogLevel::build_default();
        if let Err(err) = kakumemo_core::init_logging(level.as_str(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match kakumemo_core::open_sqlite_store(&db_path) {
        Ok(store) => {
            let stats = store.get_statistics();
            println!(
                "store path={} games={} characters={} files={} chars={}",
                db_path,
                stats.total_games,
                stats.total_characters,
                stats.total_files,
                stats.total_character_count
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("store path={} error_code={} error={}", db_path, err.code(), err);
            ExitCode::FAILURE
        }
    }
}
