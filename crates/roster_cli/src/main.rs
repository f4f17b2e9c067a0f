//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured roster database and report store statistics.
//! - Keep output deterministic for quick local sanity checks.

use log::error;
use roster_core::db::open_db_with_options;
use roster_core::{
    init_logging, MemberRepository, RosterConfig, SqliteMemberRepository, SqliteTeamRepository,
    TeamRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("roster: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = RosterConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("roster_core ping={}", roster_core::ping());
    println!("roster_core version={}", roster_core::core_version());

    let conn = open_db_with_options(&config.db_path, &config.db_options())?;
    let members = SqliteMemberRepository::try_new(&conn)?;
    let teams = SqliteTeamRepository::try_new(&conn)?;

    println!("db_path={}", config.db_path.display());
    println!("members={}", members.count()?);
    println!("teams={}", teams.count()?);
    Ok(())
}
