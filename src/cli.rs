use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schedule-client", version, about = "Terminal client for the schedule backend")]
pub struct Cli {
    /// Config file to read instead of ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Login email; overrides `account.email`.
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Login password; overrides `account.password`.
    #[arg(long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account with the given email and password.
    Register,
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that run inside a login session.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Show the logged-in user.
    Me,
    /// List the schedules of a month (current month by default).
    List {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Add a schedule.
    Create {
        title: String,
        /// Day as YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        /// Start as HH:MM.
        #[arg(long, value_parser = parse_hhmm)]
        start: NaiveTime,
        /// End as HH:MM.
        #[arg(long, value_parser = parse_hhmm)]
        end: NaiveTime,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a schedule by id.
    Delete { id: i64 },
    /// Talk to the assistant; one message per line.
    Chat,
}

fn parse_hhmm(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got '{raw}': {e}"))
}
