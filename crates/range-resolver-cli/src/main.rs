use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use range_resolver::{
    convert_raw_to_range, describe_text_range, describe_time_range,
    describe_time_range_abbreviation, is_valid_time_span, relative_times_list, RawTimeRange,
    TimeEndpoint, TimeZoneSpec,
};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `RANGEUTIL_LOG=debug`.
const LOG_ENV: &str = "RANGEUTIL_LOG";

#[derive(Parser)]
#[command(
    name = "rangeutil",
    version,
    about = "Resolve, describe, and normalize relative time ranges"
)]
struct Cli {
    /// Time zone: "browser", "utc", or an IANA name such as "Europe/Berlin"
    #[arg(long, global = true, default_value = "browser")]
    tz: String,

    /// Reference instant (RFC 3339) used as "now"; defaults to the system clock
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a range expression (e.g. "5m", "now/d", "+1h") to a descriptor
    Resolve {
        /// Range expression
        expression: String,
    },
    /// Print the display label for a range
    Describe {
        /// Range start: expression or RFC 3339 instant
        from: String,
        /// Range end: expression or RFC 3339 instant
        to: String,
    },
    /// Check whether a span is a recognizable range (exit code 1 if not)
    Validate {
        /// Span text
        span: String,
    },
    /// Print the time zone abbreviation for the start of a range
    Abbreviate {
        /// Range start: expression or RFC 3339 instant
        from: String,
        /// Range end: expression or RFC 3339 instant
        to: String,
    },
    /// Resolve both ends of a range to absolute instants
    Normalize {
        /// Range start: expression or RFC 3339 instant
        from: String,
        /// Range end: expression or RFC 3339 instant
        to: String,
    },
    /// List the quick-pick ranges grouped by section
    Quick {
        /// Display label of the currently selected range
        #[arg(long)]
        current: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env(LOG_ENV))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let zone: TimeZoneSpec = cli
        .tz
        .parse()
        .with_context(|| format!("failed to parse --tz '{}'", cli.tz))?;
    let now = match &cli.now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("failed to parse --now '{s}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    tracing::debug!(tz = %cli.tz, now = %now.to_rfc3339(), "resolved context");

    match cli.command {
        Commands::Resolve { expression } => {
            let descriptor = describe_text_range(&expression);
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Commands::Describe { from, to } => {
            let range = raw_range(&from, &to);
            println!("{}", describe_time_range(&range, &zone, now));
        }
        Commands::Validate { span } => {
            let valid = is_valid_time_span(&span);
            println!("{valid}");
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Abbreviate { from, to } => {
            let range = raw_range(&from, &to);
            println!("{}", describe_time_range_abbreviation(&range, &zone, now));
        }
        Commands::Normalize { from, to } => {
            let range = raw_range(&from, &to);
            let resolved = convert_raw_to_range(&range, &zone, now)
                .with_context(|| format!("failed to normalize '{from} to {to}'"))?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Quick { current } => {
            let groups = relative_times_list(current.as_deref());
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// RFC 3339 arguments become instants; everything else stays text.
fn endpoint(arg: &str) -> TimeEndpoint {
    match DateTime::parse_from_rfc3339(arg) {
        Ok(dt) => TimeEndpoint::Instant(dt.with_timezone(&Utc)),
        Err(_) => TimeEndpoint::text(arg),
    }
}

fn raw_range(from: &str, to: &str) -> RawTimeRange {
    RawTimeRange::new(endpoint(from), endpoint(to))
}
