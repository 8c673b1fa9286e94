use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "weather-director",
    version,
    about = "Headless weather cycle with rain followers and lightning strikes"
)]
pub struct Cli {
    /// JSON file overriding simulation parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of synthetic actors (0..=64)
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(0..=64))]
    pub actors: u16,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Strike update rate in Hz
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub frame_hz: Option<u32>,

    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(long)]
    pub run_for: Option<u64>,

    /// Randomly disconnect and reconnect actors
    #[arg(long)]
    pub churn: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}
