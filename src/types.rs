// src/types.rs

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// How `run_in_all` schedules units.
///
/// - `Sequential`: one unit at a time, dependencies first.
/// - `Parallel`: every unit as soon as its dependencies have settled
///   (default).
/// - `Unordered`: every unit at once, ignoring dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Sequential,
    #[default]
    Parallel,
    Unordered,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(RunMode::Sequential),
            "parallel" => Ok(RunMode::Parallel),
            "unordered" => Ok(RunMode::Unordered),
            other => Err(format!(
                "invalid run mode: {other} (expected \"sequential\", \"parallel\" or \"unordered\")"
            )),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunMode::Sequential => "sequential",
            RunMode::Parallel => "parallel",
            RunMode::Unordered => "unordered",
        };
        f.write_str(s)
    }
}
