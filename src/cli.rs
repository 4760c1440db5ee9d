use anyhow::{anyhow, Result};
use clap::ArgMatches;
use std::path::PathBuf;

use crate::circuit::CalculationMode;
use crate::output::OutputFormat;

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub network: DemoNetwork,
    pub mode: Option<CalculationMode>,
    pub node_reporting: bool,
    pub branch_reporting: bool,
    pub output_file: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub verbose_level: u8,
}

/// Which ready-made network to solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoNetwork {
    Series,
    Parallel,
}

impl CliArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let network = match matches
            .get_one::<String>("network")
            .ok_or_else(|| anyhow!("Network name is required"))?
            .as_str()
        {
            "series" => DemoNetwork::Series,
            "parallel" => DemoNetwork::Parallel,
            other => return Err(anyhow!("Unknown network '{}'", other)),
        };

        let mode = matches
            .get_one::<String>("mode")
            .map(String::as_str)
            .map(parse_mode)
            .transpose()?;

        let output_format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("csv") | None => OutputFormat::Csv,
            Some("json") => OutputFormat::Json,
            Some(other) => return Err(anyhow!("Invalid output format '{}'", other)),
        };

        Ok(CliArgs {
            network,
            mode,
            node_reporting: matches.get_flag("nodes"),
            branch_reporting: matches.get_flag("branches"),
            output_file: matches.get_one::<String>("output").map(PathBuf::from),
            output_format,
            verbose_level: matches.get_count("verbose"),
        })
    }

    /// Log level implied by the number of `-v` flags
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose_level {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn parse_mode(value: &str) -> Result<CalculationMode> {
    match value.trim().to_lowercase().as_str() {
        "voltage" | "v" => Ok(CalculationMode::Voltage),
        "current" | "i" => Ok(CalculationMode::Current),
        "resistance" | "r" => Ok(CalculationMode::Resistance),
        other => Err(anyhow!("Invalid calculation mode '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};

    fn command() -> Command {
        Command::new("test")
            .arg(Arg::new("network").required(true).index(1))
            .arg(Arg::new("mode").long("mode"))
            .arg(Arg::new("nodes").long("nodes").action(ArgAction::SetTrue))
            .arg(Arg::new("branches").long("branches").action(ArgAction::SetTrue))
            .arg(Arg::new("output").short('o').long("output"))
            .arg(Arg::new("format").short('f').long("format").default_value("csv"))
            .arg(Arg::new("verbose").short('v').action(ArgAction::Count))
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Voltage").unwrap(), CalculationMode::Voltage);
        assert_eq!(parse_mode("i").unwrap(), CalculationMode::Current);
        assert_eq!(parse_mode("resistance").unwrap(), CalculationMode::Resistance);
        assert!(parse_mode("power").is_err());
    }

    #[test]
    fn test_from_matches() {
        let matches = command().get_matches_from([
            "test", "parallel", "--mode", "voltage", "--nodes", "-o", "out.json", "-f", "json", "-vv",
        ]);
        let args = CliArgs::from_matches(&matches).unwrap();

        assert_eq!(args.network, DemoNetwork::Parallel);
        assert_eq!(args.mode, Some(CalculationMode::Voltage));
        assert!(args.node_reporting);
        assert!(!args.branch_reporting);
        assert_eq!(args.output_file, Some(PathBuf::from("out.json")));
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_defaults_and_unknown_network() {
        let matches = command().get_matches_from(["test", "series"]);
        let args = CliArgs::from_matches(&matches).unwrap();
        assert_eq!(args.network, DemoNetwork::Series);
        assert!(args.mode.is_none());
        assert_eq!(args.output_format, OutputFormat::Csv);
        assert_eq!(args.log_level(), log::LevelFilter::Warn);

        let matches = command().get_matches_from(["test", "mesh"]);
        assert!(CliArgs::from_matches(&matches).is_err());
    }
}
