use clap::{Arg, ArgAction, Command};
use colored::*;
use log::{error, info};

use mna_dc::cli::{CliArgs, DemoNetwork};
use mna_dc::demo::{build_parallel_network, build_series_network};
use mna_dc::output::{export_reports, print_summary};

fn main() {
    let matches = create_cli().get_matches();

    let args = match CliArgs::from_matches(&matches) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level())
        .init();

    if let Err(e) = run_application(&args) {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn create_cli() -> Command {
    Command::new("mna-dc")
        .version(mna_dc::VERSION)
        .about("DC circuit solver based on Modified Nodal Analysis")
        .arg(
            Arg::new("network")
                .help("Demonstration network to solve")
                .required(true)
                .value_parser(["series", "parallel"])
                .index(1),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .value_parser(["voltage", "current", "resistance"])
                .help("Override the calculation mode of every component"),
        )
        .arg(
            Arg::new("nodes")
                .long("nodes")
                .action(ArgAction::SetTrue)
                .help("Collect the node report"),
        )
        .arg(
            Arg::new("branches")
                .long("branches")
                .action(ArgAction::SetTrue)
                .help("Collect the branch report"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file for the reports"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .default_value("csv")
                .value_parser(["csv", "json"])
                .help("Output format"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase verbosity level"),
        )
}

fn run_application(args: &CliArgs) -> anyhow::Result<()> {
    info!("{}", "Starting mna-dc".green().bold());

    let mut network = match args.network {
        DemoNetwork::Series => build_series_network(),
        DemoNetwork::Parallel => build_parallel_network(),
    };
    info!("Network: {}", format!("{:?}", args.network).bright_blue());

    if let Some(mode) = args.mode {
        info!("Calculation mode: {}", mode);
        network.set_calculation_mode(mode);
    }
    if args.node_reporting {
        network.set_node_reporting(true);
    }
    if args.branch_reporting {
        network.set_branch_reporting(true);
    }

    network.solve(None)?;

    if let Some(output_file) = &args.output_file {
        export_reports(&network, output_file, args.output_format)?;
        info!("Reports exported to: {}", output_file.display().to_string().bright_green());
    } else {
        print_summary(&network);
    }

    info!("{}", "Solve completed successfully!".green().bold());
    Ok(())
}
