//! `safecount` command line: runs workloads against the counter strategies.

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use safecount::logging::{self, LogFormat};
use safecount::prelude::*;
use safecount::RacyCounter;
use std::path::PathBuf;

fn workload_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("workers")
                .long("workers")
                .short('w')
                .default_value("2")
                .value_parser(value_parser!(usize))
                .help("Number of concurrent workers"),
        )
        .arg(
            Arg::new("increments")
                .long("increments")
                .short('k')
                .default_value("100000")
                .value_parser(value_parser!(u64))
                .help("Increments issued by each worker"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
}

fn cli() -> Command {
    Command::new("safecount")
        .version(safecount::VERSION)
        .about("Lost-update-free counters: lock and actor strategies")
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log filter used when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(workload_args(
            Command::new("run")
                .about("Run one workload against one strategy")
                .arg(
                    Arg::new("strategy")
                        .long("strategy")
                        .short('s')
                        .value_parser(["lock", "actor"])
                        .help("Counter strategy (overrides the config file)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML counter configuration"),
                ),
        ))
        .subcommand(workload_args(
            Command::new("compare").about("Run the same workload against both strategies"),
        ))
        .subcommand(workload_args(
            Command::new("race")
                .about("Run the unsynchronized baseline next to both strategies"),
        ))
}

fn workload_from(args: &ArgMatches) -> Workload {
    let workers = args.get_one::<usize>("workers").copied().unwrap_or(2);
    let increments = args.get_one::<u64>("increments").copied().unwrap_or(100_000);
    Workload::new(workers, increments).with_retry(RetryPolicy::default())
}

fn run_counter<C: Counter + Clone + 'static>(
    workload: &Workload,
    counter: &C,
) -> anyhow::Result<WorkloadReport> {
    let report = workload
        .run(counter)
        .with_context(|| format!("{} workload failed", counter.name()))?;
    counter.shutdown();
    Ok(report)
}

fn print_reports(reports: &[WorkloadReport], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            println!("{}", report.generate_text());
        }
    }
    Ok(())
}

fn run(matches: &ArgMatches) -> anyhow::Result<bool> {
    let level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    let format = if matches.get_flag("log-json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    logging::init(level, format)?;

    match matches.subcommand() {
        Some(("run", args)) => {
            let mut config = match args.get_one::<PathBuf>("config") {
                Some(path) => CounterConfig::from_file(path)?,
                None => CounterConfig::new(),
            };
            if let Some(strategy) = args.get_one::<String>("strategy") {
                config.strategy = strategy.parse::<Strategy>().map_err(|e: String| anyhow!(e))?;
            }

            let workload = workload_from(args);
            let report = run_counter(&workload, &create_counter_with(&config))?;
            print_reports(std::slice::from_ref(&report), args.get_flag("json"))?;
            Ok(report.is_exact())
        }
        Some(("compare", args)) => {
            let workload = workload_from(args);
            let mut reports = Vec::with_capacity(Strategy::ALL.len());
            for strategy in Strategy::ALL {
                reports.push(run_counter(&workload, &create_counter(strategy))?);
            }
            print_reports(&reports, args.get_flag("json"))?;

            let agreed = reports.windows(2).all(|w| w[0].final_value == w[1].final_value);
            Ok(agreed && reports.iter().all(WorkloadReport::is_exact))
        }
        Some(("race", args)) => {
            let workload = workload_from(args);
            let mut reports = vec![run_counter(&workload, &RacyCounter::new())?];
            for strategy in Strategy::ALL {
                reports.push(run_counter(&workload, &create_counter(strategy))?);
            }
            print_reports(&reports, args.get_flag("json"))?;

            // The baseline may or may not lose updates; only the safe strategies must be exact.
            Ok(reports.iter().skip(1).all(WorkloadReport::is_exact))
        }
        _ => Err(anyhow!("unknown subcommand")),
    }
}

fn main() {
    let matches = cli().get_matches();

    match run(&matches) {
        Ok(passed) => std::process::exit(if passed { 0 } else { 1 }),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
