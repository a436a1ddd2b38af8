use std::io::Read;
use std::process::ExitCode;

use transducers::prelude::*;

use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgAction, ArgMatches, Command};

fn cli() -> clap::Command {
    Command::new("fsmin")
        .about("Minimizes the finite-state transducers described by the test cases in the input")
        .arg(
            Arg::new("input")
                .help("file to read the test cases from, stdin is used if it is omitted")
                .required(false),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .action(ArgAction::SetTrue)
                .help("highlight the section headers of the reports"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn read_input(matches: &ArgMatches) -> std::io::Result<String> {
    let mut text = String::new();
    match matches.get_one::<String>("input") {
        Some(path) => {
            debug!("reading test cases from {path}");
            std::fs::File::open(path)?.read_to_string(&mut text)?;
        }
        None => {
            debug!("reading test cases from stdin");
            std::io::stdin().lock().read_to_string(&mut text)?;
        }
    }
    Ok(text)
}

pub fn main() -> ExitCode {
    let matches = cli().get_matches();

    setup_logging(&matches);

    let options = RenderOptions {
        colored: matches.get_flag("color"),
    };

    let text = match read_input(&matches) {
        Ok(text) => text,
        Err(e) => {
            error!("could not read input: {e}");
            eprintln!("error: could not read input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let start = std::time::Instant::now();
    let outcomes = match process(&text) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "processed {} test cases in {}µs",
        outcomes.len(),
        start.elapsed().as_micros()
    );

    let mut failed = 0;
    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            Ok(report) => println!("{}", report.render(options)),
            Err(e) => {
                failed += 1;
                println!("case {}: error: {e}\n", i + 1);
            }
        }
    }

    if failed > 0 {
        info!("{failed} of {} test cases failed", outcomes.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
