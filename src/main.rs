mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser as _;
use log::LevelFilter;

use cli::{CheckArgs, Cli, Commands, ParseArgs};
use golo_parser::batch;
use golo_parser::{Config, DumpOptions, Error};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Config::from_file(&cli.config)
        .map_err(Error::from)
        .and_then(|config| match cli.command {
            Commands::Parse(args) => run_parse(args, config),
            Commands::Check(args) => run_check(args, config),
        });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

/// Parse each file in order; returns whether all of them parsed
fn run_parse(args: ParseArgs, config: Config) -> Result<bool, Error> {
    let mut options: DumpOptions = config.dump;
    if let Some(prefix) = args.prefix {
        options.prefix = prefix;
    }
    if args.spans {
        options.show_spans = true;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut all_ok = true;

    // One worker keeps files in order and gives the parser a stack sized for the nesting limit
    for file in batch::parse_files(&args.files, &config.limits, 1)? {
        match file.result {
            Ok(ast) => {
                if args.trace {
                    writeln!(out, "{}:", file.path.display()).map_err(stdout_error)?;
                    ast.write_dump(ast.root(), &options, &mut out)
                        .map_err(stdout_error)?;
                }
            }
            Err(err) => {
                eprintln!("{}", err);
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

/// Parse a directory tree in parallel and summarize
fn run_check(args: CheckArgs, config: Config) -> Result<bool, Error> {
    let files = batch::discover(&args.dir)?;
    let jobs = args.jobs.unwrap_or_else(batch::default_jobs);
    let results = batch::parse_files(&files, &config.limits, jobs)?;

    let mut failed = 0;
    for file in &results {
        if let Err(err) = &file.result {
            eprintln!("{}", err);
            failed += 1;
        }
    }

    println!("{} files, {} parsed, {} failed", results.len(), results.len() - failed, failed);
    Ok(failed == 0)
}

fn stdout_error(source: io::Error) -> Error {
    Error::Io {
        path: "<stdout>".into(),
        source,
    }
}
