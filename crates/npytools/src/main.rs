#[macro_use]
extern crate log;
extern crate fern;
extern crate clap;
extern crate csv;
extern crate npystream;

mod arange;
mod convert;
mod settings;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use clap::{App, Arg, ArgMatches, SubCommand};
use indoc::indoc;
use npystream::{DType, StreamConfig};

use crate::convert::{CsvOptions, FieldSpec};
use crate::settings::Settings;

fn main() {
    let matches = get_matches();
    let (command, sub_matches) = match matches.subcommand() {
        (command, Some(sub_matches)) => (command, sub_matches),
        _ => {
            println!("No subcommand match. Use npytools --help to view help information.");
            std::process::exit(1);
        }
    };

    let settings = match Settings::from_matches(sub_matches) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("invalid settings: {}", err);
            std::process::exit(1);
        }
    };
    prepare_logger(settings.verbosity, settings.log_file.as_deref());

    let config = match settings.stream_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    let ret = match command {
        "write" => run_write(sub_matches, &config),
        "arange" => run_arange(sub_matches, &config),
        other => Err(format!("unknown subcommand {}", other).into()),
    };

    match ret {
        Ok(count) => println!("{}", count),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}

fn run_write(matches: &ArgMatches, config: &StreamConfig) -> convert::Result<u64> {
    let output = matches.value_of("output").unwrap_or("out.npy");
    let (fields, from_fields): (Vec<FieldSpec>, bool) = match matches.value_of("fields") {
        Some(spec) => (convert::parse_fields(spec)?, true),
        None => {
            let dtype: DType = matches.value_of("dtype").unwrap_or("f8").parse()?;
            (vec![FieldSpec { label: None, dtype }], false)
        }
    };
    let has_headers = matches.is_present("header");
    let delimiter = match matches.value_of("delimiter") {
        Some(d) if d.len() == 1 => d.as_bytes()[0],
        Some(d) => return Err(format!("delimiter must be one byte, got {:?}", d).into()),
        None => b',',
    };
    let opts = CsvOptions {
        has_headers,
        labels_from_header: has_headers && from_fields,
        delimiter,
    };

    let input: Box<dyn Read> = match matches.value_of("input") {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    convert::csv_to_npy(input, Path::new(output), &fields, &opts, config)
}

fn run_arange(matches: &ArgMatches, config: &StreamConfig) -> convert::Result<u64> {
    let output = matches.value_of("output").unwrap_or("out.npy");
    let start: f64 = matches.value_of("start").unwrap_or("0").parse()?;
    let stop: f64 = match matches.value_of("stop") {
        Some(stop) => stop.parse()?,
        None => return Err("--stop is required".into()),
    };
    let step: f64 = matches.value_of("step").unwrap_or("1").parse()?;
    let dtype: DType = matches.value_of("dtype").unwrap_or("f8").parse()?;
    arange::arange(Path::new(output), start, stop, step, dtype, config)
}

fn prepare_logger(verbosity: u8, log_file: Option<&str>) {
    let level = match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::max(),
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S:%f]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(log_file) = log_file {
        match fern::log_file(log_file) {
            Ok(file) => dispatch = dispatch.chain(file),
            Err(err) => eprintln!("unable to open log file {}: {}", log_file, err),
        }
    }

    if let Err(err) = dispatch.apply() {
        eprintln!("unable to install logger: {}", err);
    }
}

/// Gets configuration values from CLI arguments, falling back to environment variables
/// if they don't exist and to default values if neither exist.
fn get_matches<'a>() -> ArgMatches<'a> {
    App::new("npytools")
        .version("0.1.0")
        .about("stream data into numpy .npy files")
        .arg(Arg::with_name("v").short("v").multiple(true).global(true).help(
            "Sets the level of verbosity",
        ))
        .arg(
            Arg::with_name("log_file")
                .short("l")
                .long("log_file")
                .value_name("LOG_FILE")
                .help("Sets the log file to write to")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("buffer_bytes")
                .long("buffer_bytes")
                .value_name("BYTES")
                .help("Sets the record buffer size (default 256)")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("placeholder")
                .long("placeholder")
                .value_name("MODE")
                .possible_values(&["zeroed", "max"])
                .help("Header contents until the file is finalized (default zeroed)")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("fortran_order")
                .long("fortran_order")
                .global(true)
                .help("Sets the fortran_order flag"),
        )
        .subcommand(SubCommand::with_name("write")
            .about(indoc!("
                Streams CSV rows into a .npy file, one record per row.

                Examples:
                # one float64 column from stdin
                seq 1 100 | npytools write -o seq.npy
                # structured records with labels
                npytools write -i trades.csv -o trades.npy --fields ts:i8,price:f4,size:f4
                # labels taken from the header row
                npytools write -i trades.csv -o trades.npy --fields i8,f4,f4 --header
                "))
            .arg(
                Arg::with_name("input")
                    .short("i")
                    .long("input")
                    .value_name("INPUT")
                    .help("CSV file to read (default stdin)")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("output")
                    .short("o")
                    .long("output")
                    .value_name("OUTPUT")
                    .help(".npy file to write")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("dtype")
                    .short("t")
                    .long("dtype")
                    .value_name("DTYPE")
                    .help("type of a single column, e.g. f8, i4, complex128 (default f8)")
                    .conflicts_with("fields")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("fields")
                    .short("f")
                    .long("fields")
                    .value_name("FIELDS")
                    .help("structured record, e.g. a:i4,b:f4 or i4,f4")
                    .takes_value(true),
            )
            .arg(Arg::with_name("header").long("header").help(
                "skip the first row, use it for labels when --fields has none",
            ))
            .arg(
                Arg::with_name("delimiter")
                    .short("d")
                    .long("delimiter")
                    .value_name("CHAR")
                    .help("field delimiter (default ,)")
                    .takes_value(true),
            ))
        .subcommand(SubCommand::with_name("arange")
            .about(indoc!("
                Writes evenly spaced values, like numpy.arange.

                Examples:
                npytools arange --stop 1000000 -t i8 -o ids.npy
                npytools arange --start 0 --stop 1 --step 0.001 -o grid.npy
                "))
            .arg(
                Arg::with_name("output")
                    .short("o")
                    .long("output")
                    .value_name("OUTPUT")
                    .help(".npy file to write")
                    .required(true)
                    .takes_value(true),
            )
            .arg(Arg::with_name("start").long("start").value_name("START").takes_value(true)
                .help("first value (default 0)"))
            .arg(Arg::with_name("stop").long("stop").value_name("STOP").takes_value(true)
                .required(true)
                .help("end of the interval, excluded"))
            .arg(Arg::with_name("step").long("step").value_name("STEP").takes_value(true)
                .help("spacing (default 1)"))
            .arg(
                Arg::with_name("dtype")
                    .short("t")
                    .long("dtype")
                    .value_name("DTYPE")
                    .help("one of i4, i8, f4, f8 (default f8)")
                    .takes_value(true),
            ))
        .get_matches()
}
