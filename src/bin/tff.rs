//! Command-line interface for tff
//! This binary parses TFF token files, dumps their dependency graph or raw
//! content, and resolves them into concrete token sets.
//!
//! Usage:
//!   tff [options] `<file>`...   - Parse and resolve TFF files (`-` reads stdin)
//!   tff -g `<file>`...          - Print the dependency graph in DOT format
//!   tff -i `<file>`...          - Print the combined parsed input unresolved
//!   tff -s `<statements>`       - Parse an inline statement string as well

use clap::{Arg, ArgAction, ArgGroup, Command};
use std::io::Read;

use tff::tff::formats;
use tff::tff::{TffParser, TokenSet};

fn main() {
    let matches = Command::new("tff")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse and resolve TFF token files")
        .arg(
            Arg::new("verbosity")
                .long("verbose")
                .short('v')
                .value_parser(["error", "warn", "info", "debug"])
                .default_value("warn")
                .help("Logging level"),
        )
        .arg(
            Arg::new("output-format")
                .long("output-format")
                .short('o')
                .value_parser(["TFF", "JSON", "dict"])
                .default_value("TFF")
                .help("Output format for single resolved token sets"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Do not print output"),
        )
        .arg(
            Arg::new("print-all")
                .long("print-all")
                .short('a')
                .action(ArgAction::SetTrue)
                .help("Output multiple resolved token sets in long format"),
        )
        .arg(
            Arg::new("print-input")
                .long("print-input")
                .short('i')
                .action(ArgAction::SetTrue)
                .help("Output combined parsed input before resolution"),
        )
        .arg(
            Arg::new("print-graph")
                .long("print-graph")
                .short('g')
                .action(ArgAction::SetTrue)
                .help("Output dependency graph in DOT format"),
        )
        .arg(
            Arg::new("string")
                .long("string")
                .short('s')
                .value_name("str")
                .help("Parse a specific statement string"),
        )
        .group(
            ArgGroup::new("output-mode")
                .args(["quiet", "print-all", "print-input", "print-graph", "string"])
                .multiple(false),
        )
        .arg(
            Arg::new("files")
                .value_name("file")
                .num_args(0..)
                .help("Input TFF file(s) to parse; `-` reads stdin"),
        )
        .get_matches();

    init_logging(
        matches
            .get_one::<String>("verbosity")
            .map(String::as_str)
            .unwrap_or("warn"),
    );

    let parser = TffParser::new();
    let mut set = TokenSet::new();

    for file in matches.get_many::<String>("files").unwrap_or_default() {
        let parsed = if file == "-" {
            log::info!("processing stdin");
            let mut source = String::new();
            if let Err(error) = std::io::stdin().read_to_string(&mut source) {
                fail(&format!("cannot read stdin: {}", error));
            }
            parser.parse_str(&source)
        } else {
            log::info!("processing input file {}", file);
            parser.parse_file(file)
        };
        match parsed {
            Ok(parsed) => set.extend(parsed),
            Err(error) => fail(&format!("in \"{}\": {}", file, error)),
        }
    }

    if let Some(text) = matches.get_one::<String>("string") {
        log::info!("parsing string \"{}\"", text);
        match parser.parse_str(text) {
            Ok(parsed) => set.extend(parsed),
            Err(error) => fail(&error.to_string()),
        }
    }

    let format = matches
        .get_one::<String>("output-format")
        .map(String::as_str)
        .unwrap_or("TFF");

    if matches.get_flag("print-graph") {
        log::info!("generating dependency graph");
        println!("{}", formats::to_dot(&set, "G"));
        return;
    }

    if matches.get_flag("print-input") {
        log::info!("generating input token data");
        println!("{}", long_format(&set, format));
        return;
    }

    log::info!("resolving tokens");
    let resolved = match set.resolve() {
        Ok(resolved) => resolved,
        Err(error) => fail(&error.to_string()),
    };

    if matches.get_flag("quiet") {
        return;
    }

    if resolved.len() == 1 {
        log::info!("1 resolved token set generated");
        println!("{}", long_format(&resolved[0], format));
    } else {
        log::info!("{} resolved token sets generated", resolved.len());
        for (index, candidate) in resolved.iter().enumerate() {
            if matches.get_flag("print-all") {
                println!("{}", long_format(candidate, format));
            } else {
                println!("[{}]: {}", index, formats::mapping_to_json(candidate));
            }
        }
    }
}

/// Render a single token set in the requested long format.
fn long_format(set: &TokenSet, format: &str) -> String {
    match format {
        "JSON" => formats::to_json(set),
        "dict" => formats::mapping_to_json(set),
        _ => formats::to_tff(set),
    }
}

fn init_logging(level: &str) {
    let filter = match level {
        "error" => log::LevelFilter::Error,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        _ => log::LevelFilter::Warn,
    };
    env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .init();
}

fn fail(message: &str) -> ! {
    log::error!("{}", message);
    std::process::exit(1);
}
