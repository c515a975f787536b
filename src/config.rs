use crate::source::FileSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::Level;

/// Settings for one run of the command-line host.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub script: Option<PathBuf>,
    pub expr: Option<String>,
    pub bands_dir: PathBuf,
    pub pattern: String,
    pub nodata: f64,
    pub out: Option<PathBuf>,
    pub interactive: bool,
    pub verbosity: u8,
}

impl Config {
    pub fn command() -> Command {
        Command::new("bandmath")
            .about("Evaluates raster band algebra formulas such as (B5 - B4) / (B5 + B4)")
            .arg(
                Arg::new("file")
                    .help("Script file with ';'-separated statements")
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .index(1),
            )
            .arg(
                Arg::new("expr")
                    .short('e')
                    .long("expr")
                    .help("Formula to evaluate")
                    .value_name("EXPR")
                    .conflicts_with("file"),
            )
            .arg(
                Arg::new("bands")
                    .short('d')
                    .long("bands")
                    .help("Directory holding one raster file per band")
                    .value_name("DIR")
                    .value_parser(clap::value_parser!(PathBuf))
                    .default_value("."),
            )
            .arg(
                Arg::new("pattern")
                    .short('p')
                    .long("pattern")
                    .help("Band file name; {band} is replaced by the band identifier")
                    .value_name("PATTERN")
                    .default_value(FileSource::DEFAULT_PATTERN),
            )
            .arg(
                Arg::new("nodata")
                    .short('n')
                    .long("nodata")
                    .help("NoData value assigned to decoded bands")
                    .value_name("VALUE")
                    .value_parser(clap::value_parser!(f64))
                    .allow_negative_numbers(true)
                    .default_value("0"),
            )
            .arg(
                Arg::new("out")
                    .short('o')
                    .long("out")
                    .help("Write a raster result to this PNG file")
                    .value_name("PNG")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("interactive")
                    .short('i')
                    .long("interactive")
                    .help("Start in interactive REPL mode")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase log verbosity (repeatable)")
                    .action(ArgAction::Count),
            )
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            script: matches.get_one::<PathBuf>("file").cloned(),
            expr: matches.get_one::<String>("expr").cloned(),
            bands_dir: matches
                .get_one::<PathBuf>("bands")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(".")),
            pattern: matches
                .get_one::<String>("pattern")
                .cloned()
                .unwrap_or_else(|| FileSource::DEFAULT_PATTERN.to_string()),
            nodata: matches.get_one::<f64>("nodata").copied().unwrap_or(0.0),
            out: matches.get_one::<PathBuf>("out").cloned(),
            interactive: matches.get_flag("interactive"),
            verbosity: matches.get_count("verbose"),
        }
    }

    pub fn parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    pub fn file_source(&self) -> FileSource {
        FileSource::new(self.bands_dir.clone(), self.pattern.clone(), self.nodata)
    }

    pub fn log_level(&self) -> Level {
        match self.verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// REPL when asked for, or when there is nothing else to run.
    pub fn wants_repl(&self) -> bool {
        self.interactive || (self.script.is_none() && self.expr.is_none())
    }
}
