use crate::Arguments;
use clap::{
    arg, crate_authors, crate_description, crate_name, crate_version, value_parser, Arg,
    ArgAction, ArgMatches, Command,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::{io, thread};

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_arguments(command);
        CLIParser { command }
    }

    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .try_get_matches_from_mut(itr)
            .unwrap_or_else(|e| e.exit());
        Self::extract_arguments(&matches)
    }

    fn register_arguments(command: Command) -> Command {
        let command = Self::register_input_files_argument(command);
        let command = Self::register_output_argument(command);
        let command = Self::register_dither_argument(command);
        Self::register_threads_argument(command)
    }

    fn register_input_files_argument(command: Command) -> Command {
        command.arg(Self::create_input_files_argument())
    }

    fn register_output_argument(command: Command) -> Command {
        command.arg(Self::create_output_argument())
    }

    fn register_dither_argument(command: Command) -> Command {
        command.arg(Self::create_dither_argument())
    }

    fn register_threads_argument(command: Command) -> Command {
        command.arg(Self::create_threads_argument())
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about(crate_description!())
    }

    fn create_input_files_argument() -> Arg {
        Arg::new("input_files")
            .help("Paths to BMP input files")
            .value_parser(value_parser!(PathBuf))
            .num_args(1..)
            .required(true)
    }

    fn create_output_argument() -> Arg {
        arg!(output: -o --output <PATH> "Output file, or output directory when several inputs are given")
            .required(false)
            .value_parser(value_parser!(PathBuf))
    }

    fn create_dither_argument() -> Arg {
        arg!(dither: -d --dither "Apply ordered dithering before quantization")
            .action(ArgAction::SetTrue)
    }

    fn create_threads_argument() -> Arg {
        arg!(-t --threads <THREADS> "Number of Threads")
            .default_value(get_number_of_threads().unwrap_or(1).to_string())
            .required(false)
            .value_parser(value_parser!(usize))
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        Arguments {
            input_files: Self::extract_input_files_argument(matches),
            output: Self::extract_output_argument(matches),
            dither: Self::extract_dither_argument(matches),
            number_of_threads: Self::extract_threads_argument(matches),
        }
    }

    fn extract_input_files_argument(matches: &ArgMatches) -> Vec<PathBuf> {
        matches
            .get_many::<PathBuf>("input_files")
            .expect("Required argument input_files not provided")
            .cloned()
            .collect()
    }

    fn extract_output_argument(matches: &ArgMatches) -> Option<PathBuf> {
        matches.get_one::<PathBuf>("output").cloned()
    }

    fn extract_dither_argument(matches: &ArgMatches) -> bool {
        matches.get_flag("dither")
    }

    fn extract_threads_argument(matches: &ArgMatches) -> usize {
        matches
            .get_one::<usize>("threads")
            .expect("Required argument threads not provided")
            .to_owned()
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}

fn get_number_of_threads() -> io::Result<usize> {
    Ok(thread::available_parallelism()?.get())
}
