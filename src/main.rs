use std::env::args_os;
use std::process::exit;

use unipal::{convert_to_uniform_palette, CLIParser};

fn main() {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    let reports = convert_to_uniform_palette(&arguments);
    for report in &reports {
        match &report.result {
            Some(Ok(())) => println!(
                "Converted {} to {}",
                report.input_file.display(),
                report.output_file.display()
            ),
            Some(Err(e)) => eprintln!(
                "Conversion of {} failed because of: {}",
                report.input_file.display(),
                e
            ),
            None => eprintln!(
                "Conversion of {} did not finish",
                report.input_file.display()
            ),
        }
    }
    if !reports.iter().all(|report| report.succeeded()) {
        exit(1);
    }
}
