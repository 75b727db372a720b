//! mnx-convert - convert partwise MusicXML files to MNX-style JSON
//!
//! Reads a MusicXML document from a file (or stdin), converts it, and
//! writes the JSON document to a file (or stdout). `--check` additionally
//! runs the downstream validation pass and reports findings on stderr.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mnx_convert::{has_errors, parse_musicxml, validate};

/// Convert partwise MusicXML to MNX-style JSON
#[derive(Parser)]
#[command(name = "mnx-convert")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MusicXML input file (stdin when omitted)
    input: Option<PathBuf>,

    /// Write the JSON document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Run structural checks over the converted score; findings go to
    /// stderr and error-severity ones fail the exit code
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool, String> {
    let xml = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("cannot read {}: {err}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("cannot read stdin: {err}"))?;
            buffer
        }
    };

    let score = parse_musicxml(&xml).map_err(|err| err.to_string())?;

    let mut clean = true;
    if cli.check {
        let findings = validate(&score);
        for finding in &findings {
            eprintln!("{finding}");
        }
        clean = !has_errors(&findings);
    }

    let json = if cli.pretty {
        score.to_json_pretty()
    } else {
        score.to_json()
    }
    .map_err(|err| format!("cannot serialize score: {err}"))?;

    match &cli.output {
        Some(path) => fs::write(path, json + "\n")
            .map_err(|err| format!("cannot write {}: {err}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(clean)
}
