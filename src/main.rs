//! Tool to read and edit IPMI FRU information images
//!
//! Without `--modify`, the image is parsed and its info areas are printed.
//! With `--modify`, the given field options are applied, and the image is
//! rebuilt and written back. Images that do not exist yet are created.
//!
//! Field options are generated from the field code registry, e.g. `--BSN` for
//! the board serial number. Each of them but the manufacturing date has a
//! `-raw` variant taking space separated byte values, such as `--BSN-raw "0 0"`,
//! for placeholder images to be filled in later.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Arg, ArgMatches, Command, CommandFactory, FromArgMatches, Parser};
use log::{debug, error, info, warn};

mod show;

use fruid::{
    Fru, FruError,
    area::AreaKind,
    date::DATE_FORMAT,
    registry::{self, MFG_DATE_CODE},
};

/// Parse and modify IPMI FRU information images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the FRU file
    fru_file: PathBuf,
    /// Modify fields given via field options and write the file
    #[clap(long, short, action)]
    modify: bool,
    /// Print offset, value and description of every part of the image
    #[clap(long, short, action)]
    details: bool,
    #[clap(long, short, action)]
    verbose: bool,
}

fn raw_id(code: &str) -> String {
    format!("{code}-raw")
}

/// Parse space separated bytes, given as decimal or 0x-prefixed hex.
fn parse_raw_bytes(s: &str) -> Result<Vec<u8>, String> {
    s.split_whitespace()
        .map(|b| {
            let r = match b.strip_prefix("0x").or_else(|| b.strip_prefix("0X")) {
                Some(h) => u8::from_str_radix(h, 16),
                None => b.parse::<u8>(),
            };
            r.map_err(|e| format!("invalid byte '{b}': {e}"))
        })
        .collect()
}

fn with_field_args(cmd: Command) -> Command {
    let mut cmd = cmd.next_help_heading("Field options");
    for f in registry::fields() {
        cmd = cmd.arg(
            Arg::new(f.code)
                .long(f.code)
                .value_name("VALUE")
                .help(format!("modify {}", f.name)),
        );
        if f.is_mfg_date() {
            continue;
        }
        let id = raw_id(f.code);
        cmd = cmd.arg(
            Arg::new(id.clone())
                .long(id)
                .value_name("BYTES")
                .value_parser(parse_raw_bytes)
                .hide_short_help(true)
                .help(format!("modify {} with raw bytes", f.name)),
        );
    }
    cmd
}

enum Change {
    Text(&'static str, String),
    Raw(&'static str, Vec<u8>),
}

/// Requested changes in registry order
fn field_changes(matches: &ArgMatches) -> Vec<Change> {
    let mut changes = Vec::new();
    for f in registry::fields() {
        if let Some(v) = matches.get_one::<String>(f.code) {
            changes.push(Change::Text(f.code, v.clone()));
        }
        if f.is_mfg_date() {
            continue;
        }
        if let Some(b) = matches.get_one::<Vec<u8>>(&raw_id(f.code)) {
            changes.push(Change::Raw(f.code, b.clone()));
        }
    }
    changes
}

fn run(cli: &Cli, matches: &ArgMatches) -> Result<(), FruError> {
    let Cli {
        fru_file,
        modify,
        details,
        verbose,
    } = cli;
    let file_name = fru_file.display();

    let exists = fru_file.exists();
    let (mut fru, rows) = if *modify && !exists {
        println!("FRU file {file_name} does not exist. Creating a new file.");
        (Fru::new(), Vec::new())
    } else {
        info!("Reading {file_name}...");
        let data = fs::read(fru_file)?;
        Fru::parse_detailed(&data)?
    };
    if *verbose {
        println!("{fru:#02x?}");
    }

    if !*modify {
        show::show(&fru);
        if *details {
            show::details(&rows);
        }
        return Ok(());
    }

    let changes = field_changes(matches);
    if changes.is_empty() {
        warn!("No modifications specified.");
        return Ok(());
    }
    for c in changes {
        match c {
            Change::Text(code, v) => {
                debug!("{code} = '{v}'");
                fru.modify_field(code, &v)?;
            }
            Change::Raw(code, b) => {
                debug!("{code} = {b:02x?}");
                fru.modify_field_raw(code, b)?;
            }
        }
    }

    let undated = fru
        .area(AreaKind::Board)
        .is_some_and(|b| b.mfg_date().is_none());
    if !exists && undated {
        let now = Local::now().format(DATE_FORMAT).to_string();
        info!("No board manufacturing date given, using {now}");
        fru.modify_field(MFG_DATE_CODE, &now)?;
    }

    if let Err(e) = fru.rebuild() {
        println!("Failed to rebuild FRU binary due to errors.");
        return Err(e);
    }
    fru.write(fru_file)?;
    println!("FRU data has been updated and written to {file_name}.");
    Ok(())
}

fn main() -> ExitCode {
    // Default to log level "info". Otherwise, you get no "regular" logs.
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    let matches = with_field_args(Cli::command()).get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    match run(&cli, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[test]
fn raw_bytes() {
    assert_eq!(parse_raw_bytes("0 0 0"), Ok(vec![0, 0, 0]));
    assert_eq!(parse_raw_bytes(" 0x41 66\t0X7f "), Ok(vec![0x41, 66, 0x7f]));
    assert_eq!(parse_raw_bytes(""), Ok(vec![]));
    assert!(parse_raw_bytes("256").is_err());
    assert!(parse_raw_bytes("0xzz").is_err());
}

#[test]
fn field_options() {
    let cmd = with_field_args(Cli::command());
    cmd.clone().debug_assert();
    let m = cmd
        .try_get_matches_from([
            "fruid-util",
            "fru.bin",
            "-m",
            "--PN",
            "Widget",
            "--BSN-raw",
            "0 0 0",
            "--CPN",
            "",
        ])
        .unwrap();
    let cli = Cli::from_arg_matches(&m).unwrap();
    assert!(cli.modify);
    let changes = field_changes(&m);
    assert_eq!(changes.len(), 3);
    // chassis, then board, then product
    assert!(matches!(&changes[0], Change::Text("CPN", v) if v.is_empty()));
    assert!(matches!(&changes[1], Change::Raw("BSN", b) if b == &[0, 0, 0]));
    assert!(matches!(&changes[2], Change::Text("PN", v) if v == "Widget"));
}

#[test]
fn unknown_option() {
    let cmd = with_field_args(Cli::command());
    assert!(
        cmd.try_get_matches_from(["fruid-util", "fru.bin", "--XYZ", "1"])
            .is_err()
    );
}
