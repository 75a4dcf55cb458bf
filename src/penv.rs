// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

pub mod process;
pub mod record;
pub mod selection;

use clap::{arg, crate_version, ArgAction, Command};
use uucore::error::{UResult, USimpleError};
use uucore::{format_usage, help_about, help_usage};

use crate::selection::{collect_records, Settings};

const ABOUT: &str = help_about!("penv.md");
const USAGE: &str = help_usage!("penv.md");

/// # Conceptual model of `penv`
///
/// `penv` takes one snapshot of the process table and prints it. The
/// `/proc` walk yields every visible process exactly once; for each
/// candidate the selection rules decide whether a full record (command
/// line and environment block) is materialized. Passing `--pid` or
/// `--name` switches the whole run into targeted mode, in which the
/// `--filter`/`--ignore` substring rules are not consulted at all.
///
/// Rendering happens only after the scan is complete, either as one JSON
/// array or as one three-field text block per record.
#[uucore::main]
pub fn uumain(args: impl uucore::Args) -> UResult<()> {
    let matches = uu_app().try_get_matches_from(args)?;
    let settings = Settings::from_matches(&matches);

    let records = collect_records(&settings);

    if settings.json {
        let json = serde_json::to_string(&records)
            .map_err(|e| USimpleError::new(1, e.to_string()))?;
        println!("{}", json);
    } else {
        for record in &records {
            println!("{}", record);
        }
    }

    Ok(())
}

pub fn uu_app() -> Command {
    Command::new(uucore::util_name())
        .version(crate_version!())
        .about(ABOUT)
        .override_usage(format_usage(USAGE))
        .infer_long_args(true)
        .args([
            arg!(--pid <PID>        "show the process with this ID")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Append),
            arg!(--name <NAME>      "find processes by name (exact match)")
                .action(ArgAction::Append),
            arg!(--user <USER>      "only consider processes owned by this user")
                .action(ArgAction::Append),
            arg!(--filter <STRING>  "show processes whose name contains this value (case sensitive)")
                .action(ArgAction::Append),
            arg!(--ignore <STRING>  "skip processes whose name contains this value (case sensitive)")
                .action(ArgAction::Append),
            arg!(--json             "output to JSON"),
        ])
}
