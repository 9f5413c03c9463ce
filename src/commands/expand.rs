//! `genai-replay expand` command.

use std::path::Path;

use crate::config::HarnessConfig;
use crate::mode::{resolve, Disposition};
use crate::table::{expand, ExecutionCase, TestTableFile};

/// Execute the `expand` command.
///
/// Prints one line per case: its replay id and how it would be handled for
/// the configured backend and mode.
///
/// # Errors
///
/// Returns an error string if the table cannot be loaded or expanded.
pub fn run(table: &Path, config: &HarnessConfig) -> Result<(), String> {
    let file = TestTableFile::load(table).map_err(|e| e.to_string())?;
    let cases = expand(&file).map_err(|e| e.to_string())?;
    print!("{}", render(&cases, config));
    Ok(())
}

/// Renders the case listing for `cases`.
#[must_use]
pub fn render(cases: &[ExecutionCase], config: &HarnessConfig) -> String {
    use std::fmt::Write as _;

    let width = cases.iter().map(|c| c.replay_id.len()).max().unwrap_or(9).max(9);
    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  DISPOSITION", "REPLAY ID");
    let _ = writeln!(out, "{:-<width$}  {:-<11}", "", "");
    for case in cases {
        let disposition = resolve(case, config.backend, config.mode, &config.capabilities);
        let _ = writeln!(out, "{:<width$}  {}", case.replay_id, describe(&disposition));
    }
    let _ = writeln!(
        out,
        "\n{} case(s) for backend {} in {} mode.",
        cases.len(),
        config.backend,
        config.mode
    );
    out
}

fn describe(disposition: &Disposition) -> String {
    match disposition {
        Disposition::Proceed => "run".to_string(),
        Disposition::Skip(reason) => format!("skip ({reason})"),
        Disposition::ExpectException(text) => format!("expect exception containing \"{text}\""),
    }
}
