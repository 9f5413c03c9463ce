//! `genai-replay check` command.

use std::path::PathBuf;

use crate::config::HarnessConfig;
use crate::mode::{resolve, Disposition, RunMode};
use crate::replay::{DirectorySessionStore, SessionKey, SessionStore};
use crate::table::{expand, TestTableFile};

/// Execute the `check` command.
///
/// Every case that would run in replay mode must have a session that loads
/// and validates for the configured backend.
///
/// # Errors
///
/// Returns an error string if a table is invalid or any case lacks a usable
/// session.
pub fn run(tables: &[PathBuf], config: &HarnessConfig) -> Result<(), String> {
    let store = DirectorySessionStore::new(&config.replays_dir);
    let checked = check_tables(tables, config, &store)?;
    for row in &checked.rows {
        println!("{row}");
    }

    let problems = checked.problems;
    if problems.is_empty() {
        println!("All sessions present for backend {}.", config.backend);
        return Ok(());
    }
    for problem in &problems {
        eprintln!("  {problem}");
    }
    Err(format!("{} case(s) without a usable session", problems.len()))
}

/// Result of checking tables against a store.
#[derive(Debug, Default)]
pub struct CheckedTables {
    /// One status row per case that would run, in expansion order.
    pub rows: Vec<String>,
    /// One message per case whose session is missing or unusable.
    pub problems: Vec<String>,
}

/// Checks every case of `tables` for a usable session in `store`.
///
/// # Errors
///
/// Returns an error string if a table cannot be loaded or expanded.
pub fn check_tables(
    tables: &[PathBuf],
    config: &HarnessConfig,
    store: &dyn SessionStore,
) -> Result<CheckedTables, String> {
    let mut checked = CheckedTables::default();
    for table in tables {
        let file = TestTableFile::load(table).map_err(|e| e.to_string())?;
        let cases = expand(&file).map_err(|e| e.to_string())?;
        for case in &cases {
            if let Disposition::Skip(_) =
                resolve(case, config.backend, RunMode::Replay, &config.capabilities)
            {
                continue;
            }
            let key = SessionKey::new(case.replay_id.clone(), config.backend);
            match store.load(&key) {
                Ok(session) => checked.rows.push(format!(
                    "ok       {} ({} interaction(s))",
                    case.replay_id,
                    session.interactions.len()
                )),
                Err(e) => {
                    checked.rows.push(format!("missing  {}", case.replay_id));
                    checked.problems.push(e.to_string());
                }
            }
        }
    }
    Ok(checked)
}
