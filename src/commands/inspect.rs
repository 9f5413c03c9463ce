//! `genai-replay inspect` command.

use crate::config::HarnessConfig;
use crate::replay::{DirectorySessionStore, MatchRules, ReplayFile, SessionKey, SessionStore};

/// Execute the `inspect` command.
///
/// Prints one row per recorded interaction: method, canonical URL, status
/// and segment counts.
///
/// # Errors
///
/// Returns an error string if the session cannot be loaded.
pub fn run(replay_id: &str, config: &HarnessConfig) -> Result<(), String> {
    let store = DirectorySessionStore::new(&config.replays_dir);
    let key = SessionKey::new(replay_id, config.backend);
    let file = store.load(&key).map_err(|e| e.to_string())?;
    print!("{}", render(&file, &config.match_rules));
    Ok(())
}

/// Renders the interaction table of `file`.
#[must_use]
pub fn render(file: &ReplayFile, rules: &MatchRules) -> String {
    use std::fmt::Write as _;

    let rows: Vec<(String, String, String, String)> = file
        .interactions
        .iter()
        .enumerate()
        .map(|(i, interaction)| {
            let response = &interaction.response;
            (
                format!("#{i}"),
                format!("{} {}", interaction.request.method, rules.canonical_url(&interaction.request.url)),
                response.status_code.to_string(),
                format!("{}/{}", response.body_segments.len(), response.sdk_response_segments.len()),
            )
        })
        .collect();

    let request_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(7).max(7);
    let mut out = String::new();
    let _ = writeln!(out, "Session: {}", file.replay_id);
    let _ = writeln!(out, "{:<4}  {:<request_width$}  STATUS  SEGMENTS (wire/sdk)", "#", "REQUEST");
    for (index, request, status, segments) in &rows {
        let _ = writeln!(out, "{index:<4}  {request:<request_width$}  {status:<6}  {segments}");
    }
    let _ = writeln!(out, "\n{} interaction(s).", rows.len());
    out
}
