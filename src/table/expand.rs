//! Expansion of a [`TestTableFile`] into concrete execution cases.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::debug;

use super::format::{ExceptionExpectation, TestTableFile};
use super::replay_id::{derive_id, validate_id};
use crate::error::{ReplayError, Result};

/// One concrete invocation of the method under test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionCase {
    /// Client operation under test.
    pub test_method: String,
    /// Item name from the table.
    pub name: String,
    /// Call parameters keyed by slot name.
    pub parameters: BTreeMap<String, Value>,
    /// Ordered slot names declared by the table.
    pub parameter_names: Vec<String>,
    /// Session key (derived or overridden).
    pub replay_id: String,
    /// Backend-specific error expectations.
    pub exception: ExceptionExpectation,
    /// Reason to skip in live API mode.
    pub skip_in_api_mode: Option<String>,
    /// Parameters encode a sum-typed value.
    pub has_union: bool,
}

impl ExecutionCase {
    /// Parameters in declared slot order; undeclared-but-unused slots are `None`.
    #[must_use]
    pub fn positional_parameters(&self) -> Vec<(&str, Option<&Value>)> {
        self.parameter_names
            .iter()
            .map(|name| (name.as_str(), self.parameters.get(name)))
            .collect()
    }

    /// Value of one parameter slot.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

/// Expands every item of `table` into an [`ExecutionCase`], in table order.
///
/// # Errors
///
/// - [`ReplayError::MissingParameterName`] if an item uses an undeclared key.
/// - [`ReplayError::DuplicateReplayIdentifier`] if two items share an id.
/// - [`ReplayError::InvalidReplayIdentifier`] if an id is unusable as a
///   session key.
///
/// Any error fails the whole expansion; no partial case list is returned.
pub fn expand(table: &TestTableFile) -> Result<Vec<ExecutionCase>> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(table.test_table.len());
    let mut cases = Vec::with_capacity(table.test_table.len());

    for item in &table.test_table {
        if let Some(parameter) =
            item.parameters.keys().find(|key| !table.parameter_names.contains(*key))
        {
            return Err(ReplayError::MissingParameterName {
                item: item.name.clone(),
                parameter: parameter.clone(),
            });
        }

        let replay_id = derive_id(&table.test_method, &item.name, item.override_id());
        validate_id(&replay_id)?;

        if let Some(first) = seen.insert(replay_id.clone(), &item.name) {
            return Err(ReplayError::DuplicateReplayIdentifier {
                replay_id,
                first: first.to_string(),
                second: item.name.clone(),
            });
        }

        cases.push(ExecutionCase {
            test_method: table.test_method.clone(),
            name: item.name.clone(),
            parameters: item.parameters.clone(),
            parameter_names: table.parameter_names.clone(),
            replay_id,
            exception: item.exception_expectation(),
            skip_in_api_mode: item.skip_reason().map(str::to_string),
            has_union: item.has_union,
        });
    }

    debug!(test_method = %table.test_method, cases = cases.len(), "expanded test table");
    Ok(cases)
}
