//! Test table fixture format.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReplayError, Result};
use crate::mode::Backend;

/// One declarative fixture: a client method plus the cases to run it with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestTableFile {
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Client operation under test (e.g. `models.generate_content`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub test_method: String,
    /// Ordered names of the parameter slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_names: Vec<String>,
    /// Cases, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_table: Vec<TestTableItem>,
}

/// A single case of a [`TestTableFile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestTableItem {
    /// Case name; derives the default replay id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Call parameters keyed by slot name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
    /// Substring the call must raise against MLDev.
    #[serde(
        default,
        rename = "exceptionIfMldev",
        alias = "exceptionIfMLDev",
        skip_serializing_if = "Option::is_none"
    )]
    pub exception_if_mldev: Option<String>,
    /// Substring the call must raise against Vertex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_if_vertex: Option<String>,
    /// Explicit replay id replacing the derived one.
    #[serde(
        default,
        rename = "overrideReplayId",
        alias = "overrideReplayID",
        skip_serializing_if = "Option::is_none"
    )]
    pub override_replay_id: Option<String>,
    /// Parameters encode a sum-typed value.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_union: bool,
    /// Reason to skip the case when running against the live API.
    #[serde(
        default,
        rename = "skipInApiMode",
        alias = "skipInAPIMode",
        skip_serializing_if = "Option::is_none"
    )]
    pub skip_in_api_mode: Option<String>,
}

/// Which backends a case expects to fail on, and with what text.
///
/// The fixture format carries two independent optional strings; this is
/// the same information as a closed set of shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExceptionExpectation {
    /// The call succeeds on both backends.
    #[default]
    None,
    /// The call fails on MLDev only.
    MlDev(String),
    /// The call fails on Vertex only.
    Vertex(String),
    /// The call fails on both backends, each with its own text.
    Both {
        /// Substring expected from MLDev.
        mldev: String,
        /// Substring expected from Vertex.
        vertex: String,
    },
}

impl ExceptionExpectation {
    /// Builds the expectation from the two fixture fields. Empty strings
    /// count as absent.
    #[must_use]
    pub fn from_fields(mldev: Option<&str>, vertex: Option<&str>) -> Self {
        let mldev = mldev.filter(|s| !s.is_empty());
        let vertex = vertex.filter(|s| !s.is_empty());
        match (mldev, vertex) {
            (None, None) => Self::None,
            (Some(m), None) => Self::MlDev(m.to_string()),
            (None, Some(v)) => Self::Vertex(v.to_string()),
            (Some(m), Some(v)) => Self::Both { mldev: m.to_string(), vertex: v.to_string() },
        }
    }

    /// Expected substring for one backend, if any.
    #[must_use]
    pub fn for_backend(&self, backend: Backend) -> Option<&str> {
        match (self, backend) {
            (Self::MlDev(text) | Self::Both { mldev: text, .. }, Backend::MlDev)
            | (Self::Vertex(text) | Self::Both { vertex: text, .. }, Backend::Vertex) => {
                Some(text.as_str())
            }
            _ => None,
        }
    }
}

impl TestTableItem {
    /// Typed view of the two exception fields.
    #[must_use]
    pub fn exception_expectation(&self) -> ExceptionExpectation {
        ExceptionExpectation::from_fields(
            self.exception_if_mldev.as_deref(),
            self.exception_if_vertex.as_deref(),
        )
    }

    /// Skip reason, with empty strings treated as absent.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_in_api_mode.as_deref().filter(|s| !s.is_empty())
    }

    /// Override id, with empty strings treated as absent.
    #[must_use]
    pub fn override_id(&self) -> Option<&str> {
        self.override_replay_id.as_deref().filter(|s| !s.is_empty())
    }
}

impl TestTableFile {
    /// Loads a table from disk. `.yaml`/`.yml` files are parsed as YAML,
    /// everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
        let is_yaml =
            path.extension().and_then(|e| e.to_str()).is_some_and(|e| e == "yaml" || e == "yml");
        let context = format!("test table {}", path.display());
        if is_yaml {
            serde_yaml::from_str(&content).map_err(|source| ReplayError::Yaml { context, source })
        } else {
            serde_json::from_str(&content).map_err(|e| ReplayError::json(context, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_upper_case_acronym_spellings() {
        let item: TestTableItem = serde_json::from_value(json!({
            "name": "test_delete",
            "exceptionIfMLDev": "not supported",
            "overrideReplayID": "models_delete/shared",
            "skipInAPIMode": "destructive"
        }))
        .unwrap();
        assert_eq!(item.exception_if_mldev.as_deref(), Some("not supported"));
        assert_eq!(item.override_id(), Some("models_delete/shared"));
        assert_eq!(item.skip_reason(), Some("destructive"));
    }

    #[test]
    fn parses_camel_case_fixture() {
        let table: TestTableFile = serde_json::from_value(json!({
            "comment": "generate content",
            "testMethod": "models.generate_content",
            "parameterNames": ["model", "contents"],
            "testTable": [{
                "name": "test_quota",
                "parameters": {"model": "gemini-1.5-flash", "contents": "hi"},
                "exceptionIfVertex": "quota exceeded",
                "overrideReplayId": "shared/quota",
                "hasUnion": true,
                "skipInApiMode": "burns quota"
            }]
        }))
        .unwrap();

        let item = &table.test_table[0];
        assert_eq!(table.parameter_names, vec!["model", "contents"]);
        assert_eq!(item.exception_if_vertex.as_deref(), Some("quota exceeded"));
        assert_eq!(item.override_id(), Some("shared/quota"));
        assert!(item.has_union);
        assert_eq!(item.skip_reason(), Some("burns quota"));
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let item = TestTableItem {
            name: "x".into(),
            exception_if_mldev: Some(String::new()),
            override_replay_id: Some(String::new()),
            skip_in_api_mode: Some(String::new()),
            ..TestTableItem::default()
        };
        assert_eq!(item.exception_expectation(), ExceptionExpectation::None);
        assert_eq!(item.override_id(), None);
        assert_eq!(item.skip_reason(), None);
    }

    #[test]
    fn expectation_is_resolved_per_backend() {
        let both = ExceptionExpectation::from_fields(Some("bad model"), Some("not found"));
        assert_eq!(both.for_backend(Backend::MlDev), Some("bad model"));
        assert_eq!(both.for_backend(Backend::Vertex), Some("not found"));

        let vertex_only = ExceptionExpectation::from_fields(None, Some("quota exceeded"));
        assert_eq!(vertex_only.for_backend(Backend::MlDev), None);
        assert_eq!(vertex_only.for_backend(Backend::Vertex), Some("quota exceeded"));

        assert_eq!(ExceptionExpectation::None.for_backend(Backend::Vertex), None);
    }

    #[test]
    fn loads_yaml_table() {
        let dir = std::env::temp_dir().join(format!("genai_replay_table_yaml_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("table.yaml");
        std::fs::write(
            &path,
            "testMethod: models.count_tokens\nparameterNames: [model]\ntestTable:\n  - name: simple\n    parameters:\n      model: gemini\n",
        )
        .unwrap();

        let table = TestTableFile::load(&path).unwrap();
        assert_eq!(table.test_method, "models.count_tokens");
        assert_eq!(table.test_table[0].parameters["model"], json!("gemini"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn serialization_omits_unset_fields() {
        let item = TestTableItem { name: "plain".into(), ..TestTableItem::default() };
        assert_eq!(serde_json::to_value(&item).unwrap(), json!({"name": "plain"}));
    }
}
