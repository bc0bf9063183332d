//! Key inspection service.
//!
//! Builds keys from plain-text call descriptions and reports them together with their
//! ancestors and any diagnostics raised while encoding.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::cache::{
    Argument, CallIdentity, ComponentId, ComponentType, DiagnosticListener, KEY_SEPARATOR,
    KeyBuilder, KeyConfig, KeyLevel, MethodSignature, RecordingListener, ancestor_keys,
};

use super::error::AppError;

/// A key, its ancestors and the diagnostics raised while building it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<KeyLevel>,
    pub key: Option<String>,
    pub ancestors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl KeyReport {
    fn new(level: Option<KeyLevel>, key: Option<String>, diagnostics: Vec<String>) -> Self {
        let ancestors = key
            .as_deref()
            .map(|key| ancestor_keys(key).map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            level,
            key,
            ancestors,
            diagnostics,
        }
    }

    /// Decompose an existing key without knowing how it was built.
    pub fn for_existing_key(key: &str) -> Self {
        Self::new(None, Some(key.to_string()), Vec::new())
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        match &self.key {
            Some(key) => {
                let _ = writeln!(out, "key: {key}");
            }
            None => out.push_str("key: (opted out)\n"),
        }
        if let Some(level) = self.level {
            let _ = writeln!(out, "level: {}", level.as_str());
        }
        if self.ancestors.is_empty() {
            out.push_str("ancestors: (none)\n");
        } else {
            out.push_str("ancestors:\n");
            for ancestor in &self.ancestors {
                let _ = writeln!(out, "  {ancestor}");
            }
        }
        for diagnostic in &self.diagnostics {
            let _ = writeln!(out, "warning: {diagnostic}");
        }
        out
    }

    pub fn write_to(&self, out: &mut impl Write, json: bool) -> Result<(), AppError> {
        if json {
            serde_json::to_writer_pretty(&mut *out, self)?;
            writeln!(out)?;
        } else {
            out.write_all(self.render_text().as_bytes())?;
        }
        out.flush()?;
        Ok(())
    }
}

/// One call described in plain text. Arguments are encoded as strings.
#[derive(Debug, Clone, Default)]
pub struct KeyRequest {
    pub component_type: String,
    pub component: String,
    pub method: String,
    pub parameter_types: Vec<String>,
    pub arguments: Vec<String>,
}

/// A bulk-invalidation target: the deepest of type, component or method given.
#[derive(Debug, Clone, Default)]
pub struct RemoveKeyRequest {
    pub component_type: String,
    pub component: Option<String>,
    pub method: Option<String>,
    pub parameter_types: Vec<String>,
}

/// Builds reports with a configured [`KeyBuilder`].
#[derive(Debug, Clone)]
pub struct KeyInspector {
    builder: KeyBuilder,
}

impl KeyInspector {
    pub fn new(config: &KeyConfig) -> Self {
        Self::with_builder(KeyBuilder::from_config(config))
    }

    pub fn with_builder(builder: KeyBuilder) -> Self {
        Self { builder }
    }

    /// Build the full key of a call. Uses the ambient scope when one is active.
    #[instrument(skip_all, fields(component_type = %request.component_type, method = %request.method))]
    pub fn full_key(&self, request: &KeyRequest) -> Result<KeyReport, AppError> {
        validate_field("type", &request.component_type)?;
        validate_field("component", &request.component)?;
        validate_field("method", &request.method)?;
        for parameter_type in &request.parameter_types {
            validate_field("param-type", parameter_type)?;
        }

        let component_type = ComponentType::new(request.component_type.as_str());
        let component = ComponentId::new(request.component.as_str());
        let method = signature(&request.method, &request.parameter_types);
        let arguments: Vec<Option<Argument<'_>>> = request
            .arguments
            .iter()
            .map(|value| Some(Argument::display(value)))
            .collect();

        let recorder = Arc::new(RecordingListener::new());
        let builder = self
            .builder
            .clone()
            .with_listeners([recorder.clone() as Arc<dyn DiagnosticListener>]);
        let outcome = builder.key_and_ancestors(&CallIdentity::new(
            &component_type,
            &component,
            &method,
            &arguments,
        ));

        debug!(cacheable = outcome.is_cacheable(), "Key inspected");
        Ok(KeyReport::new(
            Some(KeyLevel::Full),
            outcome.into_key(),
            recorder.messages(),
        ))
    }

    /// Build the level 0, 1 or 2 key for bulk invalidation.
    pub fn remove_key(&self, request: &RemoveKeyRequest) -> Result<KeyReport, AppError> {
        validate_field("type", &request.component_type)?;
        let component_type = ComponentType::new(request.component_type.as_str());

        let (level, key) = match (request.component.as_deref(), request.method.as_deref()) {
            (None, None) if request.parameter_types.is_empty() => {
                (KeyLevel::Type, self.builder.type_key(&component_type))
            }
            (Some(component), None) if request.parameter_types.is_empty() => {
                validate_field("component", component)?;
                let component = ComponentId::new(component);
                (
                    KeyLevel::Component,
                    self.builder.component_key(&component_type, &component),
                )
            }
            (Some(component), Some(method)) => {
                validate_field("component", component)?;
                validate_field("method", method)?;
                for parameter_type in &request.parameter_types {
                    validate_field("param-type", parameter_type)?;
                }
                let component = ComponentId::new(component);
                let method = signature(method, &request.parameter_types);
                (
                    KeyLevel::Signature,
                    self.builder
                        .signature_key(&component_type, &component, &method),
                )
            }
            (None, Some(_)) => {
                return Err(AppError::validation("a method requires a component"));
            }
            (_, None) => {
                return Err(AppError::validation("parameter types require a method"));
            }
        };

        Ok(KeyReport::new(Some(level), Some(key), Vec::new()))
    }
}

fn signature(method: &str, parameter_types: &[String]) -> MethodSignature {
    parameter_types
        .iter()
        .fold(MethodSignature::new(method), |signature, parameter_type| {
            signature.with_parameter(parameter_type.as_str())
        })
}

fn validate_field(name: &str, value: &str) -> Result<(), AppError> {
    if value.contains(KEY_SEPARATOR) {
        return Err(AppError::validation(format!(
            "{name} `{value}` must not contain the key separator `{KEY_SEPARATOR}`"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::cache::{DisplayEncoder, EncoderKind, FixedScope, scope};

    fn repo_find(arguments: &[&str]) -> KeyRequest {
        KeyRequest {
            component_type: "Repo".to_string(),
            component: "c1".to_string(),
            method: "Find".to_string(),
            parameter_types: vec!["Int32".to_string()],
            arguments: arguments.iter().map(|value| value.to_string()).collect(),
        }
    }

    #[test]
    fn full_key_report_lists_ancestors() {
        let inspector = KeyInspector::new(&KeyConfig::default());
        let report = inspector.full_key(&repo_find(&["7"])).expect("valid request");

        assert_eq!(report.key.as_deref(), Some("Repo|c1|Find|Int32|$7"));
        assert_eq!(
            report.ancestors,
            ["Repo", "Repo|c1", "Repo|c1|Find", "Repo|c1|Find|Int32"]
        );
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn text_report_renders_every_ancestor() {
        let inspector = KeyInspector::new(&KeyConfig::default());
        let report = inspector.full_key(&repo_find(&["7"])).expect("valid request");

        assert_snapshot!(report.render_text(), @r"
        key: Repo|c1|Find|Int32|$7
        level: full
        ancestors:
          Repo
          Repo|c1
          Repo|c1|Find
          Repo|c1|Find|Int32
        ");
    }

    #[test]
    fn json_report_skips_empty_diagnostics() {
        let report = KeyReport::for_existing_key("Repo|c1");
        let json = serde_json::to_string(&report).expect("serialize report");

        assert_snapshot!(json, @r#"{"key":"Repo|c1","ancestors":["Repo"]}"#);
    }

    #[test]
    fn string_equal_to_type_name_is_reported() {
        let inspector = KeyInspector::new(&KeyConfig::default());
        let report = inspector
            .full_key(&repo_find(&["alloc::string::String"]))
            .expect("valid request");

        assert!(report.key.is_some());
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].contains("alloc::string::String"));
        assert!(report.render_text().contains("warning: Cache key of type"));
    }

    #[test]
    fn builder_level_scope_is_appended() {
        let inspector = KeyInspector::with_builder(
            KeyBuilder::new(DisplayEncoder).with_scope(FixedScope::new("tenant-a")),
        );
        let report = inspector.full_key(&repo_find(&["7"])).expect("valid request");

        assert_eq!(report.key.as_deref(), Some("Repo|c1|Find|Int32|$7|tenant-a"));
        assert_eq!(report.ancestors.last().map(String::as_str), Some("Repo|c1|Find|Int32|$7"));
    }

    #[tokio::test]
    async fn ambient_scope_overrides_configured_default() {
        let config = KeyConfig {
            scope: Some("configured".to_string()),
            ..Default::default()
        };
        let inspector = KeyInspector::new(&config);
        let request = repo_find(&["7"]);

        let ambient = scope::with_scope("ambient", async { inspector.full_key(&request) })
            .await
            .expect("valid request");
        let fallback = inspector.full_key(&request).expect("valid request");

        assert_eq!(ambient.key.as_deref(), Some("Repo|c1|Find|Int32|$7|ambient"));
        assert_eq!(fallback.key.as_deref(), Some("Repo|c1|Find|Int32|$7|configured"));
    }

    #[test]
    fn debug_encoder_from_config_quotes_arguments() {
        let config = KeyConfig {
            encoder: EncoderKind::Debug,
            ..Default::default()
        };
        let report = KeyInspector::new(&config)
            .full_key(&repo_find(&["7"]))
            .expect("valid request");

        assert_eq!(report.key.as_deref(), Some("Repo|c1|Find|Int32|$\"7\""));
    }

    #[test]
    fn separator_in_input_is_rejected() {
        let inspector = KeyInspector::new(&KeyConfig::default());
        let mut request = repo_find(&["7"]);
        request.method = "Find|All".to_string();

        assert!(matches!(
            inspector.full_key(&request),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn remove_key_picks_deepest_level() {
        let inspector = KeyInspector::new(&KeyConfig::default());

        let type_only = inspector
            .remove_key(&RemoveKeyRequest {
                component_type: "Repo".to_string(),
                ..Default::default()
            })
            .expect("type key");
        assert_eq!(type_only.level, Some(KeyLevel::Type));
        assert_eq!(type_only.key.as_deref(), Some("Repo"));
        assert!(type_only.ancestors.is_empty());

        let component = inspector
            .remove_key(&RemoveKeyRequest {
                component_type: "Repo".to_string(),
                component: Some("c1".to_string()),
                ..Default::default()
            })
            .expect("component key");
        assert_eq!(component.level, Some(KeyLevel::Component));
        assert_eq!(component.key.as_deref(), Some("Repo|c1"));

        let signature = inspector
            .remove_key(&RemoveKeyRequest {
                component_type: "Repo".to_string(),
                component: Some("c1".to_string()),
                method: Some("Find".to_string()),
                parameter_types: vec!["Int32".to_string(), "String".to_string()],
            })
            .expect("signature key");
        assert_eq!(signature.level, Some(KeyLevel::Signature));
        assert_eq!(signature.key.as_deref(), Some("Repo|c1|Find|Int32|String"));
    }

    #[test]
    fn remove_key_rejects_incomplete_paths() {
        let inspector = KeyInspector::new(&KeyConfig::default());

        let method_without_component = inspector.remove_key(&RemoveKeyRequest {
            component_type: "Repo".to_string(),
            method: Some("Find".to_string()),
            ..Default::default()
        });
        assert!(matches!(method_without_component, Err(AppError::Validation(_))));

        let types_without_method = inspector.remove_key(&RemoveKeyRequest {
            component_type: "Repo".to_string(),
            component: Some("c1".to_string()),
            parameter_types: vec!["Int32".to_string()],
            ..Default::default()
        });
        assert!(matches!(types_without_method, Err(AppError::Validation(_))));
    }

    #[test]
    fn existing_key_without_separator_has_no_ancestors() {
        let report = KeyReport::for_existing_key("Repo");
        assert!(report.ancestors.is_empty());
        assert_eq!(report.render_text(), "key: Repo\nancestors: (none)\n");
    }

    #[test]
    fn write_to_emits_json_with_trailing_newline() {
        let report = KeyReport::for_existing_key("Repo|c1");
        let mut out = Vec::new();

        report.write_to(&mut out, true).expect("write report");

        let text = String::from_utf8(out).expect("utf-8 output");
        assert!(text.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(parsed["ancestors"][0], "Repo");
    }
}
