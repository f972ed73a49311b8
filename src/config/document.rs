//! Configuration document data structures
//!
//! A document is one node in the include graph. Raw sections are kept as
//! ordered JSON maps (serde_json with `preserve_order`) because
//! reconciliation order follows document-declared order; typed views are
//! produced on demand by the classification helpers below.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DeclarchError, Result};

/// One node in the configuration include graph.
///
/// Immutable after loading; `children` holds the eagerly loaded documents
/// referenced by `include`, in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    /// Paths of documents whose contents are unioned into this one.
    pub include: Vec<PathBuf>,

    /// Field name -> space-delimited package names. Only fields whose name
    /// starts with `packages` participate in template resolution; other
    /// fields are opaque.
    pub packages: Map<String, Value>,

    /// AUR package lists, a separate namespace from `packages`.
    pub aur: Map<String, Value>,

    /// Package name -> setting name -> setting payload.
    pub configuration: Map<String, Value>,

    /// User name -> property name -> payload.
    pub users: Map<String, Value>,

    /// Where this document was loaded from.
    #[serde(skip)]
    pub path: PathBuf,

    /// Loaded include documents, in `include` order.
    #[serde(skip)]
    pub children: Vec<ConfigDocument>,
}

/// A configuration setting for one managed package, classified by kind.
///
/// Special settings (currently only service enablement) are applied after
/// the per-file copy loop, never during it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    /// Enable a service unit once the package's files are reconciled.
    ServiceEnable(String),
    /// Shell command templates applied to the named file in the reference
    /// tree before drift comparison.
    FileCommands { path: String, commands: Vec<String> },
    /// Environment-style key/value pairs. Carried in the data model for
    /// completeness; has no file counterpart during reconciliation.
    EnvironmentVars(Vec<(String, String)>),
}

impl Setting {
    /// Whether this setting runs as an imperative action after file
    /// reconciliation rather than participating in it.
    pub fn is_special(&self) -> bool {
        matches!(self, Setting::ServiceEnable(_))
    }
}

/// A provisioning property of one declared user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserProperty {
    /// Commands run as the user during provisioning.
    Setup(Vec<String>),
    /// Variables exported from the generated `~/.config/env`.
    Environment(Vec<(String, String)>),
    /// Dotfiles fetched from an upstream repository.
    Dotfiles(UpstreamSpec),
    /// Scripts fetched from an upstream repository.
    Scripts(UpstreamSpec),
    /// Home skeleton fetched from an upstream repository.
    Home(UpstreamSpec),
}

/// Upstream location and target prefix for the dotfiles helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSpec {
    pub upstream: String,
    pub prefix: String,
}

impl ConfigDocument {
    fn parse_error(&self, reason: impl Into<String>) -> DeclarchError {
        DeclarchError::ConfigParseFailed {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// The `packages` or `aur` section as (field name, package list) pairs,
    /// in declaration order. Fails when a field value is not a string.
    pub fn string_fields<'a>(&'a self, section: &'a Map<String, Value>) -> Result<Vec<(&'a str, &'a str)>> {
        section
            .iter()
            .map(|(field, value)| match value.as_str() {
                Some(s) => Ok((field.as_str(), s)),
                None => Err(self.parse_error(format!(
                    "field '{field}' must be a space-delimited string of package names"
                ))),
            })
            .collect()
    }

    /// Classified settings of one configured package, in declaration order.
    pub fn package_settings(&self, package: &str, raw: &Value) -> Result<Vec<(String, Setting)>> {
        let map = raw.as_object().ok_or_else(|| {
            self.parse_error(format!("configuration for package '{package}' must be an object"))
        })?;

        map.iter()
            .map(|(key, value)| Ok((key.clone(), self.classify_setting(package, key, value)?)))
            .collect()
    }

    fn classify_setting(&self, package: &str, key: &str, value: &Value) -> Result<Setting> {
        if key == "service-enable" {
            let service = value.as_str().ok_or_else(|| {
                self.parse_error(format!(
                    "service-enable for package '{package}' must be a service name string"
                ))
            })?;
            return Ok(Setting::ServiceEnable(service.to_string()));
        }

        match value {
            Value::Array(items) => {
                let commands = items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            self.parse_error(format!(
                                "commands for '{key}' in package '{package}' must be strings"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Setting::FileCommands {
                    path: key.to_string(),
                    commands,
                })
            }
            Value::Object(vars) => Ok(Setting::EnvironmentVars(string_pairs(vars).ok_or_else(
                || {
                    self.parse_error(format!(
                        "variables for '{key}' in package '{package}' must map to strings"
                    ))
                },
            )?)),
            _ => Err(self.parse_error(format!(
                "setting '{key}' in package '{package}' must be a command list, \
                 a variable mapping, or a service name"
            ))),
        }
    }

    /// Classified properties of one declared user, in declaration order.
    ///
    /// An unrecognized property name is a fatal [`DeclarchError::InvalidUserProperty`]:
    /// silently skipping it would silently skip intended provisioning.
    pub fn user_properties(&self, user: &str, raw: &Value) -> Result<Vec<UserProperty>> {
        let map = raw
            .as_object()
            .ok_or_else(|| self.parse_error(format!("user '{user}' must be an object")))?;

        map.iter()
            .map(|(property, value)| self.classify_user_property(user, property, value))
            .collect()
    }

    fn classify_user_property(&self, user: &str, property: &str, value: &Value) -> Result<UserProperty> {
        match property {
            "setup" => {
                let commands = value
                    .as_array()
                    .and_then(|items| {
                        items
                            .iter()
                            .map(|i| i.as_str().map(str::to_string))
                            .collect::<Option<Vec<_>>>()
                    })
                    .ok_or_else(|| {
                        self.parse_error(format!(
                            "setup for user '{user}' must be a list of command strings"
                        ))
                    })?;
                Ok(UserProperty::Setup(commands))
            }
            "environment" => {
                let vars = value.as_object().and_then(string_pairs).ok_or_else(|| {
                    self.parse_error(format!(
                        "environment for user '{user}' must map variable names to strings"
                    ))
                })?;
                Ok(UserProperty::Environment(vars))
            }
            "dotfiles" | "scripts" | "home" => {
                let spec = self.upstream_spec(user, property, value)?;
                Ok(match property {
                    "dotfiles" => UserProperty::Dotfiles(spec),
                    "scripts" => UserProperty::Scripts(spec),
                    _ => UserProperty::Home(spec),
                })
            }
            _ => Err(DeclarchError::InvalidUserProperty {
                user: user.to_string(),
                property: property.to_string(),
            }),
        }
    }

    fn upstream_spec(&self, user: &str, property: &str, value: &Value) -> Result<UpstreamSpec> {
        let obj = value.as_object();
        let upstream = obj.and_then(|o| o.get("upstream")).and_then(Value::as_str);
        let prefix = obj.and_then(|o| o.get("prefix")).and_then(Value::as_str);

        match (upstream, prefix) {
            (Some(upstream), Some(prefix)) => Ok(UpstreamSpec {
                upstream: upstream.to_string(),
                prefix: prefix.to_string(),
            }),
            _ => Err(self.parse_error(format!(
                "{property} for user '{user}' must declare 'upstream' and 'prefix' strings"
            ))),
        }
    }

    /// This document followed by all included documents, preorder.
    pub fn documents(&self) -> Vec<&ConfigDocument> {
        let mut docs = vec![self];
        for child in &self.children {
            docs.extend(child.documents());
        }
        docs
    }

    /// The configuration section merged across this document and its
    /// includes, own entries first. Inclusion is pure union: an included
    /// document never overrides a package this document configures itself.
    pub fn merged_configuration(&self) -> Vec<(&ConfigDocument, &str, &Value)> {
        fn section(doc: &ConfigDocument) -> &Map<String, Value> {
            &doc.configuration
        }
        let mut merged: Vec<(&ConfigDocument, &str, &Value)> = Vec::new();
        self.collect_section(section, &mut merged);
        merged
    }

    /// The users section merged across this document and its includes.
    pub fn merged_users(&self) -> Vec<(&ConfigDocument, &str, &Value)> {
        fn section(doc: &ConfigDocument) -> &Map<String, Value> {
            &doc.users
        }
        let mut merged: Vec<(&ConfigDocument, &str, &Value)> = Vec::new();
        self.collect_section(section, &mut merged);
        merged
    }

    fn collect_section<'a>(
        &'a self,
        section: fn(&ConfigDocument) -> &Map<String, Value>,
        merged: &mut Vec<(&'a ConfigDocument, &'a str, &'a Value)>,
    ) {
        for (key, value) in section(self) {
            if !merged.iter().any(|(_, existing, _)| *existing == key.as_str()) {
                merged.push((self, key.as_str(), value));
            }
        }
        for child in &self.children {
            child.collect_section(section, merged);
        }
    }
}

fn string_pairs(map: &Map<String, Value>) -> Option<Vec<(String, String)>> {
    map.iter()
        .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_from_json(json: &str) -> ConfigDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let doc = doc_from_json("{}");
        assert!(doc.include.is_empty());
        assert!(doc.packages.is_empty());
        assert!(doc.aur.is_empty());
        assert!(doc.configuration.is_empty());
        assert!(doc.users.is_empty());
    }

    #[test]
    fn test_string_fields_in_declaration_order() {
        let doc = doc_from_json(
            r#"{"packages": {"packages-base": "curl vim", "packages-extra": "htop"}}"#,
        );
        let fields = doc.string_fields(&doc.packages).unwrap();
        assert_eq!(
            fields,
            vec![("packages-base", "curl vim"), ("packages-extra", "htop")]
        );
    }

    #[test]
    fn test_string_fields_rejects_non_string() {
        let doc = doc_from_json(r#"{"packages": {"packages-base": 42}}"#);
        assert!(doc.string_fields(&doc.packages).is_err());
    }

    #[test]
    fn test_classify_service_enable() {
        let doc = doc_from_json(r#"{"configuration": {"openssh": {"service-enable": "sshd"}}}"#);
        let raw = doc.configuration.get("openssh").unwrap();
        let settings = doc.package_settings("openssh", raw).unwrap();
        assert_eq!(
            settings,
            vec![(
                "service-enable".to_string(),
                Setting::ServiceEnable("sshd".to_string())
            )]
        );
        assert!(settings[0].1.is_special());
    }

    #[test]
    fn test_classify_file_commands() {
        let doc = doc_from_json(
            r#"{"configuration": {"openssh": {"/etc/ssh/sshd_config": ["sed -i s/a/b/"]}}}"#,
        );
        let raw = doc.configuration.get("openssh").unwrap();
        let settings = doc.package_settings("openssh", raw).unwrap();
        match &settings[0].1 {
            Setting::FileCommands { path, commands } => {
                assert_eq!(path, "/etc/ssh/sshd_config");
                assert_eq!(commands, &vec!["sed -i s/a/b/".to_string()]);
                assert!(!settings[0].1.is_special());
            }
            other => panic!("expected FileCommands, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_rejects_service_enable_list() {
        let doc = doc_from_json(r#"{"configuration": {"openssh": {"service-enable": ["sshd"]}}}"#);
        let raw = doc.configuration.get("openssh").unwrap();
        assert!(doc.package_settings("openssh", raw).is_err());
    }

    #[test]
    fn test_unknown_user_property_is_fatal() {
        let doc = doc_from_json(r#"{"users": {"alice": {"wallpaper": "sunset.png"}}}"#);
        let raw = doc.users.get("alice").unwrap();
        let err = doc.user_properties("alice", raw).unwrap_err();
        assert!(matches!(
            err,
            DeclarchError::InvalidUserProperty { ref user, ref property }
                if user == "alice" && property == "wallpaper"
        ));
    }

    #[test]
    fn test_user_properties_classified() {
        let doc = doc_from_json(
            r#"{"users": {"alice": {
                "setup": ["mkdir -p ~/src"],
                "environment": {"EDITOR": "vim"},
                "dotfiles": {"upstream": "https://example.com/dotfiles.git", "prefix": "."}
            }}}"#,
        );
        let raw = doc.users.get("alice").unwrap();
        let props = doc.user_properties("alice", raw).unwrap();
        assert_eq!(props.len(), 3);
        assert_eq!(props[0], UserProperty::Setup(vec!["mkdir -p ~/src".to_string()]));
        assert_eq!(
            props[1],
            UserProperty::Environment(vec![("EDITOR".to_string(), "vim".to_string())])
        );
    }

    #[test]
    fn test_merged_configuration_own_wins() {
        let mut parent = doc_from_json(r#"{"configuration": {"openssh": {"service-enable": "sshd"}}}"#);
        let child = doc_from_json(
            r#"{"configuration": {"openssh": {"service-enable": "other"}, "nginx": {"service-enable": "nginx"}}}"#,
        );
        parent.children.push(child);

        let merged = parent.merged_configuration();
        let names: Vec<&str> = merged.iter().map(|(_, name, _)| *name).collect();
        assert_eq!(names, vec!["openssh", "nginx"]);

        // openssh resolves to the parent's declaration
        let (_, _, value) = merged[0];
        assert_eq!(value.get("service-enable").unwrap(), "sshd");
    }
}
