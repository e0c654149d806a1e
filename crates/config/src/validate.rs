//! Configuration validation engine.
//!
//! Checks a config file against the known schema, flags unknown or
//! misspelled fields, and reports suspicious override values (blank models,
//! model ids without a provider, non-numeric Telegram chat keys).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    env_subst::substitute_env,
    loader::parse_config,
    schema::{GroupConfig, MoltisConfig, ScopeOverrides},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "unknown-provider", "type-error",
    /// "empty-value", "model-format", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "channels.telegram.accounts.default.model"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration schema.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// A map with dynamic keys (channel names, account ids, chat ids) whose
    /// values have a known shape.
    Map(Box<KnownKeys>),
    /// Scalar value, stop recursion.
    Leaf,
}

/// Keys every override scope accepts.
const OVERRIDE_KEYS: &[&str] = &["model", "model_provider", "system_prompt"];

/// Provider prefixes recognised in `provider/model` ids.
const KNOWN_PROVIDER_NAMES: &[&str] = &[
    "anthropic",
    "openai",
    "google",
    "gemini",
    "groq",
    "xai",
    "deepseek",
    "mistral",
    "openrouter",
    "cerebras",
    "minimax",
    "moonshot",
    "venice",
    "ollama",
];

/// Channels whose group and topic keys are numeric chat/thread ids.
const NUMERIC_GROUP_CHANNELS: &[&str] = &["telegram"];

fn scope_fields() -> HashMap<&'static str, KnownKeys> {
    OVERRIDE_KEYS.iter().map(|k| (*k, KnownKeys::Leaf)).collect()
}

/// `groups.<chat>` with its nested `topics.<thread>`.
fn groups_schema() -> KnownKeys {
    let mut group = scope_fields();
    group.insert("topics", KnownKeys::Map(Box::new(KnownKeys::Struct(scope_fields()))));
    KnownKeys::Map(Box::new(KnownKeys::Struct(group)))
}

/// Build the schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Map, Struct};

    let mut account = scope_fields();
    account.insert("token", Leaf);
    account.insert("groups", groups_schema());

    let mut channel = scope_fields();
    channel.insert("groups", groups_schema());
    channel.insert("accounts", Map(Box::new(Struct(account))));

    let mut defaults = scope_fields();
    defaults.insert("id", Leaf);

    Struct(HashMap::from([
        (
            "agents",
            Struct(HashMap::from([("defaults", Struct(defaults))])),
        ),
        ("channels", Map(Box::new(Struct(channel)))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Find the best match for `needle` among `candidates`. Returns `Some(best)`
/// if the edit distance is <= `max_distance`.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    match std::fs::read_to_string(&actual_path) {
        Ok(content) => validate_str(&content, &actual_path),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path),
        },
    }
}

/// Validate raw config text. The format is picked from `path`'s extension;
/// nothing is read from disk.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let raw = substitute_env(raw);
    let mut diagnostics = Vec::new();

    let config = match parse_config(&raw, path) {
        Ok(config) => config,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: e.to_string(),
            });
            return ValidationResult {
                diagnostics,
                config_path: Some(path.to_path_buf()),
            };
        },
    };

    if let Some(tree) = parse_tree(&raw, path) {
        check_unknown_fields(&tree, &build_schema_map(), "", &mut diagnostics);
    }
    check_scopes(&config, &mut diagnostics);

    ValidationResult {
        diagnostics,
        config_path: Some(path.to_path_buf()),
    }
}

/// Format-independent view of the raw document, used for key checks that
/// the typed schema silently drops.
fn parse_tree(raw: &str, path: &Path) -> Option<serde_json::Value> {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("toml") {
        "toml" => toml::from_str(raw).ok(),
        "yaml" | "yml" => serde_yaml::from_str(raw).ok(),
        "json" => serde_json::from_str(raw).ok(),
        _ => None,
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let serde_json::Value::Object(table) = value else {
        // Leaf or type mismatch; the typed parse already reported it.
        return;
    };
    match schema {
        KnownKeys::Struct(fields) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = join(prefix, key);
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                    continue;
                }
                let level = if prefix.is_empty() {
                    "at top level "
                } else {
                    ""
                };
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field {level}(did you mean \"{s}\"?)"),
                    None => format!("unknown field {level}"),
                };
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "unknown-field",
                    path,
                    message: message.trim().to_string(),
                });
            }
        },
        KnownKeys::Map(value_schema) => {
            for (key, child_value) in table {
                check_unknown_fields(child_value, value_schema, &join(prefix, key), diagnostics);
            }
        },
        KnownKeys::Leaf => {},
    }
}

/// Walk every override scope in the typed config.
fn check_scopes(config: &MoltisConfig, diagnostics: &mut Vec<Diagnostic>) {
    check_overrides(&config.agents.defaults.overrides, "agents.defaults", diagnostics);

    let mut channels: Vec<_> = config.channels.iter().collect();
    channels.sort_by(|a, b| a.0.cmp(b.0));
    for (name, channel) in channels {
        let prefix = format!("channels.{name}");
        let numeric = NUMERIC_GROUP_CHANNELS.contains(&name.to_ascii_lowercase().as_str());
        check_overrides(&channel.overrides, &prefix, diagnostics);
        check_groups(&channel.groups, &format!("{prefix}.groups"), numeric, diagnostics);

        let mut accounts: Vec<_> = channel.accounts.iter().collect();
        accounts.sort_by(|a, b| a.0.cmp(b.0));
        for (account_id, account) in accounts {
            let prefix = format!("{prefix}.accounts.{account_id}");
            check_overrides(&account.overrides, &prefix, diagnostics);
            check_groups(&account.groups, &format!("{prefix}.groups"), numeric, diagnostics);
        }
    }
}

fn check_groups(
    groups: &HashMap<String, GroupConfig>,
    prefix: &str,
    numeric: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut groups: Vec<_> = groups.iter().collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));
    for (chat_id, group) in groups {
        let path = join(prefix, chat_id);
        if numeric && chat_id.trim().parse::<i64>().is_err() {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "type-error",
                path: path.clone(),
                message: format!("group key \"{chat_id}\" is not a numeric chat id"),
            });
        }
        check_overrides(&group.overrides, &path, diagnostics);

        let mut topics: Vec<_> = group.topics.iter().collect();
        topics.sort_by(|a, b| a.0.cmp(b.0));
        for (topic_id, overrides) in topics {
            let path = format!("{path}.topics.{topic_id}");
            if numeric && topic_id.trim().parse::<i64>().is_err() {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "type-error",
                    path: path.clone(),
                    message: format!("topic key \"{topic_id}\" is not a numeric thread id"),
                });
            }
            check_overrides(overrides, &path, diagnostics);
        }
    }
}

fn check_overrides(overrides: &ScopeOverrides, prefix: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Some(model) = overrides.model.as_deref() else {
        return;
    };
    let path = join(prefix, "model");
    let model = model.trim();
    if model.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "empty-value",
            path,
            message: "model is blank and will be ignored".into(),
        });
        return;
    }
    let Some((provider, _)) = model.split_once('/') else {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "model-format",
            path,
            message: format!("model id \"{model}\" should be provider/model"),
        });
        return;
    };
    if !KNOWN_PROVIDER_NAMES.contains(&provider) {
        let message = match suggest(provider, KNOWN_PROVIDER_NAMES, 3) {
            Some(s) => format!("unknown provider \"{provider}\" (did you mean \"{s}\"?)"),
            None => format!("unknown provider \"{provider}\""),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "unknown-provider",
            path,
            message,
        });
    }
}
