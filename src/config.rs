//! Plugin options and their normalization.
//!
//! Options are plain serde structs. Every field has a default, so a caller
//! only spells out what differs, and [`MathConfig::merged_with`] layers a
//! partial TOML table (for example a document's front matter) over an
//! existing configuration.
//!
//! ```toml
//! backend = "katex"
//! math_fence = true
//!
//! [katex]
//! throw_on_error = true
//!
//! [katex.macros]
//! "\\RR" = "\\mathbb{R}"
//!
//! [mathml]
//! tags = "all"
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Which external typesetting engine renders the math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// KaTeX, executed in an embedded JS engine.
    #[default]
    Katex,
    /// Native MathML via `latex2mathml`.
    Mathml,
}

impl Backend {
    /// Name used in log messages and cargo features.
    pub fn name(self) -> &'static str {
        match self {
            Backend::Katex => "katex",
            Backend::Mathml => "mathml",
        }
    }
}

/// Top-level plugin configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MathConfig {
    /// Rendering backend.
    pub backend: Backend,
    /// Accept `$ x $` (content padded with whitespace) as inline math.
    pub allow_inline_with_space: bool,
    /// Treat ```` ```math ```` fences as display math.
    pub math_fence: bool,
    /// Options forwarded to KaTeX.
    pub katex: KatexOptions,
    /// Options for the MathML backend.
    pub mathml: MathmlOptions,
}

/// What KaTeX emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KatexOutput {
    Html,
    Mathml,
    #[default]
    HtmlAndMathml,
}

/// User options passed through to KaTeX.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KatexOptions {
    pub output: KatexOutput,
    /// When false, KaTeX renders invalid input itself in `error_color`.
    /// When true, parse errors surface and become `katex-error` markup.
    pub throw_on_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_color: Option<String>,
    /// Render `\tag`s on the left.
    pub leqno: bool,
    /// Flush display math left.
    pub fleqn: bool,
    /// Allow `\url`, `\href` and friends.
    pub trust: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rule_thickness: Option<f64>,
    /// Macro name (with backslash) to expansion.
    pub macros: HashMap<String, String>,
}

impl Default for KatexOptions {
    fn default() -> Self {
        Self {
            output: KatexOutput::default(),
            throw_on_error: false,
            error_color: None,
            leqno: false,
            fleqn: false,
            trust: false,
            min_rule_thickness: None,
            macros: HashMap::new(),
        }
    }
}

/// Equation numbering policy for the MathML backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationTags {
    /// Only explicit `\tag{...}` produces a number.
    #[default]
    None,
    /// Every display equation without an explicit tag is numbered.
    All,
}

/// Options for the MathML backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathmlOptions {
    /// Attach the TeX source as `alttext` for assistive technology.
    pub a11y: bool,
    /// Add a `v-pre` attribute so Vue templates leave the output alone.
    pub v_pre: bool,
    pub tags: EquationTags,
}

impl Default for MathmlOptions {
    fn default() -> Self {
        Self {
            a11y: true,
            v_pre: false,
            tags: EquationTags::None,
        }
    }
}

impl MathConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| ConfigError::Toml(e.to_string()).into())
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Return a copy of this configuration with `overrides` merged on top.
    ///
    /// Keys present in `overrides` win; nested tables merge key by key, so
    /// `{ katex = { macros = { "\\R" = "..." } } }` adds a macro without
    /// dropping the rest of the KaTeX options.
    pub fn merged_with(&self, overrides: &toml::Table) -> Result<Self> {
        let mut base = match toml::Value::try_from(self) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => return Err(ConfigError::Options("configuration is not a table".into()).into()),
            Err(e) => return Err(ConfigError::Options(e.to_string()).into()),
        };

        merge_tables(&mut base, overrides);

        toml::Value::Table(base)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Options(e.to_string()).into())
    }
}

fn merge_tables(base: &mut toml::Table, overrides: &toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = MathConfig::default();
        assert_eq!(config.backend, Backend::Katex);
        assert!(!config.allow_inline_with_space);
        assert!(!config.math_fence);
        assert!(!config.katex.throw_on_error);
        assert!(config.mathml.a11y);
        assert_eq!(config.mathml.tags, EquationTags::None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = MathConfig::from_toml_str("").unwrap();
        assert_eq!(config, MathConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = MathConfig::from_toml_str(
            r#"
backend = "mathml"
math_fence = true

[katex.macros]
"\\RR" = "\\mathbb{R}"

[mathml]
tags = "all"
"#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Mathml);
        assert!(config.math_fence);
        assert_eq!(config.katex.macros.get("\\RR").unwrap(), "\\mathbb{R}");
        assert_eq!(config.katex.output, KatexOutput::HtmlAndMathml);
        assert_eq!(config.mathml.tags, EquationTags::All);
        assert!(config.mathml.a11y);
    }

    #[test]
    fn test_unknown_backend() {
        let err = MathConfig::from_toml_str("backend = \"mathjax\"").unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_merge_keeps_unrelated_keys() {
        let mut base = MathConfig::default();
        base.katex.throw_on_error = true;
        base.katex.macros.insert("\\N".into(), "\\mathbb{N}".into());

        let overrides: toml::Table = toml::from_str(
            r#"
allow_inline_with_space = true

[katex.macros]
"\\Z" = "\\mathbb{Z}"
"#,
        )
        .unwrap();

        let merged = base.merged_with(&overrides).unwrap();
        assert!(merged.allow_inline_with_space);
        assert!(merged.katex.throw_on_error);
        assert_eq!(merged.katex.macros.len(), 2);
        assert_eq!(merged.katex.macros.get("\\Z").unwrap(), "\\mathbb{Z}");
    }

    #[test]
    fn test_merge_rejects_bad_values() {
        let overrides: toml::Table = toml::from_str("math_fence = \"yes\"").unwrap();
        assert!(MathConfig::default().merged_with(&overrides).is_err());
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend = \"mathml\"\n\n[mathml]\ntags = \"all\"").unwrap();

        let config = MathConfig::from_file(file.path()).unwrap();
        assert_eq!(config.backend, Backend::Mathml);
        assert_eq!(config.mathml.tags, EquationTags::All);
        assert!(config.mathml.a11y);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MathConfig::from_file(dir.path().join("math.toml")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
