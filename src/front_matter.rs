//! Per-document option overrides from TOML front matter.
//!
//! ```text
//! +++
//! [math]
//! math_fence = true
//! +++
//! ```

use crate::error::{ConfigError, Result};

/// Split `+++`-delimited TOML front matter from the document body.
///
/// Returns the parsed table (if any) and the remaining content.
pub fn split_front_matter(input: &str) -> Result<(Option<toml::Table>, &str)> {
    let trimmed = input.trim_start();

    if !trimmed.starts_with("+++") {
        return Ok((None, input));
    }

    let after_open = &trimmed[3..];
    let close_pos = after_open.find("\n+++").ok_or_else(|| {
        ConfigError::FrontMatter("Unclosed front matter (missing closing +++)".into())
    })?;

    let front_matter_str = &after_open[..close_pos];
    let content_start = 3 + close_pos + 4; // "+++" + content + "\n+++"
    let content = trimmed[content_start..].trim_start_matches(['\r', '\n']);

    let table: toml::Table = toml::from_str(front_matter_str)
        .map_err(|e| ConfigError::FrontMatter(format!("Invalid TOML: {}", e)))?;

    Ok((Some(table), content))
}

/// Extract the `[math]` table from parsed front matter.
pub fn math_overrides(front_matter: &toml::Table) -> Result<Option<&toml::Table>> {
    match front_matter.get("math") {
        None => Ok(None),
        Some(toml::Value::Table(table)) => Ok(Some(table)),
        Some(_) => Err(ConfigError::FrontMatter("`math` must be a table".into()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_front_matter() {
        let input = "# Hello\n\nSome $x$ text.";
        let (table, content) = split_front_matter(input).unwrap();
        assert!(table.is_none());
        assert_eq!(content, input);
    }

    #[test]
    fn test_with_front_matter() {
        let input = r#"+++
title = "Notes"

[math]
math_fence = true
+++

# Hello"#;

        let (table, content) = split_front_matter(input).unwrap();
        let table = table.unwrap();
        assert_eq!(table.get("title").and_then(|v| v.as_str()), Some("Notes"));

        let math = math_overrides(&table).unwrap().unwrap();
        assert_eq!(math.get("math_fence").and_then(|v| v.as_bool()), Some(true));
        assert!(content.starts_with("# Hello"));
    }

    #[test]
    fn test_unclosed_front_matter() {
        let err = split_front_matter("+++\nmath_fence = true\n# Body").unwrap_err();
        assert!(err.to_string().contains("Unclosed front matter"));
    }

    #[test]
    fn test_math_must_be_table() {
        let (table, _) = split_front_matter("+++\nmath = 1\n+++\nbody").unwrap();
        assert!(math_overrides(&table.unwrap()).is_err());
    }
}
