//! MathML renderer.
//!
//! Unlike KaTeX this renderer carries state across a document: registered
//! equation labels, the automatic equation counter, and which style rules
//! the rendered output needs. Call [`MathRenderer::output_style`] after a
//! document to collect the stylesheet and [`MathRenderer::reset`] before the
//! next one.

use super::labels::{annotate, EquationTag};
use super::{error_block, error_inline, escape_html, MathRenderer};
use crate::config::{EquationTags, MathmlOptions};
use crate::error::Result;
use latex2mathml::{latex_to_mathml, DisplayStyle};
use std::collections::HashSet;

/// Renderer that converts TeX to MathML.
pub struct MathmlRenderer {
    options: MathmlOptions,
    labels: HashSet<String>,
    equation_number: u32,
    styles: StyleUsage,
}

/// Which style rules the output rendered so far depends on.
#[derive(Debug, Default, Clone, Copy)]
struct StyleUsage {
    inline: bool,
    display: bool,
    tag: bool,
    error: bool,
}

impl StyleUsage {
    fn is_empty(&self) -> bool {
        !(self.inline || self.display || self.tag || self.error)
    }
}

impl MathmlRenderer {
    /// Create a new MathML renderer.
    pub fn new(options: &MathmlOptions) -> Self {
        tracing::debug!(a11y = options.a11y, tags = ?options.tags, "mathml renderer ready");
        Self {
            options: options.clone(),
            labels: HashSet::new(),
            equation_number: 0,
            styles: StyleUsage::default(),
        }
    }

    fn v_pre(&self) -> &'static str {
        if self.options.v_pre {
            " v-pre"
        } else {
            ""
        }
    }

    /// Add `alttext` to the root `<math>` element when a11y is on.
    fn finish_math(&self, mathml: String, tex: &str) -> String {
        if !self.options.a11y {
            return mathml;
        }
        match mathml.strip_prefix("<math") {
            Some(rest) => format!("<math alttext=\"{}\"{}", escape_html(tex.trim()), rest),
            None => mathml,
        }
    }

    fn inline_error(&mut self, tex: &str, message: &str) -> String {
        tracing::warn!(%message, "mathml conversion error in inline math");
        self.styles.error = true;
        error_inline("mathml-error", tex, message)
    }

    fn display_error(&mut self, tex: &str, message: &str) -> String {
        tracing::warn!(%message, "mathml conversion error in display math");
        self.styles.error = true;
        error_block("mathml-block mathml-error", tex, message)
    }

    /// Number for an untagged equation, if numbering is on.
    fn next_number(&mut self) -> Option<String> {
        match self.options.tags {
            EquationTags::None => None,
            EquationTags::All => {
                self.equation_number += 1;
                Some(self.equation_number.to_string())
            }
        }
    }
}

impl Default for MathmlRenderer {
    fn default() -> Self {
        Self::new(&MathmlOptions::default())
    }
}

impl MathRenderer for MathmlRenderer {
    fn render_inline(&mut self, tex: &str) -> Result<String> {
        match convert(tex, DisplayStyle::Inline) {
            Ok(mathml) => {
                self.styles.inline = true;
                Ok(format!(
                    "<span class=\"mathml-container\"{}>{}</span>",
                    self.v_pre(),
                    self.finish_math(mathml, tex)
                ))
            }
            Err(message) => Ok(self.inline_error(tex, &message)),
        }
    }

    fn render_display(&mut self, tex: &str) -> Result<String> {
        let annotated = annotate(tex);

        let mut seen = HashSet::new();
        for label in &annotated.labels {
            if self.labels.contains(*label) || !seen.insert(*label) {
                let message = format!("Label '{}' multiply defined", label);
                return Ok(self.display_error(tex, &message));
            }
        }

        let mathml = match convert(&annotated.body, DisplayStyle::Block) {
            Ok(mathml) => mathml,
            Err(message) => return Ok(self.display_error(tex, &message)),
        };

        self.labels
            .extend(annotated.labels.iter().map(|label| label.to_string()));

        let tag = match annotated.tag {
            Some(EquationTag { text, starred: true }) => Some(escape_html(text)),
            Some(EquationTag { text, starred: false }) => Some(format!("({})", escape_html(text))),
            None => self.next_number().map(|n| format!("({})", n)),
        };
        let tag_html = match tag {
            Some(text) => {
                self.styles.tag = true;
                format!("<span class=\"mathml-tag\">{}</span>", text)
            }
            None => String::new(),
        };

        self.styles.display = true;
        Ok(format!(
            "<div class=\"mathml-container\" display=\"true\"{}>{}{}</div>\n",
            self.v_pre(),
            self.finish_math(mathml, &annotated.body),
            tag_html
        ))
    }

    fn output_style(&mut self) -> String {
        let used = self.styles;
        self.clear_style();

        if used.is_empty() {
            return String::new();
        }

        let mut css = String::from(BASE_STYLE);
        if used.inline {
            css.push_str(INLINE_STYLE);
        }
        if used.display {
            css.push_str(DISPLAY_STYLE);
        }
        if used.tag {
            css.push_str(TAG_STYLE);
        }
        if used.error {
            css.push_str(ERROR_STYLE);
        }
        css
    }

    fn clear_style(&mut self) {
        self.styles = StyleUsage::default();
    }

    fn reset(&mut self) {
        self.labels.clear();
        self.equation_number = 0;
    }
}

/// Convert to MathML, treating an embedded `[PARSE ERROR: ...]` as a failure.
///
/// `latex2mathml` recovers from some syntax errors by emitting the message
/// as `<mtext>` inside otherwise valid output.
fn convert(tex: &str, style: DisplayStyle) -> std::result::Result<String, String> {
    let mathml = latex_to_mathml(tex, style).map_err(|e| e.to_string())?;
    match mathml.find(PARSE_ERROR_MARKER) {
        Some(start) => {
            let message = &mathml[start + 1..];
            let end = message.find(']').unwrap_or(message.len());
            Err(message[..end].to_string())
        }
        None => Ok(mathml),
    }
}

const PARSE_ERROR_MARKER: &str = "[PARSE ERROR";

const BASE_STYLE: &str = "math {\n  font-size: 1.1em;\n}\n";

const INLINE_STYLE: &str = ".mathml-container {\n  display: inline-block;\n}\n";

const DISPLAY_STYLE: &str = ".mathml-container[display=\"true\"] {\n  display: flex;\n  justify-content: center;\n  align-items: center;\n  margin: 1em 0;\n  position: relative;\n}\n";

const TAG_STYLE: &str = ".mathml-tag {\n  position: absolute;\n  right: 0;\n}\n";

const ERROR_STYLE: &str = ".mathml-error {\n  color: red;\n  font-family: monospace;\n}\n";
