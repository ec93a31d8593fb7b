//! KaTeX renderer.

use super::{error_block, error_inline, MathRenderer};
use crate::config::{KatexOptions, KatexOutput};
use crate::error::{RenderError, Result};
use katex::{Opts, OutputType};

/// Renderer that typesets math with KaTeX.
pub struct KatexRenderer {
    inline_opts: Opts,
    display_opts: Opts,
}

impl KatexRenderer {
    /// Create a renderer, probing the embedded JS engine once.
    ///
    /// Returns `Ok(None)` if the engine cannot be initialised.
    pub fn new(options: &KatexOptions) -> Result<Option<Self>> {
        let renderer = Self {
            inline_opts: build_opts(options, false)?,
            display_opts: build_opts(options, true)?,
        };

        match katex::render_with_opts("x", &renderer.inline_opts) {
            Ok(_) => {}
            Err(katex::Error::JsInitError(message)) => {
                tracing::error!(%message, "katex engine could not be initialised");
                return Ok(None);
            }
            Err(e) => return Err(RenderError::Engine(e.to_string()).into()),
        }

        tracing::debug!(
            macros = options.macros.len(),
            throw_on_error = options.throw_on_error,
            "katex renderer ready"
        );
        Ok(Some(renderer))
    }
}

impl MathRenderer for KatexRenderer {
    fn render_inline(&mut self, tex: &str) -> Result<String> {
        match katex::render_with_opts(tex, &self.inline_opts) {
            Ok(html) => Ok(html),
            Err(e) => {
                let message = parse_error(e)?;
                tracing::warn!(%message, "katex parse error in inline math");
                Ok(error_inline("katex-error", tex, &message))
            }
        }
    }

    fn render_display(&mut self, tex: &str) -> Result<String> {
        match katex::render_with_opts(tex, &self.display_opts) {
            Ok(html) => Ok(format!("<p class='katex-block'>{}</p>\n", html)),
            Err(e) => {
                let message = parse_error(e)?;
                tracing::warn!(%message, "katex parse error in display math");
                Ok(error_block("katex-block katex-error", tex, &message))
            }
        }
    }

    fn head_content(&self) -> Option<String> {
        Some(KATEX_HEAD.to_string())
    }
}

/// Split KaTeX's own `ParseError` from every other engine failure.
///
/// The embedded engine reports a thrown JS exception as the debug form of
/// its value, so a parse error is an execution error whose message names
/// `ParseError`. The returned message is the exception's plain text.
fn parse_error(error: katex::Error) -> Result<String> {
    match error {
        katex::Error::JsExecError(message) if message.contains("ParseError") => {
            Ok(exception_text(&message))
        }
        other => Err(RenderError::Engine(other.to_string()).into()),
    }
}

/// Undo the `String("...")` debug wrapper around a JS exception value.
fn exception_text(message: &str) -> String {
    let Some(quoted) = message
        .strip_prefix("String(\"")
        .and_then(|rest| rest.strip_suffix("\")"))
    else {
        return message.to_string();
    };

    let mut text = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('r') => text.push('\r'),
            Some('t') => text.push('\t'),
            Some('0') => text.push('\0'),
            Some('u') => {
                // \u{XXXX}
                let code: String = chars
                    .by_ref()
                    .skip_while(|c| *c == '{')
                    .take_while(|c| *c != '}')
                    .collect();
                let decoded = u32::from_str_radix(&code, 16)
                    .ok()
                    .and_then(char::from_u32);
                if let Some(decoded) = decoded {
                    text.push(decoded);
                }
            }
            Some(other) => text.push(other),
            None => text.push('\\'),
        }
    }
    text
}

fn build_opts(options: &KatexOptions, display_mode: bool) -> Result<Opts> {
    let mut builder = Opts::builder();
    builder
        .display_mode(display_mode)
        .output_type(match options.output {
            KatexOutput::Html => OutputType::Html,
            KatexOutput::Mathml => OutputType::Mathml,
            KatexOutput::HtmlAndMathml => OutputType::HtmlAndMathml,
        })
        .throw_on_error(options.throw_on_error)
        .leqno(options.leqno)
        .fleqn(options.fleqn)
        .trust(options.trust);

    if let Some(ref color) = options.error_color {
        builder.error_color(color.clone());
    }
    if let Some(thickness) = options.min_rule_thickness {
        builder.min_rule_thickness(thickness);
    }
    for (name, expansion) in &options.macros {
        builder = builder.add_macro(name.clone(), expansion.clone());
    }

    builder
        .build()
        .map_err(|e| RenderError::Options(e.to_string()).into())
}

const KATEX_HEAD: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css" crossorigin="anonymous">"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(throw_on_error: bool) -> KatexRenderer {
        let options = KatexOptions {
            throw_on_error,
            ..KatexOptions::default()
        };
        KatexRenderer::new(&options).unwrap().unwrap()
    }

    #[test]
    fn test_inline_math() {
        let result = renderer(false).render_inline("E = mc^2").unwrap();
        assert!(result.contains("class=\"katex\""));
        assert!(!result.contains("katex-block"));
    }

    #[test]
    fn test_display_math() {
        let result = renderer(false).render_display("\\int_0^1 x dx").unwrap();
        assert!(result.starts_with("<p class='katex-block'>"));
        assert!(result.contains("katex-display"));
        assert!(result.ends_with("</p>\n"));
    }

    #[test]
    fn test_inline_parse_error() {
        let result = renderer(true).render_inline("\\frac{a}{").unwrap();
        assert!(result.starts_with("<span class='katex-error' title='"));
        assert!(result.contains("ParseError"));
        assert!(result.ends_with(">\\frac{a}{</span>"));
    }

    #[test]
    fn test_display_parse_error_escapes_source() {
        let result = renderer(true).render_display("a < \\frac{").unwrap();
        assert!(result.starts_with("<p class='katex-block katex-error' title='"));
        assert!(result.contains("a &lt; \\frac{"));
    }

    #[test]
    fn test_errors_rendered_by_katex_when_not_thrown() {
        let result = renderer(false).render_inline("\\frac{a}{").unwrap();
        assert!(!result.contains("katex-error' title"));
    }

    #[test]
    fn test_macros() {
        let mut options = KatexOptions::default();
        options.macros.insert("\\RR".into(), "\\mathbb{R}".into());
        options.throw_on_error = true;
        let mut renderer = KatexRenderer::new(&options).unwrap().unwrap();
        let result = renderer.render_inline("x \\in \\RR").unwrap();
        assert!(!result.contains("katex-error"));
    }

    #[test]
    fn test_parse_error_title_is_plain_text() {
        let result = renderer(true).render_inline("\\undefinedcmd").unwrap();
        assert!(result.starts_with(
            "<span class='katex-error' title='ParseError: KaTeX parse error: Undefined control sequence: \\undefinedcmd"
        ));
        assert!(!result.contains("String("));
        assert!(!result.contains("\\u{"));
        assert!(!result.contains("\\\\"));
    }

    #[test]
    fn test_exception_text() {
        assert_eq!(
            exception_text(r#"String("ParseError: at \\frac{1}{ \"x\" \u{332}a")"#),
            "ParseError: at \\frac{1}{ \"x\" \u{332}a"
        );
        assert_eq!(exception_text("ParseError: raw"), "ParseError: raw");
    }

    #[test]
    fn test_other_engine_errors_propagate() {
        let err = katex::Error::JsExecError("String(\"TypeError: undefined\")".into());
        assert!(parse_error(err).is_err());
    }

    #[test]
    fn test_head_content_links_stylesheet() {
        let head = renderer(false).head_content().unwrap();
        assert!(head.starts_with("<link rel=\"stylesheet\""));
        assert!(head.contains("katex.min.css"));
    }
}
