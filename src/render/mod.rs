//! Math rendering backends.

#[cfg(feature = "katex")]
mod katex;
#[cfg(feature = "mathml")]
mod labels;
#[cfg(feature = "mathml")]
mod mathml;

#[cfg(feature = "katex")]
pub use self::katex::KatexRenderer;
#[cfg(feature = "mathml")]
pub use self::mathml::MathmlRenderer;

use crate::config::{Backend, MathConfig};
use crate::error::Result;

/// Trait for math renderers.
///
/// Renderers catch the syntax errors their engine reports and return error
/// markup instead; an `Err` means the engine itself failed.
pub trait MathRenderer {
    /// Render inline math.
    fn render_inline(&mut self, tex: &str) -> Result<String>;

    /// Render block-level display math.
    fn render_display(&mut self, tex: &str) -> Result<String>;

    /// Get any required HTML head content (stylesheets).
    fn head_content(&self) -> Option<String> {
        None
    }

    /// Stylesheet for everything rendered since the last call. Clears the cache.
    fn output_style(&mut self) -> String {
        String::new()
    }

    /// Drop the accumulated stylesheet.
    fn clear_style(&mut self) {}

    /// Forget labels and equation numbers.
    fn reset(&mut self) {}
}

/// Create a math renderer for the configured backend.
///
/// Returns `Ok(None)` when the backend is not available in this build or its
/// engine cannot start. The condition is logged once here; callers are
/// expected to skip math rendering for the whole document.
pub fn create_renderer(config: &MathConfig) -> Result<Option<Box<dyn MathRenderer>>> {
    match config.backend {
        Backend::Katex => create_katex(config),
        Backend::Mathml => create_mathml(config),
    }
}

#[cfg(feature = "katex")]
fn create_katex(config: &MathConfig) -> Result<Option<Box<dyn MathRenderer>>> {
    Ok(KatexRenderer::new(&config.katex)?.map(|r| Box::new(r) as Box<dyn MathRenderer>))
}

#[cfg(not(feature = "katex"))]
fn create_katex(_config: &MathConfig) -> Result<Option<Box<dyn MathRenderer>>> {
    not_installed(Backend::Katex)
}

#[cfg(feature = "mathml")]
fn create_mathml(config: &MathConfig) -> Result<Option<Box<dyn MathRenderer>>> {
    Ok(Some(Box::new(MathmlRenderer::new(&config.mathml))))
}

#[cfg(not(feature = "mathml"))]
fn create_mathml(_config: &MathConfig) -> Result<Option<Box<dyn MathRenderer>>> {
    not_installed(Backend::Mathml)
}

#[cfg(any(not(feature = "katex"), not(feature = "mathml")))]
fn not_installed(backend: Backend) -> Result<Option<Box<dyn MathRenderer>>> {
    tracing::error!(
        backend = backend.name(),
        "math backend not installed, enable the `{}` feature",
        backend.name()
    );
    Ok(None)
}

/// Escape text for HTML content and single- or double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inline error markup: the escaped source, with the message as tooltip.
pub(crate) fn error_inline(class: &str, tex: &str, message: &str) -> String {
    format!(
        "<span class='{}' title='{}'>{}</span>",
        class,
        escape_html(message),
        escape_html(tex)
    )
}

/// Block error markup.
pub(crate) fn error_block(class: &str, tex: &str, message: &str) -> String {
    format!(
        "<p class='{}' title='{}'>{}</p>\n",
        class,
        escape_html(message),
        escape_html(tex)
    )
}
