//! # markdown-math
//!
//! Math rendering extensions for [`pulldown-cmark`](pulldown_cmark). Math
//! spans and fences recognized by the parser are handed to an external
//! typesetting engine, and the result is spliced into the HTML output.
//!
//! ## Quick Start
//!
//! ```rust
//! use markdown_math::{render_markdown, Backend, MathConfig, MathPlugin};
//!
//! let config = MathConfig {
//!     backend: Backend::Mathml,
//!     ..MathConfig::default()
//! };
//!
//! // `None` means the backend is not compiled in; math stays as source.
//! let mut plugin = MathPlugin::new(config).unwrap();
//! let html = render_markdown("Euler: $e^{i\\pi} + 1 = 0$", plugin.as_mut()).unwrap();
//! println!("{}", html);
//! ```
//!
//! Or wire the plugin into your own pipeline:
//!
//! ```rust,ignore
//! let parser = Parser::new_ext(input, plugin.parser_options(Options::empty()));
//! let events = plugin.events(parser).collect::<Result<Vec<_>, _>>()?;
//! pulldown_cmark::html::push_html(&mut out, events.into_iter());
//! ```
//!
//! ## Syntax
//!
//! - Inline: `$E = mc^2$` (`$ x $` only with `allow_inline_with_space`)
//! - Display: `$$\int_0^1 x dx$$`
//! - Fence, with `math_fence`:
//!
//! ````text
//! ```math
//! a^2 + b^2 = c^2
//! ```
//! ````
//!
//! ## Backends
//!
//! - `katex` (default): KaTeX in an embedded JS engine. Output needs the KaTeX
//!   stylesheet, see [`MathPlugin::head_content`].
//! - `mathml`: native MathML via `latex2mathml`. Supports `\label`, `\tag`
//!   and automatic numbering; collect the stylesheet after a document with
//!   [`MathPlugin::output_style`] and call [`MathPlugin::reset`] between
//!   documents.
//!
//! Invalid TeX never aborts a document: it is rendered as an error fragment
//! with the escaped source and the engine's message as its `title`.
//!
//! ## Front Matter
//!
//! A `[math]` table in `+++` TOML front matter overrides the options for
//! that document:
//!
//! ```text
//! +++
//! [math]
//! math_fence = true
//!
//! [math.katex.macros]
//! "\\RR" = "\\mathbb{R}"
//! +++
//! ```
//!
//! ## Features
//!
//! - `katex`: KaTeX backend (requires `katex` crate)
//! - `mathml`: MathML backend (requires `latex2mathml` crate)
//! - `wasm`: Enable WebAssembly bindings (requires `wasm-bindgen`)

pub mod config;
pub mod error;
pub mod front_matter;
pub mod plugin;
pub mod render;
pub mod tex;

// WASM module (only with feature)
#[cfg(feature = "wasm")]
pub mod wasm;

// Convenience re-exports
pub use config::{Backend, EquationTags, KatexOptions, KatexOutput, MathConfig, MathmlOptions};
pub use error::{ConfigError, Error, RenderError, Result};
pub use plugin::{render_markdown, MathPlugin};
pub use render::{create_renderer, MathRenderer};
pub use tex::{MathEvents, TexOptions, Transformer};

#[cfg(feature = "katex")]
pub use render::KatexRenderer;
#[cfg(feature = "mathml")]
pub use render::MathmlRenderer;
