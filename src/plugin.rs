//! Plugin registration and whole-document rendering.

use crate::config::MathConfig;
use crate::error::Result;
use crate::front_matter::{math_overrides, split_front_matter};
use crate::render::{create_renderer, MathRenderer};
use crate::tex::{MathEvents, TexOptions, Transformer};
use pulldown_cmark::{html, Event, Options, Parser};
use std::fmt;

/// A configured math extension for a `pulldown-cmark` pipeline.
pub struct MathPlugin {
    config: MathConfig,
    renderer: Box<dyn MathRenderer>,
    transformer: Option<Transformer>,
}

impl fmt::Debug for MathPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MathPlugin")
            .field("config", &self.config)
            .field("transformer", &self.transformer.is_some())
            .finish_non_exhaustive()
    }
}

impl MathPlugin {
    /// Register the extension with the given options.
    ///
    /// Returns `Ok(None)` when the configured backend is not available; the
    /// condition has already been logged and math should be left as source.
    pub fn new(config: MathConfig) -> Result<Option<Self>> {
        let renderer = match create_renderer(&config)? {
            Some(renderer) => renderer,
            None => return Ok(None),
        };

        Ok(Some(Self {
            config,
            renderer,
            transformer: None,
        }))
    }

    /// Build a plugin around an existing renderer.
    pub fn with_renderer(config: MathConfig, renderer: Box<dyn MathRenderer>) -> Self {
        Self {
            config,
            renderer,
            transformer: None,
        }
    }

    /// Rewrite every rendered fragment with `transformer(html, is_block)`.
    pub fn with_transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&str, bool) -> String + Send + Sync + 'static,
    {
        self.transformer = Some(std::sync::Arc::new(transformer));
        self
    }

    pub fn config(&self) -> &MathConfig {
        &self.config
    }

    /// Parser options needed for math recognition, on top of `base`.
    pub fn parser_options(&self, base: Options) -> Options {
        base | Options::ENABLE_MATH
    }

    fn tex_options(&self) -> TexOptions {
        TexOptions {
            allow_inline_with_space: self.config.allow_inline_with_space,
            math_fence: self.config.math_fence,
        }
    }

    /// Wrap a parser's event stream so math is rendered as it passes through.
    ///
    /// The parser must have been created with [`MathPlugin::parser_options`].
    pub fn events<'a, 'r, I>(&'r mut self, events: I) -> MathEvents<'a, 'r, I>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let options = self.tex_options();
        MathEvents::new(
            events,
            self.renderer.as_mut(),
            options,
            self.transformer.clone(),
        )
    }

    /// Render a single expression outside of any document.
    pub fn render_math(&mut self, tex: &str, display: bool) -> Result<String> {
        let html = if display {
            self.renderer.render_display(tex)?
        } else {
            self.renderer.render_inline(tex)?
        };
        Ok(match self.transformer {
            Some(ref transformer) => transformer(&html, display),
            None => html,
        })
    }

    /// Head content (stylesheet links) the backend's output depends on.
    pub fn head_content(&self) -> Option<String> {
        self.renderer.head_content()
    }

    /// Stylesheet accumulated since the last call. Clears the cache.
    pub fn output_style(&mut self) -> String {
        self.renderer.output_style()
    }

    pub fn clear_style(&mut self) {
        self.renderer.clear_style();
    }

    /// Forget labels and equation numbers before the next document.
    pub fn reset(&mut self) {
        self.renderer.reset();
    }
}

/// Render a Markdown document to HTML.
///
/// A `[math]` table in `+++` front matter overrides the plugin options for
/// this document. Without a plugin, math is left in the output as written.
pub fn render_markdown(input: &str, plugin: Option<&mut MathPlugin>) -> Result<String> {
    let (front_matter, content) = split_front_matter(input)?;
    let base = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut output = String::new();

    let Some(plugin) = plugin else {
        html::push_html(&mut output, Parser::new_ext(content, base));
        return Ok(output);
    };

    let overrides = match front_matter.as_ref() {
        Some(table) => math_overrides(table)?,
        None => None,
    };

    let Some(overrides) = overrides else {
        render_with(content, base, plugin, &mut output)?;
        return Ok(output);
    };

    let config = plugin.config.merged_with(overrides)?;
    tracing::debug!("applying front matter math options");

    if config.backend == plugin.config.backend
        && config.katex == plugin.config.katex
        && config.mathml == plugin.config.mathml
    {
        let previous = std::mem::replace(&mut plugin.config, config);
        let rendered = render_with(content, base, plugin, &mut output);
        plugin.config = previous;
        rendered?;
        return Ok(output);
    }

    // Renderer options changed: this document gets a renderer of its own.
    match create_renderer(&config)? {
        Some(renderer) => {
            let mut scoped = MathPlugin {
                config,
                renderer,
                transformer: plugin.transformer.clone(),
            };
            render_with(content, base, &mut scoped, &mut output)?;
        }
        None => html::push_html(&mut output, Parser::new_ext(content, base)),
    }

    Ok(output)
}

fn render_with(
    content: &str,
    base: Options,
    plugin: &mut MathPlugin,
    output: &mut String,
) -> Result<()> {
    let parser = Parser::new_ext(content, plugin.parser_options(base));
    let events = plugin.events(parser).collect::<Result<Vec<_>>>()?;
    html::push_html(output, events.into_iter());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Echo;

    impl MathRenderer for Echo {
        fn render_inline(&mut self, tex: &str) -> Result<String> {
            Ok(format!("<i>{}</i>", tex))
        }

        fn render_display(&mut self, tex: &str) -> Result<String> {
            Ok(format!("<b>{}</b>\n", tex.trim()))
        }
    }

    fn echo_plugin(config: MathConfig) -> MathPlugin {
        MathPlugin::with_renderer(config, Box::new(Echo))
    }

    #[test]
    fn test_without_plugin_math_is_text() {
        let html = render_markdown("A $x$ b", None).unwrap();
        assert_eq!(html, "<p>A $x$ b</p>\n");
    }

    #[test]
    fn test_with_plugin() {
        let mut plugin = echo_plugin(MathConfig::default());
        let html = render_markdown("A $x$ b\n\n$$y$$", Some(&mut plugin)).unwrap();
        assert!(html.contains("<p>A <i>x</i> b</p>"));
        assert!(html.contains("<b>y</b>"));
    }

    #[test]
    fn test_front_matter_overrides_for_one_document() {
        let mut plugin = echo_plugin(MathConfig::default());
        let input = "+++\n[math]\nmath_fence = true\n+++\n\n```math\nz\n```\n";

        let html = render_markdown(input, Some(&mut plugin)).unwrap();
        assert_eq!(html, "<b>z</b>\n");
        assert!(!plugin.config().math_fence);

        let html = render_markdown("```math\nz\n```\n", Some(&mut plugin)).unwrap();
        assert!(html.contains("language-math"));
    }

    #[cfg(feature = "mathml")]
    #[test]
    fn test_front_matter_backend_switch() {
        let mut plugin = echo_plugin(MathConfig::default());
        let input = "+++\n[math]\nbackend = \"mathml\"\n+++\n\n$x$";

        let html = render_markdown(input, Some(&mut plugin)).unwrap();
        assert!(html.contains("<math"));
        assert!(!html.contains("<i>"));
    }

    #[test]
    fn test_bad_front_matter() {
        let mut plugin = echo_plugin(MathConfig::default());
        let err = render_markdown("+++\n[math]\nmath_fence = 3\n+++\nx", Some(&mut plugin))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_render_math_applies_transformer() {
        let mut plugin = echo_plugin(MathConfig::default())
            .with_transformer(|html, block| format!("{}{}", if block { "B:" } else { "I:" }, html));
        assert_eq!(plugin.render_math("x", false).unwrap(), "I:<i>x</i>");
        assert_eq!(plugin.render_math("x", true).unwrap(), "B:<b>x</b>\n");
    }

    #[test]
    fn test_default_hooks_are_noops() {
        let mut plugin = echo_plugin(MathConfig::default());
        assert_eq!(plugin.output_style(), "");
        plugin.clear_style();
        plugin.reset();
        assert!(plugin.head_content().is_none());
    }
}
