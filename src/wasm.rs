//! WebAssembly bindings for JavaScript/TypeScript hosts.
//!
//! # Usage (JavaScript/TypeScript)
//!
//! ```javascript
//! import init, { renderMarkdown, MathInstance } from '@markdown-math/wasm';
//!
//! await init();
//!
//! // One-shot rendering
//! const html = renderMarkdown('Euler: $e^{i\\pi} + 1 = 0$', { backend: 'mathml' });
//!
//! // Stateful instance: labels, numbering and styles persist between calls
//! const math = new MathInstance({ backend: 'mathml', mathml: { tags: 'all' } });
//! const body = math.render(source);
//! const css = math.outputStyle();
//! math.reset();
//! ```
//!
//! The KaTeX backend needs the `katex/wasm-js` engine; browser builds usually
//! enable only the `mathml` feature.

#![cfg(feature = "wasm")]

use crate::config::MathConfig;
use crate::plugin::{render_markdown as render_document, MathPlugin};
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn config_from_js(options: JsValue) -> Result<MathConfig, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(MathConfig::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsError::new(&format!("Invalid options: {}", e)))
}

fn create_plugin(config: MathConfig) -> Result<MathPlugin, JsError> {
    let backend = config.backend;
    MathPlugin::new(config)
        .map_err(|e| JsError::new(&e.to_string()))?
        .ok_or_else(|| JsError::new(&format!("\"{}\" backend is not available", backend.name())))
}

/// Render a Markdown document to HTML.
///
/// `options` is a plain object with the same shape as the TOML configuration.
/// If the selected backend is unavailable, math is left as source text.
#[wasm_bindgen(js_name = renderMarkdown)]
pub fn render_markdown(input: &str, options: JsValue) -> Result<String, JsError> {
    let config = config_from_js(options)?;
    let mut plugin = MathPlugin::new(config).map_err(|e| JsError::new(&e.to_string()))?;

    render_document(input, plugin.as_mut()).map_err(|e| JsError::new(&e.to_string()))
}

/// Render a single TeX expression.
#[wasm_bindgen(js_name = renderMath)]
pub fn render_math(tex: &str, display: bool, options: JsValue) -> Result<String, JsError> {
    let mut plugin = create_plugin(config_from_js(options)?)?;
    plugin
        .render_math(tex, display)
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Backends compiled into this build.
#[wasm_bindgen(js_name = availableBackends)]
pub fn available_backends() -> js_sys::Array {
    let backends = js_sys::Array::new();
    if cfg!(feature = "katex") {
        backends.push(&JsValue::from_str("katex"));
    }
    if cfg!(feature = "mathml") {
        backends.push(&JsValue::from_str("mathml"));
    }
    backends
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// A renderer that keeps its state between documents.
#[wasm_bindgen]
pub struct MathInstance {
    plugin: MathPlugin,
}

#[wasm_bindgen]
impl MathInstance {
    /// Create an instance from an options object.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<MathInstance, JsError> {
        let plugin = create_plugin(config_from_js(options)?)?;
        Ok(Self { plugin })
    }

    /// Create an instance from a JSON options string.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<MathInstance, JsError> {
        let config: MathConfig =
            serde_json::from_str(json).map_err(|e| JsError::new(&format!("JSON error: {}", e)))?;
        Ok(Self {
            plugin: create_plugin(config)?,
        })
    }

    /// Render a Markdown document.
    pub fn render(&mut self, input: &str) -> Result<String, JsError> {
        render_document(input, Some(&mut self.plugin)).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Render a single TeX expression.
    #[wasm_bindgen(js_name = renderMath)]
    pub fn render_math(&mut self, tex: &str, display: bool) -> Result<String, JsError> {
        self.plugin
            .render_math(tex, display)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Stylesheet for everything rendered since the last call. Clears it.
    #[wasm_bindgen(js_name = outputStyle)]
    pub fn output_style(&mut self) -> String {
        self.plugin.output_style()
    }

    #[wasm_bindgen(js_name = clearStyle)]
    pub fn clear_style(&mut self) {
        self.plugin.clear_style();
    }

    /// Forget labels and equation numbers.
    pub fn reset(&mut self) {
        self.plugin.reset();
    }

    /// Stylesheet links the backend output depends on.
    #[wasm_bindgen(js_name = headContent)]
    pub fn head_content(&self) -> Option<String> {
        self.plugin.head_content()
    }
}
