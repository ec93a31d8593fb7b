//! Math recognition over the `pulldown-cmark` event stream.
//!
//! The parser already splits `$...$` and `$$...$$` into `InlineMath` and
//! `DisplayMath` events when `Options::ENABLE_MATH` is set. [`MathEvents`]
//! sits between the parser and the HTML writer and swaps those events (and,
//! optionally, ```` ```math ```` fences) for rendered HTML.

use crate::error::Result;
use crate::render::MathRenderer;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::collections::VecDeque;
use std::sync::Arc;

/// Post-processing hook applied to every rendered fragment.
///
/// Receives the HTML and whether it is block-level math.
pub type Transformer = Arc<dyn Fn(&str, bool) -> String + Send + Sync>;

/// Which math syntax is recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TexOptions {
    /// Accept inline math whose content starts or ends with whitespace.
    pub allow_inline_with_space: bool,
    /// Render ```` ```math ```` fences as display math.
    pub math_fence: bool,
}

/// Iterator adapter that renders math events.
pub struct MathEvents<'a, 'r, I> {
    inner: I,
    renderer: &'r mut dyn MathRenderer,
    options: TexOptions,
    transformer: Option<Transformer>,
    pending: VecDeque<Event<'a>>,
    /// Open headings and table cells, where only phrasing content fits.
    phrasing_depth: usize,
}

impl<'a, 'r, I> MathEvents<'a, 'r, I>
where
    I: Iterator<Item = Event<'a>>,
{
    pub fn new(
        inner: I,
        renderer: &'r mut dyn MathRenderer,
        options: TexOptions,
        transformer: Option<Transformer>,
    ) -> Self {
        Self {
            inner,
            renderer,
            options,
            transformer,
            pending: VecDeque::new(),
            phrasing_depth: 0,
        }
    }

    fn process(&mut self, event: Event<'a>) -> Result<()> {
        match event {
            Event::Start(Tag::Paragraph) => self.paragraph(),
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info)))
                if self.options.math_fence && is_math_fence(info) =>
            {
                self.fence()
            }
            Event::DisplayMath(tex) if self.phrasing_depth > 0 => {
                let html = self.renderer.render_inline(&tex)?;
                let html = self.transform(html, false);
                self.pending.push_back(Event::InlineHtml(html.into()));
                Ok(())
            }
            Event::DisplayMath(tex) => {
                let html = self.block(&tex)?;
                self.pending.push_back(html);
                Ok(())
            }
            other => {
                match other {
                    Event::Start(Tag::Heading { .. }) | Event::Start(Tag::TableCell) => {
                        self.phrasing_depth += 1;
                    }
                    Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::TableCell) => {
                        self.phrasing_depth = self.phrasing_depth.saturating_sub(1);
                    }
                    _ => {}
                }
                let event = self.inline_event(other)?;
                self.pending.push_back(event);
                Ok(())
            }
        }
    }

    /// Buffer a paragraph and lift display math out of it.
    ///
    /// A paragraph holding nothing but display math becomes the block alone;
    /// text around display math stays in paragraphs of its own.
    fn paragraph(&mut self) -> Result<()> {
        let mut body = Vec::new();
        for event in self.inner.by_ref() {
            if matches!(event, Event::End(TagEnd::Paragraph)) {
                break;
            }
            body.push(event);
        }

        let mut run = Vec::new();
        let mut after_block = false;
        for event in body {
            match event {
                Event::DisplayMath(tex) => {
                    while run.last().is_some_and(is_blank) {
                        run.pop();
                    }
                    self.flush_paragraph(&mut run);
                    let html = self.block(&tex)?;
                    self.pending.push_back(html);
                    after_block = true;
                }
                other if after_block && run.is_empty() && is_blank(&other) => {}
                other => run.push(self.inline_event(other)?),
            }
        }
        self.flush_paragraph(&mut run);

        Ok(())
    }

    fn flush_paragraph(&mut self, run: &mut Vec<Event<'a>>) {
        if run.iter().all(is_blank) {
            run.clear();
            return;
        }
        self.pending.push_back(Event::Start(Tag::Paragraph));
        self.pending.extend(run.drain(..));
        self.pending.push_back(Event::End(TagEnd::Paragraph));
    }

    fn fence(&mut self) -> Result<()> {
        let mut content = String::new();
        for event in self.inner.by_ref() {
            match event {
                Event::End(TagEnd::CodeBlock) => break,
                Event::Text(text) => content.push_str(&text),
                _ => {}
            }
        }
        let html = self.block(&content)?;
        self.pending.push_back(html);
        Ok(())
    }

    fn inline_event(&mut self, event: Event<'a>) -> Result<Event<'a>> {
        match event {
            Event::InlineMath(tex) => self.inline(tex),
            other => Ok(other),
        }
    }

    fn inline(&mut self, tex: CowStr<'a>) -> Result<Event<'a>> {
        if !self.options.allow_inline_with_space && has_edge_whitespace(&tex) {
            return Ok(Event::Text(format!("${}$", tex).into()));
        }
        let html = self.renderer.render_inline(&tex)?;
        Ok(Event::InlineHtml(self.transform(html, false).into()))
    }

    fn block(&mut self, tex: &str) -> Result<Event<'a>> {
        let html = self.renderer.render_display(tex)?;
        Ok(Event::Html(self.transform(html, true).into()))
    }

    fn transform(&self, html: String, block: bool) -> String {
        match self.transformer {
            Some(ref transformer) => transformer(&html, block),
            None => html,
        }
    }
}

impl<'a, 'r, I> Iterator for MathEvents<'a, 'r, I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Result<Event<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            let event = self.inner.next()?;
            if let Err(e) = self.process(event) {
                return Some(Err(e));
            }
        }
    }
}

fn is_math_fence(info: &str) -> bool {
    info.split_whitespace().next() == Some("math")
}

fn has_edge_whitespace(tex: &str) -> bool {
    tex.starts_with(char::is_whitespace) || tex.ends_with(char::is_whitespace)
}

fn is_blank(event: &Event<'_>) -> bool {
    match event {
        Event::SoftBreak | Event::HardBreak => true,
        Event::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}
