//! Line-oriented story body extraction.
//!
//! Article pages are scanned one line at a time by a small state machine. The
//! policy lives in [`step`], a pure transition function mapping
//! `(state, line)` to `(next state, action)`. [`scan`] drives it over a whole
//! page and applies the actions to an output buffer.
//!
//! # Page layout
//!
//! ```text
//! [gallery ... <img> ... gallery end]        optional, kept images only
//! byline ... author / content-start          kept
//! content ... paywall / subscription / page end / comments
//!     <script> ... </script>                 dropped
//! encrypted ... </div>                       decoded, kept (may repeat)
//! ```
//!
//! There is no terminal state: the scan always consumes the whole page.

use tracing::{debug, instrument, warn};

use quick_xml::escape::{escape, partial_escape};

use crate::cipher::decrypt_line;
use crate::markers::Markers;
use crate::sanitize::strip_smart_quote_artifacts;

/// Shortest body accepted as a successful extraction, in characters.
pub const MIN_BODY_LEN: usize = 100;

/// Line emitted between the gallery, byline and story sections.
pub const PARAGRAPH_BREAK: &str = "<br>";

/// Position of the scanner within the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    LookingForGalleryOrByline,
    ReadingGallery,
    ReadingByline,
    LookingForContent,
    LookingForContentEnd,
    SkippingScript,
    LookingForEncrypted,
    ReadingEncrypted,
}

/// What to do with the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Skip,
    Emit,
    /// Emit the line, then a paragraph break.
    EmitThenBreak,
    /// Emit a paragraph break in place of the line.
    Break,
    /// Emit the decoded form of the line.
    Decrypt,
}

/// Transition function of the extractor.
pub fn step(state: State, line: &str, markers: &Markers) -> (State, Action) {
    use Action::*;
    use State::*;

    match state {
        LookingForGalleryOrByline => {
            if line.contains(markers.byline) {
                // Byline and author often share one line.
                if markers.ends_byline(line) {
                    (LookingForContent, EmitThenBreak)
                } else {
                    (ReadingByline, Emit)
                }
            } else if line.contains(markers.gallery) {
                (ReadingGallery, Skip)
            } else {
                (state, Skip)
            }
        }
        ReadingGallery => {
            if line.contains(markers.gallery_end) {
                (LookingForGalleryOrByline, Break)
            } else if line.contains(markers.image) {
                (state, Emit)
            } else {
                (state, Skip)
            }
        }
        ReadingByline => {
            if markers.ends_byline(line) {
                (LookingForContent, EmitThenBreak)
            } else {
                (state, Emit)
            }
        }
        LookingForContent => {
            if line.contains(markers.content) {
                (LookingForContentEnd, Skip)
            } else {
                (state, Skip)
            }
        }
        LookingForContentEnd => {
            if markers.ends_content(line) {
                (LookingForEncrypted, Skip)
            } else if line.contains(markers.script_open) {
                // A one-line script needs no skipping state.
                if line.contains(markers.script_close) {
                    (state, Skip)
                } else {
                    (SkippingScript, Skip)
                }
            } else {
                (state, Emit)
            }
        }
        SkippingScript => {
            if line.contains(markers.script_close) {
                (LookingForContentEnd, Skip)
            } else {
                (state, Skip)
            }
        }
        LookingForEncrypted => {
            if line.contains(markers.encrypted) {
                (ReadingEncrypted, Skip)
            } else {
                (state, Skip)
            }
        }
        ReadingEncrypted => {
            if line.contains(markers.encrypted_end) {
                (LookingForEncrypted, Skip)
            } else {
                (state, Decrypt)
            }
        }
    }
}

/// Accumulated story text, one emitted line per output line.
#[derive(Debug, Default)]
struct Body {
    text: String,
}

impl Body {
    fn push_line(&mut self, line: &str) {
        let line = strip_smart_quote_artifacts(line);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn apply(&mut self, action: Action, line: &str) {
        match action {
            Action::Skip => {}
            Action::Emit => self.push_line(line),
            Action::EmitThenBreak => {
                self.push_line(line);
                self.push_line(PARAGRAPH_BREAK);
            }
            Action::Break => self.push_line(PARAGRAPH_BREAK),
            Action::Decrypt => self.push_line(&decrypt_line(line)),
        }
    }
}

/// Run the state machine over every line of `page`.
///
/// Returns the accumulated body and the state the scan ended in.
pub fn scan(page: &str, markers: &Markers) -> (String, State) {
    let mut state = State::LookingForGalleryOrByline;
    let mut body = Body::default();
    for line in page.lines() {
        let (next, action) = step(state, line, markers);
        body.apply(action, line);
        state = next;
    }
    (body.text, state)
}

/// Extract the readable body of a story page.
///
/// A page that yields fewer than [`MIN_BODY_LEN`] characters is treated as
/// unparsed and replaced by [`fallback_body`]; extraction itself never fails.
#[instrument(level = "debug", skip_all, fields(%url))]
pub fn extract_story_body(page: &str, url: &str, headline: &str, markers: &Markers) -> String {
    let (body, end_state) = scan(page, markers);
    let len = body.chars().count();
    if len < MIN_BODY_LEN {
        warn!(
            %url,
            chars = len,
            ?end_state,
            page_bytes = page.len(),
            "Story body too short; using fallback"
        );
        return fallback_body(url, headline);
    }
    debug!(chars = len, ?end_state, "Extracted story body");
    body
}

/// Body sent when a page could not be parsed.
pub fn fallback_body(url: &str, headline: &str) -> String {
    format!(
        "<p>Could not parse the story \"{}\" from <a href='{}'>{}</a>. \
         Follow the link to read it on the site.</p>",
        partial_escape(headline),
        escape(url),
        partial_escape(url)
    )
}
