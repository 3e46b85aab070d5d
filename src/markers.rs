//! Publisher page markers.
//!
//! The extractor recognizes page regions by plain substring tests against the
//! publisher's CSS class names and HTML comments. They are hard-matched
//! against one site's template and break whenever the site is redesigned, so
//! they live here as data rather than in the state machine.

/// Substrings that identify regions of an article page.
#[derive(Debug, Clone)]
pub struct Markers {
    /// Line that opens the byline block.
    pub byline: &'static str,
    /// Line that opens a photo gallery ahead of the story.
    pub gallery: &'static str,
    /// Line that closes the photo gallery.
    pub gallery_end: &'static str,
    /// Lines inside the gallery worth keeping.
    pub image: &'static str,
    /// Lines that close the byline block.
    pub byline_end: &'static [&'static str],
    /// Line that opens the readable story text.
    pub content: &'static str,
    /// Lines that end the readable story text. Paywalled stories stop at the
    /// restriction or subscription notice; free ones at the comment section or
    /// the page chrome that follows the story.
    pub content_end: &'static [&'static str],
    /// Line that opens a block of shifted paragraphs.
    pub encrypted: &'static str,
    /// Line that closes the shifted block.
    pub encrypted_end: &'static str,
    pub script_open: &'static str,
    pub script_close: &'static str,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            byline: r#"class="byline""#,
            gallery: r#"class="instant-gallery""#,
            gallery_end: "<!-- /instant-gallery -->",
            image: "<img",
            byline_end: &[r#"itemprop="author""#, r#"class="content-start""#],
            content: r#"class="content""#,
            content_end: &[
                "tncms-restricted-notice",
                r#"class="subscription-required""#,
                "<!-- /pagination -->",
                "blox-comments",
                "<!-- begin comment tabs",
                "<!-- bottom html",
                "story-tools-sprite",
            ],
            encrypted: r#"class="encrypted-content""#,
            encrypted_end: "</div>",
            script_open: "<script",
            script_close: "</script",
        }
    }
}

impl Markers {
    pub(crate) fn ends_byline(&self, line: &str) -> bool {
        self.byline_end.iter().any(|m| line.contains(m))
    }

    pub(crate) fn ends_content(&self, line: &str) -> bool {
        self.content_end.iter().any(|m| line.contains(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_marker_does_not_match_byline_end() {
        let markers = Markers::default();
        assert!(!markers.ends_byline(r#"<div class="content">"#));
        assert!(markers.ends_byline(r#"<div class="content-start"></div>"#));
    }

    #[test]
    fn test_any_content_end_marker_matches() {
        let markers = Markers::default();
        assert!(markers.ends_content(r#"<div id="tncms-restricted-notice">"#));
        assert!(markers.ends_content(r#"<p class="subscription-required">Subscribe</p>"#));
        assert!(markers.ends_content("<!-- /pagination -->"));
        assert!(markers.ends_content(r#"<div id="blox-comments">"#));
        assert!(markers.ends_content("<!-- begin comment tabs -->"));
        assert!(markers.ends_content("<!-- bottom html -->"));
        assert!(markers.ends_content(r#"<span class="story-tools-sprite"></span>"#));
        assert!(!markers.ends_content("<p>Ordinary paragraph.</p>"));
    }
}
