//! Text repair applied to feed XML and article lines.
//!
//! The publisher's feed is not reliably well-formed: it carries stray control
//! characters, bare `&` characters and an undeclared `georss:` prefix, any of
//! which makes a strict XML reader reject the whole document. [`sanitize`]
//! repairs all three. Article pages only need [`strip_control_chars`], since
//! escaping their `&` characters would mangle entities the mail client renders.
//!
//! The remaining helpers clean up entities the publisher emits inconsistently.

use once_cell::sync::Lazy;
use regex::Regex;

/// What may legally follow a `&` without being escaped.
static ENTITY_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:quot|amp|apos|lt|gt|#(?:\d{1,5}|x[\da-fA-F]{1,4}));").unwrap()
});

static GEORSS_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(/?)(?:georss:)+").unwrap());

static SMART_QUOTE_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#822[01]([^;])").unwrap());

/// Entities translated by [`deentityize`]. Anything else is left alone.
const ENTITY_TABLE: &[(&str, &str)] = &[
    ("&#036;", "$"),
    ("&#36;", "$"),
    ("&#8216;", "'"),
    ("&#8217;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
    ("&lsquo;", "'"),
    ("&rsquo;", "'"),
    ("&ldquo;", "\""),
    ("&rdquo;", "\""),
];

/// Make raw feed text acceptable to a strict, namespace-unaware XML reader.
///
/// Runs [`strip_control_chars`], then [`strip_georss_prefix`], then
/// [`escape_bare_ampersands`]. Idempotent.
pub fn sanitize(raw: &str) -> String {
    let text = strip_control_chars(raw);
    let text = strip_georss_prefix(&text);
    escape_bare_ampersands(&text)
}

/// Remove C0 control characters that XML 1.0 forbids. Tab, newline and
/// carriage return survive.
pub fn strip_control_chars(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}'))
        .collect()
}

/// Drop the `georss:` prefix from opening and closing tags.
pub fn strip_georss_prefix(xml: &str) -> String {
    GEORSS_PREFIX.replace_all(xml, "<${1}").into_owned()
}

/// Replace every `&` that does not start a recognized entity with `&amp;`.
///
/// Recognized: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&#NNNNN;` and
/// `&#xHHHH;`. The character after an escaped `&` is kept as-is.
pub fn escape_bare_ampersands(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    for (i, c) in xml.char_indices() {
        if c == '&' && !ENTITY_TAIL.is_match(&xml[i + 1..]) {
            out.push_str("&amp;");
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode the fixed set of quote, apostrophe and dollar entities the
/// publisher emits.
pub fn deentityize(text: &str) -> String {
    ENTITY_TABLE
        .iter()
        .fold(text.to_string(), |acc, (entity, literal)| acc.replace(entity, literal))
}

/// Drop a `&#8220` / `&#8221` fragment that lost its semicolon, keeping the
/// character that follows it.
pub fn strip_smart_quote_artifacts(line: &str) -> String {
    SMART_QUOTE_ARTIFACT.replace_all(line, "${1}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_control_chars_keeps_whitespace() {
        let raw = "a\u{0}b\u{8}c\td\ne\rf\u{B}g\u{C}h\u{1F}i";
        assert_eq!(strip_control_chars(raw), "abc\td\ne\rfghi");
    }

    #[test]
    fn test_escape_bare_ampersands() {
        assert_eq!(escape_bare_ampersands("Fish & Chips"), "Fish &amp; Chips");
        assert_eq!(escape_bare_ampersands("AT&T"), "AT&amp;T");
        assert_eq!(escape_bare_ampersands("trailing &"), "trailing &amp;");
        assert_eq!(escape_bare_ampersands("&nbsp;"), "&amp;nbsp;");
    }

    #[test]
    fn test_escape_leaves_recognized_entities() {
        let ok = "&amp; &lt; &gt; &quot; &apos; &#8217; &#x2019; &#36;";
        assert_eq!(escape_bare_ampersands(ok), ok);
    }

    #[test]
    fn test_escape_rejects_overlong_numeric_refs() {
        assert_eq!(escape_bare_ampersands("&#123456;"), "&amp;#123456;");
        assert_eq!(escape_bare_ampersands("&#x12345;"), "&amp;#x12345;");
        assert_eq!(escape_bare_ampersands("&#8217"), "&amp;#8217");
    }

    #[test]
    fn test_strip_georss_prefix() {
        let xml = "<item><georss:point>45.6 -111.0</georss:point></item>";
        assert_eq!(
            strip_georss_prefix(xml),
            "<item><point>45.6 -111.0</point></item>"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "<rss><georss:point>1 2</georss:point><title>A & B</title></rss>",
            "&\u{1}amp; &&& &#; &#x; <georss:georss:x/>",
            "plain text",
            "",
            "Q&A &amp;amp; &lt&gt",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_deentityize_clears_listed_entities() {
        let all: String = ENTITY_TABLE.iter().map(|(e, _)| *e).collect();
        let out = deentityize(&all);
        for (entity, _) in ENTITY_TABLE {
            assert!(!out.contains(entity), "{entity} survived in {out:?}");
        }
        assert_eq!(out, "$$''\"\"''\"\"");
    }

    #[test]
    fn test_deentityize_leaves_other_text() {
        let text = "It&#8217;s &nbsp; &amp; &#8212; &#36;5";
        assert_eq!(deentityize(text), "It's &nbsp; &amp; &#8212; $5");
    }

    #[test]
    fn test_strip_smart_quote_artifacts() {
        assert_eq!(strip_smart_quote_artifacts("&#8220Hello&#8221 there"), "Hello there");
        assert_eq!(strip_smart_quote_artifacts("&#8220;Hello&#8221;"), "&#8220;Hello&#8221;");
    }
}
