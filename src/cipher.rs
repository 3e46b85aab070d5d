//! Decoder for the publisher's "encrypted" paywall paragraphs.
//!
//! Paywalled paragraphs are shipped in the page as a Caesar shift over the 94
//! printable ASCII characters (`!` through `~`), HTML-escaped on top. Shifting
//! each printable character forward by [`SHIFT`] undoes the publisher's
//! encoding. Everything outside that range (spaces, non-ASCII punctuation)
//! was never shifted and passes through.

/// First printable, non-space ASCII character.
const FIRST: u8 = b'!';
/// Size of the `!`..=`~` alphabet.
const ALPHABET: u8 = 94;
/// Distance the decoder shifts forward.
pub const SHIFT: u8 = 14;

/// Decode one line of an encrypted block.
///
/// The line is trimmed and its four basic XML entities are unescaped before
/// the per-character shift is applied.
pub fn decrypt_line(line: &str) -> String {
    unescape_basic(line.trim()).chars().map(decrypt_char).collect()
}

/// Shift a printable ASCII character forward by [`SHIFT`], wrapping within
/// the printable range. Other characters are returned unchanged.
pub fn decrypt_char(c: char) -> char {
    rotate(c, SHIFT)
}

/// The publisher's encoding: the inverse of [`decrypt_char`].
pub fn encrypt_char(c: char) -> char {
    rotate(c, ALPHABET - SHIFT)
}

fn rotate(c: char, by: u8) -> char {
    if !matches!(c, '!'..='~') {
        return c;
    }
    let offset = (c as u8 - FIRST + by) % ALPHABET;
    char::from(FIRST + offset)
}

// `&amp;` goes last so an escaped entity such as `&amp;lt;` decodes only once.
fn unescape_basic(text: &str) -> String {
    text.replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
