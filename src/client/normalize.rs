use deunicode::deunicode_char;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Folds text to lower-case ASCII: accents dropped, other scripts
/// transliterated. Characters with no transliteration are kept as they are.
/// The output is a fixed point of this function.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        match deunicode_char(c) {
            Some(ascii) => folded.push_str(ascii),
            None => folded.push(c),
        }
    }
    folded.to_lowercase()
}
