//! Name normalization helpers shared by the index and the fuzzy resolver.
//!
//! Historical records carry free-text personnel names typed on whatever
//! keyboard was at hand, so "Ayşe Yılmaz" shows up as "Ayse Yilmaz",
//! "AYŞE YILMAZ", or "ayse  yilmaz". Folding maps all of those to one key.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a display name for matching: NFKD-decompose, strip combining marks,
/// lowercase, collapse whitespace.
///
/// A handful of characters carry their diacritic in the base codepoint and
/// never decompose (Turkish dotless ı, ß, ø, …); those get mapped by hand so
/// ASCII-typed variants still collide with the canonical spelling.
pub fn fold_name(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        fold_char(c, &mut out);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_char(c: char, out: &mut String) {
    match c {
        'ı' => out.push('i'),
        'ß' => out.push_str("ss"),
        'ø' | 'Ø' => out.push('o'),
        'đ' | 'Đ' | 'ð' | 'Ð' => out.push('d'),
        'ł' | 'Ł' => out.push('l'),
        'æ' | 'Æ' => out.push_str("ae"),
        'œ' | 'Œ' => out.push_str("oe"),
        'þ' | 'Þ' => out.push_str("th"),
        _ => out.extend(c.to_lowercase()),
    }
}
