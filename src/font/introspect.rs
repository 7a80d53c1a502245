// src/font/introspect.rs

//! Name-table metadata and sample glyph selection

use ttf_parser::{name_id, Face, GlyphId};
use tracing::info;

/// Human-readable names from a font's naming table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontNames {
    pub family: Option<String>,
    pub subfamily: Option<String>,
    pub full_name: Option<String>,
}

/// Extract family, subfamily and full name from the naming table
///
/// First match wins for each name id; later duplicate records (other
/// platforms, other languages) are ignored.
pub fn extract_names(face: &Face) -> FontNames {
    let mut names = FontNames::default();
    for record in face.names() {
        let slot = match record.name_id {
            name_id::FAMILY => &mut names.family,
            name_id::SUBFAMILY => &mut names.subfamily,
            name_id::FULL_NAME => &mut names.full_name,
            _ => continue,
        };
        if slot.is_none() {
            *slot = decode_record(&record);
        }
        if names.family.is_some() && names.subfamily.is_some() && names.full_name.is_some() {
            break;
        }
    }
    names
}

fn decode_record(record: &ttf_parser::name::Name) -> Option<String> {
    if let Some(s) = record.to_string() {
        return Some(s);
    }
    // non-unicode records (old Mac Roman entries) fall back to latin-1
    let s: String = record.name.iter().map(|&b| b as char).collect();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Prioritized glyph pairs, one per script or symbol set
///
/// The first pair whose glyphs both exist in the font's coverage is rendered
/// as the icon sample, so a font with zero Latin coverage still gets a
/// legible sample in its own script.
const SAMPLE_GLYPHS: &[&str] = &[
    "Aa",   // Latin
    "12",   // digits
    "Аа",   // Cyrillic
    "Αα",   // Greek
    "אב",   // Hebrew
    "اب",   // Arabic
    "अआ",   // Devanagari
    "অআ",   // Bengali
    "ਅਆ",   // Gurmukhi
    "અઆ",   // Gujarati
    "அஆ",   // Tamil
    "అఆ",   // Telugu
    "ಅಆ",   // Kannada
    "അആ",   // Malayalam
    "අආ",   // Sinhala
    "กข",   // Thai
    "ກຂ",   // Lao
    "ཀཁ",   // Tibetan
    "ကခ",   // Myanmar
    "აბ",   // Georgian
    "Աա",   // Armenian
    "ሀለ",   // Ethiopic
    "ᎠᎡ",   // Cherokee
    "ᐁᐊ",   // Canadian Aboriginal Syllabics
    "한글", // Hangul
    "あア", // Japanese kana
    "漢字", // Han
    "∴∵",   // mathematical symbols
    "♩♪",   // musical symbols
];

/// Pick the first sample pair fully covered by the font
///
/// Returns `None` when no known pair matches; the caller rejects the font and
/// we log its remaining glyph names so a new pair can be added to the list.
pub fn select_sample_glyphs(face: &Face) -> Option<&'static str> {
    for pair in SAMPLE_GLYPHS {
        if pair.chars().all(|c| face.glyph_index(c).is_some()) {
            return Some(pair);
        }
    }
    let names = interesting_glyph_names(face);
    info!(glyphs = names.join(",").as_str(), "no sample pair matched font coverage");
    None
}

const DIGIT_NAMES: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

const PUNCTUATION_NAMES: &[&str] = &[
    "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand", "quotesingle",
    "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period", "slash",
    "colon", "semicolon", "less", "equal", "greater", "question", "at", "bracketleft",
    "backslash", "bracketright", "asciicircum", "underscore", "grave", "braceleft", "bar",
    "braceright", "asciitilde",
];

/// Glyph names worth reporting when no sample pair matched
///
/// Noise is dropped: `.notdef`, space, unicode-escaped names and pure
/// digit/punctuation names tell us nothing about the font's script.
pub fn interesting_glyph_names(face: &Face) -> Vec<String> {
    let mut out = Vec::new();
    for i in 0..face.number_of_glyphs() {
        let Some(name) = face.glyph_name(GlyphId(i)) else {
            continue;
        };
        if name == ".notdef" || name == "space" {
            continue;
        }
        if is_unicode_escape(name) {
            continue;
        }
        if DIGIT_NAMES.contains(&name) || PUNCTUATION_NAMES.contains(&name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

fn is_unicode_escape(name: &str) -> bool {
    let hex = if let Some(rest) = name.strip_prefix("uni") {
        rest
    } else if let Some(rest) = name.strip_prefix('u') {
        rest
    } else {
        return false;
    };
    hex.len() >= 4 && hex.len() <= 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Vec<u8> {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name);
        std::fs::read(path).unwrap()
    }

    #[test]
    fn latin_pair_comes_first() {
        assert_eq!(SAMPLE_GLYPHS[0], "Aa");
        assert_eq!(SAMPLE_GLYPHS[1], "12");
    }

    #[test]
    fn digit_only_coverage_falls_back_to_the_digit_pair() {
        let data = fixture("digit-block.ttf");
        let face = Face::parse(&data, 0).unwrap();
        assert!(face.glyph_index('A').is_none());
        assert!(face.glyph_index('a').is_none());
        assert_eq!(select_sample_glyphs(&face), Some("12"));
    }

    #[test]
    fn names_come_from_the_naming_table() {
        let data = fixture("digit-block.ttf");
        let face = Face::parse(&data, 0).unwrap();
        let names = extract_names(&face);
        assert_eq!(names.family.as_deref(), Some("Digit Block"));
        assert_eq!(names.subfamily.as_deref(), Some("Regular"));
        assert_eq!(names.full_name.as_deref(), Some("Digit Block Regular"));
    }

    #[test]
    fn unicode_escapes_are_noise() {
        assert!(is_unicode_escape("uni4E2D"));
        assert!(is_unicode_escape("u1F600"));
        assert!(!is_unicode_escape("units"));
        assert!(!is_unicode_escape("alpha"));
        assert!(!is_unicode_escape("uXY"));
    }
}
