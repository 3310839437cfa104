//! Scalar normalizers for the string fields both upstreams deliver dirty:
//! shouting-case city names, free-form phone numbers, unpadded postal codes
//! and HTML-encoded punctuation.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static NUMERIC_ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(\d+);").unwrap());
static UNICODE_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap());

// The directory feed only ever emits these named entities.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&rsquo;", "\u{2019}"),
    ("&lsquo;", "\u{2018}"),
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&lt;", "<"),
    ("&gt;", ">"),
];

// French grammatical particles that stay lowercase mid-string.
const PARTICLES: &[&str] = &["de", "des", "du", "le", "la", "les", "en", "sur"];

/// Title-case a city name: lowercase, uppercase every word boundary
/// (space, hyphen, apostrophe), re-lowercase mid-string particles, then
/// force the leading character back to uppercase. Missing or blank input
/// yields the `"Inconnu"` placeholder.
pub fn normalize_city(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return "Inconnu".to_string();
    }

    let lower = trimmed.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut word = String::new();
    for c in lower.chars() {
        if c.is_alphanumeric() {
            word.push(c);
        } else {
            flush_word(&mut word, &mut out);
            out.push(c);
        }
    }
    flush_word(&mut word, &mut out);

    // The particle rule must not lowercase a leading word ("Le Havre").
    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => out,
    }
}

fn flush_word(word: &mut String, out: &mut String) {
    if word.is_empty() {
        return;
    }
    if PARTICLES.contains(&word.as_str()) {
        out.push_str(word);
    } else {
        let mut chars = word.chars();
        if let Some(c) = chars.next() {
            out.extend(c.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    word.clear();
}

/// Best-effort E.164 rewrite for French numbers: 10 digits starting `0`
/// become `+33` + 9 digits, 11 digits starting `33` gain a `+`. Anything
/// else passes through trimmed. Blank input yields None.
pub fn normalize_phone(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 && digits.starts_with('0') {
        Some(format!("+33{}", &digits[1..]))
    } else if digits.len() == 11 && digits.starts_with("33") {
        Some(format!("+{digits}"))
    } else {
        Some(trimmed.to_string())
    }
}

/// Digits only, left-padded with `0` to five characters. Input with no
/// digits yields None.
pub fn normalize_postal_code(raw: Option<&str>) -> Option<String> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("{digits:0>5}"))
}

/// Resolve the directory feed's encoded punctuation: the fixed named-entity
/// set, numeric character references, and escaped `\uXXXX` sequences.
pub fn decode_entities(raw: &str) -> String {
    let mut text = raw.to_string();
    for (entity, replacement) in NAMED_ENTITIES {
        text = text.replace(entity, replacement);
    }
    let text = NUMERIC_ENTITY_RE.replace_all(&text, |caps: &Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    let text = UNICODE_ESCAPE_RE.replace_all(&text, |caps: &Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_title_case_with_particles() {
        assert_eq!(
            normalize_city(Some("SAINTE GENEVIEVE DES BOIS")),
            "Sainte Genevieve des Bois"
        );
    }

    #[test]
    fn city_leading_particle_stays_uppercase() {
        assert_eq!(normalize_city(Some("LE HAVRE")), "Le Havre");
        assert_eq!(normalize_city(Some("la courneuve")), "La Courneuve");
        assert_eq!(normalize_city(Some("les lilas")), "Les Lilas");
    }

    #[test]
    fn city_hyphens_and_apostrophes_are_boundaries() {
        assert_eq!(normalize_city(Some("ivry-sur-seine")), "Ivry-sur-Seine");
        assert_eq!(normalize_city(Some("l'hay-les-roses")), "L'Hay-les-Roses");
    }

    #[test]
    fn city_missing_is_placeholder() {
        assert_eq!(normalize_city(None), "Inconnu");
        assert_eq!(normalize_city(Some("   ")), "Inconnu");
    }

    #[test]
    fn phone_national_to_e164() {
        assert_eq!(
            normalize_phone(Some("01 23 45 67 89")).as_deref(),
            Some("+33123456789")
        );
    }

    #[test]
    fn phone_already_prefixed() {
        assert_eq!(
            normalize_phone(Some("+33612345678")).as_deref(),
            Some("+33612345678")
        );
    }

    #[test]
    fn phone_unrecognized_shape_passes_through() {
        assert_eq!(normalize_phone(Some(" 118 218 ")).as_deref(), Some("118 218"));
    }

    #[test]
    fn phone_blank_is_none() {
        assert_eq!(normalize_phone(Some("  ")), None);
        assert_eq!(normalize_phone(None), None);
    }

    #[test]
    fn postal_code_padded() {
        assert_eq!(normalize_postal_code(Some("751")).as_deref(), Some("00751"));
        assert_eq!(
            normalize_postal_code(Some(" 93200 ")).as_deref(),
            Some("93200")
        );
    }

    #[test]
    fn postal_code_missing_is_none() {
        assert_eq!(normalize_postal_code(None), None);
        assert_eq!(normalize_postal_code(Some("n/a")), None);
    }

    #[test]
    fn named_entities_decoded() {
        assert_eq!(decode_entities("l&rsquo;Orient &amp; Cie"), "l\u{2019}Orient & Cie");
    }

    #[test]
    fn numeric_and_unicode_escapes_decoded() {
        assert_eq!(decode_entities("caf&#233;"), "caf\u{e9}");
        assert_eq!(decode_entities(r"boucherie \u00e9toile"), "boucherie \u{e9}toile");
    }
}
