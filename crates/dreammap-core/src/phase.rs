//! Moon phase labels and glyphs.
//!
//! The astronomy service reports phases as lowercase run-together codes
//! (`fullmoon`, `waxingcrescent`, ...). These helpers turn them into the
//! labels and glyphs shown to users.

/// Raw phase code to canonical label.
const PHASE_LABELS: [(&str, &str); 8] = [
    ("newmoon", "New Moon"),
    ("waxingcrescent", "Waxing Crescent"),
    ("firstquarter", "First Quarter"),
    ("waxinggibbous", "Waxing Gibbous"),
    ("fullmoon", "Full Moon"),
    ("waninggibbous", "Waning Gibbous"),
    ("lastquarter", "Last Quarter"),
    ("waningcrescent", "Waning Crescent"),
];

/// Checked top to bottom against the lowercased label; first hit wins.
const GLYPH_RULES: [(&str, &str); 8] = [
    ("new", "🌑"),
    ("waxing crescent", "🌒"),
    ("first quarter", "🌓"),
    ("waxing gibbous", "🌔"),
    ("full", "🌕"),
    ("waning gibbous", "🌖"),
    ("last quarter", "🌗"),
    ("waning crescent", "🌘"),
];

pub const FALLBACK_GLYPH: &str = "🌙";

/// Map a raw phase code to its canonical label, ignoring case.
///
/// Unrecognized input is returned unchanged.
pub fn normalize_phase(raw: &str) -> String {
    let lower = raw.to_lowercase();
    PHASE_LABELS
        .iter()
        .find(|(code, _)| *code == lower)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Display glyph for a canonical label.
pub fn phase_glyph(label: &str) -> &'static str {
    let lower = label.to_lowercase();
    GLYPH_RULES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, glyph)| *glyph)
        .unwrap_or(FALLBACK_GLYPH)
}

/// All canonical labels in cycle order.
pub fn canonical_labels() -> impl Iterator<Item = &'static str> {
    PHASE_LABELS.iter().map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_codes_map_in_any_case() {
        assert_eq!(normalize_phase("newmoon"), "New Moon");
        assert_eq!(normalize_phase("WaxingCrescent"), "Waxing Crescent");
        assert_eq!(normalize_phase("FIRSTQUARTER"), "First Quarter");
        assert_eq!(normalize_phase("waxinggibbous"), "Waxing Gibbous");
        assert_eq!(normalize_phase("FullMoon"), "Full Moon");
        assert_eq!(normalize_phase("waninggibbous"), "Waning Gibbous");
        assert_eq!(normalize_phase("LastQuarter"), "Last Quarter");
        assert_eq!(normalize_phase("waningcrescent"), "Waning Crescent");
    }

    #[test]
    fn unrecognized_code_passes_through() {
        assert_eq!(normalize_phase("bluemoon"), "bluemoon");
        assert_eq!(normalize_phase("Unknown Phase"), "Unknown Phase");
        assert_eq!(normalize_phase(""), "");
    }

    #[test]
    fn each_label_has_a_distinct_glyph() {
        let glyphs: HashSet<&str> = canonical_labels().map(phase_glyph).collect();
        assert_eq!(glyphs.len(), 8);
        assert!(!glyphs.contains(FALLBACK_GLYPH));
    }

    #[test]
    fn glyph_order_is_respected() {
        assert_eq!(phase_glyph("New Moon"), "🌑");
        assert_eq!(phase_glyph("Waxing Crescent"), "🌒");
        assert_eq!(phase_glyph("First Quarter"), "🌓");
        assert_eq!(phase_glyph("Waxing Gibbous"), "🌔");
        assert_eq!(phase_glyph("full moon"), "🌕");
        assert_eq!(phase_glyph("Waning Gibbous"), "🌖");
        assert_eq!(phase_glyph("LAST QUARTER"), "🌗");
        assert_eq!(phase_glyph("Waning Crescent"), "🌘");
    }

    #[test]
    fn unrecognized_label_uses_fallback() {
        assert_eq!(phase_glyph("Unknown Phase"), FALLBACK_GLYPH);
        assert_eq!(phase_glyph("bluemoon"), FALLBACK_GLYPH);
        assert_eq!(phase_glyph(""), FALLBACK_GLYPH);
    }
}
