use serde::{Deserialize, Serialize};

/// Glyph separating rating from review count in a product score line.
pub const DEFAULT_SCORE_SEPARATOR: char = '•';

/// Upper bound of a plausible product rating.
pub const MAX_RATING: f32 = 5.0;

const CURRENCY_MARKERS: &[&str] = &["₽", "руб.", "руб", "р.", "$", "€"];

/// Rating and review count read from one combined score line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreLine {
    pub rating: Option<f32>,
    pub reviews_count: Option<u32>,
}

/// Parse a displayed price such as `"1 234 ₽"` into whole currency units.
///
/// Thousands separators anywhere and currency markers at either end are
/// removed; whatever remains must be all digits, otherwise the price is
/// absent (`"12₽34"` does not parse).
pub fn parse_price(text: &str) -> Option<u64> {
    let compact: String = text.chars().filter(|c| !is_thousands_separator(*c)).collect();
    let mut rest = compact.as_str();
    loop {
        let before = rest.len();
        for marker in CURRENCY_MARKERS {
            rest = rest.trim_start_matches(marker).trim_end_matches(marker);
        }
        if rest.len() == before {
            break;
        }
    }
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Split a score line like `"4.8 • 1 234 отзыва"` into rating and reviews.
///
/// The line must split into exactly two parts on `separator`, otherwise both
/// fields are absent. A rating outside `0.0..=MAX_RATING` is treated as absent.
pub fn parse_score_line(text: &str, separator: char) -> ScoreLine {
    let parts: Vec<&str> = text.split(separator).collect();
    let [rating_part, reviews_part] = parts.as_slice() else {
        return ScoreLine::default();
    };

    let rating = rating_part
        .trim()
        .replace(',', ".")
        .parse::<f32>()
        .ok()
        .filter(|r| r.is_finite() && (0.0..=MAX_RATING).contains(r));

    let digits: String = reviews_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let reviews_count = digits.parse::<u32>().ok();

    ScoreLine {
        rating,
        reviews_count,
    }
}

fn is_thousands_separator(c: char) -> bool {
    matches!(c, ' ' | '\u{00A0}' | '\u{2009}' | '\u{202F}' | '\t')
}
