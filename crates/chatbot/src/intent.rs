//! Filters inferred from free-text questions ("fantasy for 12+ under $15").
//!
//! Inference only fills what the client left empty: age first, then price,
//! then category. A number next to an age word is never read as a price
//! unless the message also mentions money.

use crate::filters::ChatFilters;
use once_cell::sync::Lazy;
use regex::Regex;

static AGE_RANGE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:ages?\s*)?(\d{1,2})\s*(?:to|and|-)\s*(\d{1,2})\s*(?:years?\s*old|years?|yrs?)\b").ok()
});
static AGE_PLUS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?:age\s*)?(\d{1,2})\s*\+").ok());
static AGE_EXACT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"age\s*(\d{1,2})\b").ok());
static AGE_DASH: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\d{1,2})\s*-\s*(\d{1,2})").ok());

static CURRENCY_HINT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(\$|usd|dollar|dollars|price|cost|budget)").ok());
static AGE_HINT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)(years?\s*old|years?|yrs?|age)\b").ok());

static PRICE_BETWEEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)between\s*\$?(\d+(?:\.\d+)?)\s*(?:and|to)\s*\$?(\d+(?:\.\d+)?)").ok()
});
static PRICE_MAX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(?:under|below|max(?:imum)?|<=)\s*\$?(\d+(?:\.\d+)?)").ok());
static PRICE_MIN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(?:over|above|upper|min(?:imum)?|>=)\s*\$?(\d+(?:\.\d+)?)").ok());
static PRICE_AROUND: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(?:budget|around)\s*\$?(\d+(?:\.\d+)?)").ok());

/// Keyword → category, first hit wins
const CATEGORY_KEYWORDS: &[(&[&str], &str)] = &[
    (&["finance"], "Finance"),
    (&["fiction"], "Fiction"),
    (&["fantasy"], "Fantasy"),
    (&["romance", "love story"], "Romance"),
    (&["thriller", "mystery"], "Thriller"),
    (&["memoir", "autobiography"], "Memoir"),
    (&["historical", "history"], "Historical"),
    (&["adventure"], "Adventure"),
    (&["sociology", "society"], "Sociology"),
    (&["satire", "political satire"], "Political Satire"),
];

fn matches(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Capture groups 1.. of the first match, as strings
fn captures<'t>(re: &Lazy<Option<Regex>>, text: &'t str) -> Option<(&'t str, Vec<&'t str>)> {
    let caps = re.as_ref()?.captures(text)?;
    let whole = caps.get(0)?.as_str();
    let groups = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
    Some((whole, groups))
}

/// Inclusive reading-age range from "14 to 16 years old", "ages 7-10 yrs"
pub fn parse_reading_age_range(lower: &str) -> Option<(i32, i32)> {
    let (_, groups) = captures(&AGE_RANGE, lower)?;
    let a: i32 = groups.first()?.parse().ok()?;
    let b: i32 = groups.get(1)?.parse().ok()?;
    Some((a.min(b), a.max(b)))
}

/// Single reading age: "12+", "age 12", "7-10" (upper bound), or an
/// audience word
pub fn parse_reading_age(lower: &str) -> Option<i32> {
    for re in [&AGE_PLUS, &AGE_EXACT] {
        if let Some((_, groups)) = captures(re, lower) {
            return groups.first()?.parse().ok();
        }
    }
    if let Some((_, groups)) = captures(&AGE_DASH, lower) {
        return groups.get(1)?.parse().ok();
    }

    if lower.contains("kids") || lower.contains("children") {
        Some(10)
    } else if lower.contains("teen") || lower.contains("young adult") {
        Some(16)
    } else if lower.contains("adult") {
        Some(18)
    } else {
        None
    }
}

fn talks_about_money(lower: &str) -> bool {
    matches(&CURRENCY_HINT, lower)
}

fn talks_about_age(lower: &str) -> bool {
    matches(&AGE_HINT, lower)
}

/// `(min, max)` USD bounds. Bare numbers count only when the message has a
/// currency hint or the match itself carries a `$`.
pub fn parse_price_usd(lower: &str) -> (Option<f64>, Option<f64>) {
    let currency = talks_about_money(lower);
    if talks_about_age(lower) && !currency {
        return (None, None);
    }

    let accepted = |re: &Lazy<Option<Regex>>| -> Option<Vec<f64>> {
        let (whole, groups) = captures(re, lower)?;
        if !(currency || whole.contains('$')) {
            return None;
        }
        groups.iter().map(|g| g.parse::<f64>().ok()).collect()
    };

    if let Some(bounds) = accepted(&PRICE_BETWEEN) {
        if let [min, max] = bounds[..] {
            return (Some(min), Some(max));
        }
    }

    let max = accepted(&PRICE_MAX).and_then(|v| v.first().copied());
    let min = accepted(&PRICE_MIN).and_then(|v| v.first().copied());
    if min.is_none() && max.is_none() {
        let around = accepted(&PRICE_AROUND).and_then(|v| v.first().copied());
        return (None, around);
    }
    (min, max)
}

pub fn parse_category(lower: &str) -> Option<&'static str> {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, category)| *category)
}

/// Fill the filters the client did not send from the message text
pub fn infer(message: &str, mut filters: ChatFilters) -> ChatFilters {
    let lower = message.to_lowercase();

    if !filters.has_age() {
        if let Some((min, max)) = parse_reading_age_range(&lower) {
            filters.min_reading_age = Some(min);
            filters.max_reading_age = Some(max);
        } else if let Some(age) = parse_reading_age(&lower) {
            filters.reading_age = Some(age);
        }
    }

    if !filters.has_price() {
        let (min, max) = parse_price_usd(&lower);
        filters.min_price = min;
        filters.max_price = max;
    }

    if filters.category.is_none() {
        filters.category = parse_category(&lower).map(str::to_string);
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_range_prefers_explicit_years() {
        assert_eq!(parse_reading_age_range("for my son, 14 to 16 years old"), Some((14, 16)));
        assert_eq!(parse_reading_age_range("ages 10-8 yrs"), Some((8, 10)));
        assert_eq!(parse_reading_age_range("7-10"), None);
    }

    #[test]
    fn test_single_age_forms() {
        assert_eq!(parse_reading_age("books for 12+"), Some(12));
        assert_eq!(parse_reading_age("something for age 9"), Some(9));
        assert_eq!(parse_reading_age("grade 7-10 reading"), Some(10));
        assert_eq!(parse_reading_age("stories for kids"), Some(10));
        assert_eq!(parse_reading_age("a young adult novel"), Some(16));
        assert_eq!(parse_reading_age("adult thriller"), Some(18));
        assert_eq!(parse_reading_age("anything by tolkien"), None);
    }

    #[test]
    fn test_price_forms() {
        assert_eq!(parse_price_usd("between $5 and $20"), (Some(5.0), Some(20.0)));
        assert_eq!(parse_price_usd("something under $15.50"), (None, Some(15.5)));
        assert_eq!(parse_price_usd("price above 30"), (Some(30.0), None));
        assert_eq!(parse_price_usd("over $10 but below $25"), (Some(10.0), Some(25.0)));
        assert_eq!(parse_price_usd("my budget 12"), (None, Some(12.0)));
    }

    #[test]
    fn test_bare_numbers_need_a_currency_hint() {
        assert_eq!(parse_price_usd("under 20 pages please"), (None, None));
        assert_eq!(parse_price_usd("around 14 to 16 years old"), (None, None));
    }

    #[test]
    fn test_age_words_block_price_without_money() {
        let filters = infer("a book for age 12 under 20", ChatFilters::default());
        assert_eq!(filters.reading_age, Some(12));
        assert!(!filters.has_price());
    }

    #[test]
    fn test_infer_fills_only_missing_filters() {
        let given = ChatFilters {
            max_price: Some(8.0),
            category: Some("Memoir".to_string()),
            ..ChatFilters::default()
        };
        let filters = infer("fantasy books between $10 and $30 for teens", given);
        assert_eq!(filters.max_price, Some(8.0));
        assert!(filters.min_price.is_none());
        assert_eq!(filters.category.as_deref(), Some("Memoir"));
        assert_eq!(filters.reading_age, Some(16));
    }

    #[test]
    fn test_category_table_order() {
        assert_eq!(parse_category("science fiction and fantasy"), Some("Fiction"));
        assert_eq!(parse_category("a love story"), Some("Romance"));
        assert_eq!(parse_category("political satire"), Some("Political Satire"));
        assert_eq!(parse_category("cooking"), None);
    }

    #[test]
    fn test_infer_from_plain_question() {
        let filters = infer("Any mystery under $12 for 14 to 16 years old?", ChatFilters::default());
        assert_eq!((filters.min_reading_age, filters.max_reading_age), (Some(14), Some(16)));
        assert_eq!(filters.max_price, Some(12.0));
        assert_eq!(filters.category.as_deref(), Some("Thriller"));
    }
}
