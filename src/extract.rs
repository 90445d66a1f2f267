use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ExtractedFields;

static TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<title>(.*?)</title>").expect("valid title regex"));
// Product data is embedded as escaped JSON inside a script string, hence the `\"`.
static PRICE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""current_retail\\":(.*?),"#).expect("valid price regex"));
static DESCRIPTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""downstream_description\\":\\"(.*?)\\"#).expect("valid description regex")
});

/// Applies the name, price and description patterns independently.
/// A pattern that does not match leaves its field empty.
pub fn extract(page: &str) -> ExtractedFields {
    ExtractedFields {
        name: extract_name(page),
        price: extract_price(page),
        description: extract_description(page),
    }
}

fn extract_name(page: &str) -> Option<String> {
    first_capture(&TITLE_REGEX, page)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn extract_price(page: &str) -> Option<f64> {
    first_capture(&PRICE_REGEX, page)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|price| price.is_finite() && *price >= 0.0)
}

fn extract_description(page: &str) -> Option<String> {
    first_capture(&DESCRIPTION_REGEX, page)
        .filter(|desc| !desc.is_empty())
        .map(str::to_string)
}

fn first_capture<'a>(regex: &Regex, text: &'a str) -> Option<&'a str> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
