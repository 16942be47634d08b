use crate::constants::MIN_GOOD_DESCRIPTION_CHARS;
use crate::models::Stop;
use crate::services::route_planner::candidate_filter::is_generic_label;
use regex::Regex;
use std::sync::LazyLock;

/// House numbers, Russian and English street abbreviations and street or
/// administrative words.
static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,4}\b|\b(?:ул|пр-т|пл|пер|ш|наб|пр-д|кв|д|стр)\.|\b(?:улица|проспект|площадь|переулок|шоссе|набережная|проезд|квартира|дом|строение|область|район)\b|\b(?:street|st|avenue|ave|boulevard|blvd|square|sq|road|rd|lane|ln|highway|hwy|embankment|quay|oblast|district)\b",
    )
    .expect("valid address regex")
});

/// Country and city names that only show up in postal-style text.
const ADDRESS_PLACE_WORDS: &[&str] = &[
    "россия",
    "российская федерация",
    "нижний новгород",
    "нижегородская область",
    "russia",
];

const MIN_DESCRIPTION_CHARS: usize = 6;
const MAX_DIGITS: usize = 4;

/// True when `text` reads like a postal address rather than a description.
pub fn is_address_like(text: &str) -> bool {
    let t = text.trim();
    if t.chars().count() < MIN_DESCRIPTION_CHARS {
        return true;
    }
    if ADDRESS_PATTERN.is_match(t) {
        return true;
    }
    let lower = t.to_lowercase();
    if ADDRESS_PLACE_WORDS.iter().any(|w| lower.contains(w)) {
        return true;
    }
    t.chars().filter(char::is_ascii_digit).count() >= MAX_DIGITS
}

/// A stop needs a new description when its name is generic or its current
/// description is missing, short or just an address.
pub fn needs_enrichment(stop: &Stop) -> bool {
    if is_generic_label(&stop.name) {
        return true;
    }
    let description = stop.description.trim();
    description.chars().count() < MIN_GOOD_DESCRIPTION_CHARS || is_address_like(description)
}
