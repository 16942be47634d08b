use crate::models::Poi;

/// Names that are only an administrative area, never an attraction.
const GENERIC_EXACT: &[&str] = &[
    "russia",
    "россия",
    "russian federation",
    "российская федерация",
    "nizhny novgorod",
    "нижний новгород",
    "nizhny novgorod oblast",
    "нижегородская область",
];

/// Suffixes that mark "<anything>, <country/region>" boundary labels.
const GENERIC_SUFFIXES: &[&str] = &[
    " russia",
    ",russia",
    " россия",
    ",россия",
    "russian federation",
    "российская федерация",
    "nizhny novgorod oblast",
    "нижегородская область",
];

/// True when `name` is a country, region or bare city label (or blank).
///
/// Geocoders and POI queries occasionally return the boundary node of the
/// search area itself; such entries must never become stops.
pub fn is_generic_label(name: &str) -> bool {
    let n = name.trim().to_lowercase();
    if n.is_empty() {
        return true;
    }
    GENERIC_EXACT.contains(&n.as_str()) || GENERIC_SUFFIXES.iter().any(|s| n.ends_with(s))
}

/// Drop candidates whose resolved name is a generic label.
///
/// If that would remove every candidate the input is returned untouched, so
/// a non-empty candidate list never turns into an empty one.
pub fn filter_generic(pois: Vec<Poi>) -> Vec<Poi> {
    let total = pois.len();
    let kept: Vec<Poi> = pois
        .iter()
        .filter(|poi| !is_generic_label(poi.resolved_name().unwrap_or_default()))
        .cloned()
        .collect();

    if kept.is_empty() {
        if total > 0 {
            tracing::warn!(
                candidates = total,
                "All {} candidates look generic, keeping the unfiltered list",
                total
            );
        }
        return pois;
    }

    if kept.len() < total {
        tracing::debug!(
            removed = total - kept.len(),
            kept = kept.len(),
            "Removed {} generic-label candidates",
            total - kept.len()
        );
    }
    kept
}
