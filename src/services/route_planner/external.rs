use crate::constants::COORDINATE_MATCH_DECIMALS;
use crate::models::{Poi, Stop};
use crate::services::optimizer::OptimizedStep;
use crate::services::route_planner::candidate_filter::is_generic_label;
use std::collections::{HashMap, HashSet};

/// Turn optimizer steps into stops, in the optimizer's order.
///
/// Each step is matched back to a selected candidate by its coordinates
/// rounded to 6 decimals, so missing names and descriptions can be filled
/// from the candidate. Steps whose final name is a generic label are dropped,
/// as are repeats of an already placed point.
pub fn reattach_steps(steps: &[OptimizedStep], candidates: &[Poi]) -> Vec<Stop> {
    let by_position: HashMap<(i64, i64), &Poi> = candidates
        .iter()
        .map(|poi| (poi.coordinates.grid_key(COORDINATE_MATCH_DECIMALS), poi))
        .collect();

    let mut placed = HashSet::new();
    let mut stops = Vec::with_capacity(steps.len());

    for (i, step) in steps.iter().enumerate() {
        let key = step.coordinates.grid_key(COORDINATE_MATCH_DECIMALS);
        if placed.contains(&key) {
            tracing::debug!(step = i, "Skipping repeated optimizer step");
            continue;
        }
        let candidate = by_position.get(&key).copied();

        let name = non_blank(step.name.as_deref())
            .or_else(|| candidate.and_then(Poi::resolved_name))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Stop {}", i + 1));

        if is_generic_label(&name) {
            tracing::debug!(step = i, name = %name, "Dropping generic optimizer step");
            continue;
        }

        let description = non_blank(step.description.as_deref())
            .map(str::to_string)
            .or_else(|| candidate.map(|poi| poi.description.clone()))
            .unwrap_or_default();

        placed.insert(key);
        let mut stop = Stop::new(name, description, step.coordinates);
        stop.category = candidate.and_then(|poi| poi.category.clone());
        stops.push(stop);
    }

    stops
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
