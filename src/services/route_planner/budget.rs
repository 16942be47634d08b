use crate::models::distance::{leg_distances_km, round_km, travel_minutes};
use crate::models::{Coordinates, Stop, TransportMode};

/// Outcome of spreading a time budget over the stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetAllocation {
    pub travel_min: u32,
    pub stay_min: u32,
    pub eta_min: u32,
}

/// Set every stop's `leg_min` from straight-line distance and return the
/// route length in kilometers, rounded to one decimal.
pub fn assign_legs(start: &Coordinates, stops: &mut [Stop], mode: TransportMode) -> f64 {
    let legs = leg_distances_km(start, stops.iter().map(|s| &s.coordinates));
    for (stop, km) in stops.iter_mut().zip(&legs) {
        stop.leg_min = travel_minutes(*km, mode);
    }
    round_km(legs.iter().sum())
}

/// Distribute the dwell budget across the stops.
///
/// Every stop gets `base_dwell_min`. Whatever is left of `target_minutes`
/// after travel and base dwell is split evenly, with the remainder going one
/// minute at a time to the earliest stops. When travel plus base dwell
/// already exceeds the target, stops keep the base dwell and the ETA
/// overshoots. A route with no stops is left untouched.
pub fn allocate(stops: &mut [Stop], target_minutes: u32, base_dwell_min: u32) -> BudgetAllocation {
    let travel_min: u32 = stops.iter().map(|s| s.leg_min).sum();
    if stops.is_empty() {
        return BudgetAllocation {
            travel_min,
            stay_min: 0,
            eta_min: travel_min,
        };
    }

    let count = stops.len() as u32;
    let committed = travel_min + base_dwell_min * count;
    let slack = target_minutes.saturating_sub(committed);
    let per_stop = slack / count;
    let remainder = (slack % count) as usize;

    for (i, stop) in stops.iter_mut().enumerate() {
        stop.stay_min = base_dwell_min + per_stop + u32::from(i < remainder);
    }

    let stay_min: u32 = stops.iter().map(|s| s.stay_min).sum();
    BudgetAllocation {
        travel_min,
        stay_min,
        eta_min: travel_min + stay_min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops_with_legs(legs: &[u32]) -> Vec<Stop> {
        legs.iter()
            .enumerate()
            .map(|(i, &leg)| {
                let mut stop = Stop::new(
                    format!("Stop {}", i),
                    "",
                    Coordinates::new(56.0 + i as f64 * 0.01, 44.0).unwrap(),
                );
                stop.leg_min = leg;
                stop
            })
            .collect()
    }

    #[test]
    fn test_allocation_hits_target_exactly() {
        // 20 travel + 3 * 10 base = 50, 70 slack over 3 stops -> 23, 23, 23 + 1 left
        let mut stops = stops_with_legs(&[5, 7, 8]);
        let allocation = allocate(&mut stops, 120, 10);

        let stays: Vec<u32> = stops.iter().map(|s| s.stay_min).collect();
        assert_eq!(stays, vec![34, 33, 33]);
        assert_eq!(allocation.travel_min, 20);
        assert_eq!(allocation.stay_min, 100);
        assert_eq!(allocation.eta_min, 120);
    }

    #[test]
    fn test_remainder_goes_to_earliest_stops() {
        let mut stops = stops_with_legs(&[0, 0, 0, 0]);
        // 40 base, 3 slack over 4 stops
        allocate(&mut stops, 43, 10);
        let stays: Vec<u32> = stops.iter().map(|s| s.stay_min).collect();
        assert_eq!(stays, vec![11, 11, 11, 10]);
    }

    #[test]
    fn test_overshoot_keeps_base_dwell() {
        let mut stops = stops_with_legs(&[40, 50]);
        let allocation = allocate(&mut stops, 60, 10);

        assert!(stops.iter().all(|s| s.stay_min == 10));
        assert_eq!(allocation.eta_min, 110);
        assert!(allocation.eta_min > 60);
    }

    #[test]
    fn test_empty_route_is_noop() {
        let mut stops: Vec<Stop> = Vec::new();
        let allocation = allocate(&mut stops, 120, 10);
        assert_eq!(
            allocation,
            BudgetAllocation {
                travel_min: 0,
                stay_min: 0,
                eta_min: 0
            }
        );
    }

    #[test]
    fn test_assign_legs_matches_distance_estimates() {
        let start = Coordinates::new(56.0, 44.0).unwrap();
        let mut stops = stops_with_legs(&[0, 0, 0]);

        let total_km = assign_legs(&start, &mut stops, TransportMode::Walk);

        // The first stop sits on the start point
        assert_eq!(stops[0].leg_min, 0);
        // 0.01 degrees of latitude is about 1.11 km, 15 minutes on foot
        assert_eq!(stops[1].leg_min, 15);
        assert_eq!(stops[2].leg_min, 15);
        assert_eq!(total_km, 2.2);
    }
}
