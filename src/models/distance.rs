//! Straight-line distance and travel-time estimates.
//!
//! Haversine distance is only a proxy for the street network: a leg's
//! minutes are the great-circle distance divided by the nominal speed of the
//! transport mode.

use crate::models::{Coordinates, TransportMode};

/// Great-circle distance in kilometers.
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    a.distance_to(b)
}

/// Whole minutes needed to cover `distance_km` at the mode's nominal speed.
pub fn travel_minutes(distance_km: f64, mode: TransportMode) -> u32 {
    (distance_km.max(0.0) / mode.speed_kmh() * 60.0).round() as u32
}

/// Round a kilometer figure to one decimal place for summaries.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Per-leg distances of the open path `start -> points[0] -> points[1] -> ...`.
pub fn leg_distances_km<'a>(
    start: &Coordinates,
    points: impl IntoIterator<Item = &'a Coordinates>,
) -> Vec<f64> {
    let mut prev = *start;
    points
        .into_iter()
        .map(|point| {
            let leg = distance_km(&prev, point);
            prev = *point;
            leg
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_minutes_walk() {
        // 4.5 km at 4.5 km/h
        assert_eq!(travel_minutes(4.5, TransportMode::Walk), 60);
        // 1 km walking = 13.33 min
        assert_eq!(travel_minutes(1.0, TransportMode::Walk), 13);
        assert_eq!(travel_minutes(0.0, TransportMode::Car), 0);
    }

    #[test]
    fn test_travel_minutes_faster_modes() {
        assert_eq!(travel_minutes(10.0, TransportMode::Car), 15);
        assert_eq!(travel_minutes(5.0, TransportMode::Transit), 12);
        assert_eq!(travel_minutes(7.0, TransportMode::Bike), 30);
        assert_eq!(travel_minutes(3.0, TransportMode::Scooter), 10);
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(1.26), 1.3);
        assert_eq!(round_km(1.24), 1.2);
        assert_eq!(round_km(0.0), 0.0);
    }

    #[test]
    fn test_leg_distances() {
        let start = Coordinates::new(56.3269, 44.0059).unwrap();
        let a = Coordinates::new(56.3287, 44.0020).unwrap();
        let b = Coordinates::new(56.3302, 44.0090).unwrap();

        let legs = leg_distances_km(&start, [&a, &b]);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0], distance_km(&start, &a));
        assert_eq!(legs[1], distance_km(&a, &b));

        assert!(leg_distances_km(&start, Vec::<&Coordinates>::new()).is_empty());
    }
}
