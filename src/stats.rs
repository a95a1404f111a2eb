//! Trip statistics: rough distance/time/day estimates from the ordered stop
//! list. Estimates only; manual overrides on the trip always win.

use serde::Serialize;

use crate::model::{Coordinates, RoadCondition, TransportMode, Trip};

const EARTH_RADIUS_KM: f64 = 6371.0;
const TOURING_HOURS_PER_DAY: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStats {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub days: u32,
}

impl TripStats {
    pub fn compute(trip: &Trip) -> TripStats {
        let computed_distance = trip
            .stops
            .windows(2)
            .map(|leg| haversine_km(&leg[0].coordinates, &leg[1].coordinates))
            .sum();

        let distance_km = trip.distance_km.unwrap_or(computed_distance);
        let speed = base_speed_kmh(trip.transport_mode) * condition_factor(trip.road_condition);
        let duration_hours = trip.duration_hours.unwrap_or(distance_km / speed);

        let days = if trip.stops.is_empty() {
            0
        } else {
            ((duration_hours / TOURING_HOURS_PER_DAY).ceil() as u32).max(1)
        };

        TripStats {
            distance_km,
            duration_hours,
            days,
        }
    }
}

fn base_speed_kmh(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Car => 50.0,
        TransportMode::Motorbike => 45.0,
        TransportMode::Bus => 35.0,
        TransportMode::Walking => 4.5,
    }
}

fn condition_factor(condition: RoadCondition) -> f64 {
    match condition {
        RoadCondition::Good => 1.0,
        RoadCondition::Mixed => 0.75,
        RoadCondition::Rough => 0.5,
    }
}

fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
