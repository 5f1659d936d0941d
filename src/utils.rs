//! Utility functions

/// Calculate distance between two coordinates using Haversine formula
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let rlat1 = lat1.to_radians();
    let rlat2 = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + rlat1.cos() * rlat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    6371.0 * c
}

/// Eight-point compass direction for an azimuth in degrees (0 = north)
pub fn compass_direction(azimuth: f64) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = (azimuth / 45.0).round() as i64;
    DIRECTIONS[index.rem_euclid(8) as usize]
}

/// Cache key for a location, rounded to `precision` decimal places
pub fn coordinate_key(lat: f64, lon: f64, precision: usize) -> String {
    let normalize = |v: f64| {
        let s = format!("{:.*}", precision, v);
        // "-0.00" and "0.00" are the same place
        if s.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
            s.trim_start_matches('-').to_string()
        } else {
            s
        }
    };
    format!("{},{}", normalize(lat), normalize(lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_km_zero_distance() {
        let distance = haversine_km(0.0, 0.0, 0.0, 0.0);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_haversine_km_known_distance() {
        // London to Paris is roughly 344 km
        let distance = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((distance - 344.0).abs() < 10.0);
    }

    #[test]
    fn test_compass_direction() {
        assert_eq!(compass_direction(0.0), "N");
        assert_eq!(compass_direction(44.0), "NE");
        assert_eq!(compass_direction(200.0), "S");
        assert_eq!(compass_direction(350.0), "N");
        assert_eq!(compass_direction(-90.0), "W");
    }

    #[test]
    fn test_coordinate_key_rounds() {
        assert_eq!(coordinate_key(40.71278, -74.00594, 2), "40.71,-74.01");
        assert_eq!(coordinate_key(40.7149, -74.0051, 2), "40.71,-74.01");
        assert_eq!(coordinate_key(-0.001, 0.0, 2), "0.00,0.00");
    }
}
