/// Mean Earth radius used by the great-circle calculation, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two coordinates given in degrees
///
/// Uses the haversine formula. Coordinates are expected to be valid degree
/// values (latitude in [-90, 90], longitude in [-180, 180]); range checking
/// happens at the API boundary, not here.
///
/// # Examples
///
/// ```
/// use drought_tanker_service::geo::haversine_km;
///
/// assert_eq!(haversine_km(18.52, 73.86, 18.52, 73.86), 0.0);
///
/// let pune_to_karjat = haversine_km(18.5204, 73.8567, 18.9102, 73.3283);
/// assert!((pune_to_karjat - 70.0).abs() < 5.0);
/// ```
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
