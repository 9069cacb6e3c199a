//! Drought stress heuristics
//!
//! Stress index is a 0-10 score derived from rainfall deviation and
//! groundwater depth. Priority score scales stress by population and is
//! capped at 100. Both are pure and deterministic.

pub const MAX_STRESS_INDEX: f64 = 10.0;
pub const MAX_PRIORITY_SCORE: f64 = 100.0;

/// Stress added per millimeter of rainfall deficit
const RAIN_DEFICIT_WEIGHT: f64 = 0.05;
/// Stress added per meter of depth to the water table
const GROUNDWATER_DEPTH_WEIGHT: f64 = 0.1;
/// Population at which stress is doubled for priority purposes
const POPULATION_SCALE: f64 = 100_000.0;

/// Compute the stress index for a reading
///
/// Negative rainfall deviation (a deficit) contributes linearly; a surplus
/// contributes nothing. Groundwater contributes linearly with depth. The sum
/// is rounded to 2 decimals and capped at 10.
///
/// # Examples
///
/// ```
/// use drought_tanker_service::scoring::stress_index;
///
/// assert_eq!(stress_index(-80.0, 55.0), 9.5);
/// assert_eq!(stress_index(10.0, 5.0), 0.5);
/// ```
pub fn stress_index(rainfall_deviation_mm: f64, groundwater_level_m: f64) -> f64 {
    let rain_stress = (-rainfall_deviation_mm * RAIN_DEFICIT_WEIGHT).max(0.0);
    let groundwater_stress = (groundwater_level_m * GROUNDWATER_DEPTH_WEIGHT).max(0.0);

    round_to(rain_stress + groundwater_stress, 2).min(MAX_STRESS_INDEX)
}

/// Population-weighted triage priority for a stress index, capped at 100
pub fn priority_score(stress_index: f64, population: i32) -> f64 {
    let weight = 1.0 + f64::from(population) / POPULATION_SCALE;
    round_to(stress_index * weight, 2).min(MAX_PRIORITY_SCORE)
}

/// Round half away from zero to `decimals` places, normalizing -0.0 to 0.0
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
