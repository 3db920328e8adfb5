//! EPA-style Air Quality Index from pollutant concentrations.
//!
//! Each supported pollutant has a breakpoint table: concentration bands mapped
//! onto AQI bands. A concentration is scored by linear interpolation inside the
//! first band that contains it. Anything outside every band has no AQI.
//!
//! Tables carry no unit information. PM2.5 bands are in µg/m³ and NO₂ bands in
//! ppb; callers must supply concentrations in those units.

use std::fmt;

use crate::analyzers::utility::round1;

/// One row of a breakpoint table. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub aqi_low: f64,
    pub aqi_high: f64,
}

impl Breakpoint {
    const fn new(c_low: f64, c_high: f64, aqi_low: f64, aqi_high: f64) -> Self {
        Self {
            c_low,
            c_high,
            aqi_low,
            aqi_high,
        }
    }

    pub fn contains(&self, concentration: f64) -> bool {
        self.c_low <= concentration && concentration <= self.c_high
    }

    pub fn interpolate(&self, concentration: f64) -> f64 {
        self.aqi_low
            + (self.aqi_high - self.aqi_low) / (self.c_high - self.c_low)
                * (concentration - self.c_low)
    }
}

/// PM2.5, 24-hour, µg/m³.
static PM25_BREAKPOINTS: &[Breakpoint] = &[
    Breakpoint::new(0.0, 12.0, 0.0, 50.0),
    Breakpoint::new(12.1, 35.4, 51.0, 100.0),
    Breakpoint::new(35.5, 55.4, 101.0, 150.0),
    Breakpoint::new(55.5, 150.4, 151.0, 200.0),
    Breakpoint::new(150.5, 250.4, 201.0, 300.0),
    Breakpoint::new(250.5, 350.4, 301.0, 400.0),
    Breakpoint::new(350.5, 500.4, 401.0, 500.0),
];

/// NO₂, 1-hour, ppb.
static NO2_BREAKPOINTS: &[Breakpoint] = &[
    Breakpoint::new(0.0, 53.0, 0.0, 50.0),
    Breakpoint::new(54.0, 100.0, 51.0, 100.0),
    Breakpoint::new(101.0, 360.0, 101.0, 150.0),
    Breakpoint::new(361.0, 649.0, 151.0, 200.0),
    Breakpoint::new(650.0, 1249.0, 201.0, 300.0),
    Breakpoint::new(1250.0, 1649.0, 301.0, 400.0),
    Breakpoint::new(1650.0, 2049.0, 401.0, 500.0),
];

/// Pollutants with a breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pollutant {
    Pm25,
    No2,
}

impl Pollutant {
    /// Matches an OpenAQ parameter name, ignoring ASCII case.
    pub fn from_parameter(parameter: &str) -> Option<Self> {
        let parameter = parameter.trim();
        if parameter.eq_ignore_ascii_case("pm25") {
            Some(Pollutant::Pm25)
        } else if parameter.eq_ignore_ascii_case("no2") {
            Some(Pollutant::No2)
        } else {
            None
        }
    }

    pub fn breakpoints(self) -> &'static [Breakpoint] {
        match self {
            Pollutant::Pm25 => PM25_BREAKPOINTS,
            Pollutant::No2 => NO2_BREAKPOINTS,
        }
    }
}

/// Computes the AQI for `concentration` of `parameter`, rounded to one decimal.
///
/// Returns `None` when the pollutant has no table or the concentration falls
/// outside every band (negative, above the top band, or in the gap between
/// two bands). Where bands share an endpoint the earlier band wins.
pub fn calculate_aqi(parameter: &str, concentration: f64) -> Option<f64> {
    let pollutant = Pollutant::from_parameter(parameter)?;

    pollutant
        .breakpoints()
        .iter()
        .find(|bp| bp.contains(concentration))
        .map(|bp| round1(bp.interpolate(concentration)))
}

/// EPA health category for an AQI score.
///
/// | AQI       | Category                       |
/// |-----------|--------------------------------|
/// | <= 50     | Good                           |
/// | <= 100    | Moderate                       |
/// | <= 150    | Unhealthy for Sensitive Groups |
/// | <= 200    | Unhealthy                      |
/// | <= 300    | Very Unhealthy                 |
/// | > 300     | Hazardous                      |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_aqi(aqi: f64) -> Self {
        match aqi {
            a if a <= 50.0 => AqiCategory::Good,
            a if a <= 100.0 => AqiCategory::Moderate,
            a if a <= 150.0 => AqiCategory::UnhealthyForSensitiveGroups,
            a if a <= 200.0 => AqiCategory::Unhealthy,
            a if a <= 300.0 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm25_within_moderate_band() {
        let aqi = calculate_aqi("pm25", 25.0).unwrap();
        assert!((51.0..=100.0).contains(&aqi));
        assert_eq!(aqi, 78.1);
    }

    #[test]
    fn test_no2_within_sensitive_band() {
        let aqi = calculate_aqi("no2", 120.0).unwrap();
        assert!((101.0..=150.0).contains(&aqi));
        assert_eq!(aqi, 104.6);
    }

    #[test]
    fn test_unsupported_pollutant_has_no_aqi() {
        assert_eq!(calculate_aqi("o3", 40.0), None);
        assert_eq!(calculate_aqi("co", 1.0), None);
        assert_eq!(calculate_aqi("", 1.0), None);
    }

    #[test]
    fn test_out_of_domain_has_no_aqi() {
        assert_eq!(calculate_aqi("pm25", -5.0), None);
        assert_eq!(calculate_aqi("pm25", 600.0), None);
        assert_eq!(calculate_aqi("no2", -0.1), None);
        assert_eq!(calculate_aqi("no2", 2049.5), None);
        assert_eq!(calculate_aqi("pm25", f64::NAN), None);
    }

    #[test]
    fn test_parameter_is_case_insensitive() {
        assert_eq!(calculate_aqi("PM25", 25.0), calculate_aqi("pm25", 25.0));
        assert_eq!(calculate_aqi("No2", 120.0), calculate_aqi("no2", 120.0));
    }

    #[test]
    fn test_table_endpoints() {
        assert_eq!(calculate_aqi("pm25", 0.0), Some(0.0));
        assert_eq!(calculate_aqi("pm25", 12.0), Some(50.0));
        assert_eq!(calculate_aqi("pm25", 12.1), Some(51.0));
        assert_eq!(calculate_aqi("pm25", 500.4), Some(500.0));
        assert_eq!(calculate_aqi("no2", 53.0), Some(50.0));
        assert_eq!(calculate_aqi("no2", 54.0), Some(51.0));
        assert_eq!(calculate_aqi("no2", 2049.0), Some(500.0));
    }

    #[test]
    fn test_values_between_bands_have_no_aqi() {
        // Published bands leave gaps; those concentrations stay unscored.
        assert_eq!(calculate_aqi("pm25", 12.05), None);
        assert_eq!(calculate_aqi("pm25", 35.45), None);
        assert_eq!(calculate_aqi("no2", 53.5), None);
    }

    #[test]
    fn test_tables_are_ordered_and_disjoint() {
        for pollutant in [Pollutant::Pm25, Pollutant::No2] {
            let table = pollutant.breakpoints();
            for pair in table.windows(2) {
                assert!(pair[0].c_high < pair[1].c_low);
                assert!(pair[0].aqi_high < pair[1].aqi_low);
            }
            assert_eq!(table.first().unwrap().c_low, 0.0);
            assert_eq!(table.last().unwrap().aqi_high, 500.0);
        }
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(AqiCategory::from_aqi(0.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(51.0), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(100.0), AqiCategory::Moderate);
        assert_eq!(
            AqiCategory::from_aqi(101.0),
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(AqiCategory::from_aqi(200.0), AqiCategory::Unhealthy);
        assert_eq!(AqiCategory::from_aqi(300.0), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_aqi(301.0), AqiCategory::Hazardous);
        assert_eq!(AqiCategory::from_aqi(78.1).to_string(), "Moderate");
    }
}
