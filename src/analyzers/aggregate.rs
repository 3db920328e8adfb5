//! Grouping of cleaned measurements into daily per-pollutant means with AQI.

use crate::analyzers::aqi::calculate_aqi;
use crate::analyzers::types::{CleanedMeasurement, DailyAggregate};
use crate::analyzers::utility::mean;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Grouping key. Field order doubles as the output sort order:
/// date, then parameter, then the remaining key columns as a tie-break.
type DailyKey = (NaiveDate, String, String, String, String);

/// Groups measurements into one [`DailyAggregate`] per
/// (city, country, parameter, unit, date) and scores each mean.
///
/// Rows missing city, country or unit cannot be keyed and are skipped.
/// Output is sorted by date, then parameter. The same input always gives
/// the same output in the same order.
pub fn aggregate_daily(measurements: &[CleanedMeasurement]) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<DailyKey, Vec<f64>> = BTreeMap::new();
    let mut unkeyed = 0usize;

    for m in measurements {
        let (Some(city), Some(country), Some(unit)) = (&m.city, &m.country, &m.unit) else {
            unkeyed += 1;
            continue;
        };

        groups
            .entry((
                m.date,
                m.parameter.clone(),
                city.clone(),
                country.clone(),
                unit.clone(),
            ))
            .or_default()
            .push(m.value);
    }

    if unkeyed > 0 {
        debug!(unkeyed, "Skipped measurements without city, country or unit");
    }

    let aggregates: Vec<DailyAggregate> = groups
        .into_iter()
        .map(|((date, parameter, city, country, unit), values)| {
            let value = mean(&values);
            let aqi = calculate_aqi(&parameter, value);
            DailyAggregate {
                city,
                country,
                parameter,
                unit,
                date,
                value,
                aqi,
            }
        })
        .collect();

    info!(
        "Cleaned {} records -> {} daily averages",
        measurements.len(),
        aggregates.len()
    );

    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, day, hour, 0, 0).unwrap()
    }

    fn reading(parameter: &str, value: f64, day: u32, hour: u32) -> CleanedMeasurement {
        CleanedMeasurement::new(parameter, value, at(day, hour))
            .with_location("Charlotte", "US")
            .with_unit("µg/m³")
    }

    #[test]
    fn test_mean_of_same_day_readings() {
        let rows = vec![
            reading("pm25", 12.5, 25, 0),
            reading("pm25", 15.0, 25, 1),
            reading("no2", 8.0, 25, 0),
        ];

        let out = aggregate_daily(&rows);

        assert_eq!(out.len(), 2);
        let pm25 = out.iter().find(|a| a.parameter == "pm25").unwrap();
        assert_eq!(pm25.value, 13.75);
        assert_eq!(pm25.aqi, calculate_aqi("pm25", 13.75));
        assert_eq!(pm25.date, NaiveDate::from_ymd_opt(2025, 10, 25).unwrap());
    }

    #[test]
    fn test_sorted_by_date_then_parameter() {
        let rows = vec![
            reading("pm25", 10.0, 26, 3),
            reading("o3", 30.0, 25, 3),
            reading("no2", 20.0, 26, 3),
            reading("co", 0.4, 25, 3),
        ];

        let out = aggregate_daily(&rows);
        let order: Vec<(u32, &str)> = out
            .iter()
            .map(|a| (chrono::Datelike::day(&a.date), a.parameter.as_str()))
            .collect();

        assert_eq!(order, vec![(25, "co"), (25, "o3"), (26, "no2"), (26, "pm25")]);
    }

    #[test]
    fn test_distinct_keys_are_not_merged() {
        let rows = vec![
            reading("pm25", 10.0, 25, 0),
            reading("pm25", 20.0, 25, 0).with_unit("ppm"),
            reading("pm25", 30.0, 25, 0).with_location("Raleigh", "US"),
            reading("pm25", 40.0, 26, 0),
        ];

        let out = aggregate_daily(&rows);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_rows_without_city_are_excluded() {
        let mut no_city = reading("pm25", 500.0, 25, 2);
        no_city.city = None;
        let mut no_unit = reading("pm25", 400.0, 25, 3);
        no_unit.unit = None;

        let rows = vec![reading("pm25", 10.0, 25, 0), no_city, no_unit];
        let out = aggregate_daily(&rows);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, 10.0);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(aggregate_daily(&[]).is_empty());
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let rows = vec![
            reading("pm25", 12.5, 25, 0),
            reading("no2", 120.0, 25, 0),
            reading("pm25", 15.0, 26, 1),
            reading("o3", 40.0, 25, 0).with_location("Raleigh", "US"),
            reading("o3", 41.0, 25, 0),
        ];

        assert_eq!(aggregate_daily(&rows), aggregate_daily(&rows));
    }

    #[test]
    fn test_reaggregating_output_is_a_no_op() {
        let rows = vec![
            reading("pm25", 12.5, 25, 0),
            reading("pm25", 15.0, 25, 1),
            reading("no2", 120.0, 25, 0),
            reading("o3", 40.0, 26, 0),
        ];

        let first = aggregate_daily(&rows);
        let replay: Vec<CleanedMeasurement> =
            first.iter().map(DailyAggregate::to_measurement).collect();
        let second = aggregate_daily(&replay);

        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_pollutant_keeps_row_without_aqi() {
        let out = aggregate_daily(&[reading("o3", 40.0, 25, 0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].aqi, None);
    }

    #[test]
    fn test_declared_unit_is_not_checked_for_aqi() {
        // Known limitation: the PM2.5 table assumes µg/m³ and the NO₂ table
        // assumes ppb. A mean reported in any other unit is scored as if it
        // were already in the table's unit.
        let out = aggregate_daily(&[
            reading("pm25", 25.0, 25, 0).with_unit("ppm"),
            reading("no2", 120.0, 25, 0).with_unit("µg/m³"),
        ]);

        let pm25 = out.iter().find(|a| a.parameter == "pm25").unwrap();
        let no2 = out.iter().find(|a| a.parameter == "no2").unwrap();
        assert_eq!(pm25.aqi, calculate_aqi("pm25", 25.0));
        assert_eq!(no2.aqi, calculate_aqi("no2", 120.0));
    }
}
