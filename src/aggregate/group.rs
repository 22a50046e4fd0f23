//! Grouping and reduction.
//!
//! Group order rules:
//! - nominal keys (`season`, `dteday`) keep first-occurrence order
//! - `weathersit` follows severity: numeric codes ascend, known labels rank
//!   Clear < Misty < Light rain/snow < Heavy rain; anything else comes after,
//!   in first-occurrence order
//! - `mnth` follows the calendar (Jan..Dec) whatever the input order
//! - `yr` and `workingday` ascend (`false` before `true`)
//!
//! With several keys the order is lexicographic over the per-key orders, so
//! `["mnth", "yr"]` yields Jan/2011, Jan/2012, Feb/2011, ...

use std::collections::HashMap;

use tracing::debug;

use crate::aggregate::view::{AggregatedView, Group, GroupedView, ScatterView};
use crate::domain::{Column, Dataset, KeyValue, Record, Reducer, weather_severity};
use crate::error::AppError;
use crate::math::fit_line;

/// z-score for a two-sided 95% normal interval.
const Z_95: f64 = 1.96;

/// Group `dataset` by `keys` and reduce `values` with `reducer`.
///
/// Column names are resolved case-insensitively. An unknown column, a numeric
/// column used as a key, or a categorical column used as a value fails with
/// [`AppError::InvalidGroupKey`]. An empty dataset yields an empty view.
pub fn aggregate(
    dataset: &Dataset,
    keys: &[&str],
    values: &[&str],
    reducer: Reducer,
) -> Result<AggregatedView, AppError> {
    let key_columns = keys
        .iter()
        .map(|name| resolve_key(name))
        .collect::<Result<Vec<_>, _>>()?;
    let value_columns = values
        .iter()
        .map(|name| resolve_value(name))
        .collect::<Result<Vec<_>, _>>()?;

    let view = match reducer {
        Reducer::Identity => AggregatedView::Scatter(scatter(dataset, &key_columns, &value_columns)?),
        Reducer::Sum | Reducer::Mean => {
            AggregatedView::Grouped(group(dataset, key_columns, value_columns, reducer))
        }
    };

    debug!(
        keys = ?keys,
        values = ?values,
        reducer = ?reducer,
        groups = view.group_count(),
        "aggregated view"
    );
    Ok(view)
}

fn resolve_key(name: &str) -> Result<Column, AppError> {
    let column = Column::from_name(name).ok_or_else(|| AppError::invalid_key(name, "no such column"))?;
    if column.is_numeric() {
        return Err(AppError::invalid_key(
            name,
            "numeric columns cannot be used as group keys",
        ));
    }
    Ok(column)
}

fn resolve_value(name: &str) -> Result<Column, AppError> {
    let column = Column::from_name(name).ok_or_else(|| AppError::invalid_key(name, "no such column"))?;
    if !column.is_numeric() {
        return Err(AppError::invalid_key(name, "not a numeric column"));
    }
    Ok(column)
}

fn scatter(dataset: &Dataset, keys: &[Column], values: &[Column]) -> Result<ScatterView, AppError> {
    if let Some(key) = keys.first() {
        return Err(AppError::invalid_key(
            key.name(),
            "the identity reducer does not group",
        ));
    }
    let [x, y] = values else {
        return Err(AppError::invalid_key(
            values.iter().map(|c| c.name()).collect::<Vec<_>>().join(","),
            "the identity reducer takes exactly two value columns (x, y)",
        ));
    };

    let points: Vec<(f64, f64)> = dataset
        .records()
        .iter()
        .filter_map(|r| Some((x.value_of(r)?, y.value_of(r)?)))
        .collect();
    let fit = fit_line(&points);

    Ok(ScatterView {
        x: *x,
        y: *y,
        points,
        fit,
    })
}

/// Rows of one group, in dataset order.
struct Bucket {
    key: Vec<KeyValue>,
    members: Vec<usize>,
}

fn group(dataset: &Dataset, keys: Vec<Column>, values: Vec<Column>, reducer: Reducer) -> GroupedView {
    let records = dataset.records();

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<Vec<KeyValue>, usize> = HashMap::new();
    // Per key column: first-occurrence rank of each value.
    let mut first_seen: Vec<HashMap<KeyValue, usize>> = vec![HashMap::new(); keys.len()];

    for (row, record) in records.iter().enumerate() {
        let key: Vec<KeyValue> = keys.iter().filter_map(|c| c.key_of(record)).collect();
        for (seen, kv) in first_seen.iter_mut().zip(&key) {
            let next = seen.len();
            seen.entry(kv.clone()).or_insert(next);
        }
        match index.get(&key) {
            Some(&b) => buckets[b].members.push(row),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket {
                    key,
                    members: vec![row],
                });
            }
        }
    }

    // Stable sort: ties keep first-occurrence order.
    buckets.sort_by_cached_key(|b| {
        keys.iter()
            .zip(&b.key)
            .zip(&first_seen)
            .map(|((column, kv), seen)| sort_rank(*column, kv, seen))
            .collect::<Vec<_>>()
    });

    let groups = buckets
        .into_iter()
        .map(|bucket| reduce(records, &values, reducer, bucket))
        .collect();

    GroupedView {
        keys,
        values,
        reducer,
        groups,
    }
}

/// `(tier, rank)`: ranked values sort before unranked ones.
fn sort_rank(column: Column, kv: &KeyValue, first_seen: &HashMap<KeyValue, usize>) -> (u8, usize) {
    let seen = || (1, first_seen.get(kv).copied().unwrap_or(usize::MAX));
    match (column, kv) {
        (Column::Mnth, KeyValue::Month(m)) => (0, m.index()),
        (Column::Yr, KeyValue::Year(y)) => (0, usize::from(y.0)),
        (Column::Workingday, KeyValue::Flag(b)) => (0, usize::from(*b)),
        (Column::Weathersit, KeyValue::Label(s)) => weather_severity(s).map_or_else(seen, |r| (0, r)),
        _ => seen(),
    }
}

fn reduce(
    records: &[Record],
    values: &[Column],
    reducer: Reducer,
    bucket: Bucket,
) -> Group {
    let rows = bucket.members.len();
    let mut reduced = Vec::with_capacity(values.len());
    let mut ci95 = Vec::with_capacity(values.len());

    for column in values {
        let samples: Vec<f64> = bucket
            .members
            .iter()
            .filter_map(|&i| column.value_of(&records[i]))
            .collect();
        let sum: f64 = samples.iter().sum();
        match reducer {
            Reducer::Mean => {
                let (mean, half_width) = mean_with_ci(&samples, sum);
                reduced.push(mean);
                ci95.push(half_width);
            }
            _ => reduced.push(sum),
        }
    }

    Group {
        key: bucket.key,
        rows,
        values: reduced,
        ci95: (reducer == Reducer::Mean).then_some(ci95),
    }
}

/// Arithmetic mean and normal-approximation 95% half-width (`0` for n < 2).
fn mean_with_ci(samples: &[f64], sum: f64) -> (f64, f64) {
    let n = samples.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let ss: f64 = samples.iter().map(|v| (v - mean) * (v - mean)).sum();
    let sd = (ss / (n as f64 - 1.0)).sqrt();
    (mean, Z_95 * sd / (n as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Month, Year};

    fn rec(season: &str, mnth: Month, yr: u16, workingday: bool, registered: u64, casual: u64) -> Record {
        Record {
            dteday: NaiveDate::from_ymd_opt(i32::from(yr), mnth.index() as u32 + 1, 1).unwrap(),
            season: season.to_string(),
            weathersit: "1".to_string(),
            mnth,
            yr: Year(yr),
            temp: 0.5,
            workingday,
            registered,
            casual,
            cnt: registered + casual,
        }
    }

    fn grouped(view: AggregatedView) -> GroupedView {
        match view {
            AggregatedView::Grouped(g) => g,
            AggregatedView::Scatter(_) => panic!("expected grouped view"),
        }
    }

    #[test]
    fn season_sums_two_rows_into_one_group() {
        let ds = Dataset::from_records(vec![
            rec("1", Month::Jan, 2011, true, 10, 5),
            rec("1", Month::Jan, 2011, true, 3, 2),
        ]);
        let view = grouped(aggregate(&ds, &["season"], &["registered", "casual"], Reducer::Sum).unwrap());

        assert_eq!(view.groups.len(), 1);
        let g = &view.groups[0];
        assert_eq!(g.key, vec![KeyValue::Label("1".to_string())]);
        assert_eq!(g.rows, 2);
        assert_eq!(g.values, vec![13.0, 7.0]);
        assert!(g.ci95.is_none());
    }

    #[test]
    fn nominal_keys_keep_first_occurrence_order() {
        let ds = Dataset::from_records(vec![
            rec("Summer", Month::Jun, 2011, true, 1, 1),
            rec("Spring", Month::Mar, 2011, true, 1, 1),
            rec("Summer", Month::Jul, 2011, true, 1, 1),
            rec("Fall", Month::Oct, 2011, true, 1, 1),
        ]);
        let view = grouped(aggregate(&ds, &["season"], &["cnt"], Reducer::Sum).unwrap());
        let order: Vec<String> = view.groups.iter().map(|g| g.key[0].to_string()).collect();
        assert_eq!(order, vec!["Summer", "Spring", "Fall"]);
        assert_eq!(view.groups[0].values, vec![4.0]);
    }

    #[test]
    fn months_follow_calendar_and_years_nest_ascending() {
        let ds = Dataset::from_records(vec![
            rec("1", Month::Mar, 2012, true, 30, 0),
            rec("1", Month::Jan, 2012, true, 150, 0),
            rec("1", Month::Mar, 2011, true, 20, 0),
            rec("1", Month::Jan, 2011, true, 100, 0),
            rec("1", Month::Feb, 2011, true, 10, 0),
        ]);
        let view = grouped(aggregate(&ds, &["mnth", "yr"], &["cnt"], Reducer::Sum).unwrap());

        let order: Vec<(String, String)> = view
            .groups
            .iter()
            .map(|g| (g.key[0].to_string(), g.key[1].to_string()))
            .collect();
        let expected = [
            ("Jan", "2011"),
            ("Jan", "2012"),
            ("Feb", "2011"),
            ("Mar", "2011"),
            ("Mar", "2012"),
        ];
        assert_eq!(
            order,
            expected
                .iter()
                .map(|(m, y)| (m.to_string(), y.to_string()))
                .collect::<Vec<_>>()
        );

        let jan_2011 = view
            .find(&[KeyValue::Month(Month::Jan), KeyValue::Year(Year(2011))])
            .unwrap();
        assert_eq!(jan_2011.values, vec![100.0]);
    }

    #[test]
    fn sums_partition_total_count() {
        let ds = Dataset::from_records(vec![
            rec("1", Month::Jan, 2011, true, 10, 5),
            rec("2", Month::Apr, 2011, false, 7, 9),
            rec("1", Month::Feb, 2012, true, 3, 2),
            rec("2", Month::May, 2012, true, 40, 1),
        ]);
        let parts = grouped(aggregate(&ds, &["season"], &["registered", "casual"], Reducer::Sum).unwrap());
        let totals = grouped(aggregate(&ds, &["season"], &["cnt"], Reducer::Sum).unwrap());
        for (p, t) in parts.groups.iter().zip(&totals.groups) {
            assert_eq!(p.key, t.key);
            assert_eq!(p.values[0] + p.values[1], t.values[0]);
        }
    }

    #[test]
    fn working_day_mean_has_two_ordered_groups() {
        let ds = Dataset::from_records(vec![
            rec("1", Month::Jan, 2011, true, 100, 0),
            rec("1", Month::Jan, 2011, false, 40, 0),
            rec("1", Month::Jan, 2011, true, 200, 0),
            rec("1", Month::Jan, 2011, false, 60, 0),
            rec("1", Month::Jan, 2011, true, 300, 0),
        ]);
        let view = grouped(aggregate(&ds, &["workingday"], &["cnt"], Reducer::Mean).unwrap());

        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].key, vec![KeyValue::Flag(false)]);
        assert_eq!(view.groups[1].key, vec![KeyValue::Flag(true)]);
        assert!((view.groups[0].values[0] - 50.0).abs() < 1e-12);
        assert!((view.groups[1].values[0] - 200.0).abs() < 1e-12);

        // sd of [100, 200, 300] is 100 -> 1.96 * 100 / sqrt(3)
        let ci = view.groups[1].ci95.as_ref().unwrap()[0];
        assert!((ci - 1.96 * 100.0 / 3f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn single_row_mean_has_zero_interval() {
        assert_eq!(mean_with_ci(&[42.0], 42.0), (42.0, 0.0));
        assert_eq!(mean_with_ci(&[], 0.0), (0.0, 0.0));
    }

    #[test]
    fn identity_returns_rows_and_fit() {
        let mut rows = Vec::new();
        for (i, cnt) in [1000u64, 2200, 2900, 4100, 5000].into_iter().enumerate() {
            let mut r = rec("1", Month::Jan, 2011, true, cnt, 0);
            r.temp = 0.1 + 0.2 * i as f64;
            rows.push(r);
        }
        let ds = Dataset::from_records(rows);
        let view = aggregate(&ds, &[], &["temp", "cnt"], Reducer::Identity).unwrap();
        let scatter = view.as_scatter().unwrap();

        assert_eq!(scatter.points.len(), 5);
        assert_eq!(scatter.points[0], (0.1, 1000.0));
        let fit = scatter.fit.unwrap();
        assert!(fit.slope > 0.0);

        let again = aggregate(&ds, &[], &["temp", "cnt"], Reducer::Identity).unwrap();
        let fit2 = again.as_scatter().unwrap().fit.unwrap();
        assert_eq!(fit.slope.to_bits(), fit2.slope.to_bits());
        assert_eq!(fit.intercept.to_bits(), fit2.intercept.to_bits());
    }

    #[test]
    fn empty_dataset_yields_zero_groups() {
        let ds = Dataset::default();
        let view = aggregate(&ds, &["season"], &["registered", "casual"], Reducer::Sum).unwrap();
        assert!(view.is_empty());

        let scatter = aggregate(&ds, &[], &["temp", "cnt"], Reducer::Identity).unwrap();
        assert!(scatter.is_empty());
        assert!(scatter.as_scatter().unwrap().fit.is_none());
    }

    #[test]
    fn invalid_columns_are_rejected() {
        let ds = Dataset::default();
        let unknown = aggregate(&ds, &["humidity"], &["cnt"], Reducer::Sum).unwrap_err();
        assert!(matches!(unknown, AppError::InvalidGroupKey { ref column, .. } if column == "humidity"));

        let numeric_key = aggregate(&ds, &["cnt"], &["registered"], Reducer::Sum).unwrap_err();
        assert!(matches!(numeric_key, AppError::InvalidGroupKey { .. }));

        let categorical_value = aggregate(&ds, &["season"], &["mnth"], Reducer::Sum).unwrap_err();
        assert!(matches!(categorical_value, AppError::InvalidGroupKey { .. }));

        let grouped_identity = aggregate(&ds, &["season"], &["temp", "cnt"], Reducer::Identity).unwrap_err();
        assert!(matches!(grouped_identity, AppError::InvalidGroupKey { .. }));
    }

    fn weather_order(codes: &[&str]) -> Vec<String> {
        let rows = codes
            .iter()
            .map(|code| {
                let mut r = rec("1", Month::Jan, 2011, true, 10, 1);
                r.weathersit = code.to_string();
                r
            })
            .collect();
        let view = grouped(
            aggregate(&Dataset::from_records(rows), &["weathersit"], &["registered", "casual"], Reducer::Sum).unwrap(),
        );
        view.groups.iter().map(|g| g.key[0].to_string()).collect()
    }

    #[test]
    fn weather_codes_sort_by_severity() {
        assert_eq!(weather_order(&["2", "1", "3", "2"]), vec!["1", "2", "3"]);
    }

    #[test]
    fn weather_labels_sort_by_severity_then_first_seen() {
        assert_eq!(
            weather_order(&["Misty", "Foggy", "Light_rainsnow", "Clear", "Windy", "Heavy Rain"]),
            vec!["Clear", "Misty", "Light_rainsnow", "Heavy Rain", "Foggy", "Windy"]
        );
    }
}
