//! Chart rendering: aggregated view + chart spec -> drawable figure.
//!
//! `render` only decides *what* to draw (categories, series, bounds, labels).
//! Drawing onto a concrete Plotters backend lives in [`draw`], so the same
//! artifact feeds the terminal panel and the SVG export.

use serde::Serialize;

use crate::aggregate::{AggregatedView, GroupedView, ScatterView};
use crate::domain::{ChartKind, ChartSpec, KeyValue};
use crate::error::AppError;

pub mod draw;

pub use draw::{Theme, draw_chart};

/// Matplotlib's default cycle; the dashboard has always used these.
pub const PALETTE: [(u8, u8, u8); 4] = [(31, 119, 180), (255, 127, 14), (44, 160, 44), (214, 39, 40)];
pub const REGRESSION_COLOR: (u8, u8, u8) = (255, 0, 0);

const BAR_ALPHA: f64 = 0.6;
const POINT_ALPHA: f64 = 0.5;

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStyle {
    Bars,
    LineWithMarkers,
    Points,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub style: SeriesStyle,
    pub color: (u8, u8, u8),
    pub opacity: f64,
    /// `(x, y)` in chart coordinates (category index for categorical axes).
    pub points: Vec<(f64, f64)>,
    /// Symmetric error half-width per point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<f64>>,
}

/// The x-axis of a figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum XAxis {
    /// Category labels; category `i` is drawn at `x = i`.
    Categories(Vec<String>),
    Range(f64, f64),
}

/// A fully determined chart, independent of any drawing backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: Option<String>,
    pub x_axis: XAxis,
    pub y_range: (f64, f64),
    pub series: Vec<Series>,
    pub caption: String,
}

impl ChartArtifact {
    /// X bounds in chart coordinates.
    pub fn x_bounds(&self) -> (f64, f64) {
        match &self.x_axis {
            XAxis::Categories(c) => (-0.5, c.len().max(1) as f64 - 0.5),
            XAxis::Range(lo, hi) => (*lo, *hi),
        }
    }

    pub fn categories(&self) -> &[String] {
        match &self.x_axis {
            XAxis::Categories(c) => c,
            XAxis::Range(..) => &[],
        }
    }

    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// Turn an aggregated view into a chart.
///
/// Fails with [`AppError::EmptyView`] when there is nothing to draw, and with
/// [`AppError::InvalidGroupKey`] when the spec names fields the view lacks.
pub fn render(view: &AggregatedView, spec: &ChartSpec, caption: &str) -> Result<ChartArtifact, AppError> {
    if view.is_empty() {
        return Err(AppError::EmptyView {
            view: spec.title.to_string(),
        });
    }

    let (x_axis, series) = match (spec.kind, view) {
        (ChartKind::GroupedBar, AggregatedView::Grouped(g)) => grouped_bars(g, spec)?,
        (ChartKind::BarWithError, AggregatedView::Grouped(g)) => bars_with_error(g, spec)?,
        (ChartKind::LineWithMarkers, AggregatedView::Grouped(g)) => lines_by_series(g, spec)?,
        (ChartKind::ScatterWithRegression, AggregatedView::Scatter(s)) => scatter_with_fit(s, spec),
        (kind, _) => {
            return Err(AppError::invalid_key(
                spec.x_field.name(),
                format!("a {kind:?} chart cannot be drawn from this view"),
            ));
        }
    };

    let y_range = y_range(spec.kind, &series);

    Ok(ChartArtifact {
        kind: spec.kind,
        title: spec.title.to_string(),
        x_label: spec.x_label.to_string(),
        y_label: spec.y_label.to_string(),
        legend_title: spec.legend_title.map(str::to_string),
        x_axis,
        y_range,
        series,
        caption: caption.to_string(),
    })
}

fn x_key_index(view: &GroupedView, spec: &ChartSpec) -> Result<usize, AppError> {
    view.key_index(spec.x_field)
        .ok_or_else(|| AppError::invalid_key(spec.x_field.name(), "not a key of this view"))
}

fn y_value_indices(view: &GroupedView, spec: &ChartSpec) -> Result<Vec<usize>, AppError> {
    spec.y_fields
        .iter()
        .map(|c| {
            view.value_index(*c)
                .ok_or_else(|| AppError::invalid_key(c.name(), "not a value of this view"))
        })
        .collect()
}

/// Distinct values of key `idx`, in group order.
fn distinct_keys(view: &GroupedView, idx: usize) -> Vec<KeyValue> {
    let mut out: Vec<KeyValue> = Vec::new();
    for g in &view.groups {
        if !out.contains(&g.key[idx]) {
            out.push(g.key[idx].clone());
        }
    }
    out
}

fn series_label(spec: &ChartSpec, i: usize) -> String {
    spec.series_labels
        .get(i)
        .map(|s| s.to_string())
        .unwrap_or_else(|| spec.y_fields[i].name().to_string())
}

fn grouped_bars(view: &GroupedView, spec: &ChartSpec) -> Result<(XAxis, Vec<Series>), AppError> {
    let x_idx = x_key_index(view, spec)?;
    let y_idx = y_value_indices(view, spec)?;
    let categories = distinct_keys(view, x_idx);

    let series = y_idx
        .iter()
        .enumerate()
        .map(|(i, &vi)| Series {
            name: series_label(spec, i),
            style: SeriesStyle::Bars,
            color: PALETTE[i % PALETTE.len()],
            opacity: BAR_ALPHA,
            points: view
                .groups
                .iter()
                .filter_map(|g| {
                    let x = categories.iter().position(|c| *c == g.key[x_idx])?;
                    Some((x as f64, g.values[vi]))
                })
                .collect(),
            errors: None,
        })
        .collect();

    Ok((XAxis::Categories(labels(&categories)), series))
}

fn bars_with_error(view: &GroupedView, spec: &ChartSpec) -> Result<(XAxis, Vec<Series>), AppError> {
    let x_idx = x_key_index(view, spec)?;
    let y_idx = y_value_indices(view, spec)?;
    let vi = *y_idx
        .first()
        .ok_or_else(|| AppError::invalid_key(spec.x_field.name(), "no value column to draw"))?;
    let categories = distinct_keys(view, x_idx);

    let mut points = Vec::with_capacity(view.groups.len());
    let mut errors = Vec::with_capacity(view.groups.len());
    for g in &view.groups {
        let Some(x) = categories.iter().position(|c| *c == g.key[x_idx]) else {
            continue;
        };
        points.push((x as f64, g.values[vi]));
        errors.push(g.ci95.as_ref().and_then(|ci| ci.get(vi).copied()).unwrap_or(0.0));
    }

    let series = vec![Series {
        name: series_label(spec, 0),
        style: SeriesStyle::Bars,
        color: PALETTE[0],
        opacity: 1.0,
        points,
        errors: Some(errors),
    }];
    Ok((XAxis::Categories(labels(&categories)), series))
}

fn lines_by_series(view: &GroupedView, spec: &ChartSpec) -> Result<(XAxis, Vec<Series>), AppError> {
    let x_idx = x_key_index(view, spec)?;
    let series_field = spec
        .series_field
        .ok_or_else(|| AppError::invalid_key(spec.x_field.name(), "line chart needs a series field"))?;
    let s_idx = view
        .key_index(series_field)
        .ok_or_else(|| AppError::invalid_key(series_field.name(), "not a key of this view"))?;
    let vi = *y_value_indices(view, spec)?
        .first()
        .ok_or_else(|| AppError::invalid_key(spec.x_field.name(), "no value column to draw"))?;

    let categories = distinct_keys(view, x_idx);
    let mut series_keys = distinct_keys(view, s_idx);
    series_keys.sort();

    let series = series_keys
        .iter()
        .enumerate()
        .map(|(i, sk)| Series {
            name: sk.to_string(),
            style: SeriesStyle::LineWithMarkers,
            color: PALETTE[i % PALETTE.len()],
            opacity: 1.0,
            points: view
                .groups
                .iter()
                .filter(|g| g.key[s_idx] == *sk)
                .filter_map(|g| {
                    let x = categories.iter().position(|c| *c == g.key[x_idx])?;
                    Some((x as f64, g.values[vi]))
                })
                .collect(),
            errors: None,
        })
        .collect();

    Ok((XAxis::Categories(labels(&categories)), series))
}

fn scatter_with_fit(view: &ScatterView, spec: &ChartSpec) -> (XAxis, Vec<Series>) {
    let (mut x0, mut x1) = view
        .points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| (lo.min(x), hi.max(x)));

    let mut series = vec![Series {
        name: spec.series_labels.first().unwrap_or(&"Data Points").to_string(),
        style: SeriesStyle::Points,
        color: PALETTE[0],
        opacity: POINT_ALPHA,
        points: view.points.clone(),
        errors: None,
    }];

    if let Some(fit) = view.fit {
        series.push(Series {
            name: spec.series_labels.get(1).unwrap_or(&"Regression Line").to_string(),
            style: SeriesStyle::Line,
            color: REGRESSION_COLOR,
            opacity: 1.0,
            points: vec![(x0, fit.predict(x0)), (x1, fit.predict(x1))],
            errors: None,
        });
    }

    let pad = ((x1 - x0) * 0.05).max(0.01);
    x0 -= pad;
    x1 += pad;
    (XAxis::Range(x0, x1), series)
}

fn labels(keys: &[KeyValue]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn y_range(kind: ChartKind, series: &[Series]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for s in series {
        for (i, &(_, y)) in s.points.iter().enumerate() {
            let err = s.errors.as_ref().and_then(|e| e.get(i)).copied().unwrap_or(0.0);
            lo = lo.min(y - err);
            hi = hi.max(y + err);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }

    // Bars grow from zero.
    if matches!(kind, ChartKind::GroupedBar | ChartKind::BarWithError) {
        lo = lo.min(0.0);
    }
    if hi <= lo {
        hi = lo + 1.0;
    }
    let pad = (hi - lo) * 0.05;
    let lo = if lo == 0.0 { 0.0 } else { lo - pad };
    (lo, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Group;
    use crate::domain::{Column, Month, Reducer, ViewId, Year};
    use crate::math::LinearFit;

    fn grouped(keys: Vec<Column>, values: Vec<Column>, reducer: Reducer, groups: Vec<Group>) -> AggregatedView {
        AggregatedView::Grouped(GroupedView {
            keys,
            values,
            reducer,
            groups,
        })
    }

    fn group(key: Vec<KeyValue>, values: Vec<f64>) -> Group {
        Group {
            key,
            rows: 1,
            values,
            ci95: None,
        }
    }

    #[test]
    fn season_bars_overlap_with_transparency() {
        let view = grouped(
            vec![Column::Season],
            vec![Column::Registered, Column::Casual],
            Reducer::Sum,
            vec![
                group(vec![KeyValue::Label("1".into())], vec![13.0, 7.0]),
                group(vec![KeyValue::Label("3".into())], vec![40.0, 20.0]),
            ],
        );
        let def = ViewId::Season.def();
        let chart = render(&view, &def.chart, def.caption).unwrap();

        assert_eq!(chart.title, "Number of Bicycle Rentals by Season");
        assert_eq!(chart.categories(), ["1".to_string(), "3".to_string()]);
        let registered = chart.series_named("Registered").unwrap();
        let casual = chart.series_named("Casual").unwrap();
        assert_eq!(registered.points, vec![(0.0, 13.0), (1.0, 40.0)]);
        assert_eq!(casual.points, vec![(0.0, 7.0), (1.0, 20.0)]);
        assert_eq!(registered.opacity, 0.6);
        assert_eq!(chart.y_range.0, 0.0);
        assert!(chart.y_range.1 >= 40.0);
        assert_eq!(chart.caption, def.caption);
    }

    #[test]
    fn monthly_lines_split_by_year() {
        let view = grouped(
            vec![Column::Mnth, Column::Yr],
            vec![Column::Cnt],
            Reducer::Sum,
            vec![
                group(vec![KeyValue::Month(Month::Jan), KeyValue::Year(Year(2011))], vec![100.0]),
                group(vec![KeyValue::Month(Month::Jan), KeyValue::Year(Year(2012))], vec![150.0]),
            ],
        );
        let def = ViewId::Monthly.def();
        let chart = render(&view, &def.chart, def.caption).unwrap();

        assert_eq!(chart.categories(), ["Jan".to_string()]);
        assert_eq!(chart.legend_title.as_deref(), Some("Year"));
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series_named("2011").unwrap().points, vec![(0.0, 100.0)]);
        assert_eq!(chart.series_named("2012").unwrap().points, vec![(0.0, 150.0)]);
        assert!(chart.series.iter().all(|s| s.style == SeriesStyle::LineWithMarkers));
    }

    #[test]
    fn missing_months_are_absent_points() {
        let view = grouped(
            vec![Column::Mnth, Column::Yr],
            vec![Column::Cnt],
            Reducer::Sum,
            vec![
                group(vec![KeyValue::Month(Month::Jan), KeyValue::Year(Year(2011))], vec![10.0]),
                group(vec![KeyValue::Month(Month::Mar), KeyValue::Year(Year(2011))], vec![30.0]),
                group(vec![KeyValue::Month(Month::Mar), KeyValue::Year(Year(2012))], vec![50.0]),
            ],
        );
        let def = ViewId::Monthly.def();
        let chart = render(&view, &def.chart, def.caption).unwrap();
        assert_eq!(chart.categories(), ["Jan".to_string(), "Mar".to_string()]);
        assert_eq!(chart.series_named("2012").unwrap().points, vec![(1.0, 50.0)]);
    }

    #[test]
    fn working_day_bars_carry_errors() {
        let view = grouped(
            vec![Column::Workingday],
            vec![Column::Cnt],
            Reducer::Mean,
            vec![
                Group {
                    key: vec![KeyValue::Flag(false)],
                    rows: 3,
                    values: vec![4330.0],
                    ci95: Some(vec![250.0]),
                },
                Group {
                    key: vec![KeyValue::Flag(true)],
                    rows: 5,
                    values: vec![4585.0],
                    ci95: Some(vec![150.0]),
                },
            ],
        );
        let def = ViewId::Workingday.def();
        let chart = render(&view, &def.chart, def.caption).unwrap();

        assert_eq!(chart.categories(), ["0".to_string(), "1".to_string()]);
        let bars = &chart.series[0];
        assert_eq!(bars.points, vec![(0.0, 4330.0), (1.0, 4585.0)]);
        assert_eq!(bars.errors.as_deref(), Some(&[250.0, 150.0][..]));
        assert!(chart.y_range.1 >= 4735.0);
    }

    #[test]
    fn scatter_gets_regression_overlay() {
        let view = AggregatedView::Scatter(ScatterView {
            x: Column::Temp,
            y: Column::Cnt,
            points: vec![(0.2, 1000.0), (0.8, 5000.0)],
            fit: Some(LinearFit {
                slope: 6000.0,
                intercept: -200.0,
                n: 2,
            }),
        });
        let def = ViewId::Temperature.def();
        let chart = render(&view, &def.chart, def.caption).unwrap();

        assert_eq!(chart.x_label, "Temperature (Normalized)");
        let points = chart.series_named("Data Points").unwrap();
        assert_eq!(points.opacity, 0.5);
        let line = chart.series_named("Regression Line").unwrap();
        assert_eq!(line.color, REGRESSION_COLOR);
        assert_eq!(line.points, vec![(0.2, 1000.0), (0.8, 4600.0)]);
        let (x0, x1) = chart.x_bounds();
        assert!(x0 < 0.2 && x1 > 0.8);
    }

    #[test]
    fn empty_view_is_reported() {
        let view = grouped(vec![Column::Season], vec![Column::Registered, Column::Casual], Reducer::Sum, vec![]);
        let def = ViewId::Season.def();
        let err = render(&view, &def.chart, def.caption).unwrap_err();
        assert!(matches!(err, AppError::EmptyView { .. }));
    }

    #[test]
    fn mismatched_spec_is_rejected() {
        let view = grouped(
            vec![Column::Season],
            vec![Column::Registered, Column::Casual],
            Reducer::Sum,
            vec![group(vec![KeyValue::Label("1".into())], vec![1.0, 1.0])],
        );
        let def = ViewId::Weather.def();
        let err = render(&view, &def.chart, def.caption).unwrap_err();
        assert!(matches!(err, AppError::InvalidGroupKey { .. }));
    }
}
