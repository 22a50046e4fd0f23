//! Export aggregated views and charts.
//!
//! - `<id>.csv`: one aggregated table per view (spreadsheet friendly)
//! - `views.json`: every aggregated view in one document
//! - `<id>.svg`: the chart, drawn with the same routine as the terminal panel

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use plotters::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::AggregatedView;
use crate::chart::{ChartArtifact, Theme, draw_chart};
use crate::domain::ViewId;
use crate::error::AppError;

/// Write one aggregated view as a CSV table.
pub fn write_view_csv(path: &Path, view: &AggregatedView) -> Result<(), AppError> {
    let file = create(path)?;
    write_view_table(file, view).map_err(|e| AppError::export(format!("Failed to write '{}': {e}", path.display())))?;
    debug!(path = %path.display(), "wrote view table");
    Ok(())
}

/// Table layout shared by the CSV export and tests.
pub fn write_view_table<W: Write>(out: W, view: &AggregatedView) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(out);
    match view {
        AggregatedView::Grouped(g) => {
            let with_ci = g.groups.iter().any(|grp| grp.ci95.is_some());
            let mut header: Vec<String> = g.keys.iter().map(|c| c.name().to_string()).collect();
            header.push("rows".to_string());
            header.extend(g.values.iter().map(|c| c.name().to_string()));
            if with_ci {
                header.extend(g.values.iter().map(|c| format!("{}_ci95", c.name())));
            }
            w.write_record(&header)?;

            for grp in &g.groups {
                let mut row: Vec<String> = grp.key.iter().map(|k| k.to_string()).collect();
                row.push(grp.rows.to_string());
                row.extend(grp.values.iter().map(|v| fmt_value(*v)));
                if with_ci {
                    let ci = grp.ci95.as_deref().unwrap_or(&[]);
                    row.extend((0..g.values.len()).map(|i| fmt_value(ci.get(i).copied().unwrap_or(0.0))));
                }
                w.write_record(&row)?;
            }
        }
        AggregatedView::Scatter(s) => {
            w.write_record([s.x.name(), s.y.name()])?;
            for &(x, y) in &s.points {
                w.write_record([fmt_value(x), fmt_value(y)])?;
            }
        }
    }
    w.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct ViewEntry<'a> {
    id: ViewId,
    heading: &'static str,
    #[serde(flatten)]
    view: &'a AggregatedView,
}

/// Write every view into a single pretty-printed JSON document.
pub fn write_views_json(path: &Path, views: &[(ViewId, &AggregatedView)]) -> Result<(), AppError> {
    let entries: Vec<ViewEntry> = views
        .iter()
        .map(|&(id, view)| ViewEntry {
            id,
            heading: id.def().heading,
            view,
        })
        .collect();

    let mut out = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut out, &entries)
        .map_err(|e| AppError::export(format!("Failed to write '{}': {e}", path.display())))?;
    out.flush()
        .map_err(|e| AppError::export(format!("Failed to write '{}': {e}", path.display())))?;
    Ok(())
}

/// Draw `chart` into an SVG file of `size` pixels.
pub fn write_chart_svg(path: &Path, chart: &ChartArtifact, size: (u32, u32)) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(AppError::export(format!("Directory '{}' does not exist", parent.display())));
        }
    }

    let fail = |e: &dyn std::fmt::Display| AppError::export(format!("Failed to draw '{}': {e}", path.display()));
    let root = SVGBackend::new(path, size).into_drawing_area();
    draw_chart(&root, chart, &Theme::svg()).map_err(|e| fail(&e))?;
    root.present().map_err(|e| fail(&e))?;
    debug!(path = %path.display(), "wrote chart");
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::export(format!("Failed to create '{}': {e}", path.display())))
}

/// Integral values print without a fractional part.
fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Group, GroupedView, ScatterView};
    use crate::domain::{Column, KeyValue, Reducer};

    fn table(view: &AggregatedView) -> String {
        let mut buf = Vec::new();
        write_view_table(&mut buf, view).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn grouped_table_has_keys_then_values() {
        let view = AggregatedView::Grouped(GroupedView {
            keys: vec![Column::Season],
            values: vec![Column::Registered, Column::Casual],
            reducer: Reducer::Sum,
            groups: vec![Group {
                key: vec![KeyValue::Label("1".into())],
                rows: 2,
                values: vec![13.0, 7.0],
                ci95: None,
            }],
        });
        assert_eq!(table(&view), "season,rows,registered,casual\n1,2,13,7\n");
    }

    #[test]
    fn mean_table_adds_interval_columns() {
        let view = AggregatedView::Grouped(GroupedView {
            keys: vec![Column::Workingday],
            values: vec![Column::Cnt],
            reducer: Reducer::Mean,
            groups: vec![Group {
                key: vec![KeyValue::Flag(true)],
                rows: 4,
                values: vec![12.5],
                ci95: Some(vec![1.25]),
            }],
        });
        assert_eq!(table(&view), "workingday,rows,cnt,cnt_ci95\n1,4,12.500000,1.250000\n");
    }

    #[test]
    fn scatter_table_lists_points() {
        let view = AggregatedView::Scatter(ScatterView {
            x: Column::Temp,
            y: Column::Cnt,
            points: vec![(0.25, 100.0)],
            fit: None,
        });
        assert_eq!(table(&view), "temp,cnt\n0.250000,100\n");
    }

    #[test]
    fn svg_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("season.svg");
        let chart = ChartArtifact {
            kind: crate::domain::ChartKind::GroupedBar,
            title: "t".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            legend_title: None,
            x_axis: crate::chart::XAxis::Categories(vec!["1".to_string()]),
            y_range: (0.0, 1.0),
            series: vec![],
            caption: String::new(),
        };
        let err = write_chart_svg(&path, &chart, (400, 300)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
