//! Formatted terminal output for the `summary` command.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized

use std::path::Path;

use crate::aggregate::{AggregatedView, GroupedView, ScatterView};
use crate::domain::{DatasetStats, Reducer, ViewId};

/// Format the dataset header (source + row count + date span).
pub fn format_dataset_summary(path: &Path, stats: &DatasetStats) -> String {
    let mut out = String::new();

    out.push_str("=== Dashboard Bike Sharing ===\n");
    out.push_str(&format!("Data: {}\n", path.display()));
    match (stats.date_min, stats.date_max) {
        (Some(lo), Some(hi)) => out.push_str(&format!("Rows: n={} | dates=[{lo}, {hi}]\n", stats.n_rows)),
        _ => out.push_str(&format!("Rows: n={}\n", stats.n_rows)),
    }
    out.push('\n');

    out
}

/// Format one aggregated view under its heading.
pub fn format_view(id: ViewId, view: &AggregatedView) -> String {
    let def = id.def();
    let mut out = String::new();

    out.push_str(&format!("--- {} ({}) ---\n", def.chart.title, id.as_str()));
    out.push_str(def.heading);
    out.push('\n');

    if view.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    match view {
        AggregatedView::Grouped(g) => out.push_str(&format_grouped(g)),
        AggregatedView::Scatter(s) => out.push_str(&format_scatter(s)),
    }
    out
}

fn format_grouped(view: &GroupedView) -> String {
    let with_ci = view.reducer == Reducer::Mean;
    let mut header: Vec<String> = view.keys.iter().map(|c| c.name().to_string()).collect();
    header.push("rows".to_string());
    for c in &view.values {
        let name = match view.reducer {
            Reducer::Sum => format!("sum({})", c.name()),
            Reducer::Mean => format!("mean({})", c.name()),
            Reducer::Identity => c.name().to_string(),
        };
        header.push(name);
        if with_ci {
            header.push("±95%".to_string());
        }
    }

    let key_width = 12;
    let mut out = String::new();
    out.push_str(format_row(&header, view.keys.len(), key_width).trim_end());
    out.push('\n');
    let rule: Vec<String> = header.iter().map(|_| String::new()).collect();
    out.push_str(format_rule(&rule, view.keys.len(), key_width).trim_end());
    out.push('\n');

    for g in &view.groups {
        let mut cells: Vec<String> = g.key.iter().map(|k| k.to_string()).collect();
        cells.push(g.rows.to_string());
        for (i, v) in g.values.iter().enumerate() {
            cells.push(fmt_num(*v, view.reducer));
            if with_ci {
                let ci = g.ci95.as_ref().and_then(|c| c.get(i)).copied().unwrap_or(0.0);
                cells.push(format!("{ci:.2}"));
            }
        }
        out.push_str(format_row(&cells, view.keys.len(), key_width).trim_end());
        out.push('\n');
    }
    out.push('\n');
    out
}

fn format_scatter(view: &ScatterView) -> String {
    let mut out = String::new();
    let (x_lo, x_hi) = min_max(view.points.iter().map(|p| p.0));
    let (y_lo, y_hi) = min_max(view.points.iter().map(|p| p.1));

    out.push_str(&format!(
        "Points: n={} | {}=[{x_lo:.3}, {x_hi:.3}] | {}=[{y_lo:.0}, {y_hi:.0}]\n",
        view.points.len(),
        view.x.name(),
        view.y.name(),
    ));
    match &view.fit {
        Some(fit) => out.push_str(&format!(
            "Regression: {} = {:.3} + {:.3} * {} (n={})\n",
            view.y.name(),
            fit.intercept,
            fit.slope,
            view.x.name(),
            fit.n,
        )),
        None => out.push_str("Regression: not enough points\n"),
    }
    out.push('\n');
    out
}

fn format_row(cells: &[String], n_keys: usize, key_width: usize) -> String {
    let mut line = String::new();
    for (i, c) in cells.iter().enumerate() {
        if i < n_keys {
            line.push_str(&format!("{c:<key_width$} "));
        } else {
            line.push_str(&format!("{c:>14} "));
        }
    }
    line
}

fn format_rule(cells: &[String], n_keys: usize, key_width: usize) -> String {
    let mut line = String::new();
    for (i, _) in cells.iter().enumerate() {
        if i < n_keys {
            line.push_str(&format!("{:-<key_width$} ", ""));
        } else {
            line.push_str(&format!("{:-<14} ", ""));
        }
    }
    line
}

fn fmt_num(v: f64, reducer: Reducer) -> String {
    match reducer {
        Reducer::Mean => format!("{v:.2}"),
        _ => format!("{v:.0}"),
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
