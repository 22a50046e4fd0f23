//! Shared "view pipeline" logic used by both the TUI and the batch commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! dataset -> aggregate -> render -> panel
//!
//! Front-ends then focus on presentation (widgets vs printed tables vs files).

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::aggregate::{AggregatedView, aggregate};
use crate::chart::{ChartArtifact, render};
use crate::domain::{Dataset, ViewId};
use crate::error::AppError;

/// Aggregate the dataset for one view.
pub fn build_view(dataset: &Dataset, id: ViewId) -> Result<AggregatedView, AppError> {
    let query = id.def().query;
    aggregate(dataset, query.keys, query.values, query.reducer)
}

/// Aggregate and render one view.
pub fn render_view(dataset: &Dataset, id: ViewId) -> Result<ChartArtifact, AppError> {
    let def = id.def();
    let view = build_view(dataset, id)?;
    render(&view, &def.chart, def.caption)
}

/// What a panel shows under its heading.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    Chart(ChartArtifact),
    /// Empty-state message shown instead of a chart.
    Empty(String),
}

/// One selectable dashboard panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub view: ViewId,
    pub tab: &'static str,
    pub heading: &'static str,
    pub body: PanelBody,
    pub caption: &'static str,
}

/// Build the panel for `id`.
///
/// An empty view becomes an empty-state placeholder; every other failure is
/// returned to the caller.
pub fn build_panel(dataset: &Dataset, id: ViewId) -> Result<Panel, AppError> {
    let def = id.def();
    let body = match render_view(dataset, id) {
        Ok(chart) => PanelBody::Chart(chart),
        Err(err) if err.is_recoverable() => {
            warn!(view = id.as_str(), "{err}");
            PanelBody::Empty(err.to_string())
        }
        Err(err) => return Err(err),
    };
    debug!(view = id.as_str(), "built panel");

    Ok(Panel {
        view: id,
        tab: def.tab,
        heading: def.heading,
        body,
        caption: def.caption,
    })
}

/// Aggregated output for one view, for the batch commands.
#[derive(Debug, Clone)]
pub struct ViewOutput {
    pub id: ViewId,
    pub view: AggregatedView,
    pub chart: Result<ChartArtifact, AppError>,
}

/// Build the requested views in parallel, preserving the order of `ids`.
///
/// The dataset is only read, so the views share it without locking.
pub fn build_views(dataset: &Dataset, ids: &[ViewId]) -> Result<Vec<ViewOutput>, AppError> {
    ids.par_iter()
        .map(|&id| {
            let def = id.def();
            let view = build_view(dataset, id)?;
            let chart = render(&view, &def.chart, def.caption);
            Ok(ViewOutput { id, view, chart })
        })
        .collect()
}
