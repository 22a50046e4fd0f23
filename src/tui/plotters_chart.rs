//! Plotters-powered dashboard chart widget for Ratatui.
//!
//! The figure itself is decided by [`crate::chart::render`]; this widget only
//! hands it to [`crate::chart::draw_chart`] with the terminal theme, rendered
//! into the Ratatui buffer through `plotters-ratatui-backend`.

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{ChartArtifact, Theme, draw_chart};

pub struct DashboardChart<'a> {
    pub chart: &'a ChartArtifact,
}

impl<'a> Widget for DashboardChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let (x0, x1) = self.chart.x_bounds();
        let (y0, y1) = self.chart.y_range;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let chart = self.chart;
        let theme = Theme::terminal();
        let widget = widget_fn(move |root| {
            draw_chart(&root, chart, &theme)?;
            Ok(())
        });

        widget.render(area, buf);
    }
}
