//! Draw a [`ChartArtifact`] with Plotters.
//!
//! The same routine targets two very different surfaces:
//! - the terminal, through `plotters-ratatui-backend` (low resolution, no
//!   alpha blending, dark background)
//! - SVG files (full resolution, white background)
//!
//! [`Theme`] carries the differences so the drawing code stays single-path.

use plotters::chart::SeriesAnno;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::{ChartArtifact, SeriesStyle};
use crate::domain::ChartKind;

/// Half the width of a bar, in category units.
const BAR_HALF_WIDTH: f64 = 0.4;

/// Point marker shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Single cell. The ratatui backend maps circle radii incorrectly
    /// (pixel radius -> normalized canvas units), so terminals use this.
    Pixel,
    Circle(u32),
}

/// Surface-specific styling.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub foreground: RGBColor,
    pub background: Option<RGBColor>,
    pub grid: Option<RGBColor>,
    pub font_size: u32,
    /// Draw the title inside the chart (terminal panels title their block instead).
    pub title_size: Option<u32>,
    pub margin: u32,
    pub y_label_area: u32,
    pub x_label_area: u32,
    pub marker: Marker,
    pub line_width: u32,
    pub whisker_width: u32,
    pub legend: bool,
    /// Honor series opacity. Terminal cells cannot blend.
    pub blend: bool,
}

impl Theme {
    pub fn terminal() -> Self {
        Self {
            foreground: WHITE,
            background: None,
            grid: None,
            font_size: 10,
            title_size: None,
            margin: 1,
            y_label_area: 6,
            x_label_area: 3,
            marker: Marker::Pixel,
            line_width: 1,
            whisker_width: 2,
            // Rendered as a ratatui line next to the chart.
            legend: false,
            blend: false,
        }
    }

    pub fn svg() -> Self {
        Self {
            foreground: BLACK,
            background: Some(WHITE),
            grid: Some(RGBColor(220, 220, 220)),
            font_size: 16,
            title_size: Some(24),
            margin: 20,
            y_label_area: 70,
            x_label_area: 50,
            marker: Marker::Circle(4),
            line_width: 2,
            whisker_width: 12,
            legend: true,
            blend: true,
        }
    }
}

/// Draw `chart` onto `area`.
pub fn draw_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    chart: &ChartArtifact,
    theme: &Theme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if let Some(bg) = theme.background {
        area.fill(&bg)?;
    }

    let (x0, x1) = chart.x_bounds();
    let (y0, y1) = chart.y_range;
    let fg = theme.foreground;
    let label_font = ("sans-serif", theme.font_size).into_font().color(&fg);

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(theme.margin)
        .set_label_area_size(LabelAreaPosition::Left, theme.y_label_area)
        .set_label_area_size(LabelAreaPosition::Bottom, theme.x_label_area);
    if let Some(size) = theme.title_size {
        builder.caption(&chart.title, ("sans-serif", size).into_font().color(&fg));
    }
    let mut ctx = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    let categories = chart.categories();
    let fmt_x = |v: &f64| -> String {
        if categories.is_empty() {
            return format!("{v:.2}");
        }
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        categories.get(idx as usize).cloned().unwrap_or_default()
    };
    let y_span = y1 - y0;
    let fmt_y = |v: &f64| -> String {
        if y_span < 10.0 {
            format!("{v:.2}")
        } else {
            format!("{v:.0}")
        }
    };

    let mut mesh = ctx.configure_mesh();
    mesh.x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_labels(if categories.is_empty() { 5 } else { categories.len() })
        .y_labels(5)
        .x_label_formatter(&fmt_x)
        .y_label_formatter(&fmt_y)
        .label_style(label_font.clone())
        .axis_style(&fg);
    match theme.grid {
        Some(grid) => {
            mesh.bold_line_style(&grid).light_line_style(&grid.mix(0.3));
        }
        None => {
            mesh.disable_y_mesh();
        }
    }
    // Only the numeric temperature axis gets vertical grid lines.
    if chart.kind != ChartKind::ScatterWithRegression || theme.grid.is_none() {
        mesh.disable_x_mesh();
    }
    mesh.draw()?;

    let show_legend = theme.legend && chart.kind != ChartKind::BarWithError;
    let legend_prefix = chart
        .legend_title
        .as_deref()
        .map(|t| format!("{t} "))
        .unwrap_or_default();

    for s in &chart.series {
        let base = RGBColor(s.color.0, s.color.1, s.color.2);
        let color = base.mix(if theme.blend { s.opacity } else { 1.0 });
        let label = format!("{legend_prefix}{}", s.name);

        match s.style {
            SeriesStyle::Bars => {
                let anno = ctx.draw_series(s.points.iter().map(|&(x, y)| {
                    Rectangle::new(
                        [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, y)],
                        color.filled(),
                    )
                }))?;
                if show_legend {
                    anno.label(label)
                        .legend(move |(lx, ly)| Rectangle::new([(lx, ly - 5), (lx + 14, ly + 5)], color.filled()));
                }

                if let Some(errors) = &s.errors {
                    let whisker = fg.stroke_width(theme.line_width);
                    ctx.draw_series(s.points.iter().zip(errors).map(|(&(x, y), &e)| {
                        ErrorBar::new_vertical(x, y - e, y, y + e, whisker, theme.whisker_width)
                    }))?;
                }
            }
            SeriesStyle::LineWithMarkers | SeriesStyle::Line => {
                let style = color.stroke_width(theme.line_width);
                let anno = ctx.draw_series(LineSeries::new(s.points.iter().copied(), style))?;
                if show_legend {
                    anno.label(label)
                        .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 14, ly)], style));
                }
                if s.style == SeriesStyle::LineWithMarkers {
                    draw_markers(&mut ctx, &s.points, color, theme.marker)?;
                }
            }
            SeriesStyle::Points => {
                let anno = draw_markers(&mut ctx, &s.points, color, theme.marker)?;
                if show_legend {
                    anno.label(label)
                        .legend(move |(lx, ly)| Circle::new((lx + 7, ly), 4, color.filled()));
                }
            }
        }
    }

    if show_legend {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&theme.background.unwrap_or(WHITE).mix(0.8))
            .border_style(&fg)
            .label_font(label_font)
            .draw()?;
    }

    Ok(())
}

fn draw_markers<'a, 'c, DB: DrawingBackend>(
    ctx: &'c mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    points: &[(f64, f64)],
    color: RGBAColor,
    marker: Marker,
) -> Result<&'c mut SeriesAnno<'a, DB>, DrawingAreaErrorKind<DB::ErrorType>> {
    match marker {
        Marker::Pixel => ctx.draw_series(points.iter().map(|&p| Pixel::new(p, color))),
        Marker::Circle(r) => ctx.draw_series(points.iter().map(|&p| Circle::new(p, r, color.filled()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Series, XAxis};

    fn bar_chart() -> ChartArtifact {
        ChartArtifact {
            kind: ChartKind::GroupedBar,
            title: "Number of Bicycle Rentals by Season".to_string(),
            x_label: "season".to_string(),
            y_label: "rentals".to_string(),
            legend_title: None,
            x_axis: XAxis::Categories(vec!["1".to_string(), "2".to_string()]),
            y_range: (0.0, 50.0),
            series: vec![Series {
                name: "Registered".to_string(),
                style: SeriesStyle::Bars,
                color: (31, 119, 180),
                opacity: 0.6,
                points: vec![(0.0, 13.0), (1.0, 40.0)],
                errors: None,
            }],
            caption: String::new(),
        }
    }

    #[test]
    fn svg_output_contains_title_and_legend() {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (800, 500)).into_drawing_area();
            draw_chart(&root, &bar_chart(), &Theme::svg()).unwrap();
            root.present().unwrap();
        }
        assert!(svg.contains("Number of Bicycle Rentals by Season"));
        assert!(svg.contains("Registered"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn terminal_theme_has_no_in_chart_title() {
        let theme = Theme::terminal();
        assert!(theme.title_size.is_none());
        assert_eq!(theme.marker, Marker::Pixel);
        assert!(!theme.blend);
    }
}
