//! The five dashboard views as a static table.
//!
//! Each entry ties together the question a panel answers, the aggregation that
//! answers it, how the result is drawn, and the explanation shown beneath it.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::types::{ChartKind, Column, Reducer};

/// Identifier of one dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewId {
    Season,
    Weather,
    Monthly,
    Temperature,
    Workingday,
}

impl ViewId {
    /// Panel order.
    pub const ALL: [ViewId; 5] = [
        ViewId::Season,
        ViewId::Weather,
        ViewId::Monthly,
        ViewId::Temperature,
        ViewId::Workingday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewId::Season => "season",
            ViewId::Weather => "weather",
            ViewId::Monthly => "monthly",
            ViewId::Temperature => "temperature",
            ViewId::Workingday => "workingday",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<ViewId> {
        ViewId::ALL.get(idx).copied()
    }

    pub fn def(self) -> &'static ViewDef {
        &VIEWS[self.index()]
    }
}

/// Aggregation parameters, by column name.
#[derive(Debug, Clone, Copy)]
pub struct ViewQuery {
    pub keys: &'static [&'static str],
    pub values: &'static [&'static str],
    pub reducer: Reducer,
}

/// Declarative mapping from an aggregated view to a chart.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// Category (or numeric x) field.
    pub x_field: Column,
    /// Reduced value column(s) drawn on the y-axis.
    pub y_fields: &'static [Column],
    /// Key column that splits the data into one series per value.
    pub series_field: Option<Column>,
    /// Display names for the `y_fields` (bar charts) or the point/line pair (scatter).
    pub series_labels: &'static [&'static str],
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub legend_title: Option<&'static str>,
}

/// Everything one panel needs.
#[derive(Debug, Clone, Copy)]
pub struct ViewDef {
    pub id: ViewId,
    /// Short label for the panel selector.
    pub tab: &'static str,
    /// The question the panel answers.
    pub heading: &'static str,
    pub query: ViewQuery,
    pub chart: ChartSpec,
    pub caption: &'static str,
}

pub static VIEWS: [ViewDef; 5] = [
    ViewDef {
        id: ViewId::Season,
        tab: "Season",
        heading: "How does the season affect the pattern of bicycle rentals?",
        query: ViewQuery {
            keys: &["season"],
            values: &["registered", "casual"],
            reducer: Reducer::Sum,
        },
        chart: ChartSpec {
            kind: ChartKind::GroupedBar,
            x_field: Column::Season,
            y_fields: &[Column::Registered, Column::Casual],
            series_field: None,
            series_labels: &["Registered", "Casual"],
            title: "Number of Bicycle Rentals by Season",
            x_label: "season",
            y_label: "rentals",
            legend_title: None,
        },
        caption: "The data shows that bike rental patterns are strongly \
                  influenced by the season, with the fall being the most \
                  preferred time for cycling. This could be due to more \
                  favourable weather conditions.",
    },
    ViewDef {
        id: ViewId::Weather,
        tab: "Weather",
        heading: "Does the weather affect the pattern of bicycle rentals?",
        query: ViewQuery {
            keys: &["weathersit"],
            values: &["registered", "casual"],
            reducer: Reducer::Sum,
        },
        chart: ChartSpec {
            kind: ChartKind::GroupedBar,
            x_field: Column::Weathersit,
            y_fields: &[Column::Registered, Column::Casual],
            series_field: None,
            series_labels: &["Registered", "Casual"],
            title: "Number of Bicycle Rentals by Weather",
            x_label: "weathersit",
            y_label: "rentals",
            legend_title: None,
        },
        caption: "The pattern of bicycle rentals based on weather shows \
                  that the most bicycle users occur during clear weather. \
                  This means that the highest number of bicycle rentals \
                  occur during clear weather. In contrast, bicycle rentals \
                  slightly decrease during misty weather. In addition, the \
                  least number of bicycle rentals occurs during rainy weather.",
    },
    ViewDef {
        id: ViewId::Monthly,
        tab: "2011 vs 2012",
        heading: "What is the trend in the number of bicycle rentals between 2011 and 2012?",
        query: ViewQuery {
            keys: &["mnth", "yr"],
            values: &["cnt"],
            reducer: Reducer::Sum,
        },
        chart: ChartSpec {
            kind: ChartKind::LineWithMarkers,
            x_field: Column::Mnth,
            y_fields: &[Column::Cnt],
            series_field: Some(Column::Yr),
            series_labels: &[],
            title: "Bicycle Rental Trend",
            x_label: "mnth",
            y_label: "cnt",
            legend_title: Some("Year"),
        },
        caption: "There is a difference in bicycle rental demand in 2011 and 2012, \
                  where in 2012 there were more demanders than 2011. In addition, the \
                  data shows that from the beginning of the year, demand always increases \
                  until the middle of the year, then decreases until the end of the year.",
    },
    ViewDef {
        id: ViewId::Temperature,
        tab: "Temperature",
        heading: "How does temperature affect the number of bicycle rentals?",
        query: ViewQuery {
            keys: &[],
            values: &["temp", "cnt"],
            reducer: Reducer::Identity,
        },
        chart: ChartSpec {
            kind: ChartKind::ScatterWithRegression,
            x_field: Column::Temp,
            y_fields: &[Column::Cnt],
            series_field: None,
            series_labels: &["Data Points", "Regression Line"],
            title: "Effect of Temperature on Bike Rentals",
            x_label: "Temperature (Normalized)",
            y_label: "Number of Bike Rentals",
            legend_title: None,
        },
        caption: "Temperature has an effect on the number of bicycle rental demand, \
                  where the number of bicycle demand, increases along with the increase \
                  in temperature, but will slightly decrease when the temperature position is too high.",
    },
    ViewDef {
        id: ViewId::Workingday,
        tab: "Working day",
        heading: "What is the trend of bicycle usage on weekdays compared to weekends or holidays?",
        query: ViewQuery {
            keys: &["workingday"],
            values: &["cnt"],
            reducer: Reducer::Mean,
        },
        chart: ChartSpec {
            kind: ChartKind::BarWithError,
            x_field: Column::Workingday,
            y_fields: &[Column::Cnt],
            series_field: None,
            series_labels: &["Average"],
            title: "Average Bike Rentals: Working Day vs Weekend/Holiday",
            x_label: "workingday",
            y_label: "Average Number of Bike Rentals",
            legend_title: None,
        },
        caption: "The number of bicycle rentals is higher on workingday. \
                  This shows that people use bicycles more for daily activities.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_view_id() {
        for id in ViewId::ALL {
            assert_eq!(id.def().id, id);
            assert_eq!(ViewId::from_index(id.index()), Some(id));
        }
        assert_eq!(ViewId::from_index(5), None);
    }

    #[test]
    fn query_columns_exist() {
        for def in &VIEWS {
            for name in def.query.keys.iter().chain(def.query.values) {
                assert!(Column::from_name(name).is_some(), "{name} in {:?}", def.id);
            }
        }
    }

    #[test]
    fn captions_are_single_spaced() {
        for def in &VIEWS {
            assert!(!def.caption.contains("  "), "{:?}", def.id);
            assert!(def.caption.ends_with('.'));
        }
    }
}
