//! Aggregated view types.
//!
//! A view is transient: it is rebuilt from the dataset on every render and
//! dropped once the chart exists.

use serde::Serialize;

use crate::domain::{Column, KeyValue, Reducer};
use crate::math::LinearFit;

/// Output of [`crate::aggregate::aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AggregatedView {
    Grouped(GroupedView),
    Scatter(ScatterView),
}

impl AggregatedView {
    /// Number of groups (or scatter points) available to draw.
    pub fn group_count(&self) -> usize {
        match self {
            AggregatedView::Grouped(g) => g.groups.len(),
            AggregatedView::Scatter(s) => s.points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.group_count() == 0
    }

    pub fn as_grouped(&self) -> Option<&GroupedView> {
        match self {
            AggregatedView::Grouped(g) => Some(g),
            AggregatedView::Scatter(_) => None,
        }
    }

    pub fn as_scatter(&self) -> Option<&ScatterView> {
        match self {
            AggregatedView::Scatter(s) => Some(s),
            AggregatedView::Grouped(_) => None,
        }
    }
}

/// Rows grouped by one or more key columns, one reduced value per value column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedView {
    pub keys: Vec<Column>,
    pub values: Vec<Column>,
    pub reducer: Reducer,
    /// Groups in display order.
    pub groups: Vec<Group>,
}

impl GroupedView {
    pub fn key_index(&self, column: Column) -> Option<usize> {
        self.keys.iter().position(|c| *c == column)
    }

    pub fn value_index(&self, column: Column) -> Option<usize> {
        self.values.iter().position(|c| *c == column)
    }

    /// Group whose key matches `key` exactly.
    pub fn find(&self, key: &[KeyValue]) -> Option<&Group> {
        self.groups.iter().find(|g| g.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    /// One value per key column, in `GroupedView::keys` order.
    pub key: Vec<KeyValue>,
    /// Number of source rows in the group.
    pub rows: usize,
    /// One reduced value per value column, in `GroupedView::values` order.
    pub values: Vec<f64>,
    /// 95% confidence half-width per value column (mean reducer only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci95: Option<Vec<f64>>,
}

/// Ungrouped `(x, y)` rows with their least-squares line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub x: Column,
    pub y: Column,
    /// Source rows in dataset order.
    pub points: Vec<(f64, f64)>,
    pub fit: Option<LinearFit>,
}
