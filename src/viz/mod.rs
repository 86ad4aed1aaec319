//! Visualization layer: turns cached query frames into figure JSON.
//!
//! Every chart implements [`Visualization`]; the registry is the single
//! place new charts get wired in, and the HTTP layer drives all of them
//! through one generic render path.

pub mod closure_ratio;
pub mod duration;
pub mod figure;
pub mod figure_cache;
pub mod throughput;

pub use closure_ratio::ClosureRatioViz;
pub use duration::DurationViz;
pub use figure::Figure;
pub use figure_cache::{FigureCache, FigureKey};
pub use throughput::ThroughputViz;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;
use crate::queries::{ChangeRequestFrame, ChangeRequestsQuery, Query};

/// Date bucketing selected by the chart's interval radio. `Day` plots raw
/// dates ("Trend" in the UI), `Month` and `Year` aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Day,
    Month,
    Year,
}

impl Interval {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "D" => Ok(Interval::Day),
            "M" => Ok(Interval::Month),
            "Y" => Ok(Interval::Year),
            other => Err(AppError::InvalidInterval(other.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Interval::Day => "D",
            Interval::Month => "M",
            Interval::Year => "Y",
        }
    }

    /// Snap a timestamp to the start of its bucket.
    pub fn bucket(&self, ts: DateTime<Utc>) -> NaiveDate {
        let date = ts.date_naive();
        match self {
            Interval::Day => date,
            Interval::Month => date.with_day(1).unwrap_or(date),
            Interval::Year => date.with_day(1).and_then(|d| d.with_month(1)).unwrap_or(date),
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Month
    }
}

/// Axis label for a bucket date.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// One chart on the dashboard. `query` names the frame the chart needs;
/// `build` is a pure transform from that frame to figure JSON, so the same
/// cached frame can feed many charts.
pub trait Visualization: Send + Sync {
    fn id(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn group(&self) -> &'static str;

    /// Popover text shown by the "About Graph" control.
    fn about(&self) -> &'static str;

    fn query(&self) -> Arc<dyn Query>;

    fn build(&self, frame: &ChangeRequestFrame, interval: Interval) -> Figure;
}

/// Card metadata for the dashboard index.
#[derive(Debug, Clone, Serialize)]
pub struct VizDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub group: &'static str,
}

#[derive(Default)]
pub struct VizRegistry {
    visualizations: Vec<Arc<dyn Visualization>>,
}

impl VizRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in charts, sharing one change-requests query so a single
    /// cache entry serves every card on the page.
    pub fn with_defaults() -> Self {
        let query = Arc::new(ChangeRequestsQuery::new());
        let mut registry = Self::new();
        registry.register(Arc::new(DurationViz::new(Arc::clone(&query))));
        registry.register(Arc::new(ClosureRatioViz::new(Arc::clone(&query))));
        registry.register(Arc::new(ThroughputViz::new(query)));
        registry
    }

    pub fn register(&mut self, viz: Arc<dyn Visualization>) {
        debug!(viz_id = viz.id(), "registered visualization");
        self.visualizations.push(viz);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Visualization>> {
        self.visualizations
            .iter()
            .find(|viz| viz.id() == id)
            .cloned()
    }

    pub fn descriptors(&self) -> Vec<VizDescriptor> {
        self.visualizations
            .iter()
            .map(|viz| VizDescriptor {
                id: viz.id(),
                title: viz.title(),
                group: viz.group(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.visualizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visualizations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interval_parse_codes() {
        assert_eq!(Interval::parse("D").unwrap(), Interval::Day);
        assert_eq!(Interval::parse("M").unwrap(), Interval::Month);
        assert_eq!(Interval::parse("Y").unwrap(), Interval::Year);
        assert!(Interval::parse("W").is_err());
        assert!(Interval::parse("m").is_err());
    }

    #[test]
    fn test_interval_bucketing() {
        let ts = Utc.with_ymd_and_hms(2023, 5, 17, 13, 45, 0).unwrap();
        assert_eq!(date_label(Interval::Day.bucket(ts)), "2023-05-17");
        assert_eq!(date_label(Interval::Month.bucket(ts)), "2023-05-01");
        assert_eq!(date_label(Interval::Year.bucket(ts)), "2023-01-01");
    }

    #[test]
    fn test_default_registry_contents() {
        let registry = VizRegistry::with_defaults();
        assert_eq!(registry.len(), 3);
        assert!(registry.get("change_request_duration").is_some());
        assert!(registry.get("change_request_closure_ratio").is_some());
        assert!(registry.get("change_request_throughput").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_registered_charts_share_one_query() {
        let registry = VizRegistry::with_defaults();
        let names: Vec<&str> = registry
            .descriptors()
            .iter()
            .map(|d| d.id)
            .map(|id| registry.get(id).unwrap().query().name())
            .collect();
        assert_eq!(names, vec!["change_requests"; 3]);
    }
}
