//! Opened and closed change request counts per interval bucket.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::figure::{Axis, Figure, Layout, Trace};
use super::{date_label, Interval, Visualization};
use crate::queries::{ChangeRequestFrame, ChangeRequestsQuery, Query};

/// Grouped bars of how many change requests were opened and how many were
/// closed in each bucket. Buckets cover the union of both series so a
/// quiet month with only closures still shows up.
pub struct ThroughputViz {
    query: Arc<ChangeRequestsQuery>,
}

impl ThroughputViz {
    pub fn new(query: Arc<ChangeRequestsQuery>) -> Self {
        Self { query }
    }
}

impl Visualization for ThroughputViz {
    fn id(&self) -> &'static str {
        "change_request_throughput"
    }

    fn title(&self) -> &'static str {
        "Change Request Throughput"
    }

    fn group(&self) -> &'static str {
        "change-requests"
    }

    fn about(&self) -> &'static str {
        "Counts change requests opened and closed in each time window. \
         Comparing the two bars shows whether the project is keeping up \
         with incoming work or accumulating a backlog."
    }

    fn query(&self) -> Arc<dyn Query> {
        Arc::clone(&self.query) as Arc<dyn Query>
    }

    fn build(&self, frame: &ChangeRequestFrame, interval: Interval) -> Figure {
        let mut opened: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
        let mut closed: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();

        for row in &frame.rows {
            *opened.entry(interval.bucket(row.created_at)).or_insert(0) += 1;
            if let Some(closed_at) = row.closed_at {
                *closed.entry(interval.bucket(closed_at)).or_insert(0) += 1;
            }
        }

        let buckets: Vec<chrono::NaiveDate> = opened
            .keys()
            .chain(closed.keys())
            .copied()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let x: Vec<String> = buckets.iter().copied().map(date_label).collect();
        let opened_y: Vec<f64> = buckets
            .iter()
            .map(|b| opened.get(b).copied().unwrap_or(0) as f64)
            .collect();
        let closed_y: Vec<f64> = buckets
            .iter()
            .map(|b| closed.get(b).copied().unwrap_or(0) as f64)
            .collect();

        Figure {
            data: vec![
                Trace::bars("Opened", x.clone(), opened_y),
                Trace::bars("Closed", x, closed_y),
            ],
            layout: Layout {
                title: Some(format!("Change Request Throughput ({})", interval.code())),
                xaxis: Some(Axis::titled("Time")),
                yaxis: Some(Axis::titled("Change Requests")),
                hovermode: Some("x"),
                barmode: Some("group"),
                ..Layout::default()
            },
        }
    }
}
