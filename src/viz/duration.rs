//! How long change requests stay open before closing.

use std::sync::Arc;

use super::figure::{Axis, Figure, Layout, Trace};
use super::{date_label, Interval, Visualization};
use crate::queries::{ChangeRequestFrame, ChangeRequestsQuery, Query};

/// Line chart of time-to-close in days, one point per closed change
/// request, plotted at its creation date. Open requests have no duration
/// yet and are left out.
pub struct DurationViz {
    query: Arc<ChangeRequestsQuery>,
}

impl DurationViz {
    pub fn new(query: Arc<ChangeRequestsQuery>) -> Self {
        Self { query }
    }
}

impl Visualization for DurationViz {
    fn id(&self) -> &'static str {
        "change_request_duration"
    }

    fn title(&self) -> &'static str {
        "Change Request Duration"
    }

    fn group(&self) -> &'static str {
        "change-requests"
    }

    fn about(&self) -> &'static str {
        "Tracks how long change requests stay open before they are closed. \
         Each point is one closed change request, plotted at its creation \
         date with the number of days until it closed. Long or growing \
         durations suggest review capacity problems."
    }

    fn query(&self) -> Arc<dyn Query> {
        Arc::clone(&self.query) as Arc<dyn Query>
    }

    fn build(&self, frame: &ChangeRequestFrame, interval: Interval) -> Figure {
        let mut points: Vec<(chrono::DateTime<chrono::Utc>, f64)> = frame
            .rows
            .iter()
            .filter_map(|row| {
                row.closed_at
                    .map(|closed| (row.created_at, (closed - row.created_at).num_days() as f64))
            })
            .collect();
        points.sort_by_key(|(created, _)| *created);

        let x = points
            .iter()
            .map(|(created, _)| date_label(created.date_naive()))
            .collect();
        let y = points.iter().map(|(_, days)| *days).collect();

        Figure {
            data: vec![Trace::lines("Duration of change requests", x, y)],
            layout: Layout {
                title: Some(format!(
                    "Change Request Duration over Time ({})",
                    interval.code()
                )),
                xaxis: Some(Axis::titled("Time")),
                yaxis: Some(Axis::titled("Change Request Duration (Days)")),
                hovermode: Some("x"),
                ..Layout::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::ChangeRequestRow;
    use chrono::{TimeZone, Utc};

    fn viz() -> DurationViz {
        DurationViz::new(Arc::new(ChangeRequestsQuery::new()))
    }

    fn row(id: i64, created: (i32, u32, u32), closed: Option<(i32, u32, u32)>) -> ChangeRequestRow {
        ChangeRequestRow {
            change_request_id: id,
            repo_id: 101,
            created_at: Utc
                .with_ymd_and_hms(created.0, created.1, created.2, 0, 0, 0)
                .unwrap(),
            closed_at: closed.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_plots_days_to_close_per_closed_request() {
        let frame = ChangeRequestFrame {
            rows: vec![row(1, (2023, 1, 1), Some((2023, 1, 5)))],
        };
        let figure = viz().build(&frame, Interval::Month);

        assert_eq!(figure.data.len(), 1);
        assert_eq!(figure.data[0].x, vec!["2023-01-01"]);
        assert_eq!(figure.data[0].y, vec![4.0]);
        assert_eq!(
            figure.layout.title.as_deref(),
            Some("Change Request Duration over Time (M)")
        );
        assert_eq!(figure.layout.hovermode, Some("x"));
    }

    #[test]
    fn test_open_requests_are_excluded() {
        let frame = ChangeRequestFrame {
            rows: vec![
                row(1, (2023, 1, 1), Some((2023, 1, 11))),
                row(2, (2023, 1, 2), None),
            ],
        };
        let figure = viz().build(&frame, Interval::Day);

        assert_eq!(figure.data[0].len(), 1);
        assert_eq!(figure.data[0].y, vec![10.0]);
    }

    #[test]
    fn test_points_are_ordered_by_creation_date() {
        let frame = ChangeRequestFrame {
            rows: vec![
                row(2, (2023, 3, 1), Some((2023, 3, 2))),
                row(1, (2023, 1, 1), Some((2023, 1, 5))),
            ],
        };
        let figure = viz().build(&frame, Interval::Month);

        assert_eq!(figure.data[0].x, vec!["2023-01-01", "2023-03-01"]);
        assert_eq!(figure.data[0].y, vec![4.0, 1.0]);
    }

    #[test]
    fn test_interval_only_changes_title() {
        let frame = ChangeRequestFrame {
            rows: vec![row(1, (2023, 1, 1), Some((2023, 1, 5)))],
        };
        let monthly = viz().build(&frame, Interval::Month);
        let yearly = viz().build(&frame, Interval::Year);

        assert_eq!(monthly.data[0].x, yearly.data[0].x);
        assert_ne!(monthly.layout.title, yearly.layout.title);
    }

    #[test]
    fn test_rebuilding_from_same_frame_is_identical() {
        let frame = ChangeRequestFrame {
            rows: vec![
                row(1, (2023, 1, 1), Some((2023, 1, 5))),
                row(2, (2023, 2, 1), None),
            ],
        };
        let first = serde_json::to_value(viz().build(&frame, Interval::Month)).unwrap();
        let second = serde_json::to_value(viz().build(&frame, Interval::Month)).unwrap();

        assert_eq!(first, second);
    }
}
