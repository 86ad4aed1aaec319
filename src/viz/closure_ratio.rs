//! Ratio of closed to opened change requests per interval bucket.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::figure::{Axis, Figure, Layout, Trace};
use super::{date_label, Interval, Visualization};
use crate::queries::{ChangeRequestFrame, ChangeRequestsQuery, Query};

/// For each bucket, the number of change requests closed in it divided by
/// the number opened in it. A ratio holding at or above 1.0 means the
/// backlog is not growing. Buckets where nothing was opened are skipped
/// rather than plotted as a division by zero.
pub struct ClosureRatioViz {
    query: Arc<ChangeRequestsQuery>,
}

impl ClosureRatioViz {
    pub fn new(query: Arc<ChangeRequestsQuery>) -> Self {
        Self { query }
    }
}

impl Visualization for ClosureRatioViz {
    fn id(&self) -> &'static str {
        "change_request_closure_ratio"
    }

    fn title(&self) -> &'static str {
        "Change Request Closure Ratio"
    }

    fn group(&self) -> &'static str {
        "change-requests"
    }

    fn about(&self) -> &'static str {
        "Monitors whether change requests are being dealt with efficiently \
         by ratioing the number closed in each time window against the \
         number opened in that same window. Keeping the ratio near or above \
         one helps to keep the backlog, and merge conflicts, down."
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

        let mut x = Vec::with_capacity(opened.len());
        let mut y = Vec::with_capacity(opened.len());
        for (bucket, opened_count) in &opened {
            let closed_count = closed.get(bucket).copied().unwrap_or(0);
            x.push(date_label(*bucket));
            y.push(closed_count as f64 / *opened_count as f64);
        }

        Figure {
            data: vec![Trace::lines("Closed / opened", x, y)],
            layout: Layout {
                title: Some(format!(
                    "Change Request Closure Ratio ({})",
                    interval.code()
                )),
                xaxis: Some(Axis::titled("Time")),
                yaxis: Some(Axis::titled("Closed / Opened")),
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

    fn viz() -> ClosureRatioViz {
        ClosureRatioViz::new(Arc::new(ChangeRequestsQuery::new()))
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
    fn test_monthly_ratio_of_closed_to_opened() {
        // January: 2 opened, 1 closed in-month. February: 1 opened, and the
        // January leftover closes here, so 2 closures over 1 opening.
        let frame = ChangeRequestFrame {
            rows: vec![
                row(1, (2023, 1, 1), Some((2023, 1, 10))),
                row(2, (2023, 1, 15), Some((2023, 2, 2))),
                row(3, (2023, 2, 5), Some((2023, 2, 20))),
            ],
        };
        let figure = viz().build(&frame, Interval::Month);

        assert_eq!(figure.data[0].x, vec!["2023-01-01", "2023-02-01"]);
        assert_eq!(figure.data[0].y, vec![0.5, 2.0]);
    }

    #[test]
    fn test_bucket_with_only_closures_is_skipped() {
        // The March closure has no March openings; no ratio is plotted
        // for it instead of dividing by zero.
        let frame = ChangeRequestFrame {
            rows: vec![row(1, (2023, 1, 1), Some((2023, 3, 1)))],
        };
        let figure = viz().build(&frame, Interval::Month);

        assert_eq!(figure.data[0].x, vec!["2023-01-01"]);
        assert_eq!(figure.data[0].y, vec![0.0]);
    }

    #[test]
    fn test_open_requests_count_toward_openings_only() {
        let frame = ChangeRequestFrame {
            rows: vec![
                row(1, (2023, 1, 1), None),
                row(2, (2023, 1, 2), Some((2023, 1, 3))),
            ],
        };
        let figure = viz().build(&frame, Interval::Month);

        assert_eq!(figure.data[0].y, vec![0.5]);
    }

    #[test]
    fn test_yearly_buckets_collapse_months() {
        let frame = ChangeRequestFrame {
            rows: vec![
                row(1, (2023, 1, 1), Some((2023, 6, 1))),
                row(2, (2023, 11, 1), Some((2024, 1, 5))),
            ],
        };
        let figure = viz().build(&frame, Interval::Year);

        assert_eq!(figure.data[0].x, vec!["2023-01-01"]);
        assert_eq!(figure.data[0].y, vec![0.5]);
    }
}
