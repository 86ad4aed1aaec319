//! Figure JSON assembled server-side and drawn by plotly on the client.
//!
//! Only the handful of trace/layout fields the dashboard uses are modeled;
//! optional fields are skipped entirely so the payload stays minimal.

use serde::Serialize;

pub const NO_DATA_TEXT: &str = "No data available for this selection.";
pub const LOAD_FAILED_TEXT: &str = "Data could not be loaded for this selection.";

#[derive(Debug, Clone, Default, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

impl Trace {
    pub fn lines(name: impl Into<String>, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter",
            mode: Some("lines"),
            name: name.into(),
            x,
            y,
        }
    }

    pub fn bars(name: impl Into<String>, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            kind: "bar",
            mode: None,
            name: name.into(),
            x,
            y,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl Axis {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            visible: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            title: None,
            visible: Some(false),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: &'static str,
    pub yref: &'static str,
    pub showarrow: bool,
    pub font: AnnotationFont,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationFont {
    pub size: u32,
}

/// Empty figure with hidden axes and a single centered message, used for
/// both the no-data and the load-failure renders (with different text).
fn placeholder(text: &str) -> Figure {
    Figure {
        data: Vec::new(),
        layout: Layout {
            xaxis: Some(Axis::hidden()),
            yaxis: Some(Axis::hidden()),
            annotations: vec![Annotation {
                text: text.to_string(),
                xref: "paper",
                yref: "paper",
                showarrow: false,
                font: AnnotationFont { size: 28 },
            }],
            ..Layout::default()
        },
    }
}

/// The selection produced an empty result set.
pub fn placeholder_no_data() -> Figure {
    placeholder(NO_DATA_TEXT)
}

/// The query behind the figure failed or is still running past the wait
/// ceiling; distinct from having no rows.
pub fn placeholder_load_failed() -> Figure {
    placeholder(LOAD_FAILED_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_trace_serializes_as_scatter() {
        let trace = Trace::lines("Duration", vec!["2023-01-01".into()], vec![4.0]);
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["type"], "scatter");
        assert_eq!(json["mode"], "lines");
        assert_eq!(json["x"][0], "2023-01-01");
        assert_eq!(json["y"][0], 4.0);
    }

    #[test]
    fn test_bar_trace_omits_mode() {
        let trace = Trace::bars("Opened", vec![], vec![]);
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["type"], "bar");
        assert!(json.get("mode").is_none());
    }

    #[test]
    fn test_empty_layout_serializes_to_empty_object() {
        let json = serde_json::to_value(Layout::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_placeholders_hide_axes_and_differ_in_text() {
        let no_data = placeholder_no_data();
        let failed = placeholder_load_failed();

        assert!(no_data.data.is_empty());
        assert_eq!(no_data.layout.xaxis.as_ref().unwrap().visible, Some(false));
        assert_eq!(no_data.layout.annotations[0].text, NO_DATA_TEXT);
        assert_eq!(failed.layout.annotations[0].text, LOAD_FAILED_TEXT);
        assert_ne!(
            no_data.layout.annotations[0].text,
            failed.layout.annotations[0].text
        );
    }
}
