// ABOUTME: Chart payload models produced by the chart synthesis pipeline
// ABOUTME: ChartKind plus the ChartSpec tagged union and its structural validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::{AppError, AppResult};

/// Visualization kinds a chart payload can take
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Single headline figure
    Number,
    /// Categorical comparison
    Bar,
    /// Trend over an ordered axis
    Line,
    /// Share of a whole
    Pie,
}

impl ChartKind {
    /// Every kind, in the order presented to the model
    pub const ALL: [Self; 4] = [Self::Number, Self::Line, Self::Bar, Self::Pie];

    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
        }
    }

    /// Exact wire-name lookup; no trimming or case folding
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl Display for ChartKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse for operator input: trims and ignores case
impl FromStr for ChartKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(Self::Number),
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            _ => Err(AppError::invalid_input(format!("Unknown chart type: {s}"))),
        }
    }
}

/// Headline number payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberChart {
    /// Chart title
    pub title: String,
    /// Unused for numbers, kept for payload symmetry
    #[serde(rename = "xAxis", default)]
    pub x_axis: String,
    /// Unused for numbers, kept for payload symmetry
    #[serde(rename = "yAxis", default)]
    pub y_axis: String,
    /// The figure itself
    pub data: Number,
}

/// Bar or line payload: one object per point, keyed by the axis names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesChart {
    /// Chart title
    pub title: String,
    /// Key of the category/ordinal field in each point
    #[serde(rename = "xAxis")]
    pub x_axis: String,
    /// Key of the value field in each point
    #[serde(rename = "yAxis")]
    pub y_axis: String,
    /// Points
    pub data: Vec<Map<String, Value>>,
}

/// One pie segment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PieSlice {
    /// Segment label
    pub segment: String,
    /// Segment magnitude
    pub value: Number,
    /// Display color
    pub color: String,
}

/// Pie payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PieChart {
    /// Chart title
    pub title: String,
    /// Optional axis label
    #[serde(rename = "xAxis", default)]
    pub x_axis: String,
    /// Optional axis label
    #[serde(rename = "yAxis", default)]
    pub y_axis: String,
    /// Segments
    pub data: Vec<PieSlice>,
}

/// Validated visualization payload
///
/// Serializes as `{"chartType": <kind>, "chart": {title, xAxis, yAxis, data}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "chartType", content = "chart", rename_all = "lowercase")]
pub enum ChartSpec {
    /// Single figure
    Number(NumberChart),
    /// Bar series
    Bar(SeriesChart),
    /// Line series
    Line(SeriesChart),
    /// Pie segments
    Pie(PieChart),
}

impl ChartSpec {
    /// Kind of this payload
    #[must_use]
    pub const fn kind(&self) -> ChartKind {
        match self {
            Self::Number(_) => ChartKind::Number,
            Self::Bar(_) => ChartKind::Bar,
            Self::Line(_) => ChartKind::Line,
            Self::Pie(_) => ChartKind::Pie,
        }
    }

    /// Chart title
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Number(chart) => &chart.title,
            Self::Bar(chart) | Self::Line(chart) => &chart.title,
            Self::Pie(chart) => &chart.title,
        }
    }

    /// Build a chart from untrusted tool-call arguments
    ///
    /// # Errors
    ///
    /// Returns a validation error when the arguments are not an object, the
    /// `chartType` is missing or unknown, the title is missing, or `data`
    /// violates the contract of the declared kind.
    pub fn from_tool_arguments(arguments: &Value) -> AppResult<Self> {
        let root = arguments
            .as_object()
            .ok_or_else(|| AppError::validation("Tool arguments must be a JSON object"))?;

        let chart_type = root
            .get("chartType")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::validation("Missing chartType"))?;
        let kind = ChartKind::from_wire(chart_type)
            .ok_or_else(|| AppError::validation(format!("Unknown chartType: {chart_type}")))?;

        let chart = root
            .get("chart")
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::validation("Missing chart object"))?;

        let title = required_text(chart, "title")?;
        let x_axis = optional_text(chart, "xAxis")?;
        let y_axis = optional_text(chart, "yAxis")?;
        let data = chart
            .get("data")
            .ok_or_else(|| AppError::validation("Missing chart data"))?;

        match kind {
            ChartKind::Number => {
                let figure = match data {
                    Value::Number(n) => n.clone(),
                    other => {
                        return Err(AppError::validation(format!(
                            "Number chart data must be a single number, got {}",
                            json_type(other)
                        )))
                    }
                };
                Ok(Self::Number(NumberChart {
                    title,
                    x_axis,
                    y_axis,
                    data: figure,
                }))
            }
            ChartKind::Bar | ChartKind::Line => {
                let series = series_points(data, &x_axis, &y_axis, kind)?;
                let chart = SeriesChart {
                    title,
                    x_axis,
                    y_axis,
                    data: series,
                };
                Ok(if kind == ChartKind::Bar {
                    Self::Bar(chart)
                } else {
                    Self::Line(chart)
                })
            }
            ChartKind::Pie => Ok(Self::Pie(PieChart {
                title,
                x_axis,
                y_axis,
                data: pie_slices(data)?,
            })),
        }
    }
}

fn required_text(chart: &Map<String, Value>, key: &str) -> AppResult<String> {
    match chart.get(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(AppError::validation(format!("Missing chart {key}"))),
    }
}

fn optional_text(chart: &Map<String, Value>, key: &str) -> AppResult<String> {
    match chart.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(AppError::validation(format!(
            "Chart {key} must be a string, got {}",
            json_type(other)
        ))),
    }
}

fn series_points(
    data: &Value,
    x_axis: &str,
    y_axis: &str,
    kind: ChartKind,
) -> AppResult<Vec<Map<String, Value>>> {
    if x_axis.is_empty() || y_axis.is_empty() {
        return Err(AppError::validation(format!(
            "{kind} chart requires both xAxis and yAxis"
        )));
    }
    let points = data
        .as_array()
        .ok_or_else(|| AppError::validation(format!("{kind} chart data must be an array")))?;

    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let object = point.as_object().ok_or_else(|| {
                AppError::validation(format!("{kind} chart point {index} is not an object"))
            })?;
            for axis in [x_axis, y_axis] {
                if !object.contains_key(axis) {
                    return Err(AppError::validation(format!(
                        "{kind} chart point {index} is missing key '{axis}'"
                    )));
                }
            }
            Ok(object.clone())
        })
        .collect()
}

fn pie_slices(data: &Value) -> AppResult<Vec<PieSlice>> {
    let slices = data
        .as_array()
        .ok_or_else(|| AppError::validation("pie chart data must be an array"))?;

    slices
        .iter()
        .enumerate()
        .map(|(index, slice)| {
            let object = slice.as_object().ok_or_else(|| {
                AppError::validation(format!("pie segment {index} is not an object"))
            })?;
            let segment = object.get("segment").and_then(Value::as_str);
            let value = object.get("value").and_then(|v| match v {
                Value::Number(n) => Some(n.clone()),
                _ => None,
            });
            let color = object.get("color").and_then(Value::as_str);
            match (segment, value, color) {
                (Some(segment), Some(value), Some(color)) => Ok(PieSlice {
                    segment: segment.to_owned(),
                    value,
                    color: color.to_owned(),
                }),
                _ => Err(AppError::validation(format!(
                    "pie segment {index} must have string segment, numeric value, and string color"
                ))),
            }
        })
        .collect()
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_bar_chart_accepts_points_with_axis_keys() {
        let args = json!({
            "chartType": "bar",
            "chart": {
                "title": "Orders by region",
                "xAxis": "region",
                "yAxis": "orders",
                "data": [{"region": "EU", "orders": 12}, {"region": "US", "orders": 30}]
            }
        });
        let spec = ChartSpec::from_tool_arguments(&args).unwrap();
        assert_eq!(spec.kind(), ChartKind::Bar);
        assert_eq!(spec.title(), "Orders by region");
        assert_eq!(serde_json::to_value(&spec).unwrap(), args);
    }

    #[test]
    fn test_line_chart_point_missing_axis_is_rejected() {
        let args = json!({
            "chartType": "line",
            "chart": {
                "title": "Signups",
                "xAxis": "day",
                "yAxis": "count",
                "data": [{"day": "2024-01-01", "count": 3}, {"day": "2024-01-02"}]
            }
        });
        let err = ChartSpec::from_tool_arguments(&args).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("count"));
    }

    #[test]
    fn test_number_chart_requires_single_number() {
        let ok = json!({"chartType": "number", "chart": {"title": "Revenue", "data": 1250.5}});
        assert!(matches!(
            ChartSpec::from_tool_arguments(&ok).unwrap(),
            ChartSpec::Number(_)
        ));

        let bad = json!({"chartType": "number", "chart": {"title": "Revenue", "data": [1, 2]}});
        assert!(ChartSpec::from_tool_arguments(&bad).is_err());
    }

    #[test]
    fn test_pie_slice_shape_enforced() {
        let bad = json!({
            "chartType": "pie",
            "chart": {"title": "Share", "data": [{"segment": "A", "value": "10", "color": "#fff"}]}
        });
        assert!(ChartSpec::from_tool_arguments(&bad).is_err());
    }

    #[test]
    fn test_pie_segment_without_value_rejected() {
        let args = json!({
            "chartType": "pie",
            "chart": {"title": "Share", "data": [{"segment": "A", "color": "#ff0000"}]}
        });
        let err = ChartSpec::from_tool_arguments(&args).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("segment 0"));
    }

    #[test]
    fn test_chart_type_is_not_coerced() {
        for chart_type in [" PIE ", "Bar", "LINE", "number "] {
            let args = json!({"chartType": chart_type, "chart": {"title": "t", "data": []}});
            let err = ChartSpec::from_tool_arguments(&args).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed, "{chart_type:?}");
        }
    }

    #[test]
    fn test_operator_kind_parse_is_lenient() {
        assert_eq!(" PIE ".parse::<ChartKind>().unwrap(), ChartKind::Pie);
        assert_eq!(ChartKind::from_wire("Pie"), None);
        assert_eq!(ChartKind::from_wire("pie"), Some(ChartKind::Pie));
    }

    #[test]
    fn test_unknown_kind_and_missing_title_rejected() {
        let unknown = json!({"chartType": "scatter", "chart": {"title": "x", "data": []}});
        assert!(ChartSpec::from_tool_arguments(&unknown).is_err());

        let untitled = json!({"chartType": "pie", "chart": {"data": []}});
        let err = ChartSpec::from_tool_arguments(&untitled).unwrap_err();
        assert!(err.message.contains("title"));
    }
}
