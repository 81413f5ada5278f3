//! Figure assembly and HTML output.
//!
//! The figure is plain plotly.js JSON: two scatter traces (edges, then
//! nodes) and a fixed layout with hidden axes, no legend and closest-point
//! hover. The HTML page loads plotly.js and draws the embedded figure.

use crate::{
    error::GraphResult,
    store,
    trace::{EdgeTrace, MarkerColor, NodeTrace, TraceStyle},
};
use serde::Serialize;
use std::path::Path;

pub const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Scatter>,
    pub layout: FigureLayout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scatter {
    #[serde(rename = "type")]
    kind: &'static str,
    mode: &'static str,
    hoverinfo: &'static str,
    x: Vec<Option<f64>>,
    y: Vec<Option<f64>>,
    text: Vec<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<Marker>,
}

#[derive(Debug, Clone, Serialize)]
struct Line {
    width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Marker {
    showscale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    colorscale: Option<String>,
    reversescale: bool,
    color: MarkerColor,
    size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    colorbar: Option<ColorBar>,
    line: Line,
}

#[derive(Debug, Clone, Serialize)]
struct ColorBar {
    thickness: u32,
    title: Title,
    xanchor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct Title {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    font: Option<Font>,
}

#[derive(Debug, Clone, Serialize)]
struct Font {
    size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FigureLayout {
    title: Title,
    showlegend: bool,
    hovermode: &'static str,
    margin: Margin,
    xaxis: Axis,
    yaxis: Axis,
}

#[derive(Debug, Clone, Serialize)]
struct Margin {
    b: u32,
    l: u32,
    r: u32,
    t: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Axis {
    showgrid: bool,
    zeroline: bool,
    showticklabels: bool,
}

impl Axis {
    fn hidden() -> Self {
        Self { showgrid: false, zeroline: false, showticklabels: false }
    }
}

impl FigureLayout {
    pub fn new(title: &str) -> Self {
        Self {
            title: Title {
                text: title.to_string(),
                side: None,
                font: Some(Font { size: 16 }),
            },
            showlegend: false,
            hovermode: "closest",
            margin: Margin { b: 20, l: 5, r: 5, t: 40 },
            xaxis: Axis::hidden(),
            yaxis: Axis::hidden(),
        }
    }
}

impl Figure {
    pub fn new(title: &str, edges: EdgeTrace, nodes: NodeTrace, style: &TraceStyle) -> Self {
        let edge_scatter = Scatter {
            kind: "scatter",
            mode: "lines",
            hoverinfo: "text",
            x: edges.x,
            y: edges.y,
            text: edges.text,
            line: Some(Line { width: style.edge_width, color: Some(style.edge_color.clone()) }),
            marker: None,
        };

        let scaled = matches!(nodes.color, MarkerColor::Scale(_));
        let node_scatter = Scatter {
            kind: "scatter",
            mode: "markers",
            hoverinfo: "text",
            x: nodes.x.into_iter().map(Some).collect(),
            y: nodes.y.into_iter().map(Some).collect(),
            text: nodes.text.into_iter().map(Some).collect(),
            line: None,
            marker: Some(Marker {
                showscale: scaled,
                colorscale: scaled.then(|| style.colorscale.clone()),
                reversescale: scaled && style.reverse_scale,
                color: nodes.color,
                size: style.marker_size,
                colorbar: scaled.then(|| ColorBar {
                    thickness: 15,
                    title: Title {
                        text: style.colorbar_title.clone(),
                        side: Some("right"),
                        font: None,
                    },
                    xanchor: "left",
                }),
                line: Line { width: 2.0, color: None },
            }),
        };

        Self {
            data: vec![edge_scatter, node_scatter],
            layout: FigureLayout::new(title),
        }
    }

    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Standalone page drawing this figure.
    pub fn to_html(&self) -> GraphResult<String> {
        // "</" inside a <script> block would end it early.
        let json = self.to_json()?.replace("</", "<\\/");
        let title = escape_html(&strip_tags(&self.layout.title.text));
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_JS}" charset="utf-8"></script>
</head>
<body>
<div id="graph" style="width:100%;height:100vh;"></div>
<script>
var figure = {json};
Plotly.newPlot("graph", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#
        ))
    }

    pub fn write_html(&self, path: impl AsRef<Path>) -> GraphResult<()> {
        store::write_document(path, &self.to_html()?)
    }
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
