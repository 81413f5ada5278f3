//! Trace building: turn a positioned graph into an edge poly-line and a
//! node marker set.

use crate::{
    error::GraphResult,
    graph::{DealGraph, DegreeMode, EdgeView},
    table::Cell,
    types::EntityId,
};
use serde::{Deserialize, Serialize};

/// How node markers are coloured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Colour scalar = node degree.
    #[default]
    Degree,
    /// Every node gets the same colour.
    Fixed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceStyle {
    /// Edge hover reads "<target> <verb> <source> ...".
    pub verb: String,
    pub amount_column: Option<String>,
    pub currency_column: Option<String>,
    pub date_column: Option<String>,
    pub degree: DegreeMode,
    pub degree_label: String,
    pub color: ColorPolicy,
    pub colorscale: String,
    pub reverse_scale: bool,
    pub colorbar_title: String,
    pub marker_size: f64,
    pub edge_width: f64,
    pub edge_color: String,
}

impl Default for TraceStyle {
    fn default() -> Self {
        Self {
            verb:            "acquired".into(),
            amount_column:   Some("price_amount".into()),
            currency_column: Some("price_currency_code".into()),
            date_column:     Some("acquired_at".into()),
            degree:          DegreeMode::Out,
            degree_label:    "# of acquisitions".into(),
            color:           ColorPolicy::Degree,
            colorscale:      "YlOrRd".into(),
            reverse_scale:   true,
            colorbar_title:  "Number of Acquisitions".into(),
            marker_size:     10.0,
            edge_width:      0.5,
            edge_color:      "#888".into(),
        }
    }
}

/// All edges as one line with `None` breaks between segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTrace {
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
    pub text: Vec<Option<String>>,
}

impl EdgeTrace {
    pub fn segment_count(&self) -> usize {
        self.x.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Scale(Vec<f64>),
    Fixed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeTrace {
    pub ids: Vec<EntityId>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub degrees: Vec<usize>,
    pub color: MarkerColor,
    pub text: Vec<String>,
}

pub fn edge_trace(graph: &DealGraph, style: &TraceStyle) -> GraphResult<EdgeTrace> {
    let mut trace = EdgeTrace::default();
    for edge in graph.edges() {
        let (x0, y0) = graph.position(&edge.source.id)?;
        let (x1, y1) = graph.position(&edge.target.id)?;
        let hover = edge_hover_text(&edge, style);
        trace.x.extend([Some(x0), Some(x1), None]);
        trace.y.extend([Some(y0), Some(y1), None]);
        trace.text.extend([Some(hover.clone()), Some(hover), None]);
    }
    Ok(trace)
}

pub fn node_trace(graph: &DealGraph, style: &TraceStyle) -> GraphResult<NodeTrace> {
    let n = graph.node_count();
    let mut ids = Vec::with_capacity(n);
    let (mut xs, mut ys) = (Vec::with_capacity(n), Vec::with_capacity(n));
    let mut degrees = Vec::with_capacity(n);
    let mut text = Vec::with_capacity(n);

    for node in graph.nodes() {
        let (x, y) = graph.position(&node.id)?;
        let degree = graph.degree(&node.id, style.degree).unwrap_or(0);
        let line = format!("{}: {degree}", style.degree_label);
        text.push(match &node.entity {
            Some(entity) => format!("{}<br>{line}", entity.hover_text()),
            None => line,
        });
        ids.push(node.id.clone());
        xs.push(x);
        ys.push(y);
        degrees.push(degree);
    }

    let color = match &style.color {
        ColorPolicy::Degree => MarkerColor::Scale(degrees.iter().map(|&d| d as f64).collect()),
        ColorPolicy::Fixed(c) => MarkerColor::Fixed(c.clone()),
    };
    Ok(NodeTrace { ids, x: xs, y: ys, degrees, color, text })
}

/// "<target> acquired <source> for <amount> <currency> on <date>".
/// Parts whose attribute is absent are left out.
pub fn edge_hover_text(edge: &EdgeView<'_>, style: &TraceStyle) -> String {
    let attr = |col: &Option<String>| {
        col.as_ref()
            .and_then(|c| edge.attrs.get(c))
            .and_then(Cell::text)
    };
    let mut text = format!("{} {} {}", edge.target.label(), style.verb, edge.source.label());
    if let Some(amount) = attr(&style.amount_column) {
        text.push_str(&format!(" for {amount}"));
        if let Some(currency) = attr(&style.currency_column) {
            text.push_str(&format!(" {currency}"));
        }
    }
    if let Some(date) = attr(&style.date_column) {
        text.push_str(&format!(" on {date}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::{Entity, EntityIndex, EntityKind},
        graph::{DuplicateEdges, EdgeAttrs, Resolution},
        layout::{spring_layout, LayoutParams},
    };

    fn company(id: &str, name: &str) -> Entity {
        Entity {
            id: id.into(),
            kind: EntityKind::Company,
            name: name.into(),
            category: Some("web".into()),
            status: None,
            founded_at: None,
            funding_total_usd: None,
        }
    }

    fn deal(amount: &str, date: &str) -> EdgeAttrs {
        [
            ("price_amount".to_string(), Cell::parse(amount)),
            ("price_currency_code".to_string(), Cell::parse("USD")),
            ("acquired_at".to_string(), Cell::parse(date)),
        ]
        .into()
    }

    fn positioned() -> DealGraph {
        let mut g = DealGraph::new(true);
        g.insert_edge("A".into(), "B".into(), deal("10", "2001-01-01"), DuplicateEdges::Overwrite);
        g.insert_edge("B".into(), "C".into(), deal("20", "2002-01-01"), DuplicateEdges::Overwrite);
        g.insert_edge("A".into(), "C".into(), deal("5", "2003-01-01"), DuplicateEdges::Overwrite);
        let layout = spring_layout(&g, &LayoutParams { seed: Some(5), ..Default::default() });
        g.apply_layout(&layout);
        g
    }

    #[test]
    fn edge_trace_breaks_between_segments() {
        let trace = edge_trace(&positioned(), &TraceStyle::default()).unwrap();
        assert_eq!(trace.segment_count(), 3);
        assert_eq!(trace.x.len(), 9);
        for chunk in trace.x.chunks(3) {
            assert!(chunk[0].is_some() && chunk[1].is_some() && chunk[2].is_none());
        }
    }

    #[test]
    fn node_colour_is_out_degree() {
        let trace = node_trace(&positioned(), &TraceStyle::default()).unwrap();
        assert_eq!(trace.ids, vec!["A", "B", "C"]);
        assert_eq!(trace.color, MarkerColor::Scale(vec![2.0, 1.0, 0.0]));
        assert_eq!(trace.text[0], "# of acquisitions: 2");
    }

    #[test]
    fn fixed_colour_policy_ignores_degree() {
        let style = TraceStyle {
            color: ColorPolicy::Fixed("#1074AB".into()),
            ..Default::default()
        };
        let trace = node_trace(&positioned(), &style).unwrap();
        assert_eq!(trace.color, MarkerColor::Fixed("#1074AB".into()));
    }

    #[test]
    fn resolved_names_appear_in_hover_text() {
        let mut g = positioned();
        g.resolve(
            &EntityIndex::from_entities([company("A", "Alpha"), company("B", "Beta")]),
            Resolution::KeepRawId,
        );
        let style = TraceStyle::default();
        let edges = edge_trace(&g, &style).unwrap();
        assert_eq!(edges.text[0].as_deref(), Some("Beta acquired Alpha for 10 USD on 2001-01-01"));
        // C is unresolved: raw id in the edge text, bare degree line on the node.
        assert_eq!(edges.text[3].as_deref(), Some("C acquired Beta for 20 USD on 2002-01-01"));

        let nodes = node_trace(&g, &style).unwrap();
        assert_eq!(nodes.text[0], "<b>Alpha</b><br>Category: web<br># of acquisitions: 2");
        assert_eq!(nodes.text[2], "# of acquisitions: 0");
    }

    #[test]
    fn absent_attributes_shorten_the_sentence() {
        let mut g = DealGraph::new(false);
        g.insert_edge("c:1".into(), "f:1".into(), EdgeAttrs::new(), DuplicateEdges::Overwrite);
        let style = TraceStyle { verb: "funded".into(), ..Default::default() };
        let edge = g.edges().next().unwrap();
        assert_eq!(edge_hover_text(&edge, &style), "f:1 funded c:1");
    }

    #[test]
    fn traces_need_a_layout() {
        let mut g = DealGraph::new(true);
        g.insert_edge("A".into(), "B".into(), EdgeAttrs::new(), DuplicateEdges::Overwrite);
        assert!(edge_trace(&g, &TraceStyle::default()).is_err());
        assert!(node_trace(&g, &TraceStyle::default()).is_err());
    }
}
