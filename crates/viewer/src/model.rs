//! KDL graph descriptions.
//!
//! ```kdl
//! canvas width=800 height=600
//! node 0 "core" radius=40 weight="3"
//! node 1 "io"
//! edge 0 1
//! edge 1 0 directed=#true weight="hot"
//! ```
//!
//! Node ids are checked by the engine when the graph is built; this module
//! only turns KDL entries into loader records.

use anyhow::{Context, Result, anyhow, bail};
use graphvis_layout::{Canvas, EdgeSpec, GraphData, NodeSpec};
use kdl::{KdlDocument, KdlNode, KdlValue};
use tracing::warn;

/// Everything a KDL file can describe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub graph: GraphData,
    pub canvas: Option<Canvas>,
}

pub fn parse_model(content: &str) -> Result<Model> {
    let doc = KdlDocument::parse(content).context("invalid KDL document")?;
    let mut model = Model::default();

    for kdl_node in doc.nodes() {
        match kdl_node.name().value() {
            "node" => model.graph.nodes.push(parse_node(kdl_node)?),
            "edge" => model.graph.edges.push(parse_edge(kdl_node)?),
            "canvas" => model.canvas = Some(parse_canvas(kdl_node)?),
            other => warn!(name = other, "ignoring unknown KDL node"),
        }
    }

    Ok(model)
}

fn parse_node(kdl_node: &KdlNode) -> Result<NodeSpec> {
    let id = positional(kdl_node, 0)
        .and_then(as_id)
        .ok_or_else(|| anyhow!("node needs an integer id as its first argument"))?;
    let label = positional(kdl_node, 1)
        .and_then(KdlValue::as_string)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());
    let radius = match property(kdl_node, "radius") {
        Some(value) => Some(as_number(value).ok_or_else(|| anyhow!("node {id}: radius must be a number"))?),
        None => None,
    };

    Ok(NodeSpec {
        id,
        label,
        radius,
        weight: property(kdl_node, "weight").map(as_text),
    })
}

fn parse_edge(kdl_node: &KdlNode) -> Result<EdgeSpec> {
    let (Some(from), Some(to)) = (
        positional(kdl_node, 0).and_then(as_id),
        positional(kdl_node, 1).and_then(as_id),
    ) else {
        bail!("edge needs two integer node ids");
    };
    let directed = match property(kdl_node, "directed") {
        Some(value) => value
            .as_bool()
            .ok_or_else(|| anyhow!("edge {from} {to}: directed must be #true or #false"))?,
        None => false,
    };

    Ok(EdgeSpec {
        from,
        to,
        directed,
        weight: property(kdl_node, "weight").map(as_text),
    })
}

fn parse_canvas(kdl_node: &KdlNode) -> Result<Canvas> {
    let width = property(kdl_node, "width").and_then(as_number);
    let height = property(kdl_node, "height").and_then(as_number);
    match (width, height) {
        (Some(width), Some(height)) => Ok(Canvas::new(width, height)),
        _ => bail!("canvas needs numeric width and height"),
    }
}

/// The `index`-th argument without a name.
fn positional(kdl_node: &KdlNode, index: usize) -> Option<&KdlValue> {
    kdl_node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(index)
        .map(|e| e.value())
}

fn property<'a>(kdl_node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    kdl_node
        .entries()
        .iter()
        .find(|e| e.name().is_some_and(|n| n.value() == key))
        .map(|e| e.value())
}

fn as_id(value: &KdlValue) -> Option<i64> {
    value.as_integer().and_then(|i| i64::try_from(i).ok())
}

fn as_number(value: &KdlValue) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64))
}

/// Weights are free text; numbers are kept as written.
fn as_text(value: &KdlValue) -> String {
    if let Some(s) = value.as_string() {
        return s.to_string();
    }
    if let Some(i) = value.as_integer() {
        return i.to_string();
    }
    if let Some(f) = value.as_float() {
        return f.to_string();
    }
    value.to_string()
}
