use crate::graph::GraphError;
use crate::slider::SliderError;
use crate::types::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("canvas {width}x{height} must have positive, finite dimensions")]
    InvalidCanvas { width: f64, height: f64 },
    #[error("node {id} with radius {radius} does not fit on a {width}x{height} canvas")]
    NodeTooLarge {
        id: NodeId,
        radius: f64,
        width: f64,
        height: f64,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("a layout run is already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Slide(#[from] SliderError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
