//! The property graph model.

mod model;
mod property_graph;
mod selector;

pub use model::{
    Edge, EdgeType, Node, NodeType, Properties, PropertyValue, LAYER_PROPERTY, PATH_PROPERTY,
};
pub use property_graph::{GraphError, GraphMetadata, NodeInsert, PropertyGraph};
pub use selector::Selector;
