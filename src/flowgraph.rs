//! Flowgraph — Static subgraph of block descriptors
//!
//! Models a composite block's internal topology as an arena of node
//! descriptors plus a list of directed port-to-port connections. Nothing in
//! this module moves samples: each node is a construction-time description
//! of an external processing block (encoder, tagger, training source, mux),
//! and each connection is an edge the surrounding dataflow runtime realizes
//! when it schedules the graph. The graph is built once, frozen, and
//! immutable afterward.
//! GNU Radio equivalent: `hier_block2` with its `connect()` registration.
//!
//! ## Example
//!
//! ```rust
//! use mimo_encoder::flowgraph::{Endpoint, Flowgraph, NodeKind, NodeSpec};
//!
//! let mut fg = Flowgraph::new(1, 1);
//! let tagger = fg
//!     .add_node(NodeSpec::new(
//!         "tagger0",
//!         NodeKind::StreamTagger {
//!             packet_len: 64,
//!             length_tag_key: "length".into(),
//!         },
//!     ))
//!     .unwrap();
//! fg.connect(Endpoint::CompositeInput(0), Endpoint::node(tagger, 0))
//!     .unwrap();
//! fg.connect(Endpoint::node(tagger, 0), Endpoint::CompositeOutput(0))
//!     .unwrap();
//! fg.freeze();
//! assert_eq!(fg.node_count(), 1);
//! assert!(fg.is_frozen());
//! ```

use serde::{Deserialize, Serialize};

use crate::mimo_encoder::MimoTechnique;
use crate::stream_tags::StreamTag;
use crate::types::{IQBuffer, TopologyError, TopologyResult};

/// Handle to a node in a [`Flowgraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of this node.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Kind of external processing block a node stands for, with the
/// construction parameters the runtime needs to instantiate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// MIMO encoder block: 1 input, `num_outputs` outputs.
    Encoder {
        /// Space-time coding scheme.
        technique: MimoTechnique,
        /// Number of transmit streams.
        num_outputs: usize,
    },
    /// Stream-framing block inserting periodic length tags: 1 in, 1 out.
    StreamTagger {
        /// Samples per tagged packet.
        packet_len: usize,
        /// Key of the inserted length tag.
        length_tag_key: String,
    },
    /// Repeating pilot source with pre-attached tags: 0 in, 1 out.
    TrainingSource {
        /// Training samples emitted in a loop.
        samples: IQBuffer,
        /// Tags attached to the first repetition.
        tags: Vec<StreamTag>,
    },
    /// Two-input tagged-stream merge: 2 in, 1 out.
    TaggedStreamMux {
        /// Length-tag key shared by both inputs.
        length_tag_key: String,
    },
}

impl NodeKind {
    /// Number of input ports this kind of block exposes.
    pub fn num_inputs(&self) -> usize {
        match self {
            NodeKind::Encoder { .. } => 1,
            NodeKind::StreamTagger { .. } => 1,
            NodeKind::TrainingSource { .. } => 0,
            NodeKind::TaggedStreamMux { .. } => 2,
        }
    }

    /// Number of output ports this kind of block exposes.
    pub fn num_outputs(&self) -> usize {
        match self {
            NodeKind::Encoder { num_outputs, .. } => *num_outputs,
            NodeKind::StreamTagger { .. } => 1,
            NodeKind::TrainingSource { .. } => 1,
            NodeKind::TaggedStreamMux { .. } => 1,
        }
    }

    /// Short kind label, used for structural queries.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Encoder { .. } => "encoder",
            NodeKind::StreamTagger { .. } => "stream_tagger",
            NodeKind::TrainingSource { .. } => "training_source",
            NodeKind::TaggedStreamMux { .. } => "tagged_stream_mux",
        }
    }
}

/// A named node descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node name, unique within the graph by convention.
    pub name: String,
    /// Block kind and construction parameters.
    pub kind: NodeKind,
}

impl NodeSpec {
    /// Create a node descriptor.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One end of a connection.
///
/// Whether a `Node` endpoint refers to an input or an output port depends on
/// its position in the connection: producers use output ports, consumers use
/// input ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// The composite's own input port (a producer inside the graph).
    CompositeInput(usize),
    /// The composite's own output port (a consumer inside the graph).
    CompositeOutput(usize),
    /// A port on an internal node.
    Node {
        /// Node handle.
        node: NodeId,
        /// Port index on that node.
        port: usize,
    },
}

impl Endpoint {
    /// Shorthand for a node port endpoint.
    pub fn node(node: NodeId, port: usize) -> Self {
        Endpoint::Node { node, port }
    }
}

/// A directed edge from a producing endpoint to a consuming endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Producing end (composite input or node output port).
    pub from: Endpoint,
    /// Consuming end (node input port or composite output).
    pub to: Endpoint,
}

/// Static topology of a composite block: node arena plus connection list.
///
/// Mutable only until [`freeze`](Flowgraph::freeze) is called; all
/// registration afterward fails with [`TopologyError::Topology`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flowgraph {
    num_inputs: usize,
    num_outputs: usize,
    nodes: Vec<NodeSpec>,
    connections: Vec<Connection>,
    frozen: bool,
}

impl Flowgraph {
    /// Create an empty graph with the given composite port signature.
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            nodes: Vec::new(),
            connections: Vec::new(),
            frozen: false,
        }
    }

    /// Number of composite input ports.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Number of composite output ports.
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Add a node to the arena, returning its handle.
    pub fn add_node(&mut self, spec: NodeSpec) -> TopologyResult<NodeId> {
        if self.frozen {
            return Err(TopologyError::Topology(
                "cannot add nodes to a frozen flowgraph".into(),
            ));
        }
        self.nodes.push(spec);
        Ok(NodeId(self.nodes.len() - 1))
    }

    /// Register a directed connection from a producing endpoint to a
    /// consuming endpoint.
    pub fn connect(&mut self, from: Endpoint, to: Endpoint) -> TopologyResult<()> {
        if self.frozen {
            return Err(TopologyError::Topology(
                "cannot connect ports on a frozen flowgraph".into(),
            ));
        }
        self.check_producer(from)?;
        self.check_consumer(to)?;
        self.connections.push(Connection { from, to });
        Ok(())
    }

    /// Freeze the graph. No further nodes or connections can be added.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the graph has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node descriptor by handle.
    pub fn node(&self, id: NodeId) -> Option<&NodeSpec> {
        self.nodes.get(id.0)
    }

    /// All node descriptors in arena order.
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// All registered connections in registration order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Count nodes whose kind label matches `kind_name`.
    pub fn count_of_kind(&self, kind_name: &str) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind.kind_name() == kind_name)
            .count()
    }

    /// Find a node handle by name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Whether a specific edge has been registered.
    pub fn is_connected(&self, from: Endpoint, to: Endpoint) -> bool {
        self.connections.iter().any(|c| c.from == from && c.to == to)
    }

    /// The producing endpoint feeding a given consumer, if any.
    pub fn producer_for(&self, to: Endpoint) -> Option<Endpoint> {
        self.connections
            .iter()
            .find(|c| c.to == to)
            .map(|c| c.from)
    }

    fn check_producer(&self, ep: Endpoint) -> TopologyResult<()> {
        match ep {
            Endpoint::CompositeInput(p) if p < self.num_inputs => Ok(()),
            Endpoint::CompositeInput(p) => Err(TopologyError::Topology(format!(
                "composite input {p} out of range (have {})",
                self.num_inputs
            ))),
            Endpoint::CompositeOutput(p) => Err(TopologyError::Topology(format!(
                "composite output {p} cannot produce samples"
            ))),
            Endpoint::Node { node, port } => {
                let spec = self.node(node).ok_or_else(|| {
                    TopologyError::Topology(format!("unknown node index {}", node.0))
                })?;
                if port < spec.kind.num_outputs() {
                    Ok(())
                } else {
                    Err(TopologyError::Topology(format!(
                        "output port {port} out of range on '{}' (have {})",
                        spec.name,
                        spec.kind.num_outputs()
                    )))
                }
            }
        }
    }

    fn check_consumer(&self, ep: Endpoint) -> TopologyResult<()> {
        match ep {
            Endpoint::CompositeOutput(p) if p < self.num_outputs => Ok(()),
            Endpoint::CompositeOutput(p) => Err(TopologyError::Topology(format!(
                "composite output {p} out of range (have {})",
                self.num_outputs
            ))),
            Endpoint::CompositeInput(p) => Err(TopologyError::Topology(format!(
                "composite input {p} cannot consume samples"
            ))),
            Endpoint::Node { node, port } => {
                let spec = self.node(node).ok_or_else(|| {
                    TopologyError::Topology(format!("unknown node index {}", node.0))
                })?;
                if port < spec.kind.num_inputs() {
                    Ok(())
                } else {
                    Err(TopologyError::Topology(format!(
                        "input port {port} out of range on '{}' (have {})",
                        spec.name,
                        spec.kind.num_inputs()
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger_spec(name: &str) -> NodeSpec {
        NodeSpec::new(
            name,
            NodeKind::StreamTagger {
                packet_len: 8,
                length_tag_key: "length".into(),
            },
        )
    }

    #[test]
    fn test_add_and_lookup() {
        let mut fg = Flowgraph::new(1, 1);
        let id = fg.add_node(tagger_spec("tagger0")).unwrap();
        assert_eq!(fg.node_count(), 1);
        assert_eq!(fg.node(id).unwrap().name, "tagger0");
        assert_eq!(fg.find_by_name("tagger0"), Some(id));
        assert_eq!(fg.find_by_name("missing"), None);
    }

    #[test]
    fn test_connect_valid() {
        let mut fg = Flowgraph::new(1, 1);
        let id = fg.add_node(tagger_spec("t")).unwrap();
        fg.connect(Endpoint::CompositeInput(0), Endpoint::node(id, 0))
            .unwrap();
        fg.connect(Endpoint::node(id, 0), Endpoint::CompositeOutput(0))
            .unwrap();
        assert_eq!(fg.connections().len(), 2);
        assert!(fg.is_connected(Endpoint::node(id, 0), Endpoint::CompositeOutput(0)));
    }

    #[test]
    fn test_connect_port_out_of_range() {
        let mut fg = Flowgraph::new(1, 1);
        let id = fg.add_node(tagger_spec("t")).unwrap();
        // Tagger has exactly one input port.
        let err = fg
            .connect(Endpoint::CompositeInput(0), Endpoint::node(id, 1))
            .unwrap_err();
        assert!(matches!(err, TopologyError::Topology(_)));
    }

    #[test]
    fn test_connect_composite_port_out_of_range() {
        let mut fg = Flowgraph::new(1, 2);
        let id = fg.add_node(tagger_spec("t")).unwrap();
        let err = fg
            .connect(Endpoint::node(id, 0), Endpoint::CompositeOutput(2))
            .unwrap_err();
        assert!(matches!(err, TopologyError::Topology(_)));
    }

    #[test]
    fn test_composite_direction_enforced() {
        let mut fg = Flowgraph::new(1, 1);
        let id = fg.add_node(tagger_spec("t")).unwrap();
        // A composite output never produces, a composite input never consumes.
        assert!(fg
            .connect(Endpoint::CompositeOutput(0), Endpoint::node(id, 0))
            .is_err());
        assert!(fg
            .connect(Endpoint::node(id, 0), Endpoint::CompositeInput(0))
            .is_err());
    }

    #[test]
    fn test_frozen_rejects_mutation() {
        let mut fg = Flowgraph::new(1, 1);
        let id = fg.add_node(tagger_spec("t")).unwrap();
        fg.freeze();
        assert!(fg.is_frozen());
        assert!(fg.add_node(tagger_spec("t2")).is_err());
        assert!(fg
            .connect(Endpoint::CompositeInput(0), Endpoint::node(id, 0))
            .is_err());
    }

    #[test]
    fn test_producer_for() {
        let mut fg = Flowgraph::new(1, 1);
        let id = fg.add_node(tagger_spec("t")).unwrap();
        fg.connect(Endpoint::CompositeInput(0), Endpoint::node(id, 0))
            .unwrap();
        assert_eq!(
            fg.producer_for(Endpoint::node(id, 0)),
            Some(Endpoint::CompositeInput(0))
        );
        assert_eq!(fg.producer_for(Endpoint::CompositeOutput(0)), None);
    }

    #[test]
    fn test_count_of_kind() {
        let mut fg = Flowgraph::new(1, 2);
        fg.add_node(tagger_spec("t0")).unwrap();
        fg.add_node(tagger_spec("t1")).unwrap();
        fg.add_node(NodeSpec::new(
            "mux0",
            NodeKind::TaggedStreamMux {
                length_tag_key: "length".into(),
            },
        ))
        .unwrap();
        assert_eq!(fg.count_of_kind("stream_tagger"), 2);
        assert_eq!(fg.count_of_kind("tagged_stream_mux"), 1);
        assert_eq!(fg.count_of_kind("encoder"), 0);
    }

    #[test]
    fn test_node_kind_port_counts() {
        let mux = NodeKind::TaggedStreamMux {
            length_tag_key: "l".into(),
        };
        assert_eq!(mux.num_inputs(), 2);
        assert_eq!(mux.num_outputs(), 1);
        let src = NodeKind::TrainingSource {
            samples: vec![],
            tags: vec![],
        };
        assert_eq!(src.num_inputs(), 0);
        assert_eq!(src.num_outputs(), 1);
    }

    #[test]
    fn test_structural_equality() {
        let build = || {
            let mut fg = Flowgraph::new(1, 1);
            let id = fg.add_node(tagger_spec("t")).unwrap();
            fg.connect(Endpoint::CompositeInput(0), Endpoint::node(id, 0))
                .unwrap();
            fg.freeze();
            fg
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut fg = Flowgraph::new(1, 1);
        let id = fg.add_node(tagger_spec("t")).unwrap();
        fg.connect(Endpoint::CompositeInput(0), Endpoint::node(id, 0))
            .unwrap();
        fg.freeze();
        let yaml = serde_yaml::to_string(&fg).unwrap();
        let back: Flowgraph = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(fg, back);
    }
}
