//! MIMO Encoder — Hierarchical topology builder
//!
//! Builds the static topology of a hierarchical MIMO encoder block:
//!
//! - 1 composite input port feeding the selected space-time encoder
//! - per-stream framing taggers inserting packet-length tags
//! - optional per-stream training-sequence injection through a
//!   tagged-stream mux
//! - M composite output ports, one per transmit stream
//!
//! No samples move here. The builder validates its parameters, instantiates
//! node descriptors, and registers the port connections once; the frozen
//! [`Flowgraph`] is then handed to the surrounding dataflow runtime.
//! GNU Radio equivalent: `gr-digital` `mimo_encoder_cc` hierarchical block.
//!
//! ```text
//!                         ┌────────┐   ┌──────┐
//!                      ┌─►│tagger 0│──►│      │
//!          ┌─────────┐ │  └────────┘   │mux 0 │──► out 0
//!  in ────►│ encoder │─┤  ┌────────┐ ┌►│      │
//!          └─────────┘ │  │train  0│─┘ └──────┘
//!                      │  └────────┘
//!                      │  ┌────────┐
//!                      └─►│tagger 1│─────────────► out 1   (no training)
//!                         └────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mimo_encoder::mimo_encoder::{MimoEncoder, MimoEncoderParams, MimoTechnique};
//!
//! let params = MimoEncoderParams {
//!     num_outputs: 4,
//!     technique: MimoTechnique::Vblast,
//!     payload_length: 256,
//!     ..Default::default()
//! };
//! let encoder = MimoEncoder::new(params).unwrap();
//! assert_eq!(encoder.num_outputs(), 4);
//! assert_eq!(encoder.flowgraph().count_of_kind("stream_tagger"), 4);
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::flowgraph::{Endpoint, Flowgraph, NodeKind, NodeSpec};
use crate::stream_tags::StreamTag;
use crate::types::{IQBuffer, TopologyError, TopologyResult};

/// Space-time coding scheme selector.
///
/// Alamouti and differential STBC are fixed 2-stream codes; V-BLAST spatial
/// multiplexing supports an arbitrary stream count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimoTechnique {
    /// Alamouti space-time block code (2 TX streams).
    Alamouti,
    /// Differential STBC (2 TX streams, no channel knowledge needed).
    DiffStbc,
    /// V-BLAST spatial multiplexing (M TX streams).
    Vblast,
}

impl MimoTechnique {
    /// Configuration string for this scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            MimoTechnique::Alamouti => "alamouti",
            MimoTechnique::DiffStbc => "diff_stbc",
            MimoTechnique::Vblast => "vblast",
        }
    }

    /// The stream count this scheme is pinned to, if any.
    ///
    /// Alamouti-like codes transmit over exactly 2 antennas; V-BLAST scales
    /// with the requested port count.
    pub fn fixed_output_ports(&self) -> Option<usize> {
        match self {
            MimoTechnique::Alamouti | MimoTechnique::DiffStbc => Some(2),
            MimoTechnique::Vblast => None,
        }
    }
}

impl fmt::Display for MimoTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MimoTechnique {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alamouti" => Ok(MimoTechnique::Alamouti),
            "diff_stbc" => Ok(MimoTechnique::DiffStbc),
            "vblast" => Ok(MimoTechnique::Vblast),
            other => Err(TopologyError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl Serialize for MimoTechnique {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MimoTechnique {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Constructor parameters for [`MimoEncoder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MimoEncoderParams {
    /// Requested number of output streams (M). Must be at least 2.
    pub num_outputs: usize,
    /// Space-time coding scheme.
    pub technique: MimoTechnique,
    /// Payload packet length in samples for the framing taggers.
    pub payload_length: usize,
    /// Key of the packet-length tag shared by taggers, sources, and muxes.
    pub length_tag_name: String,
    /// Per-port training sequences. An empty inner buffer disables training
    /// injection for that port; ports past the end are treated as empty.
    pub training_sequence: Vec<IQBuffer>,
}

impl Default for MimoEncoderParams {
    fn default() -> Self {
        Self {
            num_outputs: 2,
            technique: MimoTechnique::Alamouti,
            payload_length: 0,
            length_tag_name: "length".to_string(),
            training_sequence: Vec::new(),
        }
    }
}

impl MimoEncoderParams {
    /// Parse parameters from a YAML document.
    ///
    /// Omitted fields take their defaults. An unrecognized `technique`
    /// string fails with [`TopologyError::UnknownAlgorithm`]; any other
    /// malformed input fails with [`TopologyError::Config`].
    pub fn parse_yaml(yaml: &str) -> TopologyResult<Self> {
        #[derive(Deserialize)]
        #[serde(default)]
        struct RawParams {
            num_outputs: usize,
            technique: String,
            payload_length: usize,
            length_tag_name: String,
            training_sequence: Vec<IQBuffer>,
        }

        impl Default for RawParams {
            fn default() -> Self {
                let d = MimoEncoderParams::default();
                Self {
                    num_outputs: d.num_outputs,
                    technique: d.technique.as_str().to_string(),
                    payload_length: d.payload_length,
                    length_tag_name: d.length_tag_name,
                    training_sequence: d.training_sequence,
                }
            }
        }

        let raw: RawParams =
            serde_yaml::from_str(yaml).map_err(|e| TopologyError::Config(e.to_string()))?;
        Ok(Self {
            num_outputs: raw.num_outputs,
            technique: raw.technique.parse()?,
            payload_length: raw.payload_length,
            length_tag_name: raw.length_tag_name,
            training_sequence: raw.training_sequence,
        })
    }
}

/// Non-fatal diagnostic recorded during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildNotice {
    /// The requested port count was overridden for a fixed-stream scheme.
    PortCountCoerced {
        /// Port count the caller asked for.
        requested: usize,
        /// Port count the scheme pins the composite to.
        effective: usize,
    },
}

/// A fully wired MIMO encoder composite: 1 input port, M output ports.
///
/// Construction is all-or-nothing: parameter validation happens before any
/// node descriptor exists, so a returned error never leaves a partially
/// wired graph behind.
#[derive(Debug, Clone, PartialEq)]
pub struct MimoEncoder {
    technique: MimoTechnique,
    num_outputs: usize,
    flowgraph: Flowgraph,
    notices: Vec<BuildNotice>,
}

impl MimoEncoder {
    /// Build the encoder topology from validated parameters.
    ///
    /// Fails with [`TopologyError::InvalidPortCount`] when fewer than 2
    /// output streams are requested. Alamouti-like schemes silently coerce
    /// the port count to 2, recording a [`BuildNotice`] and emitting a
    /// warning event.
    pub fn new(params: MimoEncoderParams) -> TopologyResult<Self> {
        if params.num_outputs < 2 {
            return Err(TopologyError::InvalidPortCount(params.num_outputs));
        }

        let requested = params.num_outputs;
        let mut notices = Vec::new();
        let num_outputs = match params.technique.fixed_output_ports() {
            Some(fixed) if fixed != requested => {
                tracing::warn!(
                    technique = %params.technique,
                    requested,
                    effective = fixed,
                    "stream count is fixed for this MIMO scheme, overriding"
                );
                notices.push(BuildNotice::PortCountCoerced {
                    requested,
                    effective: fixed,
                });
                fixed
            }
            _ => requested,
        };

        let mut graph = Flowgraph::new(1, num_outputs);

        let encoder = graph.add_node(NodeSpec::new(
            "encoder",
            NodeKind::Encoder {
                technique: params.technique,
                num_outputs,
            },
        ))?;
        graph.connect(Endpoint::CompositeInput(0), Endpoint::node(encoder, 0))?;

        for m in 0..num_outputs {
            let tagger = graph.add_node(NodeSpec::new(
                format!("tagger{m}"),
                NodeKind::StreamTagger {
                    packet_len: params.payload_length,
                    length_tag_key: params.length_tag_name.clone(),
                },
            ))?;
            graph.connect(Endpoint::node(encoder, m), Endpoint::node(tagger, 0))?;

            let training = params
                .training_sequence
                .get(m)
                .filter(|seq| !seq.is_empty());

            if let Some(samples) = training {
                let tag = StreamTag::length_tag(&params.length_tag_name, samples.len());
                let src = graph.add_node(NodeSpec::new(
                    format!("training_src{m}"),
                    NodeKind::TrainingSource {
                        samples: samples.clone(),
                        tags: vec![tag],
                    },
                ))?;
                let mux = graph.add_node(NodeSpec::new(
                    format!("mux{m}"),
                    NodeKind::TaggedStreamMux {
                        length_tag_key: params.length_tag_name.clone(),
                    },
                ))?;
                graph.connect(Endpoint::node(src, 0), Endpoint::node(mux, 0))?;
                graph.connect(Endpoint::node(tagger, 0), Endpoint::node(mux, 1))?;
                graph.connect(Endpoint::node(mux, 0), Endpoint::CompositeOutput(m))?;
            } else {
                graph.connect(Endpoint::node(tagger, 0), Endpoint::CompositeOutput(m))?;
            }
        }

        graph.freeze();

        Ok(Self {
            technique: params.technique,
            num_outputs,
            flowgraph: graph,
            notices,
        })
    }

    /// The selected coding scheme.
    pub fn technique(&self) -> MimoTechnique {
        self.technique
    }

    /// Effective number of output streams (after any coercion).
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// The frozen internal topology.
    pub fn flowgraph(&self) -> &Flowgraph {
        &self.flowgraph
    }

    /// Diagnostics recorded during construction.
    pub fn notices(&self) -> &[BuildNotice] {
        &self.notices
    }

    /// Whether training injection is wired on output port `m`.
    pub fn has_training(&self, m: usize) -> bool {
        self.flowgraph.find_by_name(&format!("mux{m}")).is_some()
    }
}
