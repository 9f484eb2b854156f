//! # MIMO Encoder Topology Builder
//!
//! Builds the internal topology of a hierarchical MIMO encoder for
//! tagged-stream SDR flowgraphs:
//!
//! - **1 input port** carrying the payload sample stream
//! - an **encoder node** for the selected space-time scheme (Alamouti,
//!   differential STBC, or V-BLAST)
//! - per-stream **framing taggers** and optional **training-sequence
//!   injection** through tagged-stream muxes
//! - **M output ports**, one per transmit antenna stream
//!
//! The crate is pure composition logic: it validates the configuration,
//! describes the processing nodes, and registers the static port
//! connections between them. The resulting frozen [`Flowgraph`] is the
//! contract handed to the dataflow runtime that actually instantiates the
//! blocks and moves samples.
//!
//! ## Signal Flow
//!
//! ```text
//! in ──► encoder ─┬─► tagger 0 ─► mux 0 ◄─ training 0 ──► out 0
//!                 ├─► tagger 1 ─► mux 1 ◄─ training 1 ──► out 1
//!                 └─► ...                                 out M-1
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mimo_encoder::{MimoEncoder, MimoEncoderParams, MimoTechnique};
//!
//! let params = MimoEncoderParams {
//!     num_outputs: 4,
//!     technique: MimoTechnique::Vblast,
//!     payload_length: 256,
//!     ..Default::default()
//! };
//!
//! let encoder = MimoEncoder::new(params).unwrap();
//! assert_eq!(encoder.num_outputs(), 4);
//! assert!(encoder.flowgraph().is_frozen());
//! ```

pub mod flowgraph;
pub mod mimo_encoder;
pub mod stream_tags;
pub mod types;

pub use flowgraph::{Connection, Endpoint, Flowgraph, NodeId, NodeKind, NodeSpec};
pub use mimo_encoder::{BuildNotice, MimoEncoder, MimoEncoderParams, MimoTechnique};
pub use stream_tags::{StreamTag, TagValue};
pub use types::{Complex, IQBuffer, IQSample, TopologyError, TopologyResult};
