//! Core types for MIMO topology construction
//!
//! Defines the complex I/Q sample aliases used throughout the crate and the
//! error type for topology construction. All sample data is complex-valued:
//! MIMO encoders consume and produce interleaved I/Q streams, and training
//! sequences are per-antenna buffers of complex pilot symbols.

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// A buffer of I/Q samples
pub type IQBuffer = Vec<IQSample>;

/// Result type for topology construction
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors that can occur while building a MIMO encoder topology
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("MIMO block must have at least 2 output ports (got {0})")]
    InvalidPortCount(usize),

    #[error("MIMO algorithm '{0}' unknown")]
    UnknownAlgorithm(String),

    #[error("failed to parse encoder config: {0}")]
    Config(String),

    #[error("invalid topology operation: {0}")]
    Topology(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TopologyError::InvalidPortCount(1);
        assert_eq!(
            err.to_string(),
            "MIMO block must have at least 2 output ports (got 1)"
        );
        let err = TopologyError::UnknownAlgorithm("none".into());
        assert_eq!(err.to_string(), "MIMO algorithm 'none' unknown");
    }

    #[test]
    fn test_error_eq() {
        assert_eq!(
            TopologyError::InvalidPortCount(0),
            TopologyError::InvalidPortCount(0)
        );
        assert_ne!(
            TopologyError::InvalidPortCount(0),
            TopologyError::InvalidPortCount(1)
        );
    }

    #[test]
    fn test_iq_buffer() {
        let buf: IQBuffer = vec![Complex::new(1.0, 0.0), Complex::new(0.0, -1.0)];
        assert_eq!(buf.len(), 2);
        assert_eq!(buf[1].im, -1.0);
    }
}
