// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use core::fmt;

use crate::scheduler::RunToken;

/// Errors from constructing a geometry or starting a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterlaceError {
    /// The grid has no pixels along at least one axis.
    EmptyGeometry {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The initial block edge is zero or not a power of two.
    BlockEdgeNotPowerOfTwo(u32),
}

impl fmt::Display for InterlaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGeometry { width, height } => {
                write!(f, "grid {width}x{height} has no pixels")
            }
            Self::BlockEdgeNotPowerOfTwo(edge) => {
                write!(f, "initial block edge {edge} is not a power of two")
            }
        }
    }
}

impl core::error::Error for InterlaceError {}

/// A run aborted because its [`BlockSink`](crate::sink::BlockSink) failed.
///
/// The run is no longer active when this is returned and its completion is
/// never signalled. Start a new run to retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunFailure<E> {
    /// The run that failed.
    pub token: RunToken,
    /// Blocks handed to the sink before the failure, including the failing one.
    pub visited: u64,
    /// The sink's error.
    pub error: E,
}

impl<E: fmt::Display> fmt::Display for RunFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {} aborted after {} blocks: {}",
            self.token.get(),
            self.visited,
            self.error
        )
    }
}

impl<E: core::error::Error + 'static> core::error::Error for RunFailure<E> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_names_the_offending_values() {
        let empty = InterlaceError::EmptyGeometry {
            width: 0,
            height: 12,
        };
        assert_eq!(empty.to_string(), "grid 0x12 has no pixels");
        assert_eq!(
            InterlaceError::BlockEdgeNotPowerOfTwo(12).to_string(),
            "initial block edge 12 is not a power of two"
        );
    }

    #[test]
    fn run_failure_exposes_sink_error_as_source() {
        let failure = RunFailure {
            token: RunToken::from_raw(3),
            visited: 7,
            error: InterlaceError::BlockEdgeNotPowerOfTwo(3),
        };
        let source = core::error::Error::source(&failure);
        assert!(source.is_some(), "sink error should be the source");
        assert_eq!(
            failure.to_string(),
            "run 3 aborted after 7 blocks: initial block edge 3 is not a power of two"
        );
    }
}
