//! Bring-up errors

use thiserror::Error;

/// Result type alias for bring-up operations
pub type Result<T> = core::result::Result<T, BringupError>;

/// Errors that can stop the bring-up pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupError {
    /// A bounded poll gave up before the hardware answered
    #[error("hardware did not respond after {polls} polls")]
    PollTimeout {
        /// Number of failed polls
        polls: u32,
    },
    /// A node the bring-up pass depends on is missing from the tree
    #[error("device node not found")]
    NodeNotFound,
    /// A node lacks a property the bring-up pass reads
    #[error("device node is missing a property")]
    MissingProperty,
    /// A path or string did not fit its fixed-capacity buffer
    #[error("path exceeds buffer capacity")]
    PathTooLong,
    /// The memory manager refused a claim
    #[error("cannot claim {size:#x} bytes at {base:#x}")]
    ClaimFailed {
        /// Start of the refused range
        base: u32,
        /// Length of the refused range
        size: u32,
    },
}
