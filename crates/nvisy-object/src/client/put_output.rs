//! Result type for [`TransferClient::put`](super::TransferClient::put).

use crate::types::PartRecord;

/// Result of a successful put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutput {
    /// Bytes consumed from the input and stored in the object.
    pub bytes_written: u64,
    /// The parts passed to the complete call, in order.
    pub parts: Vec<PartRecord>,
}
