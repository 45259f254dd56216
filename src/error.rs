//! Error taxonomy for every component of the core.

use thiserror::Error;

/// Errors surfaced by the I²C transport.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum TransportError<E> {
    /// The I²C write phase of a command failed.
    #[error("i2c write failed")]
    BusWrite(E),
    /// The I²C read phase of a command failed.
    #[error("i2c read failed")]
    BusRead(E),
    /// A received word's CRC-8 byte did not match the computed checksum.
    #[error("crc check failed")]
    InvalidCrc,
    /// The command did not complete within its configured delay budget.
    #[error("i2c operation timed out")]
    Timeout,
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for TransportError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            TransportError::BusWrite(_) => defmt::write!(f, "TransportError::BusWrite"),
            TransportError::BusRead(_) => defmt::write!(f, "TransportError::BusRead"),
            TransportError::InvalidCrc => defmt::write!(f, "TransportError::InvalidCrc"),
            TransportError::Timeout => defmt::write!(f, "TransportError::Timeout"),
        }
    }
}

/// Errors surfaced by the measurement window.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum WindowError {
    /// `mean()` or `dequeue()` was requested on a window with no resident samples.
    #[error("measurement window is empty")]
    Empty,
}

/// Errors surfaced by a [`crate::baseline_store::BaselineStore`] implementation.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum StoreError {
    /// No baseline has ever been written under the configured key.
    #[error("no baseline stored")]
    NotFound,
    /// A baseline record was found but failed to decode.
    #[error("stored baseline is corrupt")]
    Corrupt,
    /// The underlying store failed to complete a read or write.
    #[error("baseline store i/o error")]
    Io,
}

#[cfg(feature = "defmt")]
impl defmt::Format for StoreError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            StoreError::NotFound => defmt::write!(f, "StoreError::NotFound"),
            StoreError::Corrupt => defmt::write!(f, "StoreError::Corrupt"),
            StoreError::Io => defmt::write!(f, "StoreError::Io"),
        }
    }
}

/// The one fatal condition the controller can encounter.
///
/// Per the error handling design, every other error kind is transient and is
/// retried on the next heartbeat; a `ControllerFault` is the sole trigger for
/// a reset back to [`crate::controller::SensorState::Uninitialized`].
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ControllerFault {
    /// The controller asked for a window mean while the window was empty.
    #[error(transparent)]
    Window(#[from] WindowError),
}
