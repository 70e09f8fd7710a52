//! Error kinds surfaced at the public boundary of DumbFS.

use std::fmt;

/// The result type used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// An error returned by a DumbFS operation.
///
/// Each variant corresponds to exactly one of the error kinds documented by the
/// on-flash format: there is no catch-all variant, since the set of failure modes a
/// flat, journal-less filesystem can produce is closed.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `lookup` failed to find a path, or `read_dirent` was asked for an empty slot.
    #[error("no such file")]
    NoEnt,
    /// `create` was attempted while `inode_count > max_inode_count`.
    #[error("inode table exhausted")]
    NoMem,
    /// `truncate` was given a negative or oversized length, or a read/write clipped to
    /// a non-positive length.
    #[error("invalid argument")]
    Inval,
    /// A [`crate::flash::Flash`] call failed inside the buffered-rewrite engine or a
    /// metadata path.
    #[error("flash I/O error: {0}")]
    Io(FlashError),
}

/// An opaque transport error surfaced by a [`crate::flash::Flash`] implementation.
///
/// DFS does not assume any particular backing transport (RAM, MTD, SPI-NOR, ...), so
/// the underlying error is collapsed to its `Display` text rather than requiring every
/// implementor to produce a specific error type.
#[derive(Debug)]
pub struct FlashError(pub String);

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FlashError {
    /// Wraps any displayable transport error as a [`FlashError`].
    pub fn new<E: fmt::Display>(e: E) -> Self {
        Self(e.to_string())
    }
}

impl From<FlashError> for Error {
    fn from(e: FlashError) -> Self {
        Error::Io(e)
    }
}
