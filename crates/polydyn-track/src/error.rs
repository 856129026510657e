//! Error types for track control.

use thiserror::Error;

/// Errors returned by [`TrackController`](crate::TrackController).
///
/// The audio side never produces these; they describe requests the control
/// side could not hand over.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// Parameter name not known to any engine
    #[error("unknown synthesizer parameter: {0}")]
    UnknownParameter(String),

    /// Engine name not known
    #[error("unknown synthesizer type: {0}")]
    UnknownSynthType(String),

    /// The command queue is full; the audio thread has fallen behind
    #[error("track command queue is full")]
    QueueFull,

    /// The audio side of the track has been dropped
    #[error("track has been dropped")]
    Disconnected,
}

impl<T> From<crossbeam_channel::TrySendError<T>> for TrackError {
    fn from(err: crossbeam_channel::TrySendError<T>) -> Self {
        match err {
            crossbeam_channel::TrySendError::Full(_) => TrackError::QueueFull,
            crossbeam_channel::TrySendError::Disconnected(_) => TrackError::Disconnected,
        }
    }
}
