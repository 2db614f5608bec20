use thiserror::Error;

/// Failures surfaced while wiring the audio graph.
///
/// These are reported once per start request; nothing retries in the
/// background.
#[derive(Error, Debug)]
pub enum EmberError {
    #[error("audio context init failed: {0}")]
    AudioInit(String),

    #[error("analyser setup failed: {0}")]
    Analyser(String),

    #[error("media element unavailable: {0}")]
    MediaElement(String),
}
