use gstreamer as gst;
use std::fmt;

/// Errors returned by the playback core and the GStreamer backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `prepare` was called before a live render target was configured.
    #[error("no render target is bound")]
    UnboundTarget,
    /// The media locator could not be parsed.
    #[error("invalid media url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0}")]
    Glib(#[from] glib::Error),
    #[error("failed to change pipeline state: {0}")]
    StateChange(#[from] gst::StateChangeError),
    #[error("failed to cast gstreamer element")]
    Cast,
    /// Any other failure reported by a playback backend.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// What kind of failure a [`PlaybackError`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackErrorKind {
    Unknown,
    InvalidUrl,
}

/// Failure delivered to a [`PlaybackObserver`](crate::PlaybackObserver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackError {
    kind: PlaybackErrorKind,
    message: String,
}

impl PlaybackError {
    pub fn new(kind: PlaybackErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_url(url: &str, err: &url::ParseError) -> Self {
        Self::new(
            PlaybackErrorKind::InvalidUrl,
            format!("\"{url}\" is not a valid media url: {err}"),
        )
    }

    pub fn kind(&self) -> PlaybackErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PlaybackErrorKind::Unknown => write!(f, "playback failed: {}", self.message),
            PlaybackErrorKind::InvalidUrl => write!(f, "invalid url: {}", self.message),
        }
    }
}

impl std::error::Error for PlaybackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_error_keeps_the_offending_input() {
        let err = url::Url::parse("not a url").unwrap_err();
        let error = PlaybackError::invalid_url("not a url", &err);
        assert_eq!(error.kind(), PlaybackErrorKind::InvalidUrl);
        assert!(error.message().contains("not a url"));
    }

    #[test]
    fn crate_error_converts_from_parse_error() {
        let err: Error = url::Url::parse("::").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
