//! Media source addressing

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::error::PlayerError;

const NETWORK_SCHEMES: [&str; 6] = ["http", "https", "rtmp", "rtsp", "rtp", "udp"];

/// Where a decoder reads media from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Local file path
    LocalFile(PathBuf),

    /// Network location with its lowercase scheme
    Network { url: String, scheme: String },
}

impl MediaSource {
    /// Parse a URI or plain path
    pub fn parse(uri: &str) -> Result<Self, PlayerError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(PlayerError::InvalidInput("media source is empty".to_string()));
        }

        if let Some((scheme, rest)) = uri.split_once("://") {
            let scheme = scheme.to_ascii_lowercase();
            if scheme == "file" {
                return Ok(MediaSource::LocalFile(PathBuf::from(rest)));
            }
            if NETWORK_SCHEMES.contains(&scheme.as_str()) {
                if rest.is_empty() {
                    return Err(PlayerError::InvalidInput(format!("missing host in '{}'", uri)));
                }
                return Ok(MediaSource::Network {
                    url: uri.to_string(),
                    scheme,
                });
            }
            return Err(PlayerError::InvalidInput(format!(
                "unsupported scheme '{}'",
                scheme
            )));
        }

        Ok(MediaSource::LocalFile(PathBuf::from(uri)))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, MediaSource::Network { .. })
    }

    /// Short name used in logs and timeline titles
    pub fn title(&self) -> String {
        match self {
            MediaSource::LocalFile(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            MediaSource::Network { url, .. } => url
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or(url)
                .to_string(),
        }
    }
}

impl FromStr for MediaSource {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaSource::parse(s)
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::LocalFile(path) => write!(f, "{}", path.display()),
            MediaSource::Network { url, .. } => f.write_str(url),
        }
    }
}
