//! Audio source abstraction for the bound media resource.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{Error, Result};

/// Where the bound track comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// HTTP/HTTPS asset served by the host
    HttpStream { url: String },
    /// Local file on disk
    LocalFile { path: PathBuf },
}

impl TrackSource {
    /// Parse a source string into the appropriate source type.
    ///
    /// HTTP/HTTPS URLs become `HttpStream`, everything else is treated as a local path.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(Error::InvalidSource("empty source".into()));
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            Ok(TrackSource::HttpStream {
                url: source.to_string(),
            })
        } else {
            Ok(TrackSource::LocalFile {
                path: source.into(),
            })
        }
    }

    /// File extension, used as a format hint when probing.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            TrackSource::LocalFile { path } => path.as_path(),
            TrackSource::HttpStream { url } => {
                let trimmed = url.split(['?', '#']).next().unwrap_or(url);
                Path::new(trimmed)
            }
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Fetch the whole payload. Blocks; callers run this off the audio thread.
    pub fn read_bytes(&self) -> Result<Bytes> {
        match self {
            TrackSource::LocalFile { path } => {
                log::debug!("Reading local file: {}", path.display());
                Ok(Bytes::from(std::fs::read(path)?))
            }
            TrackSource::HttpStream { url } => {
                log::debug!("Downloading: {}", url);
                let response = reqwest::blocking::get(url)?;
                if !response.status().is_success() {
                    return Err(Error::Server(response.status().to_string()));
                }
                let bytes = response.bytes()?;
                log::debug!("Downloaded {} bytes", bytes.len());
                Ok(bytes)
            }
        }
    }
}

impl std::fmt::Display for TrackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackSource::HttpStream { url } => f.write_str(url),
            TrackSource::LocalFile { path } => write!(f, "{}", path.display()),
        }
    }
}
