//! `data:` URLs used for signatures and profile pictures.

use crate::error::{AppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUrl(String);

impl DataUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let (mime, payload) = split(raw)?;
        if mime.is_empty() {
            return Err(AppError::InvalidDataUrl("missing media type".to_string()));
        }
        STANDARD
            .decode(payload)
            .map_err(|e| AppError::InvalidDataUrl(format!("bad base64 payload: {}", e)))?;
        Ok(DataUrl(raw.to_string()))
    }

    /// Build a data URL from raw bytes.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        DataUrl(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    pub fn mime(&self) -> &str {
        split(&self.0).map(|(mime, _)| mime).unwrap_or_default()
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, payload) = split(&self.0)?;
        STANDARD
            .decode(payload)
            .map_err(|e| AppError::InvalidDataUrl(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn split(raw: &str) -> Result<(&str, &str)> {
    let rest = raw
        .strip_prefix("data:")
        .ok_or_else(|| AppError::InvalidDataUrl("missing 'data:' prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::InvalidDataUrl("missing ',' separator".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::InvalidDataUrl("only base64 payloads are supported".to_string()))?;
    Ok((mime, payload))
}

impl TryFrom<String> for DataUrl {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self> {
        DataUrl::parse(&raw)
    }
}

impl From<DataUrl> for String {
    fn from(url: DataUrl) -> Self {
        url.0
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads can be large; show the media type only.
        write!(f, "data:{};base64,…", self.mime())
    }
}
