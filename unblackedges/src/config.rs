use crate::pbm::PbmFormat;

/// Options for a cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct CleanConfig {
    /// Encoding of the cleaned bitmap.
    pub output_format: PbmFormat,
    /// Reject inputs declaring more pixels than this.
    pub max_pixels: Option<u64>,
}

#[cfg(feature = "serde")]
impl CleanConfig {
    /// Parse a TOML config, e.g.
    ///
    /// ```toml
    /// output_format = "raw"
    /// max_pixels = 100000000
    /// ```
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError(e.to_string()))
    }
}

#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
