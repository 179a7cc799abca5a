use thiserror::Error;

/// Errors raised by [`BitGrid`](crate::grid::BitGrid) construction and addressing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions {width}x{height} overflow the addressable bit count")]
    InvalidDimension { width: usize, height: usize },

    #[error("cell ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// Malformed PBM input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected magic number P1 or P4, found {0:?}")]
    BadMagic(String),

    #[error("invalid {what} in header: {token:?}")]
    BadDimension { what: &'static str, token: String },

    #[error("image {what} must be positive")]
    ZeroDimension { what: &'static str },

    #[error("pixel {index} is {token:?}, expected 0 or 1")]
    InvalidPixel { index: usize, token: String },

    #[error("expected {expected} pixels, found {found}")]
    MissingPixels { expected: usize, found: usize },

    #[error("unexpected data after the last pixel")]
    TrailingData,

    #[error("image {width}x{height} exceeds the limit of {limit} pixels")]
    TooLarge { width: usize, height: usize, limit: u64 },
}

/// Top-level error for a cleaning run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
