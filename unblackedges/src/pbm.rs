//! Reading and writing PBM bitmaps.
//!
//! Both the plain (`P1`) and raw (`P4`) variants are understood. Pixels are
//! stored in scanline order: the first `width` values form the top row.
//! `1` is black.

use std::io::{Read, Write};

use log::{debug, trace};

use crate::error::{FormatError, GridError, Result};
use crate::grid::BitGrid;

/// PBM encoding variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PbmFormat {
    /// `P1`: ASCII `0`/`1` tokens separated by whitespace.
    #[default]
    Plain,
    /// `P4`: rows packed eight pixels per byte, most significant bit first.
    Raw,
}

impl PbmFormat {
    pub fn magic(self) -> &'static str {
        match self {
            PbmFormat::Plain => "P1",
            PbmFormat::Raw => "P4",
        }
    }
}

/// A decoded bitmap together with the variant it was stored in.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub grid: BitGrid,
    pub format: PbmFormat,
}

/// Read a whole PBM stream and decode it.
pub fn parse<R: Read>(mut input: R) -> Result<Decoded> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    decode(&data, None)
}

/// Decode a PBM image held in memory.
///
/// `max_pixels` rejects images whose declared size exceeds the limit before
/// any pixel storage is allocated.
pub fn decode(data: &[u8], max_pixels: Option<u64>) -> Result<Decoded> {
    let mut sc = Scanner::new(data);

    let format = match sc.token() {
        Some(b"P1") => PbmFormat::Plain,
        Some(b"P4") => PbmFormat::Raw,
        Some(tok) => return Err(FormatError::BadMagic(lossy(tok)).into()),
        None => return Err(FormatError::BadMagic(String::new()).into()),
    };
    let width = sc.dimension("width")?;
    let height = sc.dimension("height")?;
    debug!("{} header: {width}x{height}", format.magic());

    if let Some(limit) = max_pixels {
        let fits = (width as u64)
            .checked_mul(height as u64)
            .is_some_and(|n| n <= limit);
        if !fits {
            return Err(FormatError::TooLarge {
                width,
                height,
                limit,
            }
            .into());
        }
    }
    let pixels = width
        .checked_mul(height)
        .ok_or(GridError::InvalidDimension { width, height })?;

    let grid = match format {
        PbmFormat::Plain => decode_plain(&mut sc, width, height, pixels)?,
        PbmFormat::Raw => decode_raw(&mut sc, width, height, pixels)?,
    };
    Ok(Decoded { grid, format })
}

fn decode_plain(sc: &mut Scanner, width: usize, height: usize, pixels: usize) -> Result<BitGrid> {
    // Every pixel token takes at least one byte.
    if sc.remaining() < pixels {
        let found = sc.count_tokens();
        return Err(FormatError::MissingPixels {
            expected: pixels,
            found,
        }
        .into());
    }

    let mut grid = BitGrid::new(width, height)?;
    for idx in 0..pixels {
        match sc.token() {
            Some(b"0") => {}
            Some(b"1") => grid.set_linear(idx, true),
            Some(tok) => {
                return Err(FormatError::InvalidPixel {
                    index: idx,
                    token: lossy(tok),
                }
                .into())
            }
            None => {
                return Err(FormatError::MissingPixels {
                    expected: pixels,
                    found: idx,
                }
                .into())
            }
        }
    }
    if sc.token().is_some() {
        return Err(FormatError::TrailingData.into());
    }
    trace!("decoded {pixels} plain pixels");
    Ok(grid)
}

fn decode_raw(sc: &mut Scanner, width: usize, height: usize, pixels: usize) -> Result<BitGrid> {
    sc.skip_raster_separator();

    let row_bytes = width.div_ceil(8);
    let rest = sc.rest();
    let needed = row_bytes
        .checked_mul(height)
        .ok_or(GridError::InvalidDimension { width, height })?;
    if rest.len() < needed {
        return Err(FormatError::MissingPixels {
            expected: pixels,
            found: (rest.len() / row_bytes) * width,
        }
        .into());
    }
    if rest[needed..].iter().any(|b| !b.is_ascii_whitespace()) {
        return Err(FormatError::TrailingData.into());
    }

    let mut grid = BitGrid::new(width, height)?;
    for (y, row) in rest[..needed].chunks_exact(row_bytes).enumerate() {
        for x in 0..width {
            if (row[x / 8] >> (7 - x % 8)) & 1 == 1 {
                grid.set_linear(x + width * y, true);
            }
        }
    }
    trace!("decoded {pixels} raw pixels");
    Ok(grid)
}

/// Encode a grid as a PBM image.
pub fn encode(grid: &BitGrid, format: PbmFormat) -> Vec<u8> {
    let header = format!("{}\n{} {}\n", format.magic(), grid.width(), grid.height());
    match format {
        PbmFormat::Plain => {
            let mut out = Vec::with_capacity(header.len() + 2 * grid.len());
            out.extend_from_slice(header.as_bytes());
            let last = grid.width().saturating_sub(1);
            grid.for_each_row_major(|x, _, black| {
                out.push(if black { b'1' } else { b'0' });
                out.push(if x == last { b'\n' } else { b' ' });
            });
            out
        }
        PbmFormat::Raw => {
            let row_bytes = grid.width().div_ceil(8);
            let mut out = Vec::with_capacity(header.len() + row_bytes * grid.height());
            out.extend_from_slice(header.as_bytes());
            let mut row = vec![0u8; row_bytes];
            for y in 0..grid.height() {
                row.fill(0);
                let base = grid.width() * y;
                for x in 0..grid.width() {
                    if grid.get_linear(base + x) {
                        row[x / 8] |= 0x80 >> (x % 8);
                    }
                }
                out.extend_from_slice(&row);
            }
            out
        }
    }
}

/// Write a grid as a PBM image.
pub fn serialize<W: Write>(grid: &BitGrid, format: PbmFormat, mut output: W) -> Result<()> {
    output.write_all(&encode(grid, format))?;
    Ok(())
}

fn lossy(tok: &[u8]) -> String {
    String::from_utf8_lossy(tok).into_owned()
}

/// Whitespace- and comment-aware cursor over PBM bytes.
struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Skip whitespace and `#` comments.
    fn skip_space(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                self.skip_comment();
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skip from `#` through the end of the line.
    fn skip_comment(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }

    fn token(&mut self) -> Option<&'a [u8]> {
        self.skip_space();
        let start = self.pos;
        while let Some(&b) = self.data.get(self.pos) {
            if b.is_ascii_whitespace() || b == b'#' {
                break;
            }
            self.pos += 1;
        }
        let (data, end) = (self.data, self.pos);
        (end > start).then(|| &data[start..end])
    }

    fn count_tokens(&mut self) -> usize {
        let mut n = 0;
        while self.token().is_some() {
            n += 1;
        }
        n
    }

    fn dimension(&mut self, what: &'static str) -> Result<usize> {
        let tok = self.token().unwrap_or_default();
        let value = std::str::from_utf8(tok)
            .ok()
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| FormatError::BadDimension {
                what,
                token: lossy(tok),
            })?;
        if value == 0 {
            return Err(FormatError::ZeroDimension { what }.into());
        }
        Ok(value)
    }

    /// Consume the single separator between a raw header and its raster.
    fn skip_raster_separator(&mut self) {
        match self.data.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => self.pos += 1,
            Some(b'#') => self.skip_comment(),
            _ => {}
        }
    }
}
