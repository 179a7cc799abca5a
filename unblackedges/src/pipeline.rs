use std::io::{Read, Write};

use log::info;

use crate::config::CleanConfig;
use crate::error::Result;
use crate::fill::{clear_border, FillStats};
use crate::pbm::{self, PbmFormat};

/// Summary of one cleaning run.
#[derive(Debug, Clone)]
pub struct Report {
    pub width: usize,
    pub height: usize,
    pub input_format: PbmFormat,
    pub black_before: usize,
    pub black_after: usize,
    pub fill: FillStats,
}

/// Read a PBM image, clear its border-connected black regions and write the result.
///
/// The whole output is produced in memory first, so nothing reaches `output`
/// unless decoding and cleaning succeed.
pub fn clean<R: Read, W: Write>(mut input: R, mut output: W, config: &CleanConfig) -> Result<Report> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    let decoded = pbm::decode(&data, config.max_pixels)?;
    drop(data);

    let mut grid = decoded.grid;
    let black_before = grid.count_black();
    let fill = clear_border(&mut grid);
    let black_after = grid.count_black();

    let encoded = pbm::encode(&grid, config.output_format);
    output.write_all(&encoded)?;
    output.flush()?;

    let report = Report {
        width: grid.width(),
        height: grid.height(),
        input_format: decoded.format,
        black_before,
        black_after,
        fill,
    };
    info!(
        "cleaned {}x{} bitmap: {} of {} black pixels cleared",
        report.width, report.height, report.fill.cleared, report.black_before
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};

    #[test]
    fn clean_plain_bitmap() {
        let input = b"P1\n5 5\n1 0 0 0 0\n0 0 0 0 0\n0 0 1 0 0\n0 0 0 0 0\n0 0 0 0 1\n";
        let mut out = Vec::new();
        let report = clean(&input[..], &mut out, &CleanConfig::default()).unwrap();
        assert_eq!(
            out,
            b"P1\n5 5\n0 0 0 0 0\n0 0 0 0 0\n0 0 1 0 0\n0 0 0 0 0\n0 0 0 0 0\n"
        );
        assert_eq!(report.input_format, PbmFormat::Plain);
        assert_eq!(report.black_before, 3);
        assert_eq!(report.black_after, 1);
        assert_eq!(report.fill.cleared, 2);
    }

    #[test]
    fn clean_can_emit_raw() {
        let config = CleanConfig {
            output_format: PbmFormat::Raw,
            ..CleanConfig::default()
        };
        let mut out = Vec::new();
        clean(&b"P1\n3 3\n0 0 0\n0 1 0\n0 0 0\n"[..], &mut out, &config).unwrap();
        assert_eq!(out, b"P4\n3 3\n\x00\x40\x00");
    }

    #[test]
    fn format_error_writes_nothing() {
        let mut out = Vec::new();
        let err = clean(&b"P1\n2 2\n0 1\n2 0\n"[..], &mut out, &CleanConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::InvalidPixel { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn pixel_limit_applies() {
        let config = CleanConfig {
            max_pixels: Some(8),
            ..CleanConfig::default()
        };
        let mut out = Vec::new();
        let err = clean(&b"P1\n3 3\n0 0 0\n0 1 0\n0 0 0\n"[..], &mut out, &config).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::TooLarge { .. })));
        assert!(out.is_empty());
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn read_failure_is_io_error() {
        let mut out = Vec::new();
        let err = clean(FailingReader, &mut out, &CleanConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(out.is_empty());
    }
}
