//! Image header collaborator: physical voxel dimensions and units.
//!
//! [`NiftiHeaderReader`] understands NIfTI-1 (348-byte) and NIfTI-2
//! (540-byte) headers in either byte order, plain or gzip-compressed. Only
//! the header bytes are read.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::format_float;

const NIFTI1_HEADER_SIZE: i32 = 348;
const NIFTI2_HEADER_SIZE: i32 = 540;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHeader {
    /// `pixdim[1..=dim[0]]`: three spatial entries, a fourth for time series.
    pub voxel_sizes: Vec<f64>,
    pub spatial_unit: String,
    pub temporal_sampling: Option<f64>,
    pub temporal_unit: Option<String>,
}

impl ImageHeader {
    /// Spatial voxel sizes joined with `x`, e.g. `2.0x2.0x2.5`.
    pub fn resolution(&self) -> String {
        self.voxel_sizes
            .iter()
            .take(3)
            .map(|v| format_float(*v))
            .collect::<Vec<_>>()
            .join("x")
    }
}

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("cannot read image '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' has no readable NIfTI header: {reason}", path.display())]
    Unrecognized { path: PathBuf, reason: String },
}

pub trait ImageHeaderReader: Send + Sync {
    fn read_header(&self, path: &Path) -> Result<ImageHeader, HeaderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NiftiHeaderReader;

impl ImageHeaderReader for NiftiHeaderReader {
    fn read_header(&self, path: &Path) -> Result<ImageHeader, HeaderError> {
        let io_err = |source| HeaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let mut magic = [0u8; 2];
        file.read_exact(&mut magic).map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;

        let reader: Box<dyn Read> = if magic == GZIP_MAGIC {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let mut bytes = Vec::with_capacity(NIFTI2_HEADER_SIZE as usize);
        reader
            .take(NIFTI2_HEADER_SIZE as u64)
            .read_to_end(&mut bytes)
            .map_err(io_err)?;

        parse_header(&bytes).map_err(|reason| HeaderError::Unrecognized {
            path: path.to_path_buf(),
            reason,
        })
    }
}

/// Decode header bytes, detecting version and byte order from `sizeof_hdr`.
pub fn parse_header(bytes: &[u8]) -> Result<ImageHeader, String> {
    if bytes.len() < 4 {
        return Err(format!("only {} bytes available", bytes.len()));
    }
    let le = LittleEndian::read_i32(&bytes[0..4]);
    let be = BigEndian::read_i32(&bytes[0..4]);
    match (le, be) {
        (NIFTI1_HEADER_SIZE, _) => parse_nifti1::<LittleEndian>(bytes),
        (_, NIFTI1_HEADER_SIZE) => parse_nifti1::<BigEndian>(bytes),
        (NIFTI2_HEADER_SIZE, _) => parse_nifti2::<LittleEndian>(bytes),
        (_, NIFTI2_HEADER_SIZE) => parse_nifti2::<BigEndian>(bytes),
        _ => Err(format!("unexpected sizeof_hdr {le}")),
    }
}

fn require(bytes: &[u8], len: usize) -> Result<(), String> {
    if bytes.len() < len {
        Err(format!("truncated header: {} of {len} bytes", bytes.len()))
    } else {
        Ok(())
    }
}

fn parse_nifti1<B: ByteOrder>(bytes: &[u8]) -> Result<ImageHeader, String> {
    require(bytes, NIFTI1_HEADER_SIZE as usize)?;
    let ndim = B::read_i16(&bytes[40..42]) as i64;
    let pixdim: Vec<f64> = (0..8)
        .map(|i| widen(B::read_f32(&bytes[76 + 4 * i..80 + 4 * i])))
        .collect();
    Ok(build_header(ndim, &pixdim, bytes[123] as i32))
}

fn parse_nifti2<B: ByteOrder>(bytes: &[u8]) -> Result<ImageHeader, String> {
    require(bytes, NIFTI2_HEADER_SIZE as usize)?;
    let ndim = B::read_i64(&bytes[16..24]);
    let pixdim: Vec<f64> = (0..8)
        .map(|i| B::read_f64(&bytes[104 + 8 * i..112 + 8 * i]))
        .collect();
    Ok(build_header(ndim, &pixdim, B::read_i32(&bytes[500..504])))
}

/// Widen through the shortest decimal form so `1.1f32` stays `1.1`.
fn widen(x: f32) -> f64 {
    format!("{x}").parse().unwrap_or(x as f64)
}

fn build_header(ndim: i64, pixdim: &[f64], xyzt_units: i32) -> ImageHeader {
    let ndim = ndim.clamp(1, 7) as usize;
    let voxel_sizes = pixdim[1..=ndim].to_vec();
    let temporal_sampling = voxel_sizes.get(3).copied();
    ImageHeader {
        spatial_unit: spatial_unit_name(xyzt_units & 0x07).to_string(),
        temporal_unit: temporal_sampling
            .map(|_| temporal_unit_name(xyzt_units & 0x38).to_string()),
        temporal_sampling,
        voxel_sizes,
    }
}

fn spatial_unit_name(code: i32) -> &'static str {
    match code {
        1 => "meter",
        2 => "mm",
        3 => "micron",
        _ => "unknown",
    }
}

fn temporal_unit_name(code: i32) -> &'static str {
    match code {
        8 => "sec",
        16 => "msec",
        24 => "usec",
        32 => "hz",
        40 => "ppm",
        48 => "rads",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn nifti1<B: ByteOrder>(dims: &[i16], pixdim: &[f32], xyzt_units: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 352];
        B::write_i32(&mut buf[0..4], NIFTI1_HEADER_SIZE);
        B::write_i16(&mut buf[40..42], dims.len() as i16);
        for (i, d) in dims.iter().enumerate() {
            B::write_i16(&mut buf[42 + 2 * i..44 + 2 * i], *d);
        }
        B::write_f32(&mut buf[76..80], 1.0);
        for (i, p) in pixdim.iter().enumerate() {
            B::write_f32(&mut buf[80 + 4 * i..84 + 4 * i], *p);
        }
        buf[123] = xyzt_units;
        buf[344..348].copy_from_slice(b"n+1\0");
        buf
    }

    #[test]
    fn parses_little_endian_3d() {
        let bytes = nifti1::<LittleEndian>(&[64, 64, 30], &[3.0, 3.0, 3.5], 2 | 8);
        let h = parse_header(&bytes).unwrap();
        assert_eq!(h.voxel_sizes, vec![3.0, 3.0, 3.5]);
        assert_eq!(h.resolution(), "3.0x3.0x3.5");
        assert_eq!(h.spatial_unit, "mm");
        assert_eq!(h.temporal_sampling, None);
        assert_eq!(h.temporal_unit, None);
    }

    #[test]
    fn parses_big_endian_4d() {
        let bytes = nifti1::<BigEndian>(&[64, 64, 30, 120], &[1.1, 1.1, 1.1, 2.0], 2 | 8);
        let h = parse_header(&bytes).unwrap();
        assert_eq!(h.resolution(), "1.1x1.1x1.1");
        assert_eq!(h.temporal_sampling, Some(2.0));
        assert_eq!(h.temporal_unit.as_deref(), Some("sec"));
    }

    #[test]
    fn parses_nifti2() {
        let mut buf = vec![0u8; 544];
        LittleEndian::write_i32(&mut buf[0..4], NIFTI2_HEADER_SIZE);
        LittleEndian::write_i64(&mut buf[16..24], 3);
        for (i, p) in [1.0, 0.8, 0.8, 0.8].iter().enumerate() {
            LittleEndian::write_f64(&mut buf[104 + 8 * i..112 + 8 * i], *p);
        }
        LittleEndian::write_i32(&mut buf[500..504], 3);
        let h = parse_header(&buf).unwrap();
        assert_eq!(h.resolution(), "0.8x0.8x0.8");
        assert_eq!(h.spatial_unit, "micron");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_header(b"hello world").is_err());
        assert!(parse_header(&[1, 2]).is_err());
    }

    #[test]
    fn reads_plain_and_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = nifti1::<LittleEndian>(&[10, 10, 10, 5], &[2.0, 2.0, 2.0, 1.5], 2 | 8);

        let plain = dir.path().join("a.nii");
        std::fs::write(&plain, &bytes).unwrap();

        let gz = dir.path().join("a.nii.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&bytes).unwrap();
        std::fs::write(&gz, enc.finish().unwrap()).unwrap();

        let reader = NiftiHeaderReader;
        let a = reader.read_header(&plain).unwrap();
        let b = reader.read_header(&gz).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.temporal_sampling, Some(1.5));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NiftiHeaderReader
            .read_header(&dir.path().join("gone.nii.gz"))
            .unwrap_err();
        assert!(matches!(err, HeaderError::Io { .. }));
    }
}
