//! Embedded source metadata: extraction for orientation and carry-over into
//! encoded output.

use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

use crate::types::Orientation;

/// Identifier prefixing an XMP packet in a JPEG APP1 segment.
const XMP_JPEG_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
/// Identifier prefixing EXIF data in a JPEG APP1 segment.
const EXIF_JPEG_HEADER: &[u8] = b"Exif\0\0";
/// iTXt keyword under which PNG files carry XMP.
const XMP_PNG_KEYWORD: &[u8] = b"XML:com.adobe.xmp";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const EXIF_ORIENTATION_TAG: u16 = 0x0112;

/// Raw metadata blocks read from the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMetadata {
    /// TIFF-structured EXIF block, without any container prefix
    pub exif: Option<Vec<u8>>,
    /// XMP packet
    pub xmp: Option<Vec<u8>>,
}

impl SourceMetadata {
    pub fn is_empty(&self) -> bool {
        self.exif.is_none() && self.xmp.is_none()
    }

    /// Orientation recorded in the EXIF block, upright if absent.
    pub fn orientation(&self) -> Orientation {
        self.exif
            .as_ref()
            .and_then(|raw| Reader::new().read_raw(raw.clone()).ok())
            .map(|exif| MetadataExtractor::orientation(&exif))
            .unwrap_or_default()
    }

    /// Copy of this metadata describing an already-oriented raster.
    pub fn normalized(&self) -> SourceMetadata {
        let mut copy = self.clone();
        if let Some(exif) = copy.exif.as_mut() {
            reset_orientation(exif);
        }
        copy
    }
}

/// Extracts metadata from encoded image bytes.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Read EXIF and XMP from an encoded image.
    ///
    /// Lenient: anything that cannot be found or parsed is simply absent.
    pub fn extract(bytes: &[u8]) -> SourceMetadata {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .ok()
            .map(|exif| exif.buf().to_vec());
        let xmp = if bytes.starts_with(&[0xFF, 0xD8]) {
            jpeg_xmp(bytes)
        } else if bytes.starts_with(PNG_SIGNATURE) {
            png_xmp(bytes)
        } else {
            None
        };
        SourceMetadata { exif, xmp }
    }

    /// Map the EXIF orientation tag.
    pub fn orientation(exif: &exif::Exif) -> Orientation {
        Self::get_u32(exif, Tag::Orientation)
            .map(Orientation::from_exif)
            .unwrap_or_default()
    }

    /// Get a u32 field from EXIF data.
    fn get_u32(exif: &exif::Exif, tag: Tag) -> Option<u32> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| x as u32),
                Value::Long(v) => v.first().copied(),
                _ => None,
            })
    }
}

/// Walk JPEG marker segments up to the start of scan.
fn jpeg_segments(bytes: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut pos = 2;
    std::iter::from_fn(move || {
        while pos + 4 <= bytes.len() {
            if bytes[pos] != 0xFF {
                return None;
            }
            let marker = bytes[pos + 1];
            if marker == 0xFF {
                pos += 1;
                continue;
            }
            if marker == 0xDA || marker == 0xD9 {
                return None;
            }
            let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
            let end = (pos + 2 + len).min(bytes.len());
            let payload = bytes.get(pos + 4..end)?;
            pos = end;
            return Some((marker, payload));
        }
        None
    })
}

fn jpeg_xmp(bytes: &[u8]) -> Option<Vec<u8>> {
    jpeg_segments(bytes)
        .find(|(marker, payload)| *marker == 0xE1 && payload.starts_with(XMP_JPEG_HEADER))
        .map(|(_, payload)| payload[XMP_JPEG_HEADER.len()..].to_vec())
}

/// Walk PNG chunks as `(type, data)`.
fn png_chunks(bytes: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut pos = PNG_SIGNATURE.len();
    std::iter::from_fn(move || {
        let header = bytes.get(pos..pos + 8)?;
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];
        let data = bytes.get(pos + 8..pos + 8 + len)?;
        pos += 12 + len;
        Some((kind, data))
    })
}

fn png_xmp(bytes: &[u8]) -> Option<Vec<u8>> {
    png_chunks(bytes)
        .filter(|(kind, _)| kind == b"iTXt")
        .find_map(|(_, data)| {
            let rest = data.strip_prefix(XMP_PNG_KEYWORD)?.strip_prefix(&[0])?;
            // compression flag, compression method
            let (&compressed, rest) = rest.split_first()?;
            if compressed != 0 {
                return None;
            }
            let rest = rest.get(1..)?;
            // language tag and translated keyword, each NUL-terminated
            let lang_end = rest.iter().position(|&b| b == 0)?;
            let rest = &rest[lang_end + 1..];
            let keyword_end = rest.iter().position(|&b| b == 0)?;
            Some(rest[keyword_end + 1..].to_vec())
        })
}

/// Set the IFD0 orientation tag of a TIFF-structured EXIF block to 1
/// (upright), in place. Blocks without the tag are left untouched.
pub fn reset_orientation(tiff: &mut [u8]) {
    let big_endian = match tiff.get(0..2) {
        Some(b"MM") => true,
        Some(b"II") => false,
        _ => return,
    };
    let read_u16 = |buf: &[u8], at: usize| -> Option<u16> {
        let b = buf.get(at..at + 2)?;
        Some(if big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    };
    let Some(ifd) = tiff.get(4..8).map(|b| {
        let b = [b[0], b[1], b[2], b[3]];
        if big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        }
    }) else {
        return;
    };
    let ifd = ifd as usize;
    let Some(count) = read_u16(tiff, ifd) else {
        return;
    };

    for i in 0..count as usize {
        let entry = ifd + 2 + i * 12;
        let (Some(tag), Some(kind)) = (read_u16(tiff, entry), read_u16(tiff, entry + 2)) else {
            return;
        };
        // SHORT
        if tag == EXIF_ORIENTATION_TAG && kind == 3 {
            let one = if big_endian {
                1u16.to_be_bytes()
            } else {
                1u16.to_le_bytes()
            };
            if let Some(value) = tiff.get_mut(entry + 8..entry + 10) {
                value.copy_from_slice(&one);
            }
            return;
        }
    }
}

/// Insert EXIF/XMP APP1 segments into an encoded JPEG, after SOI and any
/// JFIF APP0 segment.
pub fn embed_in_jpeg(encoded: Vec<u8>, metadata: &SourceMetadata) -> Vec<u8> {
    let mut insert_at = 2;
    if let Some((0xE0, payload)) = jpeg_segments(&encoded).next() {
        insert_at += 4 + payload.len();
    }

    let mut segments = Vec::new();
    if let Some(exif) = &metadata.exif {
        push_app1(&mut segments, EXIF_JPEG_HEADER, exif);
    }
    if let Some(xmp) = &metadata.xmp {
        push_app1(&mut segments, XMP_JPEG_HEADER, xmp);
    }

    let mut out = Vec::with_capacity(encoded.len() + segments.len());
    out.extend_from_slice(&encoded[..insert_at]);
    out.extend_from_slice(&segments);
    out.extend_from_slice(&encoded[insert_at..]);
    out
}

fn push_app1(out: &mut Vec<u8>, header: &[u8], body: &[u8]) {
    let len = 2 + header.len() + body.len();
    if len > u16::MAX as usize {
        tracing::warn!("Metadata block of {} bytes does not fit a JPEG segment, dropping", body.len());
        return;
    }
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(header);
    out.extend_from_slice(body);
}

/// Insert `eXIf` and XMP `iTXt` chunks into an encoded PNG, after IHDR.
pub fn embed_in_png(encoded: Vec<u8>, metadata: &SourceMetadata) -> Vec<u8> {
    // signature + IHDR (length, type, 13 data bytes, crc)
    let insert_at = PNG_SIGNATURE.len() + 12 + 13;
    if encoded.len() < insert_at {
        return encoded;
    }

    let mut chunks = Vec::new();
    if let Some(exif) = &metadata.exif {
        push_png_chunk(&mut chunks, b"eXIf", exif);
    }
    if let Some(xmp) = &metadata.xmp {
        let mut data = Vec::with_capacity(XMP_PNG_KEYWORD.len() + 5 + xmp.len());
        data.extend_from_slice(XMP_PNG_KEYWORD);
        // NUL, uncompressed, method 0, empty language, empty translation
        data.extend_from_slice(&[0, 0, 0, 0, 0]);
        data.extend_from_slice(xmp);
        push_png_chunk(&mut chunks, b"iTXt", &data);
    }

    let mut out = Vec::with_capacity(encoded.len() + chunks.len());
    out.extend_from_slice(&encoded[..insert_at]);
    out.extend_from_slice(&chunks);
    out.extend_from_slice(&encoded[insert_at..]);
    out
}

fn push_png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}
