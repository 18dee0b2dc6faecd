//! JPEG fixtures with hand-assembled EXIF blocks, shared by unit and
//! integration tests.

use image::{ImageEncoder, Rgb, RgbImage, codecs::jpeg::JpegEncoder};

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ORIENTATION: u16 = 0x0112;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_EXPOSURE_TIME: u16 = 0x829A;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_ISO_SPEED_RATINGS: u16 = 0x8827;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_FOCAL_LENGTH: u16 = 0x920A;

const FORMAT_SHORT: u16 = 3;
const FORMAT_ASCII: u16 = 2;
const FORMAT_LONG: u16 = 4;
const FORMAT_RATIONAL: u16 = 5;

#[derive(Debug, Clone)]
pub struct ExifFixture {
    pub model: Option<String>,
    pub exposure_time: Option<(u32, u32)>,
    pub f_number: Option<(u32, u32)>,
    pub iso_speed: Option<u16>,
    pub make: Option<String>,
    pub focal_length: Option<(u32, u32)>,
    pub date_time_original: Option<String>,
    /// EXIF Orientation, 1 through 8. Left out of the file when `None`.
    pub orientation: Option<u16>,
}

impl ExifFixture {
    /// `{Model: "X100", FNumber: 2.8, ExposureTime: 1/250, ISOSpeedRatings: 200}`
    /// shot by a FUJIFILM at 23mm, with no orientation tag.
    pub fn x100() -> Self {
        Self {
            model: Some("X100".to_string()),
            exposure_time: Some((1, 250)),
            f_number: Some((28, 10)),
            iso_speed: Some(200),
            make: Some("FUJIFILM".to_string()),
            focal_length: Some((230, 10)),
            date_time_original: Some("2024:05:01 10:20:30".to_string()),
            orientation: None,
        }
    }
}

/// Deterministic gradient so resize and copy are observable.
pub fn test_pattern(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            96,
        ])
    })
}

pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = test_pattern(width, height);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .write_image(&img, width, height, image::ExtendedColorType::Rgb8)
        .expect("encode fixture jpeg");
    out
}

/// Encode a JPEG and splice an APP1 EXIF segment right after SOI.
pub fn jpeg_with_exif(width: u32, height: u32, fixture: &ExifFixture) -> Vec<u8> {
    let jpeg = plain_jpeg(width, height);
    let tiff = build_tiff(fixture);

    let mut segment = Vec::with_capacity(tiff.len() + 10);
    segment.extend_from_slice(&[0xFF, 0xE1]);
    segment.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + segment.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

struct IfdEntry {
    tag: u16,
    format: u16,
    count: u32,
    payload: Vec<u8>,
}

/// Little-endian TIFF: IFD0 (Make, Model, Orientation, Exif pointer) then the
/// Exif sub-IFD.
fn build_tiff(fixture: &ExifFixture) -> Vec<u8> {
    let mut ifd0 = Vec::new();
    if let Some(make) = &fixture.make {
        ifd0.push(ascii_entry(TAG_MAKE, make));
    }
    if let Some(model) = &fixture.model {
        ifd0.push(ascii_entry(TAG_MODEL, model));
    }
    if let Some(orientation) = fixture.orientation {
        ifd0.push(short_entry(TAG_ORIENTATION, orientation));
    }

    let mut exif_ifd = Vec::new();
    if let Some((n, d)) = fixture.exposure_time {
        exif_ifd.push(rational_entry(TAG_EXPOSURE_TIME, n, d));
    }
    if let Some((n, d)) = fixture.f_number {
        exif_ifd.push(rational_entry(TAG_F_NUMBER, n, d));
    }
    if let Some(iso) = fixture.iso_speed {
        exif_ifd.push(short_entry(TAG_ISO_SPEED_RATINGS, iso));
    }
    if let Some(date) = &fixture.date_time_original {
        exif_ifd.push(ascii_entry(TAG_DATE_TIME_ORIGINAL, date));
    }
    if let Some((n, d)) = fixture.focal_length {
        exif_ifd.push(rational_entry(TAG_FOCAL_LENGTH, n, d));
    }
    exif_ifd.sort_by_key(|e| e.tag);

    let ifd0_offset = 8u32;
    let ifd0_len = ifd_size(ifd0.len() + 1) + data_size(&ifd0);
    let exif_offset = ifd0_offset + ifd0_len;

    ifd0.push(IfdEntry {
        tag: TAG_EXIF_IFD,
        format: FORMAT_LONG,
        count: 1,
        payload: exif_offset.to_le_bytes().to_vec(),
    });
    ifd0.sort_by_key(|e| e.tag);

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&ifd0_offset.to_le_bytes());
    write_ifd(&mut out, ifd0_offset, &ifd0);
    debug_assert_eq!(out.len() as u32, exif_offset);
    write_ifd(&mut out, exif_offset, &exif_ifd);
    out
}

fn ascii_entry(tag: u16, value: &str) -> IfdEntry {
    let mut payload = value.as_bytes().to_vec();
    payload.push(0);
    IfdEntry {
        tag,
        format: FORMAT_ASCII,
        count: payload.len() as u32,
        payload,
    }
}

fn short_entry(tag: u16, value: u16) -> IfdEntry {
    IfdEntry {
        tag,
        format: FORMAT_SHORT,
        count: 1,
        payload: value.to_le_bytes().to_vec(),
    }
}

fn rational_entry(tag: u16, numerator: u32, denominator: u32) -> IfdEntry {
    let mut payload = numerator.to_le_bytes().to_vec();
    payload.extend_from_slice(&denominator.to_le_bytes());
    IfdEntry {
        tag,
        format: FORMAT_RATIONAL,
        count: 1,
        payload,
    }
}

fn ifd_size(entries: usize) -> u32 {
    (2 + entries * 12 + 4) as u32
}

fn data_size(entries: &[IfdEntry]) -> u32 {
    entries
        .iter()
        .filter(|e| e.payload.len() > 4)
        .map(|e| e.payload.len().next_multiple_of(2) as u32)
        .sum()
}

fn write_ifd(out: &mut Vec<u8>, offset: u32, entries: &[IfdEntry]) {
    let mut data_offset = offset + ifd_size(entries.len());
    let mut data = Vec::new();

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.format.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.payload.len() <= 4 {
            let mut inline = entry.payload.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&data_offset.to_le_bytes());
            let mut payload = entry.payload.clone();
            if payload.len() % 2 == 1 {
                payload.push(0);
            }
            data_offset += payload.len() as u32;
            data.extend_from_slice(&payload);
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data);
}
