// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image recompression — re-encode every embedded image XObject as JPEG at a
// caller-chosen quality, flattening transparency onto white, and strip page
// annotations.

use std::io::Read;

use blattwerk_core::error::{BlattwerkError, Result};
use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument, warn};

use crate::pdf::codec;

/// Lowest accepted quality factor.
pub const MIN_QUALITY: f32 = 0.1;
/// Highest accepted quality factor.
pub const MAX_QUALITY: f32 = 1.0;

/// Recompress a document's embedded images.
///
/// Every stream object with `/Subtype /Image` is decoded, flattened onto an
/// opaque white background, and re-encoded as a DCTDecode (JPEG) stream at
/// `quality` (0.1 to 1.0 inclusive, mapped to JPEG quality 10 to 100).
/// Images in a shape the decoder does not understand are left untouched.
/// Page annotations are removed as part of the pass, so the output is a
/// flat, annotation-free document.
#[instrument(skip(bytes), fields(bytes_len = bytes.len(), quality))]
pub fn recompress(bytes: &[u8], quality: f32) -> Result<Vec<u8>> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(BlattwerkError::QualityOutOfRange(quality));
    }
    let jpeg_quality = (quality * 100.0).round() as u8;

    let mut document = codec::open(bytes)?;

    let image_ids: Vec<ObjectId> = document
        .objects
        .iter()
        .filter_map(|(id, object)| match object {
            Object::Stream(stream) if is_image_stream(stream) => Some(*id),
            _ => None,
        })
        .collect();

    info!(images = image_ids.len(), jpeg_quality, "Recompressing document");

    let mut recompressed = 0usize;
    for object_id in image_ids {
        let stream = match document.get_object(object_id) {
            Ok(Object::Stream(stream)) => stream.clone(),
            _ => continue,
        };

        match reencode_image(&document, &stream, jpeg_quality) {
            Ok(new_stream) => {
                document
                    .objects
                    .insert(object_id, Object::Stream(new_stream));
                recompressed += 1;
            }
            Err(reason) => {
                warn!(?object_id, %reason, "Leaving image untouched");
            }
        }
    }

    clear_annotations(&mut document);

    // Re-encoding drops SMask references; pruning removes the now-orphaned
    // alpha streams and annotation objects.
    document.prune_objects();
    document.compress();

    debug!(recompressed, "Recompression pass complete");
    codec::serialize(&mut document)
}

// -- Stream inspection --------------------------------------------------------

fn is_image_stream(stream: &Stream) -> bool {
    matches!(
        stream.dict.get(b"Subtype"),
        Ok(Object::Name(name)) if name == b"Image"
    )
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key) {
        Ok(Object::Integer(value)) => Some(*value as u32),
        _ => None,
    }
}

fn first_filter_name(dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => Some(String::from_utf8_lossy(name).to_string()),
        Ok(Object::Array(array)) => array.first().and_then(|entry| match entry {
            Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
            _ => None,
        }),
        _ => None,
    }
}

fn color_space_name(object: &Object, document: &Document) -> String {
    match object {
        Object::Name(name) => String::from_utf8_lossy(name).to_string(),
        Object::Array(array) => match array.first() {
            Some(Object::Name(name)) => String::from_utf8_lossy(name).to_string(),
            _ => "Unknown".to_string(),
        },
        Object::Reference(id) => match document.get_object(*id) {
            Ok(resolved) => color_space_name(resolved, document),
            Err(_) => "Unknown".to_string(),
        },
        _ => "Unknown".to_string(),
    }
}

// -- Decoding -----------------------------------------------------------------

/// Decode an image XObject into pixel data. Errors here are skip reasons,
/// not pipeline failures.
fn decode_image_stream(
    document: &Document,
    stream: &Stream,
    width: u32,
    height: u32,
) -> std::result::Result<DynamicImage, String> {
    let bits_per_component = dict_u32(&stream.dict, b"BitsPerComponent").unwrap_or(8);
    if bits_per_component != 8 {
        return Err(format!("unsupported bit depth {bits_per_component}"));
    }

    let raw = match first_filter_name(&stream.dict).as_deref() {
        Some("DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| format!("JPEG decode failed: {err}"));
        }
        Some("FlateDecode") => {
            let mut decoder = ZlibDecoder::new(&stream.content[..]);
            let mut decoded = Vec::new();
            decoder
                .read_to_end(&mut decoded)
                .map_err(|err| format!("Flate decode failed: {err}"))?;
            decoded
        }
        None => stream.content.clone(),
        Some(other) => return Err(format!("unsupported filter {other}")),
    };

    let color_space = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .map(|cs| color_space_name(cs, document))
        .unwrap_or_else(|| "DeviceRGB".to_string());
    let pixels = (width * height) as usize;

    match color_space.as_str() {
        "DeviceRGB" => {
            if raw.len() < pixels * 3 {
                return Err(format!("RGB data too short: {} bytes", raw.len()));
            }
            RgbImage::from_raw(width, height, raw[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "RGB buffer construction failed".to_string())
        }
        "DeviceGray" => {
            if raw.len() < pixels {
                return Err(format!("grayscale data too short: {} bytes", raw.len()));
            }
            GrayImage::from_raw(width, height, raw[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| "grayscale buffer construction failed".to_string())
        }
        "DeviceCMYK" => {
            if raw.len() < pixels * 4 {
                return Err(format!("CMYK data too short: {} bytes", raw.len()));
            }
            let mut rgb_data = Vec::with_capacity(pixels * 3);
            for chunk in raw[..pixels * 4].chunks(4) {
                let c = chunk[0] as f32 / 255.0;
                let m = chunk[1] as f32 / 255.0;
                let y = chunk[2] as f32 / 255.0;
                let k = chunk[3] as f32 / 255.0;
                rgb_data.push(((1.0 - c) * (1.0 - k) * 255.0) as u8);
                rgb_data.push(((1.0 - m) * (1.0 - k) * 255.0) as u8);
                rgb_data.push(((1.0 - y) * (1.0 - k) * 255.0) as u8);
            }
            RgbImage::from_raw(width, height, rgb_data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "CMYK buffer construction failed".to_string())
        }
        "ICCBased" => {
            // Component count is not recorded here; infer it from the data size.
            if raw.len() >= pixels * 3 {
                RgbImage::from_raw(width, height, raw[..pixels * 3].to_vec())
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| "ICC RGB buffer construction failed".to_string())
            } else if raw.len() >= pixels {
                GrayImage::from_raw(width, height, raw[..pixels].to_vec())
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| "ICC grayscale buffer construction failed".to_string())
            } else {
                Err("cannot infer ICCBased component count".to_string())
            }
        }
        other => Err(format!("unsupported color space {other}")),
    }
}

/// Decode an SMask stream into an 8-bit alpha plane.
fn decode_smask_stream(
    stream: &Stream,
    width: u32,
    height: u32,
) -> std::result::Result<Vec<u8>, String> {
    let raw = match first_filter_name(&stream.dict).as_deref() {
        Some("FlateDecode") => {
            let mut decoder = ZlibDecoder::new(&stream.content[..]);
            let mut decoded = Vec::new();
            decoder
                .read_to_end(&mut decoded)
                .map_err(|err| format!("SMask Flate decode failed: {err}"))?;
            decoded
        }
        Some("DCTDecode") => {
            image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| format!("SMask JPEG decode failed: {err}"))?
                .to_luma8()
                .into_raw()
        }
        None => stream.content.clone(),
        Some(other) => return Err(format!("unsupported SMask filter {other}")),
    };

    let expected = (width * height) as usize;
    if raw.len() < expected {
        return Err(format!(
            "SMask data too short: {} bytes for {expected} pixels",
            raw.len()
        ));
    }
    Ok(raw[..expected].to_vec())
}

// -- Re-encoding --------------------------------------------------------------

/// Decode, flatten, and JPEG-encode one image stream, producing its
/// replacement. The new stream never carries an SMask; transparency is
/// composited onto white instead.
fn reencode_image(
    document: &Document,
    stream: &Stream,
    jpeg_quality: u8,
) -> std::result::Result<Stream, String> {
    let width = dict_u32(&stream.dict, b"Width").ok_or("missing /Width")?;
    let height = dict_u32(&stream.dict, b"Height").ok_or("missing /Height")?;
    if width == 0 || height == 0 {
        return Err("zero-sized image".to_string());
    }

    let mut decoded = decode_image_stream(document, stream, width, height)?;

    if let Ok(Object::Reference(smask_id)) = stream.dict.get(b"SMask") {
        if let Ok(Object::Stream(smask_stream)) = document.get_object(*smask_id) {
            match decode_smask_stream(smask_stream, width, height) {
                Ok(alpha) => decoded = apply_alpha(&decoded, &alpha, width, height),
                Err(reason) => debug!(%reason, "Ignoring undecodable SMask"),
            }
        }
    }

    let rgb = flatten_onto_white(&decoded);
    let (out_width, out_height) = rgb.dimensions();

    let mut jpeg_bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| format!("JPEG encode failed: {err}"))?;

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(out_width as i64));
    dict.set("Height", Object::Integer(out_height as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    dict.set("Length", Object::Integer(jpeg_bytes.len() as i64));

    Ok(Stream::new(dict, jpeg_bytes))
}

/// Attach a decoded alpha plane to an image, producing RGBA pixel data.
fn apply_alpha(image: &DynamicImage, alpha: &[u8], width: u32, height: u32) -> DynamicImage {
    let rgb = image.to_rgb8();
    let mut rgba_data = Vec::with_capacity((width * height * 4) as usize);
    for (pixel, a) in rgb.pixels().zip(alpha.iter()) {
        rgba_data.extend_from_slice(&[pixel[0], pixel[1], pixel[2], *a]);
    }
    match image::RgbaImage::from_raw(width, height, rgba_data) {
        Some(rgba) => DynamicImage::ImageRgba8(rgba),
        None => image.clone(),
    }
}

/// Composite any transparency onto an opaque white background, yielding RGB.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        DynamicImage::ImageLuma8(_) => image.to_rgb8(),
        _ => {
            let rgba = image.to_rgba8();
            let (width, height) = rgba.dimensions();
            let mut rgb = RgbImage::new(width, height);
            for (src, dst) in rgba.pixels().zip(rgb.pixels_mut()) {
                let a = src[3] as u16;
                for channel in 0..3 {
                    dst[channel] = ((src[channel] as u16 * a + 255 * (255 - a)) / 255) as u8;
                }
            }
            rgb
        }
    }
}

/// Drop the /Annots entry from every page.
fn clear_annotations(document: &mut Document) {
    let page_ids: Vec<ObjectId> = document.get_pages().values().copied().collect();
    for page_id in page_ids {
        if let Ok(Object::Dictionary(page_dict)) = document.get_object_mut(page_id) {
            page_dict.remove(b"Annots");
        }
    }
}
