// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterisation — render PDF pages to image buffers via MuPDF and encode
// them with the `image` crate.

use std::io::Cursor;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::RasterFormat;
use image::DynamicImage;
use mupdf::{Colorspace, Matrix, Pixmap};
use tracing::{debug, info, instrument};

/// Lowest accepted render resolution.
pub const MIN_DPI: u32 = 72;
/// Highest accepted render resolution.
pub const MAX_DPI: u32 = 600;

/// PDF user space runs at 72 units per inch.
const BASE_DPI: f32 = 72.0;

/// Render every page of a document to an encoded image, one buffer per page
/// in page order.
///
/// `dpi` must lie in `[72, 600]`; the render scale is `dpi / 72` in both
/// axes. Pages are rendered in device RGB without an alpha channel.
#[instrument(skip(bytes), fields(bytes_len = bytes.len(), %format, dpi))]
pub fn rasterize(bytes: &[u8], format: RasterFormat, dpi: u32) -> Result<Vec<Vec<u8>>> {
    if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
        return Err(BlattwerkError::DpiOutOfRange(dpi));
    }

    let document = mupdf::Document::from_bytes(bytes, "application/pdf")
        .map_err(|err| BlattwerkError::Render(format!("failed to open document: {err}")))?;
    let page_count = document
        .page_count()
        .map_err(|err| BlattwerkError::Render(format!("failed to count pages: {err}")))?;

    let scale = dpi as f32 / BASE_DPI;
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();

    info!(page_count, scale, "Rasterising document");

    let mut buffers = Vec::with_capacity(page_count as usize);
    for index in 0..page_count {
        let page = document
            .load_page(index)
            .map_err(|err| BlattwerkError::Render(format!("failed to load page {index}: {err}")))?;
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(|err| {
                BlattwerkError::Render(format!("failed to render page {index}: {err}"))
            })?;

        let encoded = encode_pixmap(&pixmap, format)?;
        debug!(page = index + 1, encoded_bytes = encoded.len(), "Page rendered");
        buffers.push(encoded);
    }

    Ok(buffers)
}

/// Encode a rendered pixmap in the requested output format.
fn encode_pixmap(pixmap: &Pixmap, format: RasterFormat) -> Result<Vec<u8>> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgba_buffer = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            rgba_buffer.extend_from_slice(&[r, g, b, 255]);
        }
    }

    let rgba = image::RgbaImage::from_raw(width, height, rgba_buffer).ok_or_else(|| {
        BlattwerkError::Image("failed to build image buffer from pixmap".to_string())
    })?;

    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);
    match format {
        RasterFormat::Png => DynamicImage::ImageRgba8(rgba)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|err| BlattwerkError::Image(format!("PNG encode failed: {err}")))?,
        // JPEG carries no alpha channel.
        RasterFormat::Jpeg | RasterFormat::Jpg => DynamicImage::ImageRgba8(rgba)
            .to_rgb8()
            .write_to(&mut cursor, image::ImageFormat::Jpeg)
            .map_err(|err| BlattwerkError::Image(format!("JPEG encode failed: {err}")))?,
        RasterFormat::Gif => DynamicImage::ImageRgba8(rgba)
            .write_to(&mut cursor, image::ImageFormat::Gif)
            .map_err(|err| BlattwerkError::Image(format!("GIF encode failed: {err}")))?,
        RasterFormat::Bmp => DynamicImage::ImageRgba8(rgba)
            .write_to(&mut cursor, image::ImageFormat::Bmp)
            .map_err(|err| BlattwerkError::Image(format!("BMP encode failed: {err}")))?,
    }

    Ok(output)
}
