// crates/framecut-core/src/image_codec.rs
//
// Still-image encoding for captures and storyboard entries.
//   PNG  — `png` crate, RGBA 8-bit, lossless.
//   JPEG — `image` crate's encoder at a fixed quality (0.9 by default).
//          Alpha is dropped; JPEG has no alpha channel.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::error::{FrameCutError, Result};
use crate::media_types::{ImageFormat, RgbaFrame};

/// Encode `frame` in `format`. `quality` (0, 1] applies to JPEG only.
pub fn encode_frame(frame: &RgbaFrame, format: ImageFormat, quality: f32) -> Result<Vec<u8>> {
    if frame.width == 0 || frame.height == 0 {
        return Err(FrameCutError::EncodingFailure(format!(
            "cannot encode a {}x{} image", frame.width, frame.height
        )));
    }
    match format {
        ImageFormat::Png  => encode_png(frame),
        ImageFormat::Jpeg => encode_jpeg(frame, quality),
    }
}

fn encode_png(frame: &RgbaFrame) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(FrameCutError::encoding)?;
        writer.write_image_data(&frame.data).map_err(FrameCutError::encoding)?;
        writer.finish().map_err(FrameCutError::encoding)?;
    }
    Ok(out)
}

fn encode_jpeg(frame: &RgbaFrame, quality: f32) -> Result<Vec<u8>> {
    let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let rgb = frame.to_rgb();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, q)
        .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(FrameCutError::encoding)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_pixels() {
        let frame = RgbaFrame::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128]).unwrap();
        let bytes = encode_frame(&frame, ImageFormat::Png, 0.9).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0u8; reader.output_buffer_size().unwrap()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(&buf[..info.buffer_size()], frame.data.as_slice());
    }

    #[test]
    fn jpeg_has_soi_marker() {
        let frame = RgbaFrame::filled(16, 8, [10, 200, 30, 255]);
        let bytes = encode_frame(&frame, ImageFormat::Jpeg, 0.9).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = RgbaFrame { width: 0, height: 0, data: vec![] };
        assert!(matches!(
            encode_frame(&frame, ImageFormat::Png, 0.9),
            Err(FrameCutError::EncodingFailure(_))
        ));
    }
}
