// crates/framecut-media/src/decode.rs
//
// FrameDecoder: stateful per-handle video decoder producing native-size RGBA.
//
// Seeks reuse the open context. Backward moves and long forward jumps go
// through a container seek + decoder flush; short forward moves just keep
// decoding, which is much cheaper than re-seeking to the previous keyframe.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video;

use framecut_core::RgbaFrame;

use crate::helpers::seek::{pts_to_secs, secs_to_pts, seek_to_secs};

/// Forward distance (seconds) still served by decoding ahead instead of seeking.
const FORWARD_DECODE_WINDOW: f64 = 2.0;

/// How the demuxer has to move before decoding toward a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reposition {
    /// Short forward move: keep reading from the current position.
    Continue,
    /// Backward-keyframe container seek.
    Seek,
    /// Back to the very start of a context that has already been read.
    /// `seek_to_secs` skips targets ≤ 0, so the input is reopened instead.
    Reopen,
    /// Start of a context nothing has been read from yet.
    Stay,
}

/// Decide how to reach `target_pts` given the last frame handed out and
/// whether any packet was read from the current context.
pub(crate) fn reposition(last_pts: Option<i64>, touched: bool, target_pts: i64, window: i64) -> Reposition {
    if let Some(last) = last_pts {
        if target_pts > last && target_pts <= last + window {
            return Reposition::Continue;
        }
    }
    if target_pts <= 0 {
        return if touched { Reposition::Reopen } else { Reposition::Stay };
    }
    Reposition::Seek
}

/// Something that can produce the frame at a timestamp. Lives on a decode
/// thread for its whole life, so it need not be `Send`.
pub trait FrameSource {
    fn duration(&self) -> f64;
    fn size(&self) -> (u32, u32);
    /// The raster at `time` and its actual presentation time.
    fn frame_at(&mut self, time: f64) -> Result<(RgbaFrame, f64)>;
}

pub struct FrameDecoder {
    path:       PathBuf,
    ictx:       ffmpeg::format::context::Input,
    decoder:    ffmpeg::decoder::video::Video,
    scaler:     SwsContext,
    video_idx:  usize,
    tb_num:     i32,
    tb_den:     i32,
    /// PTS of the last frame handed out, `None` right after a container seek.
    last_pts:   Option<i64>,
    /// Packets have been read from `ictx` since it was opened.
    touched:    bool,
    width:      u32,
    height:     u32,
    duration:   f64,
}

impl FrameDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let ictx = input(path)?;
        let video_idx = ictx.streams().best(Type::Video)
            .ok_or_else(|| anyhow!("no video stream"))?.index();

        let (tb_num, tb_den, stream_dur) = {
            let stream = ictx.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
            let tb = stream.time_base();
            (tb.numerator(), tb.denominator(), stream.duration())
        };

        // Second context for decoder params (Parameters borrows from the stream).
        let ictx2   = input(path)?;
        let stream2 = ictx2.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream2.parameters())?;
        let decoder = dec_ctx.decoder().video()?;

        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(anyhow!("video stream reports {width}x{height}"));
        }

        let scaler = SwsContext::get(
            decoder.format(), width, height,
            Pixel::RGBA, width, height, Flags::BILINEAR,
        )?;

        let container = ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
        let duration = if container > 0.0 {
            container
        } else {
            pts_to_secs(stream_dur, tb_num, tb_den).max(0.0)
        };

        Ok(Self {
            path: path.to_path_buf(),
            ictx, decoder, scaler, video_idx, tb_num, tb_den,
            last_pts: None, touched: false, width, height, duration,
        })
    }

    fn to_rgba(&mut self, decoded: &Video) -> Result<RgbaFrame> {
        let mut out = Video::empty();
        self.scaler.run(decoded, &mut out)?;
        // Destripe: copy only visible pixels, not stride padding.
        let stride    = out.stride(0);
        let raw       = out.data(0);
        let row_bytes = self.width as usize * 4;
        let data: Vec<u8> = (0..self.height as usize)
            .flat_map(|row| &raw[row * stride..row * stride + row_bytes])
            .copied()
            .collect();
        Ok(RgbaFrame::new(self.width, self.height, data)?)
    }
}

impl FrameSource for FrameDecoder {
    fn duration(&self) -> f64 { self.duration }
    fn size(&self) -> (u32, u32) { (self.width, self.height) }

    /// Decode the frame displayed at `time` seconds. Past the last frame,
    /// the last decodable frame is returned.
    fn frame_at(&mut self, time: f64) -> Result<(RgbaFrame, f64)> {
        let target_pts = secs_to_pts(time, self.tb_num, self.tb_den);
        let window     = secs_to_pts(FORWARD_DECODE_WINDOW, self.tb_num, self.tb_den);

        match reposition(self.last_pts, self.touched, target_pts, window) {
            Reposition::Continue => {}
            Reposition::Stay => self.last_pts = None,
            Reposition::Seek => {
                seek_to_secs(&mut self.ictx, time, "frame_at");
                self.decoder.flush();
                self.last_pts = None;
            }
            Reposition::Reopen => {
                self.ictx = input(&self.path)?;
                self.touched = false;
                self.decoder.flush();
                self.last_pts = None;
            }
        }
        self.touched = true;

        let mut last_good: Option<(Video, i64)> = None;
        let mut found: Option<(Video, i64)> = None;

        'packets: for (stream, packet) in self.ictx.packets().flatten() {
            if stream.index() != self.video_idx { continue; }
            if self.decoder.send_packet(&packet).is_err() { continue; }
            let mut decoded = Video::empty();
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts()
                    .unwrap_or_else(|| last_good.as_ref().map(|(_, p)| p + 1).unwrap_or(0));
                // Pre-roll from the keyframe before the target.
                if pts + 2 < target_pts {
                    last_good = Some((decoded.clone(), pts));
                    continue;
                }
                found = Some((decoded.clone(), pts));
                break 'packets;
            }
        }

        let at_eof = found.is_none();
        if at_eof {
            // Drain frames buffered in the decoder at end of stream.
            let _ = self.decoder.send_eof();
            let mut decoded = Video::empty();
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts().unwrap_or(target_pts);
                last_good = Some((decoded.clone(), pts));
                if pts + 2 >= target_pts { break; }
            }
        }

        let (frame, pts) = found.or(last_good)
            .ok_or_else(|| anyhow!("no frame decoded at {time:.3}s"))?;
        // A drained decoder cannot continue; the next request must re-seek.
        self.last_pts = if at_eof { None } else { Some(pts) };
        let raster = self.to_rgba(&frame)?;
        Ok((raster, pts_to_secs(pts, self.tb_num, self.tb_den)))
    }
}
