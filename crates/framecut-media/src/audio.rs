// crates/framecut-media/src/audio.rs
//
// FfmpegAudioSource: decodes a file's audio track into planar f32 at the
// source's own rate and channel layout. No resampling: the converter is only
// there to turn whatever sample format the codec emits into planar f32.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::format::sample::{Sample, Type as SampleType};
use ffmpeg::media::Type as MediaType;
use ffmpeg::software::resampling;
use ffmpeg::util::channel_layout::ChannelLayout;
use ffmpeg::util::frame::audio::Audio as AudioFrame;
use tracing::info;

use framecut_core::{AudioSampleBuffer, AudioSource, FrameCutError};

const OUT_FMT: Sample = Sample::F32(SampleType::Planar);

pub struct FfmpegAudioSource {
    path:      PathBuf,
    file_size: u64,
}

impl FfmpegAudioSource {
    pub fn new(path: &Path, file_size: u64) -> Self {
        Self { path: path.to_path_buf(), file_size }
    }
}

impl AudioSource for FfmpegAudioSource {
    /// Raw container size; the large-file policy is about bytes on disk.
    fn byte_len(&self) -> u64 { self.file_size }

    fn decode(&self) -> framecut_core::Result<AudioSampleBuffer> {
        let buffer = decode_planar(&self.path)
            .map_err(|e| FrameCutError::DecodeFailure(format!("{e:#}")))?;
        info!(
            "[audio] decoded {} frames, {} ch @ {} Hz ← {}",
            buffer.frame_count(), buffer.channel_count(), buffer.sample_rate(), self.path.display()
        );
        Ok(buffer)
    }
}

/// Per-file decode state. The converter is built lazily on the first frame,
/// once the real source format, layout and rate are known.
struct Collector {
    converter: Option<resampling::Context>,
    channels:  Vec<Vec<f32>>,
    rate:      u32,
}

fn decode_planar(path: &Path) -> Result<AudioSampleBuffer> {
    let mut ictx = input(path).with_context(|| format!("open {}", path.display()))?;

    let audio_idx = ictx
        .streams()
        .best(MediaType::Audio)
        .ok_or_else(|| anyhow!("no audio stream"))?
        .index();

    let stream  = ictx.stream(audio_idx).ok_or_else(|| anyhow!("stream gone"))?;
    let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .context("codec context")?;
    let mut decoder = dec_ctx.decoder().audio().context("audio decoder")?;

    let mut out = Collector { converter: None, channels: Vec::new(), rate: 0 };

    for (stream, packet) in ictx.packets().flatten() {
        if stream.index() != audio_idx { continue; }
        if decoder.send_packet(&packet).is_err() { continue; }
        let mut frame = AudioFrame::empty();
        while decoder.receive_frame(&mut frame).is_ok() {
            out.push(&frame)?;
        }
    }

    let _ = decoder.send_eof();
    let mut frame = AudioFrame::empty();
    while decoder.receive_frame(&mut frame).is_ok() {
        out.push(&frame)?;
    }

    if out.channels.first().map_or(true, |c| c.is_empty()) {
        return Err(anyhow!("no audio samples decoded"));
    }
    Ok(AudioSampleBuffer::new(out.rate, out.channels)?)
}

impl Collector {
    fn push(&mut self, frame: &AudioFrame) -> Result<()> {
        if frame.samples() == 0 {
            return Ok(());
        }
        if self.channels.is_empty() {
            let n = (frame.ch_layout().channels() as usize).max(1);
            self.channels = vec![Vec::new(); n];
            self.rate     = frame.rate();
        }

        if frame.format() == OUT_FMT {
            self.append_planar(frame);
            return Ok(());
        }

        if self.converter.is_none() {
            // Mono sources must be declared MONO or swr misreads the count.
            let layout = if self.channels.len() >= 2 { frame.ch_layout() } else { ChannelLayout::MONO };
            let ctx = resampling::Context::get2(
                frame.format(), layout.clone(), frame.rate(),
                OUT_FMT,        layout,         frame.rate(),
            )
            .context("create sample format converter")?;
            self.converter = Some(ctx);
        }

        let mut converted = AudioFrame::empty();
        if let Some(conv) = self.converter.as_mut() {
            conv.run(frame, &mut converted).context("convert samples")?;
        }
        if converted.samples() > 0 {
            self.append_planar(&converted);
        }
        Ok(())
    }

    /// Copy one plane per channel. Planes can carry alignment padding past
    /// `samples()`, so only the valid prefix is read.
    fn append_planar(&mut self, frame: &AudioFrame) {
        let n = frame.samples();
        for (ch, plane) in self.channels.iter_mut().enumerate() {
            let bytes = &frame.data(ch)[..n * 4];
            plane.extend(bytes.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])));
        }
    }
}
