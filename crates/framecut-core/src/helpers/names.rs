// crates/framecut-core/src/helpers/names.rs
//
// Deterministic names for everything the engine hands back as a download.

use super::time::time_suffix;
use crate::media_types::ImageFormat;

/// Folder every storyboard entry is written under inside the archive.
pub const STORYBOARD_FOLDER: &str = "storyboard";

/// `frame_0007_0-00_7.png` — zero-padded index plus the capture time.
pub fn storyboard_entry_name(index: usize, timestamp: f64, format: ImageFormat) -> String {
    format!("frame_{index:04}_{}.{}", time_suffix(timestamp), format.extension())
}

/// `clip_storyboard.zip`
pub fn storyboard_archive_name(stem: &str) -> String {
    format!("{stem}_storyboard.zip")
}

/// `clip.wav` for the full track, `clip_cut_1.0-4.5.wav` for a trimmed one.
pub fn audio_file_name(stem: &str, trim: Option<(f64, f64)>) -> String {
    match trim {
        Some((start, end)) => format!("{stem}_cut_{start:.1}-{end:.1}.wav"),
        None               => format!("{stem}.wav"),
    }
}

/// `screenshot-12.jpg` — whole seconds of the capture time.
pub fn screenshot_file_name(timestamp: f64, format: ImageFormat) -> String {
    format!("screenshot-{}.{}", timestamp.max(0.0).floor() as u64, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_sort_by_index() {
        assert_eq!(storyboard_entry_name(0, 0.0, ImageFormat::Png), "frame_0000_0-00_0.png");
        assert_eq!(storyboard_entry_name(123, 12.3, ImageFormat::Jpeg), "frame_0123_0-12_3.jpg");
    }

    #[test]
    fn audio_names() {
        assert_eq!(audio_file_name("talk", None), "talk.wav");
        assert_eq!(audio_file_name("talk", Some((1.0, 4.5))), "talk_cut_1.0-4.5.wav");
    }

    #[test]
    fn screenshot_floors_seconds() {
        assert_eq!(screenshot_file_name(12.9, ImageFormat::Jpeg), "screenshot-12.jpg");
        assert_eq!(storyboard_archive_name("a"), "a_storyboard.zip");
    }
}
