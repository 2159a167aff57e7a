// crates/framecut-core/tests/storyboard.rs
//
// Batch storyboard pipeline end to end against a scripted handle.

mod common;

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::{Script, ScriptedHandle};
use framecut_core::storyboard::run_storyboard;
use framecut_core::{EngineConfig, FrameCapturer, FrameCutError, ImageFormat};

#[test]
fn two_seconds_yields_twenty_frames_and_full_progress() {
    let (handle, state) = ScriptedHandle::new(2.0, (4, 4), Script::default());
    let cfg = common::test_config();
    let mut cap = FrameCapturer::new(handle, &cfg);
    let cancel = AtomicBool::new(false);

    let mut progress = Vec::new();
    let archive = run_storyboard(&mut cap, 2.0, ImageFormat::Png, &cfg, &cancel, |p| progress.push(p.percent))
        .unwrap();

    assert_eq!(state.lock().unwrap().seeks.len(), 20);
    assert_eq!(state.lock().unwrap().rasterized.len(), 20);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(progress.last(), Some(&100));
    assert!(progress[..progress.len() - 1].iter().all(|p| *p <= 99));

    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    assert_eq!(zip.len(), 21);
    assert!(zip.by_name("storyboard/frame_0000_0-00_0.png").is_ok());
    assert!(zip.by_name("storyboard/frame_0019_0-01_9.png").is_ok());
}

#[test]
fn over_limit_fails_before_any_capture() {
    let (handle, state) = ScriptedHandle::new(61.0, (4, 4), Script::default());
    let cfg = EngineConfig { storyboard_max_duration: 60.0, ..common::test_config() };
    let mut cap = FrameCapturer::new(handle, &cfg);
    let cancel = AtomicBool::new(false);

    let mut calls = 0;
    let err = run_storyboard(&mut cap, 61.0, ImageFormat::Jpeg, &cfg, &cancel, |_| calls += 1).unwrap_err();
    assert!(matches!(err, FrameCutError::CapacityExceeded(_)));
    assert_eq!(calls, 0);
    assert!(state.lock().unwrap().seeks.is_empty());
}

#[test]
fn mid_run_failure_discards_everything() {
    let script = Script { fail_seq: Some(6), ..Script::default() };
    let (handle, state) = ScriptedHandle::new(2.0, (4, 4), script);
    let cfg = common::test_config();
    let mut cap = FrameCapturer::new(handle, &cfg);
    let cancel = AtomicBool::new(false);

    let mut last = 0;
    let err = run_storyboard(&mut cap, 2.0, ImageFormat::Png, &cfg, &cancel, |p| last = p.percent)
        .unwrap_err();
    assert!(matches!(err, FrameCutError::PipelineAborted(_)));
    assert!(!err.is_cancelled());
    assert!(last < 100);
    assert_eq!(state.lock().unwrap().seeks.len(), 6);
}

#[test]
fn cancel_between_frames() {
    let script = Script { delay: Duration::from_millis(2), ..Script::default() };
    let (handle, state) = ScriptedHandle::new(2.0, (4, 4), script);
    let cfg = common::test_config();
    let mut cap = FrameCapturer::new(handle, &cfg);
    let cancel = AtomicBool::new(false);

    let err = run_storyboard(&mut cap, 2.0, ImageFormat::Png, &cfg, &cancel, |p| {
        if p.frames_done == 3 {
            cancel.store(true, Ordering::Relaxed);
        }
    })
    .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(state.lock().unwrap().seeks.len(), 3);
}

#[test]
fn jpeg_entries_use_jpg_extension() {
    let (handle, _state) = ScriptedHandle::new(0.3, (8, 8), Script::default());
    let cfg = common::test_config();
    let mut cap = FrameCapturer::new(handle, &cfg);
    let cancel = AtomicBool::new(false);

    let archive = run_storyboard(&mut cap, 0.3, ImageFormat::Jpeg, &cfg, &cancel, |_| {}).unwrap();
    let zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut names: Vec<&str> = zip.file_names().collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "storyboard/",
            "storyboard/frame_0000_0-00_0.jpg",
            "storyboard/frame_0001_0-00_1.jpg",
            "storyboard/frame_0002_0-00_2.jpg",
        ]
    );
}
