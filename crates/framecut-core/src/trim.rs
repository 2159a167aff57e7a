// crates/framecut-core/src/trim.rs
//
// Trim-range model for audio extraction.
//
// The range is always valid once metadata is known:
//   0 ≤ start < end ≤ duration   and   end − start ≥ min_width
// Every transition clamps its result back into validity before returning, so
// there is no invalid state visible from outside.
//
// Gestures:
//   Start — start' = min(p, end − ε)
//   End   — end'   = max(p, start + ε)
//   Range — start' = clamp(p − offset, 0, duration − width), end' = start' + width
//           `offset` = p0 − start0, captured when the gesture begins; width
//           never changes.
//
// Only one gesture is active at a time. Beginning a new one while another is
// active replaces it (last writer wins); updates with no active gesture are
// ignored.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end:   f64,
}

impl TrimRange {
    pub fn width(&self) -> f64 { self.end - self.start }

    /// Where a preview of the range should begin given the current playhead:
    /// the playhead itself if it's inside `[start, end)`, else `start`.
    pub fn preview_start(&self, current: f64) -> f64 {
        if current < self.start || current >= self.end { self.start } else { current }
    }

    /// True once a preview playing from inside the range reaches its end.
    pub fn preview_should_stop(&self, current: f64) -> bool {
        current >= self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragGesture {
    /// Dragging the start handle.
    Start,
    /// Dragging the end handle.
    End,
    /// Dragging the whole selected range.
    Range,
}

#[derive(Clone, Copy, Debug)]
struct ActiveDrag {
    gesture: DragGesture,
    /// p0 − start0, only meaningful for `DragGesture::Range`.
    offset:  f64,
}

#[derive(Clone, Debug)]
pub struct TrimModel {
    range:     TrimRange,
    duration:  f64,
    min_width: f64,
    active:    Option<ActiveDrag>,
}

impl TrimModel {
    pub fn new(duration: f64, min_width: f64) -> Self {
        let mut m = Self {
            range:     TrimRange { start: 0.0, end: 0.0 },
            duration:  0.0,
            min_width,
            active:    None,
        };
        m.reset(duration);
        m
    }

    /// Reset to the full duration. Called on load and whenever metadata
    /// becomes known. Cancels any active gesture.
    pub fn reset(&mut self, duration: f64) {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.range    = TrimRange { start: 0.0, end: self.duration };
        self.active   = None;
    }

    pub fn range(&self) -> TrimRange { self.range }
    pub fn duration(&self) -> f64 { self.duration }
    pub fn active_gesture(&self) -> Option<DragGesture> { self.active.map(|a| a.gesture) }

    /// Gestures are no-ops until the range can satisfy the minimum width.
    fn is_editable(&self) -> bool {
        self.duration > 0.0 && self.duration >= self.min_width
    }

    /// Begin a drag with the pointer at `pointer` seconds.
    pub fn begin(&mut self, gesture: DragGesture, pointer: f64) {
        if !self.is_editable() {
            return;
        }
        let p = self.clamp_pointer(pointer);
        self.active = Some(ActiveDrag { gesture, offset: p - self.range.start });
    }

    /// Apply the active gesture for a pointer at `pointer` seconds.
    pub fn update(&mut self, pointer: f64) -> TrimRange {
        if let Some(drag) = self.active {
            self.range = self.transition(drag, pointer);
        }
        self.range
    }

    /// Release the active gesture. No state change.
    pub fn end(&mut self) {
        self.active = None;
    }

    /// One-shot transition: begin + update + end.
    pub fn apply(&mut self, gesture: DragGesture, pointer: f64) -> TrimRange {
        self.begin(gesture, pointer);
        let r = self.update(pointer);
        self.end();
        r
    }

    fn clamp_pointer(&self, p: f64) -> f64 {
        if p.is_finite() { p.clamp(0.0, self.duration) } else { self.range.start }
    }

    fn transition(&self, drag: ActiveDrag, pointer: f64) -> TrimRange {
        let p   = self.clamp_pointer(pointer);
        let eps = self.min_width;
        let TrimRange { start, end } = self.range;

        let next = match drag.gesture {
            DragGesture::Start => TrimRange { start: p.min(end - eps).max(0.0), end },
            DragGesture::End   => TrimRange { start, end: p.max(start + eps).min(self.duration) },
            DragGesture::Range => {
                let width = end - start;
                let new_start = (p - drag.offset).clamp(0.0, (self.duration - width).max(0.0));
                TrimRange { start: new_start, end: new_start + width }
            }
        };
        debug_assert!(next.start >= 0.0 && next.end <= self.duration + 1e-9);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 0.1;

    fn assert_valid(m: &TrimModel) {
        let r = m.range();
        assert!(r.start >= 0.0, "{r:?}");
        assert!(r.start < r.end, "{r:?}");
        assert!(r.end <= m.duration() + 1e-9, "{r:?}");
        assert!(r.width() >= EPS - 1e-9, "{r:?}");
    }

    #[test]
    fn starts_at_full_duration() {
        let m = TrimModel::new(12.5, EPS);
        assert_eq!(m.range(), TrimRange { start: 0.0, end: 12.5 });
    }

    #[test]
    fn start_handle_stops_short_of_end() {
        let mut m = TrimModel::new(10.0, EPS);
        let r = m.apply(DragGesture::Start, 4.0);
        assert_eq!(r.start, 4.0);
        let r = m.apply(DragGesture::Start, 11.0);
        assert!((r.start - 9.9).abs() < 1e-9);
        assert_eq!(r.end, 10.0);
        assert_valid(&m);
    }

    #[test]
    fn end_handle_stops_short_of_start() {
        let mut m = TrimModel::new(10.0, EPS);
        m.apply(DragGesture::Start, 3.0);
        let r = m.apply(DragGesture::End, -5.0);
        assert!((r.end - 3.1).abs() < 1e-9);
        assert_eq!(r.start, 3.0);
        assert_valid(&m);
    }

    #[test]
    fn range_drag_preserves_width() {
        let mut m = TrimModel::new(10.0, EPS);
        m.apply(DragGesture::Start, 2.0);
        m.apply(DragGesture::End, 5.0);
        let width = m.range().width();

        m.begin(DragGesture::Range, 3.0); // offset 1.0
        for p in [3.5, 9.9, 10.0, 0.2, -3.0, 6.0] {
            let r = m.update(p);
            assert!((r.width() - width).abs() < 1e-9, "width changed at p={p}: {r:?}");
            assert_valid(&m);
        }
        m.end();
        assert_eq!(m.range().start, 5.0);
    }

    #[test]
    fn range_drag_clamps_to_edges() {
        let mut m = TrimModel::new(10.0, EPS);
        m.apply(DragGesture::Start, 2.0);
        m.apply(DragGesture::End, 4.0);
        m.begin(DragGesture::Range, 3.0);
        assert_eq!(m.update(100.0), TrimRange { start: 8.0, end: 10.0 });
        assert_eq!(m.update(-100.0), TrimRange { start: 0.0, end: 2.0 });
    }

    #[test]
    fn update_without_gesture_is_noop() {
        let mut m = TrimModel::new(10.0, EPS);
        let before = m.range();
        assert_eq!(m.update(5.0), before);
    }

    #[test]
    fn begin_mid_gesture_last_writer_wins() {
        let mut m = TrimModel::new(10.0, EPS);
        m.begin(DragGesture::Start, 1.0);
        m.begin(DragGesture::End, 8.0);
        assert_eq!(m.active_gesture(), Some(DragGesture::End));
        let r = m.update(7.0);
        assert_eq!(r, TrimRange { start: 0.0, end: 7.0 });
    }

    #[test]
    fn unknown_duration_ignores_gestures() {
        let mut m = TrimModel::new(0.0, EPS);
        m.begin(DragGesture::Start, 1.0);
        assert_eq!(m.active_gesture(), None);
        assert_eq!(m.update(1.0), TrimRange { start: 0.0, end: 0.0 });
    }

    #[test]
    fn reset_restores_full_range() {
        let mut m = TrimModel::new(10.0, EPS);
        m.begin(DragGesture::Start, 4.0);
        m.update(4.0);
        m.reset(20.0);
        assert_eq!(m.range(), TrimRange { start: 0.0, end: 20.0 });
        assert_eq!(m.active_gesture(), None);
    }

    #[test]
    fn invariants_hold_under_pseudo_random_drags() {
        // Small LCG so the sequence is reproducible without extra crates.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 11) as f64 / (1u64 << 53) as f64
        };
        for duration in [0.15, 1.0, 7.3, 60.0] {
            let mut m = TrimModel::new(duration, EPS);
            for _ in 0..500 {
                let gesture = match (next() * 3.0) as u32 {
                    0 => DragGesture::Start,
                    1 => DragGesture::End,
                    _ => DragGesture::Range,
                };
                let before = m.range();
                m.begin(gesture, next() * duration * 1.4 - duration * 0.2);
                for _ in 0..4 {
                    m.update(next() * duration * 1.4 - duration * 0.2);
                    assert_valid(&m);
                }
                if gesture == DragGesture::Range {
                    assert!((m.range().width() - before.width()).abs() < 1e-9);
                }
                m.end();
            }
        }
    }

    #[test]
    fn preview_helpers() {
        let r = TrimRange { start: 2.0, end: 5.0 };
        assert_eq!(r.preview_start(1.0), 2.0);
        assert_eq!(r.preview_start(3.0), 3.0);
        assert_eq!(r.preview_start(5.0), 2.0);
        assert!(!r.preview_should_stop(4.99));
        assert!(r.preview_should_stop(5.0));
    }
}
