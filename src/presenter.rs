//! Playback presentation: one visible verse, fitted to its container.
//!
//! The presenter never touches a real page. It talks to a
//! [`VerseSurface`] port so the resolution and fitting logic stays
//! unit-testable; the host wires the port to whatever display it has.

use crate::resolve::verse_index_at;

/// Display port: a surface that can show exactly one verse at a time
/// and report whether the current verse overflows its container.
pub trait VerseSurface {
    fn verse_count(&self) -> usize;
    fn show_only(&mut self, index: usize);
    fn set_font_size(&mut self, px: f32);
    fn overflows(&self) -> bool;
    fn set_scrollable(&mut self, scrollable: bool);
    fn set_status(&mut self, text: &str);
}

/// Bounds for the text-fitting loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub base_px: f32,
    pub min_px: f32,
    pub step_px: f32,
    pub max_iterations: u32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            base_px: 34.0,
            min_px: 14.0,
            step_px: 2.0,
            max_iterations: 12,
        }
    }
}

/// Reacts to playback position and capture progress; switches the
/// visible verse only when the resolved index actually changes.
#[derive(Debug)]
pub struct Presenter {
    times: Vec<f64>,
    fit: FitOptions,
    shown: Option<usize>,
}

impl Presenter {
    pub fn new(times: Vec<f64>, fit: FitOptions) -> Self {
        Self {
            times,
            fit,
            shown: None,
        }
    }

    /// Swap in a fresh highlight-times array (after a save or a store
    /// reload). The next tick re-resolves against the new data.
    pub fn set_times(&mut self, times: Vec<f64>) {
        self.times = times;
        self.shown = None;
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn shown(&self) -> Option<usize> {
        self.shown
    }

    /// Playback tick: resolve the verse for `t` and, if it changed,
    /// show it and fit its text. Returns the now-visible index.
    pub fn sync_playback<S: VerseSurface>(&mut self, t: f64, surface: &mut S) -> usize {
        let index = verse_index_at(&self.times, t);
        self.show(index, surface);
        index
    }

    /// Capture tick: while timing mode is active the operator sees the
    /// verse they are about to mark, `min(captured, total - 1)`.
    pub fn sync_capture<S: VerseSurface>(&mut self, captured: usize, surface: &mut S) -> usize {
        let total = surface.verse_count().max(1);
        let index = captured.min(total - 1);
        self.show(index, surface);
        index
    }

    fn show<S: VerseSurface>(&mut self, index: usize, surface: &mut S) {
        if self.shown == Some(index) {
            return;
        }
        surface.show_only(index);
        self.fit_text(surface);
        self.shown = Some(index);
    }

    /// Shrink the font until the verse fits, bounded by a minimum size
    /// and an iteration cap so the loop always terminates. If the text
    /// still overflows at the floor, the container becomes scrollable
    /// instead of shrinking further.
    fn fit_text<S: VerseSurface>(&self, surface: &mut S) {
        let mut px = self.fit.base_px;
        surface.set_font_size(px);
        surface.set_scrollable(false);

        let mut iterations = 0;
        while surface.overflows() && px > self.fit.min_px && iterations < self.fit.max_iterations {
            px = (px - self.fit.step_px).max(self.fit.min_px);
            surface.set_font_size(px);
            iterations += 1;
        }

        if surface.overflows() {
            surface.set_scrollable(true);
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// Test surface: overflow is a function of font size against a
    /// configurable "fits below" threshold per verse.
    pub struct MockSurface {
        pub verse_count: usize,
        pub visible: Option<usize>,
        pub font_px: f32,
        pub scrollable: bool,
        pub status: Vec<String>,
        pub show_calls: usize,
        /// Verse fits only when font size <= this value.
        pub fits_below_px: f32,
    }

    impl MockSurface {
        pub fn new(verse_count: usize) -> Self {
            Self {
                verse_count,
                visible: None,
                font_px: 0.0,
                scrollable: false,
                status: Vec::new(),
                show_calls: 0,
                fits_below_px: f32::MAX,
            }
        }
    }

    impl VerseSurface for MockSurface {
        fn verse_count(&self) -> usize {
            self.verse_count
        }

        fn show_only(&mut self, index: usize) {
            self.visible = Some(index);
            self.show_calls += 1;
        }

        fn set_font_size(&mut self, px: f32) {
            self.font_px = px;
        }

        fn overflows(&self) -> bool {
            self.font_px > self.fits_below_px
        }

        fn set_scrollable(&mut self, scrollable: bool) {
            self.scrollable = scrollable;
        }

        fn set_status(&mut self, text: &str) {
            self.status.push(text.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockSurface;
    use super::*;

    fn presenter() -> Presenter {
        Presenter::new(vec![0.0, 12.5, 30.0], FitOptions::default())
    }

    #[test]
    fn playback_shows_resolved_verse() {
        let mut p = presenter();
        let mut surface = MockSurface::new(3);
        assert_eq!(p.sync_playback(15.0, &mut surface), 1);
        assert_eq!(surface.visible, Some(1));
    }

    #[test]
    fn unchanged_index_does_not_rerender() {
        let mut p = presenter();
        let mut surface = MockSurface::new(3);
        p.sync_playback(1.0, &mut surface);
        p.sync_playback(2.0, &mut surface);
        p.sync_playback(3.0, &mut surface);
        assert_eq!(surface.show_calls, 1);

        p.sync_playback(13.0, &mut surface);
        assert_eq!(surface.show_calls, 2);
    }

    #[test]
    fn capture_mode_shows_next_verse_clamped() {
        let mut p = presenter();
        let mut surface = MockSurface::new(3);
        assert_eq!(p.sync_capture(0, &mut surface), 0);
        assert_eq!(p.sync_capture(2, &mut surface), 2);
        assert_eq!(p.sync_capture(3, &mut surface), 2);
        assert_eq!(surface.visible, Some(2));
    }

    #[test]
    fn fit_shrinks_until_text_fits() {
        let mut p = presenter();
        let mut surface = MockSurface::new(3);
        surface.fits_below_px = 25.0;
        p.sync_playback(0.0, &mut surface);
        assert!(surface.font_px <= 25.0);
        assert!(surface.font_px >= FitOptions::default().min_px);
        assert!(!surface.scrollable);
    }

    #[test]
    fn fit_falls_back_to_scrolling_at_the_floor() {
        let mut p = presenter();
        let mut surface = MockSurface::new(3);
        surface.fits_below_px = 1.0; // never fits
        p.sync_playback(0.0, &mut surface);
        assert_eq!(surface.font_px, FitOptions::default().min_px);
        assert!(surface.scrollable);
    }

    #[test]
    fn iteration_cap_bounds_the_loop() {
        let fit = FitOptions {
            base_px: 100.0,
            min_px: 1.0,
            step_px: 1.0,
            max_iterations: 5,
        };
        let mut p = Presenter::new(vec![0.0], fit);
        let mut surface = MockSurface::new(1);
        surface.fits_below_px = 0.0;
        p.sync_playback(0.0, &mut surface);
        // 5 shrink steps from 100, then scrollable fallback.
        assert_eq!(surface.font_px, 95.0);
        assert!(surface.scrollable);
    }

    #[test]
    fn set_times_forces_rerender() {
        let mut p = presenter();
        let mut surface = MockSurface::new(3);
        p.sync_playback(15.0, &mut surface);
        assert_eq!(surface.show_calls, 1);

        p.set_times(vec![0.0, 20.0, 30.0]);
        p.sync_playback(15.0, &mut surface);
        assert_eq!(surface.visible, Some(0));
        assert_eq!(surface.show_calls, 2);
    }
}
