//! Instrument screens.
//!
//! Each hex face carries one screen backed by a private canvas. A repaint
//! draws the whole screen from the current reading and its history, then
//! re-uploads the pixels into the same GPU texture.
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │  ╭───╮   ~~~~~~/\~~~~~/\~~~~~~~~~~~~   │
//! │ │gauge│   waveform (history)           │
//! │  ╰───╯                                 │
//! │ ████████████░░░░░░░░  value bar        │
//! └────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::f32::consts::PI;

use cablesight_procedural::{Canvas, PixelFormat, Rgba8};
use cablesight_shared::{FaultMode, TelemetrySample, SENSOR_FACES};

use crate::backend::{GpuHandle, RenderBackend};
use crate::error::EngineResult;
use crate::scene::SharedTexture;

/// Samples kept for the waveform.
pub const HISTORY_LEN: usize = 64;

/// Gauge sweep: from 135° clockwise through 270°.
const GAUGE_START: f32 = 0.75 * PI;
const GAUGE_SWEEP: f32 = 1.5 * PI;

const PANEL: Rgba8 = Rgba8::new(8, 14, 20, 255);
const TRACK: Rgba8 = Rgba8::new(40, 52, 60, 255);

/// What a screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenChannel {
    /// Joint temperature.
    Temperature,
    /// Partial discharge.
    PartialDischarge,
    /// Vibration.
    Vibration,
    /// Phase voltage.
    Voltage,
    /// Load current.
    Current,
    /// Dielectric loss.
    DielectricLoss,
}

impl ScreenChannel {
    /// Channel per face, face 0 first.
    pub const ALL: [Self; SENSOR_FACES] = [
        Self::Temperature,
        Self::PartialDischarge,
        Self::Vibration,
        Self::Voltage,
        Self::Current,
        Self::DielectricLoss,
    ];

    /// Texture label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "screen-temperature",
            Self::PartialDischarge => "screen-partial-discharge",
            Self::Vibration => "screen-vibration",
            Self::Voltage => "screen-voltage",
            Self::Current => "screen-current",
            Self::DielectricLoss => "screen-dielectric-loss",
        }
    }

    /// Reading for this channel.
    #[must_use]
    pub const fn value(self, sample: &TelemetrySample) -> f32 {
        match self {
            Self::Temperature => sample.temperature,
            Self::PartialDischarge => sample.partial_discharge,
            Self::Vibration => sample.vibration,
            Self::Voltage => sample.voltage,
            Self::Current => sample.current,
            Self::DielectricLoss => sample.dielectric_loss,
        }
    }

    /// Full-scale range of the gauge.
    #[must_use]
    pub const fn range(self) -> (f32, f32) {
        match self {
            Self::Temperature => (0.0, 120.0),
            Self::PartialDischarge => (0.0, 300.0),
            Self::Vibration => (0.0, 0.6),
            Self::Voltage => (105.0, 115.0),
            Self::Current => (0.0, 700.0),
            Self::DielectricLoss => (0.0, 0.012),
        }
    }

    /// `value` mapped into [0, 1] of the gauge range.
    #[must_use]
    pub fn normalize(self, value: f32) -> f32 {
        let (lo, hi) = self.range();
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}

/// One screen's canvas, history and GPU texture.
#[derive(Debug)]
pub struct InstrumentScreen {
    channel: ScreenChannel,
    canvas: Canvas,
    history: VecDeque<f32>,
    texture: Option<GpuHandle>,
    repaints: u64,
}

impl InstrumentScreen {
    /// Channel shown.
    #[must_use]
    pub const fn channel(&self) -> ScreenChannel {
        self.channel
    }

    /// Normalized history, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<f32> {
        &self.history
    }

    /// Times this screen has been painted.
    #[must_use]
    pub const fn repaints(&self) -> u64 {
        self.repaints
    }

    /// Current pixels.
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn paint(&mut self, mode: FaultMode, sample: &TelemetrySample, lit: bool) {
        let (w, h) = (self.canvas.width() as f32, self.canvas.height() as f32);
        let accent = Rgba8::from_f32(mode.accent_color(), 1.0);
        let dim = accent.lerp(PANEL, 0.6);
        let level = self.channel.normalize(self.channel.value(sample));

        self.canvas.fill(PANEL);

        // Frame
        let edge = if lit { accent } else { dim };
        self.canvas.stroke_polyline(
            &[(1.0, 1.0), (w - 2.0, 1.0), (w - 2.0, h - 2.0), (1.0, h - 2.0), (1.0, 1.0)],
            2.0,
            edge,
        );

        // Gauge
        let center = (h * 0.5, h * 0.45);
        let radius = h * 0.3;
        self.canvas.stroke_arc(center, radius, GAUGE_START, GAUGE_START + GAUGE_SWEEP, 5.0, TRACK);
        if level > 0.0 {
            self.canvas
                .stroke_arc(center, radius, GAUGE_START, GAUGE_START + GAUGE_SWEEP * level, 5.0, accent);
        }
        let needle = GAUGE_START + GAUGE_SWEEP * level;
        self.canvas.stroke_line(
            center,
            (center.0 + radius * 0.8 * needle.cos(), center.1 + radius * 0.8 * needle.sin()),
            2.0,
            Rgba8::WHITE,
        );
        self.canvas.fill_circle(center, 3.0, Rgba8::WHITE);

        // Waveform
        let (left, right) = (h + 4.0, w - 8.0);
        let (top, bottom) = (10.0, h * 0.72);
        self.canvas.stroke_line((left, bottom), (right, bottom), 1.0, TRACK);
        if self.history.len() >= 2 {
            let step = (right - left) / (HISTORY_LEN - 1) as f32;
            let offset = (HISTORY_LEN - self.history.len()) as f32 * step;
            let points: Vec<(f32, f32)> = self
                .history
                .iter()
                .enumerate()
                .map(|(i, v)| (left + offset + i as f32 * step, bottom - v * (bottom - top)))
                .collect();
            self.canvas.stroke_polyline(&points, 1.5, accent);
        }

        // Value bar
        let bar_y = h * 0.82;
        let bar_h = h * 0.08;
        self.canvas.fill_rect(8.0, bar_y, w - 16.0, bar_h, TRACK);
        self.canvas.fill_rect(8.0, bar_y, (w - 16.0) * level, bar_h, accent);

        self.repaints += 1;
    }
}

/// The six screens of the sensor housing.
#[derive(Debug, Default)]
pub struct ScreenBank {
    screens: Vec<InstrumentScreen>,
}

impl ScreenBank {
    /// Acquires one canvas per face. Screens whose surface cannot be
    /// acquired are left out (that face stays blank).
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let screens = ScreenChannel::ALL
            .into_iter()
            .filter_map(|channel| {
                Canvas::acquire(width, height).map(|canvas| InstrumentScreen {
                    channel,
                    canvas,
                    history: VecDeque::with_capacity(HISTORY_LEN),
                    texture: None,
                    repaints: 0,
                })
            })
            .collect();
        Self { screens }
    }

    /// Screens present.
    #[must_use]
    pub fn screens(&self) -> &[InstrumentScreen] {
        &self.screens
    }

    /// Number of screens present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    /// Returns true if no screen could be acquired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Paints every screen once and uploads it. Returns one texture per
    /// face (`None` where the face has no screen). The caller hands each
    /// to a material and then releases its own reference.
    ///
    /// # Errors
    ///
    /// Terminal backend error; textures uploaded so far are released.
    pub fn upload<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mode: FaultMode,
        sample: &TelemetrySample,
    ) -> EngineResult<[Option<SharedTexture>; SENSOR_FACES]> {
        let mut faces: [Option<SharedTexture>; SENSOR_FACES] = Default::default();
        for screen in &mut self.screens {
            screen.paint(mode, sample, true);
            let texture = screen.canvas.clone().into_texture(screen.channel.label(), PixelFormat::Color);
            match SharedTexture::upload(backend, &texture) {
                Ok(shared) => {
                    screen.texture = Some(shared.handle());
                    faces[face_of(screen.channel)] = Some(shared);
                }
                Err(err) => {
                    for shared in faces.iter_mut().filter_map(Option::take) {
                        shared.release(backend);
                    }
                    self.forget_textures();
                    return Err(err);
                }
            }
        }
        Ok(faces)
    }

    /// Pushes the current reading of every channel into its history.
    pub fn record(&mut self, sample: &TelemetrySample) {
        for screen in &mut self.screens {
            if screen.history.len() == HISTORY_LEN {
                screen.history.pop_front();
            }
            screen.history.push_back(screen.channel.normalize(screen.channel.value(sample)));
        }
    }

    /// Repaints every screen and re-uploads its pixels. Returns screens updated.
    ///
    /// # Errors
    ///
    /// Terminal backend error.
    pub fn redraw<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mode: FaultMode,
        sample: &TelemetrySample,
        lit: bool,
    ) -> EngineResult<u32> {
        let mut updated = 0;
        for screen in &mut self.screens {
            let Some(handle) = screen.texture else {
                continue;
            };
            screen.paint(mode, sample, lit);
            let texture = screen.canvas.clone().into_texture(screen.channel.label(), PixelFormat::Color);
            backend.upload_texture(handle, &texture)?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Drops GPU handles; the textures themselves belong to the screen materials.
    pub fn forget_textures(&mut self) {
        for screen in &mut self.screens {
            screen.texture = None;
        }
    }
}

fn face_of(channel: ScreenChannel) -> usize {
    ScreenChannel::ALL.iter().position(|&c| c == channel).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn test_history_is_bounded() {
        let mut bank = ScreenBank::new(64, 32);
        let sample = TelemetrySample::default();
        for _ in 0..(HISTORY_LEN + 10) {
            bank.record(&sample);
        }
        assert!(bank.screens().iter().all(|s| s.history().len() == HISTORY_LEN));
    }

    #[test]
    fn test_unacquirable_screens_are_skipped() {
        let bank = ScreenBank::new(0, 32);
        assert!(bank.is_empty());
    }

    #[test]
    fn test_upload_then_redraw_reuses_textures() {
        let mut backend = HeadlessBackend::new();
        let mut bank = ScreenBank::new(64, 32);
        let sample = TelemetrySample {
            temperature: 60.0,
            ..TelemetrySample::default()
        };
        let faces = bank.upload(&mut backend, FaultMode::JointOverheat, &sample).unwrap();
        assert_eq!(backend.live_counts().textures, 6);

        bank.record(&sample);
        bank.record(&sample);
        assert_eq!(bank.redraw(&mut backend, FaultMode::JointOverheat, &sample, false).unwrap(), 6);
        assert_eq!(backend.texture_uploads(), 6);
        assert_eq!(backend.live_counts().textures, 6);

        for face in faces.into_iter().flatten() {
            face.release(&mut backend);
        }
        assert_eq!(backend.live_counts().textures, 0);
    }

    #[test]
    fn test_paint_reflects_level() {
        let mut bank = ScreenBank::new(128, 64);
        let mut backend = HeadlessBackend::new();
        let low = TelemetrySample::default();
        let high = TelemetrySample {
            temperature: 120.0,
            ..TelemetrySample::default()
        };
        let faces = bank.upload(&mut backend, FaultMode::Baseline, &low).unwrap();
        let before = bank.screens()[0].canvas().pixels().to_vec();
        bank.redraw(&mut backend, FaultMode::Baseline, &high, true).unwrap();
        assert_ne!(before, bank.screens()[0].canvas().pixels());
        for face in faces.into_iter().flatten() {
            face.release(&mut backend);
        }
    }
}
