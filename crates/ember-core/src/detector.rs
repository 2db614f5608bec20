//! Bass hit detection over analyser magnitude frames.
//!
//! The detector reads byte magnitudes from a [`SpectrumSource`], averages the
//! lowest bins, gates and shapes that energy into a peak in \[0, 1\], and
//! follows the peak with an asymmetric envelope used for the album-art glow.
//! The raw peak goes to a single registered beat listener.

use crate::error::EmberError;
use crate::params::DetectorParams;

/// Anything that can hand out the latest frequency magnitudes.
///
/// Reads must not block; a source returns whatever snapshot it currently has.
pub trait SpectrumSource {
    fn bin_count(&self) -> usize;
    fn read_bytes(&mut self, out: &mut [u8]);
}

/// One magnitude per frequency bin, overwritten in place on every sample.
pub type SpectrumFrame = Vec<u8>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// A detected hit: shaped peak in \[0, 1\] and the band energy it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Beat {
    pub peak: f32,
    pub energy: f32,
}

/// Fast-attack / slow-release follower.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    level: f32,
}

impl Envelope {
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Move toward `target`; the result always lies between the previous
    /// level and `target`.
    pub fn step(&mut self, target: f32, attack: f32, release: f32) -> f32 {
        let c = if target > self.level { attack } else { release };
        self.level = self.level * (1.0 - c) + target * c;
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

/// Mean magnitude over the first `bins` bins (fewer if the frame is shorter).
pub fn bass_energy(frame: &[u8], bins: usize) -> f32 {
    let band = &frame[..bins.min(frame.len())];
    if band.is_empty() {
        return 0.0;
    }
    let sum: u32 = band.iter().map(|&v| v as u32).sum();
    sum as f32 / band.len() as f32
}

/// Gate `energy` at `threshold` and map the remainder through a power curve.
pub fn peak_intensity(energy: f32, threshold: f32, exponent: f32) -> f32 {
    if energy.is_nan() || energy <= threshold {
        return 0.0;
    }
    let span = (crate::constants::SPECTRUM_MAX - threshold).max(f32::EPSILON);
    ((energy - threshold) / span).clamp(0.0, 1.0).powf(exponent)
}

type BeatListener = Box<dyn FnMut(Beat)>;

pub struct Detector<S> {
    params: DetectorParams,
    source: Option<S>,
    frame: SpectrumFrame,
    envelope: Envelope,
    state: PlaybackState,
    listener: Option<BeatListener>,
}

impl<S: SpectrumSource> Detector<S> {
    pub fn new(params: DetectorParams) -> Self {
        Self {
            params,
            source: None,
            frame: Vec::new(),
            envelope: Envelope::default(),
            state: PlaybackState::Stopped,
            listener: None,
        }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Register the beat listener, replacing any previous one.
    pub fn on_beat(&mut self, listener: impl FnMut(Beat) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Refresh the frame from the source. Without a source the previous
    /// (initially empty) frame comes back unchanged.
    pub fn sample(&mut self) -> &SpectrumFrame {
        if let Some(src) = self.source.as_mut() {
            let bins = src.bin_count();
            if self.frame.len() != bins {
                self.frame.resize(bins, 0);
            }
            src.read_bytes(&mut self.frame);
        }
        &self.frame
    }

    pub fn bass_energy(&self, frame: &[u8]) -> f32 {
        bass_energy(frame, self.params.bass_bins)
    }

    pub fn peak_intensity(&self, energy: f32) -> f32 {
        peak_intensity(energy, self.params.threshold, self.params.exponent)
    }

    /// One analysis step. Does nothing unless playing. Returns the beat
    /// handed to the listener, if there was a hit this frame.
    pub fn tick(&mut self) -> Option<Beat> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        self.sample();
        let energy = self.bass_energy(&self.frame);
        let peak = self.peak_intensity(energy);
        self.envelope
            .step(peak, self.params.attack, self.params.release);
        if peak <= 0.0 {
            return None;
        }
        let beat = Beat { peak, energy };
        if let Some(listener) = self.listener.as_mut() {
            listener(beat);
        }
        Some(beat)
    }

    /// Smoothed bass for display: floored while a track is loaded, 0 when stopped.
    pub fn current_bass(&self) -> f32 {
        match self.state {
            PlaybackState::Stopped => 0.0,
            _ => self.envelope.level().max(self.params.floor),
        }
    }

    /// Play/pause. Connects the source first if needed; a failed connect is
    /// returned as-is and leaves the state untouched so the next toggle can
    /// try again.
    pub fn toggle<F>(&mut self, connect: F) -> Result<PlaybackState, EmberError>
    where
        F: FnOnce(&DetectorParams) -> Result<S, EmberError>,
    {
        if self.source.is_none() {
            let src = connect(&self.params).map_err(|e| {
                log::warn!("[detector] audio connect failed: {}", e);
                e
            })?;
            self.frame.clear();
            self.frame.resize(src.bin_count(), 0);
            self.source = Some(src);
            log::info!("[detector] connected, bins={}", self.frame.len());
        }
        self.state = match self.state {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Stopped | PlaybackState::Paused => PlaybackState::Playing,
        };
        log::info!("[detector] playback {:?}", self.state);
        Ok(self.state)
    }

    /// Track ended or was stopped: no more ticks and the envelope drops to 0.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.envelope.reset();
        log::info!("[detector] playback stopped");
    }
}
