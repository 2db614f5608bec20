use crate::constants::*;

/// Detector tuning. Defaults follow the constants in [`crate::constants`].
#[derive(Clone, Debug)]
pub struct DetectorParams {
    pub fft_size: u32,
    pub smoothing: f64,
    pub bass_bins: usize,
    pub threshold: f32,
    pub exponent: f32,
    pub attack: f32,
    pub release: f32,
    pub floor: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            fft_size: ANALYSER_FFT_SIZE,
            smoothing: ANALYSER_SMOOTHING,
            bass_bins: BASS_BINS,
            threshold: BASS_THRESHOLD,
            exponent: PEAK_EXPONENT,
            attack: ENVELOPE_ATTACK,
            release: ENVELOPE_RELEASE,
            floor: ENVELOPE_FLOOR,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldParams {
    pub pool_size: usize,
    pub back_layer_ratio: f32,
    pub spawn_rate: f32,
    pub base_speed: f32,
    pub left_bound: f32,
    /// Also retire particles once `age >= max_age`, not only on left-bound exit.
    pub expire_on_age: bool,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            pool_size: POOL_SIZE,
            back_layer_ratio: BACK_LAYER_RATIO,
            spawn_rate: SPAWN_RATE_PER_FRAME,
            base_speed: BASE_SPEED,
            left_bound: LEFT_BOUND,
            expire_on_age: false,
        }
    }
}
