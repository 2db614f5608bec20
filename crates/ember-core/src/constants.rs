// Shared tuning constants for the detector and the spark field.

// Analyser byte magnitudes top out at 255
pub const SPECTRUM_MAX: f32 = 255.0;

// Analyser setup
pub const ANALYSER_FFT_SIZE: u32 = 512;
pub const ANALYSER_SMOOTHING: f64 = 0.4;

// Bass band and hit shaping
pub const BASS_BINS: usize = 32; // lowest bins only; keeps kick transients apart from low-mid pads
pub const BASS_THRESHOLD: f32 = 190.0;
pub const PEAK_EXPONENT: f32 = 0.4; // < 1 sharpens response just above threshold

// Envelope smoothing: state = state*(1-c) + target*c
pub const ENVELOPE_ATTACK: f32 = 0.98;
pub const ENVELOPE_RELEASE: f32 = 0.5;
pub const ENVELOPE_FLOOR: f32 = 0.1;

// Pool
pub const POOL_SIZE: usize = 3500;
pub const BACK_LAYER_RATIO: f32 = 0.6;

// Emission
pub const SPAWN_RATE_PER_FRAME: f32 = 0.35;
pub const BASE_SPEED: f32 = 0.04;

// Visible band in world units
pub const LEFT_BOUND: f32 = -15.0;
pub const SEED_X_SPAN: (f32, f32) = (-15.0, 15.0);
pub const EMIT_X_SPAN: (f32, f32) = (15.0, 20.0);
pub const SEED_Y_HALF: f32 = 5.0;
pub const EMIT_Y_HALF: f32 = 6.0;
pub const DEPTH_HALF: f32 = 2.5;

// Global wind
pub const WIND_STRENGTH: f32 = 0.003;
pub const WIND_CHANGE_SPEED: f32 = 0.0005;
pub const WIND_VARIABILITY: f32 = 0.002;
pub const GUST_FREQ_A: f32 = 0.0003;
pub const GUST_FREQ_B: f32 = 0.0007;
pub const GUST_ACTIVATION: f32 = 0.7;
pub const TURBULENCE_FACTOR: f32 = 0.001;
pub const DRIFT_FREQ: f32 = 0.01;
pub const DRIFT_AMPLITUDE: f32 = 0.001;

// Pops
pub const POP_THRESHOLD: f32 = 0.997;
pub const POP_CHANCE_MIN: f32 = 0.85;
pub const POP_BRIGHTNESS: f32 = 1.5;
pub const POP_BRIGHTNESS_DECAY: f32 = 0.97;

// Colour and size over life
pub const COLOR_PHASE_STEP: f32 = 0.01;
pub const AGE_DIMMING: f32 = 0.15;
pub const AGE_SHRINK: f32 = 0.15;
pub const WHITE_HOT_SIZE_BONUS: f32 = 0.04;
pub const EMBER_FLICKER_CHANCE: f32 = 0.02;

// Beat response (speed boost and camera shake)
pub const BEAT_SPEED_BOOST: f32 = 6.0;
pub const BEAT_SPEED_DECAY: f32 = 0.95;
pub const BEAT_SHAKE: f32 = 0.08;
pub const BEAT_SHAKE_DECAY: f32 = 0.85;

// Cosmetic sprite pulse from the glow envelope
pub const INTENSITY_SIZE_PULSE: f32 = 0.15;

// Camera
pub const CAMERA_Z: f32 = 5.0;
pub const CAMERA_FOVY_DEG: f32 = 75.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 1000.0;
