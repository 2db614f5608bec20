//! Fixed-size spark pool drifting right to left in two depth layers.
//!
//! Particles are created once, seeded across the whole view, and recycled by
//! [`ParticleField::spawn`] after they leave through the left bound. Motion is
//! a deterministic function of the frame counter and per-particle phases drawn
//! at spawn time; audio only reaches motion through [`ParticleField::apply_beat`].

use crate::constants::*;
use crate::params::FieldParams;
use crate::state::{Camera, FrameUniforms, Layer, PointSpriteSink, PointVertex};
use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SparkKind {
    WhiteHot,
    BlueWhite,
    YellowOrange,
    RedEmber,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub(crate) layer: Layer,
    /// Index into the owning layer's vertex buffer.
    pub(crate) slot: usize,

    pub position: Vec3,
    pub velocity: Vec3,
    pub drift_factor: f32,
    pub drift_phase: f32,
    pub turbulence_phase: f32,
    pub turbulence_frequency: f32,
    pub has_swirl: bool,
    pub swirl_frequency: f32,
    pub swirl_amplitude: f32,
    pub swirl_phase: f32,

    pub pop_chance: f32,
    pub has_popped_yet: bool,

    pub age: u32,
    pub max_age: u32,
    pub active: bool,

    pub kind: SparkKind,
    pub is_white_hot: bool,
    pub color: Vec3,
    pub color_intensity: f32,
    pub color_phase: f32,
    pub brightness: f32,
    pub size: f32,
    pub rotation: f32,
}

#[inline]
fn span<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.gen::<f32>() * (hi - lo)
}

fn kind_color<R: Rng>(kind: SparkKind, rng: &mut R) -> Vec3 {
    match kind {
        SparkKind::WhiteHot => Vec3::splat(2.0),
        SparkKind::BlueWhite => Vec3::new(1.5, 1.5, 1.8),
        SparkKind::YellowOrange => Vec3::new(1.8, span(rng, 1.0, 1.5), span(rng, 0.3, 0.7)),
        SparkKind::RedEmber => Vec3::new(
            span(rng, 1.5, 1.8),
            span(rng, 0.5, 1.0),
            span(rng, 0.1, 0.3),
        ),
    }
}

/// White-hot sparks cool through yellow, orange and red over their life.
pub fn white_hot_color(life: f32) -> Vec3 {
    if life < 0.2 {
        Vec3::splat(2.0)
    } else if life < 0.4 {
        Vec3::new(1.8, 1.8 - (life - 0.2) * 1.5, 1.5 - (life - 0.2) * 5.0)
    } else if life < 0.7 {
        Vec3::new(1.5, 1.0 - (life - 0.4), 0.2)
    } else {
        Vec3::new(1.3 - (life - 0.7) * 1.5, 0.5 - (life - 0.7) * 0.8, 0.1)
    }
}

/// Colour wheel for ordinary embers, driven by their own phase.
pub fn ember_color(phase: f32, intensity: f32) -> Vec3 {
    let t = (phase.sin() + 1.0) * 0.5;
    if t < 0.3 {
        Vec3::new(0.7 + intensity * 0.3, 0.2, 0.1)
    } else if t < 0.7 {
        Vec3::new(1.3 + intensity * 0.1, 0.6 + intensity * 0.4, 0.1)
    } else {
        Vec3::new(1.5, 0.8 + intensity * 0.4, 0.3 + intensity * 0.5)
    }
}

/// Oscillator argument for `frame`. Kept in f64 so consecutive frames stay
/// distinct in long sessions.
#[inline]
fn phase(frame: f64, freq: f32, offset: f32) -> f64 {
    frame * freq as f64 + offset as f64
}

/// Slow sinusoidal wind plus an occasional gust.
pub fn global_wind(frame: f64) -> f32 {
    let base = phase(frame, WIND_CHANGE_SPEED, 0.0).sin() as f32 * WIND_STRENGTH;
    let gust =
        (phase(frame, GUST_FREQ_A, 0.0).sin() * phase(frame, GUST_FREQ_B, 0.0).sin()) as f32;
    if gust > GUST_ACTIVATION {
        base + gust * WIND_VARIABILITY
    } else {
        base
    }
}

impl Particle {
    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Fresh particle placed anywhere in the visible band.
    fn seeded<R: Rng>(layer: Layer, slot: usize, rng: &mut R) -> Self {
        let position = Vec3::new(
            span(rng, SEED_X_SPAN.0, SEED_X_SPAN.1),
            span(rng, -SEED_Y_HALF, SEED_Y_HALF),
            span(rng, -DEPTH_HALF, DEPTH_HALF),
        );
        let kind = match rng.gen::<f32>() {
            r if r < 0.3 => SparkKind::WhiteHot,
            r if r < 0.5 => SparkKind::BlueWhite,
            r if r < 0.8 => SparkKind::YellowOrange,
            _ => SparkKind::RedEmber,
        };
        let color = kind_color(kind, rng);
        let mut p = Self {
            layer,
            slot,
            position,
            velocity: Vec3::new(-span(rng, 0.01, 0.04), (rng.gen::<f32>() - 0.5) * 0.006, 0.0),
            drift_factor: span(rng, 0.4, 1.2),
            drift_phase: rng.gen::<f32>() * TAU,
            turbulence_phase: rng.gen::<f32>() * TAU,
            turbulence_frequency: span(rng, 0.01, 0.03),
            has_swirl: false,
            swirl_frequency: 0.0,
            swirl_amplitude: 0.0,
            swirl_phase: 0.0,
            pop_chance: rng.gen(),
            has_popped_yet: false,
            age: 0,
            max_age: span(rng, 2500.0, 4000.0) as u32,
            active: true,
            kind,
            is_white_hot: kind == SparkKind::WhiteHot,
            color,
            color_intensity: span(rng, 0.7, 1.2),
            color_phase: rng.gen::<f32>() * TAU,
            brightness: 1.0,
            size: span(rng, 0.15, 0.23),
            rotation: rng.gen::<f32>() * TAU,
        };
        p.roll_swirl(rng);
        p
    }

    fn roll_swirl<R: Rng>(&mut self, rng: &mut R) {
        self.has_swirl = rng.gen::<f32>() > 0.7;
        self.swirl_frequency = span(rng, 0.005, 0.015);
        self.swirl_amplitude = span(rng, 0.0005, 0.0015);
        self.swirl_phase = rng.gen::<f32>() * TAU;
    }

    /// Reinitialise at the emission edge. Layer and slot are kept.
    fn respawn<R: Rng>(&mut self, rng: &mut R) {
        self.position = Vec3::new(
            span(rng, EMIT_X_SPAN.0, EMIT_X_SPAN.1),
            span(rng, -EMIT_Y_HALF, EMIT_Y_HALF),
            span(rng, -DEPTH_HALF, DEPTH_HALF),
        );
        self.velocity = Vec3::new(-span(rng, 0.008, 0.048), (rng.gen::<f32>() - 0.5) * 0.01, 0.0);
        self.drift_factor = span(rng, 0.3, 1.3);
        self.drift_phase = rng.gen::<f32>() * TAU;
        self.turbulence_phase = rng.gen::<f32>() * TAU;
        self.turbulence_frequency = span(rng, 0.008, 0.033);
        self.roll_swirl(rng);
        self.pop_chance = rng.gen();
        self.has_popped_yet = false;
        self.age = 0;
        self.max_age = span(rng, 2000.0, 4000.0) as u32;
        self.kind = if rng.gen::<f32>() < 0.35 {
            SparkKind::WhiteHot
        } else {
            match rng.gen::<f32>() {
                r if r < 0.3 => SparkKind::BlueWhite,
                r if r < 0.7 => SparkKind::YellowOrange,
                _ => SparkKind::RedEmber,
            }
        };
        self.is_white_hot = self.kind == SparkKind::WhiteHot;
        self.rotation = rng.gen::<f32>() * TAU;
        self.color = kind_color(self.kind, rng);
        self.brightness = 1.0;
        self.size = span(rng, 0.15, 0.23);
        self.active = true;
    }

    /// One-shot kick: nudge velocity and flare. Returns false if this life
    /// already popped.
    pub fn pop<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.has_popped_yet {
            return false;
        }
        // biased toward slowing down
        self.velocity.x += (rng.gen::<f32>() - 0.3) * 0.005;
        self.velocity.y += (rng.gen::<f32>() - 0.5) * 0.015;
        self.brightness = POP_BRIGHTNESS;
        self.has_popped_yet = true;
        true
    }

    pub fn life(&self) -> f32 {
        (self.age as f32 / self.max_age.max(1) as f32).min(1.0)
    }

    /// Size after age shrink and the white-hot bonus.
    pub fn render_size(&self) -> f32 {
        let bonus = if self.is_white_hot { WHITE_HOT_SIZE_BONUS } else { 0.0 };
        self.size * (1.0 - self.life() * AGE_SHRINK) + bonus
    }

    fn vertex(&self) -> PointVertex {
        PointVertex {
            position: self.position.to_array(),
            size: if self.active { self.render_size() } else { 0.0 },
            color: self.color.to_array(),
            rotation: self.rotation,
        }
    }

    fn step<R: Rng>(&mut self, frame: f64, wind: f32, speed: f32, rng: &mut R) {
        let particle_wind = wind * self.drift_factor;
        let drift_y = phase(frame, DRIFT_FREQ, self.drift_phase).sin() as f32
            * DRIFT_AMPLITUDE
            * self.drift_factor;
        let turb_arg = phase(frame, self.turbulence_frequency, self.turbulence_phase);
        let turbulence_x = turb_arg.sin() as f32 * TURBULENCE_FACTOR;
        let turbulence_y = turb_arg.cos() as f32 * TURBULENCE_FACTOR;
        let (swirl_x, swirl_y) = if self.has_swirl {
            let arg = phase(frame, self.swirl_frequency, self.swirl_phase);
            (
                arg.cos() as f32 * self.swirl_amplitude,
                arg.sin() as f32 * self.swirl_amplitude,
            )
        } else {
            (0.0, 0.0)
        };

        self.position.x += (self.velocity.x + turbulence_x + swirl_x) * speed;
        self.position.y +=
            (self.velocity.y + particle_wind + drift_y + turbulence_y + swirl_y) * speed;

        if !self.has_popped_yet && self.pop_chance > POP_CHANCE_MIN && rng.gen::<f32>() > POP_THRESHOLD {
            self.pop(rng);
        }

        self.age = self.age.saturating_add(1);
        let life = self.life();
        if self.is_white_hot {
            let flicker = span(rng, 0.95, 1.05);
            self.color = white_hot_color(life) * flicker;
        } else {
            self.color_phase += COLOR_PHASE_STEP;
            let mut c = ember_color(self.color_phase, self.color_intensity);
            if rng.gen::<f32>() < EMBER_FLICKER_CHANCE {
                c *= span(rng, 0.9, 1.2);
            }
            self.color = c * (1.0 - life * AGE_DIMMING);
        }
        self.color *= self.brightness;
        self.brightness = 1.0 + (self.brightness - 1.0) * POP_BRIGHTNESS_DECAY;
    }
}

pub struct ParticleField<R> {
    params: FieldParams,
    rng: R,
    particles: Vec<Particle>,
    back: Vec<PointVertex>,
    front: Vec<PointVertex>,
    camera: Camera,
    shake_offset: Vec3,
    frame_count: u64,
    spawn_accum: f32,
    speed_boost: f32,
    shake: f32,
    size_scale: f32,
}

impl<R: Rng> ParticleField<R> {
    pub fn new(params: FieldParams, rng: R) -> Self {
        let mut field = Self {
            params,
            rng,
            particles: Vec::new(),
            back: Vec::new(),
            front: Vec::new(),
            camera: Camera::default(),
            shake_offset: Vec3::ZERO,
            frame_count: 0,
            spawn_accum: 0.0,
            speed_boost: 0.0,
            shake: 0.0,
            size_scale: 1.0,
        };
        let (n, ratio) = (field.params.pool_size, field.params.back_layer_ratio);
        field.initialize(n, ratio);
        field
    }

    /// (Re)build the pool: every particle active and spread across the view.
    pub fn initialize(&mut self, pool_size: usize, back_layer_ratio: f32) {
        self.params.pool_size = pool_size;
        self.params.back_layer_ratio = back_layer_ratio;
        self.particles = Vec::with_capacity(pool_size);
        self.back.clear();
        self.front.clear();
        for _ in 0..pool_size {
            let layer = if self.rng.gen::<f32>() < back_layer_ratio {
                Layer::Back
            } else {
                Layer::Front
            };
            let buf = match layer {
                Layer::Back => &mut self.back,
                Layer::Front => &mut self.front,
            };
            let p = Particle::seeded(layer, buf.len(), &mut self.rng);
            buf.push(p.vertex());
            self.particles.push(p);
        }
        self.frame_count = 0;
        self.spawn_accum = 0.0;
        log::info!(
            "[field] pool={} back={} front={}",
            pool_size,
            self.back.len(),
            self.front.len()
        );
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable view of the pool. Length, layer and slot cannot change
    /// through this; only simulation state can.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn pool_size(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    pub fn inactive_count(&self) -> usize {
        self.pool_size() - self.active_count()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn layer_points(&self, layer: Layer) -> &[PointVertex] {
        match layer {
            Layer::Back => &self.back,
            Layer::Front => &self.front,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Camera as drawn this frame, including beat shake.
    pub fn view_camera(&self) -> Camera {
        let mut cam = self.camera.clone();
        cam.eye += self.shake_offset;
        cam.target += self.shake_offset;
        cam
    }

    pub fn speed(&self) -> f32 {
        self.params.base_speed * (1.0 + self.speed_boost)
    }

    /// Reuse the first inactive particle at the emission edge. Returns false,
    /// touching nothing, when every particle is active.
    pub fn spawn(&mut self) -> bool {
        let Some(p) = self.particles.iter_mut().find(|p| !p.active) else {
            log::debug!("[field] spawn skipped, pool exhausted");
            return false;
        };
        p.respawn(&mut self.rng);
        true
    }

    /// Speed up and shake the camera in response to a detected hit.
    pub fn apply_beat(&mut self, peak: f32) {
        let peak = peak.clamp(0.0, 1.0);
        self.speed_boost = self.speed_boost.max(peak * BEAT_SPEED_BOOST);
        self.shake = self.shake.max(peak * BEAT_SHAKE);
    }

    /// Advance the simulation by one frame without drawing.
    ///
    /// `intensity` only pulses sprite size; motion ignores it.
    pub fn update(&mut self, intensity: f32) {
        self.frame_count += 1;

        self.spawn_accum += self.params.spawn_rate;
        while self.spawn_accum >= 1.0 {
            self.spawn();
            self.spawn_accum -= 1.0;
        }

        let frame = self.frame_count as f64;
        let wind = global_wind(frame);
        let speed = self.speed();
        let left_bound = self.params.left_bound;
        let expire_on_age = self.params.expire_on_age;
        for p in self.particles.iter_mut().filter(|p| p.active) {
            p.step(frame, wind, speed, &mut self.rng);
            if p.position.x < left_bound || (expire_on_age && p.age >= p.max_age) {
                p.active = false;
            }
        }

        self.shake_offset = if self.shake > 1e-4 {
            Vec3::new(
                span(&mut self.rng, -1.0, 1.0) * self.shake,
                span(&mut self.rng, -1.0, 1.0) * self.shake,
                0.0,
            )
        } else {
            Vec3::ZERO
        };
        self.speed_boost *= BEAT_SPEED_DECAY;
        self.shake *= BEAT_SHAKE_DECAY;
        self.size_scale = 1.0 + INTENSITY_SIZE_PULSE * intensity.clamp(0.0, 1.0);

        for p in &self.particles {
            let buf = match p.layer {
                Layer::Back => &mut self.back,
                Layer::Front => &mut self.front,
            };
            if let Some(v) = buf.get_mut(p.slot) {
                *v = p.vertex();
            }
        }
    }

    /// Push both layers to `sink`, back first.
    pub fn render(&self, sink: &mut impl PointSpriteSink) {
        let uniforms = FrameUniforms::new(&self.view_camera(), self.size_scale);
        sink.draw_layer(Layer::Back, &self.back, &uniforms);
        sink.draw_layer(Layer::Front, &self.front, &uniforms);
    }

    /// One animation frame: simulate, then draw.
    pub fn tick(&mut self, intensity: f32, sink: &mut impl PointSpriteSink) {
        self.update(intensity);
        self.render(sink);
    }

    /// Track the viewport aspect. Simulation state is untouched.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.camera.aspect = width.max(1) as f32 / height.max(1) as f32;
    }
}
