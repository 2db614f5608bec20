// Host-side tests for the spark pool: seeding, spawning, integration and drawing.

use ember_core::*;
use rand::prelude::*;

#[derive(Default)]
struct RecordingSink {
    calls: Vec<(Layer, usize, f32)>,
}

impl PointSpriteSink for RecordingSink {
    fn draw_layer(&mut self, layer: Layer, points: &[PointVertex], uniforms: &FrameUniforms) {
        self.calls.push((layer, points.len(), uniforms.size_scale));
    }
}

fn make_field(pool_size: usize, seed: u64) -> ParticleField<StdRng> {
    let params = FieldParams {
        pool_size,
        ..FieldParams::default()
    };
    ParticleField::new(params, StdRng::seed_from_u64(seed))
}

fn make_still_field(pool_size: usize, seed: u64) -> ParticleField<StdRng> {
    let params = FieldParams {
        pool_size,
        spawn_rate: 0.0,
        ..FieldParams::default()
    };
    let mut field = ParticleField::new(params, StdRng::seed_from_u64(seed));
    for p in field.particles_mut() {
        p.position.x = 0.0;
    }
    field
}

#[test]
fn initial_pool_is_active_and_spread_across_view() {
    let field = make_field(500, 1);
    assert_eq!(field.pool_size(), 500);
    assert_eq!(field.inactive_count(), 0);
    let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
    for p in field.particles() {
        assert!(p.position.x >= -15.0 && p.position.x <= 15.0);
        assert!(p.position.y.abs() <= 5.0);
        assert!(p.position.z.abs() <= 2.5);
        assert!(p.velocity.x < 0.0);
        min_x = min_x.min(p.position.x);
        max_x = max_x.max(p.position.x);
    }
    // populated edge to edge, not only at the emitter
    assert!(min_x < -10.0 && max_x > 10.0);
}

#[test]
fn every_particle_owns_one_slot_in_one_layer() {
    let field = make_field(400, 2);
    let back = field.layer_points(Layer::Back).len();
    let front = field.layer_points(Layer::Front).len();
    assert_eq!(back + front, 400);
    let mut seen_back = vec![false; back];
    let mut seen_front = vec![false; front];
    for p in field.particles() {
        let seen = match p.layer() {
            Layer::Back => &mut seen_back,
            Layer::Front => &mut seen_front,
        };
        assert!(!seen[p.slot()], "slot {} used twice", p.slot());
        seen[p.slot()] = true;
    }
    assert!(seen_back.iter().chain(seen_front.iter()).all(|s| *s));
}

#[test]
fn layer_split_follows_ratio() {
    let field = make_field(POOL_SIZE, 3);
    let back = field.layer_points(Layer::Back).len() as f32 / POOL_SIZE as f32;
    assert!((back - BACK_LAYER_RATIO).abs() < 0.05, "back share {back}");
}

#[test]
fn pool_size_is_invariant_across_ticks_and_spawns() {
    let mut field = make_field(300, 4);
    let mut sink = RecordingSink::default();
    let back = field.layer_points(Layer::Back).len();
    let front = field.layer_points(Layer::Front).len();
    for i in 0..3_000 {
        if i % 97 == 0 {
            field.apply_beat(1.0);
        }
        field.spawn();
        field.tick(0.5, &mut sink);
        assert_eq!(field.pool_size(), 300);
    }
    assert_eq!(field.layer_points(Layer::Back).len(), back);
    assert_eq!(field.layer_points(Layer::Front).len(), front);
}

#[test]
fn spawn_fills_inactive_slots_then_becomes_noop() {
    let mut field = make_still_field(10, 5);
    for i in [2, 5, 9] {
        field.particles_mut()[i].active = false;
    }
    assert_eq!(field.inactive_count(), 3);
    for _ in 0..3 {
        assert!(field.spawn());
    }
    assert_eq!(field.inactive_count(), 0);

    let before = field.particles().to_vec();
    assert!(!field.spawn());
    assert_eq!(field.particles(), before.as_slice());
}

#[test]
fn spawn_reinitialises_at_emission_edge() {
    let mut field = make_still_field(20, 6);
    {
        let p = &mut field.particles_mut()[0];
        p.active = false;
        p.age = 1234;
        p.has_popped_yet = true;
    }
    let layer = field.particles()[0].layer();
    let slot = field.particles()[0].slot();
    assert!(field.spawn());
    let p = &field.particles()[0];
    assert!(p.active);
    assert_eq!(p.age, 0);
    assert!(!p.has_popped_yet);
    assert!(p.position.x >= 15.0 && p.position.x <= 20.0);
    assert!(p.position.y.abs() <= 6.0);
    assert!(p.velocity.x <= -0.008 && p.velocity.x >= -0.048);
    assert!(p.max_age >= 2000 && p.max_age <= 4000);
    assert_eq!(p.layer(), layer);
    assert_eq!(p.slot(), slot);
}

#[test]
fn particle_past_left_bound_goes_inactive_and_is_reused() {
    let mut field = make_still_field(10, 7);
    field.particles_mut()[0].position.x = -16.0;
    let mut sink = RecordingSink::default();
    field.tick(0.0, &mut sink);
    assert!(!field.particles()[0].active);
    assert_eq!(field.inactive_count(), 1);

    assert!(field.spawn());
    assert!(field.particles()[0].active);
    assert!(field.particles()[0].position.x >= 15.0);
}

#[test]
fn active_age_increases_every_frame() {
    let mut field = make_still_field(200, 8);
    let mut prev: Vec<u32> = field.particles().iter().map(|p| p.age).collect();
    for _ in 0..500 {
        field.update(0.0);
        for (p, before) in field.particles().iter().zip(prev.iter()) {
            if p.active {
                assert_eq!(p.age, before + 1);
            } else {
                assert!(p.age >= *before);
            }
        }
        prev = field.particles().iter().map(|p| p.age).collect();
    }
}

#[test]
fn ageing_out_only_retires_when_enabled() {
    let mut keep = make_still_field(4, 9);
    keep.particles_mut()[0].max_age = 5;
    for _ in 0..10 {
        keep.update(0.0);
    }
    assert!(keep.particles()[0].active);
    assert!((keep.particles()[0].life() - 1.0).abs() < 1e-6);

    let params = FieldParams {
        pool_size: 4,
        spawn_rate: 0.0,
        expire_on_age: true,
        ..FieldParams::default()
    };
    let mut expire = ParticleField::new(params, StdRng::seed_from_u64(9));
    for p in expire.particles_mut() {
        p.position.x = 0.0;
    }
    expire.particles_mut()[0].max_age = 5;
    for _ in 0..5 {
        expire.update(0.0);
    }
    assert!(!expire.particles()[0].active);
    assert_eq!(expire.inactive_count(), 1);
}

#[test]
fn spawn_accumulator_emits_at_fixed_rate() {
    let params = FieldParams {
        pool_size: 50,
        spawn_rate: 0.25,
        ..FieldParams::default()
    };
    let mut field = ParticleField::new(params, StdRng::seed_from_u64(10));
    for p in field.particles_mut() {
        p.active = false;
    }
    for _ in 0..20 {
        field.update(0.0);
    }
    assert_eq!(field.active_count(), 5);
}

#[test]
fn resize_is_idempotent_and_leaves_simulation_alone() {
    let mut field = make_field(100, 11);
    let before = field.particles().to_vec();
    field.handle_resize(1920, 1080);
    let cam = field.camera().clone();
    let proj = cam.projection_matrix();
    field.handle_resize(1920, 1080);
    assert_eq!(field.camera(), &cam);
    assert_eq!(field.camera().projection_matrix(), proj);
    assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    assert_eq!(field.particles(), before.as_slice());

    field.handle_resize(800, 0);
    assert!(field.camera().aspect.is_finite());
}

#[test]
fn tick_draws_back_layer_before_front() {
    let mut field = make_field(120, 12);
    let mut sink = RecordingSink::default();
    field.tick(0.0, &mut sink);
    assert_eq!(sink.calls.len(), 2);
    assert_eq!(sink.calls[0].0, Layer::Back);
    assert_eq!(sink.calls[1].0, Layer::Front);
    assert_eq!(sink.calls[0].1, field.layer_points(Layer::Back).len());
    assert_eq!(sink.calls[1].1, field.layer_points(Layer::Front).len());
}

#[test]
fn inactive_particles_draw_with_zero_size() {
    let mut field = make_still_field(30, 13);
    field.particles_mut()[3].position.x = -20.0;
    field.update(0.0);
    let p = &field.particles()[3];
    assert!(!p.active);
    assert_eq!(field.layer_points(p.layer())[p.slot()].size, 0.0);
    let q = &field.particles()[4];
    assert!(field.layer_points(q.layer())[q.slot()].size > 0.0);
}

#[test]
fn intensity_pulses_sprite_scale_but_not_motion() {
    let mut calm = make_field(150, 14);
    let mut loud = make_field(150, 14);
    let mut calm_sink = RecordingSink::default();
    let mut loud_sink = RecordingSink::default();
    for _ in 0..50 {
        calm.tick(0.0, &mut calm_sink);
        loud.tick(1.0, &mut loud_sink);
    }
    for (a, b) in calm.particles().iter().zip(loud.particles()) {
        assert_eq!(a.position, b.position);
    }
    assert_eq!(calm_sink.calls.last().map(|c| c.2), Some(1.0));
    let loud_scale = loud_sink.calls.last().map(|c| c.2).unwrap_or(0.0);
    assert!((loud_scale - (1.0 + INTENSITY_SIZE_PULSE)).abs() < 1e-6);
}

#[test]
fn beat_boosts_speed_and_shakes_camera_then_settles() {
    let mut field = make_field(50, 15);
    let base = field.speed();
    field.apply_beat(1.0);
    assert!(field.speed() > base * 5.0);
    field.update(0.0);
    assert_ne!(field.view_camera().eye, field.camera().eye);
    for _ in 0..400 {
        field.update(0.0);
    }
    assert!((field.speed() - base).abs() < 1e-6);
    assert_eq!(field.view_camera(), *field.camera());
}

#[test]
fn pop_fires_once_per_life() {
    let mut rng = StdRng::seed_from_u64(16);
    let mut field = make_still_field(5, 16);
    let p = &mut field.particles_mut()[0];
    assert!(p.pop(&mut rng));
    assert!(p.has_popped_yet);
    assert!((p.brightness - POP_BRIGHTNESS).abs() < 1e-6);
    let v = p.velocity;
    assert!(!p.pop(&mut rng));
    assert_eq!(p.velocity, v);

    p.active = false;
    assert!(field.spawn());
    assert!(!field.particles()[0].has_popped_yet);
}

#[test]
fn pop_flare_fades_back_to_normal() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut field = make_still_field(5, 17);
    field.particles_mut()[1].pop(&mut rng);
    for _ in 0..300 {
        field.update(0.0);
    }
    assert!((field.particles()[1].brightness - 1.0).abs() < 1e-3);
}

#[test]
fn white_hot_ramp_cools_over_life() {
    assert_eq!(white_hot_color(0.1), glam::Vec3::splat(2.0));
    let samples = [0.0, 0.25, 0.5, 0.8, 1.0].map(white_hot_color);
    for pair in samples.windows(2) {
        assert!(pair[1].y <= pair[0].y, "green should fall: {:?}", pair);
    }
    let end = white_hot_color(1.0);
    assert!(end.x > end.y && end.y > end.z);
}

#[test]
fn ember_wheel_stays_warm() {
    for i in 0..64 {
        let c = ember_color(i as f32 * 0.1, 1.0);
        assert!(c.x >= c.y && c.x >= c.z, "{:?}", c);
    }
}

#[test]
fn global_wind_stays_within_strength_plus_gust() {
    for f in (0..200_000).step_by(7) {
        let w = global_wind(f as f64);
        assert!(w.abs() <= WIND_STRENGTH + WIND_VARIABILITY + 1e-6);
    }
}

#[test]
fn gust_only_adds_above_activation() {
    let mut gusty = 0;
    for f in 0..200_000u32 {
        let f = f as f64;
        let base = (f * WIND_CHANGE_SPEED as f64).sin() as f32 * WIND_STRENGTH;
        let g = ((f * GUST_FREQ_A as f64).sin() * (f * GUST_FREQ_B as f64).sin()) as f32;
        let w = global_wind(f);
        if g > GUST_ACTIVATION {
            gusty += 1;
            assert!((w - (base + g * WIND_VARIABILITY)).abs() < 1e-7, "frame {f}");
        } else {
            assert!((w - base).abs() < 1e-7, "frame {f} gusted at {g}");
        }
    }
    assert!(gusty > 0);
}

#[test]
fn wind_keeps_advancing_late_in_long_sessions() {
    // past 2^24 frames an f32 counter can no longer tell neighbours apart
    let late = (1u64 << 24) as f64;
    assert_ne!(global_wind(late), global_wind(late + 1.0));
}

#[test]
fn ineligible_sparks_never_pop_during_updates() {
    let mut field = make_still_field(200, 21);
    for p in field.particles_mut() {
        p.pop_chance = POP_CHANCE_MIN;
    }
    for _ in 0..3_000 {
        field.update(0.0);
    }
    assert!(field.particles().iter().all(|p| !p.has_popped_yet));
}

#[test]
fn eligible_sparks_pop_at_most_once_per_life() {
    let mut field = make_still_field(200, 22);
    for p in field.particles_mut() {
        p.pop_chance = 1.0;
    }
    let mut flares = vec![0u32; field.pool_size()];
    let mut prev: Vec<f32> = field.particles().iter().map(|p| p.brightness).collect();
    for _ in 0..3_000 {
        field.update(0.0);
        for (i, p) in field.particles().iter().enumerate() {
            if p.brightness > prev[i] + 1e-6 {
                flares[i] += 1;
            }
            prev[i] = p.brightness;
        }
    }
    assert!(flares.iter().all(|&n| n <= 1), "{:?}", flares);
    assert!(flares.iter().any(|&n| n == 1));
    for (p, &n) in field.particles().iter().zip(&flares) {
        assert_eq!(p.has_popped_yet, n == 1);
    }
}

#[test]
fn pool_mutation_keeps_layer_slots_intact() {
    let mut field = make_field(300, 23);
    let back = field.layer_points(Layer::Back).len();
    let front = field.layer_points(Layer::Front).len();
    for (i, p) in field.particles_mut().iter_mut().enumerate() {
        p.position.x = if i % 2 == 0 { -100.0 } else { 100.0 };
        p.age = u32::MAX;
        p.active = i % 3 != 0;
    }
    for _ in 0..200 {
        field.update(1.0);
    }
    assert_eq!(field.layer_points(Layer::Back).len(), back);
    assert_eq!(field.layer_points(Layer::Front).len(), front);
    let mut seen_back = vec![false; back];
    let mut seen_front = vec![false; front];
    for p in field.particles() {
        let seen = match p.layer() {
            Layer::Back => &mut seen_back,
            Layer::Front => &mut seen_front,
        };
        assert!(p.slot() < seen.len());
        assert!(!seen[p.slot()]);
        seen[p.slot()] = true;
    }
    assert!(seen_back.iter().chain(&seen_front).all(|&s| s));
}

#[test]
fn same_seed_gives_same_field() {
    let mut a = make_field(80, 99);
    let mut b = make_field(80, 99);
    for _ in 0..100 {
        a.update(0.3);
        b.update(0.3);
    }
    assert_eq!(a.particles(), b.particles());
    assert_eq!(a.layer_points(Layer::Front), b.layer_points(Layer::Front));
}
