//! Orbit integration and the cosmetic motion of bodies.
//!
//! Orbit parameters are derived state: they are never serialized and never
//! captured by undo snapshots. A planet without an orbit is lazily given one
//! by [`OrbitIntegrator::advance`] while orbits are enabled.

use crate::config::EditorConfig;
use crate::scene::{Planet, Scene};
use kurbo::{Point, Vec2};
use rand::Rng;
use std::f64::consts::{PI, TAU};

/// Random phases of a two-axis sinusoidal sway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftPhase {
    pub a: f64,
    pub b: f64,
}

impl DriftPhase {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Phases drawn uniformly from `[0, 10)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0))
    }
}

/// Time and amplitudes shared by every animated body in one frame.
#[derive(Debug, Clone, Copy)]
pub struct AnimationFrame {
    /// Animation time in seconds.
    pub time: f64,
    /// Orbit wobble amplitude in world units.
    pub wobble: f64,
    /// Idle drift amplitude in world units.
    pub drift: f64,
}

impl AnimationFrame {
    /// Frame at `time` with dp amplitudes converted for `scale`.
    pub fn new(time: f64, scale: f64, config: &EditorConfig) -> Self {
        Self {
            time,
            wobble: config.dp(config.orbit_wobble_dp) / scale,
            drift: config.dp(config.idle_drift_dp) / scale,
        }
    }
}

/// Something that decides where a body is drawn on a given frame.
pub trait PositionAnimator {
    /// Drawn position of a body whose stored position is `base`.
    fn animate(&self, base: Point, frame: &AnimationFrame) -> Point;
}

/// Slow idle drift around the stored position.
impl PositionAnimator for DriftPhase {
    fn animate(&self, base: Point, frame: &AnimationFrame) -> Point {
        let t = frame.time;
        base + Vec2::new(
            (t * 0.18 + self.a).sin() * frame.drift,
            (t * 0.14 + self.b).cos() * frame.drift,
        )
    }
}

/// Elliptical orbit parameters of one planet.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitState {
    /// Focus the planet revolves around.
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    /// Current angle, radians.
    pub angle: f64,
    /// Signed angular speed, radians per second.
    pub angular_speed: f64,
    /// Phases of the small wobble added when drawing.
    pub wobble: DriftPhase,
}

impl OrbitState {
    /// Position on the ellipse, without wobble.
    pub fn position(&self) -> Point {
        self.center + Vec2::new(self.angle.cos() * self.radius_x, self.angle.sin() * self.radius_y)
    }

    /// Time for one full revolution, in seconds.
    pub fn period(&self) -> f64 {
        TAU / self.angular_speed.abs()
    }

    /// Advance the angle by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.angle = (self.angle + self.angular_speed * dt).rem_euclid(TAU);
    }
}

impl PositionAnimator for OrbitState {
    fn animate(&self, _base: Point, frame: &AnimationFrame) -> Point {
        let t = frame.time;
        self.position()
            + Vec2::new(
                (t * 0.7 + self.wobble.a).sin() * frame.wobble,
                (t * 0.6 + self.wobble.b).cos() * frame.wobble,
            )
    }
}

/// Point that planets orbit: the sun when placed, else the world origin.
pub fn orbit_focus(scene: &Scene) -> Point {
    scene.sun.unwrap_or(Point::ZERO)
}

/// Angular speed for a planet at distance `radius`.
///
/// Inner planets turn faster; odd indices revolve the other way.
pub fn angular_speed(radius: f64, index: usize, config: &EditorConfig) -> f64 {
    let speed = (config.orbit_base_speed
        * (config.orbit_reference_radius / radius.max(config.orbit_radius_floor)))
    .clamp(config.orbit_min_speed, config.orbit_max_speed);
    if index % 2 == 1 { -speed } else { speed }
}

/// Vertical flattening of the orbit ellipse for a planet index.
pub fn flattening(index: usize) -> f64 {
    0.78 + (index % 4) as f64 * 0.05
}

/// Where the planet at `index` starts its orbit.
///
/// A planet closer to the focus than `orbit_min_radius` is pushed out along
/// its bearing (random if it sits on the focus) so planets do not stack.
/// Other positions are returned unchanged.
pub fn orbit_start<R: Rng + ?Sized>(
    position: Point,
    focus: Point,
    index: usize,
    config: &EditorConfig,
    rng: &mut R,
) -> Point {
    let offset = position - focus;
    let distance = offset.hypot();
    if distance >= config.orbit_min_radius {
        return position;
    }
    let bearing = if distance > 1e-6 {
        offset.y.atan2(offset.x)
    } else {
        rng.gen_range(-PI..PI)
    };
    let pushed = config.orbit_min_radius + index as f64 * config.orbit_spacing;
    focus + Vec2::new(bearing.cos(), bearing.sin()) * pushed
}

/// Fit the orbit of the planet at `index` through `start`.
pub fn init_orbit<R: Rng + ?Sized>(
    start: Point,
    focus: Point,
    index: usize,
    config: &EditorConfig,
    rng: &mut R,
) -> OrbitState {
    let offset = start - focus;
    let f = flattening(index);
    let k = (offset.x * offset.x + (offset.y / f).powi(2)).sqrt();
    let (radius_x, radius_y) = (k, k * f);
    let angle = if k > 1e-9 {
        (offset.y / radius_y).atan2(offset.x / radius_x)
    } else {
        0.0
    };

    OrbitState {
        center: focus,
        radius_x,
        radius_y,
        angle,
        angular_speed: angular_speed(offset.hypot(), index, config),
        wobble: DriftPhase::random(rng),
    }
}

/// Give `planet` a fresh orbit around `focus`.
///
/// A pushed-out start becomes the planet's stored position, so turning
/// orbits off later leaves it where it was orbiting from.
pub fn attach_orbit<R: Rng + ?Sized>(
    planet: &mut Planet,
    focus: Point,
    index: usize,
    config: &EditorConfig,
    rng: &mut R,
) {
    let start = orbit_start(planet.position, focus, index, config, rng);
    if start != planet.position {
        log::debug!(
            "Pushed {} out to ({:.1}, {:.1})",
            planet.kind.name(),
            start.x,
            start.y
        );
        planet.position = start;
    }
    planet.orbit = Some(init_orbit(start, focus, index, config, rng));
}

/// Drives planet orbits while orbit animation is enabled.
#[derive(Debug, Clone, Default)]
pub struct OrbitIntegrator {
    enabled: bool,
}

impl OrbitIntegrator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle orbits. Enabling builds fresh orbits, disabling drops them so
    /// planets fall back to idle drift at their stored positions.
    pub fn set_enabled<R: Rng + ?Sized>(&mut self, enabled: bool, scene: &mut Scene, config: &EditorConfig, rng: &mut R) {
        self.enabled = enabled;
        if enabled {
            self.reinit_all(scene, config, rng);
        } else {
            for planet in &mut scene.planets {
                planet.orbit = None;
            }
        }
        log::debug!("Orbit animation {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Rebuild every orbit from the planets' stored positions.
    pub fn reinit_all<R: Rng + ?Sized>(&self, scene: &mut Scene, config: &EditorConfig, rng: &mut R) {
        if !self.enabled {
            return;
        }
        let focus = orbit_focus(scene);
        for (index, planet) in scene.planets.iter_mut().enumerate() {
            attach_orbit(planet, focus, index, config, rng);
        }
    }

    /// Move every orbit's focus to the current sun position.
    pub fn recenter(&self, scene: &mut Scene) {
        let focus = orbit_focus(scene);
        for orbit in scene.planets.iter_mut().filter_map(|p| p.orbit.as_mut()) {
            orbit.center = focus;
        }
    }

    /// Step every orbit by `dt` seconds.
    ///
    /// Planets missing an orbit get one first. The planet at `held` (being
    /// dragged) is skipped and loses its orbit so it restarts from wherever
    /// it is dropped.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        scene: &mut Scene,
        dt: f64,
        held: Option<usize>,
        config: &EditorConfig,
        rng: &mut R,
    ) {
        if !self.enabled {
            return;
        }
        let focus = orbit_focus(scene);
        for (index, planet) in scene.planets.iter_mut().enumerate() {
            if held == Some(index) {
                planet.orbit = None;
                continue;
            }
            if planet.orbit.is_none() {
                attach_orbit(planet, focus, index, config, rng);
            }
            if let Some(orbit) = planet.orbit.as_mut() {
                orbit.step(dt);
            }
        }
    }
}

/// Sway and glow profile of a singleton body, amplitudes in dp.
#[derive(Debug, Clone, Copy)]
pub struct Sway {
    pub amplitude_x: f64,
    pub amplitude_y: f64,
    pub frequency_x: f64,
    pub frequency_y: f64,
    /// Glow alpha at the bottom of the pulse.
    pub glow_base: f64,
    /// Glow alpha added at the top of the pulse.
    pub glow_swing: f64,
    pub glow_frequency: f64,
}

pub const SUN_SWAY: Sway = Sway {
    amplitude_x: 18.0,
    amplitude_y: 12.0,
    frequency_x: 0.18,
    frequency_y: 0.14,
    glow_base: 70.0,
    glow_swing: 20.0,
    glow_frequency: 0.45,
};

pub const MOON_SWAY: Sway = Sway {
    amplitude_x: 14.0,
    amplitude_y: 10.0,
    frequency_x: 0.16,
    frequency_y: 0.12,
    glow_base: 60.0,
    glow_swing: 18.0,
    glow_frequency: 0.35,
};

impl Sway {
    /// Offset at time `t`; `unit` converts dp to world units.
    pub fn offset(&self, phase: DriftPhase, t: f64, unit: f64) -> Vec2 {
        Vec2::new(
            (t * self.frequency_x + phase.a).sin() * self.amplitude_x * unit,
            (t * self.frequency_y + phase.b).sin() * self.amplitude_y * unit,
        )
    }

    /// Pulsing glow alpha, in `[glow_base, glow_base + glow_swing]`.
    pub fn glow_alpha(&self, phase: DriftPhase, t: f64) -> u8 {
        let pulse = 0.5 + 0.5 * (t * self.glow_frequency + phase.a).sin();
        (self.glow_base + self.glow_swing * pulse).clamp(0.0, 255.0) as u8
    }
}

/// Animation time plus the phases of the singleton bodies.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    pub time: f64,
    pub sun_phase: DriftPhase,
    pub moon_phase: DriftPhase,
}

impl AnimationClock {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            time: 0.0,
            sun_phase: DriftPhase::random(rng),
            moon_phase: DriftPhase::random(rng),
        }
    }

    /// Advance by `dt`, clamped to `[0, max_dt]`. Returns the applied delta.
    pub fn tick(&mut self, dt: f64, max_dt: f64) -> f64 {
        let dt = if dt.is_finite() { dt.clamp(0.0, max_dt) } else { 0.0 };
        self.time += dt;
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BodyKind, Planet};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_angular_speed_bounds() {
        let config = EditorConfig::default();
        for &r in &[0.0, 50.0, 180.0, 280.0, 1000.0, 1.0e6] {
            for index in 0..4 {
                let speed = angular_speed(r, index, &config);
                assert!(speed.abs() >= 0.10 - 1e-12 && speed.abs() <= 0.90 + 1e-12);
                assert_eq!(speed < 0.0, index % 2 == 1);
            }
        }
        assert!((angular_speed(280.0, 0, &config) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_orbit_passes_through_start() {
        let config = EditorConfig::default();
        let focus = Point::new(100.0, 100.0);
        for index in 0..5 {
            let start = Point::new(380.0, -40.0);
            let orbit = init_orbit(start, focus, index, &config, &mut rng());
            let p = orbit.position();
            assert!((p.x - start.x).abs() < 1e-9 && (p.y - start.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_close_planet_pushed_out() {
        let config = EditorConfig::default();
        let start = orbit_start(Point::new(10.0, 0.0), Point::ZERO, 2, &config, &mut rng());
        assert!((start.x - (150.0 + 2.0 * 70.0)).abs() < 1e-9);
        assert!(start.y.abs() < 1e-9);

        let degenerate = orbit_start(Point::ZERO, Point::ZERO, 0, &config, &mut rng());
        assert!((degenerate.to_vec2().hypot() - 150.0).abs() < 1e-9);

        let far = Point::new(400.0, -30.0);
        assert_eq!(orbit_start(far, Point::ZERO, 1, &config, &mut rng()), far);
    }

    #[test]
    fn test_attach_orbit_stores_pushed_position() {
        let config = EditorConfig::default();
        let mut planet = Planet::new(BodyKind::Earth, Point::new(10.0, 0.0), DriftPhase::new(0.0, 0.0));
        attach_orbit(&mut planet, Point::ZERO, 0, &config, &mut rng());
        assert!((planet.position.x - 150.0).abs() < 1e-9 && planet.position.y.abs() < 1e-9);
        let on_orbit = planet.current_position();
        assert!((on_orbit - planet.position).hypot() < 1e-9);
    }

    #[test]
    fn test_disable_keeps_pushed_planet_in_place() {
        let config = EditorConfig::default();
        let mut scene = Scene::new();
        scene.set_sun(Some(Point::ZERO));
        scene.add_planet(Planet::new(BodyKind::Earth, Point::new(10.0, 0.0), DriftPhase::new(0.0, 0.0)));
        let mut rng = rng();
        let mut integrator = OrbitIntegrator::default();

        integrator.set_enabled(true, &mut scene, &config, &mut rng);
        let orbiting = scene.planets[0].current_position();
        assert!((orbiting.x - 150.0).abs() < 1e-9);

        integrator.set_enabled(false, &mut scene, &config, &mut rng);
        let after = scene.planets[0].current_position();
        assert!((after - orbiting).hypot() < 1e-9);
    }

    #[test]
    fn test_full_period_returns_home() {
        let config = EditorConfig::default();
        let mut orbit = init_orbit(Point::new(300.0, 200.0), Point::ZERO, 1, &config, &mut rng());
        let start = orbit.position();
        let steps = 1000;
        let dt = orbit.period() / steps as f64;
        for _ in 0..steps {
            orbit.step(dt);
        }
        let end = orbit.position();
        assert!((end.x - start.x).abs() < 1e-6 && (end.y - start.y).abs() < 1e-6);
    }

    #[test]
    fn test_half_period_opposite_point() {
        let config = EditorConfig::default();
        let mut orbit = init_orbit(Point::new(100.0, 300.0), Point::new(100.0, 100.0), 0, &config, &mut rng());
        orbit.step(orbit.period() / 2.0);
        let p = orbit.position();
        assert!((p.x - 100.0).abs() < 1e-6);
        assert!((p.y + 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_integrator_toggle() {
        let config = EditorConfig::default();
        let mut scene = Scene::new();
        scene.add_planet(Planet::new(BodyKind::Earth, Point::new(400.0, 0.0), DriftPhase::new(0.0, 0.0)));
        let mut integrator = OrbitIntegrator::default();
        let mut rng = rng();

        integrator.advance(&mut scene, 0.1, None, &config, &mut rng);
        assert!(scene.planets[0].orbit.is_none());

        integrator.set_enabled(true, &mut scene, &config, &mut rng);
        assert!(scene.planets[0].orbit.is_some());
        integrator.advance(&mut scene, 0.1, None, &config, &mut rng);
        assert_ne!(scene.planets[0].current_position(), Point::new(400.0, 0.0));

        integrator.set_enabled(false, &mut scene, &config, &mut rng);
        assert_eq!(scene.planets[0].current_position(), Point::new(400.0, 0.0));
    }

    #[test]
    fn test_held_planet_skipped() {
        let config = EditorConfig::default();
        let mut scene = Scene::new();
        scene.add_planet(Planet::new(BodyKind::Mars, Point::new(400.0, 0.0), DriftPhase::new(0.0, 0.0)));
        let mut rng = rng();
        let mut integrator = OrbitIntegrator::default();
        integrator.set_enabled(true, &mut scene, &config, &mut rng);
        integrator.advance(&mut scene, 0.5, Some(0), &config, &mut rng);
        assert!(scene.planets[0].orbit.is_none());
        integrator.advance(&mut scene, 0.0, None, &config, &mut rng);
        assert!(scene.planets[0].orbit.is_some());
    }

    #[test]
    fn test_recenter_moves_focus() {
        let config = EditorConfig::default();
        let mut scene = Scene::new();
        scene.add_planet(Planet::new(BodyKind::Venus, Point::new(400.0, 0.0), DriftPhase::new(0.0, 0.0)));
        let mut rng = rng();
        let mut integrator = OrbitIntegrator::default();
        integrator.set_enabled(true, &mut scene, &config, &mut rng);
        scene.set_sun(Some(Point::new(50.0, 60.0)));
        integrator.recenter(&mut scene);
        assert_eq!(scene.planets[0].orbit.as_ref().map(|o| o.center), Some(Point::new(50.0, 60.0)));
    }

    #[test]
    fn test_clock_clamps_delta() {
        let mut clock = AnimationClock::new(&mut rng());
        assert!((clock.tick(1.0, 0.05) - 0.05).abs() < f64::EPSILON);
        assert_eq!(clock.tick(-3.0, 0.05), 0.0);
        assert_eq!(clock.tick(f64::NAN, 0.05), 0.0);
        assert!((clock.time - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_glow_alpha_range() {
        let phase = DriftPhase::new(1.0, 2.0);
        for i in 0..200 {
            let t = i as f64 * 0.1;
            assert!((70..=90).contains(&SUN_SWAY.glow_alpha(phase, t)));
            assert!((60..=78).contains(&MOON_SWAY.glow_alpha(phase, t)));
        }
    }

    #[test]
    fn test_drift_bounded() {
        let frame = AnimationFrame { time: 3.0, wobble: 6.0, drift: 12.0 };
        let base = Point::new(5.0, 5.0);
        let p = DriftPhase::new(0.3, 0.7).animate(base, &frame);
        assert!((p - base).hypot() <= 12.0 * 2f64.sqrt() + 1e-9);
    }
}
