//! Decorative background stars that drift slowly and twinkle.

use kurbo::{Point, Size, Vec2};
use rand::Rng;

/// One background star.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundStar {
    pub position: Point,
    /// Drift velocity, world units per second.
    pub velocity: Vec2,
    /// Radius in screen pixels.
    pub radius: f64,
    /// Peak alpha.
    pub base_alpha: u8,
    twinkle_phase: f64,
    /// Alpha for the current frame.
    pub alpha: u8,
}

/// The background star layer.
#[derive(Debug, Clone)]
pub struct Starfield {
    stars: Vec<BackgroundStar>,
    world: Size,
}

impl Starfield {
    /// Scatter `count` stars uniformly over the world.
    pub fn new<R: Rng + ?Sized>(count: usize, world: Size, rng: &mut R) -> Self {
        let stars = (0..count)
            .map(|_| {
                let base_alpha = 70 + rng.gen_range(0..170u8);
                BackgroundStar {
                    position: Point::new(
                        (rng.r#gen::<f64>() - 0.5) * world.width,
                        (rng.r#gen::<f64>() - 0.5) * world.height,
                    ),
                    velocity: Vec2::new((rng.r#gen::<f64>() - 0.5) * 5.0, (rng.r#gen::<f64>() - 0.5) * 5.0),
                    radius: 1.0 + rng.r#gen::<f64>() * 2.0,
                    base_alpha,
                    twinkle_phase: rng.r#gen::<f64>() * 10.0,
                    alpha: base_alpha,
                }
            })
            .collect();
        Self { stars, world }
    }

    pub fn stars(&self) -> &[BackgroundStar] {
        &self.stars
    }

    /// Drift by `dt` seconds, wrap at the world edge and twinkle at time `t`.
    pub fn update(&mut self, dt: f64, t: f64) {
        let half_w = self.world.width * 0.5;
        let half_h = self.world.height * 0.5;
        for star in &mut self.stars {
            star.position += star.velocity * dt;
            if star.position.x < -half_w {
                star.position.x = half_w;
            } else if star.position.x > half_w {
                star.position.x = -half_w;
            }
            if star.position.y < -half_h {
                star.position.y = half_h;
            } else if star.position.y > half_h {
                star.position.y = -half_h;
            }
            let twinkle = 0.5 + 0.5 * (t * 0.9 + star.twinkle_phase).sin();
            star.alpha = (star.base_alpha as f64 * (0.55 + 0.45 * twinkle)).clamp(30.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field() -> Starfield {
        Starfield::new(170, Size::new(2200.0, 3800.0), &mut StdRng::seed_from_u64(9))
    }

    #[test]
    fn test_seeded_within_world() {
        let field = field();
        assert_eq!(field.stars().len(), 170);
        for star in field.stars() {
            assert!(star.position.x.abs() <= 1100.0 && star.position.y.abs() <= 1900.0);
            assert!((70..240).contains(&star.base_alpha));
            assert!(star.radius >= 1.0 && star.radius < 3.0);
        }
    }

    #[test]
    fn test_twinkle_alpha_range() {
        let mut field = field();
        for i in 0..100 {
            field.update(0.016, i as f64 * 0.37);
            for star in field.stars() {
                assert!(star.alpha >= 30 && star.alpha <= star.base_alpha);
            }
        }
    }

    #[test]
    fn test_wraps_at_edges() {
        let mut field = field();
        // Ten thousand seconds of drift must never leave the world.
        for _ in 0..100 {
            field.update(100.0, 0.0);
        }
        for star in field.stars() {
            assert!(star.position.x.abs() <= 1100.0 + 1e-9);
            assert!(star.position.y.abs() <= 1900.0 + 1e-9);
        }
    }
}
