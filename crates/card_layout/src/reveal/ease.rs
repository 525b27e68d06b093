use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    /// Accelerating: `t^2`.
    InQuad,
    /// Decelerating: `1 - (1 - t)^2`.
    OutQuad,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Interpolates a scalar from `from` to `to` over `duration`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeTween {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    pub easing: Easing,
}

impl SizeTween {
    pub fn new(from: f32, to: f32, duration: Duration, easing: Easing) -> Self {
        Self { from, to, duration, easing }
    }

    pub fn progress(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value_at(&self, elapsed: Duration) -> f32 {
        let eased = self.easing.apply(self.progress(elapsed));
        self.from + (self.to - self.from) * eased
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [Easing::Linear, Easing::InQuad, Easing::OutQuad] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
    }

    #[test]
    fn quad_curves_bend_opposite_ways() {
        assert_eq!(Easing::InQuad.apply(0.5), 0.25);
        assert_eq!(Easing::OutQuad.apply(0.5), 0.75);
    }

    #[test]
    fn tween_holds_final_value() {
        let tween = SizeTween::new(200.0, 280.0, Duration::from_millis(800), Easing::InQuad);
        assert_eq!(tween.value_at(Duration::ZERO), 200.0);
        assert_eq!(tween.value_at(Duration::from_millis(400)), 220.0);
        assert_eq!(tween.value_at(Duration::from_secs(5)), 280.0);
        assert!(tween.is_finished(Duration::from_millis(800)));
    }

    #[test]
    fn zero_length_tween_jumps() {
        let tween = SizeTween::new(1.0, 2.0, Duration::ZERO, Easing::Linear);
        assert_eq!(tween.value_at(Duration::ZERO), 2.0);
    }
}
