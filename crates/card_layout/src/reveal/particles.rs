use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const CONVERGE_COLORS: [[u8; 3]; 5] = [
    [0xf4, 0xd0, 0x3f],
    [0xff, 0xea, 0xa7],
    [0xfd, 0xcb, 0x6e],
    [0xff, 0xff, 0xff],
    [0xf3, 0x9c, 0x12],
];

pub const CONFETTI_COLORS: [[u8; 3]; 7] = [
    [0xf4, 0xd0, 0x3f],
    [0xe7, 0x4c, 0x3c],
    [0xff, 0x6b, 0x6b],
    [0xff, 0xea, 0xa7],
    [0xff, 0xff, 0xff],
    [0xc0, 0x39, 0x2b],
    [0xfd, 0xcb, 0x6e],
];

const INITIAL_INTERVAL_MS: f32 = 80.0;
const MIN_INTERVAL_MS: f32 = 30.0;
const INTERVAL_DECAY: f32 = 0.85;
const INITIAL_BATCH: f32 = 15.0;
const MAX_BATCH: f32 = 30.0;
const BATCH_GROWTH: f32 = 0.6;
const INITIAL_MIN_LIFETIME: f32 = 1.5;
const MIN_LIFETIME_FLOOR: f32 = 0.4;
const LIFETIME_DECAY: f32 = 0.94;
const LIFETIME_JITTER: f32 = 0.8;
const RING_INNER_RADIUS: f32 = 160.0;
const RING_WIDTH: f32 = 80.0;

/// A glowing dot travelling from its start offset to the envelope center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub start_x: f32,
    pub start_y: f32,
    pub size: f32,
    pub lifetime: Duration,
    pub color: [u8; 3],
    pub spawned_at: Instant,
}

impl Particle {
    pub fn is_alive(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.spawned_at) < self.lifetime
    }

    pub fn distance(&self) -> f32 {
        self.start_x.hypot(self.start_y)
    }
}

/// Spawns converging particles in ever faster, ever larger batches.
///
/// Batches are scheduled back to back; `poll` emits every batch whose time has
/// come, so a caller polling late still sees the full sequence.
#[derive(Debug)]
pub struct ConvergeSpawner<R: Rng = StdRng> {
    rng: R,
    interval_ms: f32,
    batch: f32,
    min_lifetime: f32,
    next_batch_at: Option<Instant>,
    live: Vec<Particle>,
}

impl ConvergeSpawner<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ConvergeSpawner<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            interval_ms: INITIAL_INTERVAL_MS,
            batch: INITIAL_BATCH,
            min_lifetime: INITIAL_MIN_LIFETIME,
            next_batch_at: None,
            live: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_batch_at.is_some()
    }

    /// Restarts the schedule; the first batch is due immediately.
    pub fn start(&mut self, now: Instant) {
        self.interval_ms = INITIAL_INTERVAL_MS;
        self.batch = INITIAL_BATCH;
        self.min_lifetime = INITIAL_MIN_LIFETIME;
        self.live.clear();
        self.next_batch_at = Some(now);
    }

    /// Cancels pending batches and removes every particle.
    pub fn stop(&mut self) {
        self.next_batch_at = None;
        self.live.clear();
    }

    /// Spawns all batches due by `now` and returns how many particles were
    /// created.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut spawned = 0;

        while let Some(due) = self.next_batch_at.filter(|due| *due <= now) {
            spawned += self.spawn_batch(due);
            self.accelerate();
            self.next_batch_at = Some(due + Duration::from_secs_f32(self.interval_ms / 1000.0));
        }

        self.live.retain(|particle| particle.is_alive(now));
        spawned
    }

    pub fn live(&self) -> &[Particle] {
        &self.live
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f32(self.interval_ms / 1000.0)
    }

    fn spawn_batch(&mut self, at: Instant) -> usize {
        let count = self.batch.ceil() as usize;
        for _ in 0..count {
            let particle = self.particle(at);
            self.live.push(particle);
        }
        count
    }

    fn particle(&mut self, at: Instant) -> Particle {
        let angle = self.rng.gen::<f32>() * TAU;
        let distance = RING_INNER_RADIUS + self.rng.gen::<f32>() * RING_WIDTH;
        let size = 2.0 + self.rng.gen::<f32>() * 4.0;
        let lifetime = self.min_lifetime + self.rng.gen::<f32>() * LIFETIME_JITTER;
        let color = *CONVERGE_COLORS.choose(&mut self.rng).unwrap_or(&CONVERGE_COLORS[0]);

        Particle {
            start_x: angle.cos() * distance,
            start_y: angle.sin() * distance,
            size,
            lifetime: Duration::from_secs_f32(lifetime),
            color,
            spawned_at: at,
        }
    }

    fn accelerate(&mut self) {
        if self.interval_ms > MIN_INTERVAL_MS {
            self.interval_ms *= INTERVAL_DECAY;
        }
        if self.batch < MAX_BATCH {
            self.batch += BATCH_GROWTH;
        }
        if self.min_lifetime > MIN_LIFETIME_FLOOR {
            self.min_lifetime *= LIFETIME_DECAY;
        }
    }
}

/// One confetti cannon shot fired when the card pops out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfettiBurst {
    pub delay: Duration,
    pub particle_count: u32,
    /// Spread of the cone in degrees.
    pub spread: f32,
    /// Launch point as fractions of the viewport.
    pub origin: (f32, f32),
    /// Launch direction in degrees, 90 being straight up.
    pub angle: f32,
    pub start_velocity: f32,
    pub gravity: f32,
    pub scalar: f32,
}

/// Center shot plus two side shots 100 ms later.
pub fn confetti_bursts() -> [ConfettiBurst; 3] {
    let side = |x: f32, angle: f32| ConfettiBurst {
        delay: Duration::from_millis(100),
        particle_count: 50,
        spread: 60.0,
        origin: (x, 0.5),
        angle,
        start_velocity: 50.0,
        gravity: 1.0,
        scalar: 1.0,
    };

    [
        ConfettiBurst {
            delay: Duration::ZERO,
            particle_count: 100,
            spread: 70.0,
            origin: (0.5, 0.4),
            angle: 90.0,
            start_velocity: 60.0,
            gravity: 0.8,
            scalar: 1.2,
        },
        side(0.3, 60.0),
        side(0.7, 120.0),
    ]
}
