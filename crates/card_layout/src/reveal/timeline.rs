use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::ease::{Easing, SizeTween};
use super::placement::RevealPlacement;
use crate::compose::source::FALLBACK_DIMENSIONS;

pub const INITIAL_SIZE: f32 = 200.0;
pub const SHAKE_SIZE: f32 = 280.0;
pub const WAITING_SIZE: f32 = 320.0;
pub const MAX_SIZE: f32 = 400.0;

const GROW_DURATION: Duration = Duration::from_millis(800);
const WAIT_DURATION: Duration = Duration::from_millis(3000);
const MAX_SIZE_DURATION: Duration = Duration::from_millis(200);
const FLAP_OPEN_DURATION: Duration = Duration::from_millis(100);
const CARD_PEEK_DURATION: Duration = Duration::from_millis(80);

/// Card offset while it peeks out of the opened envelope.
pub const PEEK_OFFSET: f32 = -80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    /// Envelope grows while particles converge and the image is requested.
    Growing,
    /// Slow growth while the image is still outstanding.
    Waiting,
    MaxSize,
    FlapOpen,
    CardPeek,
    Result,
}

impl Stage {
    /// Fixed length of the stage; `None` for stages that end on an external
    /// event or never.
    pub fn duration(self) -> Option<Duration> {
        match self {
            Stage::Growing => Some(GROW_DURATION),
            Stage::MaxSize => Some(MAX_SIZE_DURATION),
            Stage::FlapOpen => Some(FLAP_OPEN_DURATION),
            Stage::CardPeek => Some(CARD_PEEK_DURATION),
            Stage::Idle | Stage::Waiting | Stage::Result => None,
        }
    }

    pub fn entry_effects(self) -> &'static [Effect] {
        match self {
            Stage::Growing => &[Effect::GlowOn, Effect::ParticlesStart, Effect::RequestImage],
            Stage::FlapOpen => &[Effect::ShakeStop, Effect::ParticlesStop, Effect::OpenFlap],
            Stage::CardPeek => &[Effect::ShowCard],
            Stage::Result => &[Effect::Confetti, Effect::PlaceCard, Effect::GlowOff],
            Stage::Idle | Stage::Waiting | Stage::MaxSize => &[],
        }
    }

    pub fn exit_effects(self) -> &'static [Effect] {
        match self {
            Stage::Growing => &[Effect::ShakeStart],
            _ => &[],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Growing => "growing",
            Stage::Waiting => "waiting",
            Stage::MaxSize => "max-size",
            Stage::FlapOpen => "flap-open",
            Stage::CardPeek => "card-peek",
            Stage::Result => "result",
        };
        f.pad(name)
    }
}

/// Side effects a presentation layer performs at stage boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    GlowOn,
    GlowOff,
    ParticlesStart,
    ParticlesStop,
    RequestImage,
    ShakeStart,
    ShakeStop,
    OpenFlap,
    ShowCard,
    PlaceCard,
    Confetti,
}

/// Identifies one reveal between `start` and its end or cancellation.
///
/// Image results are tagged with the run that requested them so a late answer
/// for a cancelled run cannot complete a newer one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub run: RunId,
    pub from: Stage,
    pub to: Stage,
    /// Scheduled boundary time, independent of how late `update` ran.
    pub at: Instant,
    /// Envelope size when the new stage begins.
    pub size: f32,
    pub effects: Vec<Effect>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ImageArrival {
    at: Instant,
    width: u32,
    height: u32,
    fallback: bool,
}

/// Drives the envelope reveal one stage at a time.
#[derive(Clone, Debug)]
pub struct Reveal {
    run: RunId,
    stage: Stage,
    stage_started: Instant,
    tween: Option<SizeTween>,
    image: Option<ImageArrival>,
    placement: Option<RevealPlacement>,
    shaking: bool,
    fully_out: bool,
}

impl Default for Reveal {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Reveal {
    pub fn new(now: Instant) -> Self {
        Self {
            run: RunId(0),
            stage: Stage::Idle,
            stage_started: now,
            tween: None,
            image: None,
            placement: None,
            shaking: false,
            fully_out: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The current or most recent run.
    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn is_shaking(&self) -> bool {
        self.shaking
    }

    pub fn placement(&self) -> Option<&RevealPlacement> {
        self.placement.as_ref()
    }

    pub fn used_fallback_image(&self) -> bool {
        self.image.is_some_and(|image| image.fallback)
    }

    /// Begins a new run from the idle stage. Any reveal in progress is
    /// cancelled first. The returned transition carries the run id that image
    /// results must be reported with.
    pub fn start(&mut self, now: Instant) -> Transition {
        if self.stage != Stage::Idle {
            self.cancel(now);
        }

        self.run = RunId(self.run.0 + 1);
        let tween = SizeTween::new(INITIAL_SIZE, SHAKE_SIZE, GROW_DURATION, Easing::InQuad);
        self.enter(Stage::Growing, now, Some(tween))
    }

    /// Stops the running reveal and returns to idle. Returns whether anything
    /// was running.
    pub fn cancel(&mut self, now: Instant) -> bool {
        let was_running = self.stage != Stage::Idle;
        if was_running {
            debug!("reveal {} cancelled during {}", self.run, self.stage);
        }
        let run = self.run;
        *self = Self::new(now);
        self.run = run;
        was_running
    }

    /// Records that the image requested by `run` is available. Ignored while
    /// idle, for any other run, or once an image has already arrived.
    pub fn image_ready(&mut self, run: RunId, now: Instant, width: u32, height: u32) {
        self.record_image(run, ImageArrival { at: now, width, height, fallback: false });
    }

    /// Records that generation failed for `run`; the reveal continues with a
    /// placeholder of [`FALLBACK_DIMENSIONS`].
    pub fn image_failed(&mut self, run: RunId, now: Instant) {
        let (width, height) = FALLBACK_DIMENSIONS;
        self.record_image(run, ImageArrival { at: now, width, height, fallback: true });
    }

    fn record_image(&mut self, run: RunId, arrival: ImageArrival) {
        if run != self.run {
            debug!("dropping image for stale reveal {run}, current is {}", self.run);
            return;
        }
        if self.stage == Stage::Idle {
            warn!("ignoring image arrival while no reveal is running");
            return;
        }
        if self.image.is_some() {
            return;
        }
        self.image = Some(arrival);
    }

    /// Advances through every stage boundary that has passed by `now`.
    pub fn update(&mut self, now: Instant) -> Vec<Transition> {
        let mut transitions = Vec::new();

        loop {
            let next = match self.stage {
                Stage::Idle | Stage::Result => None,
                Stage::Growing => {
                    let end = self.stage_started + GROW_DURATION;
                    (now >= end).then(|| {
                        let ready = self.image.is_some_and(|image| image.at <= end);
                        if ready {
                            (end, Stage::MaxSize, Some(self.max_size_tween(SHAKE_SIZE)))
                        } else {
                            let tween = SizeTween::new(
                                SHAKE_SIZE,
                                WAITING_SIZE,
                                WAIT_DURATION,
                                Easing::OutQuad,
                            );
                            (end, Stage::Waiting, Some(tween))
                        }
                    })
                },
                Stage::Waiting => match self.image {
                    Some(image) if image.at <= now => {
                        let at = image.at.max(self.stage_started);
                        let reached = self.size_in_stage(at);
                        Some((at, Stage::MaxSize, Some(self.max_size_tween(reached))))
                    },
                    _ => None,
                },
                Stage::MaxSize | Stage::FlapOpen | Stage::CardPeek => {
                    let duration = self.stage.duration().unwrap_or_default();
                    let end = self.stage_started + duration;
                    (now >= end).then(|| (end, self.following_stage(), None))
                },
            };

            let Some((at, stage, tween)) = next else {
                break;
            };
            transitions.push(self.enter(stage, at, tween));
        }

        transitions
    }

    /// Envelope size at `now` within the current stage.
    pub fn size_at(&self, now: Instant) -> f32 {
        match self.stage {
            Stage::Idle => INITIAL_SIZE,
            Stage::Growing | Stage::Waiting | Stage::MaxSize => self.size_in_stage(now),
            Stage::FlapOpen | Stage::CardPeek | Stage::Result => MAX_SIZE,
        }
    }

    /// Card offset relative to the envelope, when the card is visible.
    pub fn card_offset(&self) -> Option<f32> {
        match self.stage {
            Stage::CardPeek => Some(PEEK_OFFSET),
            Stage::Result => self.placement.map(|placement| placement.position(self.fully_out).1),
            _ => None,
        }
    }

    /// Flips between the normal and fully-out card positions on the result
    /// stage, returning the new `(envelope_y, card_offset)`.
    pub fn toggle_fully_out(&mut self) -> Option<(f32, f32)> {
        if self.stage != Stage::Result {
            return None;
        }
        let placement = self.placement?;
        self.fully_out = !self.fully_out;
        Some(placement.position(self.fully_out))
    }

    fn size_in_stage(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.stage_started);
        self.tween.map_or(INITIAL_SIZE, |tween| tween.value_at(elapsed))
    }

    fn max_size_tween(&self, from: f32) -> SizeTween {
        SizeTween::new(from, MAX_SIZE, MAX_SIZE_DURATION, Easing::InQuad)
    }

    fn following_stage(&self) -> Stage {
        match self.stage {
            Stage::Idle => Stage::Growing,
            Stage::Growing | Stage::Waiting => Stage::MaxSize,
            Stage::MaxSize => Stage::FlapOpen,
            Stage::FlapOpen => Stage::CardPeek,
            Stage::CardPeek | Stage::Result => Stage::Result,
        }
    }

    fn enter(&mut self, stage: Stage, at: Instant, tween: Option<SizeTween>) -> Transition {
        let from = self.stage;
        let mut effects = from.exit_effects().to_vec();
        effects.extend_from_slice(stage.entry_effects());

        for effect in &effects {
            match effect {
                Effect::ShakeStart => self.shaking = true,
                Effect::ShakeStop => self.shaking = false,
                _ => (),
            }
        }

        if stage == Stage::FlapOpen {
            let (width, height) = self
                .image
                .map_or(FALLBACK_DIMENSIONS, |image| (image.width, image.height));
            self.placement = Some(RevealPlacement::compute(width, height));
        }

        let size = match (tween, stage) {
            (Some(tween), _) => tween.from,
            (None, Stage::Idle) => INITIAL_SIZE,
            (None, _) => MAX_SIZE,
        };

        debug!("reveal stage {from} -> {stage} at size {size:.1}");
        self.stage = stage;
        self.stage_started = at;
        self.tween = tween;

        Transition { run: self.run, from, to: stage, at, size, effects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn stages(transitions: &[Transition]) -> Vec<Stage> {
        transitions.iter().map(|transition| transition.to).collect()
    }

    #[test]
    fn fast_image_skips_waiting() {
        let t0 = Instant::now();
        let mut reveal = Reveal::new(t0);
        let start = reveal.start(t0);
        assert_eq!(start.to, Stage::Growing);
        assert!(start.effects.contains(&Effect::RequestImage));

        reveal.image_ready(start.run, t0 + ms(300), 720, 1280);
        assert!(reveal.update(t0 + ms(799)).is_empty());

        let transitions = reveal.update(t0 + ms(800));
        assert_eq!(stages(&transitions), vec![Stage::MaxSize]);
        assert!(transitions[0].effects.contains(&Effect::ShakeStart));
        assert!(reveal.is_shaking());
        assert_eq!(reveal.size_at(t0 + ms(800)), SHAKE_SIZE);
    }

    #[test]
    fn slow_image_waits_and_resumes_from_reached_size() {
        let t0 = Instant::now();
        let mut reveal = Reveal::new(t0);
        let run = reveal.start(t0).run;

        assert_eq!(stages(&reveal.update(t0 + ms(900))), vec![Stage::Waiting]);
        // The wait never ends on its own.
        assert!(reveal.update(t0 + ms(10_000)).is_empty());
        assert_eq!(reveal.size_at(t0 + ms(10_000)), WAITING_SIZE);

        // Arrival halfway through the slow growth: 280 + 40 * 0.75.
        reveal.image_ready(run, t0 + ms(2300), 512, 512);
        let transitions = reveal.update(t0 + ms(2300));
        assert_eq!(stages(&transitions), vec![Stage::MaxSize]);
        assert_eq!(transitions[0].at, t0 + ms(2300));
        assert!((reveal.size_at(t0 + ms(2300)) - 310.0).abs() < 1e-3);
        assert_eq!(reveal.size_at(t0 + ms(2500)), MAX_SIZE);
    }

    #[test]
    fn late_update_replays_every_boundary_in_order() {
        let t0 = Instant::now();
        let mut reveal = Reveal::new(t0);
        let run = reveal.start(t0).run;
        reveal.image_ready(run, t0 + ms(100), 720, 1280);

        let transitions = reveal.update(t0 + ms(5000));
        assert_eq!(transitions[0].size, SHAKE_SIZE);
        assert_eq!(transitions[1].size, MAX_SIZE);
        assert_eq!(
            stages(&transitions),
            vec![Stage::MaxSize, Stage::FlapOpen, Stage::CardPeek, Stage::Result]
        );
        let times: Vec<Instant> = transitions.iter().map(|transition| transition.at).collect();
        assert_eq!(times, vec![t0 + ms(800), t0 + ms(1000), t0 + ms(1100), t0 + ms(1180)]);
        assert!(!reveal.is_shaking());
        assert!(transitions[3].effects.contains(&Effect::Confetti));
        assert!(reveal.update(t0 + ms(9000)).is_empty());
    }

    #[test]
    fn result_places_card_from_image_aspect() {
        let t0 = Instant::now();
        let mut reveal = Reveal::new(t0);
        let run = reveal.start(t0).run;
        reveal.image_ready(run, t0, 720, 1280);
        reveal.update(t0 + ms(2000));

        assert_eq!(reveal.stage(), Stage::Result);
        assert_eq!(reveal.card_offset(), Some(-646.0));

        assert_eq!(reveal.toggle_fully_out(), Some((620.0, -716.0)));
        assert_eq!(reveal.toggle_fully_out(), Some((550.0, -646.0)));
    }

    #[test]
    fn failed_generation_uses_fallback_dimensions() {
        let t0 = Instant::now();
        let mut reveal = Reveal::new(t0);
        let run = reveal.start(t0).run;
        reveal.update(t0 + ms(1000));
        reveal.image_failed(run, t0 + ms(1500));
        reveal.update(t0 + ms(3000));

        assert_eq!(reveal.stage(), Stage::Result);
        assert!(reveal.used_fallback_image());
        assert_eq!(reveal.placement(), Some(&RevealPlacement::compute(720, 1280)));
    }

    #[test]
    fn cancel_returns_to_idle_and_drops_image() {
        let t0 = Instant::now();
        let mut reveal = Reveal::new(t0);
        let run = reveal.start(t0).run;
        reveal.update(t0 + ms(900));

        assert!(reveal.cancel(t0 + ms(950)));
        assert_eq!(reveal.stage(), Stage::Idle);
        assert_eq!(reveal.size_at(t0 + ms(950)), INITIAL_SIZE);
        assert!(!reveal.cancel(t0 + ms(960)));

        // An image arriving while idle is ignored.
        reveal.image_ready(run, t0 + ms(1000), 100, 100);
        reveal.start(t0 + ms(1000));
        assert_eq!(stages(&reveal.update(t0 + ms(1800))), vec![Stage::Waiting]);
    }

    #[test]
    fn late_image_from_cancelled_run_does_not_finish_restart() {
        let t0 = Instant::now();
        let mut reveal = Reveal::new(t0);
        let first = reveal.start(t0).run;
        reveal.update(t0 + ms(900));
        reveal.cancel(t0 + ms(950));

        let second = reveal.start(t0 + ms(1000)).run;
        assert_ne!(first, second);
        assert_eq!(reveal.run(), second);

        // The first run's landscape image shows up after the restart.
        reveal.image_ready(first, t0 + ms(1100), 1280, 720);
        reveal.image_failed(first, t0 + ms(1150));
        assert!(reveal.update(t0 + ms(1100)).is_empty());
        assert_eq!(stages(&reveal.update(t0 + ms(1900))), vec![Stage::Waiting]);
        assert!(reveal.update(t0 + ms(5000)).is_empty());
        assert_eq!(reveal.stage(), Stage::Waiting);

        reveal.image_ready(second, t0 + ms(5000), 720, 1280);
        let transitions = reveal.update(t0 + ms(6000));
        assert!(transitions.iter().all(|transition| transition.run == second));
        assert_eq!(reveal.stage(), Stage::Result);
        assert!(!reveal.used_fallback_image());
        assert_eq!(reveal.placement(), Some(&RevealPlacement::compute(720, 1280)));
    }

    #[test]
    fn toggle_only_on_result() {
        let mut reveal = Reveal::default();
        assert_eq!(reveal.toggle_fully_out(), None);
        assert_eq!(reveal.card_offset(), None);
    }
}
