//! Animation playback driver
//!
//! Playback is cooperative and single-threaded. The driver never sleeps: it
//! asks a host [`Scheduler`] to call back after a delay, and the host hands the
//! [`TickToken`] back through [`AnimationDriver::fire`] when the delay expires.
//!
//! ```text
//! Idle --start--> Running --schedule--> Scheduled --fire--> Running --...
//!                    \--(static / single frame)--> Idle
//! ```
//!
//! Cancellation bumps the driver's generation, so a token issued before a
//! cancel can never advance the driver again even if the host still fires it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::{AnimationStep, Image, Map};

/// Delay used when an animation step does not carry its own.
pub const DEFAULT_STEP_DELAY_MS: u32 = 1000;

static NEXT_DRIVER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one scheduled tick of one driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken {
    driver: u64,
    generation: u64,
}

/// The host's timer primitive.
pub trait Scheduler {
    /// Arrange for `token` to be handed back to the driver after `delay_ms`.
    fn schedule(&mut self, token: TickToken, delay_ms: u32);
    /// Forget a previously scheduled token.
    fn cancel(&mut self, token: TickToken);
}

/// What the driver steps through.
#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    /// An image's step list; the driver draws `steps[tick].frame_index`
    Sequence { steps: Vec<AnimationStep>, frame_count: usize },
    /// A free-running counter shared by every layer of a map
    Ticker { delay_ms: Option<u32> },
}

impl Playback {
    pub fn for_image(image: &Image) -> Self {
        Playback::Sequence { steps: image.animation().to_vec(), frame_count: image.frames().len() }
    }

    pub fn for_map(map: &Map) -> Self {
        Playback::Ticker { delay_ms: map.animation_delay_ms() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Scheduled(TickToken),
    Running,
}

/// Selects which frame to draw on each tick and schedules the next one.
///
/// # Examples
///
/// ```
/// use tileview::animation::{AnimationDriver, ManualScheduler, Playback};
/// use tileview::models::AnimationStep;
///
/// let mut scheduler = ManualScheduler::new();
/// let mut driver = AnimationDriver::new(
///     Playback::Sequence {
///         steps: vec![AnimationStep::new(0, 100), AnimationStep::new(1, 50)],
///         frame_count: 2,
///     },
///     1000,
/// );
///
/// let mut drawn = Vec::new();
/// driver.start(&mut scheduler, |frame| drawn.push(frame));
/// for token in scheduler.advance(100) {
///     driver.fire(token, &mut scheduler, |frame| drawn.push(frame));
/// }
/// assert_eq!(drawn, vec![0, 1]);
/// ```
#[derive(Debug)]
pub struct AnimationDriver {
    playback: Playback,
    default_delay_ms: u32,
    id: u64,
    generation: u64,
    tick: i64,
    state: DriverState,
}

impl AnimationDriver {
    pub fn new(playback: Playback, default_delay_ms: u32) -> Self {
        Self {
            playback,
            default_delay_ms,
            id: NEXT_DRIVER_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            tick: -1,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Tick counter; `None` until the first tick has run.
    pub fn tick(&self) -> Option<usize> {
        usize::try_from(self.tick).ok()
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Reset to tick -1 and run the first tick immediately.
    pub fn start<S, F>(&mut self, scheduler: &mut S, draw: F)
    where
        S: Scheduler + ?Sized,
        F: FnMut(usize),
    {
        self.cancel(scheduler);
        self.tick = -1;
        self.run_tick(scheduler, draw);
    }

    /// Cancel any pending tick, swap in new playback, and start over.
    pub fn restart<S, F>(&mut self, playback: Playback, scheduler: &mut S, draw: F)
    where
        S: Scheduler + ?Sized,
        F: FnMut(usize),
    {
        tracing::debug!(driver = self.id, "restarting animation driver");
        self.cancel(scheduler);
        self.playback = playback;
        self.start(scheduler, draw);
    }

    /// Handle a token handed back by the scheduler.
    ///
    /// Returns `false` (and does nothing) when the token is stale.
    pub fn fire<S, F>(&mut self, token: TickToken, scheduler: &mut S, draw: F) -> bool
    where
        S: Scheduler + ?Sized,
        F: FnMut(usize),
    {
        if self.state != DriverState::Scheduled(token) {
            return false;
        }
        self.run_tick(scheduler, draw);
        true
    }

    /// Drop the pending tick, if any, and go idle.
    pub fn cancel<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let DriverState::Scheduled(token) = self.state {
            scheduler.cancel(token);
        }
        self.generation += 1;
        self.state = DriverState::Idle;
    }

    fn run_tick<S, F>(&mut self, scheduler: &mut S, mut draw: F)
    where
        S: Scheduler + ?Sized,
        F: FnMut(usize),
    {
        self.state = DriverState::Running;

        let next_delay = match &self.playback {
            Playback::Sequence { steps, frame_count } => {
                if steps.is_empty() {
                    draw(0);
                    None
                } else {
                    self.tick = (self.tick + 1) % steps.len() as i64;
                    let step = steps[self.tick as usize];
                    draw(step.frame_index);
                    if *frame_count > 1 {
                        Some(step.post_delay_ms.unwrap_or(self.default_delay_ms))
                    } else {
                        None
                    }
                }
            }
            Playback::Ticker { delay_ms } => {
                self.tick = self.tick.saturating_add(1);
                draw(self.tick as usize);
                *delay_ms
            }
        };

        match next_delay {
            Some(delay_ms) => {
                self.generation += 1;
                let token = TickToken { driver: self.id, generation: self.generation };
                scheduler.schedule(token, delay_ms);
                self.state = DriverState::Scheduled(token);
            }
            None => self.state = DriverState::Idle,
        }
    }
}

/// A virtual-clock scheduler for headless hosts and tests.
///
/// Nothing fires on its own; [`ManualScheduler::advance`] moves the clock and
/// returns the tokens that came due, earliest first.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    pending: Vec<(u64, TickToken)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Time at which the earliest pending token comes due.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.iter().map(|(due, _)| *due).min()
    }

    /// Advance the clock and drain every token due by the new time.
    pub fn advance(&mut self, ms: u64) -> Vec<TickToken> {
        self.now_ms += ms;
        let now = self.now_ms;
        let mut due: Vec<(u64, TickToken)> = Vec::new();
        self.pending.retain(|entry| {
            if entry.0 <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, token)| token).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, token: TickToken, delay_ms: u32) {
        self.pending.push((self.now_ms + delay_ms as u64, token));
    }

    fn cancel(&mut self, token: TickToken) {
        self.pending.retain(|(_, pending)| *pending != token);
    }
}
