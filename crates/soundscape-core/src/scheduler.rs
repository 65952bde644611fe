use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Wind nodes not built yet; ticks are skipped.
    Idle,
    Active,
}

/// What a single control tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped,
    Applied,
}

/// Fixed-cadence control clock.
///
/// The driver reports elapsed wall time through `advance`; the scheduler
/// answers how many ticks are due. Once active it stays active.
#[derive(Clone, Debug)]
pub struct ControlScheduler {
    state: SchedulerState,
    period: Duration,
    max_catch_up: u32,
    accum: Duration,
    ticks: u64,
}

impl ControlScheduler {
    pub fn new(period: Duration, max_catch_up: u32) -> Self {
        Self {
            state: SchedulerState::Idle,
            period,
            max_catch_up: max_catch_up.max(1),
            accum: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn activate(&mut self) {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Active;
            self.accum = Duration::ZERO;
            log::info!("[scheduler] active, period={}ms", self.period.as_millis());
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == SchedulerState::Active
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks run since activation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks += 1;
    }

    /// Accumulate `dt` and return the number of ticks now due.
    ///
    /// Nothing accumulates while idle. After a long stall at most
    /// `max_catch_up` ticks are reported and the remaining whole periods are
    /// dropped; the sub-period remainder is kept.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.is_active() || self.period.is_zero() {
            return 0;
        }
        self.accum += dt;
        let mut due = 0;
        while self.accum >= self.period && due < self.max_catch_up {
            self.accum -= self.period;
            due += 1;
        }
        if self.accum >= self.period {
            let dropped = self.accum.as_nanos() / self.period.as_nanos();
            log::debug!("[scheduler] dropped {} late ticks", dropped);
            let rem = self.accum.as_nanos() % self.period.as_nanos();
            self.accum = Duration::from_nanos(rem as u64);
        }
        due
    }
}
