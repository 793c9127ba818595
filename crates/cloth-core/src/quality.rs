/// Frame-budget controller for the simulation driver.
///
/// Tracks an exponential moving average of frame time. While the average is
/// over budget it drops one solver iteration per frame, then one substep;
/// after a run of comfortably fast frames it restores them in reverse order.
/// Changes only take effect between frames.
#[derive(Clone, Debug)]
pub struct AdaptiveQuality {
    /// Frame time budget in milliseconds.
    pub budget_ms: f32,
    pub min_substeps: u32,
    pub max_substeps: u32,
    pub min_iterations: u32,
    pub max_iterations: u32,
    pub enabled: bool,
    substeps: u32,
    iterations: u32,
    ema_ms: f32,
    /// Consecutive frames well under budget.
    headroom_frames: u32,
}

/// Frames of headroom before quality is raised again.
const RESTORE_AFTER: u32 = 30;
/// Smoothing factor of the frame-time average.
const EMA_ALPHA: f32 = 0.3;

impl AdaptiveQuality {
    pub fn new(max_substeps: u32, max_iterations: u32, budget_ms: f32) -> Self {
        Self {
            budget_ms,
            min_substeps: 1,
            max_substeps,
            min_iterations: 1,
            max_iterations,
            enabled: false,
            substeps: max_substeps,
            iterations: max_iterations,
            ema_ms: 0.0,
            headroom_frames: 0,
        }
    }

    /// Substeps for the next frame.
    pub fn substeps(&self) -> u32 {
        if self.enabled {
            self.substeps
        } else {
            self.max_substeps
        }
    }

    /// Solver iterations for the next frame.
    pub fn iterations(&self) -> u32 {
        if self.enabled {
            self.iterations
        } else {
            self.max_iterations
        }
    }

    pub fn average_ms(&self) -> f32 {
        self.ema_ms
    }

    /// Set full quality and go back to it immediately.
    pub fn set_limits(&mut self, max_substeps: u32, max_iterations: u32) {
        self.max_substeps = max_substeps.max(self.min_substeps);
        self.max_iterations = max_iterations.max(self.min_iterations);
        self.substeps = self.max_substeps;
        self.iterations = self.max_iterations;
        self.headroom_frames = 0;
    }

    /// Feed the measured time of the last frame.
    pub fn record(&mut self, frame_ms: f32) {
        if !self.enabled || !frame_ms.is_finite() {
            return;
        }
        self.ema_ms = self.ema_ms * (1.0 - EMA_ALPHA) + frame_ms * EMA_ALPHA;

        if self.ema_ms > self.budget_ms {
            self.headroom_frames = 0;
            if self.iterations > self.min_iterations {
                self.iterations -= 1;
            } else if self.substeps > self.min_substeps {
                self.substeps -= 1;
                self.iterations = self.max_iterations;
            } else {
                return;
            }
            tracing::debug!(
                substeps = self.substeps,
                iterations = self.iterations,
                average_ms = self.ema_ms,
                "quality reduced"
            );
        } else if self.ema_ms < self.budget_ms * 0.6 {
            self.headroom_frames += 1;
            if self.headroom_frames <= RESTORE_AFTER {
                return;
            }
            self.headroom_frames = 0;
            if self.iterations < self.max_iterations {
                self.iterations += 1;
            } else if self.substeps < self.max_substeps {
                self.substeps += 1;
                self.iterations = self.min_iterations;
            } else {
                return;
            }
            tracing::debug!(
                substeps = self.substeps,
                iterations = self.iterations,
                "quality restored"
            );
        } else {
            self.headroom_frames = self.headroom_frames.saturating_add(1).min(RESTORE_AFTER / 2);
        }
    }
}

/// What one `update` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    /// Wall time of the frame in milliseconds (0 where no clock is available).
    pub total_ms: f32,
    pub substeps: u32,
    /// Solver iterations per substep.
    pub iterations: u32,
    pub particle_count: u32,
    pub constraint_count: u32,
    /// Particle-primitive contacts, summed over substeps.
    pub contacts: u32,
    /// Particle pairs separated by self-collision, summed over substeps.
    pub self_contacts: u32,
    /// Distance constraints removed by tearing.
    pub torn: u32,
    /// Degenerate constraints and primitives skipped.
    pub degenerate_skipped: u32,
    /// The frame took longer than the configured budget.
    pub over_budget: bool,
}
