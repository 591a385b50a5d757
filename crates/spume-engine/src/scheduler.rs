//! The coupling scheduler: the multi-rate nested integration loop.
//!
//! Three nested levels for a pure-fluid run (output interval →
//! advection interval → acoustic sub-step), four for a coupled run
//! (plus the solid sub-cycle inside each acoustic step). The scheduler
//! owns the clock and the neighbor index; operators own the particle
//! physics. Every loop clamps its last sub-step against the remaining
//! parent budget, so sub-step sums reconstruct parent intervals
//! exactly and the clock never overshoots `end_time`.

use spume_body::BodyStore;
use spume_core::{SimulationClock, StepError};
use spume_dynamics::{Operator, StepEstimator};
use spume_index::{IndexError, NeighborIndex};
use spume_io::{RecordContext, RecordError, Recorder, RestartError, RestartHeader};

use crate::config::{ConfigError, SchedulerConfig, SolidCoupling, SolidStepPolicy};
use crate::metrics::RunMetrics;

/// Relative tolerance below which a remaining sub-step budget counts
/// as exhausted. Keeps float accumulation residue from spawning a
/// vanishingly small extra sub-step at the end of a loop.
const BUDGET_EPSILON: f64 = 1e-12;

// ── RunError ───────────────────────────────────────────────────────

/// Fatal errors from a scheduler run.
///
/// Everything here terminates the run: instability and operator
/// failures per the error policy, index errors because they indicate a
/// broken rebuild plan, recording and restart errors because silently
/// dropping output would invalidate the run's results.
#[derive(Debug)]
pub enum RunError {
    /// A step-size estimator or operator failed inside the loop.
    Step(StepError),
    /// A neighbor index rebuild failed.
    Index(IndexError),
    /// A recorder failed to write.
    Record(RecordError),
    /// Restart restore or snapshot write failed.
    Restart(RestartError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step(e) => write!(f, "integration failed: {e}"),
            Self::Index(e) => write!(f, "neighbor index rebuild failed: {e}"),
            Self::Record(e) => write!(f, "recording failed: {e}"),
            Self::Restart(e) => write!(f, "restart failed: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Step(e) => Some(e),
            Self::Index(e) => Some(e),
            Self::Record(e) => Some(e),
            Self::Restart(e) => Some(e),
        }
    }
}

impl From<StepError> for RunError {
    fn from(e: StepError) -> Self {
        Self::Step(e)
    }
}

impl From<IndexError> for RunError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

impl From<RecordError> for RunError {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

impl From<RestartError> for RunError {
    fn from(e: RestartError) -> Self {
        Self::Restart(e)
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn estimate(estimator: &dyn StepEstimator, bodies: &BodyStore) -> Result<f64, RunError> {
    estimator
        .estimate(bodies)
        .map_err(|reason| StepError::Instability {
            estimator: estimator.name().to_string(),
            reason,
        })
        .map_err(RunError::from)
}

fn run_ops(
    ops: &mut [Box<dyn Operator>],
    bodies: &mut BodyStore,
    index: &NeighborIndex,
    dt: f64,
) -> Result<(), RunError> {
    for op in ops {
        op.execute(bodies, index, dt)
            .map_err(|reason| StepError::OperatorFailed {
                name: op.name().to_string(),
                reason,
            })?;
    }
    Ok(())
}

fn run_recorders(
    recorders: &mut [Box<dyn Recorder>],
    clock: &SimulationClock,
    bodies: &BodyStore,
) -> Result<u64, RunError> {
    let ctx = RecordContext {
        time: clock.physical_time(),
        iteration: clock.iteration(),
        bodies,
    };
    for recorder in recorders.iter_mut() {
        recorder.record(&ctx)?;
    }
    Ok(recorders.len() as u64)
}

fn solid_subcycle(
    solid: &mut SolidCoupling,
    bodies: &mut BodyStore,
    index: &NeighborIndex,
    metrics: &mut RunMetrics,
    dt: f64,
) -> Result<(), RunError> {
    solid.bracket.initialize_displacement(bodies);

    let mut bound = estimate(solid.acoustic_estimator.as_ref(), bodies)?;
    let mut elapsed = 0.0;
    while dt - elapsed > BUDGET_EPSILON * dt {
        let dt_s = bound.min(dt - elapsed);
        run_ops(&mut solid.first_half, bodies, index, dt_s)?;
        run_ops(&mut solid.constraint, bodies, index, dt_s)?;
        run_ops(&mut solid.second_half, bodies, index, dt_s)?;
        elapsed += dt_s;
        metrics.solid_substeps += 1;
        metrics.last_solid_dt = dt_s;
        if solid.step_policy == SolidStepPolicy::ReEstimate && dt - elapsed > BUDGET_EPSILON * dt
        {
            bound = estimate(solid.acoustic_estimator.as_ref(), bodies)?;
        }
    }

    solid.bracket.update_averages(bodies, dt);
    Ok(())
}

// ── Scheduler ──────────────────────────────────────────────────────

/// Owns the clock, the neighbor index, and the run's bodies; drives
/// the nested integration loop to `end_time`.
pub struct Scheduler {
    config: SchedulerConfig,
    bodies: BodyStore,
    index: NeighborIndex,
    clock: SimulationClock,
    metrics: RunMetrics,
    index_built: bool,
}

impl Scheduler {
    /// Validate `config` against `bodies` and build a scheduler with
    /// the clock at zero.
    pub fn new(config: SchedulerConfig, bodies: BodyStore) -> Result<Self, ConfigError> {
        config.validate(&bodies)?;
        Ok(Self {
            config,
            bodies,
            index: NeighborIndex::new(),
            clock: SimulationClock::new(),
            metrics: RunMetrics::default(),
            index_built: false,
        })
    }

    /// Seed the run from the restart snapshot taken at `iteration`.
    ///
    /// Restores particle state, seeds the clock with the snapshot's
    /// physical time, and rebuilds the neighbor index so the first
    /// operator call never sees pre-restore neighbor lists. Fails
    /// before the loop starts if the snapshot is missing.
    pub fn restore(&mut self, iteration: u64) -> Result<(), RunError> {
        let io = self
            .config
            .restart
            .as_ref()
            .ok_or(RestartError::SnapshotNotFound { iteration })?;
        let header = io.restore(iteration, &mut self.bodies)?;
        self.clock = SimulationClock::from_restart(header.physical_time, header.iteration);
        self.rebuild_all()?;
        self.index_built = true;
        Ok(())
    }

    /// Run the integration loop until the clock reaches `end_time`.
    pub fn run(&mut self) -> Result<RunMetrics, RunError> {
        if !self.index_built {
            self.rebuild_all()?;
            self.index_built = true;
        }

        let end_time = self.config.end_time;
        while end_time - self.clock.physical_time() > BUDGET_EPSILON * end_time {
            let span = self
                .config
                .output_interval
                .min(end_time - self.clock.physical_time());
            self.advance_output_interval(span)?;
            self.metrics.output_intervals += 1;

            let Self {
                config,
                bodies,
                clock,
                metrics,
                ..
            } = self;
            metrics.output_records += run_recorders(&mut config.output_recorders, clock, bodies)?;
        }
        Ok(self.metrics.clone())
    }

    /// One output interval: advection intervals until `span` is
    /// consumed, each followed by an index refresh.
    fn advance_output_interval(&mut self, span: f64) -> Result<(), RunError> {
        let mut integration_time = 0.0;
        while span - integration_time > BUDGET_EPSILON * span {
            let advanced = self.advance_advection_interval(span - integration_time)?;
            integration_time += advanced;
            self.metrics.advection_intervals += 1;
            self.refresh_index()?;
        }
        Ok(())
    }

    /// One advection interval, clamped against `budget`. Returns the
    /// interval length actually covered.
    fn advance_advection_interval(&mut self, budget: f64) -> Result<f64, RunError> {
        run_ops(
            &mut self.config.fluid.prepare,
            &mut self.bodies,
            &self.index,
            0.0,
        )?;

        let bound = estimate(self.config.fluid.advection_estimator.as_ref(), &self.bodies)?;
        let dt_adv = bound.min(budget);
        self.metrics.last_advection_dt = dt_adv;

        run_ops(
            &mut self.config.fluid.update_density,
            &mut self.bodies,
            &self.index,
            0.0,
        )?;

        let mut relaxation_time = 0.0;
        while dt_adv - relaxation_time > BUDGET_EPSILON * dt_adv {
            let ac_bound = estimate(self.config.fluid.acoustic_estimator.as_ref(), &self.bodies)?;
            let dt_ac = ac_bound.min(dt_adv - relaxation_time);
            self.acoustic_step(dt_ac)?;
            relaxation_time += dt_ac;

            self.clock.advance(dt_ac);
            self.clock.count_iteration();
            self.metrics.acoustic_steps += 1;
            self.metrics.last_acoustic_dt = dt_ac;
            self.after_iteration()?;
        }
        Ok(dt_adv)
    }

    /// One acoustic sub-step: the fixed causal operator order, with
    /// the solid sub-cycle innermost for a coupled run.
    fn acoustic_step(&mut self, dt: f64) -> Result<(), RunError> {
        let Self {
            config,
            bodies,
            index,
            metrics,
            ..
        } = self;

        run_ops(&mut config.fluid.damping, bodies, index, dt)?;
        run_ops(&mut config.fluid.pressure_relaxation, bodies, index, dt)?;
        if let Some(solid) = config.solid.as_mut() {
            run_ops(&mut solid.force_transfer, bodies, index, dt)?;
        }
        run_ops(&mut config.fluid.density_relaxation, bodies, index, dt)?;
        if let Some(solid) = config.solid.as_mut() {
            solid_subcycle(solid, bodies, index, metrics, dt)?;
        }
        Ok(())
    }

    /// Iteration-cadence side channels: console diagnostics,
    /// observation recorders, restart snapshots.
    fn after_iteration(&mut self) -> Result<(), RunError> {
        let n = self.clock.iteration();

        if n % self.config.screen_output_interval == 0 {
            if self.config.solid.is_some() {
                println!(
                    "N={n} Time={:.9} Dt={:.6e} dt={:.6e} dt_s={:.6e}",
                    self.clock.physical_time(),
                    self.metrics.last_advection_dt,
                    self.metrics.last_acoustic_dt,
                    self.metrics.last_solid_dt,
                );
            } else {
                println!(
                    "N={n} Time={:.9} Dt={:.6e} dt={:.6e}",
                    self.clock.physical_time(),
                    self.metrics.last_advection_dt,
                    self.metrics.last_acoustic_dt,
                );
            }
        }

        if n % self.config.observation_sample_interval == 0 {
            let Self {
                config,
                bodies,
                clock,
                metrics,
                ..
            } = self;
            metrics.observation_records +=
                run_recorders(&mut config.observation_recorders, clock, bodies)?;
        }

        if n % self.config.restart_output_interval == 0 {
            if let Some(io) = &self.config.restart {
                io.write(
                    RestartHeader {
                        physical_time: self.clock.physical_time(),
                        iteration: n,
                    },
                    &self.bodies,
                )?;
                self.metrics.restart_writes += 1;
            }
        }
        Ok(())
    }

    /// Build cell grids for every body and lists for every relation.
    fn rebuild_all(&mut self) -> Result<(), RunError> {
        let Self {
            config,
            bodies,
            index,
            metrics,
            ..
        } = self;
        for (id, body) in bodies.iter() {
            index.rebuild_cell_index(id, body);
        }
        for (rid, relation) in &config.relations {
            index.rebuild_relation(*rid, relation, bodies)?;
        }
        metrics.index_rebuilds += 1;
        Ok(())
    }

    /// Refresh grids for moving bodies and every relation that
    /// references one, after an advection interval.
    fn refresh_index(&mut self) -> Result<(), RunError> {
        let Self {
            config,
            bodies,
            index,
            metrics,
            ..
        } = self;
        for &id in &config.moving_bodies {
            if let Some(body) = bodies.get(id) {
                index.rebuild_cell_index(id, body);
            }
        }
        for (rid, relation) in &config.relations {
            let touches_moving = relation
                .referenced_bodies()
                .any(|b| config.moving_bodies.contains(&b));
            if touches_moving {
                index.rebuild_relation(*rid, relation, bodies)?;
            }
        }
        metrics.index_rebuilds += 1;
        Ok(())
    }

    /// Current physical time.
    pub fn physical_time(&self) -> f64 {
        self.clock.physical_time()
    }

    /// Acoustic iterations taken so far (including restored ones).
    pub fn iteration(&self) -> u64 {
        self.clock.iteration()
    }

    /// The bodies, read-only.
    pub fn bodies(&self) -> &BodyStore {
        &self.bodies
    }

    /// The neighbor index, read-only.
    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    /// Run accounting so far.
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Consume the scheduler, returning the final bodies.
    pub fn into_bodies(self) -> BodyStore {
        self.bodies
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.clock.to_string())
            .field("bodies", &self.bodies.len())
            .field("index_built", &self.index_built)
            .finish()
    }
}
