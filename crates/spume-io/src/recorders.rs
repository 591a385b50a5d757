//! Concrete recorders.
//!
//! All three are generic over `W: Write` so tests drive them with
//! `Vec<u8>` and production code with `BufWriter<File>`.

use std::io::Write;

use spume_body::{BodyStore, Vec2};
use spume_core::BodyId;

use crate::error::RecordError;
use crate::recorder::{RecordContext, Recorder};

fn lookup<'a>(bodies: &'a BodyStore, id: BodyId) -> Result<&'a spume_body::Body, RecordError> {
    bodies.get(id).ok_or(RecordError::MissingBody { body: id })
}

// ── Body states ────────────────────────────────────────────────────

/// Dumps the full particle state of every body as snapshot blocks.
///
/// Each sample begins with a `# t=<time> N=<iteration>` line followed
/// by one CSV row per particle. Meant for the coarse output-interval
/// cadence; writing it every acoustic step would dominate the run.
pub struct BodyStatesRecorder<W: Write> {
    sink: W,
    samples: u64,
}

impl<W: Write> BodyStatesRecorder<W> {
    /// A body-states recorder writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self { sink, samples: 0 }
    }

    /// Number of samples written so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Consume the recorder and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write + Send> Recorder for BodyStatesRecorder<W> {
    fn name(&self) -> &str {
        "body_states"
    }

    fn record(&mut self, ctx: &RecordContext<'_>) -> Result<(), RecordError> {
        writeln!(self.sink, "# t={} N={}", ctx.time, ctx.iteration)?;
        for (_, body) in ctx.bodies.iter() {
            let p = &body.particles;
            for i in 0..p.len() {
                writeln!(
                    self.sink,
                    "{},{},{},{},{},{},{},{}",
                    body.name,
                    i,
                    p.position[i].x,
                    p.position[i].y,
                    p.velocity[i].x,
                    p.velocity[i].y,
                    p.density[i],
                    p.pressure[i],
                )?;
            }
        }
        self.samples += 1;
        Ok(())
    }
}

// ── Observed particles ─────────────────────────────────────────────

/// Tracks the positions of selected particles of one body over time.
///
/// One line per probed particle per sample: `<time> <index> <x> <y>`.
/// This is how a run observes, say, the tip deflection of an elastic
/// gate without dumping whole bodies.
pub struct ObservedParticleRecorder<W: Write> {
    sink: W,
    body: BodyId,
    particles: Vec<usize>,
}

impl<W: Write> ObservedParticleRecorder<W> {
    /// Probe `particles` of `body`, appending lines to `sink`.
    pub fn new(sink: W, body: BodyId, particles: Vec<usize>) -> Self {
        Self {
            sink,
            body,
            particles,
        }
    }

    /// Consume the recorder and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write + Send> Recorder for ObservedParticleRecorder<W> {
    fn name(&self) -> &str {
        "observed_particles"
    }

    fn record(&mut self, ctx: &RecordContext<'_>) -> Result<(), RecordError> {
        let body = lookup(ctx.bodies, self.body)?;
        let p = &body.particles;
        for &i in &self.particles {
            let pos = *p
                .position
                .get(i)
                .ok_or(RecordError::ParticleOutOfRange {
                    body: self.body,
                    particle: i,
                })?;
            writeln!(self.sink, "{} {} {} {}", ctx.time, i, pos.x, pos.y)?;
        }
        Ok(())
    }
}

// ── Mechanical energy ──────────────────────────────────────────────

/// Records the total mechanical energy of one body.
///
/// `E = Σ_i (½ m_i |v_i|² − m_i g·x_i)`, one `<time> <energy>` line
/// per sample. A settling run shows this decaying toward a plateau;
/// the last value is also kept in memory so tests and steady-state
/// checks can read it without parsing the sink.
pub struct MechanicalEnergyRecorder<W: Write> {
    sink: W,
    body: BodyId,
    gravity: Vec2,
    last: Option<f64>,
}

impl<W: Write> MechanicalEnergyRecorder<W> {
    /// Energy recorder for `body` under `gravity`, writing to `sink`.
    pub fn new(sink: W, body: BodyId, gravity: Vec2) -> Self {
        Self {
            sink,
            body,
            gravity,
            last: None,
        }
    }

    /// The most recently recorded energy, if any sample was taken.
    pub fn last_value(&self) -> Option<f64> {
        self.last
    }

    /// Consume the recorder and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write + Send> Recorder for MechanicalEnergyRecorder<W> {
    fn name(&self) -> &str {
        "mechanical_energy"
    }

    fn record(&mut self, ctx: &RecordContext<'_>) -> Result<(), RecordError> {
        let body = lookup(ctx.bodies, self.body)?;
        let p = &body.particles;
        let mut energy = 0.0;
        for i in 0..p.len() {
            let kinetic = 0.5 * p.mass[i] * p.velocity[i].norm_squared();
            let potential = -p.mass[i] * self.gravity.dot(&p.position[i]);
            energy += kinetic + potential;
        }
        writeln!(self.sink, "{} {}", ctx.time, energy)?;
        self.last = Some(energy);
        Ok(())
    }
}
