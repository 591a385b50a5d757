//! Restart snapshots.
//!
//! A snapshot stores the physical time, the iteration count and the
//! evolving particle fields (position, velocity, density) of every
//! body. Setup-derived fields (mass, volume, reference configuration,
//! constraints) are not stored: a restore runs against a freshly
//! constructed setup and only overwrites what the run evolved. Pressure
//! is recomputed from the equation of state on the first step after
//! resuming, and the scheduler rebuilds the neighbor index before any
//! operator touches the restored state.
//!
//! The format is line-oriented text; float formatting relies on Rust's
//! round-trip-exact shortest representation, so a restored run resumes
//! bit-identically.

use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use spume_body::{BodyStore, Vec2};

use crate::error::RestartError;

/// The scalar header of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestartHeader {
    /// Physical time at which the snapshot was taken.
    pub physical_time: f64,
    /// Acoustic iteration count at the snapshot.
    pub iteration: u64,
}

/// Write a snapshot of `bodies` at `header` to `sink`.
pub fn write_snapshot<W: Write>(
    mut sink: W,
    header: RestartHeader,
    bodies: &BodyStore,
) -> Result<(), RestartError> {
    writeln!(sink, "time {}", header.physical_time)?;
    writeln!(sink, "iteration {}", header.iteration)?;
    writeln!(sink, "bodies {}", bodies.len())?;
    for (_, body) in bodies.iter() {
        let p = &body.particles;
        writeln!(sink, "body {} {}", p.len(), body.name)?;
        for i in 0..p.len() {
            writeln!(
                sink,
                "{} {} {} {} {}",
                p.position[i].x, p.position[i].y, p.velocity[i].x, p.velocity[i].y, p.density[i],
            )?;
        }
    }
    Ok(())
}

fn malformed(detail: impl Into<String>) -> RestartError {
    RestartError::MalformedSnapshot {
        detail: detail.into(),
    }
}

fn next_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<String, RestartError> {
    match lines.next() {
        Some(line) => Ok(line?),
        None => Err(malformed("unexpected end of snapshot")),
    }
}

fn parse_keyed<T: std::str::FromStr>(line: &str, key: &str) -> Result<T, RestartError> {
    let value = line
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| malformed(format!("expected '{key} <value>', got '{line}'")))?;
    value
        .parse()
        .map_err(|_| malformed(format!("unparseable {key} value '{value}'")))
}

/// Restore a snapshot from `source` into an already-configured store.
///
/// Bodies are matched by registration order and checked by name and
/// particle count; any disagreement means the snapshot was taken from
/// a different setup and is a [`RestartError::BodyMismatch`].
pub fn read_snapshot<R: BufRead>(
    source: R,
    bodies: &mut BodyStore,
) -> Result<RestartHeader, RestartError> {
    let mut lines = source.lines();

    let physical_time: f64 = parse_keyed(&next_line(&mut lines)?, "time")?;
    let iteration: u64 = parse_keyed(&next_line(&mut lines)?, "iteration")?;
    let body_count: usize = parse_keyed(&next_line(&mut lines)?, "bodies")?;
    if body_count != bodies.len() {
        return Err(RestartError::BodyMismatch {
            detail: format!(
                "snapshot has {body_count} bodies, setup has {}",
                bodies.len()
            ),
        });
    }

    let ids: Vec<_> = bodies.iter().map(|(id, _)| id).collect();
    for id in ids {
        let header = next_line(&mut lines)?;
        let rest = header
            .strip_prefix("body ")
            .ok_or_else(|| malformed(format!("expected 'body <n> <name>', got '{header}'")))?;
        let (count_str, name) = rest
            .split_once(' ')
            .ok_or_else(|| malformed(format!("expected 'body <n> <name>', got '{header}'")))?;
        let count: usize = count_str
            .parse()
            .map_err(|_| malformed(format!("unparseable particle count '{count_str}'")))?;

        let body = bodies.get_mut(id).ok_or_else(|| {
            malformed(format!("body {id} disappeared from store during restore"))
        })?;
        if body.name != name {
            return Err(RestartError::BodyMismatch {
                detail: format!("snapshot body '{name}' where setup has '{}'", body.name),
            });
        }
        if body.particles.len() != count {
            return Err(RestartError::BodyMismatch {
                detail: format!(
                    "body '{name}': snapshot has {count} particles, setup has {}",
                    body.particles.len()
                ),
            });
        }

        let p = &mut body.particles;
        for i in 0..count {
            let line = next_line(&mut lines)?;
            let mut fields = line.split(' ').map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| malformed(format!("unparseable particle field '{tok}'")))
            });
            let mut next = || -> Result<f64, RestartError> {
                match fields.next() {
                    Some(v) => v,
                    None => Err(malformed("short particle line")),
                }
            };
            p.position[i] = Vec2::new(next()?, next()?);
            p.velocity[i] = Vec2::new(next()?, next()?);
            p.density[i] = next()?;
        }
    }

    Ok(RestartHeader {
        physical_time,
        iteration,
    })
}

/// Directory-level restart management.
///
/// Snapshots are one file per restart cadence tick, named
/// `restart_<iteration>.txt` inside the configured directory.
#[derive(Clone, Debug)]
pub struct RestartIo {
    dir: PathBuf,
}

impl RestartIo {
    /// Restart storage rooted at `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, iteration: u64) -> PathBuf {
        self.dir.join(format!("restart_{iteration:08}.txt"))
    }

    /// Write one snapshot file.
    pub fn write(
        &self,
        header: RestartHeader,
        bodies: &BodyStore,
    ) -> Result<(), RestartError> {
        fs::create_dir_all(&self.dir)?;
        let file = fs::File::create(self.path_for(header.iteration))?;
        write_snapshot(BufWriter::new(file), header, bodies)
    }

    /// Restore the snapshot taken at `iteration`.
    pub fn restore(
        &self,
        iteration: u64,
        bodies: &mut BodyStore,
    ) -> Result<RestartHeader, RestartError> {
        let file = match fs::File::open(self.path_for(iteration)) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RestartError::SnapshotNotFound { iteration });
            }
            Err(e) => return Err(e.into()),
        };
        read_snapshot(BufReader::new(file), bodies)
    }
}
