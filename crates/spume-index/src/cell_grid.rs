//! Spatial bucketing of one body's particles.

use smallvec::SmallVec;
use spume_body::Vec2;

/// Cell-linked list for one body.
///
/// Particles are bucketed into square cells whose edge length equals
/// the body's support radius, so a neighbor search at that radius only
/// needs to visit the 3×3 block of cells around a query point. Rebuilt
/// from scratch on every refresh; cost is linear in particle count.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGrid {
    cell_size: f64,
    min: Vec2,
    cols: usize,
    rows: usize,
    buckets: Vec<SmallVec<[u32; 8]>>,
}

impl CellGrid {
    /// Bucket `positions` into cells of edge `cell_size`.
    ///
    /// The grid bounds are derived from the positions themselves; an
    /// empty position set produces an empty single-cell grid.
    pub fn build(positions: &[Vec2], cell_size: f64) -> Self {
        debug_assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be finite and positive, got {cell_size}"
        );
        if positions.is_empty() {
            return Self {
                cell_size,
                min: Vec2::zeros(),
                cols: 1,
                rows: 1,
                buckets: vec![SmallVec::new()],
            };
        }

        let mut min = positions[0];
        let mut max = positions[0];
        for p in positions {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        let cols = ((max.x - min.x) / cell_size).floor() as usize + 1;
        let rows = ((max.y - min.y) / cell_size).floor() as usize + 1;
        let mut buckets = vec![SmallVec::new(); cols * rows];

        for (i, p) in positions.iter().enumerate() {
            let cx = (((p.x - min.x) / cell_size).floor() as usize).min(cols - 1);
            let cy = (((p.y - min.y) / cell_size).floor() as usize).min(rows - 1);
            buckets[cy * cols + cx].push(i as u32);
        }

        Self {
            cell_size,
            min,
            cols,
            rows,
            buckets,
        }
    }

    /// Candidate particle indices within `radius` of `pos`.
    ///
    /// Visits every cell overlapping the query disc's bounding square;
    /// callers must still apply the exact distance test.
    pub fn candidates_within(&self, pos: Vec2, radius: f64) -> Vec<u32> {
        let reach = (radius / self.cell_size).ceil() as i64;
        let cx = ((pos.x - self.min.x) / self.cell_size).floor() as i64;
        let cy = ((pos.y - self.min.y) / self.cell_size).floor() as i64;

        let mut out = Vec::new();
        for dy in -reach..=reach {
            let y = cy + dy;
            if y < 0 || y >= self.rows as i64 {
                continue;
            }
            for dx in -reach..=reach {
                let x = cx + dx;
                if x < 0 || x >= self.cols as i64 {
                    continue;
                }
                out.extend_from_slice(&self.buckets[y as usize * self.cols + x as usize]);
            }
        }
        out
    }

    /// Number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_positions_build_single_empty_cell() {
        let grid = CellGrid::build(&[], 0.1);
        assert_eq!(grid.cell_count(), 1);
        assert!(grid.candidates_within(Vec2::zeros(), 0.1).is_empty());
    }

    #[test]
    fn candidates_include_same_cell_particles() {
        let positions = vec![Vec2::new(0.0, 0.0), Vec2::new(0.05, 0.05)];
        let grid = CellGrid::build(&positions, 0.1);
        let c = grid.candidates_within(Vec2::new(0.02, 0.02), 0.1);
        assert!(c.contains(&0));
        assert!(c.contains(&1));
    }

    #[test]
    fn candidates_exclude_distant_cells() {
        let positions = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
        let grid = CellGrid::build(&positions, 0.1);
        let c = grid.candidates_within(Vec2::new(0.0, 0.0), 0.1);
        assert!(c.contains(&0));
        assert!(!c.contains(&1));
    }

    #[test]
    fn query_outside_bounds_is_safe() {
        let positions = vec![Vec2::new(0.0, 0.0)];
        let grid = CellGrid::build(&positions, 0.1);
        let c = grid.candidates_within(Vec2::new(-50.0, -50.0), 0.1);
        assert!(c.is_empty());
    }

    #[test]
    fn radius_larger_than_cell_reaches_further_cells() {
        // Particles two cells apart are still found when the search
        // radius spans multiple cells.
        let positions = vec![Vec2::new(0.0, 0.0), Vec2::new(0.25, 0.0)];
        let grid = CellGrid::build(&positions, 0.1);
        let c = grid.candidates_within(Vec2::new(0.0, 0.0), 0.3);
        assert!(c.contains(&1));
    }
}
