//! Uniform bucket grid for neighbor queries between equally sized bodies.
use glam::Vec2;

/// Buckets body indices by cell so collision checks only visit nearby cells.
///
/// With a cell size of at least the interaction diameter, every interacting
/// pair lives in the same or an adjacent cell.
#[derive(Debug, Clone)]
pub struct NeighborGrid {
    origin: Vec2,
    cell_size: f32,
    grid_width: usize,
    grid_height: usize,
    cells: Vec<Vec<usize>>,
}

impl NeighborGrid {
    /// Builds a grid covering the bounding box of `points`.
    pub fn build(points: &[Vec2], cell_size: f32) -> Self {
        let cell_size = cell_size.max(f32::EPSILON);
        let (min, max) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        let (origin, extent) = if points.is_empty() || !min.is_finite() || !max.is_finite() {
            (Vec2::ZERO, Vec2::ZERO)
        } else {
            (min, max - min)
        };
        let grid_width = (extent.x / cell_size).floor() as usize + 1;
        let grid_height = (extent.y / cell_size).floor() as usize + 1;

        let mut grid = Self {
            origin,
            cell_size,
            grid_width,
            grid_height,
            cells: vec![Vec::new(); grid_width * grid_height],
        };
        for (i, p) in points.iter().enumerate() {
            let (gx, gy) = grid.point_to_grid(*p);
            let idx = grid.grid_index(gx, gy);
            grid.cells[idx].push(i);
        }
        grid
    }

    #[inline]
    fn grid_index(&self, x: usize, y: usize) -> usize {
        y * self.grid_width + x
    }

    #[inline]
    fn point_to_grid(&self, point: Vec2) -> (usize, usize) {
        let local = (point - self.origin) / self.cell_size;
        let x = (local.x.floor() as isize).clamp(0, self.grid_width as isize - 1) as usize;
        let y = (local.y.floor() as isize).clamp(0, self.grid_height as isize - 1) as usize;
        (x, y)
    }

    /// Calls `visit` with every index stored in the 3x3 block around `point`.
    pub fn for_each_near(&self, point: Vec2, mut visit: impl FnMut(usize)) {
        let (gx, gy) = self.point_to_grid(point);
        let start_x = gx.saturating_sub(1);
        let end_x = (gx + 2).min(self.grid_width);
        let start_y = gy.saturating_sub(1);
        let end_y = (gy + 2).min(self.grid_height);
        for y in start_y..end_y {
            for x in start_x..end_x {
                for &i in &self.cells[self.grid_index(x, y)] {
                    visit(i);
                }
            }
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.grid_width, self.grid_height)
    }
}
