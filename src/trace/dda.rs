use glam::{IVec3, Vec3};

/// Incremental ray walk through a uniform grid of edge `h`.
///
/// A value type: build one per traversal level, never heap-allocate. The
/// stored `t_next` values are absolute ray parameters (the caller's `t`
/// frame), so exit times compare directly against hit distances.
#[derive(Copy, Clone, Debug)]
pub struct Dda {
    cell: IVec3,
    step: IVec3,
    t_next: Vec3,
    t_delta: Vec3,
}

impl Dda {
    /// Start a walk at `point`, the ray position at parameter `t_start`.
    /// `point` is expressed in the grid's frame (its origin at cell zero's
    /// lower corner); `dir` must be normalized.
    pub fn new(point: Vec3, dir: Vec3, h: f32, t_start: f32) -> Self {
        let scaled = point / h;
        let cell = IVec3::new(
            scaled.x.floor() as i32,
            scaled.y.floor() as i32,
            scaled.z.floor() as i32,
        );
        let mut step = IVec3::ZERO;
        let mut t_next = Vec3::splat(f32::INFINITY);
        let mut t_delta = Vec3::splat(f32::INFINITY);
        for axis in 0..3 {
            let d = dir[axis];
            if d > 0.0 {
                step[axis] = 1;
                t_delta[axis] = h / d;
                t_next[axis] = t_start + ((cell[axis] + 1) as f32 * h - point[axis]) / d;
            } else if d < 0.0 {
                step[axis] = -1;
                t_delta[axis] = -h / d;
                t_next[axis] = t_start + (cell[axis] as f32 * h - point[axis]) / d;
            }
        }
        Self {
            cell,
            step,
            t_next,
            t_delta,
        }
    }

    #[inline]
    pub fn cell(&self) -> IVec3 {
        self.cell
    }

    /// Pull the current cell into `[min, max]`. Entry points computed on a
    /// box face can floor into the cell just past it.
    #[inline]
    pub fn clamp_cell(&mut self, min: IVec3, max: IVec3) {
        self.cell = self.cell.clamp(min, max);
    }

    /// Ray parameter at which the ray leaves the current cell.
    #[inline]
    pub fn exit_time(&self) -> f32 {
        self.t_next.min_element()
    }

    /// Advance to the neighbor cell across the nearest border.
    #[inline]
    pub fn advance(&mut self) {
        let axis = if self.t_next.x <= self.t_next.y {
            if self.t_next.x <= self.t_next.z {
                0
            } else {
                2
            }
        } else if self.t_next.y <= self.t_next.z {
            1
        } else {
            2
        };
        self.cell[axis] += self.step[axis];
        self.t_next[axis] += self.t_delta[axis];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_walk_steps_once_per_cell_edge() {
        let mut dda = Dda::new(Vec3::new(0.1, 0.5, 0.5), Vec3::X, 1.0, 0.0);
        assert_eq!(dda.cell(), IVec3::new(0, 0, 0));
        assert!((dda.exit_time() - 0.9).abs() < 1e-6);
        dda.advance();
        assert_eq!(dda.cell(), IVec3::new(1, 0, 0));
        assert!((dda.exit_time() - 1.9).abs() < 1e-6);
    }

    #[test]
    fn diagonal_walk_visits_cells_in_exit_order() {
        let mut dda = Dda::new(Vec3::new(0.25, 0.75, 0.5), Vec3::new(1.0, 0.0, 0.0).normalize(), 1.0, 0.0);
        dda.advance();
        assert_eq!(dda.cell(), IVec3::new(1, 0, 0));
    }

    #[test]
    fn t_offset_shifts_exit_times() {
        let dda = Dda::new(Vec3::splat(0.5), Vec3::Z, 0.25, 3.0);
        // Cell (2,2,2) of the 0.25 grid; next z border at 0.75 is 0.25 away.
        assert_eq!(dda.cell(), IVec3::splat(2));
        assert!((dda.exit_time() - 3.25).abs() < 1e-6);
    }

    #[test]
    fn negative_direction_on_a_border_steps_down_immediately() {
        let mut dda = Dda::new(Vec3::new(1.0, 0.5, 0.5), Vec3::NEG_X, 1.0, 0.0);
        assert_eq!(dda.cell().x, 1);
        assert!(dda.exit_time().abs() < 1e-6);
        dda.advance();
        assert_eq!(dda.cell().x, 0);
    }
}
