use glam::{Mat3, Vec3};

/// Per-frame camera arguments, as delivered by the camera provider.
///
/// `basis` is column-major: columns are the camera right, up, and backward
/// axes, so a camera-space direction maps to world space as
/// `right * d.x + up * d.y + back * d.z` with primary rays built at
/// `d.z = -1`. `fov_multiplier` is `tan(fov / 2) * 2 / texture_size`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraArgs {
    pub position: [f32; 3],
    pub basis: [[f32; 3]; 3],
    pub fov_multiplier: f32,
    /// Sub-pixel jitter in pixel units, applied to every primary ray.
    pub jitter: [f32; 2],
}

impl CameraArgs {
    /// Build camera args looking from `position` toward `target`, with the
    /// conventional world up. `fov_degrees` is the full vertical field of
    /// view; `texture_size` the square render-target side.
    pub fn look_at(position: Vec3, target: Vec3, fov_degrees: f32, texture_size: u32) -> Self {
        let back = (position - target).normalize();
        let world_up = if back.x.abs() < 1e-4 && back.z.abs() < 1e-4 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let right = world_up.cross(back).normalize();
        let up = back.cross(right);
        let fov_multiplier =
            (fov_degrees.to_radians() * 0.5).tan() * 2.0 / texture_size.max(1) as f32;
        Self {
            position: position.to_array(),
            basis: [right.to_array(), up.to_array(), back.to_array()],
            fov_multiplier,
            jitter: [0.0, 0.0],
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Basis as a matrix whose columns are the stored axes.
    #[inline]
    pub fn basis_matrix(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::from_array(self.basis[0]),
            Vec3::from_array(self.basis[1]),
            Vec3::from_array(self.basis[2]),
        )
    }
}
