use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use half::f16;

use crate::element;

/// One input sphere, as delivered by the frame provider. Position is in
/// world coordinates (nanometers, world cube centered on the origin).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Atom {
    pub position: [f32; 3],
    /// Radius override in nanometers. Zero or negative selects the
    /// per-element covalent radius.
    pub radius: f32,
    /// Atomic number, 0..=118.
    pub element: u8,
}

impl Atom {
    pub fn new(position: [f32; 3], element: u8) -> Self {
        Self {
            position,
            radius: 0.0,
            element,
        }
    }

    /// Effective radius: explicit override, else the element table.
    #[inline]
    pub fn effective_radius(&self) -> f32 {
        if self.radius > 0.0 {
            self.radius
        } else {
            element::radius_nm(self.element)
        }
    }
}

/// Device-side atom record, 16 bytes. The center is world-relative (origin
/// translated to the world minimum corner) so traversal math runs on
/// small-magnitude coordinates; the radius is half precision.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct ConvertedAtom {
    pub center: [f32; 3],
    pub radius: f16,
    pub element: u16,
}

impl ConvertedAtom {
    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.center)
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        f32::from(self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_atom_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ConvertedAtom>(), 16);
    }

    #[test]
    fn radius_override_wins_over_element_table() {
        let a = Atom {
            position: [0.0; 3],
            radius: 0.5,
            element: 6,
        };
        assert_eq!(a.effective_radius(), 0.5);
        let b = Atom::new([0.0; 3], 6);
        assert!((b.effective_radius() - 0.076).abs() < 1e-6);
    }
}
