use glam::Vec3;

/// Mix two words with the Tiny Encryption Algorithm. Cheap, stateless, and
/// well distributed enough to decorrelate per-pixel sample sequences.
pub fn tea_mix(mut v0: u32, mut v1: u32) -> u32 {
    let mut sum = 0u32;
    for _ in 0..8 {
        sum = sum.wrapping_add(0x9E37_79B9);
        v0 = v0.wrapping_add(
            (v1 << 4).wrapping_add(0xA341_316C)
                ^ v1.wrapping_add(sum)
                ^ (v1 >> 5).wrapping_add(0xC801_3EA4),
        );
        v1 = v1.wrapping_add(
            (v0 << 4).wrapping_add(0xAD90_777D)
                ^ v0.wrapping_add(sum)
                ^ (v0 >> 5).wrapping_add(0x7E95_761E),
        );
    }
    v0
}

/// Per-pixel sample stream, seeded from the pixel index and the frame seed.
pub struct PixelRng {
    state: u32,
}

impl PixelRng {
    pub fn new(pixel_index: u32, frame_seed: u32) -> Self {
        Self {
            state: tea_mix(pixel_index, frame_seed),
        }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        // LCG step; the TEA seed carries the quality.
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Random pair for sample `i` of `total`, with the first coordinate
    /// stratified into the sample's sub-interval `[i/total, (i+1)/total)`.
    pub fn stratified_pair(&mut self, i: u32, total: u32) -> (f32, f32) {
        let width = 1.0 / total as f32;
        let u1 = (i as f32 + self.next_f32()) * width;
        (u1.min(0.999_999), self.next_f32())
    }
}

/// Orthonormal basis around `n` (assumed unit length).
#[inline]
fn basis_around(n: Vec3) -> (Vec3, Vec3) {
    let tangent = if n.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
    let b1 = n.cross(tangent).normalize();
    let b2 = n.cross(b1);
    (b1, b2)
}

/// Cosine-weighted direction in the hemisphere around `normal`.
pub fn cosine_weighted(normal: Vec3, u1: f32, u2: f32) -> Vec3 {
    let phi = std::f32::consts::TAU * u2;
    let r = u1.sqrt();
    let z = (1.0 - u1).max(0.0).sqrt();
    let (b1, b2) = basis_around(normal);
    (b1 * (r * phi.cos()) + b2 * (r * phi.sin()) + normal * z).normalize()
}
