use glam::Vec3;

use super::*;
use crate::atom::Atom;
use crate::config::RenderConfig;
use crate::device::Device;
use crate::error::fault;
use crate::grid::{prepare_atoms, FrameGrid, GridBuilder, GridLayout};

struct TestRng(u64);

impl TestRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

fn build(atoms: &[Atom], world_edge: f32) -> FrameGrid {
    let config = RenderConfig {
        world_edge_nm: world_edge,
        ..RenderConfig::default()
    };
    let layout = GridLayout::from_config(&config);
    let mut device = Device::new();
    device.begin_frame();
    let prepared = prepare_atoms(&mut device, &config, &layout, atoms).expect("prepare");
    GridBuilder::new()
        .build(&mut device, &config, layout, prepared)
        .expect("build")
}

/// World-space ray to the grid's world-relative frame.
fn to_relative(grid: &FrameGrid, origin: Vec3) -> Vec3 {
    origin - grid.layout.world_min()
}

/// Reference intersector: the near-root formula against every atom.
/// Returns the winner plus the runner-up distance, so callers can skip id
/// assertions on near-ties where float rounding may legitimately reorder.
fn brute_force(grid: &FrameGrid, origin_rel: Vec3, dir: Vec3) -> Option<(u32, f32, f32)> {
    let mut best: Option<(u32, f32)> = None;
    let mut second = f32::INFINITY;
    for (id, atom) in grid.atoms.iter().enumerate() {
        let oc = origin_rel - atom.center();
        let b = oc.dot(dir);
        let c = oc.dot(oc) - atom.radius() * atom.radius();
        let disc = b * b - c;
        if disc <= 0.0 {
            continue;
        }
        let t = -b - disc.sqrt();
        if t < 0.0 {
            continue;
        }
        match best {
            Some((_, bt)) if t >= bt => second = second.min(t),
            _ => {
                if let Some((_, bt)) = best {
                    second = second.min(bt);
                }
                best = Some((id as u32, t));
            }
        }
    }
    best.map(|(id, t)| (id, t, second))
}

#[test]
fn head_on_ray_hits_at_the_analytic_distance() {
    let grid = build(
        &[Atom {
            position: [0.0; 3],
            radius: 0.5,
            element: 6,
        }],
        8.0,
    );
    let origin = to_relative(&grid, Vec3::new(0.0, 0.0, 2.0));
    match trace_primary(&grid, origin, Vec3::NEG_Z, 200) {
        Traced::Hit(hit) => {
            assert_eq!(hit.atom_id, 0);
            assert!((hit.distance - 1.5).abs() < 1e-3, "distance {}", hit.distance);
        }
        other => panic!("expected hit, got {other:?}"),
    }
}

#[test]
fn ray_that_misses_everything_reports_miss() {
    let grid = build(
        &[Atom {
            position: [0.0; 3],
            radius: 0.3,
            element: 6,
        }],
        8.0,
    );
    let origin = to_relative(&grid, Vec3::new(2.0, 2.0, 2.0));
    assert!(matches!(
        trace_primary(&grid, origin, Vec3::NEG_Z, 200),
        Traced::Miss
    ));
}

#[test]
fn origin_inside_an_atom_is_a_miss() {
    // The near root is negative inside the sphere and the far root is
    // deliberately not returned.
    let grid = build(
        &[Atom {
            position: [0.0; 3],
            radius: 0.1,
            element: 6,
        }],
        8.0,
    );
    let origin = to_relative(&grid, Vec3::ZERO);
    assert!(matches!(
        trace_primary(&grid, origin, Vec3::NEG_Z, 200),
        Traced::Miss
    ));
}

#[test]
fn equidistant_atoms_resolve_to_the_smaller_id() {
    let atoms = [
        Atom {
            position: [-0.3, 0.0, 0.0],
            radius: 0.5,
            element: 6,
        },
        Atom {
            position: [0.3, 0.0, 0.0],
            radius: 0.5,
            element: 6,
        },
    ];
    let grid = build(&atoms, 8.0);
    let origin = to_relative(&grid, Vec3::new(0.0, 0.0, 2.0));
    match trace_primary(&grid, origin, Vec3::NEG_Z, 200) {
        Traced::Hit(hit) => {
            assert_eq!(hit.atom_id, 0);
            assert!((hit.distance - 1.6).abs() < 1e-3);
        }
        other => panic!("expected hit, got {other:?}"),
    }
}

#[test]
fn grazing_the_world_box_terminates_cleanly() {
    let grid = build(
        &[Atom {
            position: [0.0; 3],
            radius: 0.3,
            element: 6,
        }],
        8.0,
    );
    // Runs along the snapped bounding box's upper face.
    let origin = to_relative(&grid, Vec3::new(-5.0, 2.0, 0.0));
    assert!(matches!(
        trace_primary(&grid, origin, Vec3::X, 200),
        Traced::Miss
    ));
    // And a ray pointing away from the box entirely.
    let origin = to_relative(&grid, Vec3::new(0.0, 3.5, 0.0));
    assert!(matches!(
        trace_primary(&grid, origin, Vec3::Y, 200),
        Traced::Miss
    ));
}

#[test]
fn primary_matches_brute_force_on_random_scenes() {
    let mut rng = TestRng::new(0x51AB_33C0_19D4_77EE);
    for round in 0..3 {
        let count = 30 + (rng.next_u64() % 40) as usize;
        let atoms: Vec<Atom> = (0..count)
            .map(|_| Atom {
                position: [
                    (rng.next_f32() - 0.5) * 5.0,
                    (rng.next_f32() - 0.5) * 5.0,
                    (rng.next_f32() - 0.5) * 5.0,
                ],
                radius: 0.05 + rng.next_f32() * 0.3,
                element: 6,
            })
            .collect();
        let grid = build(&atoms, 8.0);
        for _ in 0..200 {
            let origin = to_relative(
                &grid,
                Vec3::new(
                    (rng.next_f32() - 0.5) * 7.0,
                    (rng.next_f32() - 0.5) * 7.0,
                    3.9,
                ),
            );
            let dir = (Vec3::new(
                rng.next_f32() - 0.5,
                rng.next_f32() - 0.5,
                -1.0 - rng.next_f32(),
            ))
            .normalize();
            let expected = brute_force(&grid, origin, dir);
            match (trace_primary(&grid, origin, dir, 200), expected) {
                (Traced::Hit(hit), Some((id, t, second))) => {
                    assert!(
                        (hit.distance - t).abs() < 1e-3,
                        "round {round}: distance {} vs {}",
                        hit.distance,
                        t
                    );
                    if second - t > 1e-4 {
                        assert_eq!(hit.atom_id, id);
                    }
                }
                (Traced::Miss, None) => {}
                (got, want) => panic!("round {round}: traced {got:?}, brute force {want:?}"),
            }
        }
    }
}

#[test]
fn ambient_ray_misses_when_nothing_is_within_the_cutoff() {
    let grid = build(
        &[
            Atom {
                position: [0.0; 3],
                radius: 0.2,
                element: 6,
            },
            Atom {
                position: [3.0, 0.0, 0.0],
                radius: 0.2,
                element: 6,
            },
        ],
        8.0,
    );
    // From just above atom 0's surface, pointing at atom 1: the gap is
    // larger than the cutoff.
    let origin = to_relative(&grid, Vec3::new(0.21, 0.0, 0.0));
    let cutoff = 1.0 + 0.25 * 3.0f32.sqrt();
    assert!(matches!(
        trace_ambient(&grid, origin, Vec3::X, cutoff, 200),
        Traced::Miss
    ));
}

#[test]
fn ambient_ray_reports_nearby_occluders() {
    let grid = build(
        &[
            Atom {
                position: [0.0; 3],
                radius: 0.2,
                element: 6,
            },
            Atom {
                position: [0.8, 0.0, 0.0],
                radius: 0.2,
                element: 6,
            },
        ],
        8.0,
    );
    let origin = to_relative(&grid, Vec3::new(0.205, 0.0, 0.0));
    let cutoff = 1.0 + 0.25 * 3.0f32.sqrt();
    match trace_ambient(&grid, origin, Vec3::X, cutoff, 200) {
        Traced::Hit(hit) => {
            assert_eq!(hit.atom_id, 1);
            assert!((hit.distance - 0.395).abs() < 2e-3);
        }
        other => panic!("expected occlusion, got {other:?}"),
    }
}

#[test]
fn exhausted_fault_counter_reports_the_loop_code() {
    let grid = build(
        &[Atom {
            position: [3.0, 3.0, 3.0],
            radius: 0.2,
            element: 6,
        }],
        8.0,
    );
    // A limit of 1 cannot even cross the snapped bounds.
    let origin = to_relative(&grid, Vec3::new(2.5, 2.5, -3.5));
    match trace_primary(&grid, origin, Vec3::Z, 1) {
        Traced::Fault(code) => {
            assert!(code == fault::FILL_LARGE || code == fault::OUTER_PRIMARY);
        }
        other => panic!("expected fault, got {other:?}"),
    }
}
