//! Per-element display data: covalent radius (nm) and CPK-style color.
//!
//! Indexed by atomic number; index 0 is the unknown/placeholder element.
//! Entries past einsteinium fall back to generic values, the same shape as
//! molecular viewers use for the exotic tail of the table.

/// Display parameters for one element.
#[derive(Copy, Clone, Debug)]
pub struct ElementData {
    pub symbol: &'static str,
    /// Single-bond covalent radius in nanometers.
    pub radius_nm: f32,
    /// Linear RGB display color.
    pub color: [f32; 3],
}

/// Radius substituted for atomic numbers without tabulated data.
pub const DEFAULT_RADIUS_NM: f32 = 0.160;

const DEFAULT_COLOR: [f32; 3] = [0.78, 0.47, 0.78];

pub const ELEMENT_COUNT: usize = 119;

const GRAY: [f32; 3] = [0.50, 0.50, 0.50];
const ORANGE: [f32; 3] = [1.00, 0.55, 0.15];
const SALMON: [f32; 3] = [0.95, 0.55, 0.45];

#[rustfmt::skip]
static ELEMENTS: [ElementData; ELEMENT_COUNT] = [
    ElementData { symbol: "X",  radius_nm: DEFAULT_RADIUS_NM, color: DEFAULT_COLOR },   // 0
    ElementData { symbol: "H",  radius_nm: 0.031, color: [0.90, 0.90, 0.90] },          // 1
    ElementData { symbol: "He", radius_nm: 0.028, color: [0.85, 1.00, 1.00] },
    ElementData { symbol: "Li", radius_nm: 0.128, color: [0.80, 0.50, 1.00] },
    ElementData { symbol: "Be", radius_nm: 0.096, color: [0.76, 1.00, 0.00] },
    ElementData { symbol: "B",  radius_nm: 0.084, color: [1.00, 0.71, 0.71] },
    ElementData { symbol: "C",  radius_nm: 0.076, color: [0.35, 0.35, 0.35] },          // 6
    ElementData { symbol: "N",  radius_nm: 0.071, color: [0.19, 0.31, 0.97] },
    ElementData { symbol: "O",  radius_nm: 0.066, color: [1.00, 0.05, 0.05] },
    ElementData { symbol: "F",  radius_nm: 0.057, color: [0.56, 0.88, 0.31] },
    ElementData { symbol: "Ne", radius_nm: 0.058, color: [0.70, 0.89, 0.96] },          // 10
    ElementData { symbol: "Na", radius_nm: 0.166, color: [0.67, 0.36, 0.95] },
    ElementData { symbol: "Mg", radius_nm: 0.141, color: [0.54, 1.00, 0.00] },
    ElementData { symbol: "Al", radius_nm: 0.121, color: [0.75, 0.65, 0.65] },
    ElementData { symbol: "Si", radius_nm: 0.111, color: [0.94, 0.78, 0.63] },          // 14
    ElementData { symbol: "P",  radius_nm: 0.107, color: ORANGE },
    ElementData { symbol: "S",  radius_nm: 0.105, color: [1.00, 1.00, 0.19] },
    ElementData { symbol: "Cl", radius_nm: 0.102, color: [0.12, 0.94, 0.12] },
    ElementData { symbol: "Ar", radius_nm: 0.106, color: [0.50, 0.82, 0.89] },
    ElementData { symbol: "K",  radius_nm: 0.203, color: [0.56, 0.25, 0.83] },
    ElementData { symbol: "Ca", radius_nm: 0.176, color: [0.24, 1.00, 0.00] },          // 20
    ElementData { symbol: "Sc", radius_nm: 0.170, color: [0.90, 0.90, 0.90] },
    ElementData { symbol: "Ti", radius_nm: 0.160, color: [0.75, 0.76, 0.78] },
    ElementData { symbol: "V",  radius_nm: 0.153, color: [0.65, 0.65, 0.67] },
    ElementData { symbol: "Cr", radius_nm: 0.139, color: [0.54, 0.60, 0.78] },
    ElementData { symbol: "Mn", radius_nm: 0.139, color: [0.61, 0.48, 0.78] },
    ElementData { symbol: "Fe", radius_nm: 0.132, color: [0.88, 0.40, 0.20] },          // 26
    ElementData { symbol: "Co", radius_nm: 0.126, color: [0.94, 0.56, 0.63] },
    ElementData { symbol: "Ni", radius_nm: 0.124, color: [0.31, 0.82, 0.31] },
    ElementData { symbol: "Cu", radius_nm: 0.132, color: [0.78, 0.50, 0.20] },
    ElementData { symbol: "Zn", radius_nm: 0.122, color: [0.49, 0.50, 0.69] },          // 30
    ElementData { symbol: "Ga", radius_nm: 0.122, color: [0.76, 0.56, 0.56] },
    ElementData { symbol: "Ge", radius_nm: 0.120, color: [0.40, 0.56, 0.56] },
    ElementData { symbol: "As", radius_nm: 0.119, color: [0.74, 0.50, 0.89] },
    ElementData { symbol: "Se", radius_nm: 0.120, color: [1.00, 0.63, 0.00] },
    ElementData { symbol: "Br", radius_nm: 0.120, color: [0.65, 0.16, 0.16] },
    ElementData { symbol: "Kr", radius_nm: 0.116, color: [0.36, 0.72, 0.82] },
    ElementData { symbol: "Rb", radius_nm: 0.220, color: [0.44, 0.18, 0.69] },
    ElementData { symbol: "Sr", radius_nm: 0.195, color: [0.00, 1.00, 0.00] },
    ElementData { symbol: "Y",  radius_nm: 0.190, color: [0.58, 1.00, 1.00] },
    ElementData { symbol: "Zr", radius_nm: 0.175, color: [0.58, 0.88, 0.88] },          // 40
    ElementData { symbol: "Nb", radius_nm: 0.164, color: [0.45, 0.76, 0.79] },
    ElementData { symbol: "Mo", radius_nm: 0.154, color: [0.33, 0.71, 0.71] },
    ElementData { symbol: "Tc", radius_nm: 0.147, color: [0.23, 0.62, 0.62] },
    ElementData { symbol: "Ru", radius_nm: 0.146, color: [0.14, 0.56, 0.56] },
    ElementData { symbol: "Rh", radius_nm: 0.142, color: [0.04, 0.49, 0.55] },
    ElementData { symbol: "Pd", radius_nm: 0.139, color: [0.00, 0.41, 0.52] },
    ElementData { symbol: "Ag", radius_nm: 0.145, color: [0.75, 0.75, 0.75] },
    ElementData { symbol: "Cd", radius_nm: 0.144, color: [1.00, 0.85, 0.56] },
    ElementData { symbol: "In", radius_nm: 0.142, color: [0.65, 0.46, 0.45] },
    ElementData { symbol: "Sn", radius_nm: 0.139, color: [0.40, 0.50, 0.50] },          // 50
    ElementData { symbol: "Sb", radius_nm: 0.139, color: [0.62, 0.39, 0.71] },
    ElementData { symbol: "Te", radius_nm: 0.138, color: [0.83, 0.48, 0.00] },
    ElementData { symbol: "I",  radius_nm: 0.139, color: [0.58, 0.00, 0.58] },
    ElementData { symbol: "Xe", radius_nm: 0.140, color: [0.26, 0.62, 0.69] },
    ElementData { symbol: "Cs", radius_nm: 0.244, color: [0.34, 0.09, 0.56] },
    ElementData { symbol: "Ba", radius_nm: 0.215, color: [0.00, 0.79, 0.00] },
    ElementData { symbol: "La", radius_nm: 0.207, color: [0.44, 0.83, 1.00] },
    ElementData { symbol: "Ce", radius_nm: 0.204, color: [1.00, 1.00, 0.78] },
    ElementData { symbol: "Pr", radius_nm: 0.203, color: [0.85, 1.00, 0.78] },
    ElementData { symbol: "Nd", radius_nm: 0.201, color: [0.78, 1.00, 0.78] },          // 60
    ElementData { symbol: "Pm", radius_nm: 0.199, color: [0.64, 1.00, 0.78] },
    ElementData { symbol: "Sm", radius_nm: 0.198, color: [0.56, 1.00, 0.78] },
    ElementData { symbol: "Eu", radius_nm: 0.198, color: [0.38, 1.00, 0.78] },
    ElementData { symbol: "Gd", radius_nm: 0.196, color: [0.27, 1.00, 0.78] },
    ElementData { symbol: "Tb", radius_nm: 0.194, color: [0.19, 1.00, 0.78] },
    ElementData { symbol: "Dy", radius_nm: 0.192, color: [0.12, 1.00, 0.78] },
    ElementData { symbol: "Ho", radius_nm: 0.192, color: [0.00, 1.00, 0.61] },
    ElementData { symbol: "Er", radius_nm: 0.189, color: [0.00, 0.90, 0.46] },
    ElementData { symbol: "Tm", radius_nm: 0.190, color: [0.00, 0.83, 0.32] },
    ElementData { symbol: "Yb", radius_nm: 0.187, color: [0.00, 0.75, 0.22] },          // 70
    ElementData { symbol: "Lu", radius_nm: 0.187, color: [0.00, 0.67, 0.14] },
    ElementData { symbol: "Hf", radius_nm: 0.175, color: [0.30, 0.76, 1.00] },
    ElementData { symbol: "Ta", radius_nm: 0.170, color: [0.30, 0.65, 1.00] },
    ElementData { symbol: "W",  radius_nm: 0.162, color: [0.13, 0.58, 0.84] },
    ElementData { symbol: "Re", radius_nm: 0.151, color: [0.15, 0.49, 0.67] },
    ElementData { symbol: "Os", radius_nm: 0.144, color: [0.15, 0.40, 0.59] },
    ElementData { symbol: "Ir", radius_nm: 0.141, color: [0.09, 0.33, 0.53] },
    ElementData { symbol: "Pt", radius_nm: 0.136, color: [0.82, 0.82, 0.88] },
    ElementData { symbol: "Au", radius_nm: 0.136, color: [1.00, 0.82, 0.14] },
    ElementData { symbol: "Hg", radius_nm: 0.132, color: [0.72, 0.72, 0.82] },          // 80
    ElementData { symbol: "Tl", radius_nm: 0.145, color: [0.65, 0.33, 0.30] },
    ElementData { symbol: "Pb", radius_nm: 0.146, color: [0.34, 0.35, 0.38] },
    ElementData { symbol: "Bi", radius_nm: 0.148, color: [0.62, 0.31, 0.71] },
    ElementData { symbol: "Po", radius_nm: 0.140, color: [0.67, 0.36, 0.00] },
    ElementData { symbol: "At", radius_nm: 0.150, color: [0.46, 0.31, 0.27] },
    ElementData { symbol: "Rn", radius_nm: 0.150, color: [0.26, 0.51, 0.59] },
    ElementData { symbol: "Fr", radius_nm: 0.260, color: [0.26, 0.00, 0.40] },
    ElementData { symbol: "Ra", radius_nm: 0.221, color: [0.00, 0.49, 0.00] },
    ElementData { symbol: "Ac", radius_nm: 0.215, color: [0.44, 0.67, 0.98] },
    ElementData { symbol: "Th", radius_nm: 0.206, color: [0.00, 0.73, 1.00] },          // 90
    ElementData { symbol: "Pa", radius_nm: 0.200, color: [0.00, 0.63, 1.00] },
    ElementData { symbol: "U",  radius_nm: 0.196, color: [0.00, 0.56, 1.00] },
    ElementData { symbol: "Np", radius_nm: 0.190, color: [0.00, 0.50, 1.00] },
    ElementData { symbol: "Pu", radius_nm: 0.187, color: [0.00, 0.42, 1.00] },
    ElementData { symbol: "Am", radius_nm: 0.180, color: [0.33, 0.36, 0.95] },
    ElementData { symbol: "Cm", radius_nm: 0.169, color: [0.47, 0.36, 0.89] },
    ElementData { symbol: "Bk", radius_nm: 0.168, color: [0.54, 0.31, 0.89] },
    ElementData { symbol: "Cf", radius_nm: 0.168, color: [0.63, 0.21, 0.83] },
    ElementData { symbol: "Es", radius_nm: 0.165, color: [0.70, 0.12, 0.83] },
    ElementData { symbol: "Fm", radius_nm: DEFAULT_RADIUS_NM, color: DEFAULT_COLOR },   // 100
    ElementData { symbol: "Md", radius_nm: DEFAULT_RADIUS_NM, color: DEFAULT_COLOR },
    ElementData { symbol: "No", radius_nm: DEFAULT_RADIUS_NM, color: DEFAULT_COLOR },
    ElementData { symbol: "Lr", radius_nm: DEFAULT_RADIUS_NM, color: DEFAULT_COLOR },
    ElementData { symbol: "Rf", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Db", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Sg", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Bh", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Hs", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Mt", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Ds", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },            // 110
    ElementData { symbol: "Rg", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Cn", radius_nm: DEFAULT_RADIUS_NM, color: GRAY },
    ElementData { symbol: "Nh", radius_nm: DEFAULT_RADIUS_NM, color: SALMON },
    ElementData { symbol: "Fl", radius_nm: DEFAULT_RADIUS_NM, color: SALMON },
    ElementData { symbol: "Mc", radius_nm: DEFAULT_RADIUS_NM, color: SALMON },
    ElementData { symbol: "Lv", radius_nm: DEFAULT_RADIUS_NM, color: SALMON },
    ElementData { symbol: "Ts", radius_nm: DEFAULT_RADIUS_NM, color: SALMON },
    ElementData { symbol: "Og", radius_nm: DEFAULT_RADIUS_NM, color: SALMON },          // 118
];

/// Look up display data by atomic number. Out-of-range numbers map to the
/// placeholder entry.
#[inline]
pub fn element(atomic_number: u8) -> &'static ElementData {
    ELEMENTS
        .get(atomic_number as usize)
        .unwrap_or(&ELEMENTS[0])
}

/// Covalent radius for an atomic number, in nanometers.
#[inline]
pub fn radius_nm(atomic_number: u8) -> f32 {
    element(atomic_number).radius_nm
}

/// Display color for an atomic number.
#[inline]
pub fn color(atomic_number: u8) -> [f32; 3] {
    element(atomic_number).color
}
