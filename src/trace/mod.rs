pub mod ambient;
pub mod dda;
pub mod intersect;
pub mod primary;

pub use ambient::trace_ambient;
pub use dda::Dda;
pub use intersect::{test_cell, CellHit, NO_ATOM};
pub use primary::{trace_primary, Traced, FILL_BATCH};

#[cfg(test)]
mod tests;
