//! The p-stable projection family and the Hadamard preconditioning used by
//! the ACHash variant.

mod family;
pub mod hadamard;

pub use family::HashFamily;
