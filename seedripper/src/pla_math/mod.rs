pub mod matrix;
pub mod rng;


pub use matrix::{generalized_inverse, nullspace, row_reduce, solve_affine, LinearSystem};
pub use rng::{advance_seed, Xoroshiro128Plus, XOROSHIRO_CONST};
