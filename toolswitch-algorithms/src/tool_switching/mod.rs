pub mod hgs;
pub use hgs::solve_challenge;
