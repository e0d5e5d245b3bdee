pub mod backend;
pub mod detection;
pub mod git;
