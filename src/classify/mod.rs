pub mod active_matches;
pub mod assignment;
pub mod driver;
pub mod mate_pairs;
pub mod min_support;
