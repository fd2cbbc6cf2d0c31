pub mod pairwise;
pub mod ranking;

#[cfg(feature = "frontier")]
pub mod frontier;
