pub mod collect;
pub mod consensus;
pub mod normalize;

pub use collect::collect_sources;
pub use consensus::{compare_sources, derive_consensus};
pub use normalize::normalize;
