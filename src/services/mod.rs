pub mod google_fetcher;
pub mod localization;
pub mod pacer;
pub mod rank_tracker;
pub mod scheduler;
pub mod serp_extractor;

pub use google_fetcher::*;
pub use localization::*;
pub use pacer::*;
pub use rank_tracker::*;
pub use scheduler::*;
pub use serp_extractor::*;
