pub mod domain_name;
pub mod localization;
pub mod serp;
pub mod tracking;

pub use domain_name::*;
pub use localization::*;
pub use serp::*;
pub use tracking::*;
