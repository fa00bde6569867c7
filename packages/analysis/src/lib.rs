#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Joins the normalized source tables and derives the area metrics.
//!
//! - [`join`]: merges the four source tables on area code into an
//!   [`AreaTable`](area_map_area_models::AreaTable)
//! - [`metrics`]: group share, table statistics, and the membership mask
//! - [`session`]: loads the inputs once and caches the result until
//!   explicitly invalidated

pub mod join;
pub mod metrics;
pub mod session;

pub use join::{Joined, join};
pub use metrics::{compute_mask, compute_stats, match_count};
pub use session::{LoadedData, Session};
