#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod cache;
mod constants;
mod fetch;
mod interp;
mod parser;
mod providers;
mod registry;
mod table;
mod time;

pub mod cfg;
pub mod error;
pub mod names;
pub mod resolver;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::cfg::Config;
    pub use crate::error::Error;
    pub use crate::names::{NameTable, SatelliteInfo};
    pub use crate::resolver::{ResolvedPosition, Resolver};
    pub use crate::table::PositionTable;
    pub use crate::time::Step;
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}

// pub export
pub use error::Error;
