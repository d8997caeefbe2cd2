//! File collaborators around the numeric core.
//!
//! - decode one face image into a pixel vector (`raster`)
//! - assemble a training set from a directory (`database`)
//! - model JSON read/write (`model`)
//! - legacy binary `.mat` matrices (`mat`)

pub mod database;
pub mod mat;
pub mod model;
pub mod raster;

pub use database::*;
pub use mat::*;
pub use model::*;
pub use raster::*;
