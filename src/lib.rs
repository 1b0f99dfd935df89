pub mod boundary;
pub mod comm;
pub mod config;
pub mod driver;
pub mod error;
pub mod halo;
pub mod logging;
pub mod model;
pub mod snapshot;
pub mod stencil;
