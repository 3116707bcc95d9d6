pub mod challenge;
pub mod dashboard;
pub mod loader;
pub mod migrate;
pub mod normalize;
pub mod rides;
pub mod route;
pub mod route_gpx;
pub mod stats;
pub mod weather;
