pub mod api;
pub mod board;
pub mod config;
pub mod decode;
pub mod departures;
pub mod error;
pub mod fetch;
pub mod render;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
