//! Protobuf decoding for GTFS Realtime feeds.

use prost::Message;

use crate::error::FeedError;
use crate::gtfs_rt::FeedMessage;

/// A scheduled departure flattened out of one (trip, stop) pair in the feed.
///
/// Rebuilt on every decode; nothing here outlives the refresh that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripDeparture {
    pub stop_id: String,
    pub route_id: String,
    pub departure_epoch: i64,
}

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] if the bytes are not valid protobuf for a
/// `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, FeedError> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Decodes raw feed bytes into flat [`TripDeparture`] records.
///
/// Only stop-time entries that carry a scheduled departure time are kept;
/// entries without one (and entities that are not trip updates) are skipped
/// silently.
pub fn decode_trip_departures(bytes: &[u8]) -> Result<Vec<TripDeparture>, FeedError> {
    let feed = parse_feed(bytes)?;

    let mut records = Vec::new();
    for entity in &feed.entity {
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };
        let route_id = trip_update.trip.route_id().to_string();

        for stop_time in &trip_update.stop_time_update {
            let Some(departure) = &stop_time.departure else {
                continue;
            };
            let Some(departure_epoch) = departure.time else {
                continue;
            };
            records.push(TripDeparture {
                stop_id: stop_time.stop_id().to_string(),
                route_id: route_id.clone(),
                departure_epoch,
            });
        }
    }

    Ok(records)
}
