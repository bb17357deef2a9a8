//! Departure aggregation: filter decoded trip departures down to one
//! observed stop, window them to a look-ahead horizon, and split them by
//! direction.

use serde::Serialize;

use crate::decode::TripDeparture;

/// Look-ahead horizon in seconds. Departures at or beyond this are dropped.
pub const DEFAULT_HORIZON_SECS: i64 = 3600;

/// A departure prepared for display: route plus whole minutes from now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Departure {
    pub route_id: String,
    pub departs_in: i64,
}

/// Platform direction, encoded by the feed as a suffix on the stop id.
///
/// The feed marks the northbound platform with an `N` suffix and the
/// southbound one with `S` (e.g. `D19N` / `D19S`). Uptown means northbound
/// here; any suffix other than `N` lands downtown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Uptown,
    Downtown,
}

impl Direction {
    fn of_stop(stop_id: &str) -> Direction {
        if stop_id.ends_with('N') {
            Direction::Uptown
        } else {
            Direction::Downtown
        }
    }
}

/// Upcoming departures for one stop, split by direction and sorted
/// ascending by minutes-from-now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopEstimates {
    pub uptown: Vec<Departure>,
    pub downtown: Vec<Departure>,
}

impl StopEstimates {
    pub fn is_empty(&self) -> bool {
        self.uptown.is_empty() && self.downtown.is_empty()
    }
}

/// Builds [`StopEstimates`] from decoded trip departures.
///
/// A record is kept iff `stop_id` contains `target_stop_id` and its
/// departure lies within `[now, now + horizon_secs)`. The window check runs
/// on exact seconds; the stored `departs_in` is floor minutes and is purely
/// presentational. Sorting is stable, so equal-minute departures keep feed
/// order.
pub fn aggregate(
    records: &[TripDeparture],
    target_stop_id: &str,
    now: i64,
    horizon_secs: i64,
) -> StopEstimates {
    let mut estimates = StopEstimates::default();

    for record in records {
        if !record.stop_id.contains(target_stop_id) {
            continue;
        }

        let departs_in_secs = record.departure_epoch - now;
        if departs_in_secs < 0 || departs_in_secs >= horizon_secs {
            continue;
        }

        let departure = Departure {
            route_id: record.route_id.clone(),
            departs_in: departs_in_secs / 60,
        };

        match Direction::of_stop(&record.stop_id) {
            Direction::Uptown => estimates.uptown.push(departure),
            Direction::Downtown => estimates.downtown.push(departure),
        }
    }

    estimates.uptown.sort_by_key(|d| d.departs_in);
    estimates.downtown.sort_by_key(|d| d.departs_in);

    estimates
}
