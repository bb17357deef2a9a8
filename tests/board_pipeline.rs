//! End-to-end tests: prost-encoded feed bytes through decode, aggregation,
//! and the rotating board, plus the scheduler loop against a mock client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use prost::Message;
use tokio::sync::oneshot;

use departure_board::board::{self, BoardFrame, RotationBoard, Slide};
use departure_board::config::{Config, FeedGroup};
use departure_board::decode::decode_trip_departures;
use departure_board::departures::{Departure, aggregate};
use departure_board::fetch::HttpClient;
use departure_board::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use departure_board::gtfs_rt::{FeedEntity, FeedHeader, FeedMessage, TripDescriptor, TripUpdate};
use departure_board::render::Renderer;

fn encoded_feed(entries: &[(&str, &str, i64)]) -> Vec<u8> {
    let entity = entries
        .iter()
        .enumerate()
        .map(|(i, (stop_id, route_id, epoch))| FeedEntity {
            id: format!("e{i}"),
            is_deleted: None,
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    route_id: Some(route_id.to_string()),
                    ..Default::default()
                },
                stop_time_update: vec![StopTimeUpdate {
                    stop_id: Some(stop_id.to_string()),
                    departure: Some(StopTimeEvent {
                        time: Some(*epoch),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        })
        .collect();

    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1_700_000_000),
            incrementality: None,
            feed_version: None,
        },
        entity,
    }
    .encode_to_vec()
}

fn dep(route_id: &str, departs_in: i64) -> Departure {
    Departure {
        route_id: route_id.to_string(),
        departs_in,
    }
}

#[test]
fn test_bytes_to_board_pipeline() {
    const T0: i64 = 1_700_000_000;

    let bytes = encoded_feed(&[
        ("D19N", "F", T0 + 300),
        ("D19S", "M", T0 + 600),
        ("D19N", "F", T0 + 900),
        ("D19N", "B", T0 + 1500),
        ("D19N", "D", T0 + 2100),
        // Noise the aggregation must drop: other stop, departed, beyond horizon
        ("A15N", "A", T0 + 300),
        ("D19N", "F", T0 - 10),
        ("D19S", "M", T0 + 4000),
    ]);

    let records = decode_trip_departures(&bytes).expect("feed should decode");
    let estimates = aggregate(&records, "D19", T0, 3600);

    assert_eq!(
        estimates.uptown,
        vec![dep("F", 5), dep("F", 15), dep("B", 25), dep("D", 35)]
    );
    assert_eq!(estimates.downtown, vec![dep("M", 10)]);

    let mut board = RotationBoard::new(3);
    board.install(&estimates);

    // Uptown truncated to three slides; downtown's single slide never moves
    let mut seen = Vec::new();
    for _ in 0..4 {
        let frame = board.current_state();
        seen.push(frame.uptown.clone());
        assert_eq!(frame.downtown, Slide::Departure(dep("M", 10)));
        board.rotate();
    }

    assert_eq!(
        seen,
        vec![
            Slide::Departure(dep("F", 5)),
            Slide::Departure(dep("F", 15)),
            Slide::Departure(dep("B", 25)),
            Slide::Departure(dep("F", 5)),
        ]
    );
}

struct CannedClient {
    status: u16,
    body: Vec<u8>,
}

#[async_trait]
impl HttpClient for CannedClient {
    async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let resp = axum::http::Response::builder()
            .status(self.status)
            .body(self.body.clone())
            .unwrap();
        Ok(resp.into())
    }
}

#[derive(Clone)]
struct RecordingRenderer(Arc<Mutex<Vec<BoardFrame>>>);

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &BoardFrame) {
        self.0.lock().unwrap().push(frame.clone());
    }
}

fn test_config() -> Config {
    let mut config = Config::new(FeedGroup::Bdfm, "D19".to_string());
    config.refresh_interval = Duration::from_secs(30);
    config.rotate_interval = Duration::from_secs(10);
    config
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_installs_and_rotates() {
    // Offsets carry half a minute of slack so the wall clock moving during
    // the test cannot change the floored minutes.
    let now = Utc::now().timestamp();
    let bytes = encoded_feed(&[
        ("D19N", "F", now + 330),
        ("D19N", "M", now + 630),
        ("D19S", "B", now + 330),
    ]);

    let frames = Arc::new(Mutex::new(Vec::new()));
    let client = Arc::new(CannedClient {
        status: 200,
        body: bytes,
    });
    let (stop_tx, stop_rx) = oneshot::channel();

    let handle = tokio::spawn(board::run(
        test_config(),
        client,
        RecordingRenderer(frames.clone()),
        stop_rx,
    ));

    // Enough paused-clock time for the first refresh and two rotations
    tokio::time::sleep(Duration::from_secs(25)).await;
    stop_tx.send(()).unwrap();
    handle.await.unwrap();

    let frames = frames.lock().unwrap();
    assert!(!frames.is_empty());

    let uptown: Vec<&Slide> = frames.iter().map(|f| &f.uptown).collect();
    assert!(uptown.contains(&&Slide::Departure(dep("F", 5))));
    assert!(uptown.contains(&&Slide::Departure(dep("M", 10))));

    // Downtown has one real departure, so after the refresh every frame
    // shows it regardless of rotation
    let last = frames.last().unwrap();
    assert_eq!(last.downtown, Slide::Departure(dep("B", 5)));
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_survives_failing_feed() {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let client = Arc::new(CannedClient {
        status: 503,
        body: Vec::new(),
    });
    let (stop_tx, stop_rx) = oneshot::channel();

    let handle = tokio::spawn(board::run(
        test_config(),
        client,
        RecordingRenderer(frames.clone()),
        stop_rx,
    ));

    tokio::time::sleep(Duration::from_secs(25)).await;
    stop_tx.send(()).unwrap();
    handle.await.unwrap();

    // The loop kept ticking and every frame stayed on the placeholders
    let frames = frames.lock().unwrap();
    assert!(!frames.is_empty());
    for frame in frames.iter() {
        assert_eq!(frame.uptown, Slide::Empty);
        assert_eq!(frame.downtown, Slide::Empty);
    }
}
