use chute::callbacks::{ActivityReport, Callbacks};
use chute::discovery::{DiscoveryRequest, DiscoveryResponse, Node};
use chute::CallbackTracker;
use std::sync::Arc;
use std::time::Duration;

fn request() -> DiscoveryRequest {
    DiscoveryRequest {
        node: Some(Node::new("app1")),
        ..DiscoveryRequest::default()
    }
}

#[test]
fn test_readiness_fires_once_under_contention() {
    let tracker = CallbackTracker::new();
    let readiness = tracker.readiness();
    let request = request();

    std::thread::scope(|s| {
        for i in 0..100 {
            let tracker = &tracker;
            let request = &request;
            s.spawn(move || {
                if i % 2 == 0 {
                    tracker.on_stream_request(i, request).unwrap();
                } else {
                    tracker.on_fetch_request(request).unwrap();
                }
            });
        }
    });

    assert!(readiness.is_ready());
    assert!(tracker.is_ready());
    assert_eq!(
        tracker.report(),
        ActivityReport {
            fetches: 50,
            requests: 50
        }
    );
}

#[test]
fn test_counters_match_interleaved_calls() {
    let tracker = CallbackTracker::new();
    let request = request();
    let response = DiscoveryResponse::default();

    std::thread::scope(|s| {
        for stream_id in 0..8 {
            let tracker = &tracker;
            let request = &request;
            let response = &response;
            s.spawn(move || {
                tracker.on_stream_open(stream_id, "secrets").unwrap();
                for _ in 0..25 {
                    tracker.on_stream_request(stream_id, request).unwrap();
                    tracker.on_stream_response(stream_id, request, response);
                }
                for _ in 0..10 {
                    tracker.on_fetch_request(request).unwrap();
                    tracker.on_fetch_response(request, response);
                }
                tracker.on_stream_closed(stream_id);
            });
        }

        // concurrent reports must always see a consistent pair
        for _ in 0..100 {
            let report = tracker.report();
            assert!(report.fetches <= 80);
            assert!(report.requests <= 200);
        }
    });

    assert_eq!(
        tracker.report(),
        ActivityReport {
            fetches: 80,
            requests: 200
        }
    );
}

#[test]
fn test_trackers_are_independent() {
    let first = CallbackTracker::new();
    let second = CallbackTracker::new();

    first.on_fetch_request(&request()).unwrap();

    assert!(first.is_ready());
    assert!(!second.is_ready());
    assert_eq!(second.report(), ActivityReport::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_readiness_wakes_waiter() {
    let tracker = Arc::new(CallbackTracker::new());
    let mut readiness = tracker.readiness();

    let frontend = Arc::clone(&tracker);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        frontend.on_stream_request(1, &request()).unwrap();
    });

    tokio::time::timeout(Duration::from_secs(5), readiness.wait())
        .await
        .expect("readiness timed out")
        .unwrap();
}
