//! Bridge Tests
//!
//! Exactly-once delivery and failure tagging across the compute/host
//! boundary.

use std::sync::Arc;
use std::time::Duration;

use stylize::bridge::spawn_host;
use stylize::neural::{InferenceInvoker, MockBackend, SessionCache, StyleRegistry};
use stylize::{ErrorKind, StyleError};

fn invoker(backend: MockBackend) -> Arc<InferenceInvoker> {
    let registry = Arc::new(StyleRegistry::with_defaults());
    let cache = Arc::new(SessionCache::new(registry, Arc::new(backend)));
    Arc::new(InferenceInvoker::new(cache))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_call_gets_its_own_reply() {
    let (client, _host) = spawn_host(invoker(MockBackend::new()), 2);
    let styles = ["candy", "mosaic", "udnie", "rain_princess"];

    let calls: Vec<_> = (0..32u32)
        .map(|i| {
            let client = client.clone();
            let style = styles[i as usize % styles.len()];
            tokio::spawn(async move {
                let value = i as f32 / 32.0;
                let output = client
                    .call_host_inference(style, vec![value; 6], 1, 3, 1, 2)
                    .await;
                (value, output)
            })
        })
        .collect();

    for call in calls {
        let (value, output) = call.await.unwrap();
        assert_eq!(output.unwrap(), vec![1.0 - value; 6]);
    }
}

#[tokio::test]
async fn test_output_length_matches_shape() {
    let (client, _host) = spawn_host(invoker(MockBackend::new()), 4);

    let output = client
        .call_host_inference("candy", vec![0.5; 3 * 4 * 5], 1, 3, 4, 5)
        .await
        .unwrap();

    assert_eq!(output.len(), 60);
}

#[tokio::test]
async fn test_failures_carry_host_kind() {
    let (client, _host) = spawn_host(
        invoker(MockBackend::new().failing_run("candy", "backend rejected input")),
        4,
    );

    let err = client
        .call_host_inference("candy", vec![0.0; 3], 1, 3, 1, 1)
        .await
        .unwrap_err();

    match err {
        StyleError::Bridge { kind, message } => {
            assert_eq!(kind, ErrorKind::InferenceRuntime);
            assert!(message.contains("backend rejected input"));
        }
        other => panic!("expected a bridge error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_dims_report_shape() {
    let (client, _host) = spawn_host(invoker(MockBackend::new()), 4);

    let err = client
        .call_host_inference("candy", Vec::new(), 1 << 16, 1 << 16, 1 << 16, 1 << 16)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Shape);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_stopped_host_reports_unavailable() {
    let (client, host) = spawn_host(invoker(MockBackend::new()), 4);

    host.abort();
    let _ = host.await;

    let err = client
        .call_host_inference("candy", vec![0.0; 3], 1, 3, 1, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostUnavailable);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_calls_in_flight_finish_after_clients_drop() {
    let (client, host) = spawn_host(
        invoker(MockBackend::new().with_run_delay("udnie", Duration::from_millis(100))),
        4,
    );

    let pending = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .call_host_inference("udnie", vec![0.25; 3], 1, 3, 1, 1)
                .await
        })
    };
    drop(client);

    assert_eq!(pending.await.unwrap().unwrap(), vec![0.75; 3]);
    host.await.unwrap();
}
