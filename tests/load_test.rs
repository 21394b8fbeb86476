//! Load testing for the edge proxy.

use std::time::{Duration, Instant};

mod common;

#[tokio::test]
async fn test_load_performance() {
    // 1. Setup Mock Backend
    let (backend_addr, mut requests) = common::start_mock_backend(r#"{"reply":"hi"}"#).await;

    // 2. Start Proxy
    let (proxy_addr, shutdown) = common::start_proxy(common::proxy_config(backend_addr)).await;

    // 3. Run Load Test
    let client = common::client();
    let num_requests = 200;
    let concurrency = 20;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for worker in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{}/chatbot/ask?worker={}", proxy_addr, worker);
        tasks.push(tokio::spawn(async move {
            let mut ok = 0;
            for _ in 0..(num_requests / concurrency) {
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() {
                        ok += 1;
                    }
                }
            }
            ok
        }));
    }

    let mut success_count = 0;
    for task in tasks {
        success_count += task.await.unwrap();
    }

    let duration = start.elapsed();
    println!("Load Test Results:");
    println!("Total Requests: {}", num_requests);
    println!("Successful Requests: {}", success_count);
    println!("Total Time: {:?}", duration);
    println!(
        "Requests per second: {:.2}",
        num_requests as f64 / duration.as_secs_f64()
    );

    assert_eq!(success_count, num_requests);

    // Every request reached the backend exactly once, prefix stripped.
    let mut seen = 0;
    while let Ok(Some(captured)) =
        tokio::time::timeout(Duration::from_millis(200), requests.recv()).await
    {
        assert!(captured.target.starts_with("/ask?worker="));
        seen += 1;
    }
    assert_eq!(seen, num_requests);

    shutdown.trigger();
}
