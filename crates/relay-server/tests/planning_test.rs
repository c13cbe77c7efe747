//! Planning API integration tests against a running server.
//!
//! Run with: cargo test --test planning_test -- --ignored

use reqwest::Client;

fn base_url() -> String {
    std::env::var("RELAY_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[tokio::test]
#[ignore]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), "OK");
}

/// Endpoints 3 km apart never need a tower.
#[tokio::test]
#[ignore]
async fn test_direct_findpath() {
    let resp = Client::new()
        .get(format!("{}/v1/findpath", base_url()))
        .query(&[
            ("startLat", 25.3790),
            ("startLon", 49.5883),
            ("endLat", 25.3790),
            ("endLon", 49.6181),
        ])
        .send()
        .await
        .expect("Failed to request path");

    assert!(resp.status().is_success(), "Direct path should succeed");
    let plan: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(plan["strategy"], "direct");
    assert!(is_two_node_path(&plan));
}

fn is_two_node_path(plan: &serde_json::Value) -> bool {
    plan["path"].as_array().map(Vec::len) == Some(2)
}

#[tokio::test]
#[ignore]
async fn test_pop_backbone() {
    let destinations = serde_json::json!([
        {"latitude": 25.3713, "longitude": 49.5810},
        {"latitude": 25.3823, "longitude": 49.5922}
    ]);
    let resp = Client::new()
        .post(format!("{}/v1/pop", base_url()))
        .query(&[("popLat", "25.3790"), ("popLon", "49.5883"), ("topology", "tree")])
        .json(&destinations)
        .send()
        .await
        .expect("Failed to request backbone");

    assert!(resp.status().is_success());
    let report: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(report["stats"]["total_destinations"], 2);
    assert_eq!(report["stats"]["reachable_destinations"], 2);
}

#[tokio::test]
#[ignore]
async fn test_alhofuf_example() {
    let resp = Client::new()
        .get(format!("{}/v1/example/alhofuf", base_url()))
        .send()
        .await
        .expect("Failed to request example");

    assert!(resp.status().is_success());
    let report: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(report["stats"]["total_destinations"], 8);
    assert!(accounts_for_every_landmark(&report));
}

fn accounts_for_every_landmark(report: &serde_json::Value) -> bool {
    let paths = report["paths"].as_array().map(Vec::len).unwrap_or(0);
    let unreachable = report["unreachable"].as_array().map(Vec::len).unwrap_or(0);
    paths + unreachable == 8
}
