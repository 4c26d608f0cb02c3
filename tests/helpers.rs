// Shared test helpers for mocking the data sources and starting the API.
//
// Every upstream (assessment, geolocation, home page) is served by one
// httptest server; the config points all three at it.

#![allow(dead_code)] // Each test file uses a different subset

use std::net::SocketAddr;
use std::path::Path;

use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use domain_grade::api::{serve, ApiState};
use domain_grade::{build_state, Config};

/// Config with every data source on `server` and the database in `dir`.
pub fn test_config(server: &Server, dir: &Path) -> Config {
    let addr = server.addr();
    Config {
        db_path: dir.join("domain_grade.db"),
        assessment_api: format!("http://{}/analyze", addr),
        geoip_api: format!("http://{}/json", addr),
        home_page_template: format!("http://{}/{{domain}}", addr),
        timeout_seconds: 5,
        ..Config::default()
    }
}

/// A finished assessment of `domain` with `(address, grade)` endpoints.
pub fn ready_report(domain: &str, endpoints: &[(&str, &str)]) -> Value {
    json!({
        "host": domain,
        "port": 443,
        "protocol": "http",
        "isPublic": false,
        "status": "READY",
        "endpoints": endpoints
            .iter()
            .map(|(address, grade)| json!({
                "ipAddress": address,
                "serverName": format!("server.{}", domain),
                "statusMessage": "Ready",
                "grade": grade,
                "hasWarnings": false,
                "isExceptional": false,
                "progress": 100,
                "duration": 60000,
                "delegation": 1
            }))
            .collect::<Vec<_>>()
    })
}

/// An assessment of `domain` that has not finished.
pub fn pending_report(domain: &str, status: &str, message: &str) -> Value {
    json!({
        "host": domain,
        "port": 443,
        "protocol": "http",
        "isPublic": false,
        "status": status,
        "statusMessage": message
    })
}

pub fn expect_assessment(server: &Server, domain: &str, report: Value, times: usize) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/analyze"),
            request::query(eq(format!("host={}", domain))),
        ])
        .times(times)
        .respond_with(json_encoded(report)),
    );
}

pub fn expect_geoip(server: &Server, address: &str, country: &str, owner: &str, times: usize) {
    server.expect(
        Expectation::matching(request::method_path("GET", eq(format!("/json/{}", address))))
            .times(times)
            .respond_with(json_encoded(json!({
                "status": "success",
                "country": country,
                "as": owner,
                "query": address
            }))),
    );
}

pub fn expect_home_page(server: &Server, domain: &str, title: &str, favicon: &str, times: usize) {
    let html = format!(
        "<html><head><title>{}</title><link rel=\"shortcut icon\" href=\"{}\"></head><body></body></html>",
        title, favicon
    );
    server.expect(
        Expectation::matching(request::method_path("GET", eq(format!("/{}", domain))))
            .times(times)
            .respond_with(
                status_code(200)
                    .append_header("Content-Type", "text/html")
                    .body(html),
            ),
    );
}

/// Builds the API state from `config` and serves it on an ephemeral port.
pub async fn spawn_api(config: &Config) -> (SocketAddr, ApiState) {
    let state = build_state(config).await.expect("Failed to build API state");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    let served = state.clone();
    tokio::spawn(async move {
        if let Err(e) = serve(listener, served).await {
            eprintln!("test API server stopped: {}", e);
        }
    });
    (addr, state)
}
