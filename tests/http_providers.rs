//! End-to-end lookups through the reqwest fetcher against mock providers.

use find_my_ip::config::ProviderConfig;
use find_my_ip::fetcher::{Fetch, HttpFetcher, ProbeStatus};
use find_my_ip::providers::location::LocationSchema;
use find_my_ip::providers::security::SecuritySchema;
use find_my_ip::providers::ProviderError;
use find_my_ip::{Config, ErrorKind, FindMyIpAgent};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UA: &str = "find-my-ip-tests/1.0";

fn config_for(server: &MockServer) -> Config {
    let uri = server.uri();
    let mut config = Config::default();
    config.settings.timeout_ms = 300;
    config.settings.user_agent = UA.to_string();
    config.retry.backoff_unit_ms = 10;
    config.current_ip.endpoint = format!("{}/ipify?format=json", uri);
    config.location_providers = vec![
        ProviderConfig::new(
            "primary",
            &format!("{}/primary/{{ip}}", uri),
            LocationSchema::IpapiCo,
        ),
        ProviderConfig::new(
            "secondary",
            &format!("{}/secondary/{{ip}}", uri),
            LocationSchema::IpApiCom,
        ),
    ];
    config.security_providers = vec![
        ProviderConfig::new(
            "whois",
            &format!("{}/whois/{{ip}}", uri),
            SecuritySchema::Ipwhois,
        ),
        ProviderConfig::new(
            "ipapi",
            &format!("{}/ipapi/{{ip}}", uri),
            SecuritySchema::IpApiCom,
        ),
    ];
    config
}

#[tokio::test]
async fn location_falls_through_http_500_to_second_provider() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/primary/8.8.8.8"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"country_name": "Nowhere"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secondary/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "country": "United States",
            "city": "Mountain View",
            "lat": 37.4,
            "lon": -122.1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = FindMyIpAgent::new(config_for(&server)).unwrap();
    let result = agent.location("8.8.8.8").await;

    assert!(result.is_success());
    assert_eq!(result.provider_used(), Some("secondary"));
    let location = result.data().unwrap();
    assert_eq!(location.country.as_deref(), Some("United States"));
    assert_eq!(location.city.as_deref(), Some("Mountain View"));
    assert_eq!(location.latitude, Some(37.4));
    assert_eq!(location.longitude, Some(-122.1));
}

#[tokio::test]
async fn every_call_carries_client_marker() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", UA))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let agent = FindMyIpAgent::new(config_for(&server)).unwrap();
    let result = agent.location("1.1.1.1").await;
    assert_eq!(result.error_kind(), Some(ErrorKind::AllProvidersFailed));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert_eq!(
            request.headers.get("user-agent").and_then(|v| v.to_str().ok()),
            Some(UA)
        );
    }
}

#[tokio::test]
async fn non_json_body_is_malformed_and_advances() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whois/9.9.9.9"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>rate limited</html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ipapi/9.9.9.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "isp": "Quad9",
            "as": "AS19281 Quad9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = FindMyIpAgent::new(config_for(&server)).unwrap();
    let result = agent.security_info("9.9.9.9").await;

    assert_eq!(result.provider_used(), Some("ipapi"));
    let security = result.data().unwrap();
    assert_eq!(security.isp.as_deref(), Some("Quad9"));
    assert!(!security.is_proxy);
}

#[tokio::test]
async fn timeout_is_network_error_and_advances() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/primary/8.8.4.4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"country_name": "Too Late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secondary/8.8.4.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"country": "On Time"})))
        .mount(&server)
        .await;

    let agent = FindMyIpAgent::new(config_for(&server)).unwrap();
    let result = agent.location("8.8.4.4").await;

    assert_eq!(result.provider_used(), Some("secondary"));
    assert_eq!(result.data().unwrap().country.as_deref(), Some("On Time"));
}

#[tokio::test]
async fn fetcher_classifies_failures() {
    let server = MockServer::start().await;

    Mock::given(path("/status"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;
    Mock::given(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": "192.0.2.1"})))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(2), UA).unwrap();

    let err = fetcher
        .get_json(&format!("{}/status", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::HttpStatus { code: 404 }));

    let err = fetcher
        .get_json(&format!("{}/garbage", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::MalformedBody(_)));

    let body = fetcher
        .get_json(&format!("{}/ok", server.uri()))
        .await
        .unwrap();
    assert_eq!(body["ip"], "192.0.2.1");
}

#[tokio::test]
async fn current_ip_retries_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ipify"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ipify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": "203.0.113.9"})))
        .expect(1)
        .mount(&server)
        .await;

    let agent = FindMyIpAgent::new(config_for(&server)).unwrap();
    let result = agent.current_ip_with_retry(3).await;

    assert!(result.is_success());
    assert_eq!(result.provider_used(), Some("ipify"));
    assert_eq!(
        result.data().unwrap().ip_address.to_string(),
        "203.0.113.9"
    );
}

#[tokio::test]
async fn comprehensive_keeps_partial_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/primary/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "country_name": "United States",
            "latitude": 37.42,
            "longitude": -122.08
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/whois/8.8.8.8"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ipapi/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "fail",
            "message": "quota exceeded"
        })))
        .mount(&server)
        .await;

    let agent = FindMyIpAgent::new(config_for(&server)).unwrap();
    let result = agent.comprehensive_info("8.8.8.8").await;
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["location"]["country"], "United States");
    assert!(value["data"]["security"].is_null());
    assert_eq!(value["data"]["apis_used"]["location"], "primary");
    assert_eq!(value["data"]["apis_used"]["security"], "unknown");
    assert_eq!(value["data"]["degraded"], false);
}

#[tokio::test]
async fn probe_reports_status_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let agent = FindMyIpAgent::new(config_for(&server)).unwrap();
    let report = agent
        .probe(&format!("{}/health", server.uri()))
        .await
        .unwrap();

    assert_eq!(report.status, ProbeStatus::Success);
    assert_eq!(report.status_code, Some(204));
    assert!(report.response_time_ms.is_some());
}
