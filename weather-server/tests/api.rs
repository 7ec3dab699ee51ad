//! End-to-end tests for the HTTP routes, with both providers mocked by wiremock.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Local};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use weather_core::{Config, ForecastRepository, ProviderId, SqliteForecastStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    app: Router,
    store: Arc<SqliteForecastStore>,
    wttr: MockServer,
    meteo: MockServer,
}

async fn test_app() -> TestApp {
    let wttr = MockServer::start().await;
    let meteo = MockServer::start().await;

    let mut config = Config::default();
    config.upsert_provider_base_url(ProviderId::Wttr, wttr.uri());
    config.upsert_provider_base_url(ProviderId::OpenMeteo, meteo.uri());

    let store = Arc::new(SqliteForecastStore::in_memory().unwrap());
    let service = weather_server::build_service(&config, store.clone()).unwrap();

    TestApp { app: weather_server::app(service), store, wttr, meteo }
}

fn day(offset: i64) -> String {
    (Local::now().date_naive() + Duration::days(offset)).format("%d.%m.%Y").to_string()
}

fn wttr_body(temp: &str, obs: &str) -> Value {
    json!({
        "current_condition": [{"temp_C": temp, "localObsDateTime": obs}],
        "nearest_area": [{"latitude": "55.752", "longitude": "37.616"}]
    })
}

async fn mount_wttr(server: &MockServer, city: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{city}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

#[tokio::test]
async fn current_weather_success() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Moscow", wttr_body("-4", "2025-12-20 03:21 PM")).await;

    let (status, body) = get(&t.app, "/weather/current/?city=Moscow").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"temperature": "-4", "local_time": "15:21"}));
}

#[tokio::test]
async fn current_weather_without_trailing_slash() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Oslo", wttr_body("1", "08:15")).await;

    let (status, body) = get(&t.app, "/weather/current?city=Oslo").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["local_time"], "08:15");
}

#[tokio::test]
async fn current_weather_requires_city() {
    let t = test_app().await;

    let (status, body) = get(&t.app, "/weather/current/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = get(&t.app, "/weather/current/?city=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn current_weather_unknown_city_is_404() {
    let t = test_app().await;
    Mock::given(method("GET"))
        .and(path("/Atlantis"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&t.wttr)
        .await;

    let (status, body) = get(&t.app, "/weather/current/?city=Atlantis").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Atlantis"));
}

#[tokio::test]
async fn current_weather_missing_fields_is_500() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Moscow", json!({"current_condition": [{"temp_C": "3"}]})).await;

    let (status, body) = get(&t.app, "/weather/current/?city=Moscow").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn current_weather_invalid_reading_is_400_with_field_errors() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Moscow", wttr_body("101", "2025-12-20 03:21 PM")).await;

    let (status, body) = get(&t.app, "/weather/current/?city=Moscow").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["temperature"].is_array());
}

#[tokio::test]
async fn post_then_get_returns_stored_forecast_without_outbound_calls() {
    let t = test_app().await;
    let date = day(2);

    let (status, body) = post_json(
        &t.app,
        "/weather/forecast/",
        json!({"city": "Moscow", "date": date, "min_temperature": -5, "max_temperature": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"min_temperature": -5.0, "max_temperature": 3.0}));

    let (status, body) = get(&t.app, &format!("/weather/forecast/?city=Moscow&date={date}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"min_temperature": -5.0, "max_temperature": 3.0}));

    assert!(t.wttr.received_requests().await.unwrap().is_empty());
    assert!(t.meteo.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn post_same_key_twice_keeps_one_record() {
    let t = test_app().await;
    let date = day(1);

    for (min, max) in [(1.0, 2.0), (1.0, 2.0), (-3.5, 0.5)] {
        let (status, _) = post_json(
            &t.app,
            "/weather/forecast",
            json!({"city": "Kazan", "date": date, "min_temperature": min, "max_temperature": max}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(t.store.count().unwrap(), 1);
    let (_, body) = get(&t.app, &format!("/weather/forecast/?city=Kazan&date={date}")).await;
    assert_eq!(body, json!({"min_temperature": -3.5, "max_temperature": 0.5}));
}

#[tokio::test]
async fn post_with_min_above_max_is_rejected_and_not_persisted() {
    let t = test_app().await;

    let (status, body) = post_json(
        &t.app,
        "/weather/forecast/",
        json!({"city": "X", "date": day(3), "min_temperature": 10, "max_temperature": 5}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["min_temperature"].is_array());
    assert_eq!(t.store.count().unwrap(), 0);
}

#[tokio::test]
async fn post_with_missing_fields_lists_each_field() {
    let t = test_app().await;

    let (status, body) = post_json(&t.app, "/weather/forecast/", json!({"city": "X"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["date", "min_temperature", "max_temperature"] {
        assert_eq!(body[field], json!(["This field is required."]), "{field}");
    }
}

#[tokio::test]
async fn post_with_invalid_json_is_400() {
    let t = test_app().await;
    let req = Request::builder()
        .method("POST")
        .uri("/weather/forecast/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&t.app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn get_forecast_past_date_is_400() {
    let t = test_app().await;

    let (status, body) = get(&t.app, &format!("/weather/forecast/?city=Moscow&date={}", day(-1))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Date cannot be in the past");
}

#[tokio::test]
async fn get_forecast_beyond_window_names_max_date() {
    let t = test_app().await;

    let (status, body) = get(&t.app, &format!("/weather/forecast/?city=Moscow&date={}", day(11))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains(&day(10)));
}

#[tokio::test]
async fn get_forecast_requires_both_parameters() {
    let t = test_app().await;

    let (status, _) = get(&t.app, "/weather/forecast/?city=Moscow").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&t.app, &format!("/weather/forecast/?date={}", day(1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_forecast_computes_from_providers_without_persisting() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Moscow", wttr_body("-4", "2025-12-20 03:21 PM")).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily": {"temperature_2m_max": [2.5], "temperature_2m_min": [-6.1]}
        })))
        .expect(1)
        .mount(&t.meteo)
        .await;

    let (status, body) = get(&t.app, &format!("/weather/forecast/?city=Moscow&date={}", day(4))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"min_temperature": -6.1, "max_temperature": 2.5}));
    assert_eq!(t.store.count().unwrap(), 0);
}

#[tokio::test]
async fn get_forecast_unknown_city_is_404() {
    let t = test_app().await;
    Mock::given(method("GET"))
        .and(path("/Atlantis"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&t.wttr)
        .await;

    let (status, _) = get(&t.app, &format!("/weather/forecast/?city=Atlantis&date={}", day(1))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_forecast_without_coordinates_is_500() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Moscow", json!({"current_condition": [], "nearest_area": []})).await;

    let (status, body) = get(&t.app, &format!("/weather/forecast/?city=Moscow&date={}", day(1))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Moscow"));
}

#[tokio::test]
async fn get_forecast_provider_failure_is_502() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Moscow", wttr_body("-4", "09:00")).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&t.meteo)
        .await;

    let (status, body) = get(&t.app, &format!("/weather/forecast/?city=Moscow&date={}", day(1))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn get_forecast_null_provider_values_are_field_errors() {
    let t = test_app().await;
    mount_wttr(&t.wttr, "Moscow", wttr_body("-4", "09:00")).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily": {"temperature_2m_max": [null], "temperature_2m_min": [null]}
        })))
        .mount(&t.meteo)
        .await;

    let (status, body) = get(&t.app, &format!("/weather/forecast/?city=Moscow&date={}", day(2))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["min_temperature"], json!(["This field may not be null."]));
    assert_eq!(body["max_temperature"], json!(["This field may not be null."]));
    assert_eq!(t.store.count().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_posts_for_one_key_keep_one_record() {
    let t = test_app().await;
    let date = day(5);

    let posts: Vec<_> = (0..12)
        .map(|i| {
            let app = t.app.clone();
            let body = json!({"city": "Perm", "date": date, "min_temperature": -i, "max_temperature": i});
            tokio::spawn(async move { post_json(&app, "/weather/forecast/", body).await })
        })
        .collect();

    for post in posts {
        let (status, _) = post.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(t.store.count().unwrap(), 1);
}
