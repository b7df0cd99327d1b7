//! End-to-end booking flows against a wiremock stand-in for Restful-Booker.

use booker_client::booker::{BookerClient, Booking, BookingDates};
use booker_client::{ApiClient, RetryPolicy};
use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn booking() -> Booking {
    Booking {
        first_name: "Alex".to_string(),
        last_name: "Tester".to_string(),
        total_price: 150,
        deposit_paid: true,
        booking_dates: BookingDates {
            checkin: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            checkout: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        },
        additional_needs: None,
    }
}

fn booking_json() -> serde_json::Value {
    json!({
        "firstname": "Alex",
        "lastname": "Tester",
        "totalprice": 150,
        "depositpaid": true,
        "bookingdates": {"checkin": "2024-01-01", "checkout": "2024-01-10"},
        "additionalneeds": null
    })
}

#[tokio::test]
async fn test_auth_token_is_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({"username": "admin", "password": "password123"})))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BookerClient::new(mock_server.uri()).unwrap();
    let token = client.create_auth_token("admin", "password123").await.unwrap();

    assert_eq!(token, "abc123");
}

#[tokio::test]
async fn test_bad_credentials_surface_as_deserialization_failure() {
    let mock_server = MockServer::start().await;

    // Restful-Booker answers 200 with a reason instead of a 4xx
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reason": "Bad credentials"})))
        .mount(&mock_server)
        .await;

    let client = BookerClient::new(mock_server.uri()).unwrap();
    let err = client.create_auth_token("admin", "wrong").await.unwrap_err();

    match err {
        booker_client::Error::DeserializationFailed {
            raw_response,
            status,
            ..
        } => {
            assert!(raw_response.contains("Bad credentials"));
            assert_eq!(status.as_u16(), 200);
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/booking"))
        .and(body_json(booking_json()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"bookingid": 42, "booking": booking_json()})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/booking/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(booking_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut updated = booking_json();
    updated["totalprice"] = json!(300);

    Mock::given(method("PUT"))
        .and(path("/booking/42"))
        .and(header("cookie", "token=abc123"))
        .and(body_json(updated.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/booking/42"))
        .and(header("cookie", "token=abc123"))
        .respond_with(ResponseTemplate::new(201).set_body_string("Created"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BookerClient::new(mock_server.uri()).unwrap();

    let created = client.create_booking(&booking()).await.unwrap();
    assert_eq!(created.booking_id, 42);
    assert_eq!(created.booking, booking());

    let fetched = client.get_booking(42).await.unwrap();
    assert_eq!(fetched.first_name, "Alex");

    let mut change = booking();
    change.total_price = 300;
    let stored = client.update_booking(42, &change, "abc123").await.unwrap();
    assert_eq!(stored.total_price, 300);

    client.delete_booking(42, "abc123").await.unwrap();
    client.close();
}

#[tokio::test]
async fn test_missing_booking_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/booking/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BookerClient::new(mock_server.uri()).unwrap();
    let err = client.get_booking(999).await.unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert!(err.payload().is_none());
    assert_eq!(err.raw_response(), Some("Not Found"));
}

#[tokio::test]
async fn test_delete_without_valid_token_is_forbidden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/booking/42"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BookerClient::new(mock_server.uri()).unwrap();
    let err = client.delete_booking(42, "expired").await.unwrap_err();

    assert_eq!(err.status_code(), Some(403));
}

#[tokio::test]
async fn test_get_booking_retries_gateway_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/booking/42"))
        .respond_with(ResponseTemplate::new(504))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/booking/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(booking_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ApiClient::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .default_header("Accept", "application/json")
        .unwrap()
        .retry_policy(
            RetryPolicy::default()
                .with_total(2)
                .with_backoff_factor(Duration::from_millis(10)),
        )
        .build()
        .unwrap();
    let client = BookerClient::from_api(api);

    let fetched = client.get_booking(42).await.unwrap();
    assert_eq!(fetched, booking());
}
