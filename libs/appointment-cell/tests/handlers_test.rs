use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_database::Database;
use shared_utils::test_utils::{
    empty_request, json_request, memory_database, read_json, seed_approved_doctor,
    DoctorFixture, MockSupabaseResponses, TestConfig,
};

#[tokio::test]
async fn test_book_appointment_endpoint() {
    let (db, _) = memory_database();
    let doctor_id = seed_approved_doctor(db.documents.as_ref(), "Dr. One", "10:00").await;
    let app = appointment_routes(db);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "doctorId": doctor_id, "patientName": "Alice", "date": "2025-01-10" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["serial_number"], 1);
    assert_eq!(body["doctor"]["name"], "Dr. One");
    assert_eq!(body["doctor"]["available_time"], "10:00");
    assert_eq!(body["appointment"]["time"], "10:00");
    assert!(body["appointment_id"].is_string());

    let response = app
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "doctor_id": doctor_id, "patient_name": "Alice", "date": "2025-01-10" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(
        body["error"],
        "You already have an appointment with this doctor on this date"
    );
}

#[tokio::test]
async fn test_book_appointment_missing_fields() {
    let (db, _) = memory_database();
    let app = appointment_routes(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "patientName": "Alice" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_unknown_doctor() {
    let (db, _) = memory_database();
    let app = appointment_routes(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "doctorId": "ghost", "patientName": "Alice", "date": "2025-01-10" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_appointment_list() {
    let (db, _) = memory_database();
    let app = appointment_routes(db);

    let response = app
        .oneshot(empty_request("GET", "/appointments-list"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "No appointments found");
}

#[tokio::test]
async fn test_list_and_cancel_endpoints() {
    let (db, _) = memory_database();
    let doctor_id = seed_approved_doctor(db.documents.as_ref(), "Dr. One", "10:00").await;
    let app = appointment_routes(db);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "doctorId": doctor_id, "patientName": "Alice", "date": "2025-01-10" }),
        ))
        .await
        .unwrap();
    let booked = read_json(response).await;
    let appointment_id = booked["appointment_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/appointments-list?doctor_id={}&date=2025-01-10", doctor_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json(response).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["appointments"][0]["id"], appointment_id.as_str());
    assert_eq!(listed["appointments"][0]["doctor"]["name"], "Dr. One");
    assert!(listed["appointments"][0]["patient"].is_null());

    let response = app
        .clone()
        .oneshot(empty_request(
            "PATCH",
            &format!("/appointments/{}/cancel", appointment_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["appointment"]["status"], "cancelled");

    let response = app
        .oneshot(empty_request(
            "PATCH",
            &format!("/appointments/{}/cancel", appointment_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_serial_report_endpoint() {
    let (db, _) = memory_database();
    let doctor_id = seed_approved_doctor(db.documents.as_ref(), "Dr. One", "10:00").await;
    let app = appointment_routes(db);

    app.clone()
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "doctorId": doctor_id, "patientName": "Alice", "date": "2025-04-01" }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(empty_request("GET", "/appointments/serial-report?date=2025-04-01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = read_json(response).await;
    assert_eq!(report["date"], "2025-04-01");
    assert_eq!(report["doctors"][0]["confirmed_count"], 1);
    assert_eq!(report["doctors"][0]["next_serial"], 2);
}

#[tokio::test]
async fn test_booking_against_supabase() {
    let mock_server = MockServer::start().await;
    let doctor = MockSupabaseResponses::doctor_registration_response(
        "d1",
        &DoctorFixture {
            name: "Dr. Remote",
            available_time: "10:00",
            ..DoctorFixture::default()
        },
    );

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_registrations"))
        .and(query_param("id", "eq.d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_name", "eq.Alice"))
        .and(query_param("status", "eq.confirmed"))
        .and(header("Prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "*/0"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_counter"))
        .and(body_json(json!({ "counter_key": "appointment_serial:d1:2025-01-10" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response("a1", "d1", "Alice", 4)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let app = appointment_routes(Database::from_config(&config).unwrap());

    let response = app
        .oneshot(json_request(
            "POST",
            "/appointments",
            json!({ "doctorId": "d1", "patientName": "Alice", "date": "2025-01-10" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["appointment_id"], "a1");
    assert_eq!(body["serial_number"], 4);
    assert_eq!(body["doctor"]["name"], "Dr. Remote");
}

#[tokio::test]
async fn test_storage_failure_is_generic_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let app = appointment_routes(Database::from_config(&config).unwrap());

    let response = app
        .oneshot(empty_request("GET", "/appointments-list"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Internal server error");
}
