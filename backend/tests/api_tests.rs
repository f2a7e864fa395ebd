use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_backend::config::AppConfig;
use clinic_backend::{create_router, initialize_backend};

async fn setup_app() -> Router {
    let config = AppConfig {
        database_url: "memory".to_string(),
        ..AppConfig::default()
    };
    let state = initialize_backend(&config).await.expect("Failed to initialize backend");
    create_router(state, &config).expect("Failed to build router")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    actor: Option<(&str, Option<i64>)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((role, id)) = actor {
        builder = builder.header("X-Actor-Role", role);
        if let Some(id) = id {
            builder = builder.header("X-Actor-Id", id.to_string());
        }
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_doctor(app: &Router, username: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/doctors",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@clinic.test", username),
            "password": "stethoscope",
            "specialty": "Diagnostics"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

async fn signup_patient(app: &Router, username: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/patients/signup",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@mail.test", username),
            "password": "hunter2",
            "birth_date": "1990-01-15",
            "phone_number": "555-0100"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Patient signed up successfully");
    body["patient"]["id"].as_i64().unwrap()
}

async fn book(app: &Router, doctor_id: i64, patient_id: i64, date: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/appointments",
        Some(("patient", Some(patient_id))),
        Some(json!({
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "date": date,
            "reason": "Headache"
        })),
    )
    .await
}

#[tokio::test]
async fn test_booking_conflicts() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "house").await;
    let patient_id = signup_patient(&app, "alice").await;

    let (status, body) = book(&app, doctor_id, patient_id, "2025-03-10T10:00:00Z").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_approved"], false);
    assert_eq!(body["approved_at"], Value::Null);
    assert_eq!(body["doctor_name"], "house");
    assert_eq!(body["date"], "2025-03-10T10:00:00Z");

    let (status, body) = book(&app, doctor_id, patient_id, "2025-03-10T10:25:00Z").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("30 minutes"));

    let (status, _) = book(&app, doctor_id, patient_id, "2025-03-10T10:31:00Z").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, &format!("/api/doctors/{}/appointments", doctor_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_booking_validation() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "house").await;
    let patient_id = signup_patient(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/appointments",
        Some(("patient", Some(patient_id))),
        Some(json!({ "doctor_id": doctor_id, "patient_id": patient_id, "reason": "Headache" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, doctor_id, patient_id, "tomorrow at ten").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, 999, patient_id, "2025-03-10T10:00:00Z").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mistyped_or_missing_ids_are_bad_requests() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "house").await;
    let patient_id = signup_patient(&app, "alice").await;
    let patient = Some(("patient", Some(patient_id)));

    let bodies = [
        json!({ "doctor_id": "abc", "patient_id": patient_id, "date": "2025-03-10T10:00:00Z", "reason": "Headache" }),
        json!({ "doctor_id": doctor_id, "date": "2025-03-10T10:00:00Z", "reason": "Headache" }),
    ];
    for request in bodies {
        let (status, body) = send(&app, Method::POST, "/api/appointments", patient, Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some(), "{}", body);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/doctors",
        None,
        Some(json!({ "username": "wilson", "email": "w@clinic.test", "password": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some(), "{}", body);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_bookings_conflict_cleanly() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "house").await;
    let patient_id = signup_patient(&app, "alice").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            book(&app, doctor_id, patient_id, "2025-03-10T10:00:00Z").await.0
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(), 7);
}

#[tokio::test]
async fn test_actor_headers_required() {
    let app = setup_app().await;

    let (status, body) = send(&app, Method::POST, "/api/appointments/1/approve", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::POST, "/api/appointments/1/approve", Some(("doctor", None)), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_approval_flow() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "house").await;
    let patient_id = signup_patient(&app, "alice").await;
    let (_, created) = book(&app, doctor_id, patient_id, "2025-03-10T14:00:00Z").await;
    let appointment_id = created["id"].as_i64().unwrap();
    let approve_uri = format!("/api/appointments/{}/approve", appointment_id);

    // Details cannot be recorded before approval
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/appointments/{}/details", appointment_id),
        Some(("doctor", Some(doctor_id))),
        Some(json!({ "diagnosis": "Migraine" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The patient cannot approve
    let (status, _) = send(&app, Method::POST, &approve_uri, Some(("patient", Some(patient_id))), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, &approve_uri, Some(("doctor", Some(doctor_id))), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["is_approved"], true);
    assert!(body["appointment"]["approved_at"].is_string());
    assert_eq!(
        body["notification"]["message"],
        "Your appointment with Dr. house scheduled for March 10, 2025 at 2:00 PM has been approved."
    );

    let (status, _) = send(&app, Method::POST, &approve_uri, Some(("doctor", Some(doctor_id))), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/appointments/{}/details", appointment_id),
        Some(("doctor", Some(doctor_id))),
        Some(json!({ "prescription": "Ibuprofen", "diagnosis": "Migraine" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prescription"], "Ibuprofen");
    assert_eq!(body["diagnosis"], "Migraine");

    // One approval notification plus one details notification
    let notifications_uri = format!("/api/patients/{}/notifications", patient_id);
    let (status, body) = send(&app, Method::GET, &notifications_uri, Some(("patient", Some(patient_id))), None).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = body.as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert!(notifications[0]["message"].as_str().unwrap().contains("has been approved"));

    let first_id = notifications[0]["id"].as_i64().unwrap();
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/notifications/{}/read", first_id),
        Some(("patient", Some(patient_id))),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_read"], true);

    let second_id = notifications[1]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/notifications/{}", second_id),
        Some(("patient", Some(patient_id + 1))),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/notifications/{}", second_id),
        Some(("patient", Some(patient_id))),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notification deleted successfully");

    let (_, body) = send(&app, Method::GET, &notifications_uri, Some(("patient", Some(patient_id))), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reschedule_and_delete() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "house").await;
    let patient_id = signup_patient(&app, "alice").await;
    let (_, first) = book(&app, doctor_id, patient_id, "2025-03-10T09:00:00Z").await;
    book(&app, doctor_id, patient_id, "2025-03-10T11:00:00Z").await;
    let first_id = first["id"].as_i64().unwrap();
    let schedule_uri = format!("/api/appointments/{}/schedule", first_id);

    let (status, _) = send(
        &app,
        Method::PUT,
        &schedule_uri,
        Some(("patient", Some(patient_id))),
        Some(json!({ "date": "2025-03-10T11:20:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &schedule_uri,
        Some(("patient", Some(patient_id))),
        Some(json!({ "date": "2025-03-10T13:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2025-03-10T13:00:00Z");

    let appointment_uri = format!("/api/appointments/{}", first_id);
    let (status, _) = send(&app, Method::DELETE, &appointment_uri, Some(("doctor", Some(doctor_id))), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &appointment_uri, Some(("staff", None)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Appointment deleted successfully");

    let (status, _) = send(&app, Method::GET, &appointment_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/appointments/999", Some(("staff", None)), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_endpoints() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "wilson").await;
    create_doctor(&app, "cuddy").await;
    let patient_id = signup_patient(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/api/doctors", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body.as_array().unwrap().iter().map(|d| d["username"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["cuddy", "wilson"]);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/doctors/{}", doctor_id),
        None,
        Some(json!({ "specialty": "Oncology" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["specialty"], "Oncology");

    let (status, body) = send(&app, Method::GET, &format!("/api/patients/{}", patient_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["birth_date"], "1990-01-15");

    let (status, _) = send(&app, Method::GET, "/api/patients/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/patients/999/appointments", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logins() {
    let app = setup_app().await;
    let doctor_id = create_doctor(&app, "house").await;
    let patient_id = signup_patient(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/patients/login",
        None,
        Some(json!({ "username": "alice", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient_id"], patient_id);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/patients/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/patients/login",
        None,
        Some(json!({ "username": "house", "password": "stethoscope" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No associated patient found");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/doctors/login",
        None,
        Some(json!({ "username": "house", "password": "stethoscope" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctor_id"], doctor_id);
}

#[tokio::test]
async fn test_duplicate_signup() {
    let app = setup_app().await;
    signup_patient(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/patients/signup",
        None,
        Some(json!({
            "username": "alice",
            "email": "other@mail.test",
            "password": "x",
            "birth_date": "1990-01-15",
            "phone_number": "555-0101"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "A user with that username already exists");
}
