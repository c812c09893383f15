//! Integration tests for bulk trip-sheet generation

mod helpers;

use axum::http::StatusCode;
use helpers::{error_code, setup_app, LEGACY_PAYLOAD};
use serde_json::json;

#[tokio::test]
async fn test_bulk_generates_consecutive_serials() {
    let app = setup_app().await;

    let (status, body) = app
        .send(
            "POST",
            "/api/scans/bulk",
            Some(json!({
                "startSerialNo": "TN05423869",
                "count": 3,
                "templateData": { "raw": LEGACY_PAYLOAD, "driverName": "RAVI" }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 3);
    assert_eq!(body["serials"], json!(["TN05423869", "TN05423870", "TN05423871"]));

    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["permitNo"], "TN05423870");
    assert_eq!(records[1]["driverName"], "RAVI");
    assert_eq!(records[1]["vehicleNo"], "TN36 AY0948");
    assert!(records[1]["raw"].as_str().unwrap().starts_with("TN05423870,"));
    assert!(records.iter().all(|r| r["tripSheetStatus"] == "generated"));

    let (_, stored) = app.get("/api/scans").await;
    assert_eq!(stored.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_bulk_without_template_data() {
    let app = setup_app().await;

    let (status, body) = app
        .send("POST", "/api/scans/bulk", Some(json!({ "startSerialNo": "A098", "count": 3 })))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["serials"], json!(["A098", "A099", "A100"]));
}

#[tokio::test]
async fn test_bulk_rejects_missing_fields() {
    let app = setup_app().await;

    let (status, body) = app.send("POST", "/api/scans/bulk", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let (status, _) = app
        .send("POST", "/api/scans/bulk", Some(json!({ "startSerialNo": "TN1" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("POST", "/api/scans/bulk", Some(json!({ "count": 2 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_rejects_bad_count_and_serial() {
    let app = setup_app().await;

    for request in [
        json!({ "startSerialNo": "TN1", "count": 0 }),
        json!({ "startSerialNo": "TN1", "count": -4 }),
        json!({ "startSerialNo": "TN1", "count": 501 }),
        json!({ "startSerialNo": "NODIGITS", "count": 2 }),
    ] {
        let (status, body) = app.send("POST", "/api/scans/bulk", Some(request.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "request {} should fail", request);
        assert_eq!(error_code(&body), "BAD_REQUEST");
    }

    let (_, stored) = app.get("/api/scans").await;
    assert_eq!(stored.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_bulk_maximum_count() {
    let app = setup_app().await;

    let (status, body) = app
        .send("POST", "/api/scans/bulk", Some(json!({ "startSerialNo": "TN1", "count": 500 })))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 500);
    assert_eq!(body["serials"][499], "TN500");
}

#[tokio::test]
async fn test_bulk_rejects_mistyped_count() {
    let app = setup_app().await;

    for request in [
        json!({ "startSerialNo": "TN1", "count": 1e12 }),
        json!({ "startSerialNo": "TN1", "count": "5" }),
    ] {
        let (status, body) = app.send("POST", "/api/scans/bulk", Some(request.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "request {} should fail", request);
        assert_eq!(error_code(&body), "BAD_REQUEST");
        assert!(!body["error"]["message"].as_str().unwrap().is_empty());
    }
}
