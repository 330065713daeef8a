//! Classifier HTTP adapter tests against a mock server

use serde_json::json;

const TS: &str = "2024-01-01T00:00:00Z";
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crysense::application::ports::{ClassifyError, CryClassifier};
use crysense::domain::analysis::{CryLabel, EmotionVector};
use crysense::domain::recording::{AudioArtifact, AudioEncoding, Duration};
use crysense::infrastructure::classifier::PREDICT_PATH;
use crysense::infrastructure::HttpCryClassifier;

fn recording() -> AudioArtifact {
    AudioArtifact::in_memory(
        b"RIFF....WAVEfmt ".to_vec(),
        AudioEncoding::classifier_preferred(),
        2.5,
    )
}

fn classifier(server: &MockServer, timeout: Duration) -> HttpCryClassifier {
    HttpCryClassifier::new(&server.uri(), timeout).expect("client should build")
}

#[tokio::test]
async fn hunger_cry_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cry_type": "hunger",
            "confidence": 0.92,
            "timestamp": "2024-05-01 10:00:00.000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = classifier(&server, Duration::from_secs(5))
        .classify(&recording())
        .await
        .unwrap();

    assert_eq!(result.label(), CryLabel::Hunger);
    assert_eq!(result.emotions(), EmotionVector::new(75, 10, 5, 10));
    assert!((result.confidence() - 0.92).abs() < f64::EPSILON);
}

#[tokio::test]
async fn upload_uses_audio_field_and_wav_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(body_string_contains("name=\"audio\""))
        .and(body_string_contains("filename=\"audio.wav\""))
        .and(body_string_contains("audio/wav"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cry_type": "tired", "confidence": 0.5, "timestamp": TS})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = classifier(&server, Duration::from_secs(5))
        .classify(&recording())
        .await
        .unwrap();

    assert_eq!(result.label(), CryLabel::Tiredness);
}

#[tokio::test]
async fn unknown_label_maps_to_balanced_breakdown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cry_type": "scared", "confidence": 0.4, "timestamp": TS})),
        )
        .mount(&server)
        .await;

    let result = classifier(&server, Duration::from_secs(5))
        .classify(&recording())
        .await
        .unwrap();

    assert_eq!(result.label(), CryLabel::Unknown);
    assert_eq!(result.raw_label(), "scared");
    assert_eq!(result.emotions(), EmotionVector::BALANCED);
}

#[tokio::test]
async fn server_error_is_bad_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&recording())
        .await
        .unwrap_err();

    match err {
        ClassifyError::BadResponse(message) => assert!(message.contains("model not loaded")),
        other => panic!("expected BadResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_fields_are_bad_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"label": "hunger"})))
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&recording())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassifyError::BadResponse(_)));
}

#[tokio::test]
async fn missing_timestamp_is_bad_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cry_type": "hunger", "confidence": 0.9})),
        )
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&recording())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassifyError::BadResponse(_)));
}

#[tokio::test]
async fn slow_service_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cry_type": "hunger", "confidence": 0.9, "timestamp": TS}))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = classifier(&server, Duration::from_millis(200))
        .classify(&recording())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassifyError::Unreachable(_)));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{}", port);

    let classifier = HttpCryClassifier::new(&uri, Duration::from_secs(2)).unwrap();
    let err = classifier.classify(&recording()).await.unwrap_err();

    assert!(matches!(err, ClassifyError::Unreachable(_)));
}

#[tokio::test]
async fn unreadable_recording_is_rejected_before_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let missing = AudioArtifact::from_file(
        dir.path().join("deleted.wav"),
        AudioEncoding::classifier_preferred(),
        3.0,
    );

    let err = classifier(&server, Duration::from_secs(5))
        .classify(&missing)
        .await
        .unwrap_err();

    assert!(matches!(err, ClassifyError::BadResponse(_)));
}
