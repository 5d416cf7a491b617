//! Integration tests for the extraction cycle and the HTTP surface, run
//! against a mock Extraction API bound to a local port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use extract_desk::{
    config::Config,
    create_router,
    error::AppError,
    models::{SelectionResponse, SubmitResponse, UploadedFile, IMAGE_BATCH_LABEL},
    services::{export, ExtractionClient, MemoryClipboard},
    AppState,
};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";
const PDF_BYTES: &[u8] = b"%PDF-1.4 not really a pdf";

#[derive(Debug, Clone)]
struct Recorded {
    endpoint: &'static str,
    fields: Vec<String>,
    file_names: Vec<String>,
    started: Instant,
    finished: Instant,
}

#[derive(Clone, Default)]
struct MockApi {
    calls: Arc<Mutex<Vec<Recorded>>>,
    pdf_in_flight: Arc<AtomicUsize>,
    pdf_max_in_flight: Arc<AtomicUsize>,
    pdf_delay_ms: u64,
}

impl MockApi {
    fn with_pdf_delay(ms: u64) -> Self {
        Self {
            pdf_delay_ms: ms,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, endpoint: &str) -> Vec<Recorded> {
        self.calls().into_iter().filter(|c| c.endpoint == endpoint).collect()
    }
}

async fn read_parts(multipart: &mut Multipart) -> Vec<(String, String, Vec<u8>)> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().unwrap_or("").to_string();
        let data = field.bytes().await.unwrap().to_vec();
        parts.push((name, file_name, data));
    }
    parts
}

async fn mock_extract_images(State(api): State<MockApi>, mut multipart: Multipart) -> Response {
    let started = Instant::now();
    let parts = read_parts(&mut multipart).await;
    let body: Vec<Value> = parts
        .iter()
        .map(|(_, file_name, data)| {
            json!({
                "type": "image",
                "filename": file_name,
                "text": format!("text of {}", file_name),
                "image_base64": STANDARD.encode(data),
            })
        })
        .collect();

    api.calls.lock().unwrap().push(Recorded {
        endpoint: "/extract-images",
        fields: parts.iter().map(|(f, _, _)| f.clone()).collect(),
        file_names: parts.iter().map(|(_, n, _)| n.clone()).collect(),
        started,
        finished: Instant::now(),
    });
    Json(body).into_response()
}

async fn mock_extract_pdf(State(api): State<MockApi>, mut multipart: Multipart) -> Response {
    let started = Instant::now();
    let now_in_flight = api.pdf_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    api.pdf_max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

    let parts = read_parts(&mut multipart).await;
    tokio::time::sleep(Duration::from_millis(api.pdf_delay_ms)).await;
    let file_name = parts.first().map(|(_, n, _)| n.clone()).unwrap_or_default();

    let response = match file_name.as_str() {
        "broken.pdf" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "garbage.pdf" => Json(json!({"error": "Error: OCR operation failed."})).into_response(),
        _ => Json(json!([
            {"type": "pdf", "page": 1, "text": format!("{} page one", file_name), "image_base64": ""},
            {"type": "pdf", "page": 2, "text": format!("{} page two", file_name), "image_base64": ""}
        ]))
        .into_response(),
    };

    api.pdf_in_flight.fetch_sub(1, Ordering::SeqCst);
    api.calls.lock().unwrap().push(Recorded {
        endpoint: "/extract-pdf",
        fields: parts.iter().map(|(f, _, _)| f.clone()).collect(),
        file_names: parts.iter().map(|(_, n, _)| n.clone()).collect(),
        started,
        finished: Instant::now(),
    });
    response
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn spawn_mock_api(api: MockApi) -> SocketAddr {
    let router = Router::new()
        .route("/extract-images", post(mock_extract_images))
        .route("/extract-pdf", post(mock_extract_pdf))
        .with_state(api);
    spawn(router).await
}

fn test_config(api_addr: SocketAddr) -> Config {
    let url = format!("http://{}", api_addr);
    Config::from_source(|key| match key {
        "EXTRACTION_API_URL" => Some(url.clone()),
        "REQUEST_TIMEOUT_SECONDS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

fn desk_state(api_addr: SocketAddr, clipboard: Arc<MemoryClipboard>) -> AppState {
    AppState::with_clipboard(test_config(api_addr), clipboard).unwrap()
}

fn png(name: &str) -> UploadedFile {
    UploadedFile::new(name, "image/png", PNG_BYTES.to_vec())
}

fn pdf(name: &str) -> UploadedFile {
    UploadedFile::new(name, "application/pdf", PDF_BYTES.to_vec())
}

async fn send(state: &AppState, method: &str, uri: &str) -> Response {
    create_router(state.clone())
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_images_go_in_one_batch_and_pdfs_follow_in_order() {
    let api = MockApi::with_pdf_delay(40);
    let addr = spawn_mock_api(api.clone()).await;
    let client = ExtractionClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();

    let files = vec![
        pdf("a.pdf"),
        png("x.png"),
        UploadedFile::new("notes.docx", "application/vnd.ms-word", b"doc".to_vec()),
        pdf("b.pdf"),
        png("y.png"),
        pdf("c.pdf"),
    ];
    let outcome = client.extract(&files).await.unwrap();

    let names: Vec<&str> = outcome.results.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec![IMAGE_BATCH_LABEL, "a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(outcome.results[0].pages.len(), 2);
    assert_eq!(outcome.results[0].pages[0].page, 1);
    assert_eq!(outcome.results[0].pages[1].source_name.as_deref(), Some("y.png"));
    assert!(outcome.results[0].pages[0].image_base64.is_some());
    assert!(outcome.results[1].pages[0].image_base64.is_none());
    assert_eq!(outcome.notifications.len(), 4);
    assert_eq!(outcome.notifications[0].description, "Extracted text from 2 images");

    let image_calls = api.calls_to("/extract-images");
    assert_eq!(image_calls.len(), 1);
    assert_eq!(image_calls[0].fields, vec!["files", "files"]);
    assert_eq!(image_calls[0].file_names, vec!["x.png", "y.png"]);

    let pdf_calls = api.calls_to("/extract-pdf");
    let pdf_names: Vec<String> = pdf_calls.iter().flat_map(|c| c.file_names.clone()).collect();
    assert_eq!(pdf_names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert!(pdf_calls.iter().all(|c| c.fields == vec!["file"]));

    assert_eq!(api.pdf_max_in_flight.load(Ordering::SeqCst), 1);
    for pair in pdf_calls.windows(2) {
        assert!(pair[1].started >= pair[0].finished);
    }
}

#[tokio::test]
async fn test_malformed_payload_aborts_remaining_pdfs() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api.clone()).await;
    let client = ExtractionClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();

    let result = client
        .extract(&[pdf("a.pdf"), pdf("garbage.pdf"), pdf("c.pdf")])
        .await;

    assert!(matches!(result, Err(AppError::MalformedResponse { .. })));
    assert_eq!(api.calls_to("/extract-pdf").len(), 2);
}

#[tokio::test]
async fn test_unreachable_api_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ExtractionClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    let error = client.extract(&[pdf("a.pdf")]).await.unwrap_err();
    assert!(error.is_transport());
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_results() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api.clone()).await;
    let state = desk_state(addr, Arc::new(MemoryClipboard::new()));

    state
        .intake
        .lock()
        .await
        .accept_selection(Some(vec![png("x.png"), pdf("a.pdf")]));
    let response = send(&state, "POST", "/api/submit").await;
    assert_eq!(response.status(), StatusCode::OK);
    let submitted: SubmitResponse = body_json(response).await;
    assert!(submitted.submitted);
    assert_eq!(submitted.files, 2);
    assert_eq!(submitted.pages, 3);

    let before = state.store.snapshot().await;

    state
        .intake
        .lock()
        .await
        .accept_selection(Some(vec![pdf("b.pdf"), pdf("broken.pdf")]));
    let response = send(&state, "POST", "/api/submit").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let failed: SubmitResponse = body_json(response).await;
    assert!(!failed.success);
    assert_eq!(failed.notifications.len(), 1);
    assert_eq!(
        failed.notifications[0].description,
        "Failed to extract text from the uploaded files"
    );

    let after = state.store.snapshot().await;
    assert_eq!(*before, *after);
    let latest = state.notifications.latest().await;
    assert_eq!(latest.len(), 1);
    assert!(latest[0].is_error());
}

#[tokio::test]
async fn test_submit_without_selection_is_a_noop() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api.clone()).await;
    let state = desk_state(addr, Arc::new(MemoryClipboard::new()));

    let response = send(&state, "POST", "/api/submit").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: SubmitResponse = body_json(response).await;
    assert!(!body.submitted);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_submit_does_not_clear_selection() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api.clone()).await;
    let state = desk_state(addr, Arc::new(MemoryClipboard::new()));

    state.intake.lock().await.accept_selection(Some(vec![pdf("a.pdf")]));
    let response = send(&state, "POST", "/api/submit").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.intake.lock().await.len(), 1);
}

#[tokio::test]
async fn test_selection_upload_and_preview_lifecycle() {
    let api = MockApi::default();
    let api_addr = spawn_mock_api(api).await;
    let state = desk_state(api_addr, Arc::new(MemoryClipboard::new()));
    let desk = spawn(create_router(state.clone())).await;
    let http = reqwest::Client::new();

    let form = reqwest::multipart::Form::new()
        .part(
            "files",
            reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
                .file_name("x.png")
                .mime_str("image/png")
                .unwrap(),
        )
        .part(
            "files",
            reqwest::multipart::Part::bytes(PDF_BYTES.to_vec()).file_name("a.pdf"),
        );
    let selection: SelectionResponse = http
        .post(format!("http://{}/api/selection", desk))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(selection.files.len(), 2);
    assert_eq!(selection.files[1].mime_type, "application/pdf");
    assert!(selection.files[1].preview_url.is_none());
    let preview_url = selection.files[0].preview_url.clone().unwrap();

    let preview = http.get(format!("http://{}{}", desk, preview_url)).send().await.unwrap();
    assert_eq!(preview.status(), reqwest::StatusCode::OK);
    assert_eq!(preview.bytes().await.unwrap().as_ref(), PNG_BYTES);

    let cleared: SelectionResponse = http
        .delete(format!("http://{}/api/selection", desk))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cleared.files.is_empty());
    assert_eq!(state.intake.lock().await.live_previews(), 0);

    let gone = http.get(format!("http://{}{}", desk, preview_url)).send().await.unwrap();
    assert_eq!(gone.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_submit_is_rejected() {
    let api = MockApi::with_pdf_delay(500);
    let api_addr = spawn_mock_api(api).await;
    let state = desk_state(api_addr, Arc::new(MemoryClipboard::new()));
    state.intake.lock().await.accept_selection(Some(vec![pdf("slow.pdf")]));
    let desk = spawn(create_router(state.clone())).await;
    let http = reqwest::Client::new();

    let first = tokio::spawn({
        let http = http.clone();
        async move {
            http.post(format!("http://{}/api/submit", desk))
                .send()
                .await
                .unwrap()
                .status()
        }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;

    let second = http
        .post(format!("http://{}/api/submit", desk))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(first.await.unwrap(), reqwest::StatusCode::OK);
    assert_eq!(state.gate.metrics(), (2, 1));
}

#[tokio::test]
async fn test_exports_require_results() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api).await;
    let state = desk_state(addr, Arc::new(MemoryClipboard::new()));

    for uri in ["/export/xlsx", "/export/txt"] {
        let response = send(&state, "GET", uri).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
    let response = send(&state, "POST", "/api/results/copy").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_exports_after_extraction() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api).await;
    let clipboard = Arc::new(MemoryClipboard::new());
    let state = desk_state(addr, clipboard.clone());

    state
        .intake
        .lock()
        .await
        .accept_selection(Some(vec![png("x.png"), pdf("a.pdf")]));
    assert_eq!(send(&state, "POST", "/api/submit").await.status(), StatusCode::OK);

    let xlsx = send(&state, "GET", "/export/xlsx").await;
    assert_eq!(xlsx.status(), StatusCode::OK);
    assert_eq!(
        xlsx.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"extracted-text.xlsx\""
    );
    assert!(body_bytes(xlsx).await.starts_with(b"PK"));

    let txt = send(&state, "GET", "/export/txt").await;
    assert_eq!(txt.status(), StatusCode::OK);
    assert_eq!(
        txt.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"extracted-text.txt\""
    );
    let text = String::from_utf8(body_bytes(txt).await).unwrap();
    let snapshot = state.store.snapshot().await;
    assert_eq!(text, export::plain_text(&snapshot));
    assert!(text.starts_with("Uploaded Images\n\n"));

    let copy_all = send(&state, "POST", "/api/results/copy").await;
    assert_eq!(copy_all.status(), StatusCode::OK);
    assert_eq!(
        clipboard.contents().as_deref(),
        Some("text of x.png\na.pdf page one\na.pdf page two")
    );
}

#[tokio::test]
async fn test_copy_page_marks_only_that_page() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api).await;
    let clipboard = Arc::new(MemoryClipboard::new());
    let state = desk_state(addr, clipboard.clone());

    state.intake.lock().await.accept_selection(Some(vec![pdf("a.pdf")]));
    assert_eq!(send(&state, "POST", "/api/submit").await.status(), StatusCode::OK);

    let response = send(&state, "POST", "/api/results/0/1/copy").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(clipboard.contents().as_deref(), Some("a.pdf page two"));

    let view: Value = body_json(send(&state, "GET", "/api/results").await).await;
    assert_eq!(view["files"][0]["pages"][0]["copied"], json!(false));
    assert_eq!(view["files"][0]["pages"][1]["copied"], json!(true));
    assert_eq!(view["all_copied"], json!(false));

    let missing = send(&state, "POST", "/api/results/4/0/copy").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_page_renders_results() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api).await;
    let state = desk_state(addr, Arc::new(MemoryClipboard::new()));

    state.intake.lock().await.accept_selection(Some(vec![png("x.png")]));
    assert_eq!(send(&state, "POST", "/api/submit").await.status(), StatusCode::OK);

    let html = String::from_utf8(body_bytes(send(&state, "GET", "/").await).await).unwrap();
    assert!(html.contains("Uploaded Images"));
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains("Extracted text from 1 images"));
    assert!(html.contains("/export/xlsx"));
}

#[tokio::test]
async fn test_health_reports_state() {
    let api = MockApi::default();
    let addr = spawn_mock_api(api).await;
    let state = desk_state(addr, Arc::new(MemoryClipboard::new()));

    let response = send(&state, "GET", "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["extraction_api_url"], format!("http://{}", addr));
    assert_eq!(body["extraction_in_progress"], json!(false));
    assert_eq!(body["result_files"], json!(0));

    assert_eq!(send(&state, "GET", "/ready").await.status(), StatusCode::OK);
}
