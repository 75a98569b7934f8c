use axum::body::Body;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use quill_blog::build_with;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "quill-blog-test";

async fn blog(dir: &TempDir) -> Router {
    blog_with(dir, |_| {}).await
}

async fn blog_with<F>(dir: &TempDir, extra: F) -> Router
where
    F: FnOnce(&quill_core::QuillApp<Value, quill_blog::services::BlogParams>),
{
    let root = dir.path().to_path_buf();
    build_with(move |app| {
        app.set("posts.store", "file");
        app.set("posts.dataDir", root.join("data").display().to_string());
        app.set("media.store", "file");
        app.set("media.uploadDir", root.join("uploads").display().to_string());
        app.set("http.staticDir", root.join("static").display().to_string());
        extra(app);
    })
    .await
    .unwrap()
    .router()
}

async fn send(router: &Router, req: Request<Body>) -> (u16, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status().as_u16();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap()
}

fn upload(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn create(router: &Router, title: &str, content: &str) -> Value {
    let (status, body) = send(router, json_req("POST", "/api/posts", json!({"title": title, "content": content}))).await;
    assert_eq!(status, 200, "{body}");
    body
}

#[tokio::test]
async fn health_ok() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let res = router.oneshot(get("/health")).await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn created_post_reads_back_identically() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let created = create(&router, "Hello", "<p>First <b>post</b></p>").await;
    let id = created["id"].as_str().unwrap();
    assert!(id.parse::<u64>().is_ok());
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let (status, fetched) = send(&router, get(&format!("/api/posts/{id}"))).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);
    assert_eq!(fetched["title"], "Hello");
    assert_eq!(fetched["content"], "<p>First <b>post</b></p>");
}

#[tokio::test]
async fn list_is_newest_first_with_previews() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let mut ids = Vec::new();
    for n in 0..3 {
        let post = create(&router, &format!("Post {n}"), &format!("<h1>Title</h1><p>Body {n}</p>")).await;
        ids.push(post["id"].as_str().unwrap().to_string());
    }

    let (status, list) = send(&router, get("/api/posts")).await;
    assert_eq!(status, 200);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 3);

    let listed: Vec<_> = list.iter().map(|p| p["id"].as_str().unwrap().to_string()).collect();
    ids.reverse();
    assert_eq!(listed, ids);

    assert_eq!(list[0]["title"], "Post 2");
    assert_eq!(list[0]["preview"], "TitleBody 2");
    assert!(list[0].get("content").is_none());
    assert!(list[0]["createdAt"].is_string());
}

#[tokio::test]
async fn preview_is_capped_at_150_chars() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let long = format!("<p>{}</p>", "word ".repeat(100));
    create(&router, "Long", &long).await;

    let (_, list) = send(&router, get("/api/posts")).await;
    let preview = list[0]["preview"].as_str().unwrap();
    assert_eq!(preview.chars().count(), 150);
    assert!(!preview.contains('<'));
    assert!("word ".repeat(100).starts_with(preview));
}

#[tokio::test]
async fn preview_length_follows_config() {
    let dir = TempDir::new().unwrap();
    let router = blog_with(&dir, |app| app.set("posts.previewChars", "5")).await;

    create(&router, "Short", "<p>abcdefghij</p>").await;

    let (_, list) = send(&router, get("/api/posts")).await;
    assert_eq!(list[0]["preview"], "abcde");
}

#[tokio::test]
async fn update_keeps_omitted_fields_and_advances_updated_at() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let created = create(&router, "Original", "<p>keep me</p>").await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = send(&router, json_req("PUT", &format!("/api/posts/{id}"), json!({"title": "Renamed"}))).await;
    assert_eq!(status, 200, "{updated}");
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["content"], "<p>keep me</p>");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let before: chrono::DateTime<chrono::Utc> = serde_json::from_value(created["updatedAt"].clone()).unwrap();
    let after: chrono::DateTime<chrono::Utc> = serde_json::from_value(updated["updatedAt"].clone()).unwrap();
    assert!(after > before);

    let (_, fetched) = send(&router, get(&format!("/api/posts/{id}"))).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn deleted_post_is_gone() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let created = create(&router, "Doomed", "<p>bye</p>").await;
    let id = created["id"].as_str().unwrap();

    let (status, removed) = send(&router, delete(&format!("/api/posts/{id}"))).await;
    assert_eq!(status, 200);
    assert_eq!(removed, created);

    let (status, body) = send(&router, get(&format!("/api/posts/{id}"))).await;
    assert_eq!(status, 404);
    assert_eq!(body["name"], "NotFound");
    assert!(body["error"].as_str().unwrap().contains(id));

    let (status, _) = send(&router, delete(&format!("/api/posts/{id}"))).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn missing_or_blank_fields_are_rejected() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let (status, body) = send(&router, json_req("POST", "/api/posts", json!({"content": "<p>x</p>"}))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "title is required");
    assert!(body["errors"]["title"].is_array());

    let (status, body) = send(&router, json_req("POST", "/api/posts", json!({"title": "   ", "content": "x"}))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "title must not be empty");

    let (status, _) = send(&router, json_req("POST", "/api/posts", json!({"title": "x"}))).await;
    assert_eq!(status, 400);

    let created = create(&router, "Fine", "x").await;
    let id = created["id"].as_str().unwrap();
    let (status, body) = send(&router, json_req("PUT", &format!("/api/posts/{id}"), json!({"content": ""}))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "content must not be empty");

    let (_, list) = send(&router, get("/api/posts")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/posts")
        .header("content-type", "application/json")
        .body(Body::from("{\"title\":"))
        .unwrap();
    let (status, body) = send(&router, req).await;

    assert_eq!(status, 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let (status, _) = send(&router, get("/api/posts/123")).await;
    assert_eq!(status, 404);

    let (status, _) = send(&router, json_req("PUT", "/api/posts/123", json!({"title": "x"}))).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn posts_survive_a_restart() {
    let dir = TempDir::new().unwrap();

    let created = {
        let router = blog(&dir).await;
        create(&router, "Persistent", "<p>still here</p>").await
    };

    let router = blog(&dir).await;
    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&router, get(&format!("/api/posts/{id}"))).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);
    assert!(dir.path().join("data/posts.json").exists());
}

#[tokio::test]
async fn uploaded_image_is_served_from_its_url() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let (status, receipt) = send(&router, upload("file", "Photo.PNG", b"\x89PNG fake image")).await;
    assert_eq!(status, 200, "{receipt}");

    let filename = receipt["filename"].as_str().unwrap();
    assert!(filename.ends_with(".png"));
    let url = receipt["url"].as_str().unwrap();
    assert_eq!(url, format!("/uploads/{filename}"));
    assert!(dir.path().join("uploads").join(filename).exists());

    let res = router.clone().oneshot(get(url)).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"\x89PNG fake image");
}

#[tokio::test]
async fn two_uploads_of_the_same_file_get_distinct_names() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let (_, a) = send(&router, upload("file", "clip.mp4", b"video")).await;
    let (_, b) = send(&router, upload("file", "clip.mp4", b"video")).await;
    assert_ne!(a["filename"], b["filename"]);
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let (status, body) = send(&router, upload("file", "script.exe", b"MZ")).await;

    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("exe"));
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn upload_problems_are_bad_requests() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let (status, body) = send(&router, upload("image", "a.png", b"data")).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Missing multipart field 'file'");

    let (status, _) = send(&router, upload("file", "empty.gif", b"")).await;
    assert_eq!(status, 400);

    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn non_multipart_upload_gets_a_json_error() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let (status, body) = send(&router, json_req("POST", "/api/upload", json!({}))).await;

    assert_eq!(status, 400);
    assert!(body["error"].is_string());
    assert_eq!(body["name"], "BadRequest");
}

#[tokio::test]
async fn unrouted_method_gets_a_json_error() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;
    let created = create(&router, "Patchless", "x").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&router, json_req("PATCH", &format!("/api/posts/{id}"), json!({"title": "y"}))).await;
    assert_eq!(status, 405);
    assert_eq!(body["name"], "MethodNotAllowed");
    assert!(body["error"].is_string());

    let (status, body) = send(&router, json_req("PATCH", "/api/posts", json!({}))).await;
    assert_eq!(status, 405);
    assert_eq!(body["code"], 405);
}

#[tokio::test]
async fn oversized_upload_is_rejected_and_discarded() {
    let dir = TempDir::new().unwrap();
    let router = blog_with(&dir, |app| app.set("media.maxUploadMb", "1")).await;

    let too_big = vec![7u8; 1024 * 1024 + 1];
    let (status, body) = send(&router, upload("file", "huge.webm", &too_big)).await;

    assert_eq!(status, 400, "{body}");
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);

    let just_right = vec![7u8; 1024 * 1024];
    let (status, _) = send(&router, upload("file", "fits.webm", &just_right)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn media_names_cannot_escape_the_upload_dir() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;
    create(&router, "secret", "x").await;

    let (status, _) = send(&router, get("/uploads/..%2Fdata%2Fposts.json")).await;
    assert_eq!(status, 404);

    let (status, _) = send(&router, get("/uploads/missing.png")).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn static_client_is_served_at_the_root() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("static")).unwrap();
    std::fs::write(dir.path().join("static/index.html"), "<!doctype html><title>Quill</title>").unwrap();
    let router = blog(&dir).await;

    let res = router.oneshot(get("/")).await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert!(std::str::from_utf8(&bytes).unwrap().contains("Quill"));
}

#[tokio::test]
async fn request_id_is_echoed() {
    let dir = TempDir::new().unwrap();
    let router = blog(&dir).await;

    let req = Request::builder()
        .uri("/api/posts")
        .header("x-request-id", "trace-me-42")
        .body(Body::empty())
        .unwrap();
    let res = router.oneshot(req).await.unwrap();

    assert_eq!(res.headers()["x-request-id"], "trace-me-42");
}
