use fatbox_core::{Destination, ForwardRequest, HostingEndpoints, UpstreamConfig};
use fatbox_services::{ForwardError, Forwarder, HostingClient};
use mockito::{Matcher, Server};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn endpoints(base: &str) -> HostingEndpoints {
    HostingEndpoints {
        pomf_upload_url: format!("{}/upload.php", base),
        catbox_api_url: format!("{}/user/api.php", base),
        litterbox_api_url: format!("{}/resources/internals/api.php", base),
    }
}

fn upstream(timeout: Duration, max_retries: u32) -> UpstreamConfig {
    UpstreamConfig {
        timeout,
        max_retries,
        retry_base_delay: Duration::from_millis(1),
    }
}

fn client(base: &str) -> HostingClient {
    HostingClient::new(endpoints(base), &upstream(Duration::from_secs(10), 1)).unwrap()
}

fn sample_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.bin");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[tokio::test]
async fn pomf_returns_first_file_url() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/upload.php")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="files\[\]"; filename="photo\.png""#.to_string()),
            Matcher::Regex("pixels".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"files":[{"url":"https://pomf.example/x.png"}]}"#)
        .create_async()
        .await;

    let (_dir, path) = sample_file("pixels");
    let request = ForwardRequest::new(Destination::Pomf, path, "photo.png");
    let url = client(&server.url()).forward(&request).await.unwrap();

    assert_eq!(url, "https://pomf.example/x.png");
    mock.assert_async().await;
}

#[tokio::test]
async fn pomf_success_false_is_rejected_with_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/upload.php")
        .with_status(200)
        .with_body(r#"{"success":false,"description":"file too large"}"#)
        .expect(1)
        .create_async()
        .await;

    let (_dir, path) = sample_file("pixels");
    let request = ForwardRequest::new(Destination::Pomf, path, "photo.png");
    let err = client(&server.url()).forward(&request).await.unwrap_err();

    match err {
        ForwardError::Rejected { body, .. } => assert!(body.contains("file too large")),
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn catbox_sends_userhash_and_returns_body_verbatim() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/user/api.php")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("name=\"reqtype\"\r\n\r\nfileupload".to_string()),
            Matcher::Regex("name=\"userhash\"\r\n\r\nabc123".to_string()),
            Matcher::Regex(r#"name="fileToUpload"; filename="notes\.txt""#.to_string()),
        ]))
        .with_status(200)
        .with_body("https://files.catbox.moe/q1w2e3.txt")
        .create_async()
        .await;

    let (_dir, path) = sample_file("some notes");
    let request = ForwardRequest::new(Destination::Catbox, path, "notes.txt")
        .with_userhash(Some("abc123".to_string()));
    let body = client(&server.url()).forward(&request).await.unwrap();

    assert_eq!(body, "https://files.catbox.moe/q1w2e3.txt");
    mock.assert_async().await;
}

#[tokio::test]
async fn litterbox_sends_default_retention() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/resources/internals/api.php")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("name=\"reqtype\"\r\n\r\nfileupload".to_string()),
            Matcher::Regex("name=\"time\"\r\n\r\n1h".to_string()),
        ]))
        .with_status(200)
        .with_body("https://litter.catbox.moe/abcd.zip")
        .create_async()
        .await;

    let (_dir, path) = sample_file("zip bytes");
    let request = ForwardRequest::new(Destination::Litterbox, path, "a.zip").with_time(None);
    let body = client(&server.url()).forward(&request).await.unwrap();

    assert_eq!(body, "https://litter.catbox.moe/abcd.zip");
    mock.assert_async().await;
}

#[tokio::test]
async fn fields_are_only_sent_to_hosts_that_accept_them() {
    let mut server = Server::new_async().await;
    let litterbox = server
        .mock("POST", "/resources/internals/api.php")
        .match_request(|request| {
            let body = request.utf8_lossy_body().unwrap_or_default();
            body.contains("name=\"time\"") && !body.contains("name=\"userhash\"")
        })
        .with_status(200)
        .with_body("https://litter.catbox.moe/only-time.bin")
        .expect(1)
        .create_async()
        .await;
    let pomf = server
        .mock("POST", "/upload.php")
        .match_request(|request| {
            let body = request.utf8_lossy_body().unwrap_or_default();
            !body.contains("name=\"time\"") && !body.contains("name=\"userhash\"")
        })
        .with_status(200)
        .with_body(r#"{"success":true,"files":[{"url":"https://pomf.example/bare.bin"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let (_dir, path) = sample_file("payload");
    let client = client(&server.url());
    for destination in [Destination::Litterbox, Destination::Pomf] {
        let request = ForwardRequest::new(destination, path.clone(), "bare.bin")
            .with_userhash(Some("abc123".to_string()))
            .with_time(Some("12h".to_string()));
        client.forward(&request).await.unwrap();
    }

    litterbox.assert_async().await;
    pomf.assert_async().await;
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/user/api.php")
        .with_status(412)
        .with_body("No files given.")
        .expect(1)
        .create_async()
        .await;

    let (_dir, path) = sample_file("x");
    let request = ForwardRequest::new(Destination::Catbox, path, "x.bin");
    let err = client(&server.url()).forward(&request).await.unwrap_err();

    assert!(matches!(err, ForwardError::Status { status: 412, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_retried_once() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/user/api.php")
        .with_status(503)
        .with_body("busy")
        .expect(1)
        .create_async()
        .await;
    let succeeding = server
        .mock("POST", "/user/api.php")
        .with_status(200)
        .with_body("https://files.catbox.moe/retry.bin")
        .expect(1)
        .create_async()
        .await;

    let (_dir, path) = sample_file("x");
    let request = ForwardRequest::new(Destination::Catbox, path, "x.bin");
    let body = client(&server.url()).forward(&request).await.unwrap();

    assert_eq!(body, "https://files.catbox.moe/retry.bin");
    failing.assert_async().await;
    succeeding.assert_async().await;
}

#[tokio::test]
async fn hung_upstream_times_out() {
    // Accepts connections and never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = HostingClient::new(
        endpoints(&format!("http://{}", addr)),
        &upstream(Duration::from_millis(300), 0),
    )
    .unwrap();

    let (_dir, path) = sample_file("x");
    let request = ForwardRequest::new(Destination::Litterbox, path, "x.bin");
    let err = client.forward(&request).await.unwrap_err();

    assert!(matches!(
        err,
        ForwardError::Timeout {
            destination: Destination::Litterbox,
            ..
        }
    ));
}

#[tokio::test]
async fn missing_file_is_a_file_error() {
    let server = Server::new_async().await;
    let request = ForwardRequest::new(Destination::Pomf, "/nonexistent/fatbox/file", "x");
    let err = client(&server.url()).forward(&request).await.unwrap_err();
    assert!(matches!(err, ForwardError::File { .. }));
}
