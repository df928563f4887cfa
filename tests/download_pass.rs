use blob_download_lib::runner::run_download_pass_at;
use blob_download_lib::{run_host, RunError, Settings};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMULATOR_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const CONTAINER: &str = "docs";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn settings(server: &MockServer, destination: &Path) -> Settings {
    Settings {
        storage_account_connection: format!(
            "DefaultEndpointsProtocol=http;AccountName=devstoreaccount1;\
             AccountKey={};BlobEndpoint={}/devstoreaccount1;",
            EMULATOR_KEY,
            server.uri()
        ),
        blob_container: CONTAINER.to_string(),
        local_files_destination: destination.to_path_buf(),
    }
}

fn listing(blobs: &[(&str, DateTime<Utc>)]) -> String {
    listing_page(blobs, None)
}

fn listing_page(blobs: &[(&str, DateTime<Utc>)], next_marker: Option<&str>) -> String {
    let entries: String = blobs
        .iter()
        .map(|(name, modified)| {
            format!(
                "<Blob><Name>{}</Name><Properties><Last-Modified>{}</Last-Modified><Content-Length>0</Content-Length></Properties></Blob>",
                name,
                http_date(*modified)
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><EnumerationResults ContainerName=\"docs\"><Blobs>{}</Blobs><NextMarker>{}</NextMarker></EnumerationResults>",
        entries,
        next_marker.unwrap_or("")
    )
}

async fn mount_container(server: &MockServer, blobs: &[(&str, DateTime<Utc>)]) {
    Mock::given(method("GET"))
        .and(path("/devstoreaccount1/docs"))
        .and(query_param("comp", "list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(blobs)))
        .mount(server)
        .await;
}

async fn mount_blob(server: &MockServer, blob_path: &str, body: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/devstoreaccount1/docs/{}", blob_path)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(times)
        .mount(server)
        .await;
}

fn entries(dir: &Path) -> Vec<String> {
    let mut found = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let entry = entry.unwrap();
            if entry.file_type().unwrap().is_dir() {
                stack.push(entry.path());
            } else {
                let relative = entry.path().strip_prefix(dir).unwrap().to_path_buf();
                found.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    found.sort();
    found
}

#[tokio::test]
async fn downloads_only_recent_blobs_and_infers_pdf() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    mount_container(
        &server,
        &[
            ("reports/q1", now() - Duration::hours(2)),
            ("reports/q2.csv", now() - Duration::hours(10)),
            ("notes.txt", now() - Duration::days(3)),
        ],
    )
    .await;
    mount_blob(&server, "reports/q1", b"%PDF-1.7 q1", 1).await;
    mount_blob(&server, "reports/q2.csv", b"region,total\nnorth,4\n", 1).await;
    mount_blob(&server, "notes.txt", b"stale", 0).await;

    let report = run_download_pass_at(&settings(&server, destination.path()), now())
        .await
        .unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.bytes_written, 11 + 21);
    assert_eq!(
        entries(destination.path()),
        vec!["reports/q1.pdf".to_string(), "reports/q2.csv".to_string()]
    );
    assert_eq!(
        std::fs::read(destination.path().join("reports/q1.pdf")).unwrap(),
        b"%PDF-1.7 q1"
    );
}

#[tokio::test]
async fn window_boundary_excludes_exactly_one_day() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    mount_container(
        &server,
        &[
            ("edge/exact.pdf", now() - Duration::hours(24)),
            ("edge/inside.pdf", now() - Duration::hours(24) + Duration::seconds(1)),
        ],
    )
    .await;
    mount_blob(&server, "edge/exact.pdf", b"old", 0).await;
    mount_blob(&server, "edge/inside.pdf", b"new", 1).await;

    let report = run_download_pass_at(&settings(&server, destination.path()), now())
        .await
        .unwrap();

    assert_eq!(report.matched, 1);
    assert_eq!(entries(destination.path()), vec!["edge/inside.pdf".to_string()]);
}

#[tokio::test]
async fn empty_container_writes_nothing() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    mount_container(&server, &[]).await;

    let report = run_download_pass_at(&settings(&server, destination.path()), now())
        .await
        .unwrap();

    assert_eq!(report.matched, 0);
    assert_eq!(report.bytes_written, 0);
    assert!(entries(destination.path()).is_empty());
}

#[tokio::test]
async fn second_pass_overwrites_with_identical_files() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    mount_container(&server, &[("a/b", now() - Duration::minutes(30))]).await;
    mount_blob(&server, "a/b", b"same content", 2).await;
    let settings = settings(&server, destination.path());

    let first = run_download_pass_at(&settings, now()).await.unwrap();
    let files_after_first = entries(destination.path());
    let second = run_download_pass_at(&settings, now()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(entries(destination.path()), files_after_first);
    assert_eq!(files_after_first, vec!["a/b.pdf".to_string()]);
    assert_eq!(
        std::fs::read(destination.path().join("a/b.pdf")).unwrap(),
        b"same content"
    );
}

#[tokio::test]
async fn invalid_connection_string_fails_before_any_write() {
    let destination = TempDir::new().unwrap();
    let settings = Settings {
        storage_account_connection: "definitely not a connection string".to_string(),
        blob_container: CONTAINER.to_string(),
        local_files_destination: destination.path().to_path_buf(),
    };

    let err = run_download_pass_at(&settings, now()).await.unwrap_err();

    assert!(matches!(err, RunError::Connection(_)));
    assert!(entries(destination.path()).is_empty());
}

#[tokio::test]
async fn missing_container_is_a_connection_error() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/devstoreaccount1/docs"))
        .and(query_param("comp", "list"))
        .respond_with(
            ResponseTemplate::new(404).insert_header("x-ms-error-code", "ContainerNotFound"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = run_download_pass_at(&settings(&server, destination.path()), now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Connection(azblob::StorageError::ContainerNotFound(_))
    ));
    assert!(entries(destination.path()).is_empty());
}

#[tokio::test]
async fn rejected_credential_on_first_page_is_a_connection_error() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(query_param("comp", "list"))
        .respond_with(
            ResponseTemplate::new(403).insert_header("x-ms-error-code", "AuthenticationFailed"),
        )
        .mount(&server)
        .await;

    let err = run_download_pass_at(&settings(&server, destination.path()), now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Connection(azblob::StorageError::Status { .. })
    ));
    assert!(entries(destination.path()).is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_connection_error() {
    let destination = TempDir::new().unwrap();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let settings = Settings {
        storage_account_connection: format!(
            "AccountName=devstoreaccount1;AccountKey={};\
             BlobEndpoint=http://127.0.0.1:{}/devstoreaccount1;",
            EMULATOR_KEY, port
        ),
        blob_container: CONTAINER.to_string(),
        local_files_destination: destination.path().to_path_buf(),
    };

    let err = run_download_pass_at(&settings, now()).await.unwrap_err();

    assert!(matches!(
        err,
        RunError::Connection(azblob::StorageError::Request { .. })
    ));
    assert!(entries(destination.path()).is_empty());
}

#[tokio::test]
async fn failed_later_page_is_reported_as_listing_error() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(query_param("comp", "list"))
        .and(query_param_is_missing("marker"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[("a.pdf", now() - Duration::hours(1))],
            Some("page-2"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("comp", "list"))
        .and(query_param("marker", "page-2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_blob(&server, "a.pdf", b"a", 0).await;

    let err = run_download_pass_at(&settings(&server, destination.path()), now())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Listing(_)));
    assert!(entries(destination.path()).is_empty());
}

#[tokio::test]
async fn first_failed_download_aborts_the_pass() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    mount_container(
        &server,
        &[
            ("a.txt", now() - Duration::hours(1)),
            ("b.txt", now() - Duration::hours(1)),
            ("c.txt", now() - Duration::hours(1)),
        ],
    )
    .await;
    mount_blob(&server, "a.txt", b"a", 1).await;
    Mock::given(method("GET"))
        .and(path("/devstoreaccount1/docs/b.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_blob(&server, "c.txt", b"c", 0).await;

    let err = run_download_pass_at(&settings(&server, destination.path()), now())
        .await
        .unwrap_err();

    match err {
        RunError::Download { name, .. } => assert_eq!(name, "b.txt"),
        other => panic!("unexpected error: {:?}", other),
    }
    // Earlier files stay; the failed target was already created and is left as is
    let files = entries(destination.path());
    assert!(files.contains(&"a.txt".to_string()));
    assert!(!files.contains(&"c.txt".to_string()));
}

#[tokio::test]
async fn run_host_completes_a_single_pass() {
    let server = MockServer::start().await;
    let destination = TempDir::new().unwrap();
    mount_container(&server, &[("today/report", Utc::now() - Duration::hours(1))]).await;
    mount_blob(&server, "today/report", b"%PDF", 1).await;

    let report = run_host(&settings(&server, destination.path())).await.unwrap();

    assert_eq!(report.matched, 1);
    assert!(destination.path().join("today/report.pdf").exists());
}
