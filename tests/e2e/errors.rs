use serial_test::serial;

use crate::harness::{combined, stdout, FakeServer, Reply, TestEnv};

#[test]
#[serial]
fn test_error_line_fails_the_watch() {
    let server = FakeServer::start(vec![(
        "/download",
        Reply::events(&[
            "Downloading item 1 of 3",
            "Error: Invalid link",
            "✅ DOWNLOAD: never/shown.mp3",
        ]),
    )]);
    let env = TestEnv::new(&server);

    let output = env.run(&["watch", "--plain", "https://x/bad"]);
    assert!(!output.status.success(), "watch should fail on an error line");

    let out = stdout(&output);
    assert!(out.contains("Error: Invalid link"), "{}", out);
    assert!(!out.contains("never/shown"), "lines after failure must be ignored:\n{}", out);
    assert!(combined(&output).contains("Job failed"));
}

#[test]
#[serial]
fn test_closed_stream_reports_connection_closed() {
    let server = FakeServer::start(vec![(
        "/download",
        Reply::events(&["Downloading item 1 of 9"]),
    )]);
    let env = TestEnv::new(&server);

    let output = env.run(&["watch", "--plain", "https://x/album/1"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Status: Connection closed."));
    assert!(combined(&output).contains("Connection closed before the job finished"));
}

#[test]
#[serial]
fn test_server_error_status_reports_connection_closed() {
    let server = FakeServer::start(vec![("/download", Reply::json(500, "{\"error\":\"boom\"}"))]);
    let env = TestEnv::new(&server);

    let output = env.run(&["watch", "--plain", "https://x/album/1"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Status: Connection closed."));
}

#[test]
#[serial]
fn test_empty_link_is_rejected_before_connecting() {
    let server = FakeServer::start(vec![]);
    let env = TestEnv::new(&server);

    let output = env.run(&["watch", "--plain", "  "]);
    assert!(!output.status.success());
    assert!(
        combined(&output).contains("Please enter a link."),
        "{}",
        combined(&output)
    );
    assert!(server.requests().is_empty());
}

#[test]
#[serial]
fn test_set_path_rejects_empty_without_request() {
    let server = FakeServer::start(vec![]);
    let env = TestEnv::new(&server);

    let output = env.run(&["set-path", ""]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("Path cannot be empty."));
    assert!(server.requests().is_empty());
}
