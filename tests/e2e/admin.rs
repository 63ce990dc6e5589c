use serial_test::serial;

use crate::harness::{combined, read, stdout, FakeServer, Reply, TestEnv};

#[test]
#[serial]
fn test_status_reports_logged_out() {
    let server = FakeServer::start(vec![("/check-login", Reply::json(200, r#"{"loggedIn":false}"#))]);
    let env = TestEnv::new(&server);

    let output = env.run(&["status"]);
    assert!(output.status.success(), "{}", combined(&output));
    assert!(stdout(&output).contains("Not logged in"));
}

#[test]
#[serial]
fn test_login_rejected() {
    let server = FakeServer::start(vec![("/login", Reply::json(401, r#"{"success":false}"#))]);
    let env = TestEnv::new(&server);

    let output = env.run(&["login", "-u", "admin", "-p", "wrong"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("Login failed. Try again."));
    assert!(read(&env.state_dir().join("session")).is_empty());
}

#[test]
#[serial]
fn test_set_path_success() {
    let server = FakeServer::start(vec![(
        "/set-download-path",
        Reply::json(200, r#"{"success":true,"new_path":"/mnt/music"}"#),
    )]);
    let env = TestEnv::new(&server);

    let output = env.run(&["set-path", "/mnt/music"]);
    assert!(output.status.success(), "{}", combined(&output));
    assert!(stdout(&output).contains("Download path set successfully to: /mnt/music"));
    assert!(server
        .requests()
        .contains(&"POST /set-download-path".to_string()));
}

#[test]
#[serial]
fn test_set_path_rejected_by_server() {
    let server = FakeServer::start(vec![(
        "/set-download-path",
        Reply::json(400, r#"{"success":false,"message":"Directory does not exist"}"#),
    )]);
    let env = TestEnv::new(&server);

    let output = env.run(&["set-path", "/nope"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("Error: Directory does not exist"));
}
