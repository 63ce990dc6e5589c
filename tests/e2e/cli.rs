use serial_test::serial;

use crate::harness::{combined, read, stdout, FakeServer, Reply, TestEnv};

#[test]
#[serial]
fn test_watch_plain_completes_with_artifact() {
    let server = FakeServer::start(vec![(
        "/download",
        Reply::events(&[
            "Found 2 items",
            "Downloading item 1 of 2",
            "Downloading item 2 of 2",
            "✅ DOWNLOAD: abc/My%20Song.mp3",
        ]),
    )]);
    let env = TestEnv::new(&server);

    let output = env.run(&["watch", "--plain", "https://open.spotify.com/track/42"]);
    assert!(
        output.status.success(),
        "watch failed: {}",
        combined(&output)
    );

    let out = stdout(&output);
    assert!(out.contains("Found 2 items"), "log line missing:\n{}", out);
    assert!(out.contains("[100%]"), "final progress missing:\n{}", out);
    assert!(
        out.contains("Click to download your file: My Song.mp3"),
        "result missing:\n{}",
        out
    );
    assert!(
        out.contains(&format!("{}/downloads/abc/My%20Song.mp3", server.url())),
        "artifact URL missing:\n{}",
        out
    );

    let requests = server.requests();
    assert!(
        requests
            .iter()
            .any(|r| r.starts_with("GET /download?spotify_link=https%3A%2F%2Fopen.spotify.com")),
        "unexpected requests: {:?}",
        requests
    );
}

#[test]
#[serial]
fn test_watch_plain_fetches_artifact() {
    let server = FakeServer::start(vec![
        ("/download", Reply::events(&["✅ DOWNLOAD: abc/My%20Song.mp3"])),
        ("/downloads/", Reply::bytes(b"ID3 fake audio")),
    ]);
    let env = TestEnv::new(&server);

    let output = env.run(&["watch", "--plain", "--fetch", "https://x/track/1"]);
    assert!(output.status.success(), "watch failed: {}", combined(&output));

    let saved = env.downloads().join("My Song.mp3");
    assert_eq!(read(&saved), "ID3 fake audio");
    assert!(server
        .requests()
        .contains(&"GET /downloads/abc/My%20Song.mp3".to_string()));
}

#[test]
#[serial]
fn test_watch_plain_fetches_by_default() {
    let server = FakeServer::start(vec![
        ("/download", Reply::events(&["✅ DOWNLOAD: abc/Default.mp3"])),
        ("/downloads/", Reply::bytes(b"auto")),
    ]);
    let env = TestEnv::new(&server);
    env.use_default_auto_fetch();

    let output = env.run(&["watch", "--plain", "https://x/track/2"]);
    assert!(output.status.success(), "watch failed: {}", combined(&output));
    assert_eq!(read(&env.downloads().join("Default.mp3")), "auto");
}

#[test]
#[serial]
fn test_config_init_writes_defaults() {
    let server = FakeServer::start(vec![]);
    let env = TestEnv::new(&server);

    let output = env.run(&["config", "--init"]);
    assert!(!output.status.success(), "init must not overwrite silently");
    assert!(combined(&output).contains("--force"));

    let output = env.run(&["config", "--init", "--force"]);
    assert!(output.status.success(), "{}", combined(&output));

    let output = env.run(&["config"]);
    assert!(stdout(&output).contains("max_logs = 50"), "{}", stdout(&output));
}

#[test]
fn test_completions_generate() {
    let server = FakeServer::start(vec![]);
    let env = TestEnv::new(&server);

    let output = env.run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("dlwatch"));
}
