//! Fake job server and binary runner shared by the e2e tests.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

#[derive(Clone)]
pub struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    /// An event stream that sends `lines` as `data:` events, then closes.
    pub fn events(lines: &[&str]) -> Self {
        let body = lines
            .iter()
            .map(|line| format!("data: {}\n\n", line))
            .collect::<String>();
        Self {
            status: 200,
            content_type: "text/event-stream",
            body: body.into_bytes(),
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            body: body.to_vec(),
        }
    }
}

/// Minimal HTTP/1.1 server answering by path prefix, one request per connection.
pub struct FakeServer {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeServer {
    pub fn start(routes: Vec<(&'static str, Reply)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let routes: HashMap<&'static str, Reply> = routes.into_iter().collect();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, &routes, &seen);
            }
        });

        Self { url, requests }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request lines received so far, e.g. `GET /check-login`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(stream: TcpStream, routes: &HashMap<&'static str, Reply>, seen: &Mutex<Vec<String>>) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    let _ = reader.read_line(&mut request_line);

    let mut content_length = 0;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap_or(0) == 0 || header.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0; content_length];
    let _ = reader.read_exact(&mut body);

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default();
    seen.lock().unwrap().push(format!("{} {}", method, target));

    let reply = routes
        .iter()
        .filter(|(prefix, _)| path.starts_with(*prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, reply)| reply.clone())
        .unwrap_or_else(|| Reply::json(404, "{\"error\":\"not found\"}"));

    let mut stream = reader.into_inner();
    let head = format!(
        "HTTP/1.1 {} X\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
        reply.status, reply.content_type
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&reply.body);
    let _ = stream.flush();
}

/// Isolated HOME/XDG dirs with a config pointing at a fake server.
pub struct TestEnv {
    _temp: TempDir,
    home: PathBuf,
    server: String,
}

impl TestEnv {
    pub fn new(server: &FakeServer) -> Self {
        let temp = TempDir::new().expect("tempdir");
        let home = temp.path().to_path_buf();
        let config_dir = home.join("config").join("dlwatch");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            format!(
                "download_dir = {:?}\nauto_fetch = false\n[monitor]\nstop_grace_ms = 50\nhide_delay_ms = 0\n",
                home.join("downloads")
            ),
        )
        .unwrap();

        Self {
            _temp: temp,
            home,
            server: server.url().to_string(),
        }
    }

    /// Drop the `auto_fetch = false` override so the default applies.
    pub fn use_default_auto_fetch(&self) {
        let path = self.home.join("config").join("dlwatch").join("config.toml");
        let content = read(&path).replace("auto_fetch = false\n", "");
        std::fs::write(path, content).unwrap();
    }

    pub fn downloads(&self) -> PathBuf {
        self.home.join("downloads")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.home.join("state").join("dlwatch")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dlwatch"))
            .args(args)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join("config"))
            .env("XDG_STATE_HOME", self.home.join("state"))
            .env("DLWATCH_SERVER", &self.server)
            .env("NO_PROXY", "127.0.0.1")
            .env_remove("HTTP_PROXY")
            .env_remove("http_proxy")
            .env_remove("ALL_PROXY")
            .env_remove("all_proxy")
            .env_remove("DLWATCH_LOG")
            .env_remove("RUST_LOG")
            .env_remove("DLWATCH_USERNAME")
            .env_remove("DLWATCH_PASSWORD")
            .output()
            .expect("failed to run dlwatch")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}
