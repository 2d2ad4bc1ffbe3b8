//! Process-level behavior of the `conn-tracker` binary.

use std::process::Command;

fn tracker_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_conn-tracker"))
}

#[test]
fn test_exits_non_zero_when_port_in_use() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port().to_string();

    let output = tracker_bin()
        .args(["--bind-address", "127.0.0.1", "--bind-port", &port])
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to bind"), "stderr was: {stderr}");
}

#[test]
fn test_exits_non_zero_on_invalid_config() {
    let path = std::env::temp_dir().join(format!("conn-tracker-cli-{}.toml", std::process::id()));
    std::fs::write(&path, "[listener]\nread_buffer_size = 0\n").unwrap();

    let output = tracker_bin()
        .arg("--config")
        .arg(&path)
        .output()
        .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("read_buffer_size"), "stderr was: {stderr}");
}

#[cfg(unix)]
#[test]
fn test_interrupt_exits_zero() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let mut child = tracker_bin()
        .args(["--bind-address", "127.0.0.1", "--bind-port", "0"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(500));
    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("tracker ignored SIGINT");
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    assert!(status.success(), "exit status: {status}");
}
