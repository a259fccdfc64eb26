//! Runs the `domrelay` binary and checks how the process ends.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

fn relay() -> Child {
    Command::new(env!("CARGO_BIN_EXE_domrelay"))
        .args(["--host", "127.0.0.1", "--port", "0"])
        .env("RUST_LOG", "debug")
        .env_remove("DR_LOG__DIR")
        .env_remove("DR_CONSOLE__ENABLED")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to start domrelay")
}

async fn send_line(child: &mut Child, line: &str) {
    let stdin = child.stdin.as_mut().unwrap();
    stdin.write_all(line.as_bytes()).await.unwrap();
    stdin.flush().await.unwrap();
}

async fn read_all(pipe: Option<impl tokio::io::AsyncRead + Unpin>) -> String {
    let mut out = String::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_string(&mut out).await.unwrap();
    }
    out
}

#[tokio::test]
async fn test_quit_exits_with_status_zero() {
    let mut child = relay();
    send_line(&mut child, "help\n").await;
    send_line(&mut child, "quit\n").await;

    let stdout = tokio::spawn(read_all(child.stdout.take()));
    let stderr = tokio::spawn(read_all(child.stderr.take()));
    let status = tokio::time::timeout(Duration::from_secs(10), child.wait())
        .await
        .expect("relay did not exit after quit")
        .unwrap();
    assert!(status.success(), "exit status: {status:?}");
    assert_eq!(status.code(), Some(0));

    let stdout = stdout.await.unwrap();
    assert!(stdout.contains("AVAILABLE COMMANDS"));
    assert!(stdout.contains("SERVER SHUTDOWN"));

    let stderr = stderr.await.unwrap();
    assert!(stderr.contains("Relay configuration loaded"), "stderr: {stderr}");
}

#[tokio::test]
async fn test_exit_alias_exits_with_status_zero() {
    let mut child = relay();
    send_line(&mut child, "exit\n").await;

    let status = tokio::time::timeout(Duration::from_secs(10), child.wait())
        .await
        .expect("relay did not exit after exit")
        .unwrap();
    assert_eq!(status.code(), Some(0));
}

#[tokio::test]
async fn test_closed_input_keeps_serving() {
    let mut child = relay();
    send_line(&mut child, "nobody is listening\n").await;
    drop(child.stdin.take());

    let waited = tokio::time::timeout(Duration::from_millis(500), child.wait()).await;
    assert!(waited.is_err(), "relay exited after end of input");

    child.kill().await.unwrap();
}
