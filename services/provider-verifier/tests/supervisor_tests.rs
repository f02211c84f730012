//! Process supervisor tests.
//!
//! A wiremock server plays the provider's health endpoint; small shell
//! commands play the launched process.

#![cfg(unix)]

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use provider_verifier::{HarnessError, Liveness, Ownership, ProcessSupervisor, ServiceSpec};
use std::path::Path;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn spec(address: &str, command: &[&str], workdir: &Path) -> ServiceSpec {
    ServiceSpec::new(
        Url::parse(address).unwrap(),
        command.iter().map(ToString::to_string).collect(),
    )
    .with_working_dir(workdir)
    .with_max_attempts(3)
    .with_poll_interval(Duration::from_millis(50))
    .with_health_timeout(Duration::from_millis(500))
    .with_grace_period(Duration::from_secs(2))
}

fn unused_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    format!("http://127.0.0.1:{port}")
}

async fn read_pid(file: &Path) -> i32 {
    for _ in 0..50 {
        if let Ok(raw) = std::fs::read_to_string(file) {
            if let Ok(pid) = raw.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} was never written", file.display());
}

fn is_gone(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None) == Err(Errno::ESRCH)
}

/// Gone, or a zombie still waiting for the runtime to reap it.
fn is_dead(pid: i32) -> bool {
    is_gone(pid)
        || std::fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
            stat.rsplit_once(')')
                .is_some_and(|(_, rest)| rest.trim_start().starts_with('Z'))
        })
}

/// Health endpoint that fails `failures` times, then succeeds.
async fn warming_server(failures: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(failures)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_external_instance_is_reused_and_left_running() {
    let server = healthy_server().await;
    let workdir = tempfile::tempdir().unwrap();
    let supervisor =
        ProcessSupervisor::new(spec(&server.uri(), &["touch", "launched"], workdir.path())).unwrap();

    let mut handle = supervisor.ensure_running().await.unwrap();
    assert_eq!(handle.ownership(), Ownership::External);
    assert_eq!(handle.address(), server.uri());
    assert_eq!(handle.liveness(), Liveness::Healthy);

    supervisor.release(&mut handle).await;
    supervisor.release(&mut handle).await;

    assert!(!workdir.path().join("launched").exists());
    let status = reqwest::get(format!("{}/health", server.uri())).await.unwrap().status();
    assert_eq!(status.as_u16(), 200);
}

#[tokio::test]
async fn test_owned_instance_started_in_workdir_and_released() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let supervisor = ProcessSupervisor::new(spec(
        &server.uri(),
        &["sh", "-c", "pwd > cwd.txt; echo $$ > provider.pid; exec sleep 30"],
        workdir.path(),
    ))
    .unwrap();

    let mut handle = supervisor.ensure_running().await.unwrap();
    assert!(handle.is_owned());
    assert!(handle.pid().is_some());
    assert_eq!(handle.liveness(), Liveness::Healthy);

    let pid = read_pid(&workdir.path().join("provider.pid")).await;
    assert_eq!(i64::from(pid), i64::from(handle.pid().unwrap()));
    let cwd = std::fs::read_to_string(workdir.path().join("cwd.txt")).unwrap();
    assert_eq!(
        Path::new(cwd.trim()).canonicalize().unwrap(),
        workdir.path().canonicalize().unwrap()
    );

    supervisor.release(&mut handle).await;
    assert_eq!(handle.liveness(), Liveness::Stopped);
    assert!(is_gone(pid));

    // Second release is a no-op.
    supervisor.release(&mut handle).await;
    assert_eq!(handle.liveness(), Liveness::Stopped);
    assert!(handle.is_owned());
}

#[tokio::test]
async fn test_startup_timeout_terminates_process() {
    let workdir = tempfile::tempdir().unwrap();
    let address = unused_address();
    let spec = spec(
        &address,
        &["sh", "-c", "echo $$ > provider.pid; exec sleep 30"],
        workdir.path(),
    );
    let budget = (spec.poll_interval + spec.health_timeout) * spec.max_attempts + spec.grace_period;
    let supervisor = ProcessSupervisor::new(spec).unwrap();

    let started = Instant::now();
    let err = supervisor.ensure_running().await.unwrap_err();
    let elapsed = started.elapsed();
    assert!(elapsed < budget, "gave up after {elapsed:?}, budget {budget:?}");
    match &err {
        HarnessError::StartupTimeout { address: polled, attempts } => {
            assert_eq!(polled, &address);
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected StartupTimeout, got {other}"),
    }

    let pid = read_pid(&workdir.path().join("provider.pid")).await;
    assert!(is_gone(pid));
}

#[tokio::test]
async fn test_process_exiting_early_still_uses_full_budget() {
    let workdir = tempfile::tempdir().unwrap();
    let supervisor =
        ProcessSupervisor::new(spec(&unused_address(), &["true"], workdir.path())).unwrap();

    let err = supervisor.ensure_running().await.unwrap_err();
    assert!(matches!(err, HarnessError::StartupTimeout { attempts: 3, .. }));
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let workdir = tempfile::tempdir().unwrap();
    let supervisor = ProcessSupervisor::new(spec(
        &unused_address(),
        &["/nonexistent/provider-binary"],
        workdir.path(),
    ))
    .unwrap();

    let err = supervisor.ensure_running().await.unwrap_err();
    assert!(matches!(err, HarnessError::Spawn { .. }), "{err}");
    assert!(err.to_string().contains("/nonexistent/provider-binary"));
}

#[tokio::test]
async fn test_release_kills_process_ignoring_sigterm() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let supervisor = ProcessSupervisor::new(
        spec(
            &server.uri(),
            &["sh", "-c", "trap '' TERM; echo $$ > provider.pid; while :; do sleep 1; done"],
            workdir.path(),
        )
        .with_grace_period(Duration::from_millis(200)),
    )
    .unwrap();

    let mut handle = supervisor.ensure_running().await.unwrap();
    let pid = read_pid(&workdir.path().join("provider.pid")).await;

    supervisor.release(&mut handle).await;
    assert_eq!(handle.liveness(), Liveness::Stopped);
    assert!(is_gone(pid));
}

#[tokio::test]
async fn test_output_is_captured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let supervisor = ProcessSupervisor::new(spec(
        &server.uri(),
        &["sh", "-c", "echo booting; echo warming up >&2; exec sleep 30"],
        workdir.path(),
    ))
    .unwrap();

    let mut handle = supervisor.ensure_running().await.unwrap();
    let mut tail = Vec::new();
    for _ in 0..50 {
        tail = handle.output_tail().await;
        if tail.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(tail.contains(&"booting".to_string()));
    assert!(tail.contains(&"warming up".to_string()));

    supervisor.release(&mut handle).await;
}

#[tokio::test]
async fn test_dropped_handle_kills_process() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let supervisor = ProcessSupervisor::new(spec(
        &server.uri(),
        &["sh", "-c", "echo $$ > provider.pid; exec sleep 30"],
        workdir.path(),
    ))
    .unwrap();

    let handle = supervisor.ensure_running().await.unwrap();
    let pid = read_pid(&workdir.path().join("provider.pid")).await;
    drop(handle);

    let mut dead = false;
    for _ in 0..100 {
        if is_dead(pid) {
            dead = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(dead);
}

#[tokio::test]
async fn test_undecodable_output_keeps_provider_alive() {
    let server = warming_server(1).await;
    let workdir = tempfile::tempdir().unwrap();
    let supervisor = ProcessSupervisor::new(spec(
        &server.uri(),
        &[
            "sh",
            "-c",
            "echo booting; printf 'caf\\351\\n'; sleep 0.3; echo after; exec sleep 30",
        ],
        workdir.path(),
    ))
    .unwrap();

    let mut handle = supervisor.ensure_running().await.unwrap();
    let pid = i32::try_from(handle.pid().unwrap()).unwrap();

    let mut tail = Vec::new();
    for _ in 0..100 {
        tail = handle.output_tail().await;
        if tail.iter().any(|line| line == "after") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(tail, vec!["booting", "caf\u{fffd}", "after"]);
    assert!(!is_dead(pid), "provider died after writing undecodable output");

    supervisor.release(&mut handle).await;
    assert!(is_gone(pid));
}

#[tokio::test]
async fn test_release_stops_children_of_wrapper_command() {
    let server = warming_server(1).await;
    let workdir = tempfile::tempdir().unwrap();
    let supervisor = ProcessSupervisor::new(spec(
        &server.uri(),
        &["sh", "-c", "sleep 30 & echo $! > server.pid; wait"],
        workdir.path(),
    ))
    .unwrap();

    let mut handle = supervisor.ensure_running().await.unwrap();
    let server_pid = read_pid(&workdir.path().join("server.pid")).await;
    assert!(!is_dead(server_pid));

    supervisor.release(&mut handle).await;

    let mut dead = false;
    for _ in 0..100 {
        if is_dead(server_pid) {
            dead = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(dead, "child of the start command outlived release");
}
