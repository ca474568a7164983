//! End-to-end exchange tests driving the SSH subtransport facade against
//! stub child processes. Shell stubs stand in for the external SSH tool,
//! the same way a wrapper script stands in for sshd when testing a real
//! smart-protocol server by hand.
#![cfg(unix)]

use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

use git_tunnel::{
    SmartService, SmartSubtransport, SshToolConfig, SshTunnelTransport, SubtransportStream,
    TunnelError,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn write_stub(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn transport_for(tool: &std::path::Path) -> SshTunnelTransport {
    SshTunnelTransport::new(SshToolConfig::with_tool(tool))
}

fn read_line(stream: &mut dyn SubtransportStream) -> String {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).unwrap();
        if n == 0 || byte[0] == b'\n' {
            break;
        }
        line.push(byte[0]);
    }
    String::from_utf8(line).unwrap()
}

#[test]
fn bytes_round_trip_through_an_echoing_child() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let tool = write_stub(&dir, "stub-echo", "#!/bin/sh\nexec cat\n");
    let mut transport = transport_for(&tool);

    let stream = transport
        .action("ssh://git@example.com/repo.git", SmartService::UploadPackLs)
        .unwrap();

    // 32 rounds of 8 KiB: well past any single pipe or capture buffer,
    // interleaved so neither side of the pipe can fill up.
    let mut chunk: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();
    for round in 0..32u8 {
        chunk[0] = round;
        stream.write_all(&chunk).unwrap();
        stream.flush().unwrap();
        let mut got = vec![0u8; chunk.len()];
        stream.read_exact(&mut got).unwrap();
        assert_eq!(got, chunk, "round {round} came back different");
    }

    transport.close_stream().unwrap();
    assert!(transport.is_idle());
    transport.close();
}

#[test]
fn abnormal_exit_surfaces_code_and_stderr_at_disposal() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let tool = write_stub(
        &dir,
        "stub-denied",
        "#!/bin/sh\necho 'fatal: access denied' >&2\nexit 3\n",
    );
    let mut transport = transport_for(&tool);

    transport
        .action("ssh://example.com/repo.git", SmartService::ReceivePackLs)
        .unwrap();
    match transport.close_stream().unwrap_err() {
        TunnelError::ProcessFailedWithOutput { code, stderr } => {
            assert_eq!(code, 3);
            assert!(stderr.contains("access denied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(transport.is_idle());
    transport.close();
}

#[test]
fn silent_abnormal_exit_surfaces_bare_code() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let tool = write_stub(&dir, "stub-silent", "#!/bin/sh\nexit 42\n");
    let mut transport = transport_for(&tool);

    transport
        .action("ssh://example.com/repo.git", SmartService::UploadPackLs)
        .unwrap();
    match transport.close_stream().unwrap_err() {
        TunnelError::ProcessFailed { code } => assert_eq!(code, 42),
        other => panic!("unexpected error: {other:?}"),
    }
    transport.close();
}

#[test]
fn replacement_environment_reaches_the_child() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let tool = write_stub(&dir, "stub-env", "#!/bin/sh\nprintf '%s' \"$PATH\"\n");

    // With a replacement block that leaves PATH out, the child sees none.
    let mut config = SshToolConfig::with_tool(&tool);
    config.environment = Some(
        [("GIT_TUNNEL_MARKER".to_string(), "1".to_string())]
            .into_iter()
            .collect(),
    );
    let mut scrubbed = SshTunnelTransport::new(config);
    let stream = scrubbed
        .action("ssh://example.com/repo.git", SmartService::UploadPackLs)
        .unwrap();
    let mut seen = String::new();
    stream.read_to_string(&mut seen).unwrap();
    assert_eq!(seen, "");
    scrubbed.close_stream().unwrap();
    scrubbed.close();

    // Without one, the parent environment is inherited.
    let mut inheriting = transport_for(&tool);
    let stream = inheriting
        .action("ssh://example.com/repo.git", SmartService::UploadPackLs)
        .unwrap();
    let mut seen = String::new();
    stream.read_to_string(&mut seen).unwrap();
    assert!(!seen.is_empty());
    inheriting.close_stream().unwrap();
    inheriting.close();
}

#[test]
fn second_list_action_replaces_the_previous_tunnel() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let tool = write_stub(&dir, "stub-pid", "#!/bin/sh\necho $$\nexec cat\n");
    let mut transport = transport_for(&tool);

    let first_pid = {
        let stream = transport
            .action("ssh://example.com/repo.git", SmartService::UploadPackLs)
            .unwrap();
        read_line(stream)
    };

    let second_pid = {
        let stream = transport
            .action("ssh://example.com/repo.git", SmartService::UploadPackLs)
            .unwrap();
        read_line(stream)
    };

    assert_ne!(first_pid, second_pid);

    // The replaced child was reaped during the second list action.
    #[cfg(target_os = "linux")]
    assert!(!std::path::Path::new(&format!("/proc/{first_pid}")).exists());

    transport.close_stream().unwrap();
    transport.close();
}

#[test]
fn ordering_error_after_disposal_matches_a_fresh_transport() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let tool = write_stub(&dir, "stub-echo", "#!/bin/sh\nexec cat\n");

    let mut used = transport_for(&tool);
    used.action("ssh://example.com/repo.git", SmartService::UploadPackLs)
        .unwrap();
    used.close_stream().unwrap();
    let after_close = used
        .action("ssh://example.com/repo.git", SmartService::UploadPack)
        .unwrap_err();

    let mut fresh = transport_for(&tool);
    let never_opened = fresh
        .action("ssh://example.com/repo.git", SmartService::UploadPack)
        .unwrap_err();

    assert_eq!(after_close.to_string(), never_opened.to_string());
    assert_eq!(
        never_opened.to_string(),
        "Must call UPLOADPACK_LS before UPLOADPACK"
    );

    used.close();
    fresh.close();
}

#[test]
fn injection_guard_fires_before_any_spawn() {
    init_logging();
    // The tool path points at something that must never run; if the guard
    // let the action through, spawning would fail differently.
    let mut transport = transport_for(std::path::Path::new("/bin/false"));
    let err = transport
        .action("ssh://--exec/repo.git", SmartService::UploadPackLs)
        .unwrap_err();
    assert!(matches!(
        err,
        TunnelError::AmbiguousArgument { field: "host", .. }
    ));
    assert!(transport.is_idle());
    transport.close();
}
