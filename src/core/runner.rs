//! Process runner - launch one external tool and stream its output

use crate::core::lines::LineReader;
use crate::error::{Result, YtGrabError};
use crate::types::{LaunchSpec, RunOutcome, StreamKind};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Lines buffered between the stream readers and the caller
const LINE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
enum StreamMessage {
    Line(StreamKind, String),
    Failed(StreamKind, io::Error),
}

/// Run `spec` to completion, calling `on_line` for every output line.
///
/// stdout and stderr are drained by separate tasks so a full pipe on one side
/// never stalls the child. `on_line` itself always runs on the caller's task,
/// in emission order per stream; stdout and stderr lines may interleave.
pub async fn run<F>(spec: &LaunchSpec, mut on_line: F) -> Result<RunOutcome>
where
    F: FnMut(StreamKind, &str),
{
    let program = spec.program();

    if is_explicit_path(spec.executable()) && !launch_path(spec).is_file() {
        return Err(YtGrabError::Launch {
            program,
            source: io::Error::new(io::ErrorKind::NotFound, "no such executable"),
        });
    }

    let mut command = Command::new(spec.executable());
    command
        .args(spec.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = spec.working_dir() {
        command.current_dir(dir);
    }

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = command.spawn().map_err(|source| YtGrabError::Launch {
        program: program.clone(),
        source,
    })?;
    debug!(program = %program, pid = ?child.id(), "spawned");

    let (tx, mut rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump(stdout, StreamKind::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump(stderr, StreamKind::Stderr, tx.clone()));
    }
    drop(tx);

    let read_failure = forward(&mut rx, &mut on_line, || {
        // The unread pipe could block the child forever
        let _ = child.start_kill();
    })
    .await;

    let status = child.wait().await.map_err(|source| YtGrabError::Wait {
        program: program.clone(),
        source,
    })?;

    finish(program, status, read_failure)
}

/// Hand lines to `on_line` until every reader is done. The first read
/// failure triggers `on_failure` once and is returned; later lines are
/// still delivered so the child can be drained.
async fn forward<F, K>(
    rx: &mut mpsc::Receiver<StreamMessage>,
    on_line: &mut F,
    mut on_failure: K,
) -> Option<(StreamKind, io::Error)>
where
    F: FnMut(StreamKind, &str),
    K: FnMut(),
{
    let mut read_failure = None;
    while let Some(message) = rx.recv().await {
        match message {
            StreamMessage::Line(stream, line) => on_line(stream, &line),
            StreamMessage::Failed(stream, source) => {
                error!(%stream, "read failed: {}", source);
                if read_failure.is_none() {
                    on_failure();
                    read_failure = Some((stream, source));
                }
            }
        }
    }
    read_failure
}

/// A read failure outranks whatever exit status the killed child reported
fn finish(
    program: String,
    status: ExitStatus,
    read_failure: Option<(StreamKind, io::Error)>,
) -> Result<RunOutcome> {
    if let Some((stream, source)) = read_failure {
        return Err(YtGrabError::StreamIo {
            program,
            stream,
            source,
        });
    }

    let outcome = RunOutcome::from_status(status);
    debug!(program = %program, ?outcome, "exited");
    Ok(outcome)
}

/// Forward lines from one stream until EOF, a read error, or the receiver goes away
async fn pump<R>(stream: R, kind: StreamKind, tx: mpsc::Sender<StreamMessage>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineReader::new(BufReader::new(stream));

    loop {
        let (message, last) = match lines.next_line().await {
            Ok(Some(line)) => (StreamMessage::Line(kind, line), false),
            Ok(None) => break,
            Err(source) => (StreamMessage::Failed(kind, source), true),
        };

        if tx.send(message).await.is_err() || last {
            break;
        }
    }
}

/// A bare name like `yt-dlp` is resolved through PATH by the OS
fn is_explicit_path(executable: &Path) -> bool {
    executable.components().count() > 1
}

/// Where the OS will look for the executable: a relative path is taken
/// from the child's working directory when one is set
fn launch_path(spec: &LaunchSpec) -> PathBuf {
    match spec.working_dir() {
        Some(dir) if spec.executable().is_relative() => dir.join(spec.executable()),
        _ => spec.executable().to_path_buf(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn sh(script: &str) -> LaunchSpec {
        LaunchSpec::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_failure() {
        let spec = LaunchSpec::new("/definitely/not/here/yt-dlp").arg("--version");
        let mut seen = 0;

        let err = assert_err!(run(&spec, |_, _| seen += 1).await);
        assert!(matches!(err, YtGrabError::Launch { .. }));
        assert_eq!(seen, 0);
    }

    #[tokio::test]
    async fn test_missing_bare_name_is_launch_failure() {
        let spec = LaunchSpec::new("yt-grab-no-such-tool-4f2a");
        let err = assert_err!(run(&spec, |_, _| {}).await);
        assert!(matches!(err, YtGrabError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_exit_zero_is_success() {
        let outcome = assert_ok!(run(&sh("exit 0"), |_, _| {}).await);
        assert_eq!(outcome, RunOutcome::Success);
    }

    #[tokio::test]
    async fn test_exit_one_is_failure() {
        let outcome = assert_ok!(run(&sh("exit 1"), |_, _| {}).await);
        assert_eq!(outcome, RunOutcome::Failure { exit_code: 1 });
    }

    #[tokio::test]
    async fn test_killed_child_reports_signal_code() {
        let outcome = assert_ok!(run(&sh("kill -9 $$"), |_, _| {}).await);
        assert_eq!(outcome, RunOutcome::Failure { exit_code: 137 });
    }

    #[tokio::test]
    async fn test_lines_are_tagged_by_stream() {
        let mut lines = Vec::new();
        let spec = sh("echo to-out; echo to-err >&2");

        assert_ok!(run(&spec, |stream, line| lines.push((stream, line.to_string()))).await);

        assert!(lines.contains(&(StreamKind::Stdout, "to-out".to_string())));
        assert!(lines.contains(&(StreamKind::Stderr, "to-err".to_string())));
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_interpreted() {
        let tricky = "a \"quoted\" arg; echo injected $HOME";
        let spec = LaunchSpec::new("sh")
            .args(["-c", "printf '%s\\n' \"$1\"", "sh"])
            .arg(tricky);
        let mut out = Vec::new();

        assert_ok!(run(&spec, |_, line| out.push(line.to_string())).await);
        assert_eq!(out, [tricky]);
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = sh("pwd").current_dir(dir.path());
        let mut out = Vec::new();

        assert_ok!(run(&spec, |_, line| out.push(line.to_string())).await);

        let expected = dir.path().canonicalize().unwrap();
        let reported = Path::new(&out[0]).canonicalize().unwrap();
        assert_eq!(reported, expected);
    }

    #[tokio::test]
    async fn test_concurrent_streams_keep_per_stream_order() {
        let script = r#"
            i=0
            while [ $i -lt 1000 ]; do
                echo "out $i"
                echo "err $i" >&2
                i=$((i+1))
            done
        "#;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let outcome = assert_ok!(
            run(&sh(script), |stream, line| match stream {
                StreamKind::Stdout => stdout.push(line.to_string()),
                StreamKind::Stderr => stderr.push(line.to_string()),
            })
            .await
        );

        assert!(outcome.is_success());
        let expected_out: Vec<String> = (0..1000).map(|i| format!("out {i}")).collect();
        let expected_err: Vec<String> = (0..1000).map(|i| format!("err {i}")).collect();
        assert_eq!(stdout, expected_out);
        assert_eq!(stderr, expected_err);
    }

    #[tokio::test]
    async fn test_large_stderr_does_not_stall_stdout() {
        // Well past a 64 KiB pipe buffer on stderr before stdout says anything
        let script = r#"
            i=0
            while [ $i -lt 5000 ]; do
                echo "noise line $i with some padding to fill the pipe quickly" >&2
                i=$((i+1))
            done
            echo done
        "#;
        let mut last_stdout = None;

        assert_ok!(
            run(&sh(script), |stream, line| {
                if stream == StreamKind::Stdout {
                    last_stdout = Some(line.to_string());
                }
            })
            .await
        );
        assert_eq!(last_stdout.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_relative_executable_resolves_in_working_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        std::fs::write(&tool, "#!/bin/sh\necho from-tool\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let spec = LaunchSpec::new("./tool").current_dir(dir.path());
        let mut out = Vec::new();

        let outcome = assert_ok!(run(&spec, |_, line| out.push(line.to_string())).await);
        assert!(outcome.is_success());
        assert_eq!(out, ["from-tool"]);
    }

    #[test]
    fn test_launch_path() {
        let relative = LaunchSpec::new("./bin/tool").current_dir("/work");
        assert_eq!(launch_path(&relative), Path::new("/work/./bin/tool"));

        let absolute = LaunchSpec::new("/opt/tool").current_dir("/work");
        assert_eq!(launch_path(&absolute), Path::new("/opt/tool"));

        let no_dir = LaunchSpec::new("./tool");
        assert_eq!(launch_path(&no_dir), Path::new("./tool"));
    }

    #[tokio::test]
    async fn test_pump_forwards_read_error() {
        let mock = tokio_test::io::Builder::new()
            .read(b"x\n")
            .read_error(io::Error::other("pipe broke"))
            .build();
        let (tx, mut rx) = mpsc::channel(4);

        pump(mock, StreamKind::Stderr, tx).await;

        assert!(matches!(
            rx.recv().await,
            Some(StreamMessage::Line(StreamKind::Stderr, ref line)) if line == "x"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(StreamMessage::Failed(StreamKind::Stderr, _))
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_read_failure_kills_once_and_keeps_draining() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(StreamMessage::Line(StreamKind::Stdout, "before".into())).await.unwrap();
        tx.send(StreamMessage::Failed(StreamKind::Stderr, io::Error::other("first"))).await.unwrap();
        tx.send(StreamMessage::Line(StreamKind::Stdout, "after".into())).await.unwrap();
        tx.send(StreamMessage::Failed(StreamKind::Stdout, io::Error::other("second"))).await.unwrap();
        drop(tx);

        let mut lines = Vec::new();
        let mut kills = 0;
        let failure = forward(
            &mut rx,
            &mut |_: StreamKind, line: &str| lines.push(line.to_string()),
            || kills += 1,
        )
        .await;

        assert_eq!(lines, ["before", "after"]);
        assert_eq!(kills, 1);
        let (stream, source) = failure.unwrap();
        assert_eq!(stream, StreamKind::Stderr);
        assert_eq!(source.to_string(), "first");
    }

    #[test]
    fn test_read_failure_becomes_stream_io_error() {
        use std::os::unix::process::ExitStatusExt;

        // SIGKILL, as left behind by the kill on read failure
        let killed = ExitStatus::from_raw(9);
        let failure = Some((StreamKind::Stdout, io::Error::other("pipe broke")));

        let err = finish("yt-dlp".into(), killed, failure).unwrap_err();
        assert!(matches!(
            err,
            YtGrabError::StreamIo { stream: StreamKind::Stdout, .. }
        ));

        let outcome = finish("yt-dlp".into(), ExitStatus::from_raw(0), None).unwrap();
        assert_eq!(outcome, RunOutcome::Success);
    }

    #[tokio::test]
    async fn test_dropping_run_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let spec = LaunchSpec::new("sh")
            .args(["-c", "sleep 1; touch \"$1\"", "sh"])
            .arg(marker.to_string_lossy());

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            run(&spec, |_, _| {}),
        )
        .await;
        assert!(timed_out.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[test]
    fn test_is_explicit_path() {
        assert!(!is_explicit_path(Path::new("yt-dlp")));
        assert!(is_explicit_path(Path::new("./yt-dlp")));
        assert!(is_explicit_path(Path::new("/usr/bin/yt-dlp")));
    }
}
