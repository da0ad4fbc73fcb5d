//! Helpers for running a QE child process with stdin fed and stdout captured.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Stdout decoded as text; invalid UTF-8 is replaced rather than rejected.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Run `cmd`, writing `stdin` to it and collecting stdout until it exits.
///
/// Stderr is inherited from the caller. Stdin and stdout are serviced on helper threads so a
/// child that produces output before consuming its input cannot deadlock. With `timeout` set the
/// child is started in its own process group and the whole group is killed once it elapses, so
/// grandchildren holding the stdout pipe die with it; `None` waits indefinitely.
#[instrument(skip_all, fields(stdin_bytes = stdin.len(), timeout = ?timeout))]
pub fn run_command(
    cmd: Command,
    stdin: &[u8],
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    run_with_waiter(cmd, stdin, timeout, wait_for)
}

fn run_with_waiter<W>(
    mut cmd: Command,
    stdin: &[u8],
    timeout: Option<Duration>,
    wait: W,
) -> Result<CommandOutput>
where
    W: FnOnce(&mut Child, Option<Duration>, bool) -> Result<(ExitStatus, bool)>,
{
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    let grouped = timeout.is_some() && own_process_group(&mut cmd);

    debug!(grouped, "spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let (Some(child_stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        reap(&mut child, grouped);
        return Err(anyhow!("stdio was not piped"));
    };
    let input = stdin.to_vec();
    let stdin_handle = thread::spawn(move || feed_stdin(child_stdin, &input));
    let stdout_handle = thread::spawn(move || read_stream(stdout));

    let waited = wait(&mut child, timeout, grouped);
    if let Err(e) = &waited {
        warn!(err = %e, "waiting on child failed, killing it");
        reap(&mut child, grouped);
    }

    let stdout = join_thread(stdout_handle).context("join stdout");
    // A child may exit without draining stdin; a broken pipe there is not an error.
    match join_thread(stdin_handle).context("join stdin") {
        Ok(Err(e)) => debug!(err = %e, "stdin not fully consumed"),
        Err(e) => debug!(err = %e, "stdin thread lost"),
        Ok(Ok(())) => {}
    }
    let (status, timed_out) = waited?;
    let stdout = stdout??;

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        timed_out,
    })
}

fn wait_for(
    child: &mut Child,
    timeout: Option<Duration>,
    grouped: bool,
) -> Result<(ExitStatus, bool)> {
    let Some(timeout) = timeout else {
        return Ok((child.wait().context("wait for command")?, false));
    };
    match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => Ok((status, false)),
        None => {
            warn!(timeout_secs = timeout.as_secs_f64(), "command timed out, killing");
            kill_tree(child, grouped).context("kill command")?;
            Ok((child.wait().context("wait command after kill")?, true))
        }
    }
}

/// Best-effort kill and wait after a failure; errors here are only logged.
fn reap(child: &mut Child, grouped: bool) {
    if let Err(e) = kill_tree(child, grouped) {
        debug!(err = %e, "kill after failure");
    }
    if let Err(e) = child.wait() {
        debug!(err = %e, "wait after failure");
    }
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) -> bool {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
    true
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) -> bool {
    false
}

/// Kill the child, and its whole process group when it leads one.
#[cfg(unix)]
fn kill_tree(child: &mut Child, grouped: bool) -> std::io::Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if grouped {
        let pgid = Pid::from_raw(child.id() as i32);
        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) => return Ok(()),
            Err(errno) => debug!(%errno, "killpg failed, killing child only"),
        }
    }
    child.kill()
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child, _grouped: bool) -> std::io::Result<()> {
    child.kill()
}

fn feed_stdin<W: Write>(mut writer: W, input: &[u8]) -> std::io::Result<()> {
    writer.write_all(input)?;
    writer.flush()
    // `writer` drops here, closing the pipe so the child sees EOF.
}

fn read_stream<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("read output")?;
    Ok(buf)
}

fn join_thread<T>(handle: thread::JoinHandle<T>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("io helper thread panicked"))
}
