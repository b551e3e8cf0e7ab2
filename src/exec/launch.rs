// src/exec/launch.rs

//! Builds the `tokio::process::Command` for one invocation.

use std::io;
use std::process::Stdio;

use tokio::process::Command;

use super::environment::EnvironmentDescriptor;
use super::error::ExecError;
use crate::types::LaunchMode;

/// A ready-to-spawn command plus a printable form of it for logs.
pub(crate) struct LaunchSpec {
    pub command: Command,
    pub display: String,
}

/// Build the launch specification for `command_line`.
///
/// `command_line` is the script path plus its arguments, already quoted by
/// the caller. Environment activation always happens before the interpreter
/// starts:
///
/// - `Activate`: one shell runs `. <activate> <env> && <python> <command_line>`,
///   so whatever the activation script exports (`PATH`, ...) is visible to the
///   interpreter.
/// - `CondaRun`: no shell; `conda run` prepares the environment and then
///   execs the interpreter with the split arguments.
pub(crate) fn build_launch(
    env: &EnvironmentDescriptor,
    command_line: &str,
) -> Result<LaunchSpec, ExecError> {
    let (mut command, display) = match env.launch_mode() {
        LaunchMode::Activate => activate_command(env, command_line)?,
        LaunchMode::CondaRun => conda_run_command(env, command_line)?,
    };

    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so a timeout can take down every descendant.
    #[cfg(unix)]
    command.process_group(0);

    if let Some(dir) = env.working_dir() {
        command.current_dir(dir);
    }

    Ok(LaunchSpec { command, display })
}

fn activate_command(
    env: &EnvironmentDescriptor,
    command_line: &str,
) -> Result<(Command, String), ExecError> {
    let interpreter = env.interpreter().to_string_lossy();

    if cfg!(windows) {
        let line = format!(
            "\"{}\" activate {} && {} {}",
            interpreter,
            env.environment(),
            env.python(),
            command_line
        );
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&line);
        return Ok((c, format!("cmd /C {line}")));
    }

    let line = format!(
        ". {} {} && {} {}",
        quote(&interpreter, env.shell())?,
        quote(env.environment(), env.shell())?,
        quote(env.python(), env.shell())?,
        command_line
    );
    let mut c = Command::new(env.shell());
    c.arg("-c").arg(&line);
    Ok((c, format!("{} -c {}", env.shell(), line)))
}

fn conda_run_command(
    env: &EnvironmentDescriptor,
    command_line: &str,
) -> Result<(Command, String), ExecError> {
    let program = env.interpreter().to_string_lossy().into_owned();
    let args = shlex::split(command_line).ok_or_else(|| ExecError::LaunchFailed {
        program: program.clone(),
        source: io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("command line has unbalanced quoting: {command_line}"),
        ),
    })?;

    let mut c = Command::new(&program);
    c.arg("run")
        .arg("-n")
        .arg(env.environment())
        .arg("--no-capture-output")
        .arg(env.python())
        .args(&args);

    let display = format!(
        "{} run -n {} --no-capture-output {} {}",
        program,
        env.environment(),
        env.python(),
        command_line
    );
    Ok((c, display))
}

fn quote(value: &str, program: &str) -> Result<String, ExecError> {
    shlex::try_quote(value)
        .map(|q| q.into_owned())
        .map_err(|e| ExecError::LaunchFailed {
            program: program.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, e.to_string()),
        })
}
