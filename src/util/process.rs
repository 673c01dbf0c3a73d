//! Spawning tools and capturing what they print.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{anyhow, Context, Result};

const READ_BUFFER_SIZE: usize = 4096;

/// A command line plus the environment and directory it runs in.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, |pb, a| pb.arg(a))
    }

    /// Set a variable for the child. Later values for the same key win.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.env.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run the command, draining stdout and stderr on one reader thread
    /// each and handing every chunk read to the matching callback.
    ///
    /// Blocks until the child exits and both readers have finished, then
    /// returns the exit code (`-1` if the child was killed by a signal).
    pub fn exec_streaming<O, E>(&self, on_stdout: O, on_stderr: E) -> Result<i32>
    where
        O: FnMut(&[u8]) + Send,
        E: FnMut(&[u8]) + Send,
    {
        let mut child = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, out, err) = thread::scope(|scope| {
            let out = scope.spawn(move || drain(stdout, on_stdout));
            let err = scope.spawn(move || drain(stderr, on_stderr));
            let status = child.wait();
            (status, out.join(), err.join())
        });

        let status = status
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;

        for reader in [out, err] {
            reader
                .map_err(|_| anyhow!("output reader for `{}` panicked", self.program.display()))?
                .with_context(|| {
                    format!("failed to read output of `{}`", self.program.display())
                })?;
        }

        Ok(status.code().unwrap_or(-1))
    }

    /// Run the command and collect both streams as lines.
    pub fn exec_lines(&self) -> Result<(i32, Vec<String>)> {
        let mut stdout = Lines::new();
        let mut stderr = Lines::new();

        let code = self.exec_streaming(|chunk| stdout.feed(chunk), |chunk| stderr.feed(chunk))?;

        let mut lines = stdout.into_lines();
        lines.extend(stderr.into_lines());
        Ok((code, lines))
    }

    /// Run the command with inherited standard streams.
    pub fn status(&self) -> Result<ExitStatus> {
        self.command()
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))
    }

    /// The command line, for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

fn drain<R, F>(stream: Option<R>, mut callback: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(&[u8]),
{
    let Some(mut stream) = stream else {
        return Ok(());
    };

    let mut buffer = [0u8; READ_BUFFER_SIZE];
    loop {
        match stream.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => callback(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Accumulates a byte stream and splits it into lines.
///
/// Lines end at `\n`; `\r` is dropped. A trailing unterminated line is kept.
#[derive(Debug, Default, Clone)]
pub struct Lines {
    data: Vec<u8>,
}

impl Lines {
    pub fn new() -> Self {
        Lines { data: Vec::new() }
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    pub fn into_lines(self) -> Vec<String> {
        let text = String::from_utf8_lossy(&self.data);
        let mut lines = Vec::new();
        let mut line = String::new();

        for ch in text.chars() {
            match ch {
                '\n' => lines.push(std::mem::take(&mut line)),
                '\r' => {}
                _ => line.push(ch),
            }
        }

        if !line.is_empty() {
            lines.push(line);
        }

        lines
    }
}

/// Look `name` up on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
