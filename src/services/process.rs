//! Process execution service for running git and the documentation generator.
//!
//! Handles spawning processes, streaming output, and log persistence.

use crate::domain::OutputStream;
use crate::error::{ProcessError, ProcessResult};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

/// An external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Stream output lines at info level instead of debug
    pub echo: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
            echo: false,
        }
    }

    pub fn echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Command line as it would be typed in a shell
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("\"{}\"", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands to completion
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> ProcessResult<CommandOutput>;
}

/// Append-only log file for one publish run
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl RunLog {
    /// Create a fresh log file in `log_dir` and write its header
    pub fn create(log_dir: &Path, repo: &Path, pages_branch: &str) -> ProcessResult<Self> {
        Self::create_at(log_dir, repo, pages_branch, &chrono_lite_timestamp())
    }

    fn create_at(
        log_dir: &Path,
        repo: &Path,
        pages_branch: &str,
        timestamp: &str,
    ) -> ProcessResult<Self> {
        let stem = format!("{}-{}", pages_branch.replace('/', "-"), timestamp);
        let log_err = |path: &Path, source: std::io::Error| ProcessError::Log {
            path: path.to_path_buf(),
            source,
        };

        if !log_dir.exists() {
            fs::create_dir_all(log_dir).map_err(|e| log_err(log_dir, e))?;
        }

        // Runs started within the same second get a numbered suffix
        let mut attempt = 0u32;
        let (path, mut file) = loop {
            let path = if attempt == 0 {
                log_dir.join(format!("{}.log", stem))
            } else {
                log_dir.join(format!("{}-{}.log", stem, attempt))
            };
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(log_err(&path, e)),
            }
        };

        writeln!(file, "# Publish: {}", pages_branch).map_err(|e| log_err(&path, e))?;
        writeln!(file, "# Started: {}", timestamp).map_err(|e| log_err(&path, e))?;
        writeln!(file, "# Repository: {}", repo.display()).map_err(|e| log_err(&path, e))?;
        writeln!(file, "---").map_err(|e| log_err(&path, e))?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one line; log failures are not worth aborting a publish for
    pub fn line(&self, text: &str) {
        if let Ok(mut file) = self.file.lock() {
            if let Err(e) = writeln!(file, "{}", text) {
                tracing::debug!("Could not write to run log {:?}: {}", self.path, e);
            }
        }
    }

    fn output(&self, stream: OutputStream, text: &str) {
        self.line(&format!("{} {}", stream.tag(), text));
    }
}

/// Runs commands with `std::process`, streaming output to tracing and the run log
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    log: Option<RunLog>,
}

impl SystemRunner {
    pub fn new(log: Option<RunLog>) -> Self {
        Self { log }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> ProcessResult<CommandOutput> {
        tracing::debug!("Running `{}` in {:?}", invocation.display(), invocation.cwd);
        if let Some(log) = &self.log {
            log.line(&format!("$ {}", invocation.display()));
        }

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().map(|pipe| {
            spawn_reader(pipe, OutputStream::Stdout, invocation.echo, self.log.clone())
        });
        let stderr = child.stderr.take().map(|pipe| {
            spawn_reader(pipe, OutputStream::Stderr, invocation.echo, self.log.clone())
        });

        let status = child.wait().map_err(|source| ProcessError::Wait {
            program: invocation.program.clone(),
            source,
        })?;

        let join = |handle: Option<std::thread::JoinHandle<String>>| {
            handle
                .and_then(|h| h.join().ok())
                .unwrap_or_default()
        };
        let output = CommandOutput {
            code: status.code(),
            stdout: join(stdout),
            stderr: join(stderr),
        };

        if let Some(log) = &self.log {
            match output.code {
                Some(code) => log.line(&format!("# exit {}", code)),
                None => log.line("# terminated by signal"),
            }
        }

        Ok(output)
    }
}

/// Read a pipe line by line on its own thread, returning everything read
fn spawn_reader<R>(
    pipe: R,
    stream: OutputStream,
    echo: bool,
    log: Option<RunLog>,
) -> std::thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let reader = BufReader::new(pipe);
        let mut collected = String::new();
        for line in reader.lines() {
            match line {
                Ok(text) => {
                    if echo {
                        tracing::info!("{}", text);
                    } else {
                        tracing::debug!("{:?}: {}", stream, text);
                    }
                    if let Some(log) = &log {
                        log.output(stream, &text);
                    }
                    collected.push_str(&text);
                    collected.push('\n');
                }
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", stream, e);
                    break;
                }
            }
        }
        collected
    })
}

/// Generate a simple timestamp without chrono dependency
fn chrono_lite_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}

/// Scripted runner used by unit tests to exercise sequencing without git
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

    /// Records every invocation and answers from a list of scripted responses
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<Invocation>>,
        responses: Mutex<Vec<(Matcher, CommandOutput)>>,
        missing: Mutex<Vec<String>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer invocations whose arguments start with `prefix`; later
        /// responses take precedence over earlier ones
        pub fn respond(&self, program: &str, prefix: &[&str], output: CommandOutput) -> &Self {
            let program = program.to_string();
            let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
            let matcher: Matcher = Box::new(move |inv: &Invocation| {
                inv.program == program && inv.args.starts_with(&prefix)
            });
            self.responses.lock().unwrap().push((matcher, output));
            self
        }

        pub fn stdout(&self, program: &str, prefix: &[&str], stdout: &str) -> &Self {
            self.respond(
                program,
                prefix,
                CommandOutput {
                    code: Some(0),
                    stdout: format!("{}\n", stdout),
                    stderr: String::new(),
                },
            )
        }

        pub fn fail(&self, program: &str, prefix: &[&str], code: i32, stderr: &str) -> &Self {
            self.respond(
                program,
                prefix,
                CommandOutput {
                    code: Some(code),
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                },
            )
        }

        /// Make `program` fail to start, as if it were not installed
        pub fn missing(&self, program: &str) -> &Self {
            self.missing.lock().unwrap().push(program.to_string());
            self
        }

        /// Command lines in the order they ran
        pub fn lines(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|inv| inv.display())
                .collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> ProcessResult<CommandOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.missing.lock().unwrap().contains(&invocation.program) {
                return Err(ProcessError::Spawn {
                    program: invocation.program.clone(),
                    source: std::io::Error::from(ErrorKind::NotFound),
                });
            }
            let responses = self.responses.lock().unwrap();
            let output = responses
                .iter()
                .rev()
                .find(|(matcher, _)| matcher(invocation))
                .map(|(_, output)| output.clone())
                .unwrap_or(CommandOutput {
                    code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                });
            Ok(output)
        }
    }
}
