use log::{debug, warn};
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::position::Fen;

/// Anything that can tell us the best line of play from a position.
pub trait Analyser {
    fn principal_variation(&mut self, fen: &Fen, depth: u32) -> Result<Vec<String>, Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineOption {
    pub name: String,
    pub value: String,
}

impl std::str::FromStr for EngineOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(name), Some(value)) if !name.trim().is_empty() => Ok(EngineOption {
                name: name.trim().to_owned(),
                value: value.trim().to_owned(),
            }),
            _ => Err(Error::InvalidEngineOption(s.to_owned())),
        }
    }
}

static QUIT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// A UCI engine running as a child process. The process lives exactly as long as
/// this value: dropping it sends `quit` and reaps the child.
pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl UciEngine {
    pub fn spawn<I, S>(program: &str, args: I, options: &[EngineOption]) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Engine(format!("failed to start '{}': {}", program, e)))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (stdin, stdout) = match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Engine("engine pipes are unavailable".to_owned()));
            }
        };

        let mut engine = UciEngine {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };
        engine.write_line("uci")?;
        engine.read_until("uciok")?;
        for option in options {
            engine.write_line(&format!(
                "setoption name {} value {}",
                option.name, option.value
            ))?;
        }
        engine.write_line("isready")?;
        engine.read_until("readyok")?;
        Ok(engine)
    }

    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        debug!("engine << {}", line);
        writeln!(self.stdin, "{}", line)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| Error::Engine(format!("failed to write to engine: {}", e)))
    }

    fn read_line(&mut self) -> Result<String, Error> {
        let mut buf = String::new();
        let read = self
            .stdout
            .read_line(&mut buf)
            .map_err(|e| Error::Engine(format!("failed to read from engine: {}", e)))?;
        if read == 0 {
            return Err(Error::Engine("engine closed its output".to_owned()));
        }
        let line = buf.trim_end_matches(&['\r', '\n'][..]).to_owned();
        debug!("engine >> {}", line);
        Ok(line)
    }

    fn read_until(&mut self, token: &str) -> Result<(), Error> {
        loop {
            if self.read_line()?.trim() == token {
                return Ok(());
            }
        }
    }

    /// Sends `quit` and waits for the child to exit. `Ok(false)` means it was
    /// still running when the grace period ran out.
    fn quit(&mut self) -> std::io::Result<bool> {
        let _ = self.write_line("quit");
        let start = Instant::now();
        loop {
            if self.child.try_wait()?.is_some() {
                return Ok(true);
            }
            if start.elapsed() >= QUIT_GRACE_PERIOD {
                return Ok(false);
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Analyser for UciEngine {
    fn principal_variation(&mut self, fen: &Fen, depth: u32) -> Result<Vec<String>, Error> {
        self.write_line("ucinewgame")?;
        self.write_line(&format!("position fen {}", fen.fen_str()))?;
        self.write_line(&format!("go depth {}", depth))?;

        let mut pv = Vec::new();
        loop {
            let line = self.read_line()?;
            if let Some(line_pv) = parse_info_pv(&line) {
                pv = line_pv;
            } else if let Some(best) = parse_bestmove(&line) {
                return Ok(select_line(best, pv));
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        match self.quit() {
            Ok(true) => return,
            Ok(false) => warn!("Engine did not quit in time; killing it"),
            Err(e) => warn!("Could not check whether the engine quit ({}); killing it", e),
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn parse_info_pv(line: &str) -> Option<Vec<String>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("info") {
        return None;
    }
    // `pv` is always the last field of an info line
    let mut tokens = tokens.skip_while(|token| *token != "pv");
    tokens.next()?;
    let pv: Vec<String> = tokens.map(|s| s.to_owned()).collect();
    if pv.is_empty() {
        None
    } else {
        Some(pv)
    }
}

fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }
    match tokens.next() {
        None | Some("(none)") | Some("0000") => Some(None),
        Some(mv) => Some(Some(mv.to_owned())),
    }
}

fn select_line(best: Option<String>, pv: Vec<String>) -> Vec<String> {
    match best {
        None => Vec::new(),
        Some(best) if pv.first() == Some(&best) => pv,
        Some(best) => vec![best],
    }
}
