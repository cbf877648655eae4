// Interactive session loop: read a line, run a turn, print the answer.

use std::io::{BufRead, Write};

use crate::turn::TurnOrchestrator;

/// Sentinel input ending the session. Case-sensitive exact match after
/// trimming.
pub const QUIT_COMMAND: &str = "quit";

/// Printed (and flushed) before each read.
pub const INPUT_PROMPT: &str = "you: ";

/// Prefix on every emitted answer line.
pub const ANSWER_PREFIX: &str = "answer: ";

/// Strictly sequential chat loop over arbitrary input/output streams.
///
/// Each non-sentinel line is handed to the orchestrator and the loop blocks
/// until that turn completes; no two turns are ever in flight. Turn errors
/// are reported on the output stream and the loop continues. End of input
/// ends the session cleanly.
pub struct Session<R, W> {
    input: R,
    output: W,
    orchestrator: TurnOrchestrator,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, orchestrator: TurnOrchestrator) -> Self {
        Self {
            input,
            output,
            orchestrator,
        }
    }

    pub async fn run(mut self) -> std::io::Result<()> {
        loop {
            write!(self.output, "{INPUT_PROMPT}")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let line = line.trim_end_matches(['\r', '\n']);

            if line.trim() == QUIT_COMMAND {
                writeln!(self.output, "{ANSWER_PREFIX}bye")?;
                return Ok(());
            }

            match self.orchestrator.run_turn(line).await {
                Ok(answer) => writeln!(self.output, "{ANSWER_PREFIX}{answer}")?,
                Err(err) => match err.status_code {
                    Some(status) => {
                        writeln!(self.output, "error: {status} - {}", err.message)?
                    }
                    None => writeln!(self.output, "error: {err}")?,
                },
            }
        }
    }
}
