/// Interactive order oracle: shows each group on the terminal and reads the
/// order back from a line of input.
use std::io::{self, BufRead, Write};

use batchrank_core::{Group, ItemId, OracleError, OrderOracle};

use crate::parse::parse_order;
use crate::prompt::{build_prompt, INPUT_HINT};

pub struct TerminalOracle<R, W> {
    input: R,
    output: W,
    names: Vec<String>,
}

impl<R: BufRead, W: Write> TerminalOracle<R, W> {
    pub fn new(input: R, output: W, names: Vec<String>) -> Self {
        TerminalOracle { input, output, names }
    }

    /// Print a line on the oracle's output (used for feedback between prompts).
    pub fn notice(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.output, "{msg}")?;
        self.output.flush()
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before the ranking finished"));
        }
        Ok(line)
    }
}

impl<R: BufRead, W: Write> OrderOracle for TerminalOracle<R, W> {
    fn request_order(&mut self, group: &Group) -> Result<Vec<ItemId>, OracleError> {
        let prompt = build_prompt(group, &self.names);
        write!(self.output, "{prompt}")?;

        // Unreadable tokens are re-asked here; orders that read fine but are
        // not a permutation go back to the session to be rejected.
        loop {
            write!(self.output, "{INPUT_HINT}")?;
            self.output.flush()?;
            let line = self.read_line()?;
            match parse_order(&line, group, &self.names) {
                Ok(order) => return Ok(order),
                Err(msg) => writeln!(self.output, "  {msg}. Try again.")?,
            }
        }
    }
}
