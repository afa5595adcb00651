//! The run loop
//!
//! Repeatedly steps a hart and appends each trace record to the trace
//! sink until an ebreak halts execution. Memory effects of one
//! instruction are fully visible to the next because everything runs
//! sequentially on the one hart.

use std::io::{self, Write};

use log::trace;
use thiserror::Error;

use crate::hart::{ExecutionError, Hart};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
    #[error("failed to write trace: {0}")]
    Io(#[from] io::Error),
    #[error("no ebreak within {0} instructions")]
    StepLimitExceeded(u64),
}

/// Statistics for a completed run
#[derive(Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of instructions executed, ebreak included
    pub instructions: u64,
}

/// Run the hart from its current state until ebreak
///
/// Each executed instruction appends one line to the trace sink
/// (inert System encodings append nothing). With a step limit set,
/// a program that fails to halt in time is an error rather than an
/// endless loop.
pub fn run_to_halt<W: Write>(
    hart: &mut Hart,
    sink: &mut W,
    max_steps: Option<u64>,
) -> Result<RunSummary, RunError> {
    let mut instructions = 0;
    loop {
        let outcome = hart.step()?;
        instructions += 1;
        if let Some(record) = outcome.record {
            trace!("{record}");
            writeln!(sink, "{record}")?;
        }
        if outcome.halt {
            sink.flush()?;
            return Ok(RunSummary { instructions });
        }
        if max_steps.is_some_and(|limit| instructions >= limit) {
            sink.flush()?;
            return Err(RunError::StepLimitExceeded(instructions));
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::hart::memory::{Wordsize, MEM_BASE};
    use crate::instr::encode::*;

    fn hart_with_program(words: &[u32]) -> Hart {
        let mut hart = Hart::new();
        for (n, word) in words.iter().enumerate() {
            hart.memory
                .write(MEM_BASE + 4 * n as u32, *word, Wordsize::Word)
                .unwrap();
        }
        hart
    }

    #[test]
    fn check_runs_to_ebreak() {
        let mut hart = hart_with_program(&[addi(10, 0, 5), addi(11, 0, 7), ebreak()]);
        let mut sink = Vec::new();
        let summary = run_to_halt(&mut hart, &mut sink, None).unwrap();
        assert_eq!(summary.instructions, 3);
        assert_eq!(hart.registers.read(10), 5);
        assert_eq!(hart.registers.read(11), 7);
        let text = String::from_utf8(sink).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("ebreak\n"));
    }

    #[test]
    fn check_step_limit() {
        // jal zero, 0 spins forever
        let mut hart = hart_with_program(&[jal(0, 0)]);
        let mut sink = Vec::new();
        let result = run_to_halt(&mut hart, &mut sink, Some(10));
        assert!(matches!(result, Err(RunError::StepLimitExceeded(10))));
    }

    #[test]
    fn check_inert_system_words_add_no_lines() {
        // ecall between two traced instructions
        let mut hart = hart_with_program(&[addi(10, 0, 1), 0x0000_0073, ebreak()]);
        let mut sink = Vec::new();
        let summary = run_to_halt(&mut hart, &mut sink, None).unwrap();
        assert_eq!(summary.instructions, 3);
        let text = String::from_utf8(sink).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
