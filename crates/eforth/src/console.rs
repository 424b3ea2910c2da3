//! Console implementations.

use std::collections::VecDeque;
use std::io::{Read, Write};

use eforth_core::Console;

/// Interactive console over stdin/stdout.
///
/// `read_char` blocks for one byte and returns `None` only when stdin
/// closes. Pending output is flushed before every read so prompts appear
/// even without a trailing newline.
pub struct StdioConsole {
    /// Bytes served before stdin (e.g. a file evaluated at startup).
    pending: VecDeque<u8>,
}

impl StdioConsole {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Queue bytes to be read before stdin.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }
}

impl Default for StdioConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdioConsole {
    fn read_char(&mut self) -> Option<u8> {
        if let Some(c) = self.pending.pop_front() {
            return Some(c);
        }
        let _ = std::io::stdout().flush();
        let mut buf = [0u8; 1];
        match std::io::stdin().read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn write_char(&mut self, c: u8) {
        let mut out = std::io::stdout();
        let _ = out.write_all(&[c]);
        if c == b'\n' {
            let _ = out.flush();
        }
    }
}

/// Scripted console: input from a fixed string, output captured.
///
/// Returns `None` once the script is exhausted, which ends the session —
/// the scripted equivalent of `BYE`.
pub struct ScriptConsole {
    input: Vec<u8>,
    cursor: usize,
    output: Vec<u8>,
}

impl ScriptConsole {
    #[must_use]
    pub fn new(script: &str) -> Self {
        Self {
            input: script.as_bytes().to_vec(),
            cursor: 0,
            output: Vec::new(),
        }
    }

    /// Everything the VM has written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output as a string (lossy; the VM emits only ASCII).
    #[must_use]
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Console for ScriptConsole {
    fn read_char(&mut self) -> Option<u8> {
        let c = self.input.get(self.cursor).copied();
        self.cursor += 1;
        c
    }

    fn write_char(&mut self, c: u8) {
        self.output.push(c);
    }
}
