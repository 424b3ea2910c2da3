//! Top-level eForth system.
//!
//! Owns the VM and the assembled kernel. Construction assembles the
//! dictionary; `run()` enters the boot vector at address 0 and returns when
//! the session ends (`BYE` or end of scripted input).

use eforth_core::{Console, Observable, Value};
use eforth_kernel::{Kernel, assemble, layout};
use eforth_vm::{Memory, Vm, VmConfig};

use crate::console::ScriptConsole;

/// Configuration for creating an eForth instance.
#[derive(Debug, Clone, Copy)]
pub struct EforthConfig {
    /// Memory image size in bytes (power of two).
    pub memory_bytes: usize,
    /// Data-stack capacity in cells (power of two).
    pub data_cells: usize,
    /// Return-stack capacity in cells (power of two).
    pub return_cells: usize,
}

impl Default for EforthConfig {
    fn default() -> Self {
        Self {
            memory_bytes: 0x1_0000,
            data_cells: 256,
            return_cells: 256,
        }
    }
}

/// An eForth system: assembled kernel plus VM.
pub struct Eforth<C: Console> {
    vm: Vm<C>,
    kernel: Kernel,
}

impl<C: Console> Eforth<C> {
    /// Assemble the kernel into a fresh image and wire up the VM.
    ///
    /// # Panics
    ///
    /// Panics if the configured capacities are not powers of two or the
    /// image is too small for the kernel.
    #[must_use]
    pub fn new(config: &EforthConfig, console: C) -> Self {
        let mut mem = Memory::new(config.memory_bytes);
        let kernel = assemble(&mut mem);
        assert!(
            (kernel.here as usize) < config.memory_bytes,
            "kernel does not fit the configured image"
        );
        let vm_config = VmConfig {
            data_cells: config.data_cells,
            return_cells: config.return_cells,
        };
        Self {
            vm: Vm::new(mem, &vm_config, console),
            kernel,
        }
    }

    /// Run from the boot vector until the session ends.
    pub fn run(&mut self) {
        self.vm.run();
    }

    /// Execute one VM step (for hosts that interleave work).
    pub fn step(&mut self) {
        self.vm.step();
    }

    /// The underlying VM.
    #[must_use]
    pub fn vm(&self) -> &Vm<C> {
        &self.vm
    }

    /// Mutable access to the underlying VM.
    pub fn vm_mut(&mut self) -> &mut Vm<C> {
        &mut self.vm
    }

    /// Key addresses of the assembled kernel.
    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Current numeric base.
    #[must_use]
    pub fn base(&self) -> i32 {
        self.vm.memory().cell(layout::BASE)
    }

    /// Dictionary write cursor (`CP`).
    #[must_use]
    pub fn here(&self) -> u32 {
        self.vm.memory().cell(layout::CP) as u32
    }

    /// NFA of the most recently committed word (`CONTEXT`).
    #[must_use]
    pub fn context(&self) -> u32 {
        self.vm.memory().cell(layout::CONTEXT) as u32
    }

    /// Current evaluator CFA (`'EVAL`).
    #[must_use]
    pub fn eval_vector(&self) -> u32 {
        self.vm.memory().cell(layout::TEVAL) as u32
    }

    /// Walk the dictionary, newest first, returning each word's name.
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        let mem = self.vm.memory();
        let mut names = Vec::new();
        let mut nfa = self.context();
        while nfa != 0 && names.len() < 4096 {
            let len = usize::from(mem.byte(nfa) & 0x1F);
            names.push(String::from_utf8_lossy(&mem.slice(nfa + 1, len)).into_owned());
            nfa = mem.cell(nfa - 4) as u32;
        }
        names
    }

    /// Host-side dictionary lookup (case-insensitive). Returns the CFA.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<u32> {
        let mem = self.vm.memory();
        let mut nfa = self.context();
        while nfa != 0 {
            let len = usize::from(mem.byte(nfa) & 0x1F);
            let entry = mem.slice(nfa + 1, len);
            if entry.len() == name.len()
                && entry
                    .iter()
                    .zip(name.as_bytes())
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
            {
                return Some((nfa + 1 + len as u32 + 3) & !3);
            }
            nfa = mem.cell(nfa - 4) as u32;
        }
        None
    }
}

impl Eforth<ScriptConsole> {
    /// Build a scripted session: `script` is the whole terminal input.
    #[must_use]
    pub fn scripted(config: &EforthConfig, script: &str) -> Self {
        Self::new(config, ScriptConsole::new(script))
    }

    /// Everything written to the terminal so far.
    #[must_use]
    pub fn output(&self) -> String {
        self.vm.console().output_string()
    }
}

impl<C: Console> Observable for Eforth<C> {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "base" => Some(Value::I32(self.base())),
            "cp" => Some(Value::U32(self.here())),
            "context" => Some(Value::U32(self.context())),
            "eval" => Some(Value::U32(self.eval_vector())),
            ">in" => Some(Value::I32(self.vm.memory().cell(layout::TO_IN))),
            "#tib" => Some(Value::I32(self.vm.memory().cell(layout::NTIB))),
            _ => self.vm.query(path),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "base", "cp", "context", "eval", ">in", "#tib", "pc", "ip", "wp", "tos", "s", "r",
            "running",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_assembles_kernel() {
        let forth = Eforth::scripted(&EforthConfig::default(), "");
        assert!(forth.here() > layout::DICT);
        assert_eq!(forth.base(), 10);
        assert_eq!(forth.eval_vector(), forth.kernel().interpret);
    }

    #[test]
    fn words_lists_newest_first() {
        let forth = Eforth::scripted(&EforthConfig::default(), "");
        let words = forth.words();
        assert_eq!(words.first().map(String::as_str), Some("IMMEDIATE"));
        assert!(words.iter().any(|w| w == "DUP"));
    }

    #[test]
    fn find_is_case_insensitive() {
        let forth = Eforth::scripted(&EforthConfig::default(), "");
        let a = forth.find("dup");
        let b = forth.find("DUP");
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(forth.find("no-such-word"), None);
    }

    #[test]
    fn observable_covers_user_cells() {
        let forth = Eforth::scripted(&EforthConfig::default(), "");
        assert_eq!(forth.query("base"), Some(Value::I32(10)));
        assert!(forth.query("pc").is_some());
        assert_eq!(forth.query("nope"), None);
    }
}
