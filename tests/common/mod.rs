#![allow(dead_code)]

use pcode::mach::codes::ARG8;
use pcode::mach::{Event, Image, Layout, Machine};

/// Hand assembler for test programs.
pub struct Asm {
    pub code: Vec<u8>,
    pub rodata: Vec<u8>,
}

impl Asm {
    pub fn new() -> Asm {
        Asm {
            code: vec![],
            rodata: vec![],
        }
    }

    pub fn here(&self) -> u16 {
        self.code.len() as u16
    }

    pub fn op(&mut self, op: u8) -> &mut Asm {
        self.code.push(op);
        self
    }

    pub fn op8(&mut self, op: u8, b: u8) -> &mut Asm {
        self.code.push(op);
        self.code.push(b);
        self
    }

    pub fn op16(&mut self, op: u8, w: u16) -> &mut Asm {
        self.code.push(op);
        self.code.extend_from_slice(&w.to_le_bytes());
        self
    }

    pub fn op24(&mut self, op: u8, b: u8, w: u16) -> &mut Asm {
        self.code.push(op);
        self.code.push(b);
        self.code.extend_from_slice(&w.to_le_bytes());
        self
    }

    /// Back-patch the 16-bit argument of the instruction at `at`.
    pub fn patch_arg16(&mut self, at: u16, w: u16) {
        let i = at as usize;
        let off = if self.code[i] & ARG8 != 0 { 2 } else { 1 };
        self.code[i + off..i + off + 2].copy_from_slice(&w.to_le_bytes());
    }

    /// Place bytes in the read-only data image, returning their
    /// offset from the read-only base.
    pub fn ro(&mut self, bytes: &[u8]) -> u16 {
        let at = self.rodata.len() as u16;
        self.rodata.extend_from_slice(bytes);
        at
    }
}

pub fn machine(a: Asm) -> Machine {
    let max_pc = a.code.len() as u16;
    Machine::new(
        Image {
            code: a.code,
            entry: 0,
            max_pc,
            rodata: a.rodata,
        },
        Layout {
            strings: 1024,
            stack: 4096,
            heap: 4096,
        },
    )
    .unwrap()
}

pub fn exit_code(m: &mut Machine) -> i16 {
    match m.execute(100_000) {
        Event::Exited(code) => code,
        other => panic!("expected exit, got {:?}", other),
    }
}

pub fn error_code(m: &mut Machine) -> u16 {
    match m.execute(100_000) {
        Event::Failed(e) => e.code(),
        other => panic!("expected failure, got {:?}", other),
    }
}
