use super::fileio::FileTable;
use super::heap::{Heap, ALLOC_UNIT};
use super::memory::Memory;
use super::string::Strings;
use super::{opcode, Address, Error, Word};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// What the compiler and linker hand us: the instruction stream and
/// the read-only data blob.
pub struct Image {
    pub code: Vec<u8>,
    pub entry: Address,
    pub max_pc: Address,
    pub rodata: Vec<u8>,
}

/// Sizes of the caller-configured data regions, in bytes. Each must
/// be a multiple of 16; everything together with the read-only data
/// must fit the 16-bit address space.
#[derive(Clone, Copy)]
pub struct Layout {
    pub strings: u16,
    pub stack: u16,
    pub heap: u16,
}

impl Default for Layout {
    fn default() -> Layout {
        Layout {
            strings: 4096,
            stack: 16384,
            heap: 16384,
        }
    }
}

/// Result of driving the machine.
#[derive(Debug)]
pub enum Event {
    /// More instructions to run.
    Running,
    /// The program ended or called exit.
    Exited(Word),
    /// A fatal machine error. The machine state is left as it was
    /// when the fault was detected.
    Failed(Error),
}

/// ## The machine
///
/// Registers, instruction space, data memory, and the file table.
/// Nothing is global; independent machines are fully isolated.
pub struct Machine {
    code: Vec<u8>,
    entry: Address,
    max_pc: Address,
    ro_image: Vec<u8>,
    pub(crate) mem: Memory,
    pub(crate) pc: Address,
    pub(crate) sp: Address,
    pub(crate) fp: Address,
    pub(crate) spb: Address,
    pub(crate) stk_size: u16,
    pub(crate) lsp: u8,
    pub(crate) rop: Address,
    pub(crate) strings: Strings,
    pub(crate) heap: Heap,
    pub(crate) files: FileTable,
    pub(crate) exit_code: Word,
}

impl Machine {
    pub fn new(image: Image, layout: Layout) -> Result<Machine> {
        if layout.strings % ALLOC_UNIT != 0
            || layout.stack % ALLOC_UNIT != 0
            || layout.heap % ALLOC_UNIT != 0
        {
            return Err(error!(InternalError; "LAYOUT NOT ALIGNED"));
        }
        if layout.stack < 2 * ALLOC_UNIT {
            return Err(error!(InternalError; "STACK TOO SMALL"));
        }
        if image.max_pc as usize > image.code.len() {
            return Err(error!(InternalError; "BAD IMAGE"));
        }
        let ro_size = (image.rodata.len() + ALLOC_UNIT as usize - 1) & !(ALLOC_UNIT as usize - 1);
        let total = layout.strings as usize + ro_size + layout.stack as usize + layout.heap as usize;
        if total > 0x1_0000 {
            return Err(error!(InternalError; "LAYOUT TOO LARGE"));
        }
        let rop = layout.strings;
        let spb = rop + ro_size as u16;
        // a zero-size heap may start exactly at the 64K boundary
        let hpb = (spb as u32 + layout.stack as u32) as u16;
        let mut machine = Machine {
            code: image.code,
            entry: image.entry,
            max_pc: image.max_pc,
            ro_image: image.rodata,
            mem: Memory::new(total),
            pc: image.entry,
            sp: spb,
            fp: spb,
            spb,
            stk_size: layout.stack,
            lsp: 0,
            rop,
            strings: Strings::new(0, layout.strings),
            heap: Heap::new(hpb, layout.heap),
            files: FileTable::new(),
            exit_code: 0,
        };
        machine.reset()?;
        Ok(machine)
    }

    /// Reinitialize registers, heap, string stack, and files without
    /// reallocating the buffer. The read-only data is re-imaged.
    pub fn reset(&mut self) -> Result<()> {
        self.mem.clear();
        self.mem.write(self.rop, &self.ro_image)?;
        self.strings.reset();
        self.heap.reset(&mut self.mem)?;
        self.files.reset();
        self.exit_code = 0;
        self.pc = self.entry;
        self.lsp = 0;
        self.fp = self.spb;
        self.sp = self.spb;
        // outermost frame: linked to itself, level 0
        self.pushu(self.spb)?;
        self.pushu(self.spb)?;
        self.pushu(self.max_pc)?;
        self.pushu(0)?;
        Ok(())
    }

    /// Execute one instruction. Breakpoint and trace hooks belong to
    /// the caller: inspect registers and memory between steps.
    pub fn step(&mut self) -> Event {
        let at = self.pc;
        match self.fetch_exec() {
            Ok(None) => Event::Running,
            Ok(Some(code)) => Event::Exited(code),
            Err(e) => Event::Failed(e.or_pc(at)),
        }
    }

    /// Run up to `cycles` instructions.
    pub fn execute(&mut self, cycles: usize) -> Event {
        for _ in 0..cycles {
            match self.step() {
                Event::Running => {}
                event => return event,
            }
        }
        Event::Running
    }

    fn fetch_exec(&mut self) -> Result<Option<Word>> {
        let pc = self.pc as usize;
        if pc >= self.max_pc as usize {
            return Err(error!(BadPc));
        }
        let op = self.code[pc];
        let width = opcode::width(op) as usize;
        if pc + width > self.max_pc as usize {
            return Err(error!(BadPc));
        }
        let b = if op & opcode::ARG8 != 0 {
            self.code[pc + 1]
        } else {
            0
        };
        let w = if op & opcode::ARG16 != 0 {
            let lo = pc + width - 2;
            u16::from_le_bytes([self.code[lo], self.code[lo + 1]])
        } else {
            0
        };
        match self.exec(op, b, w)? {
            super::runtime::Step::Continue => {
                self.pc = (pc + width) as Address;
                Ok(None)
            }
            super::runtime::Step::Jump(target) => {
                self.pc = target;
                Ok(None)
            }
            super::runtime::Step::Halt(code) => {
                self.exit_code = code;
                Ok(Some(code))
            }
        }
    }

    // *** Evaluation stack

    pub(crate) fn push(&mut self, val: Word) -> Result<()> {
        if self.sp as u32 + 2 > self.stack_end() {
            return Err(error!(StackOverflow));
        }
        self.mem.set_word(self.sp, val)?;
        self.sp += 2;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<Word> {
        if self.sp < self.spb + 2 {
            return Err(error!(StackUnderflow));
        }
        self.sp -= 2;
        self.mem.word(self.sp)
    }

    pub(crate) fn pop_2(&mut self) -> Result<(Word, Word)> {
        let two = self.pop()?;
        let one = self.pop()?;
        Ok((one, two))
    }

    pub(crate) fn pushu(&mut self, val: u16) -> Result<()> {
        self.push(val as Word)
    }

    pub(crate) fn popu(&mut self) -> Result<u16> {
        Ok(self.pop()? as u16)
    }

    /// Longs are two words, low pushed first.
    pub(crate) fn push_long(&mut self, val: i32) -> Result<()> {
        self.pushu((val as u32 & 0xFFFF) as u16)?;
        self.pushu((val as u32 >> 16) as u16)
    }

    pub(crate) fn pop_long(&mut self) -> Result<i32> {
        let hi = self.popu()? as u32;
        let lo = self.popu()? as u32;
        Ok(((hi << 16) | lo) as i32)
    }

    pub(crate) fn push_real(&mut self, val: f32) -> Result<()> {
        self.push_long(val.to_bits() as i32)
    }

    pub(crate) fn pop_real(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.pop_long()? as u32))
    }

    // *** Inspection, for drivers and the source-level debugger

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn sp(&self) -> Address {
        self.sp
    }

    pub fn fp(&self) -> Address {
        self.fp
    }

    pub fn lsp(&self) -> u8 {
        self.lsp
    }

    pub fn csp(&self) -> Address {
        self.strings.csp()
    }

    pub fn rop(&self) -> Address {
        self.rop
    }

    pub fn spb(&self) -> Address {
        self.spb
    }

    pub fn hpb(&self) -> Address {
        self.heap.base()
    }

    pub fn entry(&self) -> Address {
        self.entry
    }

    pub fn max_pc(&self) -> Address {
        self.max_pc
    }

    pub fn exit_code(&self) -> Word {
        self.exit_code
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn peek_word(&self, addr: Address) -> Result<Word> {
        self.mem.word(addr)
    }

    pub fn peek_byte(&self, addr: Address) -> Result<u8> {
        self.mem.byte(addr)
    }
}
