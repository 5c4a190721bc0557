use super::machine::Machine;
use super::runtime::Step;
use super::{Address, Error};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// ## Activation records
///
/// A frame is four words on the stack, immediately below the
/// procedure's locals:
///
/// ```text
/// fp+0   static link     lexically enclosing frame
/// fp+2   dynamic link    caller's frame
/// fp+4   return address
/// fp+6   (callerLsp << 8) | nesting level
/// ```
///
/// Parameters and the function return slot are pushed by the caller
/// and addressed at negative offsets from `fp`; locals start at
/// `fp + ABOVE`. Following static links from any frame ends at the
/// outermost frame, whose encoded level is 0.

/// Byte distance from the frame base to the first local.
pub const ABOVE: u16 = 8;

impl Machine {
    pub(crate) fn stack_end(&self) -> u32 {
        self.spb as u32 + self.stk_size as u32
    }

    fn frame_at(&self, at: Address) -> Result<Address> {
        let a = at as u32;
        if a < self.spb as u32 || a + ABOVE as u32 > self.stack_end() || a & 1 != 0 {
            Err(error!(NestingLevel))
        } else {
            Ok(at)
        }
    }

    /// Build a frame for a procedure at nesting level `level` whose
    /// body starts at `target`. The static link is found by walking
    /// the caller's chain for the frame at `level - 1`.
    pub(crate) fn call(&mut self, level: u8, target: Address) -> Result<Step> {
        if level == 0 {
            return Err(error!(NestingLevel));
        }
        let want = (level - 1) as u16;
        let mut at = self.frame_at(self.fp)?;
        let mut hops = 0;
        let parent = loop {
            let packed = self.mem.uword(at + 6)?;
            let encoded = packed & 0x00FF;
            if encoded == want {
                break at;
            }
            if encoded == 0 || hops == 255 {
                return Err(error!(NestingLevel));
            }
            at = self.frame_at(self.mem.uword(at)?)?;
            hops += 1;
        };
        let ret = self.pc + 4;
        let base = self.sp;
        self.pushu(parent)?;
        self.pushu(self.fp)?;
        self.pushu(ret)?;
        self.pushu(((self.lsp as u16) << 8) | level as u16)?;
        self.fp = base;
        self.lsp = level;
        Ok(Step::Jump(target))
    }

    /// Tear the current frame down. Locals are dropped, the packed
    /// level word restores `lsp`, and the dynamic link restores `fp`.
    /// The stack returns to its depth at the matching call.
    pub(crate) fn ret(&mut self) -> Result<Step> {
        let base = self.frame_at(self.fp)?;
        self.sp = base + ABOVE;
        let packed = self.popu()?;
        let ret = self.popu()?;
        let dynamic = self.popu()?;
        let _static_link = self.popu()?;
        self.lsp = (packed >> 8) as u8;
        self.fp = dynamic;
        Ok(Step::Jump(ret))
    }

    /// Frame-relative address resolution: follow `levels` static
    /// links, then bias non-negative offsets past the frame words.
    pub(crate) fn resolve(&self, levels: u8, offset: i16) -> Result<Address> {
        let mut at = self.frame_at(self.fp)?;
        for _ in 0..levels {
            at = self.frame_at(self.mem.uword(at)?)?;
        }
        let addr = if offset >= 0 {
            at as i32 + ABOVE as i32 + offset as i32
        } else {
            at as i32 + offset as i32
        };
        if addr < 0 || addr as usize + 2 > self.mem.len() {
            Err(error!(MemoryFault))
        } else {
            Ok(addr as Address)
        }
    }
}
