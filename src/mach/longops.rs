use super::machine::Machine;
use super::opcode::*;
use super::runtime::Step;
use super::Error;
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// ## 32-bit integer operations
///
/// Longs live on the stack as two words, low word pushed first, and
/// in memory as two consecutive words, low word at the lower offset.
/// Decomposing and recomposing is exact for every bit pattern.

impl Machine {
    pub(crate) fn long_op(&mut self, sub: u8) -> Result<Step> {
        match sub {
            L_ADD => self.long_binary(|a, b| a.wrapping_add(b))?,
            L_SUB => self.long_binary(|a, b| a.wrapping_sub(b))?,
            L_MUL => self.long_binary(|a, b| a.wrapping_mul(b))?,
            L_DIV => {
                let b = self.pop_long()?;
                let a = self.pop_long()?;
                if b == 0 {
                    return Err(error!(DivisionByZero));
                }
                self.push_long(a.wrapping_div(b))?;
            }
            L_MOD => {
                let b = self.pop_long()?;
                let a = self.pop_long()?;
                if b == 0 {
                    return Err(error!(DivisionByZero));
                }
                self.push_long(a.wrapping_rem(b))?;
            }
            L_NEG => {
                let a = self.pop_long()?;
                self.push_long(a.wrapping_neg())?;
            }
            L_ABS => {
                let a = self.pop_long()?;
                self.push_long(a.wrapping_abs())?;
            }
            L_EQ => self.long_compare(|a, b| a == b)?,
            L_NE => self.long_compare(|a, b| a != b)?,
            L_LT => self.long_compare(|a, b| a < b)?,
            L_LE => self.long_compare(|a, b| a <= b)?,
            L_GT => self.long_compare(|a, b| a > b)?,
            L_GE => self.long_compare(|a, b| a >= b)?,
            // true unsigned comparison of both operands; see DESIGN.md
            L_ULT => self.long_compare(|a, b| (a as u32) < (b as u32))?,
            L_ITOL => {
                let a = self.pop()?;
                self.push_long(a as i32)?;
            }
            L_LTOI => {
                let a = self.pop_long()?;
                self.push((a as u32 & 0xFFFF) as u16 as i16)?;
            }
            L_LDI => {
                let at = self.popu()?;
                let v = self.long_at(at)?;
                self.push_long(v)?;
            }
            L_STI => {
                let v = self.pop_long()?;
                let at = self.popu()?;
                self.set_long_at(at, v)?;
            }
            _ => return Err(error!(IllegalOpcode)),
        }
        Ok(Step::Continue)
    }

    pub(crate) fn long_op24(&mut self, sub: u8, w: u16) -> Result<Step> {
        match sub {
            L_LDCI => self.push_long(w as i16 as i32)?,
            L_LDG => {
                let v = self.long_at(w)?;
                self.push_long(v)?;
            }
            L_STG => {
                let v = self.pop_long()?;
                self.set_long_at(w, v)?;
            }
            _ => return Err(error!(IllegalOpcode)),
        }
        Ok(Step::Continue)
    }

    fn long_binary<F: Fn(i32, i32) -> i32>(&mut self, f: F) -> Result<()> {
        let b = self.pop_long()?;
        let a = self.pop_long()?;
        self.push_long(f(a, b))
    }

    fn long_compare<F: Fn(i32, i32) -> bool>(&mut self, f: F) -> Result<()> {
        let b = self.pop_long()?;
        let a = self.pop_long()?;
        self.push(if f(a, b) { 1 } else { 0 })
    }

    fn long_at(&self, at: u16) -> Result<i32> {
        let hi_at = match at.checked_add(2) {
            Some(a) => a,
            None => return Err(error!(MemoryFault)),
        };
        let lo = self.mem.uword(at)? as u32;
        let hi = self.mem.uword(hi_at)? as u32;
        Ok(((hi << 16) | lo) as i32)
    }

    fn set_long_at(&mut self, at: u16, v: i32) -> Result<()> {
        let hi_at = match at.checked_add(2) {
            Some(a) => a,
            None => return Err(error!(MemoryFault)),
        };
        self.mem.set_uword(at, (v as u32 & 0xFFFF) as u16)?;
        self.mem.set_uword(hi_at, (v as u32 >> 16) as u16)
    }
}
