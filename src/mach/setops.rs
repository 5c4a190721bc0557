use super::machine::Machine;
use super::opcode::*;
use super::runtime::Step;
use super::{Address, Error};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// ## Set operations
///
/// A Pascal set is a 256-bit bitset: 16 consecutive words in data
/// memory, member n at bit (n mod 16) of word (n div 16). Operands
/// are set addresses on the stack; binary operations combine into the
/// destination in place. Members are masked to 0..=255.

pub const SET_WORDS: u16 = 16;
pub const SET_BYTES: u16 = 32;

impl Machine {
    pub(crate) fn set_op(&mut self, sub: u8) -> Result<Step> {
        match sub {
            S_CLR => {
                let at = self.popu()?;
                self.mem.fill(at, SET_BYTES as usize, 0)?;
            }
            S_ADD => {
                let member = self.pop()? as u16 & 0xFF;
                let at = self.popu()?;
                let word_at = member_word(at, member)?;
                let bits = self.mem.uword(word_at)?;
                self.mem.set_uword(word_at, bits | 1 << (member & 15))?;
            }
            S_RANGE => {
                let hi = self.pop()?;
                let lo = self.pop()?;
                let at = self.popu()?;
                let lo = lo.max(0).min(255) as u16;
                let hi = hi.max(0).min(255) as u16;
                let mut member = lo;
                while member <= hi {
                    let word_at = member_word(at, member)?;
                    let bits = self.mem.uword(word_at)?;
                    self.mem.set_uword(word_at, bits | 1 << (member & 15))?;
                    member += 1;
                }
            }
            S_IN => {
                let member = self.pop()? as u16 & 0xFF;
                let at = self.popu()?;
                let bits = self.mem.uword(member_word(at, member)?)?;
                self.push(if bits & 1 << (member & 15) != 0 { 1 } else { 0 })?;
            }
            S_UNION => self.set_binary(|d, s| d | s)?,
            S_INT => self.set_binary(|d, s| d & s)?,
            S_DIFF => self.set_binary(|d, s| d & !s)?,
            S_EQ => {
                let (a, b) = self.set_pair()?;
                let eq = a == b;
                self.push(if eq { 1 } else { 0 })?;
            }
            S_LE => {
                let (a, b) = self.set_pair()?;
                let le = a.iter().zip(b.iter()).all(|(x, y)| x & !y == 0);
                self.push(if le { 1 } else { 0 })?;
            }
            _ => return Err(error!(IllegalOpcode)),
        }
        Ok(Step::Continue)
    }

    fn set_binary<F: Fn(u16, u16) -> u16>(&mut self, f: F) -> Result<()> {
        let src = self.popu()?;
        let dst = self.popu()?;
        for i in 0..SET_WORDS {
            let s = self.mem.uword(set_word(src, i)?)?;
            let at = set_word(dst, i)?;
            let d = self.mem.uword(at)?;
            self.mem.set_uword(at, f(d, s))?;
        }
        Ok(())
    }

    fn set_pair(&mut self) -> Result<(Vec<u16>, Vec<u16>)> {
        let b = self.popu()?;
        let a = self.popu()?;
        let mut xs = Vec::with_capacity(SET_WORDS as usize);
        let mut ys = Vec::with_capacity(SET_WORDS as usize);
        for i in 0..SET_WORDS {
            xs.push(self.mem.uword(set_word(a, i)?)?);
            ys.push(self.mem.uword(set_word(b, i)?)?);
        }
        Ok((xs, ys))
    }
}

fn set_word(base: Address, index: u16) -> Result<Address> {
    match base.checked_add(index * 2) {
        Some(at) => Ok(at),
        None => Err(error!(MemoryFault)),
    }
}

fn member_word(base: Address, member: u16) -> Result<Address> {
    set_word(base, member >> 4)
}
