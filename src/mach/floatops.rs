use super::machine::Machine;
use super::opcode::*;
use super::runtime::Step;
use super::{Error, Word};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// ## Floating point operations
///
/// Reals are IEEE single precision carried as two stack words (the
/// raw bits, low word first). Arithmetic is host IEEE arithmetic with
/// no traps; only the conversions back to 16-bit integers can fail.

impl Machine {
    pub(crate) fn float_op(&mut self, sub: u8) -> Result<Step> {
        match sub {
            F_ADD => self.real_binary(|a, b| a + b)?,
            F_SUB => self.real_binary(|a, b| a - b)?,
            F_MUL => self.real_binary(|a, b| a * b)?,
            F_DIV => self.real_binary(|a, b| a / b)?,
            F_NEG => {
                let a = self.pop_real()?;
                self.push_real(-a)?;
            }
            F_ABS => {
                let a = self.pop_real()?;
                self.push_real(a.abs())?;
            }
            F_EQ => self.real_compare(|a, b| a == b)?,
            F_NE => self.real_compare(|a, b| a != b)?,
            F_LT => self.real_compare(|a, b| a < b)?,
            F_LE => self.real_compare(|a, b| a <= b)?,
            F_GT => self.real_compare(|a, b| a > b)?,
            F_GE => self.real_compare(|a, b| a >= b)?,
            F_ITOF => {
                let a = self.pop()?;
                self.push_real(a as f32)?;
            }
            F_TRUNC => {
                let a = self.pop_real()?;
                self.push(word_of(a.trunc())?)?;
            }
            F_ROUND => {
                let a = self.pop_real()?;
                self.push(word_of(a.round())?)?;
            }
            _ => return Err(error!(IllegalOpcode)),
        }
        Ok(Step::Continue)
    }

    fn real_binary<F: Fn(f32, f32) -> f32>(&mut self, f: F) -> Result<()> {
        let b = self.pop_real()?;
        let a = self.pop_real()?;
        self.push_real(f(a, b))
    }

    fn real_compare<F: Fn(f32, f32) -> bool>(&mut self, f: F) -> Result<()> {
        let b = self.pop_real()?;
        let a = self.pop_real()?;
        self.push(if f(a, b) { 1 } else { 0 })
    }
}

fn word_of(val: f32) -> Result<Word> {
    if val.is_nan() || val < Word::min_value() as f32 - 0.5 || val > Word::max_value() as f32 + 0.5
    {
        Err(error!(Overflow))
    } else {
        Ok(val as Word)
    }
}
