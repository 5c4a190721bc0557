use super::machine::Machine;
use super::opcode::*;
use super::{Address, Error, Word};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// Outcome of one instruction. The step loop applies the pc update in
/// one place; handlers never touch `pc` themselves.
pub(crate) enum Step {
    Continue,
    Jump(Address),
    Halt(Word),
}

impl Machine {
    pub(crate) fn exec(&mut self, op: u8, b: u8, w: u16) -> Result<Step> {
        match op {
            NOP => Ok(Step::Continue),

            // *** Integer arithmetic, 16-bit wrapping
            ADD => self.binary(|a, b| a.wrapping_add(b)),
            SUB => self.binary(|a, b| a.wrapping_sub(b)),
            MUL => self.binary(|a, b| a.wrapping_mul(b)),
            DIV => {
                let (a, b) = self.pop_2()?;
                if b == 0 {
                    return Err(error!(DivisionByZero));
                }
                self.push(a.wrapping_div(b))?;
                Ok(Step::Continue)
            }
            MOD => {
                let (a, b) = self.pop_2()?;
                if b == 0 {
                    return Err(error!(DivisionByZero));
                }
                self.push(a.wrapping_rem(b))?;
                Ok(Step::Continue)
            }
            NEG => self.unary(|a| a.wrapping_neg()),
            ABS => self.unary(|a| a.wrapping_abs()),

            // *** Bitwise
            AND => self.binary(|a, b| a & b),
            OR => self.binary(|a, b| a | b),
            XOR => self.binary(|a, b| a ^ b),
            COM => self.unary(|a| !a),
            SHL => self.binary(|a, b| ((a as u16) << (b as u16 & 15)) as Word),
            SHR => self.binary(|a, b| ((a as u16) >> (b as u16 & 15)) as Word),

            // *** Comparison, signed then unsigned
            EQ => self.compare(|a, b| a == b),
            NE => self.compare(|a, b| a != b),
            LT => self.compare(|a, b| a < b),
            LE => self.compare(|a, b| a <= b),
            GT => self.compare(|a, b| a > b),
            GE => self.compare(|a, b| a >= b),
            ULT => self.compare(|a, b| (a as u16) < (b as u16)),
            ULE => self.compare(|a, b| (a as u16) <= (b as u16)),
            UGT => self.compare(|a, b| (a as u16) > (b as u16)),
            UGE => self.compare(|a, b| (a as u16) >= (b as u16)),
            NOT => self.unary(|a| if a == 0 { 1 } else { 0 }),

            // *** Stack manipulation
            DUP => {
                let a = self.pop()?;
                self.push(a)?;
                self.push(a)?;
                Ok(Step::Continue)
            }
            EXCH => {
                let (a, b) = self.pop_2()?;
                self.push(b)?;
                self.push(a)?;
                Ok(Step::Continue)
            }
            DROP => {
                self.pop()?;
                Ok(Step::Continue)
            }
            LDCB => {
                self.push(b as i8 as Word)?;
                Ok(Step::Continue)
            }
            LDC => {
                self.push(w as Word)?;
                Ok(Step::Continue)
            }
            INCS => {
                for _ in 0..b {
                    self.push(0)?;
                }
                Ok(Step::Continue)
            }
            DECS => {
                for _ in 0..b {
                    self.pop()?;
                }
                Ok(Step::Continue)
            }

            // *** Loads and stores
            LDW => {
                let at = self.popu()?;
                let v = self.mem.word(at)?;
                self.push(v)?;
                Ok(Step::Continue)
            }
            STW => {
                let v = self.pop()?;
                let at = self.popu()?;
                self.mem.set_word(at, v)?;
                Ok(Step::Continue)
            }
            LDB => {
                let at = self.popu()?;
                let v = self.mem.byte(at)?;
                self.push(v as Word)?;
                Ok(Step::Continue)
            }
            STB => {
                let v = self.pop()?;
                let at = self.popu()?;
                self.mem.set_byte(at, v as u8)?;
                Ok(Step::Continue)
            }
            LDG => {
                let v = self.mem.word(w)?;
                self.push(v)?;
                Ok(Step::Continue)
            }
            STG => {
                let v = self.pop()?;
                self.mem.set_word(w, v)?;
                Ok(Step::Continue)
            }
            LRO => {
                let at = self.ro_addr(w)?;
                let v = self.mem.word(at)?;
                self.push(v)?;
                Ok(Step::Continue)
            }
            LRA => {
                let at = self.ro_addr(w)?;
                self.pushu(at)?;
                Ok(Step::Continue)
            }
            MOVB => {
                let src = self.popu()?;
                let dst = self.popu()?;
                self.mem.copy(dst, src, w as usize)?;
                Ok(Step::Continue)
            }
            IXA => {
                let index = self.pop()?;
                let base = self.popu()?;
                let at = base as i32 + index as i32 * w as i32;
                if at < 0 || at as usize >= self.mem.len() {
                    return Err(error!(MemoryFault));
                }
                self.pushu(at as Address)?;
                Ok(Step::Continue)
            }

            // *** Control flow
            JMP => Ok(Step::Jump(w)),
            JPF => {
                if self.pop()? == 0 {
                    Ok(Step::Jump(w))
                } else {
                    Ok(Step::Continue)
                }
            }
            JPT => {
                if self.pop()? != 0 {
                    Ok(Step::Jump(w))
                } else {
                    Ok(Step::Continue)
                }
            }
            CALL => self.call(b, w),
            RET => self.ret(),
            END => Ok(Step::Halt(self.exit_code)),

            // *** Frame-relative access
            LDL => {
                let at = self.resolve(b, w as i16)?;
                let v = self.mem.word(at)?;
                self.push(v)?;
                Ok(Step::Continue)
            }
            STL => {
                let v = self.pop()?;
                let at = self.resolve(b, w as i16)?;
                self.mem.set_word(at, v)?;
                Ok(Step::Continue)
            }
            LLA => {
                let at = self.resolve(b, w as i16)?;
                self.pushu(at)?;
                Ok(Step::Continue)
            }

            // *** Extension groups
            FLOAT => self.float_op(b),
            LONGOP8 => self.long_op(b),
            LONGOP24 => self.long_op24(b, w),
            SETOP => self.set_op(b),
            SYS => match b {
                LIB_OS => self.os_call(w),
                LIB_STRING => {
                    self.string_call(w)?;
                    Ok(Step::Continue)
                }
                LIB_FILE => {
                    self.file_call(w)?;
                    Ok(Step::Continue)
                }
                _ => Err(error!(BadSyscall)),
            },

            _ => Err(error!(IllegalOpcode)),
        }
    }

    fn binary<F: Fn(Word, Word) -> Word>(&mut self, f: F) -> Result<Step> {
        let (a, b) = self.pop_2()?;
        self.push(f(a, b))?;
        Ok(Step::Continue)
    }

    fn unary<F: Fn(Word) -> Word>(&mut self, f: F) -> Result<Step> {
        let a = self.pop()?;
        self.push(f(a))?;
        Ok(Step::Continue)
    }

    fn compare<F: Fn(Word, Word) -> bool>(&mut self, f: F) -> Result<Step> {
        let (a, b) = self.pop_2()?;
        self.push(if f(a, b) { 1 } else { 0 })?;
        Ok(Step::Continue)
    }

    fn ro_addr(&self, w: u16) -> Result<Address> {
        let at = self.rop as u32 + w as u32;
        if at + 2 > self.mem.len() as u32 {
            Err(error!(MemoryFault))
        } else {
            Ok(at as Address)
        }
    }

    // *** OS library

    fn os_call(&mut self, func: u16) -> Result<Step> {
        match func {
            O_EXIT => {
                let code = self.pop()?;
                self.exit_code = code;
                Ok(Step::Halt(code))
            }
            O_NEW => {
                let size = self.popu()?;
                let at = self.heap.alloc(&mut self.mem, size)?;
                self.pushu(at)?;
                Ok(Step::Continue)
            }
            O_DISPOSE => {
                let at = self.popu()?;
                self.heap.release(&mut self.mem, at)?;
                Ok(Step::Continue)
            }
            O_GETENV => {
                let dst = self.popu()?;
                let name = self.popu()?;
                let name = self.str_take(name)?;
                let value = std::env::var(&name).unwrap_or_default();
                self.str_set(dst, value.as_bytes())?;
                Ok(Step::Continue)
            }
            _ => Err(error!(BadSyscall)),
        }
    }

    // *** String library

    fn string_call(&mut self, func: u16) -> Result<()> {
        match func {
            T_INIT => {
                let size = self.popu()?;
                let at = self.popu()?;
                self.str_init(at, size)
            }
            T_TEMP => {
                let at = self.popu()?;
                self.str_temp(at)
            }
            T_FREE => {
                let at = self.popu()?;
                self.str_consume(at)
            }
            T_COPY => {
                let src = self.popu()?;
                let dst = self.popu()?;
                self.str_copy(dst, src)
            }
            T_CAT => {
                let src = self.popu()?;
                let dst = self.popu()?;
                self.str_cat(dst, src)
            }
            T_DUP => {
                let src = self.popu()?;
                let dst = self.popu()?;
                self.str_dup(dst, src)
            }
            T_CMP => {
                let b = self.popu()?;
                let a = self.popu()?;
                let order = self.str_cmp(a, b)?;
                self.push(order)
            }
            T_SUB => {
                let count = self.pop()?;
                let index = self.pop()?;
                let src = self.popu()?;
                let dst = self.popu()?;
                self.str_sub(dst, src, index, count)
            }
            T_INS => {
                let index = self.pop()?;
                let src = self.popu()?;
                let dst = self.popu()?;
                self.str_ins(dst, src, index)
            }
            T_DEL => {
                let count = self.pop()?;
                let index = self.pop()?;
                let at = self.popu()?;
                self.str_del(at, index, count)
            }
            T_FILL => {
                let count = self.pop()?;
                let ch = self.pop()?;
                let at = self.popu()?;
                self.str_fill(at, ch as u8, count)
            }
            T_LEN => {
                let at = self.popu()?;
                let n = self.str_len(at)?;
                self.push(n)
            }
            T_STR => {
                let width = self.pop()?;
                let value = self.pop()?;
                let dst = self.popu()?;
                self.str_str(dst, value, width)
            }
            T_STRF => {
                let prec = self.pop()?;
                let width = self.pop()?;
                let value = self.pop_real()?;
                let dst = self.popu()?;
                self.str_strf(dst, value, width, prec)
            }
            T_VAL => {
                let src = self.popu()?;
                let v = self.str_val(src)?;
                self.push(v)
            }
            _ => Err(error!(BadSyscall)),
        }
    }
}
