use super::opcode::*;
use super::Address;

/// ## Instruction listing
///
/// Renders the instruction at `pc` for trace output and the
/// source-level debugger. Returns the text and the instruction width,
/// or `None` when `pc` does not hold a complete, defined instruction.
pub fn disasm(code: &[u8], pc: Address) -> Option<(String, u16)> {
    let at = pc as usize;
    let op = *code.get(at)?;
    let width = width(op);
    if at + width as usize > code.len() {
        return None;
    }
    let name = name(op)?;
    let b = if op & ARG8 != 0 { code[at + 1] } else { 0 };
    let w = if op & ARG16 != 0 {
        let lo = at + width as usize - 2;
        u16::from_le_bytes([code[lo], code[lo + 1]])
    } else {
        0
    };
    let text = match op {
        FLOAT => float_name(b).map(str::to_string)?,
        LONGOP8 => long8_name(b).map(str::to_string)?,
        SETOP => setop_name(b).map(str::to_string)?,
        LONGOP24 => format!("{} {}", long24_name(b)?, w as i16),
        LDCB => format!("{} {}", name, b as i8),
        INCS | DECS => format!("{} {}", name, b),
        LDC => format!("{} {}", name, w as i16),
        JMP | JPF | JPT => format!("{} {:04X}", name, w),
        LDG | STG | LRO | LRA => format!("{} {:04X}", name, w),
        MOVB | IXA => format!("{} {}", name, w),
        CALL => format!("{} {},{:04X}", name, b, w),
        LDL | STL | LLA => format!("{} {},{}", name, b, w as i16),
        SYS => {
            let lib = match b {
                LIB_OS => "OS",
                LIB_STRING => "STR",
                LIB_FILE => "FILE",
                _ => return None,
            };
            format!("{} {},{:02X}", name, lib, w)
        }
        _ => name.to_string(),
    };
    Some((text, width))
}
