//! ## Instruction encoding
//!
//! The two high bits of the opcode byte select the argument format:
//! bit `0x80` adds a 16-bit little-endian argument, bit `0x40` adds an
//! 8-bit argument ahead of it. Instructions are 1, 2, 3, or 4 bytes.
//!
//! These numbers are a wire format shared with the compiler and the
//! linker. They must never be renumbered.

/// A 16-bit argument follows the opcode.
pub const ARG16: u8 = 0x80;
/// An 8-bit argument follows the opcode.
pub const ARG8: u8 = 0x40;

// *** No argument (0x00-0x3F)
pub const NOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const SUB: u8 = 0x02;
pub const MUL: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const MOD: u8 = 0x05;
pub const NEG: u8 = 0x06;
pub const ABS: u8 = 0x07;
pub const AND: u8 = 0x08;
pub const OR: u8 = 0x09;
pub const XOR: u8 = 0x0A;
pub const COM: u8 = 0x0B;
pub const SHL: u8 = 0x0C;
pub const SHR: u8 = 0x0D;
pub const EQ: u8 = 0x0E;
pub const NE: u8 = 0x0F;
pub const LT: u8 = 0x10;
pub const LE: u8 = 0x11;
pub const GT: u8 = 0x12;
pub const GE: u8 = 0x13;
pub const ULT: u8 = 0x14;
pub const ULE: u8 = 0x15;
pub const UGT: u8 = 0x16;
pub const UGE: u8 = 0x17;
pub const NOT: u8 = 0x18;
pub const DUP: u8 = 0x19;
pub const EXCH: u8 = 0x1A;
pub const DROP: u8 = 0x1B;
pub const LDW: u8 = 0x1C;
pub const STW: u8 = 0x1D;
pub const LDB: u8 = 0x1E;
pub const STB: u8 = 0x1F;
pub const RET: u8 = 0x20;
pub const END: u8 = 0x21;

// *** 8-bit argument (0x40-0x7F)
pub const LDCB: u8 = 0x40;
pub const INCS: u8 = 0x41;
pub const DECS: u8 = 0x42;
pub const FLOAT: u8 = 0x43;
pub const LONGOP8: u8 = 0x44;
pub const SETOP: u8 = 0x45;

// *** 16-bit argument (0x80-0xBF)
pub const LDC: u8 = 0x80;
pub const JMP: u8 = 0x81;
pub const JPF: u8 = 0x82;
pub const JPT: u8 = 0x83;
pub const LDG: u8 = 0x84;
pub const STG: u8 = 0x85;
pub const LRO: u8 = 0x86;
pub const LRA: u8 = 0x87;
pub const MOVB: u8 = 0x88;
pub const IXA: u8 = 0x89;

// *** Combined 8-bit and 16-bit arguments (0xC0-0xFF)
pub const CALL: u8 = 0xC0;
pub const LDL: u8 = 0xC1;
pub const STL: u8 = 0xC2;
pub const LLA: u8 = 0xC3;
pub const LONGOP24: u8 = 0xC4;
pub const SYS: u8 = 0xC5;

// *** LONGOP8 sub-opcodes
pub const L_ADD: u8 = 0x01;
pub const L_SUB: u8 = 0x02;
pub const L_MUL: u8 = 0x03;
pub const L_DIV: u8 = 0x04;
pub const L_MOD: u8 = 0x05;
pub const L_NEG: u8 = 0x06;
pub const L_ABS: u8 = 0x07;
pub const L_EQ: u8 = 0x08;
pub const L_NE: u8 = 0x09;
pub const L_LT: u8 = 0x0A;
pub const L_LE: u8 = 0x0B;
pub const L_GT: u8 = 0x0C;
pub const L_GE: u8 = 0x0D;
pub const L_ULT: u8 = 0x0E;
pub const L_ITOL: u8 = 0x0F;
pub const L_LTOI: u8 = 0x10;
pub const L_LDI: u8 = 0x11;
pub const L_STI: u8 = 0x12;

// *** LONGOP24 sub-opcodes
pub const L_LDCI: u8 = 0x01;
pub const L_LDG: u8 = 0x02;
pub const L_STG: u8 = 0x03;

// *** FLOAT sub-opcodes
pub const F_ADD: u8 = 0x01;
pub const F_SUB: u8 = 0x02;
pub const F_MUL: u8 = 0x03;
pub const F_DIV: u8 = 0x04;
pub const F_NEG: u8 = 0x05;
pub const F_ABS: u8 = 0x06;
pub const F_EQ: u8 = 0x07;
pub const F_NE: u8 = 0x08;
pub const F_LT: u8 = 0x09;
pub const F_LE: u8 = 0x0A;
pub const F_GT: u8 = 0x0B;
pub const F_GE: u8 = 0x0C;
pub const F_ITOF: u8 = 0x0D;
pub const F_TRUNC: u8 = 0x0E;
pub const F_ROUND: u8 = 0x0F;

// *** SETOP sub-opcodes
pub const S_CLR: u8 = 0x01;
pub const S_ADD: u8 = 0x02;
pub const S_RANGE: u8 = 0x03;
pub const S_IN: u8 = 0x04;
pub const S_UNION: u8 = 0x05;
pub const S_INT: u8 = 0x06;
pub const S_DIFF: u8 = 0x07;
pub const S_EQ: u8 = 0x08;
pub const S_LE: u8 = 0x09;

// *** SYS libraries
pub const LIB_OS: u8 = 0;
pub const LIB_STRING: u8 = 1;
pub const LIB_FILE: u8 = 2;

// *** OS library functions
pub const O_EXIT: u16 = 0x01;
pub const O_NEW: u16 = 0x02;
pub const O_DISPOSE: u16 = 0x03;
pub const O_GETENV: u16 = 0x04;

// *** String library functions
pub const T_INIT: u16 = 0x01;
pub const T_TEMP: u16 = 0x02;
pub const T_FREE: u16 = 0x03;
pub const T_COPY: u16 = 0x04;
pub const T_CAT: u16 = 0x05;
pub const T_DUP: u16 = 0x06;
pub const T_CMP: u16 = 0x07;
pub const T_SUB: u16 = 0x08;
pub const T_INS: u16 = 0x09;
pub const T_DEL: u16 = 0x0A;
pub const T_FILL: u16 = 0x0B;
pub const T_LEN: u16 = 0x0C;
pub const T_STR: u16 = 0x0D;
pub const T_STRF: u16 = 0x0E;
pub const T_VAL: u16 = 0x0F;

// *** File library functions (the x-codes)
pub const X_ALLOC: u16 = 0x01;
pub const X_FREE: u16 = 0x02;
pub const X_ASSIGN: u16 = 0x03;
pub const X_RESET: u16 = 0x04;
pub const X_REWRITE: u16 = 0x05;
pub const X_APPEND: u16 = 0x06;
pub const X_CLOSE: u16 = 0x07;
pub const X_READCH: u16 = 0x08;
pub const X_READI: u16 = 0x09;
pub const X_READF: u16 = 0x0A;
pub const X_READS: u16 = 0x0B;
pub const X_READB: u16 = 0x0C;
pub const X_WRITECH: u16 = 0x0D;
pub const X_WRITEI: u16 = 0x0E;
pub const X_WRITEF: u16 = 0x0F;
pub const X_WRITES: u16 = 0x10;
pub const X_WRITEB: u16 = 0x11;
pub const X_READLN: u16 = 0x12;
pub const X_WRITELN: u16 = 0x13;
pub const X_PAGE: u16 = 0x14;
pub const X_EOF: u16 = 0x15;
pub const X_EOLN: u16 = 0x16;
pub const X_SEEK: u16 = 0x17;
pub const X_POS: u16 = 0x18;
pub const X_SIZE: u16 = 0x19;
pub const X_OPENDIR: u16 = 0x1A;
pub const X_READDIR: u16 = 0x1B;
pub const X_REWINDDIR: u16 = 0x1C;
pub const X_CLOSEDIR: u16 = 0x1D;
pub const X_STAT: u16 = 0x1E;
pub const X_ERASE: u16 = 0x1F;
pub const X_RENAME: u16 = 0x20;
pub const X_FLUSH: u16 = 0x21;
pub const X_CHDIR: u16 = 0x22;
pub const X_GETCWD: u16 = 0x23;
pub const X_EXISTS: u16 = 0x24;
pub const X_READLI: u16 = 0x25;
pub const X_WRITELI: u16 = 0x26;
pub const X_WRITEBOOL: u16 = 0x27;
pub const X_TRUNCATE: u16 = 0x28;
pub const X_ISTEXT: u16 = 0x29;
pub const X_RECSIZE: u16 = 0x2A;
pub const X_NAME: u16 = 0x2B;

/// Instruction width in bytes for an opcode, from its format bits.
pub fn width(op: u8) -> u16 {
    let mut w = 1;
    if op & ARG8 != 0 {
        w += 1;
    }
    if op & ARG16 != 0 {
        w += 2;
    }
    w
}

/// Mnemonic for a primary opcode, `None` when undefined.
pub fn name(op: u8) -> Option<&'static str> {
    let s = match op {
        NOP => "NOP",
        ADD => "ADD",
        SUB => "SUB",
        MUL => "MUL",
        DIV => "DIV",
        MOD => "MOD",
        NEG => "NEG",
        ABS => "ABS",
        AND => "AND",
        OR => "OR",
        XOR => "XOR",
        COM => "COM",
        SHL => "SHL",
        SHR => "SHR",
        EQ => "EQ",
        NE => "NE",
        LT => "LT",
        LE => "LE",
        GT => "GT",
        GE => "GE",
        ULT => "ULT",
        ULE => "ULE",
        UGT => "UGT",
        UGE => "UGE",
        NOT => "NOT",
        DUP => "DUP",
        EXCH => "EXCH",
        DROP => "DROP",
        LDW => "LDW",
        STW => "STW",
        LDB => "LDB",
        STB => "STB",
        RET => "RET",
        END => "END",
        LDCB => "LDCB",
        INCS => "INCS",
        DECS => "DECS",
        FLOAT => "FLOAT",
        LONGOP8 => "LONGOP8",
        SETOP => "SETOP",
        LDC => "LDC",
        JMP => "JMP",
        JPF => "JPF",
        JPT => "JPT",
        LDG => "LDG",
        STG => "STG",
        LRO => "LRO",
        LRA => "LRA",
        MOVB => "MOVB",
        IXA => "IXA",
        CALL => "CALL",
        LDL => "LDL",
        STL => "STL",
        LLA => "LLA",
        LONGOP24 => "LONGOP24",
        SYS => "SYS",
        _ => return None,
    };
    Some(s)
}

pub fn long8_name(sub: u8) -> Option<&'static str> {
    let s = match sub {
        L_ADD => "LADD",
        L_SUB => "LSUB",
        L_MUL => "LMUL",
        L_DIV => "LDIV",
        L_MOD => "LMOD",
        L_NEG => "LNEG",
        L_ABS => "LABS",
        L_EQ => "LEQ",
        L_NE => "LNE",
        L_LT => "LLT",
        L_LE => "LLE",
        L_GT => "LGT",
        L_GE => "LGE",
        L_ULT => "LULT",
        L_ITOL => "ITOL",
        L_LTOI => "LTOI",
        L_LDI => "LLDI",
        L_STI => "LSTI",
        _ => return None,
    };
    Some(s)
}

pub fn long24_name(sub: u8) -> Option<&'static str> {
    let s = match sub {
        L_LDCI => "LDCI",
        L_LDG => "LDGL",
        L_STG => "STGL",
        _ => return None,
    };
    Some(s)
}

pub fn float_name(sub: u8) -> Option<&'static str> {
    let s = match sub {
        F_ADD => "FADD",
        F_SUB => "FSUB",
        F_MUL => "FMUL",
        F_DIV => "FDIV",
        F_NEG => "FNEG",
        F_ABS => "FABS",
        F_EQ => "FEQ",
        F_NE => "FNE",
        F_LT => "FLT",
        F_LE => "FLE",
        F_GT => "FGT",
        F_GE => "FGE",
        F_ITOF => "ITOF",
        F_TRUNC => "FTRUNC",
        F_ROUND => "FROUND",
        _ => return None,
    };
    Some(s)
}

pub fn setop_name(sub: u8) -> Option<&'static str> {
    let s = match sub {
        S_CLR => "SCLR",
        S_ADD => "SADD",
        S_RANGE => "SRANGE",
        S_IN => "SIN",
        S_UNION => "SUNION",
        S_INT => "SINT",
        S_DIFF => "SDIFF",
        S_EQ => "SEQ",
        S_LE => "SLE",
        _ => return None,
    };
    Some(s)
}
