use super::Address;

pub struct Error {
    code: u16,
    pc: Option<Address>,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err)
    };
    ($err:ident, $pc:expr) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err).in_pc($pc)
    };
    ($err:ident; $msg:expr) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err).message($msg)
    };
    ($err:ident, $pc:expr; $msg:expr) => {
        $crate::mach::Error::new($crate::mach::ErrorCode::$err)
            .in_pc($pc)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            pc: None,
            message: "",
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn pc(&self) -> Option<Address> {
        self.pc
    }

    pub fn in_pc(&self, pc: Address) -> Error {
        debug_assert!(self.pc.is_none());
        Error {
            code: self.code,
            pc: Some(pc),
            message: self.message,
        }
    }

    /// Stamp the faulting pc unless one is already recorded.
    pub fn or_pc(self, pc: Address) -> Error {
        if self.pc.is_some() {
            self
        } else {
            self.in_pc(pc)
        }
    }

    pub fn message(&self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            code: self.code,
            pc: self.pc,
            message,
        }
    }
}

pub enum ErrorCode {
    IllegalOpcode = 1,
    BadPc = 2,
    NestingLevel = 3,
    StackOverflow = 4,
    StackUnderflow = 5,
    MemoryFault = 6,
    DivisionByZero = 7,
    Overflow = 8,
    OutOfMemory = 9,
    OutOfStringSpace = 10,
    Huh = 11,
    BadSyscall = 12,
    BadFileNumber = 13,
    TooManyFiles = 14,
    NotOpenForRead = 15,
    NotOpenForWrite = 16,
    FileNotFound = 17,
    InputPastEnd = 18,
    ReadFailed = 19,
    WriteFailed = 20,
    SeekFailed = 21,
    BadFileOp = 22,
    InternalError = 51,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            1 => "ILLEGAL OPCODE",
            2 => "BAD PC",
            3 => "NESTING LEVEL",
            4 => "STACK OVERFLOW",
            5 => "STACK UNDERFLOW",
            6 => "MEMORY FAULT",
            7 => "DIVISION BY ZERO",
            8 => "OVERFLOW",
            9 => "OUT OF MEMORY",
            10 => "OUT OF STRING SPACE",
            11 => "HUH",
            12 => "BAD SYSCALL",
            13 => "BAD FILE NUMBER",
            14 => "TOO MANY FILES",
            15 => "NOT OPEN FOR READ",
            16 => "NOT OPEN FOR WRITE",
            17 => "FILE NOT FOUND",
            18 => "INPUT PAST END",
            19 => "READ FAILED",
            20 => "WRITE FAILED",
            21 => "SEEK FAILED",
            22 => "BAD FILE OP",
            51 => "INTERNAL ERROR",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(pc) = self.pc {
            suffix.push_str(&format!(" AT {:04X}", pc));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            write!(f, "MACHINE ERROR {}{}", self.code, suffix)
        } else {
            write!(f, "{}{}", code_str, suffix)
        }
    }
}
