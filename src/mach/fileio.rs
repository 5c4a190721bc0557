use super::machine::Machine;
use super::opcode::*;
use super::string::{scan_int, scan_long};
use super::{Error, Word};
use crate::error;
use std::io::{Read, Seek, SeekFrom, Write};

type Result<T> = std::result::Result<T, Error>;

/// ## File library
///
/// A fixed table of descriptors maps small file numbers to host
/// streams. Numbers 0 and 1 are standard input and output, bound at
/// reset and never freed. Everything else is driven by the x-code
/// sub-functions of `SYS LIB_FILE`.
///
/// Text reads go through a one-byte pushback buffer so the machine
/// can answer eof without disturbing the stream, and each descriptor
/// carries an explicit `eoln` flag: set exactly when the last
/// line-buffered read consumed a trailing newline.

pub const MAX_OPEN_FILES: usize = 16;

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Closed,
    Reading,
    Writing,
}

enum Stream {
    None,
    Stdin,
    Stdout,
    Disk(std::fs::File),
    Dir { entries: Vec<String>, pos: usize },
}

pub struct FileDesc {
    name: String,
    in_use: bool,
    is_text: bool,
    eoln: bool,
    record_size: u16,
    mode: Mode,
    stream: Stream,
    pushback: Option<u8>,
}

impl FileDesc {
    fn closed() -> FileDesc {
        FileDesc {
            name: String::new(),
            in_use: false,
            is_text: true,
            eoln: false,
            record_size: 1,
            mode: Mode::Closed,
            stream: Stream::None,
            pushback: None,
        }
    }

    fn read_raw(&mut self) -> std::io::Result<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        let n = match &mut self.stream {
            Stream::Stdin => {
                let stdin = std::io::stdin();
                let mut lock = stdin.lock();
                lock.read(&mut buf)?
            }
            Stream::Disk(file) => file.read(&mut buf)?,
            _ => 0,
        };
        Ok(if n == 0 { None } else { Some(buf[0]) })
    }

    fn peek(&mut self) -> std::io::Result<Option<u8>> {
        if self.pushback.is_none() {
            self.pushback = self.read_raw()?;
        }
        Ok(self.pushback)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.stream {
            Stream::Stdin => {
                let stdin = std::io::stdin();
                let mut lock = stdin.lock();
                lock.read(buf)
            }
            Stream::Disk(file) => file.read(buf),
            _ => Ok(0),
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let done = match &mut self.stream {
            Stream::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(bytes)
            }
            Stream::Disk(file) => file.write_all(bytes),
            _ => Ok(()),
        };
        done.map_err(|_| error!(WriteFailed))
    }

    fn disk(&mut self) -> Result<&mut std::fs::File> {
        match &mut self.stream {
            Stream::Disk(file) => Ok(file),
            _ => Err(error!(SeekFailed)),
        }
    }
}

pub struct FileTable {
    files: Vec<FileDesc>,
}

impl FileTable {
    pub fn new() -> FileTable {
        let mut table = FileTable { files: vec![] };
        for _ in 0..MAX_OPEN_FILES {
            table.files.push(FileDesc::closed());
        }
        table.reset();
        table
    }

    /// Close everything and rebind standard input and output.
    pub fn reset(&mut self) {
        for file in self.files.iter_mut() {
            *file = FileDesc::closed();
        }
        self.files[0] = FileDesc {
            name: String::new(),
            in_use: true,
            is_text: true,
            eoln: false,
            record_size: 1,
            mode: Mode::Reading,
            stream: Stream::Stdin,
            pushback: None,
        };
        self.files[1] = FileDesc {
            name: String::new(),
            in_use: true,
            is_text: true,
            eoln: false,
            record_size: 1,
            mode: Mode::Writing,
            stream: Stream::Stdout,
            pushback: None,
        };
    }

    fn get(&mut self, index: usize) -> Result<&mut FileDesc> {
        match self.files.get_mut(index) {
            Some(file) if file.in_use => Ok(file),
            _ => Err(error!(BadFileNumber)),
        }
    }

    fn reading(&mut self, index: usize) -> Result<&mut FileDesc> {
        let file = self.get(index)?;
        if file.mode != Mode::Reading {
            return Err(error!(NotOpenForRead));
        }
        Ok(file)
    }

    fn writing(&mut self, index: usize) -> Result<&mut FileDesc> {
        let file = self.get(index)?;
        if file.mode != Mode::Writing {
            return Err(error!(NotOpenForWrite));
        }
        Ok(file)
    }
}

impl Machine {
    fn pop_file(&mut self) -> Result<usize> {
        let n = self.pop()?;
        if n < 0 || n as usize >= MAX_OPEN_FILES {
            return Err(error!(BadFileNumber));
        }
        Ok(n as usize)
    }

    /// A user file number: allocated, and not stdin/stdout.
    fn pop_user_file(&mut self) -> Result<usize> {
        let i = self.pop_file()?;
        if i < 2 {
            return Err(error!(BadFileNumber));
        }
        Ok(i)
    }

    pub(crate) fn file_call(&mut self, func: u16) -> Result<()> {
        match func {
            X_ALLOC => {
                let mut found = None;
                for (i, file) in self.files.files.iter_mut().enumerate().skip(2) {
                    if !file.in_use {
                        file.in_use = true;
                        found = Some(i);
                        break;
                    }
                }
                match found {
                    Some(i) => self.push(i as Word),
                    None => Err(error!(TooManyFiles)),
                }
            }
            X_FREE => {
                let i = self.pop_user_file()?;
                self.files.get(i)?;
                self.files.files[i] = FileDesc::closed();
                Ok(())
            }
            X_ASSIGN => {
                let is_text = self.pop()?;
                let name_at = self.popu()?;
                let i = self.pop_user_file()?;
                let name = self.str_take(name_at)?;
                let file = self.files.get(i)?;
                file.name = name;
                file.is_text = is_text != 0;
                Ok(())
            }
            X_RESET => {
                let rec = self.pop()?;
                let i = self.pop_user_file()?;
                let file = self.files.get(i)?;
                let host = std::fs::File::open(&file.name).map_err(|_| error!(FileNotFound))?;
                file.stream = Stream::Disk(host);
                file.mode = Mode::Reading;
                file.record_size = rec.max(1) as u16;
                file.eoln = false;
                file.pushback = None;
                Ok(())
            }
            X_REWRITE => {
                let rec = self.pop()?;
                let i = self.pop_user_file()?;
                let file = self.files.get(i)?;
                let host = std::fs::File::create(&file.name).map_err(|_| error!(WriteFailed))?;
                file.stream = Stream::Disk(host);
                file.mode = Mode::Writing;
                file.record_size = rec.max(1) as u16;
                file.eoln = false;
                file.pushback = None;
                Ok(())
            }
            X_APPEND => {
                let rec = self.pop()?;
                let i = self.pop_user_file()?;
                let file = self.files.get(i)?;
                let host = std::fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&file.name)
                    .map_err(|_| error!(WriteFailed))?;
                file.stream = Stream::Disk(host);
                file.mode = Mode::Writing;
                file.record_size = rec.max(1) as u16;
                file.eoln = false;
                file.pushback = None;
                Ok(())
            }
            X_CLOSE => {
                let i = self.pop_user_file()?;
                let file = self.files.get(i)?;
                file.stream = Stream::None;
                file.mode = Mode::Closed;
                file.pushback = None;
                Ok(())
            }
            X_READCH => {
                let i = self.pop_file()?;
                let ch = {
                    let file = self.files.reading(i)?;
                    match file.read_raw().map_err(|_| error!(ReadFailed))? {
                        Some(c) => {
                            file.eoln = c == b'\n';
                            c
                        }
                        None => return Err(error!(InputPastEnd)),
                    }
                };
                self.push(ch as Word)
            }
            X_READI => {
                let i = self.pop_file()?;
                let v = {
                    let file = self.files.reading(i)?;
                    let lex = read_number(file, false)?;
                    scan_int(&lex).ok_or_else(|| error!(ReadFailed))?
                };
                self.push(v)
            }
            X_READLI => {
                let i = self.pop_file()?;
                let v = {
                    let file = self.files.reading(i)?;
                    let lex = read_number(file, false)?;
                    scan_long(&lex).ok_or_else(|| error!(ReadFailed))?
                };
                self.push_long(v)
            }
            X_READF => {
                let i = self.pop_file()?;
                let v = {
                    let file = self.files.reading(i)?;
                    let lex = read_number(file, true)?;
                    let text = String::from_utf8_lossy(&lex).into_owned();
                    text.trim().parse::<f32>().map_err(|_| error!(ReadFailed))?
                };
                self.push_real(v)
            }
            X_READS => {
                let at = self.popu()?;
                let i = self.pop_file()?;
                let line = {
                    let file = self.files.reading(i)?;
                    read_line(file)?
                };
                self.str_set(at, &line)
            }
            X_READB => {
                let count = self.popu()? as usize;
                let at = self.popu()?;
                let i = self.pop_file()?;
                let buf = {
                    let file = self.files.reading(i)?;
                    let mut buf = vec![0u8; count];
                    let mut have = 0;
                    if count > 0 {
                        if let Some(b) = file.pushback.take() {
                            buf[0] = b;
                            have = 1;
                        }
                    }
                    while have < count {
                        let n = file
                            .read_some(&mut buf[have..])
                            .map_err(|_| error!(ReadFailed))?;
                        if n == 0 {
                            return Err(error!(InputPastEnd));
                        }
                        have += n;
                    }
                    buf
                };
                self.mem.write(at, &buf)
            }
            X_WRITECH => {
                let ch = self.pop()?;
                let i = self.pop_file()?;
                self.files.writing(i)?.put(&[ch as u8])
            }
            X_WRITEI => {
                let width = self.pop()?;
                let v = self.pop()?;
                let i = self.pop_file()?;
                let text = format!("{:>1$}", v, width.max(0) as usize);
                self.files.writing(i)?.put(text.as_bytes())
            }
            X_WRITELI => {
                let width = self.pop()?;
                let v = self.pop_long()?;
                let i = self.pop_file()?;
                let text = format!("{:>1$}", v, width.max(0) as usize);
                self.files.writing(i)?.put(text.as_bytes())
            }
            X_WRITEF => {
                let prec = self.pop()?;
                let width = self.pop()?;
                let v = self.pop_real()?;
                let i = self.pop_file()?;
                let text = format!(
                    "{:>w$.p$}",
                    v,
                    w = width.max(0) as usize,
                    p = prec.max(0) as usize
                );
                self.files.writing(i)?.put(text.as_bytes())
            }
            X_WRITEBOOL => {
                let width = self.pop()?;
                let v = self.pop()?;
                let i = self.pop_file()?;
                let text = format!(
                    "{:>1$}",
                    if v != 0 { "TRUE" } else { "FALSE" },
                    width.max(0) as usize
                );
                self.files.writing(i)?.put(text.as_bytes())
            }
            X_WRITES => {
                let at = self.popu()?;
                let i = self.pop_file()?;
                let d = self.desc(at)?;
                let bytes = self
                    .mem
                    .read(d.data, d.size.min(d.cap()) as usize)?
                    .to_vec();
                self.files.writing(i)?.put(&bytes)?;
                self.str_consume(at)
            }
            X_WRITEB => {
                let count = self.popu()? as usize;
                let at = self.popu()?;
                let i = self.pop_file()?;
                let bytes = self.mem.read(at, count)?.to_vec();
                self.files.writing(i)?.put(&bytes)
            }
            X_READLN => {
                let i = self.pop_file()?;
                let file = self.files.reading(i)?;
                loop {
                    match file.read_raw().map_err(|_| error!(ReadFailed))? {
                        Some(b'\n') | None => break,
                        Some(_) => {}
                    }
                }
                file.eoln = true;
                Ok(())
            }
            X_WRITELN => {
                let i = self.pop_file()?;
                self.files.writing(i)?.put(b"\n")
            }
            X_PAGE => {
                let i = self.pop_file()?;
                self.files.writing(i)?.put(b"\x0C")
            }
            X_EOF => {
                let i = self.pop_file()?;
                let at_end = {
                    let file = self.files.get(i)?;
                    if let Stream::Dir { entries, pos } = &file.stream {
                        *pos >= entries.len()
                    } else if file.mode == Mode::Reading {
                        file.peek().map_err(|_| error!(ReadFailed))?.is_none()
                    } else {
                        true
                    }
                };
                self.push(if at_end { 1 } else { 0 })
            }
            X_EOLN => {
                let i = self.pop_file()?;
                let eoln = self.files.get(i)?.eoln;
                self.push(if eoln { 1 } else { 0 })
            }
            X_SEEK => {
                let records = self.pop_long()?;
                let i = self.pop_file()?;
                let file = self.files.get(i)?;
                if records < 0 {
                    return Err(error!(SeekFailed));
                }
                let at = records as u64 * file.record_size as u64;
                file.pushback = None;
                file.disk()?
                    .seek(SeekFrom::Start(at))
                    .map_err(|_| error!(SeekFailed))?;
                Ok(())
            }
            X_POS => {
                let i = self.pop_file()?;
                let records = {
                    let file = self.files.get(i)?;
                    let adjust = if file.pushback.is_some() { 1 } else { 0 };
                    let rec = file.record_size as u64;
                    let at = file
                        .disk()?
                        .seek(SeekFrom::Current(0))
                        .map_err(|_| error!(SeekFailed))?;
                    ((at.saturating_sub(adjust)) / rec) as i64
                };
                self.push_long(records.min(i32::max_value() as i64) as i32)
            }
            X_SIZE => {
                let i = self.pop_file()?;
                let records = {
                    let file = self.files.get(i)?;
                    let rec = file.record_size as u64;
                    let len = file
                        .disk()?
                        .metadata()
                        .map_err(|_| error!(SeekFailed))?
                        .len();
                    (len / rec) as i64
                };
                self.push_long(records.min(i32::max_value() as i64) as i32)
            }
            X_OPENDIR => {
                let name_at = self.popu()?;
                let i = self.pop_user_file()?;
                let name = self.str_take(name_at)?;
                let mut entries = vec![];
                let listing = std::fs::read_dir(&name).map_err(|_| error!(FileNotFound))?;
                for entry in listing {
                    let entry = entry.map_err(|_| error!(ReadFailed))?;
                    entries.push(entry.file_name().to_string_lossy().into_owned());
                }
                entries.sort();
                let file = self.files.get(i)?;
                file.stream = Stream::Dir { entries, pos: 0 };
                file.mode = Mode::Reading;
                file.name = name;
                Ok(())
            }
            X_READDIR => {
                let at = self.popu()?;
                let i = self.pop_file()?;
                let name = {
                    let file = self.files.reading(i)?;
                    match &mut file.stream {
                        Stream::Dir { entries, pos } => {
                            if *pos < entries.len() {
                                *pos += 1;
                                entries[*pos - 1].clone()
                            } else {
                                String::new()
                            }
                        }
                        _ => return Err(error!(BadFileOp)),
                    }
                };
                self.str_set(at, name.as_bytes())
            }
            X_REWINDDIR => {
                let i = self.pop_file()?;
                let file = self.files.reading(i)?;
                match &mut file.stream {
                    Stream::Dir { pos, .. } => {
                        *pos = 0;
                        Ok(())
                    }
                    _ => Err(error!(BadFileOp)),
                }
            }
            X_CLOSEDIR => {
                let i = self.pop_user_file()?;
                let file = self.files.get(i)?;
                match file.stream {
                    Stream::Dir { .. } => {
                        file.stream = Stream::None;
                        file.mode = Mode::Closed;
                        Ok(())
                    }
                    _ => Err(error!(BadFileOp)),
                }
            }
            X_STAT => {
                let dst = self.popu()?;
                let name_at = self.popu()?;
                let name = self.str_take(name_at)?;
                let meta = std::fs::metadata(&name).map_err(|_| error!(FileNotFound))?;
                let stamp = match meta.modified() {
                    Ok(time) => {
                        let local: chrono::DateTime<chrono::Local> = time.into();
                        local.format("%Y-%m-%d %H:%M:%S").to_string()
                    }
                    Err(_) => String::new(),
                };
                self.str_set(dst, stamp.as_bytes())?;
                self.push_long(meta.len().min(i32::max_value() as u64) as i32)
            }
            X_ERASE => {
                let name_at = self.popu()?;
                let name = self.str_take(name_at)?;
                std::fs::remove_file(&name).map_err(|_| error!(FileNotFound))
            }
            X_RENAME => {
                let new_at = self.popu()?;
                let old_at = self.popu()?;
                let new_name = self.str_take(new_at)?;
                let old_name = self.str_take(old_at)?;
                std::fs::rename(&old_name, &new_name).map_err(|_| error!(WriteFailed))
            }
            X_FLUSH => {
                let i = self.pop_file()?;
                let file = self.files.writing(i)?;
                let done = match &mut file.stream {
                    Stream::Stdout => {
                        let stdout = std::io::stdout();
                        let mut lock = stdout.lock();
                        lock.flush()
                    }
                    Stream::Disk(host) => host.flush(),
                    _ => Ok(()),
                };
                done.map_err(|_| error!(WriteFailed))
            }
            X_CHDIR => {
                let name_at = self.popu()?;
                let name = self.str_take(name_at)?;
                std::env::set_current_dir(&name).map_err(|_| error!(FileNotFound))
            }
            X_GETCWD => {
                let dst = self.popu()?;
                let cwd = std::env::current_dir()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.str_set(dst, cwd.as_bytes())
            }
            X_EXISTS => {
                let name_at = self.popu()?;
                let name = self.str_take(name_at)?;
                let exists = std::path::Path::new(&name).exists();
                self.push(if exists { 1 } else { 0 })
            }
            X_TRUNCATE => {
                let i = self.pop_file()?;
                let file = self.files.writing(i)?;
                let host = file.disk().map_err(|_| error!(WriteFailed))?;
                let at = host
                    .seek(SeekFrom::Current(0))
                    .map_err(|_| error!(WriteFailed))?;
                host.set_len(at).map_err(|_| error!(WriteFailed))
            }
            X_ISTEXT => {
                let i = self.pop_file()?;
                let is_text = self.files.get(i)?.is_text;
                self.push(if is_text { 1 } else { 0 })
            }
            X_RECSIZE => {
                let i = self.pop_file()?;
                let rec = self.files.get(i)?.record_size;
                self.push(rec as Word)
            }
            X_NAME => {
                let dst = self.popu()?;
                let i = self.pop_file()?;
                let name = self.files.get(i)?.name.clone();
                self.str_set(dst, name.as_bytes())
            }
            _ => Err(error!(BadFileOp)),
        }
    }
}

/// Collect a number lexeme: skip whitespace, then sign and digits,
/// optionally a fraction and exponent for reals. A terminating
/// newline is consumed and flips `eoln`; any other terminator is
/// pushed back.
fn read_number(file: &mut FileDesc, real: bool) -> Result<Vec<u8>> {
    let first = loop {
        match file.read_raw().map_err(|_| error!(ReadFailed))? {
            None => return Err(error!(InputPastEnd)),
            Some(c) if c == b' ' || c == b'\t' || c == b'\r' || c == b'\n' => {}
            Some(c) => break c,
        }
    };
    if first != b'+' && first != b'-' && !first.is_ascii_digit() {
        file.pushback = Some(first);
        return Err(error!(ReadFailed));
    }
    file.eoln = false;
    let mut lex = vec![first];
    loop {
        match file.read_raw().map_err(|_| error!(ReadFailed))? {
            None => break,
            Some(b'\n') => {
                file.eoln = true;
                break;
            }
            Some(c) if c.is_ascii_digit() => lex.push(c),
            Some(c)
                if real
                    && (c == b'.'
                        || c == b'e'
                        || c == b'E'
                        || ((c == b'+' || c == b'-')
                            && (lex.last() == Some(&b'e') || lex.last() == Some(&b'E')))) =>
            {
                lex.push(c)
            }
            Some(c) => {
                file.pushback = Some(c);
                break;
            }
        }
    }
    Ok(lex)
}

/// Read the rest of the line; the newline is consumed, not returned.
fn read_line(file: &mut FileDesc) -> Result<Vec<u8>> {
    let mut line = vec![];
    file.eoln = false;
    loop {
        match file.read_raw().map_err(|_| error!(ReadFailed))? {
            None => break,
            Some(b'\n') => {
                file.eoln = true;
                break;
            }
            Some(b'\r') => {}
            Some(c) => line.push(c),
        }
    }
    Ok(line)
}
