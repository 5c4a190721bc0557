mod common;

use common::*;
use pcode::mach::codes::*;
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pcode_{}_{}", std::process::id(), name))
}

// locals at fp+8: file number at 0, name descriptor at 2,
// spare descriptor at 8
const FILENO: u16 = 0;
const NAME: u16 = 2;
const LINE: u16 = 8;

fn prologue(a: &mut Asm, path: &PathBuf) {
    let text = path.to_string_lossy().into_owned();
    let at = a.ro(text.as_bytes());
    a.op8(INCS, 7);
    a.op24(SYS, LIB_FILE, X_ALLOC);
    a.op24(STL, 0, FILENO);
    a.op16(LDC, text.len() as u16);
    a.op24(STL, 0, NAME);
    a.op16(LRA, at);
    a.op24(STL, 0, NAME + 2);
    a.op16(LDC, text.len() as u16);
    a.op24(STL, 0, NAME + 4);
    // assign the name
    a.op24(LDL, 0, FILENO);
    a.op24(LLA, 0, NAME);
    a.op16(LDC, 1);
    a.op24(SYS, LIB_FILE, X_ASSIGN);
}

fn fileno(a: &mut Asm) {
    a.op24(LDL, 0, FILENO);
}

#[test]
fn test_write_then_read_integer_sets_eoln() {
    let path = scratch("int.txt");
    let mut a = Asm::new();
    prologue(&mut a, &path);
    // write "123\n"
    fileno(&mut a);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_REWRITE);
    fileno(&mut a);
    a.op16(LDC, 123);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_WRITEI);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_WRITELN);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_CLOSE);
    // read it back
    fileno(&mut a);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_RESET);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_READI);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_EOLN);
    a.op16(LDC, 1000);
    a.op(MUL);
    a.op(ADD);
    a.op24(SYS, LIB_OS, O_EXIT);
    let code = exit_code(&mut machine(a));
    let _ = std::fs::remove_file(&path);
    assert_eq!(code, 1123);
}

#[test]
fn test_read_lines_and_eof() {
    let path = scratch("lines.txt");
    std::fs::write(&path, "ALPHA\nBETA\n").unwrap();
    let mut a = Asm::new();
    prologue(&mut a, &path);
    fileno(&mut a);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_RESET);
    a.op24(LLA, 0, LINE);
    a.op16(LDC, 32);
    a.op24(SYS, LIB_STRING, T_INIT);
    // first line
    fileno(&mut a);
    a.op24(LLA, 0, LINE);
    a.op24(SYS, LIB_FILE, X_READS);
    a.op24(LLA, 0, LINE);
    a.op24(SYS, LIB_STRING, T_LEN);
    a.op16(LDC, 100);
    a.op(MUL);
    // second line
    fileno(&mut a);
    a.op24(LLA, 0, LINE);
    a.op24(SYS, LIB_FILE, X_READS);
    a.op24(LLA, 0, LINE);
    a.op24(SYS, LIB_STRING, T_LEN);
    a.op16(LDC, 10);
    a.op(MUL);
    a.op(ADD);
    // the trailing newline was consumed, so this is the end
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_EOF);
    a.op(ADD);
    a.op24(SYS, LIB_OS, O_EXIT);
    let code = exit_code(&mut machine(a));
    let _ = std::fs::remove_file(&path);
    assert_eq!(code, 541);
}

#[test]
fn test_records_seek_pos_size() {
    let path = scratch("records.bin");
    std::fs::write(&path, b"0123456789").unwrap();
    let mut a = Asm::new();
    prologue(&mut a, &path);
    fileno(&mut a);
    a.op16(LDC, 2); // two-byte records
    a.op24(SYS, LIB_FILE, X_RESET);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_SIZE);
    a.op8(LONGOP8, L_LTOI);
    a.op16(LDC, 1000);
    a.op(MUL);
    // seek to record 2, byte 4
    fileno(&mut a);
    a.op16(LDC, 2);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_SEEK);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_POS);
    a.op8(LONGOP8, L_LTOI);
    a.op16(LDC, 100);
    a.op(MUL);
    a.op(ADD);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_READCH);
    a.op16(LDC, 48);
    a.op(SUB);
    a.op(ADD);
    a.op24(SYS, LIB_OS, O_EXIT);
    let code = exit_code(&mut machine(a));
    let _ = std::fs::remove_file(&path);
    assert_eq!(code, 5204);
}

#[test]
fn test_block_write_and_read() {
    let path = scratch("blocks.bin");
    let mut a = Asm::new();
    let text = a.ro(b"WXYZ");
    prologue(&mut a, &path);
    fileno(&mut a);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_REWRITE);
    fileno(&mut a);
    a.op16(LRA, text);
    a.op16(LDC, 4);
    a.op24(SYS, LIB_FILE, X_WRITEB);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_CLOSE);
    fileno(&mut a);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_RESET);
    // read back into the line descriptor area, then load a byte
    fileno(&mut a);
    a.op24(LLA, 0, LINE);
    a.op16(LDC, 4);
    a.op24(SYS, LIB_FILE, X_READB);
    a.op24(LLA, 0, LINE);
    a.op16(LDC, 3);
    a.op16(IXA, 1);
    a.op(LDB);
    a.op24(SYS, LIB_OS, O_EXIT);
    let code = exit_code(&mut machine(a));
    let _ = std::fs::remove_file(&path);
    assert_eq!(code, b'Z' as i16);
}

#[test]
fn test_directory_listing_is_sorted() {
    let dir = scratch("dir");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("b.txt"), "b").unwrap();
    std::fs::write(dir.join("a.txt"), "a").unwrap();
    let mut a = Asm::new();
    prologue(&mut a, &dir);
    // open the directory under the allocated number
    fileno(&mut a);
    a.op24(LLA, 0, NAME);
    a.op24(SYS, LIB_FILE, X_OPENDIR);
    a.op24(LLA, 0, LINE);
    a.op16(LDC, 32);
    a.op24(SYS, LIB_STRING, T_INIT);
    for weight in &[100u16, 10, 1] {
        fileno(&mut a);
        a.op24(LLA, 0, LINE);
        a.op24(SYS, LIB_FILE, X_READDIR);
        a.op24(LLA, 0, LINE);
        a.op24(SYS, LIB_STRING, T_LEN);
        a.op16(LDC, *weight);
        a.op(MUL);
        if *weight != 100 {
            a.op(ADD);
        }
    }
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_CLOSEDIR);
    a.op24(SYS, LIB_OS, O_EXIT);
    let code = exit_code(&mut machine(a));
    let _ = std::fs::remove_dir_all(&dir);
    // "a.txt" then "b.txt" then the empty end marker
    assert_eq!(code, 550);
}

#[test]
fn test_exists_erase() {
    let path = scratch("erase.txt");
    std::fs::write(&path, "x").unwrap();
    let mut a = Asm::new();
    prologue(&mut a, &path);
    a.op24(LLA, 0, NAME);
    a.op24(SYS, LIB_FILE, X_EXISTS);
    a.op24(LLA, 0, NAME);
    a.op24(SYS, LIB_FILE, X_ERASE);
    a.op24(LLA, 0, NAME);
    a.op24(SYS, LIB_FILE, X_EXISTS);
    a.op16(LDC, 10);
    a.op(MUL);
    a.op(ADD);
    a.op24(SYS, LIB_OS, O_EXIT);
    // exists(1) + 10*exists-after-erase(0)
    assert_eq!(exit_code(&mut machine(a)), 1);
}

#[test]
fn test_read_on_write_file_faults() {
    let path = scratch("mode.txt");
    let mut a = Asm::new();
    prologue(&mut a, &path);
    fileno(&mut a);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_REWRITE);
    fileno(&mut a);
    a.op24(SYS, LIB_FILE, X_READI);
    a.op(END);
    let code = error_code(&mut machine(a));
    let _ = std::fs::remove_file(&path);
    assert_eq!(code, 15); // NOT OPEN FOR READ
}

#[test]
fn test_bad_file_number_faults() {
    let mut a = Asm::new();
    a.op16(LDC, 9); // never allocated
    a.op24(SYS, LIB_FILE, X_READI);
    a.op(END);
    assert_eq!(error_code(&mut machine(a)), 13);
}

#[test]
fn test_missing_file_faults() {
    let path = scratch("missing.txt");
    let mut a = Asm::new();
    prologue(&mut a, &path);
    fileno(&mut a);
    a.op16(LDC, 0);
    a.op24(SYS, LIB_FILE, X_RESET);
    a.op(END);
    assert_eq!(error_code(&mut machine(a)), 17); // FILE NOT FOUND
}

#[test]
fn test_file_table_exhaustion() {
    let mut a = Asm::new();
    // 14 user slots; the 15th allocation fails
    for _ in 0..15 {
        a.op24(SYS, LIB_FILE, X_ALLOC);
        a.op(DROP);
    }
    a.op(END);
    assert_eq!(error_code(&mut machine(a)), 14); // TOO MANY FILES
}

#[test]
fn test_free_releases_a_number() {
    let mut a = Asm::new();
    for _ in 0..14 {
        a.op24(SYS, LIB_FILE, X_ALLOC);
        a.op(DROP);
    }
    a.op16(LDC, 5);
    a.op24(SYS, LIB_FILE, X_FREE);
    a.op24(SYS, LIB_FILE, X_ALLOC); // reuses slot 5
    a.op24(SYS, LIB_OS, O_EXIT);
    assert_eq!(exit_code(&mut machine(a)), 5);
}

#[test]
fn test_stdin_stdout_cannot_be_freed() {
    let mut a = Asm::new();
    a.op16(LDC, 1);
    a.op24(SYS, LIB_FILE, X_FREE);
    a.op(END);
    assert_eq!(error_code(&mut machine(a)), 13);
}
