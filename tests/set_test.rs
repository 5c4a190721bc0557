mod common;

use common::*;
use pcode::mach::codes::*;

// two 16-word sets in the frame locals: offsets 0 and 32
fn set_program(build: impl Fn(&mut Asm)) -> i16 {
    let mut a = Asm::new();
    a.op8(INCS, 32);
    a.op24(LLA, 0, 0);
    a.op8(SETOP, S_CLR);
    a.op24(LLA, 0, 32);
    a.op8(SETOP, S_CLR);
    build(&mut a);
    a.op24(SYS, LIB_OS, O_EXIT);
    exit_code(&mut machine(a))
}

fn add(a: &mut Asm, set: u16, member: i16) {
    a.op24(LLA, 0, set);
    a.op16(LDC, member as u16);
    a.op8(SETOP, S_ADD);
}

#[test]
fn test_membership() {
    assert_eq!(
        set_program(|a| {
            add(a, 0, 3);
            add(a, 0, 200);
            a.op24(LLA, 0, 0);
            a.op16(LDC, 3);
            a.op8(SETOP, S_IN);
        }),
        1
    );
    assert_eq!(
        set_program(|a| {
            add(a, 0, 3);
            a.op24(LLA, 0, 0);
            a.op16(LDC, 4);
            a.op8(SETOP, S_IN);
        }),
        0
    );
}

#[test]
fn test_range_fill() {
    assert_eq!(
        set_program(|a| {
            a.op24(LLA, 0, 0);
            a.op16(LDC, 10);
            a.op16(LDC, 20);
            a.op8(SETOP, S_RANGE);
            a.op24(LLA, 0, 0);
            a.op16(LDC, 15);
            a.op8(SETOP, S_IN);
        }),
        1
    );
    // an empty range adds nothing
    assert_eq!(
        set_program(|a| {
            a.op24(LLA, 0, 0);
            a.op16(LDC, 20);
            a.op16(LDC, 10);
            a.op8(SETOP, S_RANGE);
            a.op24(LLA, 0, 0);
            a.op16(LDC, 15);
            a.op8(SETOP, S_IN);
        }),
        0
    );
}

#[test]
fn test_union_intersection_difference() {
    // A = {1,2}, B = {2,3}
    assert_eq!(
        set_program(|a| {
            add(a, 0, 1);
            add(a, 0, 2);
            add(a, 32, 2);
            add(a, 32, 3);
            a.op24(LLA, 0, 0);
            a.op24(LLA, 0, 32);
            a.op8(SETOP, S_UNION); // A = {1,2,3}
            a.op24(LLA, 0, 0);
            a.op16(LDC, 3);
            a.op8(SETOP, S_IN);
        }),
        1
    );
    assert_eq!(
        set_program(|a| {
            add(a, 0, 1);
            add(a, 0, 2);
            add(a, 32, 2);
            add(a, 32, 3);
            a.op24(LLA, 0, 0);
            a.op24(LLA, 0, 32);
            a.op8(SETOP, S_INT); // A = {2}
            a.op24(LLA, 0, 0);
            a.op16(LDC, 1);
            a.op8(SETOP, S_IN);
        }),
        0
    );
    assert_eq!(
        set_program(|a| {
            add(a, 0, 1);
            add(a, 0, 2);
            add(a, 32, 2);
            add(a, 32, 3);
            a.op24(LLA, 0, 0);
            a.op24(LLA, 0, 32);
            a.op8(SETOP, S_DIFF); // A = {1}
            a.op24(LLA, 0, 0);
            a.op16(LDC, 2);
            a.op8(SETOP, S_IN);
        }),
        0
    );
}

#[test]
fn test_equality_and_subset() {
    assert_eq!(
        set_program(|a| {
            add(a, 0, 7);
            add(a, 32, 7);
            a.op24(LLA, 0, 0);
            a.op24(LLA, 0, 32);
            a.op8(SETOP, S_EQ);
        }),
        1
    );
    assert_eq!(
        set_program(|a| {
            add(a, 0, 7);
            add(a, 32, 7);
            add(a, 32, 9);
            a.op24(LLA, 0, 0);
            a.op24(LLA, 0, 32);
            a.op8(SETOP, S_LE); // {7} is a subset of {7,9}
        }),
        1
    );
    assert_eq!(
        set_program(|a| {
            add(a, 0, 7);
            add(a, 0, 8);
            add(a, 32, 7);
            a.op24(LLA, 0, 0);
            a.op24(LLA, 0, 32);
            a.op8(SETOP, S_LE);
        }),
        0
    );
}

#[test]
fn test_members_mask_to_byte_range() {
    // member 259 lands on bit 3
    assert_eq!(
        set_program(|a| {
            add(a, 0, 259);
            a.op24(LLA, 0, 0);
            a.op16(LDC, 3);
            a.op8(SETOP, S_IN);
        }),
        1
    );
}
