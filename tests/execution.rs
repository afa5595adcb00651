//! End-to-end scenarios: assemble a program, load it through the
//! hex-record loader, run to ebreak, and check the final register
//! state and the trace output.

use rv32sim::hart::memory::MEM_BASE;
use rv32sim::hart::Hart;
use rv32sim::instr::encode::*;
use rv32sim::loader::load_image;
use rv32sim::sim::{run_to_halt, RunSummary};

/// Render instruction words as a hex-record image at the reset base
fn image_from_words(words: &[u32]) -> String {
    let mut image = format!("@{MEM_BASE:x}\n");
    for word in words {
        let bytes = word.to_le_bytes();
        image.push_str(&format!(
            "{:02x} {:02x} {:02x} {:02x}\n",
            bytes[0], bytes[1], bytes[2], bytes[3]
        ));
    }
    image
}

/// Load and run a program, returning the hart, the trace text and the
/// run summary
fn run_program(words: &[u32]) -> (Hart, String, RunSummary) {
    let mut hart = Hart::new();
    let image = image_from_words(words);
    load_image(image.as_bytes(), &mut hart.memory).unwrap();
    let mut sink = Vec::new();
    let summary = run_to_halt(&mut hart, &mut sink, Some(10_000)).unwrap();
    (hart, String::from_utf8(sink).unwrap(), summary)
}

#[test]
fn add_two_immediates() {
    let (hart, trace, summary) = run_program(&[
        addi(10, 0, 5),  // addi a0, zero, 5
        addi(11, 0, 7),  // addi a1, zero, 7
        add(12, 10, 11), // add a2, a0, a1
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(12), 12);
    assert_eq!(summary.instructions, 4);
    assert_eq!(trace.lines().count(), 4);
}

#[test]
fn add_two_immediates_trace_text() {
    let (_, trace, _) = run_program(&[
        addi(10, 0, 5),
        addi(11, 0, 7),
        add(12, 10, 11),
        ebreak(),
    ]);
    let expected = "\
0x80000000:addi   a0,zero,0x005   a0=0x00000000+0x00000005=0x00000005
0x80000004:addi   a1,zero,0x007   a1=0x00000000+0x00000007=0x00000007
0x80000008:add    a2,a0,a1     a2=0x00000005+0x00000007=0x0000000c
0x8000000c:ebreak
";
    assert_eq!(trace, expected);
}

#[test]
fn lui_addi_builds_constant() {
    let (hart, _, _) = run_program(&[
        lui(5, 0x12345),    // lui t0, 0x12345
        addi(5, 5, 0x678),  // addi t0, t0, 0x678 (positive, no borrow)
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(5), 0x1234_5678);
}

#[test]
fn arithmetic_and_logical_right_shift() {
    let (hart, _, _) = run_program(&[
        addi(5, 0, -1), // addi t0, zero, -1
        srai(6, 5, 1),  // srai t1, t0, 1
        srli(7, 5, 1),  // srli t2, t0, 1
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(6), 0xffff_ffff);
    assert_eq!(hart.registers.read(7), 0x7fff_ffff);
}

#[test]
fn branch_not_taken_falls_through() {
    let (hart, trace, _) = run_program(&[
        addi(5, 0, 10), // addi t0, zero, 10
        addi(6, 0, 0),  // addi t1, zero, 0
        beq(5, 6, 8),   // beq t0, t1, +8
        addi(10, 0, 1), // addi a0, zero, 1
        ebreak(),
        addi(10, 0, 2), // never reached
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(10), 1);
    assert_eq!(trace.lines().count(), 5);
    assert!(trace.contains(")=0->pc=0x8000000c"));
}

#[test]
fn branch_taken_skips_ahead() {
    let (hart, _, _) = run_program(&[
        addi(5, 0, 10), // addi t0, zero, 10
        addi(6, 0, 10), // addi t1, zero, 10
        beq(5, 6, 8),   // beq t0, t1, +8
        ebreak(),       // skipped
        addi(10, 0, 2),
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(10), 2);
}

#[test]
fn memory_round_trip_byte_views() {
    let (hart, trace, _) = run_program(&[
        lui(2, 0x80000),   // lui sp, 0x80000 (sp = memory base)
        addi(2, 2, 0x100), // addi sp, sp, 0x100
        addi(5, 0, -1),    // addi t0, zero, -1
        sw(5, 2, 0),       // sw t0, 0(sp)
        lbu(10, 2, 0),     // lbu a0, 0(sp)
        lb(11, 2, 3),      // lb a1, 3(sp)
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(10), 0xff);
    assert_eq!(hart.registers.read(11), 0xffff_ffff);
    assert!(trace.contains("sw     t0,0x000(sp) mem[0x80000100]=0xffffffff"));
    assert!(trace.contains("lbu    a0,0x000(sp)  a0=mem[0x80000100]=0x000000ff"));
}

#[test]
fn division_overflow_edge_case() {
    let (hart, _, _) = run_program(&[
        lui(5, 0x80000), // lui t0, 0x80000 (t0 = INT32_MIN)
        addi(6, 0, -1),  // addi t1, zero, -1
        div(7, 5, 6),    // div t2, t0, t1
        rem(28, 5, 6),   // rem t3, t0, t1
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(7), 0x8000_0000);
    assert_eq!(hart.registers.read(28), 0);
}

#[test]
fn jal_and_jalr_round_trip() {
    // Call a function at +12 and return
    let (hart, _, summary) = run_program(&[
        jal(1, 12),       // jal ra, +12
        addi(10, 0, 3),   // executed after the return
        ebreak(),
        addi(11, 0, 9),   // the function body
        jalr(0, 1, 0),    // ret
    ]);
    assert_eq!(hart.registers.read(10), 3);
    assert_eq!(hart.registers.read(11), 9);
    assert_eq!(summary.instructions, 5);
}

#[test]
fn undecodable_word_is_traced_and_skipped() {
    let (hart, trace, summary) = run_program(&[
        addi(10, 0, 1), // addi a0, zero, 1
        0xffff_ffff,    // not an instruction
        addi(10, 10, 1),
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(10), 2);
    assert_eq!(summary.instructions, 4);
    assert!(trace.contains("0x80000004:.word  0xffffffff"));
}

#[test]
fn x0_stays_zero_throughout() {
    let (hart, _, _) = run_program(&[
        addi(0, 0, 123), // write to x0 is discarded
        jal(0, 4),       // link to x0 is discarded
        sub(0, 0, 5),
        ebreak(),
    ]);
    assert_eq!(hart.registers.read(0), 0);
}
