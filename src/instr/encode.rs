//! Instruction encoding
//!
//! Builders for RV32IM instruction words, the inverse of decode. Used
//! by the test suites to assemble programs without an external
//! toolchain. Signed immediates are passed as i32 and masked to the
//! width of their field, so out-of-range values wrap rather than
//! panic; callers are expected to stay within the encodable range.

use super::opcodes::*;
use crate::utils::mask;

fn itype(opcode: u32, rd: u8, funct3: u32, rs1: u8, imm: i32) -> u32 {
    (imm as u32 & mask(12)) << 20
        | u32::from(rs1) << 15
        | funct3 << 12
        | u32::from(rd) << 7
        | opcode
}

fn rtype(opcode: u32, rd: u8, funct3: u32, rs1: u8, rs2: u8, funct7: u32) -> u32 {
    funct7 << 25
        | u32::from(rs2) << 20
        | u32::from(rs1) << 15
        | funct3 << 12
        | u32::from(rd) << 7
        | opcode
}

fn stype(opcode: u32, funct3: u32, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = imm as u32 & mask(12);
    (imm >> 5) << 25
        | u32::from(rs2) << 20
        | u32::from(rs1) << 15
        | funct3 << 12
        | (imm & mask(5)) << 7
        | opcode
}

fn btype(opcode: u32, funct3: u32, rs1: u8, rs2: u8, offset: i32) -> u32 {
    let imm = offset as u32 & mask(13);
    (imm >> 12) << 31
        | ((imm >> 5) & mask(6)) << 25
        | u32::from(rs2) << 20
        | u32::from(rs1) << 15
        | funct3 << 12
        | ((imm >> 1) & mask(4)) << 8
        | ((imm >> 11) & 1) << 7
        | opcode
}

fn utype(opcode: u32, rd: u8, imm20: u32) -> u32 {
    (imm20 & mask(20)) << 12 | u32::from(rd) << 7 | opcode
}

fn jtype(opcode: u32, rd: u8, offset: i32) -> u32 {
    let imm = offset as u32 & mask(21);
    (imm >> 20) << 31
        | ((imm >> 1) & mask(10)) << 21
        | ((imm >> 11) & 1) << 20
        | ((imm >> 12) & mask(8)) << 12
        | u32::from(rd) << 7
        | opcode
}

/// lui rd, imm20 (imm20 is the raw 20-bit field, not the shifted value)
pub fn lui(rd: u8, imm20: u32) -> u32 {
    utype(OP_LUI, rd, imm20)
}

pub fn auipc(rd: u8, imm20: u32) -> u32 {
    utype(OP_AUIPC, rd, imm20)
}

pub fn jal(rd: u8, offset: i32) -> u32 {
    jtype(OP_JAL, rd, offset)
}

pub fn jalr(rd: u8, rs1: u8, offset: i32) -> u32 {
    itype(OP_JALR, rd, 0b000, rs1, offset)
}

pub fn beq(rs1: u8, rs2: u8, offset: i32) -> u32 {
    btype(OP_BRANCH, FUNCT3_BEQ, rs1, rs2, offset)
}

pub fn bne(rs1: u8, rs2: u8, offset: i32) -> u32 {
    btype(OP_BRANCH, FUNCT3_BNE, rs1, rs2, offset)
}

pub fn blt(rs1: u8, rs2: u8, offset: i32) -> u32 {
    btype(OP_BRANCH, FUNCT3_BLT, rs1, rs2, offset)
}

pub fn bge(rs1: u8, rs2: u8, offset: i32) -> u32 {
    btype(OP_BRANCH, FUNCT3_BGE, rs1, rs2, offset)
}

pub fn bltu(rs1: u8, rs2: u8, offset: i32) -> u32 {
    btype(OP_BRANCH, FUNCT3_BLTU, rs1, rs2, offset)
}

pub fn bgeu(rs1: u8, rs2: u8, offset: i32) -> u32 {
    btype(OP_BRANCH, FUNCT3_BGEU, rs1, rs2, offset)
}

pub fn lb(rd: u8, rs1: u8, offset: i32) -> u32 {
    itype(OP_LOAD, rd, FUNCT3_B, rs1, offset)
}

pub fn lh(rd: u8, rs1: u8, offset: i32) -> u32 {
    itype(OP_LOAD, rd, FUNCT3_H, rs1, offset)
}

pub fn lw(rd: u8, rs1: u8, offset: i32) -> u32 {
    itype(OP_LOAD, rd, FUNCT3_W, rs1, offset)
}

pub fn lbu(rd: u8, rs1: u8, offset: i32) -> u32 {
    itype(OP_LOAD, rd, FUNCT3_BU, rs1, offset)
}

pub fn lhu(rd: u8, rs1: u8, offset: i32) -> u32 {
    itype(OP_LOAD, rd, FUNCT3_HU, rs1, offset)
}

pub fn sb(rs2: u8, rs1: u8, offset: i32) -> u32 {
    stype(OP_STORE, FUNCT3_B, rs1, rs2, offset)
}

pub fn sh(rs2: u8, rs1: u8, offset: i32) -> u32 {
    stype(OP_STORE, FUNCT3_H, rs1, rs2, offset)
}

pub fn sw(rs2: u8, rs1: u8, offset: i32) -> u32 {
    stype(OP_STORE, FUNCT3_W, rs1, rs2, offset)
}

pub fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    itype(OP_IMM, rd, FUNCT3_ADDI, rs1, imm)
}

pub fn slti(rd: u8, rs1: u8, imm: i32) -> u32 {
    itype(OP_IMM, rd, FUNCT3_SLTI, rs1, imm)
}

pub fn sltiu(rd: u8, rs1: u8, imm: i32) -> u32 {
    itype(OP_IMM, rd, FUNCT3_SLTIU, rs1, imm)
}

pub fn xori(rd: u8, rs1: u8, imm: i32) -> u32 {
    itype(OP_IMM, rd, FUNCT3_XORI, rs1, imm)
}

pub fn ori(rd: u8, rs1: u8, imm: i32) -> u32 {
    itype(OP_IMM, rd, FUNCT3_ORI, rs1, imm)
}

pub fn andi(rd: u8, rs1: u8, imm: i32) -> u32 {
    itype(OP_IMM, rd, FUNCT3_ANDI, rs1, imm)
}

pub fn slli(rd: u8, rs1: u8, shamt: u8) -> u32 {
    rtype(OP_IMM, rd, FUNCT3_SLLI, rs1, shamt, FUNCT7_BASE)
}

pub fn srli(rd: u8, rs1: u8, shamt: u8) -> u32 {
    rtype(OP_IMM, rd, FUNCT3_SRLI, rs1, shamt, FUNCT7_BASE)
}

pub fn srai(rd: u8, rs1: u8, shamt: u8) -> u32 {
    rtype(OP_IMM, rd, FUNCT3_SRAI, rs1, shamt, FUNCT7_SRAI)
}

pub fn add(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_ADD, rs1, rs2, FUNCT7_BASE)
}

pub fn sub(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_SUB, rs1, rs2, FUNCT7_SUB)
}

pub fn sll(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_SLL, rs1, rs2, FUNCT7_BASE)
}

pub fn slt(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_SLT, rs1, rs2, FUNCT7_BASE)
}

pub fn sltu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_SLTU, rs1, rs2, FUNCT7_BASE)
}

pub fn xor(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_XOR, rs1, rs2, FUNCT7_BASE)
}

pub fn srl(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_SRL, rs1, rs2, FUNCT7_BASE)
}

pub fn sra(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_SRA, rs1, rs2, FUNCT7_SRA)
}

pub fn or(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_OR, rs1, rs2, FUNCT7_BASE)
}

pub fn and(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_AND, rs1, rs2, FUNCT7_BASE)
}

pub fn mul(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_MUL, rs1, rs2, FUNCT7_MULDIV)
}

pub fn mulh(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_MULH, rs1, rs2, FUNCT7_MULDIV)
}

pub fn mulhsu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_MULHSU, rs1, rs2, FUNCT7_MULDIV)
}

pub fn mulhu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_MULHU, rs1, rs2, FUNCT7_MULDIV)
}

pub fn div(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_DIV, rs1, rs2, FUNCT7_MULDIV)
}

pub fn divu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_DIVU, rs1, rs2, FUNCT7_MULDIV)
}

pub fn rem(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_REM, rs1, rs2, FUNCT7_MULDIV)
}

pub fn remu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    rtype(OP, rd, FUNCT3_REMU, rs1, rs2, FUNCT7_MULDIV)
}

pub fn ebreak() -> u32 {
    EBREAK
}

#[cfg(test)]
mod tests {

    use super::*;

    // Reference words assembled with a RISC-V toolchain

    #[test]
    fn check_itype_encoding() {
        // addi x10, x0, 10
        assert_eq!(addi(10, 0, 10), 0x00a00513);
        // addi x5, x5, 0x678
        assert_eq!(addi(5, 5, 0x678), 0x67828293);
    }

    #[test]
    fn check_rtype_encoding() {
        // add x12, x10, x11
        assert_eq!(add(12, 10, 11), 0x00b50633);
        // sub x3, x1, x2
        assert_eq!(sub(3, 1, 2), 0x402081b3);
        // mul x5, x6, x7
        assert_eq!(mul(5, 6, 7), 0x027302b3);
    }

    #[test]
    fn check_shift_encoding() {
        // srai x6, x5, 1
        assert_eq!(srai(6, 5, 1), 0x4012d313);
        // srli x7, x5, 1
        assert_eq!(srli(7, 5, 1), 0x0012d393);
    }

    #[test]
    fn check_stype_encoding() {
        // sw x5, 0(x2)
        assert_eq!(sw(5, 2, 0), 0x00512023);
        // sw x5, -4(x2)
        assert_eq!(sw(5, 2, -4), 0xfe512e23);
    }

    #[test]
    fn check_btype_encoding() {
        // beq x5, x6, +8
        assert_eq!(beq(5, 6, 8), 0x00628463);
        // bne x1, x2, -4
        assert_eq!(bne(1, 2, -4), 0xfe209ee3);
    }

    #[test]
    fn check_utype_encoding() {
        // lui x5, 0x12345
        assert_eq!(lui(5, 0x12345), 0x123452b7);
        // auipc x4, 53
        assert_eq!(auipc(4, 53), 0x00035217);
    }

    #[test]
    fn check_jtype_encoding() {
        // jal x1, +8
        assert_eq!(jal(1, 8), 0x008000ef);
        // jal x0, -16
        assert_eq!(jal(0, -16), 0xff1ff06f);
    }

    #[test]
    fn check_ebreak_word() {
        assert_eq!(ebreak(), 0x00100073);
    }
}
