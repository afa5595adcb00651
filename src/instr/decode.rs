//! Instruction decoding
//!
//! This file is where a u32 instruction word is converted into the
//! Instr enum, which holds the instruction class and its fields in a
//! form ready for execution. The five immediate encodings are kept as
//! separate pure functions because the bit shuffles (B- and J-type in
//! particular) are the most error-prone part of the decoder.
//!
//! v20191213, section 2.2: the behaviour upon decoding a reserved
//! instruction is unspecified. Here every unrecognised opcode or
//! (funct3, funct7) combination is reported as a DecodeError carrying
//! the raw instruction word.

use thiserror::Error;

use super::opcodes::*;
use crate::utils::{extract_field, sign_extend};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown opcode in instruction 0x{0:08x}")]
    UnknownOpcode(u32),
    #[error("unknown (funct3, funct7) combination in instruction 0x{0:08x}")]
    UnknownFunct(u32),
}

pub fn opcode(instr: u32) -> u32 {
    extract_field(instr, 6, 0)
}

pub fn rd(instr: u32) -> u8 {
    extract_field(instr, 11, 7) as u8
}

pub fn funct3(instr: u32) -> u32 {
    extract_field(instr, 14, 12)
}

pub fn rs1(instr: u32) -> u8 {
    extract_field(instr, 19, 15) as u8
}

pub fn rs2(instr: u32) -> u8 {
    extract_field(instr, 24, 20) as u8
}

pub fn funct7(instr: u32) -> u32 {
    extract_field(instr, 31, 25)
}

/// I-type immediate: instr[31:20], sign-extended from 12 bits
pub fn imm_itype(instr: u32) -> i32 {
    sign_extend(extract_field(instr, 31, 20), 12)
}

/// S-type immediate: {instr[31:25], instr[11:7]}, sign-extended from
/// 12 bits
pub fn imm_stype(instr: u32) -> i32 {
    let imm = extract_field(instr, 31, 25) << 5 | extract_field(instr, 11, 7);
    sign_extend(imm, 12)
}

/// B-type immediate: {instr[31], instr[7], instr[30:25], instr[11:8],
/// 0}, sign-extended from 13 bits
pub fn imm_btype(instr: u32) -> i32 {
    let imm = extract_field(instr, 31, 31) << 12
        | extract_field(instr, 7, 7) << 11
        | extract_field(instr, 30, 25) << 5
        | extract_field(instr, 11, 8) << 1;
    sign_extend(imm, 13)
}

/// U-type immediate: instr[31:12] already in position, low 12 bits zero
pub fn imm_utype(instr: u32) -> u32 {
    instr & 0xffff_f000
}

/// J-type immediate: {instr[31], instr[19:12], instr[20],
/// instr[30:21], 0}, sign-extended from 21 bits
pub fn imm_jtype(instr: u32) -> i32 {
    let imm = extract_field(instr, 31, 31) << 20
        | extract_field(instr, 19, 12) << 12
        | extract_field(instr, 20, 20) << 11
        | extract_field(instr, 30, 21) << 1;
    sign_extend(imm, 21)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Load {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Sb,
    Sh,
    Sw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegImm {
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegReg {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
}

/// A decoded instruction
///
/// One variant per encoding class, holding register numbers and the
/// pre-extended immediate for that class. For the shift-immediate
/// instructions the imm field holds the 5-bit shift amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Lui {
        dest: u8,
        u_immediate: u32,
    },
    Auipc {
        dest: u8,
        u_immediate: u32,
    },
    Jal {
        dest: u8,
        offset: i32,
    },
    Jalr {
        dest: u8,
        base: u8,
        offset: i32,
    },
    Branch {
        mnemonic: Branch,
        src1: u8,
        src2: u8,
        offset: i32,
    },
    Load {
        mnemonic: Load,
        dest: u8,
        base: u8,
        offset: i32,
    },
    Store {
        mnemonic: Store,
        src: u8,
        base: u8,
        offset: i32,
    },
    RegImm {
        mnemonic: RegImm,
        dest: u8,
        src: u8,
        imm: i32,
    },
    RegReg {
        mnemonic: RegReg,
        dest: u8,
        src1: u8,
        src2: u8,
    },
    /// The exact word 0x0010_0073, which halts the simulator
    Ebreak,
    /// Any other System encoding; executes as a no-op
    System,
}

fn decode_load(instr: u32) -> Result<Instr, DecodeError> {
    let mnemonic = match funct3(instr) {
        FUNCT3_B => Load::Lb,
        FUNCT3_H => Load::Lh,
        FUNCT3_W => Load::Lw,
        FUNCT3_BU => Load::Lbu,
        FUNCT3_HU => Load::Lhu,
        _ => return Err(DecodeError::UnknownFunct(instr)),
    };
    Ok(Instr::Load {
        mnemonic,
        dest: rd(instr),
        base: rs1(instr),
        offset: imm_itype(instr),
    })
}

fn decode_store(instr: u32) -> Result<Instr, DecodeError> {
    let mnemonic = match funct3(instr) {
        FUNCT3_B => Store::Sb,
        FUNCT3_H => Store::Sh,
        FUNCT3_W => Store::Sw,
        _ => return Err(DecodeError::UnknownFunct(instr)),
    };
    Ok(Instr::Store {
        mnemonic,
        src: rs2(instr),
        base: rs1(instr),
        offset: imm_stype(instr),
    })
}

fn decode_branch(instr: u32) -> Result<Instr, DecodeError> {
    let mnemonic = match funct3(instr) {
        FUNCT3_BEQ => Branch::Beq,
        FUNCT3_BNE => Branch::Bne,
        FUNCT3_BLT => Branch::Blt,
        FUNCT3_BGE => Branch::Bge,
        FUNCT3_BLTU => Branch::Bltu,
        FUNCT3_BGEU => Branch::Bgeu,
        _ => return Err(DecodeError::UnknownFunct(instr)),
    };
    Ok(Instr::Branch {
        mnemonic,
        src1: rs1(instr),
        src2: rs2(instr),
        offset: imm_btype(instr),
    })
}

fn decode_reg_imm(instr: u32) -> Result<Instr, DecodeError> {
    // The shift instructions reuse the low five immediate bits as the
    // shift amount and funct7 to pick the shift type
    let (mnemonic, imm) = match (funct3(instr), funct7(instr)) {
        (FUNCT3_ADDI, _) => (RegImm::Addi, imm_itype(instr)),
        (FUNCT3_SLTI, _) => (RegImm::Slti, imm_itype(instr)),
        (FUNCT3_SLTIU, _) => (RegImm::Sltiu, imm_itype(instr)),
        (FUNCT3_XORI, _) => (RegImm::Xori, imm_itype(instr)),
        (FUNCT3_ORI, _) => (RegImm::Ori, imm_itype(instr)),
        (FUNCT3_ANDI, _) => (RegImm::Andi, imm_itype(instr)),
        (FUNCT3_SLLI, FUNCT7_BASE) => (RegImm::Slli, rs2(instr).into()),
        (FUNCT3_SRLI, FUNCT7_BASE) => (RegImm::Srli, rs2(instr).into()),
        (FUNCT3_SRAI, FUNCT7_SRAI) => (RegImm::Srai, rs2(instr).into()),
        _ => return Err(DecodeError::UnknownFunct(instr)),
    };
    Ok(Instr::RegImm {
        mnemonic,
        dest: rd(instr),
        src: rs1(instr),
        imm,
    })
}

fn decode_reg_reg(instr: u32) -> Result<Instr, DecodeError> {
    let mnemonic = match (funct7(instr), funct3(instr)) {
        (FUNCT7_BASE, FUNCT3_ADD) => RegReg::Add,
        (FUNCT7_BASE, FUNCT3_SLL) => RegReg::Sll,
        (FUNCT7_BASE, FUNCT3_SLT) => RegReg::Slt,
        (FUNCT7_BASE, FUNCT3_SLTU) => RegReg::Sltu,
        (FUNCT7_BASE, FUNCT3_XOR) => RegReg::Xor,
        (FUNCT7_BASE, FUNCT3_SRL) => RegReg::Srl,
        (FUNCT7_BASE, FUNCT3_OR) => RegReg::Or,
        (FUNCT7_BASE, FUNCT3_AND) => RegReg::And,
        (FUNCT7_SUB, FUNCT3_SUB) => RegReg::Sub,
        (FUNCT7_SRA, FUNCT3_SRA) => RegReg::Sra,
        (FUNCT7_MULDIV, FUNCT3_MUL) => RegReg::Mul,
        (FUNCT7_MULDIV, FUNCT3_MULH) => RegReg::Mulh,
        (FUNCT7_MULDIV, FUNCT3_MULHSU) => RegReg::Mulhsu,
        (FUNCT7_MULDIV, FUNCT3_MULHU) => RegReg::Mulhu,
        (FUNCT7_MULDIV, FUNCT3_DIV) => RegReg::Div,
        (FUNCT7_MULDIV, FUNCT3_DIVU) => RegReg::Divu,
        (FUNCT7_MULDIV, FUNCT3_REM) => RegReg::Rem,
        (FUNCT7_MULDIV, FUNCT3_REMU) => RegReg::Remu,
        _ => return Err(DecodeError::UnknownFunct(instr)),
    };
    Ok(Instr::RegReg {
        mnemonic,
        dest: rd(instr),
        src1: rs1(instr),
        src2: rs2(instr),
    })
}

impl TryFrom<u32> for Instr {
    type Error = DecodeError;

    fn try_from(instr: u32) -> Result<Self, Self::Error> {
        match opcode(instr) {
            OP_LUI => Ok(Instr::Lui {
                dest: rd(instr),
                u_immediate: imm_utype(instr),
            }),
            OP_AUIPC => Ok(Instr::Auipc {
                dest: rd(instr),
                u_immediate: imm_utype(instr),
            }),
            OP_JAL => Ok(Instr::Jal {
                dest: rd(instr),
                offset: imm_jtype(instr),
            }),
            OP_JALR => Ok(Instr::Jalr {
                dest: rd(instr),
                base: rs1(instr),
                offset: imm_itype(instr),
            }),
            OP_BRANCH => decode_branch(instr),
            OP_LOAD => decode_load(instr),
            OP_STORE => decode_store(instr),
            OP_IMM => decode_reg_imm(instr),
            OP => decode_reg_reg(instr),
            OP_SYSTEM => {
                if instr == EBREAK {
                    Ok(Instr::Ebreak)
                } else {
                    Ok(Instr::System)
                }
            }
            _ => Err(DecodeError::UnknownOpcode(instr)),
        }
    }
}
