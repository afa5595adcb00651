//! Trace records
//!
//! The executor returns one TraceRecord per traced instruction;
//! formatting into the textual trace line lives here, behind Display,
//! so correctness tests can inspect records without parsing text.
//!
//! The line formats are fixed: pc as 0x%08x followed by a colon, the
//! mnemonic left-justified in a seven-character field (ebreak prints
//! bare), I/S-type immediates as 0x%03x masked to 12 bits, branch and
//! jump offsets printed from their signed 32-bit pattern, U-type
//! immediates as 0x%05x of the upper 20 bits, register values as
//! 0x%08x, shift amounts and comparison outcomes in decimal.

use std::fmt;

use crate::hart::registers::abi_name;
use crate::instr::decode::{Branch, Load, RegImm, RegReg, Store};

/// What one executed instruction did to the architectural state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Lui {
        dest: u8,
        u_immediate: u32,
        result: u32,
    },
    Auipc {
        dest: u8,
        u_immediate: u32,
        result: u32,
    },
    Jal {
        dest: u8,
        offset: i32,
        next_pc: u32,
        link: u32,
    },
    Jalr {
        dest: u8,
        base: u8,
        offset: i32,
        base_val: u32,
        link: u32,
    },
    Branch {
        mnemonic: Branch,
        src1: u8,
        src2: u8,
        offset: i32,
        src1_val: u32,
        src2_val: u32,
        taken: bool,
        next_pc: u32,
    },
    Load {
        mnemonic: Load,
        dest: u8,
        base: u8,
        offset: i32,
        addr: u32,
        value: u32,
    },
    Store {
        mnemonic: Store,
        src: u8,
        base: u8,
        offset: i32,
        addr: u32,
        value: u32,
    },
    RegImm {
        mnemonic: RegImm,
        dest: u8,
        src: u8,
        imm: i32,
        src_val: u32,
        result: u32,
    },
    RegReg {
        mnemonic: RegReg,
        dest: u8,
        src1: u8,
        src2: u8,
        src1_val: u32,
        src2_val: u32,
        result: u32,
    },
    Ebreak,
    /// An undecodable instruction word, kept verbatim
    Unknown {
        word: u32,
    },
}

/// One line of the execution trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Address of the instruction
    pub pc: u32,
    pub kind: TraceKind,
}

fn load_mnemonic(mnemonic: Load) -> &'static str {
    match mnemonic {
        Load::Lb => "lb",
        Load::Lh => "lh",
        Load::Lw => "lw",
        Load::Lbu => "lbu",
        Load::Lhu => "lhu",
    }
}

fn store_mnemonic(mnemonic: Store) -> &'static str {
    match mnemonic {
        Store::Sb => "sb",
        Store::Sh => "sh",
        Store::Sw => "sw",
    }
}

fn branch_mnemonic(mnemonic: Branch) -> &'static str {
    match mnemonic {
        Branch::Beq => "beq",
        Branch::Bne => "bne",
        Branch::Blt => "blt",
        Branch::Bge => "bge",
        Branch::Bltu => "bltu",
        Branch::Bgeu => "bgeu",
    }
}

fn branch_condition(mnemonic: Branch) -> &'static str {
    match mnemonic {
        Branch::Beq => "==",
        Branch::Bne => "!=",
        Branch::Blt | Branch::Bltu => "<",
        Branch::Bge | Branch::Bgeu => ">=",
    }
}

fn reg_imm_mnemonic(mnemonic: RegImm) -> &'static str {
    match mnemonic {
        RegImm::Addi => "addi",
        RegImm::Slti => "slti",
        RegImm::Sltiu => "sltiu",
        RegImm::Xori => "xori",
        RegImm::Ori => "ori",
        RegImm::Andi => "andi",
        RegImm::Slli => "slli",
        RegImm::Srli => "srli",
        RegImm::Srai => "srai",
    }
}

fn reg_reg_mnemonic(mnemonic: RegReg) -> &'static str {
    match mnemonic {
        RegReg::Add => "add",
        RegReg::Sub => "sub",
        RegReg::Sll => "sll",
        RegReg::Slt => "slt",
        RegReg::Sltu => "sltu",
        RegReg::Xor => "xor",
        RegReg::Srl => "srl",
        RegReg::Sra => "sra",
        RegReg::Or => "or",
        RegReg::And => "and",
        RegReg::Mul => "mul",
        RegReg::Mulh => "mulh",
        RegReg::Mulhsu => "mulhsu",
        RegReg::Mulhu => "mulhu",
        RegReg::Div => "div",
        RegReg::Divu => "divu",
        RegReg::Rem => "rem",
        RegReg::Remu => "remu",
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08x}:", self.pc)?;
        match self.kind {
            TraceKind::Lui {
                dest,
                u_immediate,
                result,
            } => write!(
                f,
                "{:<7}{},0x{:05x}     {}=0x{:08x}",
                "lui",
                abi_name(dest),
                u_immediate >> 12,
                abi_name(dest),
                result
            ),
            TraceKind::Auipc {
                dest,
                u_immediate,
                result,
            } => write!(
                f,
                "{:<7}{},0x{:05x}     {}=0x{:08x}+0x{:08x}=0x{:08x}",
                "auipc",
                abi_name(dest),
                u_immediate >> 12,
                abi_name(dest),
                self.pc,
                u_immediate,
                result
            ),
            TraceKind::Jal {
                dest,
                offset,
                next_pc,
                link,
            } => write!(
                f,
                "{:<7}{},0x{:05x}     pc=0x{:08x},rd=0x{:08x}",
                "jal",
                abi_name(dest),
                offset,
                next_pc,
                link
            ),
            TraceKind::Jalr {
                dest,
                base,
                offset,
                base_val,
                link,
            } => write!(
                f,
                "{:<7}{},{},0x{:03x}   pc=0x{:08x}+0x{:08x},rd=0x{:08x}",
                "jalr",
                abi_name(dest),
                abi_name(base),
                offset & 0xfff,
                base_val,
                offset as u32,
                link
            ),
            TraceKind::Branch {
                mnemonic,
                src1,
                src2,
                offset,
                src1_val,
                src2_val,
                taken,
                next_pc,
            } => write!(
                f,
                "{:<7}{},{},0x{:03x}  (0x{:08x}{}0x{:08x})={}->pc=0x{:08x}",
                branch_mnemonic(mnemonic),
                abi_name(src1),
                abi_name(src2),
                offset,
                src1_val,
                branch_condition(mnemonic),
                src2_val,
                u32::from(taken),
                next_pc
            ),
            TraceKind::Load {
                mnemonic,
                dest,
                base,
                offset,
                addr,
                value,
            } => write!(
                f,
                "{:<7}{},0x{:03x}({})  {}=mem[0x{:08x}]=0x{:08x}",
                load_mnemonic(mnemonic),
                abi_name(dest),
                offset & 0xfff,
                abi_name(base),
                abi_name(dest),
                addr,
                value
            ),
            TraceKind::Store {
                mnemonic,
                src,
                base,
                offset,
                addr,
                value,
            } => {
                write!(
                    f,
                    "{:<7}{},0x{:03x}({}) mem[0x{:08x}]=",
                    store_mnemonic(mnemonic),
                    abi_name(src),
                    offset & 0xfff,
                    abi_name(base),
                    addr,
                )?;
                match mnemonic {
                    Store::Sb => write!(f, "0x{value:02x}"),
                    Store::Sh => write!(f, "0x{value:04x}"),
                    Store::Sw => write!(f, "0x{value:08x}"),
                }
            }
            TraceKind::RegImm {
                mnemonic,
                dest,
                src,
                imm,
                src_val,
                result,
            } => match mnemonic {
                RegImm::Addi | RegImm::Xori | RegImm::Ori | RegImm::Andi => {
                    let operator = match mnemonic {
                        RegImm::Addi => "+",
                        RegImm::Xori => "^",
                        RegImm::Ori => "|",
                        _ => "&",
                    };
                    write!(
                        f,
                        "{:<7}{},{},0x{:03x}   {}=0x{:08x}{}0x{:08x}=0x{:08x}",
                        reg_imm_mnemonic(mnemonic),
                        abi_name(dest),
                        abi_name(src),
                        imm & 0xfff,
                        abi_name(dest),
                        src_val,
                        operator,
                        imm as u32,
                        result
                    )
                }
                RegImm::Slti | RegImm::Sltiu => write!(
                    f,
                    "{:<7}{},{},0x{:03x}   {}=(0x{:08x}<0x{:08x})={}",
                    reg_imm_mnemonic(mnemonic),
                    abi_name(dest),
                    abi_name(src),
                    imm & 0xfff,
                    abi_name(dest),
                    src_val,
                    imm as u32,
                    result
                ),
                RegImm::Slli | RegImm::Srli | RegImm::Srai => {
                    let operator = match mnemonic {
                        RegImm::Slli => "<<",
                        RegImm::Srli => ">>",
                        _ => ">>>",
                    };
                    write!(
                        f,
                        "{:<7}{},{},{}      {}=0x{:08x}{}{}=0x{:08x}",
                        reg_imm_mnemonic(mnemonic),
                        abi_name(dest),
                        abi_name(src),
                        imm,
                        abi_name(dest),
                        src_val,
                        operator,
                        imm,
                        result
                    )
                }
            },
            TraceKind::RegReg {
                mnemonic,
                dest,
                src1,
                src2,
                src1_val,
                src2_val,
                result,
            } => {
                write!(
                    f,
                    "{:<7}{},{},{}     {}=",
                    reg_reg_mnemonic(mnemonic),
                    abi_name(dest),
                    abi_name(src1),
                    abi_name(src2),
                    abi_name(dest),
                )?;
                match mnemonic {
                    RegReg::Add
                    | RegReg::Sub
                    | RegReg::Xor
                    | RegReg::Or
                    | RegReg::And
                    | RegReg::Mul
                    | RegReg::Div
                    | RegReg::Divu
                    | RegReg::Rem
                    | RegReg::Remu => {
                        let operator = match mnemonic {
                            RegReg::Add => "+",
                            RegReg::Sub => "-",
                            RegReg::Xor => "^",
                            RegReg::Or => "|",
                            RegReg::And => "&",
                            RegReg::Mul => "*",
                            RegReg::Div | RegReg::Divu => "/",
                            _ => "%",
                        };
                        write!(
                            f,
                            "0x{src1_val:08x}{operator}0x{src2_val:08x}=0x{result:08x}"
                        )
                    }
                    RegReg::Slt | RegReg::Sltu => {
                        write!(f, "(0x{src1_val:08x}<0x{src2_val:08x})={result}")
                    }
                    RegReg::Sll | RegReg::Srl | RegReg::Sra => {
                        let operator = match mnemonic {
                            RegReg::Sll => "<<",
                            RegReg::Srl => ">>",
                            _ => ">>>",
                        };
                        let shamt = src2_val & 0x1f;
                        write!(f, "0x{src1_val:08x}{operator}{shamt}=0x{result:08x}")
                    }
                    RegReg::Mulh | RegReg::Mulhu => {
                        write!(f, "upper(0x{src1_val:08x}*0x{src2_val:08x})=0x{result:08x}")
                    }
                    RegReg::Mulhsu => write!(
                        f,
                        "upper(0x{src1_val:08x}(s)*0x{src2_val:08x}(u))=0x{result:08x}"
                    ),
                }
            }
            TraceKind::Ebreak => write!(f, "ebreak"),
            TraceKind::Unknown { word } => write!(f, "{:<7}0x{:08x}", ".word", word),
        }
    }
}
