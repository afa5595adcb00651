use thiserror::Error;

use self::memory::{Memory, MemoryError, Wordsize, MEM_BASE};
use self::registers::Registers;
use crate::instr::decode::{Branch, Instr, Load, RegImm, RegReg, Store};
use crate::trace::{TraceKind, TraceRecord};
use crate::utils::sign_extend;

pub mod memory;
pub mod registers;

/// RISC-V hardware thread
///
/// The simplest possible RISC-V hardware thread: a single hart with a
/// single privilege level, implementing RV32IM. The initial state is
/// zeroed registers, zeroed memory and pc at the reset base; programs
/// are placed in memory by the image loader before execution starts.
///
/// The member function step() controls execution of the hart. Each
/// time it is called, the instruction at the current pc is fetched,
/// decoded and executed, and a trace record describing the
/// architectural effect is returned alongside a halt flag. Undecodable
/// instruction words are not a trap: they execute as no-ops whose
/// trace record carries the raw word.
#[derive(Debug)]
pub struct Hart {
    pub pc: u32,
    pub registers: Registers,
    pub memory: Memory,
}

impl Default for Hart {
    fn default() -> Self {
        Self {
            pc: MEM_BASE,
            registers: Registers::new(),
            memory: Memory::new(),
        }
    }
}

/// The result of executing one instruction
#[derive(Debug)]
pub struct StepOutcome {
    /// Trace record for this instruction, if it produces one
    pub record: Option<TraceRecord>,
    /// True when the instruction was ebreak
    pub halt: bool,
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("memory access failed: {0}")]
    Memory(#[from] MemoryError),
}

/// Load upper immediate
///
/// Write the u-immediate (upper 20 bits of the instruction, low 12
/// bits zero) to the register dest.
fn execute_lui(hart: &mut Hart, dest: u8, u_immediate: u32) -> TraceKind {
    hart.registers.write(dest, u_immediate);
    TraceKind::Lui {
        dest,
        u_immediate,
        result: hart.registers.read(dest),
    }
}

/// Add upper immediate to program counter
///
/// Add the u-immediate to the address of this instruction and store
/// the result in the register dest.
fn execute_auipc(hart: &mut Hart, current_pc: u32, dest: u8, u_immediate: u32) -> TraceKind {
    let value = current_pc.wrapping_add(u_immediate);
    hart.registers.write(dest, value);
    TraceKind::Auipc {
        dest,
        u_immediate,
        result: hart.registers.read(dest),
    }
}

/// Jump and link
///
/// Store the address of the next instruction (pc + 4) in the register
/// dest, then jump to pc + offset.
fn execute_jal(hart: &mut Hart, current_pc: u32, dest: u8, offset: i32) -> TraceKind {
    hart.registers.write(dest, current_pc.wrapping_add(4));
    hart.pc = current_pc.wrapping_add(offset as u32);
    TraceKind::Jal {
        dest,
        offset,
        next_pc: hart.pc,
        link: hart.registers.read(dest),
    }
}

/// Jump and link register
///
/// Store the address of the next instruction (pc + 4) in the register
/// dest, then jump to base + offset with bit 0 of the target cleared.
/// The base register is read before the link write, so the old value
/// is used when base and dest coincide.
fn execute_jalr(hart: &mut Hart, current_pc: u32, dest: u8, base: u8, offset: i32) -> TraceKind {
    let base_val = hart.registers.read(base);
    hart.registers.write(dest, current_pc.wrapping_add(4));
    hart.pc = 0xffff_fffe & base_val.wrapping_add(offset as u32);
    TraceKind::Jalr {
        dest,
        base,
        offset,
        base_val,
        link: hart.registers.read(dest),
    }
}

/// Execute a conditional branch
///
/// Compare the registers src1 and src2 as specified by the mnemonic.
/// If the condition holds, jump to pc + offset; otherwise fall through
/// to the next instruction.
fn execute_branch(
    hart: &mut Hart,
    current_pc: u32,
    mnemonic: Branch,
    src1: u8,
    src2: u8,
    offset: i32,
) -> TraceKind {
    let src1_val = hart.registers.read(src1);
    let src2_val = hart.registers.read(src2);
    let taken = match mnemonic {
        Branch::Beq => src1_val == src2_val,
        Branch::Bne => src1_val != src2_val,
        Branch::Blt => (src1_val as i32) < (src2_val as i32),
        Branch::Bge => (src1_val as i32) >= (src2_val as i32),
        Branch::Bltu => src1_val < src2_val,
        Branch::Bgeu => src1_val >= src2_val,
    };
    if taken {
        hart.pc = current_pc.wrapping_add(offset as u32);
    }
    TraceKind::Branch {
        mnemonic,
        src1,
        src2,
        offset,
        src1_val,
        src2_val,
        taken,
        next_pc: hart.pc,
    }
}

/// Execute a load instruction
///
/// Compute the effective address base + offset (unsigned wraparound)
/// and load the addressed data into dest. The width, and whether the
/// result is sign- or zero-extended, is determined by the mnemonic.
fn execute_load(
    hart: &mut Hart,
    mnemonic: Load,
    dest: u8,
    base: u8,
    offset: i32,
) -> Result<TraceKind, ExecutionError> {
    let addr = hart.registers.read(base).wrapping_add(offset as u32);
    let value = match mnemonic {
        Load::Lb => sign_extend(hart.memory.read(addr, Wordsize::Byte)?, 8) as u32,
        Load::Lh => sign_extend(hart.memory.read(addr, Wordsize::Halfword)?, 16) as u32,
        Load::Lw => hart.memory.read(addr, Wordsize::Word)?,
        Load::Lbu => hart.memory.read(addr, Wordsize::Byte)?,
        Load::Lhu => hart.memory.read(addr, Wordsize::Halfword)?,
    };
    hart.registers.write(dest, value);
    Ok(TraceKind::Load {
        mnemonic,
        dest,
        base,
        offset,
        addr,
        value,
    })
}

/// Execute a store instruction
///
/// Compute the effective address base + offset (unsigned wraparound)
/// and store the low byte, halfword or word of src at that address.
fn execute_store(
    hart: &mut Hart,
    mnemonic: Store,
    src: u8,
    base: u8,
    offset: i32,
) -> Result<TraceKind, ExecutionError> {
    let addr = hart.registers.read(base).wrapping_add(offset as u32);
    let src_val = hart.registers.read(src);
    let value = match mnemonic {
        Store::Sb => {
            hart.memory.write(addr, src_val, Wordsize::Byte)?;
            src_val & 0xff
        }
        Store::Sh => {
            hart.memory.write(addr, src_val, Wordsize::Halfword)?;
            src_val & 0xffff
        }
        Store::Sw => {
            hart.memory.write(addr, src_val, Wordsize::Word)?;
            src_val
        }
    };
    Ok(TraceKind::Store {
        mnemonic,
        src,
        base,
        offset,
        addr,
        value,
    })
}

/// Execute a register-immediate operation
///
/// Compute the operation given by the mnemonic between the register
/// src and the immediate, placing the result in dest. For the shift
/// instructions imm holds the 5-bit shift amount.
fn execute_reg_imm(hart: &mut Hart, mnemonic: RegImm, dest: u8, src: u8, imm: i32) -> TraceKind {
    let src_val = hart.registers.read(src);
    let result = match mnemonic {
        RegImm::Addi => src_val.wrapping_add(imm as u32),
        RegImm::Slti => u32::from((src_val as i32) < imm),
        RegImm::Sltiu => u32::from(src_val < imm as u32),
        RegImm::Xori => src_val ^ imm as u32,
        RegImm::Ori => src_val | imm as u32,
        RegImm::Andi => src_val & imm as u32,
        RegImm::Slli => src_val << (imm as u32 & 0x1f),
        RegImm::Srli => src_val >> (imm as u32 & 0x1f),
        RegImm::Srai => ((src_val as i32) >> (imm as u32 & 0x1f)) as u32,
    };
    hart.registers.write(dest, result);
    TraceKind::RegImm {
        mnemonic,
        dest,
        src,
        imm,
        src_val,
        result,
    }
}

/// Execute a register-register operation
///
/// Compute the operation given by the mnemonic between the registers
/// src1 and src2, placing the result in dest. Covers the base integer
/// set and the M extension (chapter 7, v20191213); division by zero
/// and signed overflow produce the values the specification defines
/// rather than trapping.
fn execute_reg_reg(hart: &mut Hart, mnemonic: RegReg, dest: u8, src1: u8, src2: u8) -> TraceKind {
    let src1_val = hart.registers.read(src1);
    let src2_val = hart.registers.read(src2);
    let shamt = src2_val & 0x1f;
    let result = match mnemonic {
        RegReg::Add => src1_val.wrapping_add(src2_val),
        RegReg::Sub => src1_val.wrapping_sub(src2_val),
        RegReg::Sll => src1_val << shamt,
        RegReg::Slt => u32::from((src1_val as i32) < (src2_val as i32)),
        RegReg::Sltu => u32::from(src1_val < src2_val),
        RegReg::Xor => src1_val ^ src2_val,
        RegReg::Srl => src1_val >> shamt,
        RegReg::Sra => ((src1_val as i32) >> shamt) as u32,
        RegReg::Or => src1_val | src2_val,
        RegReg::And => src1_val & src2_val,
        RegReg::Mul => src1_val.wrapping_mul(src2_val),
        RegReg::Mulh => {
            let product = i64::from(src1_val as i32) * i64::from(src2_val as i32);
            (product >> 32) as u32
        }
        RegReg::Mulhsu => {
            let product = i64::from(src1_val as i32) * i64::from(src2_val);
            (product >> 32) as u32
        }
        RegReg::Mulhu => {
            let product = u64::from(src1_val) * u64::from(src2_val);
            (product >> 32) as u32
        }
        RegReg::Div => {
            if src2_val == 0 {
                0xffff_ffff
            } else {
                (src1_val as i32).wrapping_div(src2_val as i32) as u32
            }
        }
        RegReg::Divu => {
            if src2_val == 0 {
                0xffff_ffff
            } else {
                src1_val / src2_val
            }
        }
        RegReg::Rem => {
            if src2_val == 0 {
                src1_val
            } else {
                (src1_val as i32).wrapping_rem(src2_val as i32) as u32
            }
        }
        RegReg::Remu => {
            if src2_val == 0 {
                src1_val
            } else {
                src1_val % src2_val
            }
        }
    };
    hart.registers.write(dest, result);
    TraceKind::RegReg {
        mnemonic,
        dest,
        src1,
        src2,
        src1_val,
        src2_val,
        result,
    }
}

impl Hart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch, decode and execute the instruction at the current pc
    ///
    /// Instruction fetch uses the same little-endian word read as data
    /// loads. The program counter is advanced to pc + 4 before
    /// execution; branches and jumps overwrite it.
    pub fn step(&mut self) -> Result<StepOutcome, ExecutionError> {
        let current_pc = self.pc;
        let word = self.memory.read(current_pc, Wordsize::Word)?;
        self.pc = current_pc.wrapping_add(4);

        let Ok(instr) = Instr::try_from(word) else {
            // Unknown opcode or funct: no architectural effect, the
            // trace records the raw word
            return Ok(StepOutcome {
                record: Some(TraceRecord {
                    pc: current_pc,
                    kind: TraceKind::Unknown { word },
                }),
                halt: false,
            });
        };

        let mut halt = false;
        let kind = match instr {
            Instr::Lui { dest, u_immediate } => Some(execute_lui(self, dest, u_immediate)),
            Instr::Auipc { dest, u_immediate } => {
                Some(execute_auipc(self, current_pc, dest, u_immediate))
            }
            Instr::Jal { dest, offset } => Some(execute_jal(self, current_pc, dest, offset)),
            Instr::Jalr { dest, base, offset } => {
                Some(execute_jalr(self, current_pc, dest, base, offset))
            }
            Instr::Branch {
                mnemonic,
                src1,
                src2,
                offset,
            } => Some(execute_branch(
                self, current_pc, mnemonic, src1, src2, offset,
            )),
            Instr::Load {
                mnemonic,
                dest,
                base,
                offset,
            } => Some(execute_load(self, mnemonic, dest, base, offset)?),
            Instr::Store {
                mnemonic,
                src,
                base,
                offset,
            } => Some(execute_store(self, mnemonic, src, base, offset)?),
            Instr::RegImm {
                mnemonic,
                dest,
                src,
                imm,
            } => Some(execute_reg_imm(self, mnemonic, dest, src, imm)),
            Instr::RegReg {
                mnemonic,
                dest,
                src1,
                src2,
            } => Some(execute_reg_reg(self, mnemonic, dest, src1, src2)),
            Instr::Ebreak => {
                halt = true;
                Some(TraceKind::Ebreak)
            }
            // Remaining System encodings (ecall, csr ops) are inert
            // and produce no trace line
            Instr::System => None,
        };

        Ok(StepOutcome {
            record: kind.map(|kind| TraceRecord {
                pc: current_pc,
                kind,
            }),
            halt,
        })
    }
}
