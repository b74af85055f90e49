//! Opcode table.
//!
//! Every official 6502 opcode is listed once below as (opcode, addressing
//! mode) pairs grouped under the operation they share. The table is built
//! once when the CPU is created; a second registration for an opcode is an
//! error rather than a silent overwrite.

use super::addressing::AddressingMode::{self, *};
use super::operation::{Operation, Register};
use super::status::Status;
use crate::error::{CpuError, Result};

/// Immutable description of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    pub operation: Operation,
    /// Subset of N, Z, C, V this instruction may change.
    pub flags: Status,
}

impl Instruction {
    /// Opcode byte plus operand bytes.
    pub fn len(&self) -> u16 {
        1 + self.mode.operand_len()
    }
}

pub struct InstructionSet {
    table: [Option<Instruction>; 256],
}

impl InstructionSet {
    /// The official NMOS 6502 instruction set.
    pub fn standard() -> Result<Self> {
        Self::from_instructions(standard_instructions())
    }

    pub fn from_instructions<I>(instructions: I) -> Result<Self>
    where
        I: IntoIterator<Item = Instruction>,
    {
        let mut table = [None; 256];
        for instruction in instructions {
            let slot = &mut table[instruction.opcode as usize];
            if slot.is_some() {
                return Err(CpuError::DuplicateOpcode(instruction.opcode));
            }
            *slot = Some(instruction);
        }
        Ok(InstructionSet { table })
    }

    pub fn get(&self, opcode: u8) -> Option<&Instruction> {
        self.table[opcode as usize].as_ref()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.table.iter().flatten().count()
    }
}

struct Registry {
    instructions: Vec<Instruction>,
}

impl Registry {
    fn add(
        &mut self,
        mnemonic: &'static str,
        operation: Operation,
        flags: Status,
        encodings: &[(u8, AddressingMode)],
    ) {
        for &(opcode, mode) in encodings {
            self.instructions.push(Instruction {
                opcode,
                mnemonic,
                mode,
                operation,
                flags,
            });
        }
    }
}

fn standard_instructions() -> Vec<Instruction> {
    use Operation as Op;
    use Register::{Sp, A, X, Y};

    let none = Status::empty();
    let mut r = Registry {
        instructions: Vec::with_capacity(151),
    };

    // Loads and stores
    r.add("LDA", Op::Load(A), Status::NZ, &[
        (0xA9, Immediate), (0xA5, ZeroPage), (0xB5, ZeroPageX), (0xAD, Absolute),
        (0xBD, AbsoluteX), (0xB9, AbsoluteY), (0xA1, IndexedIndirect), (0xB1, IndirectIndexed),
    ]);
    r.add("LDX", Op::Load(X), Status::NZ, &[
        (0xA2, Immediate), (0xA6, ZeroPage), (0xB6, ZeroPageY), (0xAE, Absolute),
        (0xBE, AbsoluteY),
    ]);
    r.add("LDY", Op::Load(Y), Status::NZ, &[
        (0xA0, Immediate), (0xA4, ZeroPage), (0xB4, ZeroPageX), (0xAC, Absolute),
        (0xBC, AbsoluteX),
    ]);
    r.add("STA", Op::Store(A), none, &[
        (0x85, ZeroPage), (0x95, ZeroPageX), (0x8D, Absolute), (0x9D, AbsoluteX),
        (0x99, AbsoluteY), (0x81, IndexedIndirect), (0x91, IndirectIndexed),
    ]);
    r.add("STX", Op::Store(X), none, &[(0x86, ZeroPage), (0x96, ZeroPageY), (0x8E, Absolute)]);
    r.add("STY", Op::Store(Y), none, &[(0x84, ZeroPage), (0x94, ZeroPageX), (0x8C, Absolute)]);

    // Register transfers
    r.add("TAX", Op::Transfer { from: A, to: X }, Status::NZ, &[(0xAA, Implicit)]);
    r.add("TAY", Op::Transfer { from: A, to: Y }, Status::NZ, &[(0xA8, Implicit)]);
    r.add("TXA", Op::Transfer { from: X, to: A }, Status::NZ, &[(0x8A, Implicit)]);
    r.add("TYA", Op::Transfer { from: Y, to: A }, Status::NZ, &[(0x98, Implicit)]);
    r.add("TSX", Op::Transfer { from: Sp, to: X }, Status::NZ, &[(0xBA, Implicit)]);
    r.add("TXS", Op::Transfer { from: X, to: Sp }, none, &[(0x9A, Implicit)]);

    // Logic and arithmetic
    r.add("AND", Op::And, Status::NZ, &[
        (0x29, Immediate), (0x25, ZeroPage), (0x35, ZeroPageX), (0x2D, Absolute),
        (0x3D, AbsoluteX), (0x39, AbsoluteY), (0x21, IndexedIndirect), (0x31, IndirectIndexed),
    ]);
    r.add("ORA", Op::Ora, Status::NZ, &[
        (0x09, Immediate), (0x05, ZeroPage), (0x15, ZeroPageX), (0x0D, Absolute),
        (0x1D, AbsoluteX), (0x19, AbsoluteY), (0x01, IndexedIndirect), (0x11, IndirectIndexed),
    ]);
    r.add("EOR", Op::Eor, Status::NZ, &[
        (0x49, Immediate), (0x45, ZeroPage), (0x55, ZeroPageX), (0x4D, Absolute),
        (0x5D, AbsoluteX), (0x59, AbsoluteY), (0x41, IndexedIndirect), (0x51, IndirectIndexed),
    ]);
    r.add("ADC", Op::Adc, Status::NZCV, &[
        (0x69, Immediate), (0x65, ZeroPage), (0x75, ZeroPageX), (0x6D, Absolute),
        (0x7D, AbsoluteX), (0x79, AbsoluteY), (0x61, IndexedIndirect), (0x71, IndirectIndexed),
    ]);
    r.add("SBC", Op::Sbc, Status::NZCV, &[
        (0xE9, Immediate), (0xE5, ZeroPage), (0xF5, ZeroPageX), (0xED, Absolute),
        (0xFD, AbsoluteX), (0xF9, AbsoluteY), (0xE1, IndexedIndirect), (0xF1, IndirectIndexed),
    ]);
    r.add("CMP", Op::Compare(A), Status::NZC, &[
        (0xC9, Immediate), (0xC5, ZeroPage), (0xD5, ZeroPageX), (0xCD, Absolute),
        (0xDD, AbsoluteX), (0xD9, AbsoluteY), (0xC1, IndexedIndirect), (0xD1, IndirectIndexed),
    ]);
    r.add("CPX", Op::Compare(X), Status::NZC, &[(0xE0, Immediate), (0xE4, ZeroPage), (0xEC, Absolute)]);
    r.add("CPY", Op::Compare(Y), Status::NZC, &[(0xC0, Immediate), (0xC4, ZeroPage), (0xCC, Absolute)]);
    r.add("BIT", Op::Bit, Status::NZV, &[(0x24, ZeroPage), (0x2C, Absolute)]);

    // Increments, decrements, shifts
    r.add("INC", Op::Increment, Status::NZ, &[
        (0xE6, ZeroPage), (0xF6, ZeroPageX), (0xEE, Absolute), (0xFE, AbsoluteX),
    ]);
    r.add("DEC", Op::Decrement, Status::NZ, &[
        (0xC6, ZeroPage), (0xD6, ZeroPageX), (0xCE, Absolute), (0xDE, AbsoluteX),
    ]);
    r.add("INX", Op::IncrementRegister(X), Status::NZ, &[(0xE8, Implicit)]);
    r.add("INY", Op::IncrementRegister(Y), Status::NZ, &[(0xC8, Implicit)]);
    r.add("DEX", Op::DecrementRegister(X), Status::NZ, &[(0xCA, Implicit)]);
    r.add("DEY", Op::DecrementRegister(Y), Status::NZ, &[(0x88, Implicit)]);
    r.add("ASL", Op::ShiftLeft, Status::NZC, &[
        (0x0A, Accumulator), (0x06, ZeroPage), (0x16, ZeroPageX), (0x0E, Absolute), (0x1E, AbsoluteX),
    ]);
    r.add("LSR", Op::ShiftRight, Status::NZC, &[
        (0x4A, Accumulator), (0x46, ZeroPage), (0x56, ZeroPageX), (0x4E, Absolute), (0x5E, AbsoluteX),
    ]);
    r.add("ROL", Op::RotateLeft, Status::NZC, &[
        (0x2A, Accumulator), (0x26, ZeroPage), (0x36, ZeroPageX), (0x2E, Absolute), (0x3E, AbsoluteX),
    ]);
    r.add("ROR", Op::RotateRight, Status::NZC, &[
        (0x6A, Accumulator), (0x66, ZeroPage), (0x76, ZeroPageX), (0x6E, Absolute), (0x7E, AbsoluteX),
    ]);

    // Stack
    r.add("PHA", Op::PushAccumulator, none, &[(0x48, Implicit)]);
    r.add("PHP", Op::PushStatus, none, &[(0x08, Implicit)]);
    r.add("PLA", Op::PullAccumulator, Status::NZ, &[(0x68, Implicit)]);
    r.add("PLP", Op::PullStatus, none, &[(0x28, Implicit)]);

    // Control flow
    r.add("JMP", Op::Jump, none, &[(0x4C, Absolute), (0x6C, Indirect)]);
    r.add("JSR", Op::JumpSubroutine, none, &[(0x20, Absolute)]);
    r.add("RTS", Op::ReturnFromSubroutine, none, &[(0x60, Implicit)]);
    r.add("RTI", Op::ReturnFromInterrupt, none, &[(0x40, Implicit)]);
    r.add("BRK", Op::Break, none, &[(0x00, Implicit)]);

    let branches = [
        ("BCC", 0x90, Status::CARRY, false),
        ("BCS", 0xB0, Status::CARRY, true),
        ("BNE", 0xD0, Status::ZERO, false),
        ("BEQ", 0xF0, Status::ZERO, true),
        ("BPL", 0x10, Status::NEGATIVE, false),
        ("BMI", 0x30, Status::NEGATIVE, true),
        ("BVC", 0x50, Status::OVERFLOW, false),
        ("BVS", 0x70, Status::OVERFLOW, true),
    ];
    for (mnemonic, opcode, flag, set) in branches {
        r.add(mnemonic, Op::Branch { flag, set }, none, &[(opcode, Relative)]);
    }

    // Flag set/clear
    r.add("SEC", Op::SetFlag(Status::CARRY), none, &[(0x38, Implicit)]);
    r.add("SEI", Op::SetFlag(Status::INTERRUPT), none, &[(0x78, Implicit)]);
    r.add("SED", Op::SetFlag(Status::DECIMAL), none, &[(0xF8, Implicit)]);
    r.add("CLC", Op::ClearFlag(Status::CARRY), none, &[(0x18, Implicit)]);
    r.add("CLI", Op::ClearFlag(Status::INTERRUPT), none, &[(0x58, Implicit)]);
    r.add("CLD", Op::ClearFlag(Status::DECIMAL), none, &[(0xD8, Implicit)]);
    r.add("CLV", Op::ClearFlag(Status::OVERFLOW), none, &[(0xB8, Implicit)]);

    r.add("NOP", Op::Nop, none, &[(0xEA, Implicit)]);

    r.instructions
}
