//! Addressing modes: turn the operand bytes of an instruction plus the
//! register file into the thing the operation works on.
//!
//! All index arithmetic wraps: zero page modes stay inside page zero, the
//! absolute modes wrap around the 64 KiB space. The one deliberate oddity is
//! `JMP ($xxFF)`, which reads its high byte from the start of the same page.

use super::{Cpu, CpuBus};
use crate::error::{CpuError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Relative,
    Indirect,
    /// `(zp,X)`
    IndexedIndirect,
    /// `(zp),Y`
    IndirectIndexed,
}

/// What an addressing mode resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Implied,
    /// Current accumulator value; results are written back to A.
    Accumulator(u8),
    Immediate(u8),
    /// Effective address (or branch/jump target).
    Address(u16),
}

impl Operand {
    /// The byte the operation consumes, reading memory for address operands.
    pub fn value(self, bus: &mut dyn CpuBus) -> Result<u8> {
        match self {
            Operand::Accumulator(value) | Operand::Immediate(value) => Ok(value),
            Operand::Address(address) => bus.read(address),
            Operand::Implied => Err(CpuError::MissingOperand("value")),
        }
    }

    pub fn address(self) -> Result<u16> {
        match self {
            Operand::Address(address) => Ok(address),
            _ => Err(CpuError::MissingOperand("address")),
        }
    }
}

impl AddressingMode {
    /// Number of bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Implicit | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::Relative
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }

    /// Resolves the operand. `cpu.pc` must already point past the instruction
    /// so that relative branches offset from the next instruction.
    pub fn resolve(self, cpu: &Cpu, bus: &mut dyn CpuBus, bytes: [u8; 2]) -> Result<Operand> {
        let zp = bytes[0];
        let word = u16::from_le_bytes(bytes);

        let operand = match self {
            AddressingMode::Implicit => Operand::Implied,
            AddressingMode::Accumulator => Operand::Accumulator(cpu.a),
            AddressingMode::Immediate => Operand::Immediate(zp),
            AddressingMode::ZeroPage => Operand::Address(zp as u16),
            AddressingMode::ZeroPageX => Operand::Address(zp.wrapping_add(cpu.x) as u16),
            AddressingMode::ZeroPageY => Operand::Address(zp.wrapping_add(cpu.y) as u16),
            AddressingMode::Absolute => Operand::Address(word),
            AddressingMode::AbsoluteX => Operand::Address(word.wrapping_add(cpu.x as u16)),
            AddressingMode::AbsoluteY => Operand::Address(word.wrapping_add(cpu.y as u16)),
            AddressingMode::Relative => Operand::Address(cpu.pc.wrapping_add(zp as i8 as u16)),
            AddressingMode::Indirect => Operand::Address(read_word_page_wrapped(bus, word)?),
            AddressingMode::IndexedIndirect => {
                Operand::Address(read_word_zp(bus, zp.wrapping_add(cpu.x))?)
            }
            AddressingMode::IndirectIndexed => {
                Operand::Address(read_word_zp(bus, zp)?.wrapping_add(cpu.y as u16))
            }
        };
        Ok(operand)
    }

    /// Assembler syntax for the operand, used in trace output.
    /// `next_pc` is the address of the following instruction.
    pub fn describe(self, bytes: [u8; 2], next_pc: u16) -> String {
        let zp = bytes[0];
        let word = u16::from_le_bytes(bytes);
        match self {
            AddressingMode::Implicit => String::new(),
            AddressingMode::Accumulator => "A".to_string(),
            AddressingMode::Immediate => format!("#${:02X}", zp),
            AddressingMode::ZeroPage => format!("${:02X}", zp),
            AddressingMode::ZeroPageX => format!("${:02X},X", zp),
            AddressingMode::ZeroPageY => format!("${:02X},Y", zp),
            AddressingMode::Absolute => format!("${:04X}", word),
            AddressingMode::AbsoluteX => format!("${:04X},X", word),
            AddressingMode::AbsoluteY => format!("${:04X},Y", word),
            AddressingMode::Relative => {
                format!("${:04X}", next_pc.wrapping_add(zp as i8 as u16))
            }
            AddressingMode::Indirect => format!("(${:04X})", word),
            AddressingMode::IndexedIndirect => format!("(${:02X},X)", zp),
            AddressingMode::IndirectIndexed => format!("(${:02X}),Y", zp),
        }
    }
}

/// Little-endian pointer read that never leaves page zero: the high byte of
/// a pointer at $FF comes from $00.
fn read_word_zp(bus: &mut dyn CpuBus, pointer: u8) -> Result<u16> {
    let lo = bus.read(pointer as u16)?;
    let hi = bus.read(pointer.wrapping_add(1) as u16)?;
    Ok(u16::from_le_bytes([lo, hi]))
}

/// `JMP ($xxFF)` bug: the high byte is fetched from $xx00, not the next page.
fn read_word_page_wrapped(bus: &mut dyn CpuBus, pointer: u16) -> Result<u16> {
    let lo = bus.read(pointer)?;
    let hi_addr = (pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF);
    let hi = bus.read(hi_addr)?;
    Ok(u16::from_le_bytes([lo, hi]))
}
