//! Instruction semantics, independent of how the operand was addressed.
//!
//! `apply` returns the value the generic zero/negative update should look at
//! (when the descriptor declares those flags). Carry and overflow are set here
//! directly because each instruction computes them differently.

use super::addressing::Operand;
use super::status::Status;
use super::{Cpu, CpuBus};
use crate::error::Result;

/// IRQ/BRK vector.
const BRK_VECTOR: u16 = 0xFFFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    A,
    X,
    Y,
    Sp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load(Register),
    Store(Register),
    Transfer { from: Register, to: Register },
    And,
    Ora,
    Eor,
    Adc,
    Sbc,
    Compare(Register),
    Bit,
    /// INC on memory.
    Increment,
    /// DEC on memory.
    Decrement,
    IncrementRegister(Register),
    DecrementRegister(Register),
    ShiftLeft,
    ShiftRight,
    RotateLeft,
    RotateRight,
    PushAccumulator,
    PushStatus,
    PullAccumulator,
    PullStatus,
    Jump,
    JumpSubroutine,
    ReturnFromSubroutine,
    ReturnFromInterrupt,
    Break,
    /// Taken when `flag` is currently `set`.
    Branch { flag: Status, set: bool },
    SetFlag(Status),
    ClearFlag(Status),
    Nop,
}

impl Operation {
    pub fn apply(self, cpu: &mut Cpu, bus: &mut dyn CpuBus, operand: Operand) -> Result<Option<u8>> {
        let result = match self {
            Operation::Load(register) => {
                let value = operand.value(bus)?;
                cpu.set_register(register, value);
                Some(value)
            }
            Operation::Store(register) => {
                bus.write(operand.address()?, cpu.register(register))?;
                None
            }
            Operation::Transfer { from, to } => {
                let value = cpu.register(from);
                cpu.set_register(to, value);
                Some(value)
            }
            Operation::And => {
                cpu.a &= operand.value(bus)?;
                Some(cpu.a)
            }
            Operation::Ora => {
                cpu.a |= operand.value(bus)?;
                Some(cpu.a)
            }
            Operation::Eor => {
                cpu.a ^= operand.value(bus)?;
                Some(cpu.a)
            }
            Operation::Adc => {
                let value = operand.value(bus)?;
                add_with_carry(cpu, value);
                Some(cpu.a)
            }
            // Subtract with borrow is an add of the one's complement.
            Operation::Sbc => {
                let value = operand.value(bus)?;
                add_with_carry(cpu, value ^ 0xFF);
                Some(cpu.a)
            }
            Operation::Compare(register) => {
                let lhs = cpu.register(register);
                let value = operand.value(bus)?;
                cpu.status.set(Status::CARRY, lhs >= value);
                Some(lhs.wrapping_sub(value))
            }
            Operation::Bit => {
                let value = operand.value(bus)?;
                cpu.status.set(Status::ZERO, cpu.a & value == 0);
                cpu.status.set(Status::OVERFLOW, value & 0x40 != 0);
                cpu.status.set(Status::NEGATIVE, value & 0x80 != 0);
                None
            }
            Operation::Increment => {
                let value = operand.value(bus)?.wrapping_add(1);
                Some(write_back(cpu, bus, operand, value)?)
            }
            Operation::Decrement => {
                let value = operand.value(bus)?.wrapping_sub(1);
                Some(write_back(cpu, bus, operand, value)?)
            }
            Operation::IncrementRegister(register) => {
                let value = cpu.register(register).wrapping_add(1);
                cpu.set_register(register, value);
                Some(value)
            }
            Operation::DecrementRegister(register) => {
                let value = cpu.register(register).wrapping_sub(1);
                cpu.set_register(register, value);
                Some(value)
            }
            Operation::ShiftLeft => {
                let value = operand.value(bus)?;
                cpu.status.set(Status::CARRY, value & 0x80 != 0);
                Some(write_back(cpu, bus, operand, value << 1)?)
            }
            Operation::ShiftRight => {
                let value = operand.value(bus)?;
                cpu.status.set(Status::CARRY, value & 0x01 != 0);
                Some(write_back(cpu, bus, operand, value >> 1)?)
            }
            Operation::RotateLeft => {
                let value = operand.value(bus)?;
                let carry_in = cpu.status.contains(Status::CARRY) as u8;
                cpu.status.set(Status::CARRY, value & 0x80 != 0);
                Some(write_back(cpu, bus, operand, (value << 1) | carry_in)?)
            }
            Operation::RotateRight => {
                let value = operand.value(bus)?;
                let carry_in = cpu.status.contains(Status::CARRY) as u8;
                cpu.status.set(Status::CARRY, value & 0x01 != 0);
                Some(write_back(cpu, bus, operand, (value >> 1) | (carry_in << 7))?)
            }
            Operation::PushAccumulator => {
                cpu.push(bus, cpu.a)?;
                None
            }
            Operation::PushStatus => {
                cpu.push(bus, cpu.status.pushed())?;
                None
            }
            Operation::PullAccumulator => {
                cpu.a = cpu.pull(bus)?;
                Some(cpu.a)
            }
            Operation::PullStatus => {
                let value = cpu.pull(bus)?;
                cpu.status.load_int(value, Status::STACK_ONLY);
                None
            }
            Operation::Jump => {
                cpu.pc = operand.address()?;
                None
            }
            // The pushed address is the last byte of the JSR itself; RTS adds one.
            Operation::JumpSubroutine => {
                let target = operand.address()?;
                cpu.push_word(bus, cpu.pc.wrapping_sub(1))?;
                cpu.pc = target;
                None
            }
            Operation::ReturnFromSubroutine => {
                cpu.pc = cpu.pull_word(bus)?.wrapping_add(1);
                None
            }
            Operation::ReturnFromInterrupt => {
                let value = cpu.pull(bus)?;
                cpu.status.load_int(value, Status::STACK_ONLY);
                cpu.pc = cpu.pull_word(bus)?;
                None
            }
            // BRK skips a padding byte, so the return address is one past PC.
            Operation::Break => {
                cpu.push_word(bus, cpu.pc.wrapping_add(1))?;
                cpu.push(bus, cpu.status.pushed())?;
                cpu.status.insert(Status::INTERRUPT);
                cpu.pc = bus.read_word(BRK_VECTOR)?;
                None
            }
            Operation::Branch { flag, set } => {
                let target = operand.address()?;
                if cpu.status.contains(flag) == set {
                    cpu.pc = target;
                }
                None
            }
            Operation::SetFlag(flag) => {
                cpu.status.insert(flag);
                None
            }
            Operation::ClearFlag(flag) => {
                cpu.status.remove(flag);
                None
            }
            Operation::Nop => None,
        };
        Ok(result)
    }
}

/// Binary ADC; the 2A03 has no decimal mode.
fn add_with_carry(cpu: &mut Cpu, value: u8) {
    let carry = cpu.status.contains(Status::CARRY) as u16;
    let sum = cpu.a as u16 + value as u16 + carry;
    let result = sum as u8;

    cpu.status.set(Status::CARRY, sum > 0xFF);
    cpu.status.set(
        Status::OVERFLOW,
        (cpu.a ^ result) & (value ^ result) & 0x80 != 0,
    );
    cpu.a = result;
}

/// Stores a read-modify-write result to A or memory, depending on the mode.
fn write_back(cpu: &mut Cpu, bus: &mut dyn CpuBus, operand: Operand, value: u8) -> Result<u8> {
    match operand {
        Operand::Accumulator(_) => cpu.a = value,
        _ => bus.write(operand.address()?, value)?,
    }
    Ok(value)
}
