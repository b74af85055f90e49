pub mod addressing;
pub mod instructions;
pub mod operation;
pub mod status;


use crate::error::{CpuError, Result};
use crate::savestate::CpuSnapshot;

use self::instructions::{Instruction, InstructionSet};
use self::operation::Register;
pub use self::status::Status;

const STACK_BASE: u16 = 0x0100;
const RESET_VECTOR: u16 = 0xFFFC;
const NESTEST_ENTRY: u16 = 0xC000;

/// Memory as the CPU sees it. Every access can fail: an address nobody owns
/// or a write to ROM stops emulation.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> Result<u8>;
    fn write(&mut self, addr: u16, data: u8) -> Result<()>;

    /// Little-endian word at `addr`, `addr + 1`.
    fn read_word(&mut self, addr: u16) -> Result<u16> {
        let lo = self.read(addr)?;
        let hi = self.read(addr.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }
}

/// An instruction that has been fetched but not yet executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// Address of the opcode byte.
    pub pc: u16,
    pub instruction: Instruction,
    operand: [u8; 2],
}

impl Decoded {
    pub fn operand_bytes(&self) -> &[u8] {
        &self.operand[..self.instruction.mode.operand_len() as usize]
    }

    /// Assembler form, e.g. `JMP $C5F5`.
    pub fn describe(&self) -> String {
        let next_pc = self.pc.wrapping_add(self.instruction.len());
        let operand = self.instruction.mode.describe(self.operand, next_pc);
        if operand.is_empty() {
            self.instruction.mnemonic.to_string()
        } else {
            format!("{} {}", self.instruction.mnemonic, operand)
        }
    }
}

pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: Status,
    instructions: InstructionSet,
    decoded: Option<Decoded>,
}

impl Cpu {
    pub fn new() -> Result<Self> {
        Ok(Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::default(),
            instructions: InstructionSet::standard()?,
            decoded: None,
        })
    }

    /// Power-on register state with PC loaded from the reset vector.
    pub fn reset(&mut self, bus: &mut dyn CpuBus) -> Result<()> {
        let pc = bus.read_word(RESET_VECTOR)?;
        self.reset_to(pc);
        Ok(())
    }

    pub fn reset_to(&mut self, pc: u16) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = Status::default();
        self.pc = pc;
        self.decoded = None;
    }

    /// Automated-mode entry point of nestest: $C000 with P=$24.
    pub fn nestest_start(&mut self) {
        self.reset_to(NESTEST_ENTRY);
        self.status = Status::from_int(0x24);
    }

    /// Reads the opcode at PC and its operand bytes. No register changes;
    /// an unknown opcode leaves the CPU exactly as it was.
    pub fn identify(&mut self, bus: &mut dyn CpuBus) -> Result<&Decoded> {
        self.decoded = None;
        let decoded = self.decode(bus)?;
        Ok(&*self.decoded.insert(decoded))
    }

    /// Runs the decoded instruction (decoding first if nothing is pending).
    ///
    /// PC moves past the instruction before the operation runs, so jumps and
    /// branches see the address of the next instruction.
    pub fn execute(&mut self, bus: &mut dyn CpuBus) -> Result<()> {
        let decoded = match self.decoded.take() {
            Some(decoded) => decoded,
            None => self.decode(bus)?,
        };
        let instruction = decoded.instruction;

        self.pc = decoded.pc.wrapping_add(instruction.len());
        let operand = instruction.mode.resolve(self, bus, decoded.operand)?;
        if let Some(result) = instruction.operation.apply(self, bus, operand)? {
            self.status.update_zero_negative(instruction.flags, result);
        }
        Ok(())
    }

    pub fn step(&mut self, bus: &mut dyn CpuBus) -> Result<()> {
        self.identify(bus)?;
        self.execute(bus)
    }

    /// The instruction waiting between `identify` and `execute`.
    #[allow(dead_code)]
    pub fn decoded(&self) -> Option<&Decoded> {
        self.decoded.as_ref()
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.pc,
            sp: self.sp,
            a: self.a,
            x: self.x,
            y: self.y,
            p: self.status.to_int(),
        }
    }

    pub fn restore(&mut self, snapshot: &CpuSnapshot) {
        self.pc = snapshot.pc;
        self.sp = snapshot.sp;
        self.a = snapshot.a;
        self.x = snapshot.x;
        self.y = snapshot.y;
        self.status = Status::from_int(snapshot.p);
        self.decoded = None;
    }

    fn decode(&self, bus: &mut dyn CpuBus) -> Result<Decoded> {
        let pc = self.pc;
        let opcode = bus.read(pc)?;
        let instruction = *self
            .instructions
            .get(opcode)
            .ok_or(CpuError::UnknownOpcode { opcode, pc })?;

        let mut operand = [0u8; 2];
        let len = instruction.mode.operand_len() as usize;
        for (offset, byte) in operand.iter_mut().take(len).enumerate() {
            *byte = bus.read(pc.wrapping_add(1 + offset as u16))?;
        }
        Ok(Decoded {
            pc,
            instruction,
            operand,
        })
    }

    pub(crate) fn register(&self, register: Register) -> u8 {
        match register {
            Register::A => self.a,
            Register::X => self.x,
            Register::Y => self.y,
            Register::Sp => self.sp,
        }
    }

    pub(crate) fn set_register(&mut self, register: Register, value: u8) {
        match register {
            Register::A => self.a = value,
            Register::X => self.x = value,
            Register::Y => self.y = value,
            Register::Sp => self.sp = value,
        }
    }

    pub(crate) fn push(&mut self, bus: &mut dyn CpuBus, value: u8) -> Result<()> {
        bus.write(STACK_BASE | self.sp as u16, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    pub(crate) fn pull(&mut self, bus: &mut dyn CpuBus) -> Result<u8> {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | self.sp as u16)
    }

    /// High byte first, so it ends up at the higher stack address.
    pub(crate) fn push_word(&mut self, bus: &mut dyn CpuBus, value: u16) -> Result<()> {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi)?;
        self.push(bus, lo)
    }

    pub(crate) fn pull_word(&mut self, bus: &mut dyn CpuBus) -> Result<u16> {
        let lo = self.pull(bus)?;
        let hi = self.pull(bus)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }
}
