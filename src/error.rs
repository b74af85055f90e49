use std::fmt;

use crate::nestest::Mismatch;

/// Errors that abort emulation. Nothing is retried.
#[derive(Debug)]
pub enum CpuError {
    /// The byte at `pc` has no registered instruction.
    UnknownOpcode { opcode: u8, pc: u16 },
    /// Two descriptors claimed the same opcode while building the table.
    DuplicateOpcode(u8),
    /// No memory owner covers the address.
    UnmappedAddress(u16),
    /// A write hit read-only memory (PRG ROM).
    ReadOnlyWrite { address: u16, value: u8 },
    /// A memory owner was attached over a range another owner already covers.
    OverlappingRegion {
        name: &'static str,
        start: u16,
        end: u16,
    },
    /// An operation that needs an address or a value got an implied operand.
    /// Carries which kind was missing ("address" or "value").
    MissingOperand(&'static str),
    /// CPU state diverged from the reference trace.
    ConformanceMismatch(Box<Mismatch>),
    InvalidRom(String),
    InvalidTrace { line: usize, reason: String },
    /// A save state and a reference log both tried to set the start state.
    StateWithTrace,
    Io(std::io::Error),
    SaveState(bincode::Error),
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CpuError::UnknownOpcode { opcode, pc } => {
                write!(f, "instruction not found: opcode 0x{:02X} at 0x{:04X}", opcode, pc)
            }
            CpuError::DuplicateOpcode(opcode) => {
                write!(f, "opcode 0x{:02X} registered more than once", opcode)
            }
            CpuError::UnmappedAddress(address) => {
                write!(f, "no memory owner for address 0x{:04X}", address)
            }
            CpuError::ReadOnlyWrite { address, value } => write!(
                f,
                "write of 0x{:02X} to read-only address 0x{:04X}",
                value, address
            ),
            CpuError::OverlappingRegion { name, start, end } => write!(
                f,
                "{} range 0x{:04X}-0x{:04X} overlaps an attached owner",
                name, start, end
            ),
            CpuError::MissingOperand(kind) => {
                write!(f, "instruction needs an {} operand but has none", kind)
            }
            CpuError::ConformanceMismatch(mismatch) => write!(f, "{}", mismatch),
            CpuError::InvalidRom(reason) => write!(f, "invalid ROM: {}", reason),
            CpuError::InvalidTrace { line, reason } => {
                write!(f, "invalid trace line {}: {}", line, reason)
            }
            CpuError::StateWithTrace => {
                write!(f, "a save state cannot be loaded while a reference log is attached")
            }
            CpuError::Io(err) => write!(f, "I/O error: {}", err),
            CpuError::SaveState(err) => write!(f, "save state error: {}", err),
        }
    }
}

impl std::error::Error for CpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CpuError::Io(err) => Some(err),
            CpuError::SaveState(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CpuError {
    fn from(err: std::io::Error) -> Self {
        CpuError::Io(err)
    }
}

impl From<bincode::Error> for CpuError {
    fn from(err: bincode::Error) -> Self {
        CpuError::SaveState(err)
    }
}

pub type Result<T> = std::result::Result<T, CpuError>;
