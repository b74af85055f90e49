use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cpu::{Cpu, CpuBus};
use crate::error::Result;
use crate::memory::Ram;

/// Programmer-visible CPU registers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SaveState {
    pub version: u32,
    pub timestamp: u64,
    pub cpu: CpuSnapshot,
    /// The 2 KiB of internal RAM, unmirrored.
    pub ram: Vec<u8>,
    pub steps: u64,
    pub rom_checksum: u32,
}

impl SaveState {
    pub const CURRENT_VERSION: u32 = 1;

    /// Captures registers and RAM through the bus.
    pub fn capture(cpu: &Cpu, bus: &mut dyn CpuBus, steps: u64, rom_checksum: u32) -> Result<Self> {
        let mut ram = Vec::with_capacity(Ram::SIZE);
        for addr in 0..Ram::SIZE as u16 {
            ram.push(bus.read(addr)?);
        }
        Ok(SaveState {
            version: Self::CURRENT_VERSION,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            cpu: cpu.snapshot(),
            ram,
            steps,
            rom_checksum,
        })
    }

    /// Restores registers and RAM. Returns the saved step count.
    pub fn apply(&self, cpu: &mut Cpu, bus: &mut dyn CpuBus) -> Result<u64> {
        for (addr, &value) in self.ram.iter().take(Ram::SIZE).enumerate() {
            bus.write(addr as u16, value)?;
        }
        cpu.restore(&self.cpu);
        Ok(self.steps)
    }

    pub fn validate_rom_checksum(&self, current_checksum: u32) -> bool {
        self.rom_checksum == current_checksum
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = bincode::serialize(self)?;
        std::fs::write(path.as_ref(), data)?;
        log::info!("Save state written to: {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let state: SaveState = bincode::deserialize(&data)?;
        if state.version > Self::CURRENT_VERSION {
            log::warn!(
                "save state version {} is newer than {}",
                state.version,
                Self::CURRENT_VERSION
            );
        }
        log::info!("Save state loaded from: {}", path.as_ref().display());
        Ok(state)
    }
}

/// Cheap identity check for the loaded PRG ROM.
pub fn rom_checksum(prg: &[u8]) -> u32 {
    prg.iter()
        .fold(0u32, |sum, &b| sum.rotate_left(5) ^ u32::from(b))
}
