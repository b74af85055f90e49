use crate::error::Result;
use crate::memory::MemoryOwner;

/// PPU register file at $2000-$3FFF.
///
/// Only storage: the eight registers are mirrored every 8 bytes and reads
/// return whatever was last written. Rendering is not emulated.
pub struct Ppu {
    registers: [u8; 8],
}

impl Ppu {
    pub const START: u16 = 0x2000;
    pub const END: u16 = 0x3FFF;

    pub fn new() -> Self {
        Ppu { registers: [0; 8] }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOwner for Ppu {
    fn name(&self) -> &'static str {
        "PPU"
    }

    fn memory_start(&self) -> u16 {
        Self::START
    }

    fn memory_end(&self) -> u16 {
        Self::END
    }

    fn get(&self, address: u16) -> u8 {
        self.registers[(address & 0x0007) as usize]
    }

    fn set(&mut self, address: u16, value: u8) -> Result<()> {
        self.registers[(address & 0x0007) as usize] = value;
        Ok(())
    }
}
