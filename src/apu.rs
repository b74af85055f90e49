use crate::error::Result;
use crate::memory::MemoryOwner;

/// APU and I/O registers at $4000-$401F, stored as plain bytes.
pub struct Apu {
    registers: [u8; 0x20],
}

impl Apu {
    pub const START: u16 = 0x4000;
    pub const END: u16 = 0x401F;

    pub fn new() -> Self {
        Apu {
            registers: [0; 0x20],
        }
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOwner for Apu {
    fn name(&self) -> &'static str {
        "APU"
    }

    fn memory_start(&self) -> u16 {
        Self::START
    }

    fn memory_end(&self) -> u16 {
        Self::END
    }

    fn get(&self, address: u16) -> u8 {
        self.registers[(address - Self::START) as usize]
    }

    fn set(&mut self, address: u16, value: u8) -> Result<()> {
        self.registers[(address - Self::START) as usize] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_cover_4000_to_401f() {
        let mut apu = Apu::new();
        apu.set(0x4000, 0x3F).unwrap();
        apu.set(0x401F, 0xA5).unwrap();
        assert_eq!(apu.get(0x4000), 0x3F);
        assert_eq!(apu.get(0x401F), 0xA5);
        assert_eq!(apu.get(0x4001), 0x00);

        assert!(apu.contains(0x4000));
        assert!(apu.contains(0x401F));
        assert!(!apu.contains(0x4020));
        assert!(!apu.contains(0x3FFF));
    }
}
