use crate::error::Result;

/// A component that owns one fixed, inclusive slice of the CPU address space.
///
/// The bus only forwards addresses inside `memory_start()..=memory_end()`,
/// so implementations may index without further checks.
pub trait MemoryOwner {
    fn name(&self) -> &'static str;
    fn memory_start(&self) -> u16;
    fn memory_end(&self) -> u16;
    fn get(&self, address: u16) -> u8;
    fn set(&mut self, address: u16, value: u8) -> Result<()>;

    /// Two-byte read of `address` and `address - 1`. The byte at the lower
    /// address is the low byte, which is how a pushed word sits on the stack
    /// with `address` pointing at its high byte.
    fn get_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.get(address.wrapping_sub(1)), self.get(address)])
    }

    /// Inverse of `get_word`: high byte at `address`, low byte below it.
    fn set_word(&mut self, address: u16, value: u16) -> Result<()> {
        let [lo, hi] = value.to_le_bytes();
        self.set(address, hi)?;
        self.set(address.wrapping_sub(1), lo)
    }

    fn contains(&self, address: u16) -> bool {
        (self.memory_start()..=self.memory_end()).contains(&address)
    }
}

/// 2 KiB internal RAM at $0000-$1FFF, mirrored every $0800.
pub struct Ram {
    pub(crate) ram: [u8; 0x800],
}

impl Ram {
    pub const START: u16 = 0x0000;
    pub const END: u16 = 0x1FFF;
    pub const SIZE: usize = 0x800;

    pub fn new() -> Self {
        Ram { ram: [0; 0x800] }
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOwner for Ram {
    fn name(&self) -> &'static str {
        "RAM"
    }

    fn memory_start(&self) -> u16 {
        Self::START
    }

    fn memory_end(&self) -> u16 {
        Self::END
    }

    fn get(&self, address: u16) -> u8 {
        self.ram[(address & 0x7FF) as usize]
    }

    fn set(&mut self, address: u16, value: u8) -> Result<()> {
        self.ram[(address & 0x7FF) as usize] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_is_mirrored_every_2k() {
        let mut ram = Ram::new();
        ram.set(0x0012, 0xAB).unwrap();
        assert_eq!(ram.get(0x0812), 0xAB);
        assert_eq!(ram.get(0x1012), 0xAB);
        assert_eq!(ram.get(0x1812), 0xAB);

        ram.set(0x1FFF, 0x42).unwrap();
        assert_eq!(ram.get(0x07FF), 0x42);
    }

    #[test]
    fn word_access_matches_stack_layout() {
        let mut ram = Ram::new();
        // What JSR leaves behind with SP=$FD: high byte at $01FD, low at $01FC.
        ram.set(0x01FD, 0xC1).unwrap();
        ram.set(0x01FC, 0x23).unwrap();
        assert_eq!(ram.get_word(0x01FD), 0xC123);

        ram.set_word(0x01FB, 0x8004).unwrap();
        assert_eq!(ram.get(0x01FB), 0x80);
        assert_eq!(ram.get(0x01FA), 0x04);
        assert_eq!(ram.get_word(0x09FB), 0x8004);
    }

    #[test]
    fn ram_covers_its_range_only() {
        let ram = Ram::new();
        assert!(ram.contains(0x0000));
        assert!(ram.contains(0x1FFF));
        assert!(!ram.contains(0x2000));
    }
}
