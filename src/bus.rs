use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::cpu::CpuBus;
use crate::error::{CpuError, Result};
use crate::memory::{MemoryOwner, Ram};
use crate::ppu::Ppu;

/// Routes CPU accesses to whichever owner claims the address.
/// Owners are searched in attach order.
pub struct Bus {
    owners: Vec<Box<dyn MemoryOwner>>,
}

impl Bus {
    pub fn new() -> Self {
        Bus { owners: Vec::new() }
    }

    /// The standard NES layout: RAM, PPU and APU registers, cartridge ROM.
    /// $4020-$7FFF stays unmapped.
    pub fn nes(cartridge: Cartridge) -> Result<Self> {
        let mut bus = Bus::new();
        bus.attach(Box::new(Ram::new()))?;
        bus.attach(Box::new(Ppu::new()))?;
        bus.attach(Box::new(Apu::new()))?;
        bus.attach(Box::new(cartridge.into_rom()))?;
        Ok(bus)
    }

    pub fn attach(&mut self, owner: Box<dyn MemoryOwner>) -> Result<()> {
        let (start, end) = (owner.memory_start(), owner.memory_end());
        if let Some(existing) = self
            .owners
            .iter()
            .find(|o| start <= o.memory_end() && o.memory_start() <= end)
        {
            log::error!(
                "{} at ${:04X}-${:04X} collides with {}",
                owner.name(),
                start,
                end,
                existing.name()
            );
            return Err(CpuError::OverlappingRegion {
                name: owner.name(),
                start,
                end,
            });
        }
        log::debug!("attached {} at ${:04X}-${:04X}", owner.name(), start, end);
        self.owners.push(owner);
        Ok(())
    }

    /// Name of the owner mapped at `address`, if any.
    #[allow(dead_code)]
    pub fn owner_name(&self, address: u16) -> Option<&'static str> {
        self.owner(address).map(|o| o.name())
    }

    /// Reads without going through the CPU; unmapped addresses give `None`.
    #[allow(dead_code)]
    pub fn peek(&self, address: u16) -> Option<u8> {
        self.owner(address).map(|o| o.get(address))
    }

    fn owner(&self, address: u16) -> Option<&dyn MemoryOwner> {
        self.owners
            .iter()
            .find(|o| o.contains(address))
            .map(|o| o.as_ref())
    }

    fn owner_mut(&mut self, address: u16) -> Result<&mut Box<dyn MemoryOwner>> {
        self.owners
            .iter_mut()
            .find(|o| o.contains(address))
            .ok_or(CpuError::UnmappedAddress(address))
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> Result<u8> {
        self.owner(addr)
            .map(|o| o.get(addr))
            .ok_or(CpuError::UnmappedAddress(addr))
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<()> {
        self.owner_mut(addr)?.set(addr, data)
    }

    /// One two-byte owner access when a single owner covers both bytes.
    fn read_word(&mut self, addr: u16) -> Result<u16> {
        let high = addr.wrapping_add(1);
        match self.owner(addr) {
            Some(owner) if high > addr && owner.contains(high) => Ok(owner.get_word(high)),
            _ => {
                let lo = self.read(addr)?;
                let hi = self.read(high)?;
                Ok(u16::from_le_bytes([lo, hi]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Rom;
    use crate::cpu::Cpu;

    fn test_bus() -> Bus {
        let mut bus = Bus::new();
        bus.attach(Box::new(Ram::new())).unwrap();
        bus.attach(Box::new(Ppu::new())).unwrap();
        bus.attach(Box::new(Apu::new())).unwrap();
        let mut prg = vec![0u8; 0x4000];
        prg[0] = 0xA9;
        bus.attach(Box::new(Rom::new(prg))).unwrap();
        bus
    }

    #[test]
    fn test_routes_to_each_owner() {
        let mut bus = test_bus();
        assert_eq!(bus.owner_name(0x0000), Some("RAM"));
        assert_eq!(bus.owner_name(0x1FFF), Some("RAM"));
        assert_eq!(bus.owner_name(0x2000), Some("PPU"));
        assert_eq!(bus.owner_name(0x3FFF), Some("PPU"));
        assert_eq!(bus.owner_name(0x4000), Some("APU"));
        assert_eq!(bus.owner_name(0x401F), Some("APU"));
        assert_eq!(bus.owner_name(0x8000), Some("ROM"));
        assert_eq!(bus.owner_name(0xFFFF), Some("ROM"));

        bus.write(0x0801, 0x77).unwrap();
        assert_eq!(bus.read(0x0001).unwrap(), 0x77);
        bus.write(0x2008, 0x80).unwrap();
        assert_eq!(bus.read(0x2000).unwrap(), 0x80);
        assert_eq!(bus.read(0xC000).unwrap(), 0xA9);
    }

    #[test]
    fn test_unmapped_address() {
        let mut bus = test_bus();
        assert!(matches!(
            bus.read(0x4020),
            Err(CpuError::UnmappedAddress(0x4020))
        ));
        assert!(matches!(
            bus.write(0x6000, 1),
            Err(CpuError::UnmappedAddress(0x6000))
        ));
        assert_eq!(bus.peek(0x7FFF), None);
    }

    #[test]
    fn test_rom_write_is_an_error() {
        let mut bus = test_bus();
        assert!(matches!(
            bus.write(0x8000, 1),
            Err(CpuError::ReadOnlyWrite { address: 0x8000, .. })
        ));
        assert_eq!(bus.read(0x8000).unwrap(), 0xA9);
    }

    #[test]
    fn test_overlapping_owner_rejected() {
        let mut bus = test_bus();
        let err = bus.attach(Box::new(Ram::new())).unwrap_err();
        assert!(matches!(err, CpuError::OverlappingRegion { name: "RAM", .. }));
    }

    #[test]
    fn test_word_read_is_little_endian() {
        let mut bus = test_bus();
        bus.write(0x0010, 0x34).unwrap();
        bus.write(0x0011, 0x12).unwrap();
        assert_eq!(bus.read_word(0x0010).unwrap(), 0x1234);
    }

    #[test]
    fn test_word_read_across_owners() {
        let mut bus = test_bus();
        bus.write(0x1FFF, 0xCD).unwrap();
        bus.write(0x2000, 0xAB).unwrap();
        assert_eq!(bus.read_word(0x1FFF).unwrap(), 0xABCD);
        assert!(matches!(
            bus.read_word(0x401F),
            Err(CpuError::UnmappedAddress(0x4020))
        ));
    }

    #[test]
    fn test_reset_vector_read_from_rom() {
        let mut prg = vec![0u8; 0x4000];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0xC0;
        let mut bus = Bus::new();
        bus.attach(Box::new(Rom::new(prg))).unwrap();
        assert_eq!(bus.read_word(0xFFFC).unwrap(), 0xC000);
        // Mirror of the same vector in the lower bank image.
        assert_eq!(bus.read_word(0xBFFC).unwrap(), 0xC000);
    }

    #[test]
    fn test_pushed_word_reads_back_through_owner() {
        let mut bus = test_bus();
        let mut cpu = Cpu::new().unwrap();
        cpu.sp = 0xFD;
        cpu.push_word(&mut bus, 0xC123).unwrap();
        assert_eq!(cpu.sp, 0xFB);

        let ram = bus.owner(0x01FD).unwrap();
        assert_eq!(ram.get_word(0x01FD), 0xC123);
        assert_eq!(cpu.pull_word(&mut bus).unwrap(), 0xC123);
    }
}
