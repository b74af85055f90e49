use std::fs;
use std::path::Path;

use crate::error::{CpuError, Result};
use crate::memory::MemoryOwner;

const INES_MAGIC: &[u8; 4] = b"NES\x1a";
const HEADER_SIZE: usize = 16;
const TRAINER_SIZE: usize = 512;
const PRG_BANK_SIZE: usize = 0x4000;
const CHR_BANK_SIZE: usize = 0x2000;

/// An iNES image. Only PRG ROM is kept; CHR data is skipped.
pub struct Cartridge {
    prg_rom: Vec<u8>,
    mapper: u8,
}

impl Cartridge {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE || &data[0..4] != INES_MAGIC {
            return Err(CpuError::InvalidRom("missing iNES header".into()));
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];
        if prg_banks == 0 {
            return Err(CpuError::InvalidRom("no PRG ROM banks".into()));
        }

        let mut prg_start = HEADER_SIZE;
        if flags6 & 0x04 != 0 {
            prg_start += TRAINER_SIZE;
        }
        let prg_end = prg_start + prg_banks * PRG_BANK_SIZE;
        let prg_rom = data
            .get(prg_start..prg_end)
            .ok_or_else(|| {
                CpuError::InvalidRom(format!(
                    "expected {} bytes of PRG ROM, file has {}",
                    prg_banks * PRG_BANK_SIZE,
                    data.len().saturating_sub(prg_start)
                ))
            })?
            .to_vec();

        let mapper = (flags7 & 0xF0) | (flags6 >> 4);
        log::info!(
            "Cartridge loaded - Mapper: {}, PRG ROM: {} bytes, CHR ROM: {} bytes",
            mapper,
            prg_rom.len(),
            chr_banks * CHR_BANK_SIZE
        );
        if mapper != 0 {
            log::warn!("mapper {} is treated as NROM", mapper);
        }

        Ok(Cartridge { prg_rom, mapper })
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    pub fn mapper(&self) -> u8 {
        self.mapper
    }

    pub fn into_rom(self) -> Rom {
        Rom::new(self.prg_rom)
    }
}

/// PRG ROM mapped at $8000-$FFFF. A single 16 KiB bank appears twice.
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    pub const START: u16 = 0x8000;
    pub const END: u16 = 0xFFFF;

    pub fn new(data: Vec<u8>) -> Self {
        Rom { data }
    }
}

impl MemoryOwner for Rom {
    fn name(&self) -> &'static str {
        "ROM"
    }

    fn memory_start(&self) -> u16 {
        Self::START
    }

    fn memory_end(&self) -> u16 {
        Self::END
    }

    fn get(&self, address: u16) -> u8 {
        if self.data.is_empty() {
            return 0;
        }
        self.data[(address - Self::START) as usize % self.data.len()]
    }

    fn set(&mut self, address: u16, value: u8) -> Result<()> {
        Err(CpuError::ReadOnlyWrite { address, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ines(prg_banks: u8, flags6: u8) -> Vec<u8> {
        let mut data = vec![b'N', b'E', b'S', 0x1A, prg_banks, 1, flags6, 0];
        data.resize(HEADER_SIZE, 0);
        if flags6 & 0x04 != 0 {
            data.extend(std::iter::repeat(0xEE).take(TRAINER_SIZE));
        }
        for bank in 0..prg_banks {
            data.extend(std::iter::repeat(bank + 1).take(PRG_BANK_SIZE));
        }
        data.extend(std::iter::repeat(0).take(CHR_BANK_SIZE));
        data
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut data = ines(1, 0);
        data[3] = 0;
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CpuError::InvalidRom(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_prg() {
        let data = ines(1, 0);
        assert!(matches!(
            Cartridge::from_bytes(&data[..HEADER_SIZE + 100]),
            Err(CpuError::InvalidRom(_))
        ));
    }

    #[test]
    fn test_skips_trainer() {
        let cart = Cartridge::from_bytes(&ines(1, 0x04)).unwrap();
        assert_eq!(cart.prg_rom().len(), PRG_BANK_SIZE);
        assert_eq!(cart.prg_rom()[0], 1);
    }

    #[test]
    fn test_single_bank_is_mirrored() {
        let mut data = ines(1, 0);
        data[HEADER_SIZE + 0x3FFC] = 0x00;
        data[HEADER_SIZE + 0x3FFD] = 0xC0;
        let rom = Cartridge::from_bytes(&data).unwrap().into_rom();
        assert_eq!(rom.get(0xBFFC), 0x00);
        assert_eq!(rom.get(0xFFFC), 0x00);
        assert_eq!(rom.get(0xFFFD), 0xC0);
        assert_eq!(rom.get(0x8000), rom.get(0xC000));
    }

    #[test]
    fn test_two_banks_are_not_mirrored() {
        let rom = Cartridge::from_bytes(&ines(2, 0)).unwrap().into_rom();
        assert_eq!(rom.get(0x8000), 1);
        assert_eq!(rom.get(0xC000), 2);
    }

    #[test]
    fn test_rom_rejects_writes() {
        let mut rom = Rom::new(vec![0; PRG_BANK_SIZE]);
        assert!(matches!(
            rom.set(0x8000, 0x12),
            Err(CpuError::ReadOnlyWrite {
                address: 0x8000,
                value: 0x12
            })
        ));
    }
}
