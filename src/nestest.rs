//! Reference-log conformance checking against nestest.
//!
//! A nestest log line looks like
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7
//! ```
//!
//! and records the CPU state *before* the instruction runs. PPU and CYC
//! columns are not compared since timing is not emulated.

use std::fmt;
use std::path::Path;

use crate::cpu::{Cpu, Decoded};
use crate::error::{CpuError, Result};
use crate::savestate::CpuSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    /// 1-based line number in the log file.
    pub line: usize,
    pub pc: u16,
    pub bytes: Vec<u8>,
    pub mnemonic: String,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
}

impl TraceLine {
    pub fn parse(line_number: usize, text: &str) -> Result<Self> {
        let invalid = |reason: &str| CpuError::InvalidTrace {
            line: line_number,
            reason: reason.to_string(),
        };

        let registers_at = text.find(" A:").ok_or_else(|| invalid("no register columns"))?;
        let (head, registers) = text.split_at(registers_at);

        let mut tokens = head.split_whitespace();
        let pc = tokens
            .next()
            .and_then(|t| u16::from_str_radix(t, 16).ok())
            .ok_or_else(|| invalid("bad program counter"))?;

        let mut bytes = Vec::with_capacity(3);
        let mut mnemonic = None;
        for token in tokens {
            if bytes.len() < 3 && token.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(token, 16) {
                    bytes.push(byte);
                    continue;
                }
            }
            mnemonic = Some(token.trim_start_matches('*').to_string());
            break;
        }
        let mnemonic = mnemonic.ok_or_else(|| invalid("no mnemonic"))?;
        if bytes.is_empty() {
            return Err(invalid("no instruction bytes"));
        }

        let mut fields = [None::<u8>; 5];
        for token in registers.split_whitespace() {
            let Some((key, value)) = token.split_once(':') else {
                continue;
            };
            let slot = match key {
                "A" => 0,
                "X" => 1,
                "Y" => 2,
                "P" => 3,
                "SP" => 4,
                _ => continue,
            };
            fields[slot] = u8::from_str_radix(value, 16).ok();
        }
        let register = |slot: usize, name: &str| {
            fields[slot].ok_or_else(|| invalid(&format!("missing or bad {} column", name)))
        };

        Ok(TraceLine {
            line: line_number,
            pc,
            bytes,
            mnemonic,
            a: register(0, "A")?,
            x: register(1, "X")?,
            y: register(2, "Y")?,
            p: register(3, "P")?,
            sp: register(4, "SP")?,
        })
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.pc,
            sp: self.sp,
            a: self.a,
            x: self.x,
            y: self.y,
            p: self.p,
        }
    }
}

/// One row of a mismatch report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub name: &'static str,
    pub expected: String,
    pub actual: String,
}

impl FieldDiff {
    pub fn differs(&self) -> bool {
        self.expected != self.actual
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub line: usize,
    pub fields: Vec<FieldDiff>,
}

impl Mismatch {
    #[allow(dead_code)]
    pub fn field(&self, name: &str) -> Option<&FieldDiff> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state differs from nestest log line {}", self.line)?;
        writeln!(f, "{:<10}{:<12}{:<12}", "field", "expected", "actual")?;
        for field in &self.fields {
            let marker = if field.differs() { "  <--" } else { "" };
            writeln!(
                f,
                "{:<10}{:<12}{:<12}{}",
                field.name, field.expected, field.actual, marker
            )?;
        }
        Ok(())
    }
}

pub struct NesTestLog {
    lines: Vec<TraceLine>,
    position: usize,
}

impl NesTestLog {
    pub fn parse(text: &str) -> Result<Self> {
        let lines = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| TraceLine::parse(i + 1, l))
            .collect::<Result<Vec<_>>>()?;
        Ok(NesTestLog { lines, position: 0 })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let log = Self::parse(&text)?;
        log::info!(
            "Loaded {} reference lines from {}",
            log.len(),
            path.as_ref().display()
        );
        Ok(log)
    }

    pub fn first(&self) -> Option<&TraceLine> {
        self.lines.first()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Number of lines already matched.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.lines.len()
    }

    /// Checks the decoded instruction and the pre-execute registers against
    /// the next log line and advances on success.
    pub fn compare(&mut self, cpu: &Cpu, decoded: &Decoded) -> Result<()> {
        let Some(expected) = self.lines.get(self.position) else {
            return Ok(());
        };

        let mut actual_bytes = vec![decoded.instruction.opcode];
        actual_bytes.extend_from_slice(decoded.operand_bytes());

        let fields = vec![
            diff("PC", format!("{:04X}", expected.pc), format!("{:04X}", decoded.pc)),
            diff("OPCODE", expected.mnemonic.clone(), decoded.instruction.mnemonic.to_string()),
            diff("BYTES", hex_bytes(&expected.bytes), hex_bytes(&actual_bytes)),
            diff("A", format!("{:02X}", expected.a), format!("{:02X}", cpu.a)),
            diff("X", format!("{:02X}", expected.x), format!("{:02X}", cpu.x)),
            diff("Y", format!("{:02X}", expected.y), format!("{:02X}", cpu.y)),
            diff("P", format!("{:02X}", expected.p), format!("{:02X}", cpu.status.to_int())),
            diff("SP", format!("{:02X}", expected.sp), format!("{:02X}", cpu.sp)),
        ];

        if fields.iter().any(FieldDiff::differs) {
            return Err(CpuError::ConformanceMismatch(Box::new(Mismatch {
                line: expected.line,
                fields,
            })));
        }
        self.position += 1;
        Ok(())
    }
}

fn diff(name: &'static str, expected: String, actual: String) -> FieldDiff {
    FieldDiff {
        name,
        expected,
        actual,
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::cartridge::Rom;
    use crate::memory::Ram;

    const FIRST: &str = "C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7";
    const SECOND: &str = "C5F5  A2 00     LDX #$00                        A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 30 CYC:10";

    fn nestest_bus(program: &[u8]) -> Bus {
        let mut prg = vec![0xEA; 0x4000];
        prg[..program.len()].copy_from_slice(program);
        prg[0x05F5] = 0xA2;
        prg[0x05F6] = 0x00;
        let mut bus = Bus::new();
        bus.attach(Box::new(Ram::new())).unwrap();
        bus.attach(Box::new(Rom::new(prg))).unwrap();
        bus
    }

    #[test]
    fn test_parse_line() {
        let line = TraceLine::parse(1, FIRST).unwrap();
        assert_eq!(line.pc, 0xC000);
        assert_eq!(line.bytes, vec![0x4C, 0xF5, 0xC5]);
        assert_eq!(line.mnemonic, "JMP");
        assert_eq!((line.a, line.x, line.y, line.p, line.sp), (0, 0, 0, 0x24, 0xFD));
    }

    #[test]
    fn test_parse_strips_illegal_marker() {
        let text = "C6BD  04 A9    *NOP $A9 = 00                    A:AA X:97 Y:4E P:EF SP:F5 PPU: 78,180 CYC:8935";
        let line = TraceLine::parse(5, text).unwrap();
        assert_eq!(line.mnemonic, "NOP");
        assert_eq!(line.bytes, vec![0x04, 0xA9]);
        assert_eq!(line.p, 0xEF);
        assert_eq!(line.sp, 0xF5);
    }

    #[test]
    fn test_parse_mnemonic_that_looks_like_hex() {
        // "ADC" is not two characters, so it never gets taken for a byte.
        let text = "C000  69 01     ADC #$01                        A:00 X:00 Y:00 P:24 SP:FD";
        let line = TraceLine::parse(1, text).unwrap();
        assert_eq!(line.bytes, vec![0x69, 0x01]);
        assert_eq!(line.mnemonic, "ADC");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            TraceLine::parse(3, "hello"),
            Err(CpuError::InvalidTrace { line: 3, .. })
        ));
        assert!(matches!(
            TraceLine::parse(4, "C000  EA        NOP       A:00 X:00 Y:00 P:24"),
            Err(CpuError::InvalidTrace { line: 4, .. })
        ));
    }

    #[test]
    fn test_log_skips_blank_lines() {
        let log = NesTestLog::parse(&format!("{}\n\n{}\n", FIRST, SECOND)).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.first().unwrap().pc, 0xC000);
    }

    #[test]
    fn test_compare_follows_execution() {
        let mut bus = nestest_bus(&[0x4C, 0xF5, 0xC5]);
        let mut cpu = Cpu::new().unwrap();
        cpu.nestest_start();
        let mut log = NesTestLog::parse(&format!("{}\n{}", FIRST, SECOND)).unwrap();

        while !log.is_exhausted() {
            let decoded = *cpu.identify(&mut bus).unwrap();
            log.compare(&cpu, &decoded).unwrap();
            cpu.execute(&mut bus).unwrap();
        }
        assert_eq!(log.position(), 2);
        assert_eq!(cpu.pc, 0xC5F7);
    }

    #[test]
    fn test_mismatch_reports_every_field() {
        let mut bus = nestest_bus(&[0x4C, 0xF5, 0xC5]);
        let mut cpu = Cpu::new().unwrap();
        cpu.nestest_start();
        cpu.a = 0x01;
        let mut log = NesTestLog::parse(FIRST).unwrap();

        let decoded = *cpu.identify(&mut bus).unwrap();
        let err = log.compare(&cpu, &decoded).unwrap_err();
        let CpuError::ConformanceMismatch(mismatch) = err else {
            panic!("expected a conformance mismatch, got {:?}", err);
        };
        assert_eq!(mismatch.line, 1);
        assert_eq!(mismatch.fields.len(), 8);
        let a = mismatch.field("A").unwrap();
        assert!(a.differs());
        assert_eq!((a.expected.as_str(), a.actual.as_str()), ("00", "01"));
        assert!(!mismatch.field("PC").unwrap().differs());

        let report = mismatch.to_string();
        assert!(report.contains("line 1"));
        assert!(report.contains("<--"));
        assert_eq!(log.position(), 0);
    }
}
