use std::path::Path;

use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::cpu::{Cpu, Decoded};
use crate::debug_flags;
use crate::error::{CpuError, Result};
use crate::nestest::NesTestLog;
use crate::savestate::{rom_checksum, SaveState};
use crate::shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The halt source fired (SIGINT/SIGTERM by default).
    Halted,
    StepLimit,
    /// Every reference line matched.
    LogExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u64,
    pub reason: StopReason,
}

pub struct Emulator {
    cpu: Cpu,
    bus: Bus,
    trace: Option<NesTestLog>,
    steps: u64,
    max_steps: Option<u64>,
    rom_checksum: u32,
    halt: fn() -> bool,
}

impl Emulator {
    /// Builds the NES bus around `cartridge` and applies the environment
    /// configuration (`NESTEST_AUTO`, `START_PC`, `MAX_STEPS`, `NESTEST_LOG`).
    pub fn new(cartridge: Cartridge) -> Result<Self> {
        let checksum = rom_checksum(cartridge.prg_rom());
        let bus = Bus::nes(cartridge)?;
        let mut emulator = Emulator::from_parts(Cpu::new()?, bus);
        emulator.rom_checksum = checksum;
        emulator.cpu.reset(&mut emulator.bus)?;
        log::info!("Reset vector: 0x{:04X}", emulator.cpu.pc);

        emulator.apply_start(debug_flags::nestest_auto(), debug_flags::start_pc());
        emulator.max_steps = debug_flags::max_steps();
        if let Some(path) = debug_flags::nestest_log() {
            emulator.attach_trace(NesTestLog::load(path)?);
        }
        Ok(emulator)
    }

    pub fn from_parts(cpu: Cpu, bus: Bus) -> Self {
        Emulator {
            cpu,
            bus,
            trace: None,
            steps: 0,
            max_steps: None,
            rom_checksum: 0,
            halt: shutdown::halt_requested,
        }
    }

    /// nestest's automated entry ($C000, P=$24) and/or an explicit start
    /// address. A start address only moves PC.
    pub fn apply_start(&mut self, nestest: bool, start_pc: Option<u16>) {
        if nestest {
            self.cpu.nestest_start();
        }
        if let Some(pc) = start_pc {
            log::info!("Starting at 0x{:04X}", pc);
            self.cpu.pc = pc;
        }
    }

    /// Replaces the halt check polled between instructions.
    #[allow(dead_code)]
    pub fn set_halt_source(&mut self, halt: fn() -> bool) {
        self.halt = halt;
    }

    /// Verifies every instruction against `log`. The CPU is moved to the
    /// state recorded on the first line.
    pub fn attach_trace(&mut self, log: NesTestLog) {
        if let Some(first) = log.first() {
            self.cpu.restore(&first.snapshot());
        }
        self.trace = Some(log);
    }

    #[allow(dead_code)]
    pub fn set_max_steps(&mut self, max_steps: Option<u64>) {
        self.max_steps = max_steps;
    }

    #[allow(dead_code)]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    #[allow(dead_code)]
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Runs until halted, the step limit, the end of the reference log, or
    /// the first error.
    pub fn run(&mut self) -> Result<RunSummary> {
        let reason = loop {
            if (self.halt)() {
                break StopReason::Halted;
            }
            if self.max_steps.is_some_and(|max| self.steps >= max) {
                break StopReason::StepLimit;
            }
            if self.trace.as_ref().is_some_and(NesTestLog::is_exhausted) {
                break StopReason::LogExhausted;
            }
            self.step()?;
        };

        log::info!("Stopped after {} instructions ({:?})", self.steps, reason);
        if let Some(trace) = &self.trace {
            log::info!("Matched {} of {} reference lines", trace.position(), trace.len());
        }
        Ok(RunSummary {
            steps: self.steps,
            reason,
        })
    }

    pub fn step(&mut self) -> Result<()> {
        let decoded = *self.cpu.identify(&mut self.bus)?;
        self.log_instruction(&decoded);
        if let Some(trace) = self.trace.as_mut() {
            trace.compare(&self.cpu, &decoded)?;
        }
        self.cpu.execute(&mut self.bus)?;
        self.steps += 1;
        Ok(())
    }

    fn log_instruction(&self, decoded: &Decoded) {
        let level = if debug_flags::trace() {
            log::Level::Info
        } else {
            log::Level::Trace
        };
        if !log::log_enabled!(level) {
            return;
        }
        let mut bytes = format!("{:02X}", decoded.instruction.opcode);
        for b in decoded.operand_bytes() {
            bytes.push_str(&format!(" {:02X}", b));
        }
        let cpu = &self.cpu;
        log::log!(
            level,
            "{:04X}  {:<8}  {:<30}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
            decoded.pc,
            bytes,
            decoded.describe(),
            cpu.a,
            cpu.x,
            cpu.y,
            cpu.status.to_int(),
            cpu.sp
        );
    }

    pub fn save_state<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let state = SaveState::capture(&self.cpu, &mut self.bus, self.steps, self.rom_checksum)?;
        state.save_to_file(path)
    }

    /// Restores registers and RAM. Refused while a reference log is
    /// attached, since the log already fixes the starting registers.
    pub fn load_state<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if self.trace.is_some() {
            return Err(CpuError::StateWithTrace);
        }
        let state = SaveState::load_from_file(path)?;
        if !state.validate_rom_checksum(self.rom_checksum) {
            log::warn!("save state was taken with a different ROM");
        }
        self.steps = state.apply(&mut self.cpu, &mut self.bus)?;
        Ok(())
    }
}
