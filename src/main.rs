mod apu;
mod bus;
mod cartridge;
mod cpu;
mod debug_flags;
mod emulator;
mod error;
mod memory;
mod nestest;
mod ppu;
mod savestate;
mod shutdown;

use cartridge::Cartridge;
use emulator::{Emulator, StopReason};
use std::env;
use std::process;

fn usage(program: &str) {
    eprintln!(
        "Usage: {} [--log <nestest.log>] [--pc <hex>] [--steps <n>] [--save-state <file>] [--load-state <file>] [--nestest] [--trace] [--quiet] <rom.nes>",
        program
    );
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("nes-cpu");
    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        usage(program);
        return;
    }

    // Options become environment variables so debug_flags sees one
    // configuration whichever way it was given.
    let mut rom_arg: Option<String> = None;
    let mut save_path: Option<String> = None;
    let mut load_path: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        let needs_value = |name: &str| -> String {
            match args.get(i + 1) {
                Some(v) => v.clone(),
                None => {
                    eprintln!("{} requires a value", name);
                    process::exit(2);
                }
            }
        };
        match args[i].as_str() {
            "--log" => {
                env::set_var("NESTEST_LOG", needs_value("--log"));
                i += 2;
            }
            "--pc" => {
                env::set_var("START_PC", needs_value("--pc"));
                i += 2;
            }
            "--steps" => {
                env::set_var("MAX_STEPS", needs_value("--steps"));
                i += 2;
            }
            "--save-state" => {
                save_path = Some(needs_value("--save-state"));
                i += 2;
            }
            "--load-state" => {
                load_path = Some(needs_value("--load-state"));
                i += 2;
            }
            "--nestest" => {
                env::set_var("NESTEST_AUTO", "1");
                i += 1;
            }
            "--trace" => {
                env::set_var("DEBUG_TRACE", "1");
                i += 1;
            }
            "--quiet" => {
                env::set_var("QUIET", "1");
                i += 1;
            }
            s if s.starts_with('-') => {
                eprintln!("Unknown option: {}", s);
                usage(program);
                process::exit(2);
            }
            s => {
                if rom_arg.is_some() {
                    eprintln!("Unexpected argument: {}", s);
                    process::exit(2);
                }
                rom_arg = Some(s.to_string());
                i += 1;
            }
        }
    }
    let rom_path = match rom_arg {
        Some(s) => s,
        None => {
            eprintln!("ROM argument missing");
            process::exit(2);
        }
    };

    if load_path.is_some() && debug_flags::nestest_log().is_some() {
        eprintln!("--load-state and --log both set the starting registers; pick one");
        process::exit(2);
    }

    shutdown::install();
    let quiet = debug_flags::quiet();

    if !quiet {
        println!("Loading ROM: {}", rom_path);
    }
    let cartridge = match Cartridge::load_from_file(&rom_path) {
        Ok(cart) => cart,
        Err(e) => {
            log::error!("Failed to load ROM: {}", e);
            eprintln!("Failed to load ROM: {}", e);
            process::exit(1);
        }
    };
    if !quiet {
        println!("PRG ROM: {} KB, mapper {}", cartridge.prg_rom().len() / 1024, cartridge.mapper());
    }

    let mut emulator = match Emulator::new(cartridge) {
        Ok(emulator) => emulator,
        Err(e) => {
            log::error!("Failed to initialize emulator: {}", e);
            eprintln!("Failed to initialize emulator: {}", e);
            process::exit(1);
        }
    };

    if let Some(path) = &load_path {
        if let Err(e) = emulator.load_state(path) {
            eprintln!("Failed to load state from {}: {}", path, e);
            process::exit(1);
        }
    }

    let result = emulator.run();

    if let Some(path) = &save_path {
        if let Err(e) = emulator.save_state(path) {
            eprintln!("Failed to write state to {}: {}", path, e);
        }
    }

    match result {
        Ok(summary) => {
            if !quiet {
                let why = match summary.reason {
                    StopReason::Halted => "halt requested",
                    StopReason::StepLimit => "step limit reached",
                    StopReason::LogExhausted => "reference log matched to the end",
                };
                println!("Executed {} instructions: {}", summary.steps, why);
            }
            if let Some(sig) = shutdown::signal_received() {
                process::exit(128 + sig);
            }
        }
        Err(e) => {
            log::error!("Stopped after {} instructions: {}", emulator.steps(), e);
            eprintln!("Stopped after {} instructions:\n{}", emulator.steps(), e);
            process::exit(1);
        }
    }
}
