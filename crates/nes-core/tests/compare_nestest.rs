//! Compare CPU execution with nestest.log
//!
//! The ROM and log are not shipped with the crate. Drop `nestest.nes` and `nestest.log`
//! into `tests/roms/` to enable the comparison; without them it is skipped.

use std::fs;
use std::path::PathBuf;

use nes_core::bus::Bus;
use nes_core::cartridge::Cartridge;
use nes_core::cpu::{decode, Cpu};

/// CPU state before one instruction, as the log records it
#[derive(Debug, Clone, PartialEq, Eq)]
struct CpuState {
    pc: u16,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    sp: u8,
    cycles: u64,
}

// Format: C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7
fn parse_log_line(line: &str) -> Option<(u8, CpuState)> {
    let pc = u16::from_str_radix(line.get(0..4)?, 16).ok()?;
    let opcode = u8::from_str_radix(line.get(6..8)?, 16).ok()?;
    let registers = line.get(line.find("A:")?..)?;
    let cycles = registers.get(registers.find("CYC:")? + 4..)?.trim().parse().ok()?;

    Some((
        opcode,
        CpuState {
            pc,
            a: parse_hex(registers, "A:")?,
            x: parse_hex(registers, "X:")?,
            y: parse_hex(registers, "Y:")?,
            p: parse_hex(registers, "P:")?,
            sp: parse_hex(registers, "SP:")?,
            cycles,
        },
    ))
}

fn parse_hex(s: &str, prefix: &str) -> Option<u8> {
    let start = s.find(prefix)? + prefix.len();
    u8::from_str_radix(s.get(start..start + 2)?, 16).ok()
}

fn rom_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/roms").join(name)
}

fn capture(cpu: &Cpu) -> CpuState {
    let registers = cpu.registers();
    CpuState {
        pc: registers.pc,
        a: registers.a,
        x: registers.x,
        y: registers.y,
        p: cpu.status().bits(),
        sp: registers.sp,
        cycles: cpu.total_cycles(),
    }
}

#[test]
fn test_nestest_log_parsing() {
    let line = "C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7";
    let (opcode, state) = parse_log_line(line).unwrap();
    assert_eq!(opcode, 0x4C);
    assert_eq!(
        state,
        CpuState { pc: 0xC000, a: 0, x: 0, y: 0, p: 0x24, sp: 0xFD, cycles: 7 }
    );
    assert!(parse_log_line("").is_none());
}

#[test]
fn test_compare_with_nestest_log() {
    let (Ok(rom), Ok(log)) = (
        fs::read(rom_path("nestest.nes")),
        fs::read_to_string(rom_path("nestest.log")),
    ) else {
        eprintln!("nestest.nes/nestest.log not found in tests/roms, skipping");
        return;
    };

    let mut bus = Bus::new(Cartridge::from_rom(&rom).unwrap());
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    // Automated mode starts at $C000 instead of the reset vector.
    cpu.set_pc(0xC000);

    let mut matched = 0;
    for (line_number, (opcode, expected)) in log.lines().filter_map(parse_log_line).enumerate() {
        // The official-opcode section ends where the log starts using undocumented ones.
        if decode(opcode).is_none() {
            break;
        }
        assert_eq!(capture(&cpu), expected, "diverged at log line {}", line_number + 1);
        cpu.step(&mut bus).unwrap();
        matched += 1;
    }

    assert!(matched > 4000, "only matched {matched} instructions");
}
