//! Framebuffer conversion cost

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nes_core::cartridge::{CHR_BANK_SIZE, HEADER_SIZE, PRG_BANK_SIZE};
use nes_core::{Emulator, Nes};
use nes_frontend::Presenter;

fn idle_rom() -> Vec<u8> {
    let mut rom = vec![0u8; HEADER_SIZE + PRG_BANK_SIZE + CHR_BANK_SIZE];
    rom[..4].copy_from_slice(b"NES\x1A");
    rom[4] = 1;
    rom[5] = 1;
    // JMP $8000
    rom[HEADER_SIZE..HEADER_SIZE + 3].copy_from_slice(&[0x4C, 0x00, 0x80]);
    rom[HEADER_SIZE + 0x3FFD] = 0x80;
    rom
}

fn bench_convert(c: &mut Criterion) {
    let mut nes = Nes::new().unwrap();
    nes.load(&idle_rom()).unwrap();
    nes.step_frame().unwrap();
    let mut presenter = Presenter::new();

    c.bench_function("convert", |b| {
        b.iter(|| black_box(presenter.convert(&nes).len()))
    });
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
