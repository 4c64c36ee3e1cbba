//! CPU (2A03) implementation
//!
//! The 2A03 is a 6502 without decimal mode. Only the 151 documented opcodes are
//! implemented; fetching anything else is reported as [`CpuError::InvalidOpcode`] so the
//! caller can stop instead of running on from a corrupted program counter.

use std::fmt;

use thiserror::Error;

/// Bus trait for memory and I/O access
pub trait Bus {
    /// Read a byte from the given address
    fn read(&mut self, address: u16) -> u8;
    /// Write a byte to the given address
    fn write(&mut self, address: u16, value: u8);
}

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const STACK_PAGE: u16 = 0x0100;

/// CPU registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuRegisters {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
        }
    }
}

/// Processor status register (P)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFlags(u8);

impl StatusFlags {
    pub const CARRY: u8 = 0b0000_0001;
    pub const ZERO: u8 = 0b0000_0010;
    pub const INTERRUPT: u8 = 0b0000_0100;
    pub const DECIMAL: u8 = 0b0000_1000;
    pub const BREAK: u8 = 0b0001_0000;
    pub const UNUSED: u8 = 0b0010_0000;
    pub const OVERFLOW: u8 = 0b0100_0000;
    pub const NEGATIVE: u8 = 0b1000_0000;

    pub fn new(flags: u8) -> Self {
        Self(flags)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn carry(&self) -> bool {
        self.0 & Self::CARRY != 0
    }

    pub fn zero(&self) -> bool {
        self.0 & Self::ZERO != 0
    }

    pub fn interrupt(&self) -> bool {
        self.0 & Self::INTERRUPT != 0
    }

    pub fn decimal(&self) -> bool {
        self.0 & Self::DECIMAL != 0
    }

    pub fn overflow(&self) -> bool {
        self.0 & Self::OVERFLOW != 0
    }

    pub fn negative(&self) -> bool {
        self.0 & Self::NEGATIVE != 0
    }

    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    fn set_zn(&mut self, value: u8) {
        self.set(Self::ZERO, value == 0);
        self.set(Self::NEGATIVE, value & 0x80 != 0);
    }

    /// Value pushed by PHP/BRK (B and bit 5 set).
    fn pushed(&self) -> u8 {
        self.0 | Self::BREAK | Self::UNUSED
    }

    /// Value restored by PLP/RTI (B dropped, bit 5 forced).
    fn pulled(value: u8) -> Self {
        Self((value & !Self::BREAK) | Self::UNUSED)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = ['C', 'Z', 'I', 'D', 'B', '-', 'V', 'N'];
        for bit in (0..8).rev() {
            let c = if self.0 & (1 << bit) != 0 { names[bit] } else { '.' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Addressing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

/// Documented 6502 instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Mnemonic {
    /// Reads that take one more cycle when indexing crosses a page.
    fn pays_page_penalty(self) -> bool {
        use Mnemonic::*;
        matches!(self, Adc | And | Cmp | Eor | Lda | Ldx | Ldy | Ora | Sbc)
    }
}

/// A decoded opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Base cycle count, before page-cross and branch penalties
    pub cycles: u8,
}

/// Decode an opcode byte. Returns `None` for undocumented opcodes.
pub fn decode(opcode: u8) -> Option<Instruction> {
    use AddressingMode::*;
    use Mnemonic::*;

    let (mnemonic, mode, cycles) = match opcode {
        0x69 => (Adc, Immediate, 2),
        0x65 => (Adc, ZeroPage, 3),
        0x75 => (Adc, ZeroPageX, 4),
        0x6D => (Adc, Absolute, 4),
        0x7D => (Adc, AbsoluteX, 4),
        0x79 => (Adc, AbsoluteY, 4),
        0x61 => (Adc, IndirectX, 6),
        0x71 => (Adc, IndirectY, 5),

        0x29 => (And, Immediate, 2),
        0x25 => (And, ZeroPage, 3),
        0x35 => (And, ZeroPageX, 4),
        0x2D => (And, Absolute, 4),
        0x3D => (And, AbsoluteX, 4),
        0x39 => (And, AbsoluteY, 4),
        0x21 => (And, IndirectX, 6),
        0x31 => (And, IndirectY, 5),

        0x0A => (Asl, Accumulator, 2),
        0x06 => (Asl, ZeroPage, 5),
        0x16 => (Asl, ZeroPageX, 6),
        0x0E => (Asl, Absolute, 6),
        0x1E => (Asl, AbsoluteX, 7),

        0x90 => (Bcc, Relative, 2),
        0xB0 => (Bcs, Relative, 2),
        0xF0 => (Beq, Relative, 2),
        0x30 => (Bmi, Relative, 2),
        0xD0 => (Bne, Relative, 2),
        0x10 => (Bpl, Relative, 2),
        0x50 => (Bvc, Relative, 2),
        0x70 => (Bvs, Relative, 2),

        0x24 => (Bit, ZeroPage, 3),
        0x2C => (Bit, Absolute, 4),

        0x00 => (Brk, Implied, 7),

        0x18 => (Clc, Implied, 2),
        0xD8 => (Cld, Implied, 2),
        0x58 => (Cli, Implied, 2),
        0xB8 => (Clv, Implied, 2),

        0xC9 => (Cmp, Immediate, 2),
        0xC5 => (Cmp, ZeroPage, 3),
        0xD5 => (Cmp, ZeroPageX, 4),
        0xCD => (Cmp, Absolute, 4),
        0xDD => (Cmp, AbsoluteX, 4),
        0xD9 => (Cmp, AbsoluteY, 4),
        0xC1 => (Cmp, IndirectX, 6),
        0xD1 => (Cmp, IndirectY, 5),

        0xE0 => (Cpx, Immediate, 2),
        0xE4 => (Cpx, ZeroPage, 3),
        0xEC => (Cpx, Absolute, 4),
        0xC0 => (Cpy, Immediate, 2),
        0xC4 => (Cpy, ZeroPage, 3),
        0xCC => (Cpy, Absolute, 4),

        0xC6 => (Dec, ZeroPage, 5),
        0xD6 => (Dec, ZeroPageX, 6),
        0xCE => (Dec, Absolute, 6),
        0xDE => (Dec, AbsoluteX, 7),
        0xCA => (Dex, Implied, 2),
        0x88 => (Dey, Implied, 2),

        0x49 => (Eor, Immediate, 2),
        0x45 => (Eor, ZeroPage, 3),
        0x55 => (Eor, ZeroPageX, 4),
        0x4D => (Eor, Absolute, 4),
        0x5D => (Eor, AbsoluteX, 4),
        0x59 => (Eor, AbsoluteY, 4),
        0x41 => (Eor, IndirectX, 6),
        0x51 => (Eor, IndirectY, 5),

        0xE6 => (Inc, ZeroPage, 5),
        0xF6 => (Inc, ZeroPageX, 6),
        0xEE => (Inc, Absolute, 6),
        0xFE => (Inc, AbsoluteX, 7),
        0xE8 => (Inx, Implied, 2),
        0xC8 => (Iny, Implied, 2),

        0x4C => (Jmp, Absolute, 3),
        0x6C => (Jmp, Indirect, 5),
        0x20 => (Jsr, Absolute, 6),

        0xA9 => (Lda, Immediate, 2),
        0xA5 => (Lda, ZeroPage, 3),
        0xB5 => (Lda, ZeroPageX, 4),
        0xAD => (Lda, Absolute, 4),
        0xBD => (Lda, AbsoluteX, 4),
        0xB9 => (Lda, AbsoluteY, 4),
        0xA1 => (Lda, IndirectX, 6),
        0xB1 => (Lda, IndirectY, 5),

        0xA2 => (Ldx, Immediate, 2),
        0xA6 => (Ldx, ZeroPage, 3),
        0xB6 => (Ldx, ZeroPageY, 4),
        0xAE => (Ldx, Absolute, 4),
        0xBE => (Ldx, AbsoluteY, 4),

        0xA0 => (Ldy, Immediate, 2),
        0xA4 => (Ldy, ZeroPage, 3),
        0xB4 => (Ldy, ZeroPageX, 4),
        0xAC => (Ldy, Absolute, 4),
        0xBC => (Ldy, AbsoluteX, 4),

        0x4A => (Lsr, Accumulator, 2),
        0x46 => (Lsr, ZeroPage, 5),
        0x56 => (Lsr, ZeroPageX, 6),
        0x4E => (Lsr, Absolute, 6),
        0x5E => (Lsr, AbsoluteX, 7),

        0xEA => (Nop, Implied, 2),

        0x09 => (Ora, Immediate, 2),
        0x05 => (Ora, ZeroPage, 3),
        0x15 => (Ora, ZeroPageX, 4),
        0x0D => (Ora, Absolute, 4),
        0x1D => (Ora, AbsoluteX, 4),
        0x19 => (Ora, AbsoluteY, 4),
        0x01 => (Ora, IndirectX, 6),
        0x11 => (Ora, IndirectY, 5),

        0x48 => (Pha, Implied, 3),
        0x08 => (Php, Implied, 3),
        0x68 => (Pla, Implied, 4),
        0x28 => (Plp, Implied, 4),

        0x2A => (Rol, Accumulator, 2),
        0x26 => (Rol, ZeroPage, 5),
        0x36 => (Rol, ZeroPageX, 6),
        0x2E => (Rol, Absolute, 6),
        0x3E => (Rol, AbsoluteX, 7),

        0x6A => (Ror, Accumulator, 2),
        0x66 => (Ror, ZeroPage, 5),
        0x76 => (Ror, ZeroPageX, 6),
        0x6E => (Ror, Absolute, 6),
        0x7E => (Ror, AbsoluteX, 7),

        0x40 => (Rti, Implied, 6),
        0x60 => (Rts, Implied, 6),

        0xE9 => (Sbc, Immediate, 2),
        0xE5 => (Sbc, ZeroPage, 3),
        0xF5 => (Sbc, ZeroPageX, 4),
        0xED => (Sbc, Absolute, 4),
        0xFD => (Sbc, AbsoluteX, 4),
        0xF9 => (Sbc, AbsoluteY, 4),
        0xE1 => (Sbc, IndirectX, 6),
        0xF1 => (Sbc, IndirectY, 5),

        0x38 => (Sec, Implied, 2),
        0xF8 => (Sed, Implied, 2),
        0x78 => (Sei, Implied, 2),

        0x85 => (Sta, ZeroPage, 3),
        0x95 => (Sta, ZeroPageX, 4),
        0x8D => (Sta, Absolute, 4),
        0x9D => (Sta, AbsoluteX, 5),
        0x99 => (Sta, AbsoluteY, 5),
        0x81 => (Sta, IndirectX, 6),
        0x91 => (Sta, IndirectY, 6),

        0x86 => (Stx, ZeroPage, 3),
        0x96 => (Stx, ZeroPageY, 4),
        0x8E => (Stx, Absolute, 4),
        0x84 => (Sty, ZeroPage, 3),
        0x94 => (Sty, ZeroPageX, 4),
        0x8C => (Sty, Absolute, 4),

        0xAA => (Tax, Implied, 2),
        0xA8 => (Tay, Implied, 2),
        0xBA => (Tsx, Implied, 2),
        0x8A => (Txa, Implied, 2),
        0x9A => (Txs, Implied, 2),
        0x98 => (Tya, Implied, 2),

        _ => return None,
    };

    Some(Instruction {
        mnemonic,
        mode,
        cycles,
    })
}

/// Where an instruction's data lives once the addressing mode is resolved.
#[derive(Debug, Clone, Copy)]
enum Operand {
    Implied,
    Accumulator,
    Address(u16),
}

impl Operand {
    fn address(self) -> u16 {
        match self {
            Operand::Address(address) => address,
            Operand::Implied | Operand::Accumulator => 0,
        }
    }
}

fn page_crossed(from: u16, to: u16) -> bool {
    from & 0xFF00 != to & 0xFF00
}

/// CPU emulator state
#[derive(Debug, Clone)]
pub struct Cpu {
    registers: CpuRegisters,
    status: StatusFlags,
    /// Total cycles executed
    total_cycles: u64,
}

impl Cpu {
    /// Create a new CPU instance
    pub fn new() -> Self {
        Self {
            registers: CpuRegisters::default(),
            status: StatusFlags::new(0x24),
            total_cycles: 0,
        }
    }

    /// Power-on reset: registers cleared, PC loaded from the reset vector.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.registers = CpuRegisters::default();
        self.registers.pc = read_u16(bus, RESET_VECTOR);
        self.status = StatusFlags::new(0x24);
        self.total_cycles = 7;
    }

    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn status(&self) -> StatusFlags {
        self.status
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Jump straight to `pc` (used to start test programs without a reset vector).
    pub fn set_pc(&mut self, pc: u16) {
        self.registers.pc = pc;
    }

    /// Service a non-maskable interrupt. Returns the cycles it took.
    pub fn nmi(&mut self, bus: &mut impl Bus) -> u32 {
        self.push_u16(bus, self.registers.pc);
        let flags = (self.status.bits() & !StatusFlags::BREAK) | StatusFlags::UNUSED;
        self.push(bus, flags);
        self.status.set(StatusFlags::INTERRUPT, true);
        self.registers.pc = read_u16(bus, NMI_VECTOR);
        self.total_cycles += 7;
        7
    }

    /// Execute one instruction. Returns the cycles it took.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<u32, CpuError> {
        let pc = self.registers.pc;
        let opcode = bus.read(pc);
        let instruction = decode(opcode).ok_or(CpuError::InvalidOpcode { opcode, pc })?;
        self.registers.pc = pc.wrapping_add(1);

        let (operand, crossed) = self.operand(bus, instruction.mode);
        let mut cycles = u32::from(instruction.cycles);
        if crossed && instruction.mnemonic.pays_page_penalty() {
            cycles += 1;
        }
        cycles += self.execute(bus, instruction.mnemonic, operand, crossed);

        self.total_cycles += u64::from(cycles);
        Ok(cycles)
    }

    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        value
    }

    fn fetch_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn operand(&mut self, bus: &mut impl Bus, mode: AddressingMode) -> (Operand, bool) {
        use AddressingMode::*;

        let x = self.registers.x;
        let y = self.registers.y;
        match mode {
            Implied => (Operand::Implied, false),
            Accumulator => (Operand::Accumulator, false),
            Immediate => {
                let address = self.registers.pc;
                self.registers.pc = address.wrapping_add(1);
                (Operand::Address(address), false)
            }
            ZeroPage => (Operand::Address(u16::from(self.fetch(bus))), false),
            ZeroPageX => (Operand::Address(u16::from(self.fetch(bus).wrapping_add(x))), false),
            ZeroPageY => (Operand::Address(u16::from(self.fetch(bus).wrapping_add(y))), false),
            Absolute => (Operand::Address(self.fetch_u16(bus)), false),
            AbsoluteX => {
                let base = self.fetch_u16(bus);
                let address = base.wrapping_add(u16::from(x));
                (Operand::Address(address), page_crossed(base, address))
            }
            AbsoluteY => {
                let base = self.fetch_u16(bus);
                let address = base.wrapping_add(u16::from(y));
                (Operand::Address(address), page_crossed(base, address))
            }
            Indirect => {
                // The high byte is fetched without carrying into the pointer's page.
                let pointer = self.fetch_u16(bus);
                let lo = bus.read(pointer);
                let hi = bus.read((pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF));
                (Operand::Address(u16::from_le_bytes([lo, hi])), false)
            }
            IndirectX => {
                let pointer = self.fetch(bus).wrapping_add(x);
                (Operand::Address(read_zero_page_u16(bus, pointer)), false)
            }
            IndirectY => {
                let pointer = self.fetch(bus);
                let base = read_zero_page_u16(bus, pointer);
                let address = base.wrapping_add(u16::from(y));
                (Operand::Address(address), page_crossed(base, address))
            }
            Relative => {
                let offset = self.fetch(bus) as i8;
                let next = self.registers.pc;
                let target = next.wrapping_add(offset as u16);
                (Operand::Address(target), page_crossed(next, target))
            }
        }
    }

    /// Run the instruction body. Returns cycles beyond the base count.
    fn execute(
        &mut self,
        bus: &mut impl Bus,
        mnemonic: Mnemonic,
        operand: Operand,
        crossed: bool,
    ) -> u32 {
        use Mnemonic::*;

        match mnemonic {
            Adc => {
                let value = self.load(bus, operand);
                self.add(value);
            }
            Sbc => {
                let value = self.load(bus, operand);
                self.add(!value);
            }
            And => {
                let value = self.registers.a & self.load(bus, operand);
                self.set_a(value);
            }
            Ora => {
                let value = self.registers.a | self.load(bus, operand);
                self.set_a(value);
            }
            Eor => {
                let value = self.registers.a ^ self.load(bus, operand);
                self.set_a(value);
            }
            Asl => self.modify(bus, operand, |status, value| {
                status.set(StatusFlags::CARRY, value & 0x80 != 0);
                value << 1
            }),
            Lsr => self.modify(bus, operand, |status, value| {
                status.set(StatusFlags::CARRY, value & 0x01 != 0);
                value >> 1
            }),
            Rol => self.modify(bus, operand, |status, value| {
                let carry_in = u8::from(status.carry());
                status.set(StatusFlags::CARRY, value & 0x80 != 0);
                (value << 1) | carry_in
            }),
            Ror => self.modify(bus, operand, |status, value| {
                let carry_in = u8::from(status.carry()) << 7;
                status.set(StatusFlags::CARRY, value & 0x01 != 0);
                (value >> 1) | carry_in
            }),
            Inc => self.modify(bus, operand, |_, value| value.wrapping_add(1)),
            Dec => self.modify(bus, operand, |_, value| value.wrapping_sub(1)),

            Bcc => return self.branch(!self.status.carry(), operand, crossed),
            Bcs => return self.branch(self.status.carry(), operand, crossed),
            Beq => return self.branch(self.status.zero(), operand, crossed),
            Bne => return self.branch(!self.status.zero(), operand, crossed),
            Bmi => return self.branch(self.status.negative(), operand, crossed),
            Bpl => return self.branch(!self.status.negative(), operand, crossed),
            Bvs => return self.branch(self.status.overflow(), operand, crossed),
            Bvc => return self.branch(!self.status.overflow(), operand, crossed),

            Bit => {
                let value = self.load(bus, operand);
                self.status.set(StatusFlags::ZERO, self.registers.a & value == 0);
                self.status.set(StatusFlags::OVERFLOW, value & 0x40 != 0);
                self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
            }
            Brk => {
                let return_address = self.registers.pc.wrapping_add(1);
                self.push_u16(bus, return_address);
                self.push(bus, self.status.pushed());
                self.status.set(StatusFlags::INTERRUPT, true);
                self.registers.pc = read_u16(bus, IRQ_VECTOR);
            }

            Clc => self.status.set(StatusFlags::CARRY, false),
            Cld => self.status.set(StatusFlags::DECIMAL, false),
            Cli => self.status.set(StatusFlags::INTERRUPT, false),
            Clv => self.status.set(StatusFlags::OVERFLOW, false),
            Sec => self.status.set(StatusFlags::CARRY, true),
            Sed => self.status.set(StatusFlags::DECIMAL, true),
            Sei => self.status.set(StatusFlags::INTERRUPT, true),

            Cmp => {
                let value = self.load(bus, operand);
                self.compare(self.registers.a, value);
            }
            Cpx => {
                let value = self.load(bus, operand);
                self.compare(self.registers.x, value);
            }
            Cpy => {
                let value = self.load(bus, operand);
                self.compare(self.registers.y, value);
            }

            Dex => self.set_x(self.registers.x.wrapping_sub(1)),
            Dey => self.set_y(self.registers.y.wrapping_sub(1)),
            Inx => self.set_x(self.registers.x.wrapping_add(1)),
            Iny => self.set_y(self.registers.y.wrapping_add(1)),

            Jmp => self.registers.pc = operand.address(),
            Jsr => {
                let return_address = self.registers.pc.wrapping_sub(1);
                self.push_u16(bus, return_address);
                self.registers.pc = operand.address();
            }
            Rts => {
                self.registers.pc = self.pull_u16(bus).wrapping_add(1);
            }
            Rti => {
                let flags = self.pull(bus);
                self.status = StatusFlags::pulled(flags);
                self.registers.pc = self.pull_u16(bus);
            }

            Lda => {
                let value = self.load(bus, operand);
                self.set_a(value);
            }
            Ldx => {
                let value = self.load(bus, operand);
                self.set_x(value);
            }
            Ldy => {
                let value = self.load(bus, operand);
                self.set_y(value);
            }
            Sta => bus.write(operand.address(), self.registers.a),
            Stx => bus.write(operand.address(), self.registers.x),
            Sty => bus.write(operand.address(), self.registers.y),

            Nop => {}

            Pha => self.push(bus, self.registers.a),
            Php => self.push(bus, self.status.pushed()),
            Pla => {
                let value = self.pull(bus);
                self.set_a(value);
            }
            Plp => {
                let flags = self.pull(bus);
                self.status = StatusFlags::pulled(flags);
            }

            Tax => self.set_x(self.registers.a),
            Tay => self.set_y(self.registers.a),
            Tsx => self.set_x(self.registers.sp),
            Txa => self.set_a(self.registers.x),
            Tya => self.set_a(self.registers.y),
            Txs => self.registers.sp = self.registers.x,
        }
        0
    }

    fn load(&mut self, bus: &mut impl Bus, operand: Operand) -> u8 {
        match operand {
            Operand::Address(address) => bus.read(address),
            Operand::Accumulator | Operand::Implied => self.registers.a,
        }
    }

    /// Read-modify-write on the accumulator or memory; Z and N follow the result.
    fn modify(
        &mut self,
        bus: &mut impl Bus,
        operand: Operand,
        op: impl FnOnce(&mut StatusFlags, u8) -> u8,
    ) {
        let value = self.load(bus, operand);
        let result = op(&mut self.status, value);
        self.status.set_zn(result);
        match operand {
            Operand::Address(address) => bus.write(address, result),
            Operand::Accumulator | Operand::Implied => self.registers.a = result,
        }
    }

    fn branch(&mut self, taken: bool, operand: Operand, crossed: bool) -> u32 {
        if !taken {
            return 0;
        }
        self.registers.pc = operand.address();
        1 + u32::from(crossed)
    }

    fn add(&mut self, value: u8) {
        let a = self.registers.a;
        let sum = u16::from(a) + u16::from(value) + u16::from(self.status.carry());
        let result = sum as u8;
        self.status.set(StatusFlags::CARRY, sum > 0xFF);
        self.status
            .set(StatusFlags::OVERFLOW, (a ^ result) & (value ^ result) & 0x80 != 0);
        self.set_a(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(StatusFlags::CARRY, register >= value);
        self.status.set_zn(register.wrapping_sub(value));
    }

    fn set_a(&mut self, value: u8) {
        self.registers.a = value;
        self.status.set_zn(value);
    }

    fn set_x(&mut self, value: u8) {
        self.registers.x = value;
        self.status.set_zn(value);
    }

    fn set_y(&mut self, value: u8) {
        self.registers.y = value;
        self.status.set_zn(value);
    }

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(STACK_PAGE | u16::from(self.registers.sp), value);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.registers.sp = self.registers.sp.wrapping_add(1);
        bus.read(STACK_PAGE | u16::from(self.registers.sp))
    }

    fn push_u16(&mut self, bus: &mut impl Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    fn pull_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u16(bus: &mut impl Bus, address: u16) -> u16 {
    let lo = bus.read(address);
    let hi = bus.read(address.wrapping_add(1));
    u16::from_le_bytes([lo, hi])
}

fn read_zero_page_u16(bus: &mut impl Bus, pointer: u8) -> u16 {
    let lo = bus.read(u16::from(pointer));
    let hi = bus.read(u16::from(pointer.wrapping_add(1)));
    u16::from_le_bytes([lo, hi])
}

/// CPU error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("invalid opcode ${opcode:02X} at ${pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
}
