//! Sharp LR35902 (SM83) core: CPU, memory-mapped bus, cartridge mappers and
//! the LCD/timer/joypad/APU peripherals, wired together by `System`.
//!
//! A frontend only needs `system::System` and `cli::Cli`; the rest of the
//! module tree is exposed for disassembly tooling and tests.

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod cli;
pub mod cpu;
pub mod error;
pub mod interrupt;
pub mod joypad;
pub mod mbc;
pub mod memory_map;
pub mod ppu;
pub mod system;
pub mod timer;

pub use system::System;
