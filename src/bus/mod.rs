//! The 16-bit address bus. Holds every memory-mapped peripheral behind an
//! ordered table of `(range, device, enabled)` entries and dispatches CPU
//! reads/writes by linear scan, so new peripherals plug in without touching
//! the dispatch code.
//!
//! IE/IF stay plain fields rather than devices: every instruction's
//! interrupt check reads them, so they sit on the hot path.

mod device;
pub mod wram;

pub use device::Device;

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::interrupt::InterruptSink;
use crate::joypad::Joypad;
use crate::memory_map::{self, DMA_ADDR, IE_MASK, IF_ADDR, INTERRUPT_ENABLE_REGISTER};
use crate::ppu::Ppu;
use crate::timer::Timer;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wram::{EchoRam, Hram, Serial, Wram};

/// Opaque snapshot of the bus's own fast-path fields (not its peripherals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSnapshot {
    ie: u8,
    if_reg: u8,
    dma_remaining: u16,
    dma_source_base: u16,
    dma_gate: bool,
}

const OAM_DMA_BYTES: u16 = 160;

struct Mapping {
    lo: u16,
    hi: u16,
    device: Rc<RefCell<dyn Device>>,
    enabled: Rc<Cell<bool>>,
}

impl Mapping {
    fn contains(&self, addr: u16) -> bool {
        addr >= self.lo && addr <= self.hi
    }
}

/// Shared handles to the peripherals System needs to step directly each
/// instruction, alongside the same `Rc`s registered into the bus's mapping
/// table for CPU-driven reads/writes.
pub struct Bus {
    cartridge: Rc<RefCell<Cartridge>>,
    wram: Rc<RefCell<Wram>>,
    hram: Rc<RefCell<Hram>>,
    serial: Rc<RefCell<Serial>>,
    apu: Rc<RefCell<Apu>>,
    timer: Rc<RefCell<Timer>>,
    joypad: Rc<RefCell<Joypad>>,
    ppu: Rc<RefCell<Ppu>>,

    ie: u8,
    if_reg: u8,

    dma_remaining: u16,
    dma_source_base: u16,
    dma_gate: Rc<Cell<bool>>,

    mappings: Vec<Mapping>,
}

impl Bus {
    pub fn new(cartridge: Cartridge) -> Self {
        let cartridge = Rc::new(RefCell::new(cartridge));
        let wram = Rc::new(RefCell::new(Wram::new()));
        let echo = Rc::new(RefCell::new(EchoRam::new(wram.clone())));
        let hram = Rc::new(RefCell::new(Hram::new()));
        let serial = Rc::new(RefCell::new(Serial::default()));
        let apu = Rc::new(RefCell::new(Apu::new()));
        let timer = Rc::new(RefCell::new(Timer::new()));
        let joypad = Rc::new(RefCell::new(Joypad::new()));
        let ppu = Rc::new(RefCell::new(Ppu::new()));

        // Only cartridge RAM and WRAM (and its echo mirror) go dark during
        // OAM DMA; everything else — ROM, VRAM/OAM, HRAM, joypad, serial,
        // timer, sound, and the PPU register file — stays reachable.
        let always_on: Rc<Cell<bool>> = Rc::new(Cell::new(true));
        let dma_gate: Rc<Cell<bool>> = Rc::new(Cell::new(true));

        let mappings = vec![
            Mapping {
                lo: memory_map::ROM_BANK_0_START,
                hi: memory_map::ROM_BANK_N_END,
                device: cartridge.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::VRAM_START,
                hi: memory_map::VRAM_END,
                device: ppu.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::EXT_RAM_START,
                hi: memory_map::EXT_RAM_END,
                device: cartridge.clone(),
                enabled: dma_gate.clone(),
            },
            Mapping {
                lo: memory_map::WRAM_BANK_0_START,
                hi: memory_map::WRAM_BANK_N_END,
                device: wram.clone(),
                enabled: dma_gate.clone(),
            },
            Mapping {
                lo: memory_map::ECHO_RAM_START,
                hi: memory_map::ECHO_RAM_END,
                device: echo,
                enabled: dma_gate.clone(),
            },
            Mapping {
                lo: memory_map::OAM_START,
                hi: memory_map::OAM_END,
                device: ppu.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::P1_JOYP_ADDR,
                hi: memory_map::P1_JOYP_ADDR,
                device: joypad.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::SB_ADDR,
                hi: memory_map::SC_ADDR,
                device: serial.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::DIV_ADDR,
                hi: memory_map::TAC_ADDR,
                device: timer.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::NR10_ADDR,
                hi: memory_map::WAVE_PATTERN_RAM_END,
                device: apu.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::LCDC_ADDR,
                hi: memory_map::WX_ADDR,
                device: ppu.clone(),
                enabled: always_on.clone(),
            },
            Mapping {
                lo: memory_map::HRAM_START,
                hi: memory_map::HRAM_END,
                device: hram.clone(),
                enabled: always_on,
            },
        ];

        Bus {
            cartridge,
            wram,
            hram,
            serial,
            apu,
            timer,
            joypad,
            ppu,
            ie: 0,
            if_reg: 0xE1,
            dma_remaining: 0,
            dma_source_base: 0,
            dma_gate,
            mappings,
        }
    }

    pub fn timer(&self) -> Rc<RefCell<Timer>> {
        self.timer.clone()
    }

    pub fn joypad(&self) -> Rc<RefCell<Joypad>> {
        self.joypad.clone()
    }

    pub fn ppu(&self) -> Rc<RefCell<Ppu>> {
        self.ppu.clone()
    }

    pub fn apu(&self) -> Rc<RefCell<Apu>> {
        self.apu.clone()
    }

    pub fn cartridge(&self) -> Rc<RefCell<Cartridge>> {
        self.cartridge.clone()
    }

    pub fn wram(&self) -> Rc<RefCell<Wram>> {
        self.wram.clone()
    }

    pub fn hram(&self) -> Rc<RefCell<Hram>> {
        self.hram.clone()
    }

    pub fn serial(&self) -> Rc<RefCell<Serial>> {
        self.serial.clone()
    }

    /// Captures every byte of mutable bus-owned state (the fast-path IE/IF
    /// fields and the in-flight OAM DMA countdown; every peripheral's own
    /// state is snapshotted separately by `System::save_state`).
    pub fn snapshot(&self) -> BusSnapshot {
        BusSnapshot {
            ie: self.ie,
            if_reg: self.if_reg,
            dma_remaining: self.dma_remaining,
            dma_source_base: self.dma_source_base,
            dma_gate: self.dma_gate.get(),
        }
    }

    pub fn restore(&mut self, snapshot: &BusSnapshot) {
        self.ie = snapshot.ie;
        self.if_reg = snapshot.if_reg;
        self.dma_remaining = snapshot.dma_remaining;
        self.dma_source_base = snapshot.dma_source_base;
        self.dma_gate.set(snapshot.dma_gate);
    }

    pub fn read_interrupt_enable(&self) -> u8 {
        self.ie
    }

    pub fn read_interrupt_flag(&self) -> u8 {
        self.if_reg | 0xE0
    }

    pub fn write_interrupt_flag(&mut self, value: u8) {
        self.if_reg = value & IE_MASK;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            IF_ADDR => return self.read_interrupt_flag(),
            INTERRUPT_ENABLE_REGISTER => return self.ie,
            DMA_ADDR => return 0xFF,
            memory_map::NOT_USABLE_START..=memory_map::NOT_USABLE_END => return 0xFF,
            _ => {}
        }
        for mapping in self.mappings.iter() {
            if mapping.contains(addr) {
                return if mapping.enabled.get() {
                    mapping.device.borrow().read(addr)
                } else {
                    0xFF
                };
            }
        }
        0xFF
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            IF_ADDR => {
                self.write_interrupt_flag(value);
                return;
            }
            INTERRUPT_ENABLE_REGISTER => {
                self.ie = value & IE_MASK;
                return;
            }
            DMA_ADDR => {
                self.start_dma(value);
                return;
            }
            memory_map::NOT_USABLE_START..=memory_map::NOT_USABLE_END => return,
            _ => {}
        }
        for mapping in self.mappings.iter() {
            if mapping.contains(addr) && mapping.enabled.get() {
                mapping.device.borrow_mut().write(addr, value);
                return;
            }
        }
    }

    /// Dispatches ignoring DMA gating. Used by the DMA engine to fetch its
    /// source bytes, which bypass the very gate the DMA they belong to
    /// enforces on every other reader.
    fn raw_read(&self, addr: u16) -> u8 {
        for mapping in self.mappings.iter() {
            if mapping.contains(addr) {
                return mapping.device.borrow().read(addr);
            }
        }
        0xFF
    }

    fn start_dma(&mut self, source_high_byte: u8) {
        self.dma_source_base = (source_high_byte as u16) << 8;
        self.dma_remaining = OAM_DMA_BYTES;
        self.dma_gate.set(false);
    }

    /// Advances the OAM DMA countdown by one CPU step's worth of T-cycles,
    /// copying one source byte into OAM per elapsed machine cycle, exactly
    /// as hardware copies the 160 bytes over 160 M-cycles.
    pub fn step_dma(&mut self, cycles: u8) {
        if self.dma_remaining == 0 {
            return;
        }
        for _ in 0..(cycles / 4) {
            if self.dma_remaining == 0 {
                break;
            }
            let index = OAM_DMA_BYTES - self.dma_remaining;
            let byte = self.raw_read(self.dma_source_base.wrapping_add(index));
            self.ppu.borrow_mut().dma_write_oam_byte(index as usize, byte);
            self.dma_remaining -= 1;
            if self.dma_remaining == 0 {
                self.dma_gate.set(true);
            }
        }
    }

    pub fn dma_in_progress(&self) -> bool {
        self.dma_remaining > 0
    }
}

impl InterruptSink for Bus {
    fn request(&mut self, bit: u8) {
        self.if_reg |= 1 << bit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;

    fn test_bus() -> Bus {
        let rom = vec![0u8; 0x8000];
        Bus::new(Cartridge::load(&rom).unwrap())
    }

    #[test]
    fn wram_round_trips_through_dispatch() {
        let mut bus = test_bus();
        bus.write(0xC010, 0x42);
        assert_eq!(bus.read(0xC010), 0x42);
        assert_eq!(bus.read(0xE010), 0x42); // echo mirror
    }

    #[test]
    fn hram_stays_reachable_during_dma_but_wram_does_not() {
        let mut bus = test_bus();
        bus.write(0xC000, 0xAB);
        bus.write(memory_map::DMA_ADDR, 0xC0); // source 0xC000
        assert!(bus.dma_in_progress());
        assert_eq!(bus.read(0xC000), 0xFF); // gated out mid-transfer
        bus.write(0xFF80, 0x77);
        assert_eq!(bus.read(0xFF80), 0x77); // HRAM never gated

        bus.step_dma(160 * 4);
        assert!(!bus.dma_in_progress());
        assert_eq!(bus.read(0xC000), 0xAB); // gate lifted afterwards
    }

    #[test]
    fn dma_copies_source_bytes_into_oam() {
        let mut bus = test_bus();
        for i in 0..160u16 {
            bus.write(0xC000 + i, i as u8);
        }
        bus.write(memory_map::DMA_ADDR, 0xC0);
        bus.step_dma(160 * 4);
        let ppu = bus.ppu();
        assert_eq!(ppu.borrow().read(memory_map::OAM_START + 5), 5);
    }

    #[test]
    fn if_and_ie_are_fast_path_fields_not_devices() {
        let mut bus = test_bus();
        bus.write(memory_map::IF_ADDR, 0x1F);
        assert_eq!(bus.read(memory_map::IF_ADDR), 0xFF);
        bus.write(memory_map::INTERRUPT_ENABLE_REGISTER, 0xFF);
        assert_eq!(bus.read(memory_map::INTERRUPT_ENABLE_REGISTER), 0x1F);
    }
}
