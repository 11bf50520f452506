//! Wires Cpu, Bus and the run configuration together and exposes the full
//! frontend contract as inherent methods, so a binary collaborator only has
//! to call into this one struct. Control flow per step: the CPU executes one
//! instruction (or idles while halted), the Timer/PPU advance by the
//! returned cycle count, and OAM DMA advances alongside them, at per-step
//! granularity so a frontend can single-step for its debug overlay.

use crate::apu::{Apu, ApuSnapshot};
use crate::bus::{Bus, BusSnapshot};
use crate::bus::wram::{Hram, Serial, Wram};
use crate::cartridge::{Cartridge, CartridgeSnapshot};
use crate::cpu::{Cpu, CpuSnapshot};
use crate::error::CoreError;
use crate::joypad::{Button, Joypad, JoypadSnapshot};
use crate::ppu::{Ppu, PpuSnapshot};
use crate::timer::{Timer, TimerSnapshot};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// One Game Boy frame is 70,224 dots (154 scanlines x 456 dots); a T-cycle
/// and a dot are the same unit, so this is also the per-frame T-cycle count.
pub const CYCLES_PER_FRAME: u32 = 70_224;

/// An opaque, serializable, owned snapshot of every piece of mutable core
/// state. ROM bytes are not included — they are supplied again by the
/// frontend when restoring, the same way the ROM is supplied at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    cpu: CpuSnapshot,
    bus: BusSnapshot,
    timer: TimerSnapshot,
    ppu: PpuSnapshot,
    joypad: JoypadSnapshot,
    apu: ApuSnapshot,
    cartridge: CartridgeSnapshot,
    wram: Vec<u8>,
    hram: Vec<u8>,
    serial: (u8, u8),
}

/// Owns the whole emulated machine plus the ambient run configuration
/// (paused-at-start, debug overlay flag) a frontend reads off `Cli`.
pub struct System {
    cpu: Cpu,
    bus: Bus,

    timer: Rc<RefCell<Timer>>,
    ppu: Rc<RefCell<Ppu>>,
    joypad: Rc<RefCell<Joypad>>,
    apu: Rc<RefCell<Apu>>,
    cartridge: Rc<RefCell<Cartridge>>,
    wram: Rc<RefCell<Wram>>,
    hram: Rc<RefCell<Hram>>,
    serial: Rc<RefCell<Serial>>,

    paused: bool,
    debug: bool,
}

impl System {
    /// Builds a fresh machine from raw ROM bytes. Reading the ROM off disk
    /// is a frontend concern; this only needs the bytes.
    pub fn new(rom_data: &[u8], paused: bool, debug: bool) -> Result<Self, CoreError> {
        let cartridge = Cartridge::load(rom_data)?;
        let bus = Bus::new(cartridge);

        Ok(System {
            timer: bus.timer(),
            ppu: bus.ppu(),
            joypad: bus.joypad(),
            apu: bus.apu(),
            cartridge: bus.cartridge(),
            wram: bus.wram(),
            hram: bus.hram(),
            serial: bus.serial(),
            cpu: Cpu::new(),
            bus,
            paused,
            debug,
        })
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn debug_overlay_enabled(&self) -> bool {
        self.debug
    }

    pub fn set_debug_overlay(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs one CPU instruction (or one idle tick while halted/stopped) and
    /// advances every cycle-driven peripheral by the same amount. Returns the
    /// number of T-cycles elapsed.
    pub fn step(&mut self) -> Result<u32, CoreError> {
        let cycles = self.cpu.step(&mut self.bus)? as u32;

        self.timer.borrow_mut().step(cycles as u8, &mut self.bus);
        self.ppu.borrow_mut().step(cycles, &mut self.bus);
        self.bus.step_dma(cycles as u8);

        Ok(cycles)
    }

    /// Convenience for a frontend that wants whole-frame granularity: steps
    /// until the PPU reports a completed frame or the step budget is spent
    /// (the budget guards against a stuck CPU never reaching V-blank, e.g.
    /// mid-HALT with interrupts disabled).
    pub fn run_frame(&mut self) -> Result<u32, CoreError> {
        let mut total = 0u32;
        while total < CYCLES_PER_FRAME * 2 {
            total += self.step()?;
            if self.frame_ready() {
                break;
            }
        }
        Ok(total)
    }

    /// True exactly once per completed frame; consumes the flag, matching
    /// `Ppu::take_frame_ready`.
    pub fn frame_ready(&mut self) -> bool {
        self.ppu.borrow_mut().take_frame_ready()
    }

    pub fn framebuffer(&self) -> Vec<u8> {
        self.ppu.borrow().frame_buffer().to_vec()
    }

    pub fn vram_debug_buffer(&mut self) -> Vec<u8> {
        self.ppu.borrow_mut().render_vram_debug();
        self.ppu.borrow().vram_debug_buffer().to_vec()
    }

    pub fn joypad_state(&self) -> crate::joypad::JoypadState {
        self.joypad.borrow().state()
    }

    pub fn press(&mut self, button: Button) {
        self.joypad.borrow_mut().press(button, &mut self.bus);
    }

    pub fn release(&mut self, button: Button) {
        self.joypad.borrow_mut().release(button, &mut self.bus);
    }

    /// Invoked by an audio-thread collaborator; the core APU has no
    /// synthesis of its own, so this currently silences the buffer by
    /// delegating straight to `Apu::fill_audio`.
    pub fn fill_audio(&self, out_samples: &mut [i16]) {
        self.apu.borrow().fill_audio(out_samples);
    }

    pub fn disassemble(&self, address: u16) -> (String, u8) {
        self.cpu.disassemble_instruction(address, &self.bus)
    }

    /// Captures every piece of mutable state into an owned, `Clone`-able,
    /// serializable struct. `load(save(s)).step()` behaves identically to
    /// `s.step()`.
    pub fn save_state(&self) -> SaveState {
        SaveState {
            cpu: self.cpu.snapshot(),
            bus: self.bus.snapshot(),
            timer: self.timer.borrow().snapshot(),
            ppu: self.ppu.borrow().snapshot(),
            joypad: self.joypad.borrow().snapshot(),
            apu: self.apu.borrow().snapshot(),
            cartridge: self.cartridge.borrow().snapshot(),
            wram: self.wram.borrow().snapshot(),
            hram: self.hram.borrow().snapshot(),
            serial: self.serial.borrow().snapshot(),
        }
    }

    pub fn restore_state(&mut self, state: &SaveState) {
        self.cpu.restore(&state.cpu);
        self.bus.restore(&state.bus);
        self.timer.borrow_mut().restore(&state.timer);
        self.ppu.borrow_mut().restore(&state.ppu);
        self.joypad.borrow_mut().restore(&state.joypad);
        self.apu.borrow_mut().restore(&state.apu);
        self.cartridge.borrow_mut().restore(&state.cartridge);
        self.wram.borrow_mut().restore(&state.wram);
        self.hram.borrow_mut().restore(&state.hram);
        self.serial.borrow_mut().restore(state.serial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rom() -> Vec<u8> {
        vec![0u8; 0x8000]
    }

    #[test]
    fn constructs_from_raw_rom_bytes() {
        let system = System::new(&minimal_rom(), false, false).unwrap();
        assert_eq!(system.cpu().pc(), 0x0100);
    }

    #[test]
    fn step_advances_pc_and_reports_cycles() {
        let mut system = System::new(&minimal_rom(), false, false).unwrap();
        let pc_before = system.cpu().pc();
        let cycles = system.step().unwrap();
        assert!(cycles > 0);
        assert_ne!(system.cpu().pc(), pc_before);
    }

    #[test]
    fn save_and_restore_round_trips_cpu_state() {
        let mut system = System::new(&minimal_rom(), false, false).unwrap();
        system.step().unwrap();
        let saved = system.save_state();
        let pc_after_one_step = system.cpu().pc();

        system.step().unwrap();
        assert_ne!(system.cpu().pc(), pc_after_one_step);

        system.restore_state(&saved);
        assert_eq!(system.cpu().pc(), pc_after_one_step);
    }

    #[test]
    fn save_state_round_trips_through_serde() {
        let system = System::new(&minimal_rom(), false, false).unwrap();
        let saved = system.save_state();
        let json = serde_json::to_string(&saved).unwrap();
        let reloaded: SaveState = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.cpu.pc, saved.cpu.pc);
    }

    #[test]
    fn press_and_release_update_joypad_state() {
        let mut system = System::new(&minimal_rom(), false, false).unwrap();
        system.press(Button::A);
        assert!(system.joypad_state().a);
        system.release(Button::A);
        assert!(!system.joypad_state().a);
    }
}
