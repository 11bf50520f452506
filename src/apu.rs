//! Sound register shell. Actual synthesis is an external collaborator's
//! concern; this module only stores the NR1x-NR5x registers and wave RAM so
//! that CPU reads/writes to the sound range behave like real hardware
//! registers, and exposes [`Apu::fill_audio`] as the seam a synth
//! collaborator hooks into.

use crate::bus::Device;
use crate::memory_map;
use serde::{Deserialize, Serialize};

const WAVE_RAM_SIZE: usize = (memory_map::WAVE_PATTERN_RAM_END - memory_map::WAVE_PATTERN_RAM_START + 1) as usize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApuSnapshot {
    registers: Vec<u8>,
    wave_ram: Vec<u8>,
}

#[derive(Debug)]
pub struct Apu {
    registers: [u8; 0x17], // FF10-FF26
    wave_ram: [u8; WAVE_RAM_SIZE],
}

impl Apu {
    pub fn new() -> Self {
        Apu {
            registers: [0u8; 0x17],
            wave_ram: [0u8; WAVE_RAM_SIZE],
        }
    }

    /// Invoked by an audio-thread collaborator to fill an output buffer.
    /// The core has no synthesis of its own, so this silences the buffer;
    /// a real implementation reads `self`'s registers to generate PCM.
    pub fn fill_audio(&self, out_samples: &mut [i16]) {
        out_samples.fill(0);
    }

    pub fn snapshot(&self) -> ApuSnapshot {
        ApuSnapshot {
            registers: self.registers.to_vec(),
            wave_ram: self.wave_ram.to_vec(),
        }
    }

    pub fn restore(&mut self, snapshot: &ApuSnapshot) {
        self.registers.copy_from_slice(&snapshot.registers);
        self.wave_ram.copy_from_slice(&snapshot.wave_ram);
    }
}

impl Device for Apu {
    fn read(&self, addr: u16) -> u8 {
        if (memory_map::WAVE_PATTERN_RAM_START..=memory_map::WAVE_PATTERN_RAM_END).contains(&addr) {
            self.wave_ram[(addr - memory_map::WAVE_PATTERN_RAM_START) as usize]
        } else if (memory_map::NR10_ADDR..=memory_map::NR52_ADDR).contains(&addr) {
            self.registers[(addr - memory_map::NR10_ADDR) as usize]
        } else {
            0xFF
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if (memory_map::WAVE_PATTERN_RAM_START..=memory_map::WAVE_PATTERN_RAM_END).contains(&addr) {
            self.wave_ram[(addr - memory_map::WAVE_PATTERN_RAM_START) as usize] = value;
        } else if (memory_map::NR10_ADDR..=memory_map::NR52_ADDR).contains(&addr) {
            self.registers[(addr - memory_map::NR10_ADDR) as usize] = value;
        }
    }
}
