use pebble::System;
use pebble::error::{CoreError, FrontendError};
use std::fs;
use std::path::Path;

/// Thin wrapper around [`System`] that adds the frontend-only single-step
/// toggle driven by the P/N debug keys in `main`.
pub struct Emulator {
    pub system: System,
    pub stepping: bool,
}

impl Emulator {
    pub fn new(rom_path: &Path, paused: bool, debug: bool) -> Result<Self, FrontendError> {
        log::info!("loading ROM: {}", rom_path.display());
        let rom_data = fs::read(rom_path).map_err(|source| FrontendError::RomOpen {
            path: rom_path.to_path_buf(),
            source,
        })?;
        log::info!("ROM loaded ({} bytes)", rom_data.len());

        let system = System::new(&rom_data, paused, debug)?;
        Ok(Emulator {
            system,
            stepping: false,
        })
    }

    pub fn toggle_stepping(&mut self) {
        self.stepping = !self.stepping;
        log::info!("single-step mode {}", if self.stepping { "enabled" } else { "disabled" });
    }

    pub fn step_instruction(&mut self) -> Result<u32, CoreError> {
        self.system.step()
    }

    pub fn run_frame(&mut self) -> Result<u32, CoreError> {
        self.system.run_frame()
    }
}
