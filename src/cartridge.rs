//! Cartridge: immutable ROM bytes, sized RAM, and the active mapper.

use crate::bus::Device;
use crate::error::CartridgeError;
use crate::mbc::{self, Mbc};
use serde::{Deserialize, Serialize};

const CART_TYPE_ADDR: usize = 0x147;
const ROM_SIZE_ADDR: usize = 0x148;
const RAM_SIZE_ADDR: usize = 0x149;
const TITLE_START: usize = 0x134;
const TITLE_END: usize = 0x143;

#[derive(Debug)]
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mapper: Box<dyn Mbc>,
    title: String,
}

impl Cartridge {
    pub fn load(rom_data: &[u8]) -> Result<Self, CartridgeError> {
        if rom_data.len() <= RAM_SIZE_ADDR {
            return Err(CartridgeError::MalformedRom {
                reason: format!(
                    "ROM is only {} bytes, too small to contain a header",
                    rom_data.len()
                ),
            });
        }

        let cart_type = rom_data[CART_TYPE_ADDR];
        let mapper = mbc::from_header_byte(cart_type)?;

        let rom_size_code = rom_data[ROM_SIZE_ADDR];
        let expected_rom_size = 0x8000usize << rom_size_code;
        if rom_data.len() < expected_rom_size {
            log::warn!(
                "ROM header claims {} bytes but file is {} bytes; proceeding with the shorter length",
                expected_rom_size,
                rom_data.len()
            );
        }

        let ram_size_code = rom_data[RAM_SIZE_ADDR];
        let ram_size = match ram_size_code {
            0x00 => 0,
            0x01 => 2 * 1024,
            0x02 => 8 * 1024,
            0x03 => 32 * 1024,
            0x04 => 128 * 1024,
            0x05 => 64 * 1024,
            other => {
                return Err(CartridgeError::MalformedRom {
                    reason: format!("unrecognized RAM size code 0x{other:02X} at 0x149"),
                });
            }
        };

        let title_bytes = &rom_data[TITLE_START..=TITLE_END];
        let title = String::from_utf8_lossy(title_bytes)
            .trim_end_matches('\0')
            .to_string();

        log::info!(
            "loaded cartridge '{}': type=0x{cart_type:02X}, rom={} bytes, ram={} bytes",
            title,
            rom_data.len(),
            ram_size
        );

        Ok(Cartridge {
            rom: rom_data.to_vec(),
            ram: vec![0u8; ram_size],
            mapper,
            title,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// ROM is immutable after load, so only cartridge RAM and the mapper's
    /// bank-control registers need to round-trip through a save state.
    pub fn snapshot(&self) -> CartridgeSnapshot {
        CartridgeSnapshot {
            ram: self.ram.clone(),
            mapper: self.mapper.snapshot(),
        }
    }

    pub fn restore(&mut self, snapshot: &CartridgeSnapshot) {
        self.ram.copy_from_slice(&snapshot.ram);
        self.mapper.restore(&snapshot.mapper);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartridgeSnapshot {
    ram: Vec<u8>,
    mapper: Vec<u8>,
}

/// Dispatched twice into the bus's mapping table: once for 0000-7FFF (ROM)
/// and once for A000-BFFF (RAM), both delegating into the mapper.
impl Device for Cartridge {
    fn read(&self, addr: u16) -> u8 {
        if addr < 0xA000 {
            self.mapper.read_rom(&self.rom, addr)
        } else {
            self.mapper.read_ram(&self.ram, addr)
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr < 0xA000 {
            self.mapper.write_control(addr, value);
        } else {
            self.mapper.write_ram(&mut self.ram, addr, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rom(cart_type: u8, rom_size_code: u8, ram_size_code: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[CART_TYPE_ADDR] = cart_type;
        rom[ROM_SIZE_ADDR] = rom_size_code;
        rom[RAM_SIZE_ADDR] = ram_size_code;
        rom
    }

    #[test]
    fn loads_no_mbc_rom() {
        let rom = minimal_rom(0x00, 0x00, 0x00);
        let cart = Cartridge::load(&rom).unwrap();
        assert_eq!(cart.ram.len(), 0);
    }

    #[test]
    fn rejects_unknown_mapper() {
        let rom = minimal_rom(0xFF, 0x00, 0x00);
        assert!(matches!(
            Cartridge::load(&rom),
            Err(CartridgeError::UnimplementedMapper { .. })
        ));
    }

    #[test]
    fn rejects_bad_ram_size_code() {
        let rom = minimal_rom(0x00, 0x00, 0xFF);
        assert!(matches!(
            Cartridge::load(&rom),
            Err(CartridgeError::MalformedRom { .. })
        ));
    }

    #[test]
    fn rejects_truncated_rom() {
        let rom = vec![0u8; 0x10];
        assert!(matches!(
            Cartridge::load(&rom),
            Err(CartridgeError::MalformedRom { .. })
        ));
    }
}
