use super::Mbc;
use std::cell::Cell;

/// Placeholder for MBC3/MBC5: the cartridge-type byte is recognized at
/// construction so ROMs using these mappers load instead of being rejected,
/// but bank switching and cartridge RAM are not emulated (MBC3's RTC is an
/// explicit non-goal; MBC5's larger bank range is simply unimplemented).
/// Acts as a fixed bank-0/bank-1 passthrough and logs once on first use.
#[derive(Debug)]
pub struct StubMbc {
    name: &'static str,
    warned: Cell<bool>,
}

impl StubMbc {
    pub fn new(name: &'static str) -> Self {
        StubMbc {
            name,
            warned: Cell::new(false),
        }
    }

    fn warn_once(&self) {
        if !self.warned.get() {
            log::warn!(
                "{} cartridge loaded, but this mapper is stubbed: bank switching and RAM are unimplemented",
                self.name
            );
            self.warned.set(true);
        }
    }
}

impl Mbc for StubMbc {
    fn read_rom(&self, rom: &[u8], addr: u16) -> u8 {
        self.warn_once();
        // Fixed bank 0 / bank 1 view; no bank register is honored.
        rom.get(addr as usize).copied().unwrap_or(0xFF)
    }

    fn write_control(&mut self, _addr: u16, _value: u8) {
        self.warn_once();
    }

    fn read_ram(&self, _ram: &[u8], _addr: u16) -> u8 {
        self.warn_once();
        0xFF
    }

    fn write_ram(&mut self, _ram: &mut [u8], _addr: u16, _value: u8) {
        self.warn_once();
    }
}
