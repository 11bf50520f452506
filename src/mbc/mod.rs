//! Cartridge bank-controller family: translates CPU-visible ROM/RAM addresses
//! into offsets within the underlying ROM/RAM byte arrays and interprets
//! writes to the ROM address range as bank-control writes.

mod mbc1;
mod mbc2;
mod none;
mod stub;

pub use mbc1::Mbc1;
pub use mbc2::Mbc2;
pub use none::NoMbc;
pub use stub::StubMbc;

use crate::error::CartridgeError;

/// Mapper variant selected by the cartridge header's type byte (0x147).
pub trait Mbc: std::fmt::Debug {
    /// CPU read from 0000-7FFF.
    fn read_rom(&self, rom: &[u8], addr: u16) -> u8;

    /// CPU write to 0000-7FFF: a bank-control register write, not a ROM write.
    fn write_control(&mut self, addr: u16, value: u8);

    /// CPU read from A000-BFFF.
    fn read_ram(&self, ram: &[u8], addr: u16) -> u8;

    /// CPU write to A000-BFFF.
    fn write_ram(&mut self, ram: &mut [u8], addr: u16, value: u8);

    /// Opaque bytes capturing this mapper's bank/enable registers, for
    /// save-state round-tripping. Mappers with no registers (`NoMbc`,
    /// `StubMbc`) accept the default empty snapshot.
    fn snapshot(&self) -> Vec<u8> {
        Vec::new()
    }

    fn restore(&mut self, _bytes: &[u8]) {}
}

/// Builds the mapper implied by a cartridge-type header byte (0x147).
///
/// MBC3/MBC5 are recognized (so loading such a ROM doesn't get misclassified)
/// but their bank/RAM operations are stubbed per this core's non-goals.
pub fn from_header_byte(cart_type: u8) -> Result<Box<dyn Mbc>, CartridgeError> {
    match cart_type {
        0x00 | 0x08 | 0x09 => Ok(Box::new(NoMbc)),
        0x01..=0x03 => Ok(Box::new(Mbc1::new())),
        0x05 | 0x06 => Ok(Box::new(Mbc2::new())),
        0x0F..=0x13 => Ok(Box::new(StubMbc::new("MBC3"))),
        0x19..=0x1E => Ok(Box::new(StubMbc::new("MBC5"))),
        other => Err(CartridgeError::UnimplementedMapper { cart_type: other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_no_mbc() {
        assert!(from_header_byte(0x00).is_ok());
    }

    #[test]
    fn recognizes_mbc1() {
        assert!(from_header_byte(0x01).is_ok());
    }

    #[test]
    fn recognizes_mbc2() {
        assert!(from_header_byte(0x05).is_ok());
    }

    #[test]
    fn recognizes_mbc3_and_mbc5_as_stubs() {
        assert!(from_header_byte(0x11).is_ok());
        assert!(from_header_byte(0x1A).is_ok());
    }

    #[test]
    fn rejects_unknown_cart_type() {
        assert!(matches!(
            from_header_byte(0xFC),
            Err(CartridgeError::UnimplementedMapper { cart_type: 0xFC })
        ));
    }
}
