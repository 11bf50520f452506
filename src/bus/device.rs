/// A unit the bus can dispatch a 16-bit address to. Implementors decide for
/// themselves how to interpret an address within their mapped range(s); the
/// bus itself only knows the range, not the semantics.
pub trait Device {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
}
