use std::path::PathBuf;

/// Errors raised while constructing or loading a cartridge.
#[derive(Debug, thiserror::Error)]
pub enum CartridgeError {
    #[error("cartridge type byte 0x{cart_type:02X} selects an unimplemented mapper")]
    UnimplementedMapper { cart_type: u8 },

    #[error("malformed ROM: {reason}")]
    MalformedRom { reason: String },
}

/// Errors raised while the CPU decodes or executes an instruction.
#[derive(Debug, thiserror::Error)]
pub enum CpuError {
    #[error("invalid opcode 0x{opcode:02X} at PC=0x{pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
}

/// Union error type returned by `System::step`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Cpu(#[from] CpuError),

    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

/// I/O-boundary failures that belong to the frontend, not the core. Kept here
/// only so a frontend binary has a single error type to bubble up to `main`.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("could not open ROM '{path}': {source}")]
    RomOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}
