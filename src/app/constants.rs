use sdl2::pixels::Color;
use std::time::Duration;

pub use pebble::ppu::{
    GB_HEIGHT, GB_WIDTH, VRAM_DEBUG_HEIGHT as PPU_VRAM_DEBUG_NATIVE_HEIGHT,
    VRAM_DEBUG_WIDTH as PPU_VRAM_DEBUG_NATIVE_WIDTH,
};

const fn const_max_u32(a: u32, b: u32) -> u32 {
    if a > b { a } else { b }
}

// --- Timing ---
pub const TARGET_FPS: u32 = 60;
pub const TARGET_FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000u64 / TARGET_FPS as u64);

// --- Screen & scaling ---
pub const GB_SCALE_FACTOR: u32 = 3;
pub const GB_SCREEN_WIDTH: u32 = GB_WIDTH as u32 * GB_SCALE_FACTOR;
pub const GB_SCREEN_HEIGHT: u32 = GB_HEIGHT as u32 * GB_SCALE_FACTOR;

// --- VRAM debug view ---
pub const VRAM_DEBUG_SCALE_FACTOR: u32 = 2;
pub const VRAM_VIEW_WIDTH: u32 = PPU_VRAM_DEBUG_NATIVE_WIDTH as u32 * VRAM_DEBUG_SCALE_FACTOR;
pub const VRAM_VIEW_HEIGHT: u32 = PPU_VRAM_DEBUG_NATIVE_HEIGHT as u32 * VRAM_DEBUG_SCALE_FACTOR;

// --- General debug UI ---
pub const PADDING: u32 = 10;
pub const DEBUG_BACKGROUND_COLOR: Color = Color::RGB(30, 30, 30);

// --- Input debug ---
pub const DEBUG_INPUT_BOX_SIZE: u32 = 15;
pub const DEBUG_INPUT_PADDING: u32 = 4;
pub const DEBUG_INPUT_PRESSED_COLOR: Color = Color::RGB(50, 205, 50);
pub const DEBUG_INPUT_RELEASED_COLOR: Color = Color::RGB(70, 70, 70);
pub const DPAD_AREA_WIDTH: u32 = DEBUG_INPUT_BOX_SIZE * 3 + DEBUG_INPUT_PADDING * 2;
pub const DPAD_AREA_HEIGHT: u32 = DEBUG_INPUT_BOX_SIZE * 3 + DEBUG_INPUT_PADDING * 2;
pub const BUTTONS_AREA_WIDTH: u32 = DEBUG_INPUT_BOX_SIZE * 2 + DEBUG_INPUT_PADDING;
pub const BUTTONS_AREA_HEIGHT: u32 = DEBUG_INPUT_BOX_SIZE * 2 + DEBUG_INPUT_PADDING;
pub const INPUT_DEBUG_AREA_WIDTH: u32 = DPAD_AREA_WIDTH + PADDING + BUTTONS_AREA_WIDTH;
pub const INPUT_DEBUG_AREA_HEIGHT: u32 = const_max_u32(DPAD_AREA_HEIGHT, BUTTONS_AREA_HEIGHT);

// --- Disassembly debug ---
// Relative to the current working directory; overridable with `GB_DEBUG_FONT_PATH`.
pub const DEFAULT_FONT_PATH: &str = "assets/Roboto-Regular.ttf";
pub const DEBUG_FONT_SIZE: u16 = 14;
pub const DISASM_LINES_BEFORE: usize = 5;
pub const DISASM_LINES_AFTER: usize = 10;
pub const DISASM_TOTAL_LINES: usize = DISASM_LINES_BEFORE + 1 + DISASM_LINES_AFTER;
pub const DISASM_LINE_HEIGHT: u32 = (DEBUG_FONT_SIZE + 4) as u32;
pub const DISASM_AREA_WIDTH: u32 = 350;
pub const DISASM_AREA_HEIGHT: u32 = DISASM_LINE_HEIGHT * DISASM_TOTAL_LINES as u32;
pub const DEBUG_PC_COLOR: Color = Color::RGB(255, 255, 0);
pub const DEBUG_TEXT_COLOR: Color = Color::RGB(220, 220, 220);

// --- Palettes ---
pub const PALETTE: [Color; 4] = [
    Color::RGB(0x9B, 0xBC, 0x0F),
    Color::RGB(0x8B, 0xAC, 0x0F),
    Color::RGB(0x30, 0x62, 0x30),
    Color::RGB(0x0F, 0x38, 0x0F),
];
pub const DEBUG_PALETTE: [Color; 4] = [
    Color::RGB(0xFF, 0xFF, 0xFF),
    Color::RGB(0xAA, 0xAA, 0xAA),
    Color::RGB(0x55, 0x55, 0x55),
    Color::RGB(0x00, 0x00, 0x00),
];

/// Total window size needed to fit the GB screen, disassembly pane and the
/// stacked VRAM/input debug panes side by side.
pub fn calculate_window_dims() -> (u32, u32) {
    let col1_width = GB_SCREEN_WIDTH;
    let col2_width = DISASM_AREA_WIDTH;
    let col3_width = std::cmp::max(VRAM_VIEW_WIDTH, INPUT_DEBUG_AREA_WIDTH);
    let total_width = col1_width + PADDING + col2_width + PADDING + col3_width;

    let col1_height = GB_SCREEN_HEIGHT;
    let col2_height = DISASM_AREA_HEIGHT;
    let col3_height = VRAM_VIEW_HEIGHT + PADDING + INPUT_DEBUG_AREA_HEIGHT;
    let total_height = col1_height.max(col2_height).max(col3_height);

    (total_width, total_height)
}
