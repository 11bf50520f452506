use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::ttf::Font;
use sdl2::video::{Window, WindowContext};

use crate::constants;
use pebble::System;
use pebble::joypad::JoypadState;
use pebble::ppu;

const PALETTE: [Color; 4] = constants::PALETTE;
const DEBUG_PALETTE: [Color; 4] = constants::DEBUG_PALETTE;

/// Renders a line of text to the canvas.
pub fn render_text(
    canvas: &mut Canvas<Window>,
    texture_creator: &TextureCreator<WindowContext>,
    font: &Font,
    text: &str,
    x: i32,
    y: i32,
    color: Color,
) -> Result<(), String> {
    if text.is_empty() {
        return Ok(());
    }
    let surface = font.render(text).blended(color).map_err(|e| e.to_string())?;
    let texture = texture_creator
        .create_texture_from_surface(&surface)
        .map_err(|e| e.to_string())?;

    let query = texture.query();
    let rect = Rect::new(x, y, query.width, query.height);
    canvas.copy(&texture, None, Some(rect))?;
    Ok(())
}

/// Draws the main Game Boy screen content.
pub fn draw_gb_screen(canvas: &mut Canvas<Window>, frame_buffer: &[u8], target_x: i32, target_y: i32) {
    let expected_len = ppu::GB_WIDTH * ppu::GB_HEIGHT;
    if frame_buffer.len() != expected_len {
        log::warn!(
            "frame buffer size mismatch: expected {expected_len}, got {}",
            frame_buffer.len()
        );
        return;
    }
    for y in 0..ppu::GB_HEIGHT {
        for x in 0..ppu::GB_WIDTH {
            let index = y * ppu::GB_WIDTH + x;
            let shade_index = frame_buffer.get(index).copied().unwrap_or(0) % 4;
            let color = PALETTE[shade_index as usize];

            canvas.set_draw_color(color);
            let rect = Rect::new(
                target_x + (x as u32 * constants::GB_SCALE_FACTOR) as i32,
                target_y + (y as u32 * constants::GB_SCALE_FACTOR) as i32,
                constants::GB_SCALE_FACTOR,
                constants::GB_SCALE_FACTOR,
            );
            canvas
                .fill_rect(rect)
                .unwrap_or_else(|e| log::warn!("failed to draw GB pixel: {e}"));
        }
    }
}

/// Draws the VRAM tile data debug view.
pub fn draw_vram_debug(canvas: &mut Canvas<Window>, vram_buffer: &[u8], target_x: i32, target_y: i32) {
    let expected_len = ppu::VRAM_DEBUG_WIDTH * ppu::VRAM_DEBUG_HEIGHT;
    if vram_buffer.len() != expected_len {
        log::warn!(
            "VRAM debug buffer size mismatch: expected {expected_len}, got {}",
            vram_buffer.len()
        );
        return;
    }

    for y in 0..ppu::VRAM_DEBUG_HEIGHT {
        for x in 0..ppu::VRAM_DEBUG_WIDTH {
            let index = y * ppu::VRAM_DEBUG_WIDTH + x;
            let shade_index = vram_buffer.get(index).copied().unwrap_or(0) % 4;
            let color = DEBUG_PALETTE[shade_index as usize];

            canvas.set_draw_color(color);
            let rect = Rect::new(
                target_x + (x as u32 * constants::VRAM_DEBUG_SCALE_FACTOR) as i32,
                target_y + (y as u32 * constants::VRAM_DEBUG_SCALE_FACTOR) as i32,
                constants::VRAM_DEBUG_SCALE_FACTOR,
                constants::VRAM_DEBUG_SCALE_FACTOR,
            );
            canvas
                .fill_rect(rect)
                .unwrap_or_else(|e| log::warn!("failed to draw VRAM pixel: {e}"));
        }
    }
}

/// Draws the joypad input state indicators.
pub fn draw_input_debug(canvas: &mut Canvas<Window>, joypad_state: &JoypadState, target_x: i32, target_y: i32) {
    let mut draw_indicator = |is_pressed: bool, x_offset: i32, y_offset: i32| {
        let color = if is_pressed {
            constants::DEBUG_INPUT_PRESSED_COLOR
        } else {
            constants::DEBUG_INPUT_RELEASED_COLOR
        };
        canvas.set_draw_color(color);
        let rect = Rect::new(
            target_x + x_offset,
            target_y + y_offset,
            constants::DEBUG_INPUT_BOX_SIZE,
            constants::DEBUG_INPUT_BOX_SIZE,
        );
        canvas
            .fill_rect(rect)
            .unwrap_or_else(|e| log::warn!("failed to draw input indicator: {e}"));
    };

    let pad_step = (constants::DEBUG_INPUT_BOX_SIZE + constants::DEBUG_INPUT_PADDING) as i32;
    let dpad_center_x = pad_step;
    let dpad_center_y = pad_step;

    draw_indicator(joypad_state.up, dpad_center_x, dpad_center_y - pad_step);
    draw_indicator(joypad_state.down, dpad_center_x, dpad_center_y + pad_step);
    draw_indicator(joypad_state.left, dpad_center_x - pad_step, dpad_center_y);
    draw_indicator(joypad_state.right, dpad_center_x + pad_step, dpad_center_y);

    let action_start_x = constants::DPAD_AREA_WIDTH as i32 + constants::PADDING as i32;
    let action_y1 = 0;
    let action_y2 = pad_step;
    draw_indicator(joypad_state.b, action_start_x, action_y1);
    draw_indicator(joypad_state.a, action_start_x + pad_step, action_y1);
    draw_indicator(joypad_state.select, action_start_x, action_y2);
    draw_indicator(joypad_state.start, action_start_x + pad_step, action_y2);
}

/// Draws the CPU disassembly debug view, keeping PC roughly centered. Walking
/// backwards from PC is a best-effort guess: it tries 1-3 byte steps back and
/// keeps whichever one re-disassembles to an instruction of that same length.
pub fn draw_disassembly_debug(
    canvas: &mut Canvas<Window>,
    texture_creator: &TextureCreator<WindowContext>,
    font: &Font,
    system: &System,
    target_x: i32,
    target_y: i32,
) -> Result<(), String> {
    let lines_before = constants::DISASM_LINES_BEFORE;
    let lines_after = constants::DISASM_LINES_AFTER;
    let area_width = constants::DISASM_AREA_WIDTH;
    let area_height = constants::DISASM_AREA_HEIGHT;
    let line_height = constants::DISASM_LINE_HEIGHT;

    canvas.set_draw_color(constants::DEBUG_BACKGROUND_COLOR);
    let bg_rect = Rect::new(target_x, target_y, area_width, area_height);
    canvas.fill_rect(bg_rect).map_err(|e| e.to_string())?;

    let current_pc = system.cpu().pc();
    let total_lines = lines_before + 1 + lines_after;
    let mut instructions: Vec<(u16, String)> = Vec::with_capacity(total_lines);

    let mut current_addr = current_pc;
    for _ in 0..=lines_after {
        let (text, len) = system.disassemble(current_addr);
        instructions.push((current_addr, text));
        current_addr = current_addr.wrapping_add(len.max(1) as u16);
        if instructions.len() > total_lines * 2 {
            break;
        }
    }

    let mut start_addr = current_pc;
    let mut backward_instructions = Vec::new();
    for _ in 0..lines_before {
        let mut found_prev = false;
        for offset_guess in (1..=3u16).rev() {
            if let Some(prev_addr_guess) = start_addr.checked_sub(offset_guess) {
                let (_, len_guess) = system.disassemble(prev_addr_guess);
                if len_guess == offset_guess as u8 {
                    start_addr = prev_addr_guess;
                    let (text, _) = system.disassemble(start_addr);
                    backward_instructions.push((start_addr, text));
                    found_prev = true;
                    break;
                }
            }
        }
        if !found_prev {
            break;
        }
    }
    backward_instructions.reverse();
    instructions = [backward_instructions, instructions].concat();

    let mut current_y = target_y;
    let pc_index = instructions.iter().position(|(addr, _)| *addr == current_pc);
    let start_render_idx = pc_index.map(|idx| idx.saturating_sub(lines_before)).unwrap_or(0);

    for (idx, (addr, text)) in instructions.iter().enumerate().skip(start_render_idx) {
        if idx - start_render_idx >= total_lines {
            break;
        }
        let display_text = format!("{addr:04X}: {text}");
        let color = if *addr == current_pc {
            constants::DEBUG_PC_COLOR
        } else {
            constants::DEBUG_TEXT_COLOR
        };
        render_text(canvas, texture_creator, font, &display_text, target_x + 5, current_y, color)?;
        current_y += line_height as i32;
    }

    Ok(())
}
