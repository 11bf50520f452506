use clap::Parser;
use pebble::cli::Cli;
use sdl2::ttf::Font;
use std::path::Path;
use std::{env, thread, time::Instant};

mod constants;
mod drawing;
mod emulator;
mod input;
mod sdl_setup;

use emulator::Emulator;

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(&cli);

    let window_title = format!(
        "pebble - {}",
        cli.rom.file_name().unwrap_or_default().to_string_lossy()
    );
    let mut sdl_context = sdl_setup::init_sdl(&window_title)?;

    let font_path_str = env::var("GB_DEBUG_FONT_PATH").unwrap_or_else(|_| constants::DEFAULT_FONT_PATH.to_string());
    let font_path = Path::new(&font_path_str);
    let font: Option<Font> = if cli.debug {
        match sdl_context.ttf_context.load_font(font_path, constants::DEBUG_FONT_SIZE) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("could not load debug font '{font_path_str}': {e} (debug overlay text disabled)");
                None
            }
        }
    } else {
        None
    };

    let mut emulator = Emulator::new(&cli.rom, cli.paused, cli.debug).map_err(|e| e.to_string())?;

    let gb_screen_x = 0;
    let gb_screen_y = 0;
    let disasm_pane_x = (constants::GB_SCREEN_WIDTH + constants::PADDING) as i32;
    let disasm_pane_y = 0;
    let far_right_pane_x = disasm_pane_x + constants::DISASM_AREA_WIDTH as i32 + constants::PADDING as i32;
    let vram_view_y = 0;
    let input_view_y = constants::VRAM_VIEW_HEIGHT as i32 + constants::PADDING as i32;

    let mut p_key_pressed_last_frame = false;
    let mut n_key_pressed_last_frame = false;

    log::info!("entering main loop");
    'main_loop: loop {
        let frame_start_time = Instant::now();

        if input::handle_input(&mut sdl_context.event_pump, &mut emulator.system) {
            break 'main_loop;
        }

        let keyboard_state = sdl_context.event_pump.keyboard_state();
        let p_key_currently_pressed = keyboard_state.is_scancode_pressed(sdl2::keyboard::Scancode::P);
        let n_key_currently_pressed = keyboard_state.is_scancode_pressed(sdl2::keyboard::Scancode::N);

        let mut step_executed_this_iteration = false;

        if p_key_currently_pressed && !p_key_pressed_last_frame {
            emulator.toggle_stepping();
        }
        if emulator.stepping && n_key_currently_pressed && !n_key_pressed_last_frame {
            if let Err(e) = emulator.step_instruction() {
                log::error!("step error: {e}");
            }
            step_executed_this_iteration = true;
        }
        p_key_pressed_last_frame = p_key_currently_pressed;
        n_key_pressed_last_frame = n_key_currently_pressed;

        if !emulator.stepping {
            if let Err(e) = emulator.run_frame() {
                log::error!("emulation error: {e}");
                break 'main_loop;
            }
        }

        sdl_context.canvas.set_draw_color(constants::DEBUG_BACKGROUND_COLOR);
        sdl_context.canvas.clear();

        drawing::draw_gb_screen(
            &mut sdl_context.canvas,
            &emulator.system.framebuffer(),
            gb_screen_x,
            gb_screen_y,
        );

        if emulator.system.debug_overlay_enabled() {
            if let Some(font) = font.as_ref() {
                if let Err(e) = drawing::draw_disassembly_debug(
                    &mut sdl_context.canvas,
                    &sdl_context.texture_creator,
                    font,
                    &emulator.system,
                    disasm_pane_x,
                    disasm_pane_y,
                ) {
                    log::warn!("error drawing disassembly: {e}");
                }
            }

            drawing::draw_vram_debug(
                &mut sdl_context.canvas,
                &emulator.system.vram_debug_buffer(),
                far_right_pane_x,
                vram_view_y,
            );

            drawing::draw_input_debug(
                &mut sdl_context.canvas,
                &emulator.system.joypad_state(),
                far_right_pane_x,
                input_view_y,
            );
        }

        sdl_context.canvas.present();

        if !emulator.stepping {
            let elapsed_time = frame_start_time.elapsed();
            if elapsed_time < constants::TARGET_FRAME_DURATION {
                let remaining = constants::TARGET_FRAME_DURATION - elapsed_time;
                thread::sleep(remaining);
            }
        } else if !step_executed_this_iteration {
            thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    log::info!("emulator stopped");
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Some(path) = &cli.log_file {
        match std::fs::File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("could not open log file '{}': {e}, logging to stderr", path.display());
            }
        }
    }
    builder.init();
}
