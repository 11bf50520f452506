use crate::constants;
use sdl2::Sdl;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::ttf::Sdl2TtfContext;
use sdl2::video::{Window, WindowContext};

pub struct SdlContext {
    pub sdl: Sdl,
    pub ttf_context: Sdl2TtfContext,
    pub canvas: Canvas<Window>,
    pub texture_creator: TextureCreator<WindowContext>,
    pub event_pump: sdl2::EventPump,
}

pub fn init_sdl(window_title: &str) -> Result<SdlContext, String> {
    log::debug!("initializing SDL2 video subsystem");
    let sdl = sdl2::init()?;
    let video_subsystem = sdl.video()?;

    let ttf_context = sdl2::ttf::init().map_err(|e| e.to_string())?;

    let (window_width, window_height) = constants::calculate_window_dims();
    log::info!("creating window ({window_width}x{window_height})");

    let window = video_subsystem
        .window(window_title, window_width, window_height)
        .position_centered()
        .build()
        .map_err(|e| e.to_string())?;

    let canvas = window
        .into_canvas()
        .accelerated()
        .present_vsync()
        .build()
        .map_err(|e| e.to_string())?;

    let texture_creator = canvas.texture_creator();
    let event_pump = sdl.event_pump()?;

    Ok(SdlContext {
        sdl,
        ttf_context,
        canvas,
        texture_creator,
        event_pump,
    })
}
