use crate::core::scene::{Canvas, Component, RawImage, RenderMode, Template, TrackView};
use log::info;
use std::{error::Error, time::Instant};

// --- Template names ---

pub const MULTI_DISPLAY_CANVAS: &str = "MultiDisplayCanvas";
pub const TRACK_VIEW_CANVAS: &str = "TrackViewCanvas";

/// Per-display overlay: a camera-space canvas that mirrors the main render
/// texture behind the player HUD.
fn multi_display_canvas() -> Template {
    Template::new(MULTI_DISPLAY_CANVAS)
        .with(Component::Canvas(Canvas {
            render_mode: RenderMode::ScreenSpaceCamera,
            ..Canvas::default()
        }))
        .child(Template::new("Mirror").with(Component::RawImage(RawImage {
            texture: None,
            mirror: true,
        })))
        .child(Template::new("PlayerHud"))
}

/// Track and lyrics view. Lives in world space so it can be composited with
/// the highway; the lyric bar starts hidden until vocals are loaded.
fn track_view_canvas() -> Template {
    Template::new(TRACK_VIEW_CANVAS)
        .with(Component::Canvas(Canvas {
            render_mode: RenderMode::ScreenSpaceCamera,
            world_camera: None,
            world_space_on_start: true,
        }))
        .child(
            Template::new("TrackViewManager").with(Component::TrackView(TrackView::default())),
        )
        .child(Template::new("LyricBar").with(Component::LyricBar).inactive())
}

/// Load a named template. Blocking; called once at startup.
pub fn load_template(name: &str) -> Result<Template, Box<dyn Error>> {
    let start = Instant::now();
    let template = match name {
        MULTI_DISPLAY_CANVAS => multi_display_canvas(),
        TRACK_VIEW_CANVAS => track_view_canvas(),
        _ => return Err(format!("Unknown template '{name}'").into()),
    };
    info!("Loaded template '{name}' in {:?}", start.elapsed());
    Ok(template)
}
