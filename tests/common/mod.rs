use spatial_render::{Renderer, RendererConfig};

/// Creates a small renderer, or `None` when the machine has no usable adapter
pub fn try_renderer(width: u32, height: u32) -> Option<Renderer> {
    match Renderer::new(
        RendererConfig::default()
            .with_size(width, height)
            .with_label("Test"),
    ) {
        Ok(renderer) => Some(renderer),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}
