#![forbid(unsafe_code)]

mod rendering;
mod story;

pub use rendering::{init_tracing, render_frame, render_frame_to_png, RenderConfig};
pub use story::Story;
