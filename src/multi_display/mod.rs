pub mod canvas;
pub mod manager;
pub mod mirror;
pub mod stage;

pub use manager::{DisplayTemplates, MultiDisplayManager};
pub use mirror::MultiDisplayRenderTexture;
