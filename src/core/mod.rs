pub mod display;
pub mod output;
pub mod scene;
