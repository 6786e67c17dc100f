pub mod renderers;

pub use renderers::CollectingRenderer;
