mod svg_plot_renderer;

pub use svg_plot_renderer::*;
