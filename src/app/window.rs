//! Mirror window attributes

use crate::config::WindowConfig;
use crate::hmd::RuntimeKind;
use winit::dpi::LogicalSize;
use winit::window::{Fullscreen, WindowAttributes};

/// Smallest size that still fits the side-by-side mirror and the overlay
const MIN_SIZE: LogicalSize<f64> = LogicalSize::new(320.0, 200.0);

pub fn window_title(config: &WindowConfig, runtime: RuntimeKind) -> String {
    format!("{} [{}]", config.title, runtime.label())
}

/// Creates mirror window attributes from configuration
pub fn window_attributes_from_config(config: &WindowConfig, runtime: RuntimeKind) -> WindowAttributes {
    let mut attrs = WindowAttributes::default()
        .with_title(window_title(config, runtime))
        .with_inner_size(LogicalSize::new(config.width, config.height))
        .with_min_inner_size(MIN_SIZE)
        .with_resizable(config.resizable)
        .with_decorations(config.decorated);

    if config.fullscreen {
        attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_names_the_runtime() {
        let title = window_title(&WindowConfig::default(), RuntimeKind::Simulated);
        assert_eq!(title, "VR GUI [simulated]");
    }
}
