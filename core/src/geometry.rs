pub const DEFAULT_ELEMENT_MULTIPLIER: f64 = 0.1;
pub const PARALLAX_MULTIPLIER: f64 = 0.08;
pub const EASING_FACTOR: f64 = 0.08;
pub const SNAP_THRESHOLD: f64 = 0.01;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportMetrics {
    pub fn new(scroll_y: f64, width: f64, height: f64) -> Self {
        Self {
            scroll_y,
            width,
            height,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        Some(self.width / self.height)
    }
}

/// Bounding box of an element, relative to the top of the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementRect {
    pub top: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        Some(self.width / self.height)
    }
}

/// Signed distance between the element center and the viewport center,
/// scaled by `multiplier`. Both centers are measured in document space.
pub fn element_offset(rect: ElementRect, viewport: ViewportMetrics, multiplier: f64) -> f64 {
    let element_center = rect.top + viewport.scroll_y + rect.height / 2.0;
    let viewport_center = viewport.scroll_y + viewport.height / 2.0;
    (element_center - viewport_center) * multiplier
}

/// Rendered image height under `background-size: cover`.
pub fn scaled_image_height(image: ImageSize, viewport: ViewportMetrics) -> Option<f64> {
    let image_aspect = image.aspect_ratio()?;
    let viewport_aspect = viewport.aspect_ratio()?;
    if image_aspect > viewport_aspect {
        Some(viewport.height)
    } else {
        Some(viewport.width / image_aspect)
    }
}

pub fn max_parallax_offset(image: ImageSize, viewport: ViewportMetrics) -> Option<f64> {
    let scaled = scaled_image_height(image, viewport)?;
    Some((scaled - viewport.height).max(0.0))
}

pub fn target_offset(scroll_y: f64, max_offset: f64) -> f64 {
    (scroll_y * PARALLAX_MULTIPLIER).min(max_offset).max(0.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EaseStep {
    Moving(f64),
    Settled(f64),
}

impl EaseStep {
    pub fn value(self) -> f64 {
        match self {
            EaseStep::Moving(value) | EaseStep::Settled(value) => value,
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, EaseStep::Settled(_))
    }
}

pub fn ease_toward(current: f64, target: f64) -> EaseStep {
    let difference = target - current;
    if difference.abs() < SNAP_THRESHOLD {
        EaseStep::Settled(target)
    } else {
        EaseStep::Moving(current + difference * EASING_FACTOR)
    }
}
