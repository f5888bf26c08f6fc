use serde::{Deserialize, Serialize};

/// Zoom-dependent growth of scalable attributes.
///
/// Values are authored for `reference_zoom`; every zoom level above it
/// multiplies them by `step`. Below the reference they keep their base size.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ZoomScale {
    #[serde(default = "default_reference_zoom")]
    pub reference_zoom: u8,
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_reference_zoom() -> u8 {
    12
}

fn default_step() -> f64 {
    1.5
}

impl Default for ZoomScale {
    fn default() -> Self {
        Self {
            reference_zoom: default_reference_zoom(),
            step: default_step(),
        }
    }
}

impl ZoomScale {
    pub fn new(reference_zoom: u8, step: f64) -> Self {
        Self {
            reference_zoom,
            step,
        }
    }

    /// Scaling is one-sided: zooms at or below the reference return 1, so
    /// sizes never shrink when zooming out.
    pub fn factor(&self, zoom: u8) -> f64 {
        if zoom <= self.reference_zoom {
            1.0
        } else {
            self.step.powi(i32::from(zoom - self.reference_zoom))
        }
    }
}
