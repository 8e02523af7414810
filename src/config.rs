//! Player configuration from data-attribute style key/value pairs.
//!
//! Every option has a documented default; a malformed value falls back
//! to that default rather than erroring, so a typo in page markup never
//! prevents the player from attaching.

use crate::presenter::FitOptions;

/// Options read from the host page's data attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Storage-key namespace. Default: `"scripture"`.
    pub namespace: String,
    /// Remote timing endpoint; `None` disables submission. Default: none.
    pub save_url: Option<String>,
    /// Narration volume, 0.0..=1.0. Default: 1.0.
    pub narration_volume: f32,
    /// Ambient pad volume, 0.0..=1.0. Default: 0.25.
    pub pad_volume: f32,
    /// Ambient pad fade in/out, seconds. Default: 2.0.
    pub pad_fade_secs: f32,
    /// Text-fit bounds. Defaults: base 34px, min 14px, step 2px, 12 iterations.
    pub fit: FitOptions,
    /// Query parameter that enables auto-advance. Default: `"autoplay"`.
    pub autoplay_param: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            namespace: "scripture".to_string(),
            save_url: None,
            narration_volume: 1.0,
            pad_volume: 0.25,
            pad_fade_secs: 2.0,
            fit: FitOptions::default(),
            autoplay_param: "autoplay".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Build a config from `(key, value)` attribute pairs. Unknown keys
    /// are ignored; unparseable values keep their defaults.
    pub fn from_attrs<'a>(attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut cfg = Self::default();
        for (key, value) in attrs {
            match key {
                "namespace" => {
                    if !value.trim().is_empty() {
                        cfg.namespace = value.trim().to_string();
                    }
                }
                "save-url" => {
                    if !value.trim().is_empty() {
                        cfg.save_url = Some(value.trim().to_string());
                    }
                }
                "narration-volume" => set_unit(&mut cfg.narration_volume, value),
                "pad-volume" => set_unit(&mut cfg.pad_volume, value),
                "pad-fade" => set_positive(&mut cfg.pad_fade_secs, value),
                "base-font" => set_positive(&mut cfg.fit.base_px, value),
                "min-font" => set_positive(&mut cfg.fit.min_px, value),
                "font-step" => set_positive(&mut cfg.fit.step_px, value),
                "fit-iterations" => {
                    if let Ok(n) = value.trim().parse::<u32>() {
                        if n > 0 {
                            cfg.fit.max_iterations = n;
                        }
                    }
                }
                "autoplay-param" => {
                    if !value.trim().is_empty() {
                        cfg.autoplay_param = value.trim().to_string();
                    }
                }
                _ => {}
            }
        }
        // A floor above the base would make the fit loop a no-op.
        if cfg.fit.min_px > cfg.fit.base_px {
            cfg.fit.min_px = cfg.fit.base_px;
        }
        cfg
    }
}

fn set_unit(slot: &mut f32, value: &str) {
    if let Ok(v) = value.trim().parse::<f32>() {
        if v.is_finite() && (0.0..=1.0).contains(&v) {
            *slot = v;
        }
    }
}

fn set_positive(slot: &mut f32, value: &str) {
    if let Ok(v) = value.trim().parse::<f32>() {
        if v.is_finite() && v > 0.0 {
            *slot = v;
        }
    }
}
