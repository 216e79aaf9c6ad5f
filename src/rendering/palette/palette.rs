use bevy::prelude::*;

// Aim line
pub const AIM_START: Color = Color::srgb(0.0, 1.0, 1.0); // cyan
pub const AIM_END: Color = Color::srgb(0.1, 0.3, 1.0);
pub const AIM_HIT_BUBBLE: Color = Color::srgb(0.2, 1.0, 0.3);
pub const AIM_HIT_BOUNDARY: Color = Color::srgb(1.0, 0.25, 0.25);

// HUD / panels
pub const TEXT_PRIMARY: Color = Color::WHITE;
pub const TEXT_WARNING: Color = Color::srgb(1.0, 0.25, 0.25);
pub const TEXT_ACCENT: Color = Color::srgb(1.0, 0.85, 0.2);
pub const PANEL_BG: Color = Color::srgba(0.02, 0.02, 0.05, 0.85);
pub const BUTTON_NORMAL: Color = Color::srgb(0.15, 0.15, 0.22);
pub const BUTTON_HOVERED: Color = Color::srgb(0.25, 0.25, 0.35);
pub const BUTTON_PRESSED: Color = Color::srgb(0.35, 0.55, 0.35);

pub const ARENA_EDGE: Color = Color::srgb(0.3, 0.3, 0.4);
pub const CLEAR_COLOR: Color = Color::srgb(0.05, 0.05, 0.08);

/// Same hue with a replaced alpha.
#[inline]
pub fn with_alpha(color: Color, alpha: f32) -> Color {
    let c = color.to_srgba();
    Color::srgba(c.red, c.green, c.blue, alpha.clamp(0.0, 1.0))
}

/// Lerp in sRGB space; `t` is clamped.
pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (a, b) = (a.to_srgba(), b.to_srgba());
    Color::srgba(
        a.red + (b.red - a.red) * t,
        a.green + (b.green - a.green) * t,
        a.blue + (b.blue - a.blue) * t,
        a.alpha + (b.alpha - a.alpha) * t,
    )
}
