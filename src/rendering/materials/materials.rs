use bevy::prelude::*;

use crate::core::config::GameConfig;
use crate::rendering::palette::palette::with_alpha;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct BubbleVisualsInitSet;

/// Shared meshes and one body/halo material pair per palette entry.
#[derive(Resource, Clone)]
pub struct BubbleVisuals {
    pub mesh: Handle<Mesh>,
    pub halo_mesh: Handle<Mesh>,
    pub body: Vec<Handle<ColorMaterial>>,
    pub halo: Vec<Handle<ColorMaterial>>,
    fallback_body: Handle<ColorMaterial>,
    fallback_halo: Handle<ColorMaterial>,
}

impl BubbleVisuals {
    pub fn body(&self, color_index: usize) -> Handle<ColorMaterial> {
        self.body
            .get(color_index)
            .cloned()
            .unwrap_or_else(|| self.fallback_body.clone())
    }

    pub fn halo(&self, color_index: usize) -> Handle<ColorMaterial> {
        self.halo
            .get(color_index)
            .cloned()
            .unwrap_or_else(|| self.fallback_halo.clone())
    }
}

const HALO_SCALE: f32 = 1.3;
const HALO_ALPHA: f32 = 0.22;

pub fn build_bubble_visuals(
    cfg: &GameConfig,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
) -> BubbleVisuals {
    let r = cfg.bubble.radius.max(1.0);
    let mut body = Vec::with_capacity(cfg.palette.len());
    let mut halo = Vec::with_capacity(cfg.palette.len());
    for i in 0..cfg.palette.len() {
        let c = cfg.color(i);
        body.push(materials.add(with_alpha(c, cfg.bubble.alpha)));
        halo.push(materials.add(with_alpha(c, HALO_ALPHA)));
    }
    BubbleVisuals {
        mesh: meshes.add(Circle::new(r)),
        halo_mesh: meshes.add(Circle::new(r * HALO_SCALE)),
        body,
        halo,
        fallback_body: materials.add(with_alpha(Color::WHITE, cfg.bubble.alpha)),
        fallback_halo: materials.add(with_alpha(Color::WHITE, HALO_ALPHA)),
    }
}

pub struct MaterialsPlugin;
impl Plugin for MaterialsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_bubble_visuals.in_set(BubbleVisualsInitSet));
    }
}

fn setup_bubble_visuals(
    mut commands: Commands,
    cfg: Res<GameConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let visuals = build_bubble_visuals(&cfg, &mut meshes, &mut materials);
    info!(target: "materials", "Bubble materials ready: {} colours", visuals.body.len());
    commands.insert_resource(visuals);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_material_pair_per_palette_entry_and_fallback() {
        let cfg = GameConfig::default();
        let mut meshes = Assets::<Mesh>::default();
        let mut materials = Assets::<ColorMaterial>::default();
        let v = build_bubble_visuals(&cfg, &mut meshes, &mut materials);
        assert_eq!(v.body.len(), cfg.palette.len());
        assert_eq!(v.halo.len(), cfg.palette.len());
        assert_eq!(v.body(99), v.fallback_body);
        let red = materials.get(&v.body(0)).expect("material");
        assert!((red.color.to_srgba().alpha - cfg.bubble.alpha).abs() < 1e-6);
    }
}
