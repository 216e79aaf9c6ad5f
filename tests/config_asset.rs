use bubble_shooter::GameConfig;

#[test]
fn shipped_config_matches_defaults() {
    let cfg = GameConfig::load_from_file("assets/config/game.ron").expect("shipped config parses");
    assert_eq!(cfg, GameConfig::default());
    assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
}

#[test]
fn overlay_layer_only_touches_named_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let overlay = dir.path().join("game.local.ron");
    std::fs::write(&overlay, "(session: (shots: 3), levels: [(rows: 1, cols: 4, colors: 2)])")
        .expect("write overlay");
    let (cfg, used, errors) =
        GameConfig::load_layered([std::path::Path::new("assets/config/game.ron"), overlay.as_path()]);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(used.len(), 2);
    assert_eq!(cfg.session.shots, 3);
    assert_eq!(cfg.session.time_limit, 60.0);
    assert_eq!(cfg.levels.len(), 1);
    assert_eq!(cfg.palette.len(), 5);
}

#[test]
fn broken_layer_is_reported_and_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let broken = dir.path().join("broken.ron");
    std::fs::write(&broken, "(session: (shots: ").expect("write");
    let (cfg, _, errors) =
        GameConfig::load_layered([std::path::Path::new("assets/config/game.ron"), broken.as_path()]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("parse error"));
    assert_eq!(cfg.session.shots, 25);
}
