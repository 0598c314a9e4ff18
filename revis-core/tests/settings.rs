use revis_core::{
    install_settings, load_settings, reset_settings, save_settings, settings, FigureOptions,
    RevisError, RevisSettings,
};
use serial_test::serial;
use std::time::Duration;

#[test]
fn saved_settings_load_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("revis.toml");

    let mut saved = RevisSettings::default();
    saved.figure.width = 320;
    saved.render.scale_factor = 3;
    saved.render.background = "#102030".to_string();
    saved.dispatch.timeout_ms = 1500;
    save_settings(&path, &saved).expect("save settings");

    let loaded = load_settings(&path).expect("load settings");
    assert_eq!(loaded, saved);
    assert_eq!(
        loaded.dispatch_options().timeout,
        Some(Duration::from_millis(1500))
    );
    let options = loaded.render_options().expect("render options");
    assert_eq!(options.scale_factor, 3);
    assert_eq!(options.background.to_rgb8(), [0x10, 0x20, 0x30]);
}

#[test]
fn load_clamps_out_of_range_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("revis.toml");
    std::fs::write(&path, "[figure]\nheight = 0\n\n[render]\nscale_factor = 64\n")
        .expect("write settings");

    let loaded = load_settings(&path).expect("load settings");
    assert_eq!(loaded.figure.height, 1);
    assert_eq!(loaded.figure.width, figure::DEFAULT_WIDTH);
    assert_eq!(loaded.render.scale_factor, revis_core::settings::MAX_SCALE_FACTOR);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("revis.toml");
    std::fs::write(&path, "[figure\nwidth = ").expect("write settings");
    assert!(matches!(
        load_settings(&path),
        Err(RevisError::SettingsParse(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        load_settings(&dir.path().join("absent.toml")),
        Err(RevisError::Io(_))
    ));
}

#[test]
#[serial]
fn installed_settings_drive_new_figures() {
    let mut custom = RevisSettings::default();
    custom.figure.width = 200;
    custom.figure.height = 100;
    custom.figure.disable_output = false;
    install_settings(custom.clone());

    assert_eq!(settings(), custom);
    let fig = revis_core::figure();
    assert_eq!(
        fig.options(),
        FigureOptions {
            disable_output: false,
            size: (200, 100),
        }
    );
    assert_eq!(fig.with_figure(|f| f.size()), (200, 100));

    reset_settings();
    assert_eq!(settings(), RevisSettings::default());
}

#[test]
fn translucent_background_fails_to_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("revis.toml");
    std::fs::write(&path, "[render]\nbackground = \"#00000000\"\n").expect("write settings");
    assert!(matches!(
        load_settings(&path),
        Err(RevisError::InvalidSettings(_))
    ));
}
