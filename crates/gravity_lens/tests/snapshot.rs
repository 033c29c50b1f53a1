//! Run the real binary in headless snapshot mode.
#[cfg(test)]
mod e2e {
    fn gravity_lens(config_dir: &std::path::Path, args: &[&str]) -> std::process::Output {
        std::process::Command::new(env!("CARGO_BIN_EXE_gravity-lens"))
            .arg("--config-dir")
            .arg(config_dir)
            .args(args)
            .output()
            .unwrap()
    }

    #[test]
    fn saves_a_png_without_a_terminal() {
        let directory = tempfile::tempdir().unwrap();
        let png = directory.path().join("lens.png");
        let output = gravity_lens(
            directory.path(),
            &[
                "--snapshot",
                png.to_str().unwrap(),
                "--snapshot-width",
                "200",
                "--snapshot-height",
                "100",
                "--snapshot-frames",
                "20",
                "--seed",
                "5",
                "--mass",
                "2",
            ],
        );
        assert!(
            output.status.success(),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );

        let image = image::open(&png).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (200, 100));
        assert_eq!(image.get_pixel(100, 50).0, [0, 0, 0, 255]);
        assert!(directory.path().join("gravity-lens.toml").exists());
    }

    #[test]
    fn bad_config_is_reported() {
        let directory = tempfile::tempdir().unwrap();
        std::fs::write(
            directory.path().join("gravity-lens.toml"),
            "[engine]\nspeed_of_light = -1.0\n",
        )
        .unwrap();
        let png = directory.path().join("never.png");
        let output = gravity_lens(directory.path(), &["--snapshot", png.to_str().unwrap()]);

        assert!(String::from_utf8_lossy(&output.stderr).contains("Bad config file"));
        assert!(!png.exists());
    }
}
