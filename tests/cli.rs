use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn write_pair(dir: &Path) -> (String, String) {
    let left = RgbImage::from_fn(64, 48, |x, y| Rgb([200, (x * 3) as u8, (y * 5) as u8]));
    let right = RgbImage::from_fn(64, 48, |x, y| Rgb([(y * 5) as u8, 30, 150 + x as u8]));
    let (lp, rp) = (dir.join("left.png"), dir.join("right.png"));
    left.save(&lp).unwrap();
    right.save(&rp).unwrap();
    (
        lp.to_string_lossy().into_owned(),
        rp.to_string_lossy().into_owned(),
    )
}

#[test]
fn blends_a_pair_into_the_output_file() {
    let dir = TempDir::new().unwrap();
    let (left, right) = write_pair(dir.path());
    let output = dir.path().join("out.png");

    Command::cargo_bin("seamblend")
        .unwrap()
        .arg(&left)
        .arg(&right)
        .args(["-o", output.to_str().unwrap(), "-l", "3", "-w", "10"])
        .assert()
        .success();

    let blended = image::open(&output).unwrap().to_rgb8();
    assert_eq!(blended.dimensions(), (64, 48));
}

#[test]
fn writes_feather_masks_and_level_dumps_on_request() {
    let dir = TempDir::new().unwrap();
    let (left, right) = write_pair(dir.path());
    let output = dir.path().join("out.png");
    let feather = dir.path().join("feather.png");
    let dumps = dir.path().join("dumps");
    let masks = dir.path().join("masks");

    Command::cargo_bin("seamblend")
        .unwrap()
        .arg(&left)
        .arg(&right)
        .args([
            "-o",
            output.to_str().unwrap(),
            "--levels",
            "4",
            "--feather",
            feather.to_str().unwrap(),
            "--dump-dir",
            dumps.to_str().unwrap(),
            "--masks-dir",
            masks.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(feather.exists());
    assert!(masks.join("mask_left.png").exists());
    assert!(masks.join("mask_right.png").exists());
    for level in 0..4 {
        assert!(dumps.join(format!("blended_level{}.png", level)).exists());
    }
}

#[test]
fn missing_input_is_reported_with_its_path() {
    let dir = TempDir::new().unwrap();
    let (left, _) = write_pair(dir.path());
    let missing = dir.path().join("nope.png");

    Command::cargo_bin("seamblend")
        .unwrap()
        .arg(&left)
        .arg(&missing)
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.png"));
}

#[test]
fn zero_levels_are_refused() {
    let dir = TempDir::new().unwrap();
    let (left, right) = write_pair(dir.path());

    Command::cargo_bin("seamblend")
        .unwrap()
        .arg(&left)
        .arg(&right)
        .args(["-l", "0"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one level"));
}

#[test]
fn non_numeric_levels_are_a_usage_error() {
    Command::cargo_bin("seamblend")
        .unwrap()
        .args(["a.png", "b.png", "-l", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid number"));
}
