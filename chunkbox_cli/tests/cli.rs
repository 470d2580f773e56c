/// End-to-end tests for the `chunkbox` binary: exit codes and files produced.
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn chunkbox(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chunkbox"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn chunkbox")
}

fn write_sample(path: &Path, len: usize) -> Vec<u8> {
    let data: Vec<u8> = (0..len).map(|i| (i / 97) as u8 ^ (i % 7) as u8).collect();
    fs::write(path, &data).unwrap();
    data
}

#[test]
fn round_trip_writes_container_and_restoration() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_sample(&dir.path().join("in.bin"), 200_000);

    let out = chunkbox(&["in.bin", "out.cbx"], dir.path());
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stderr).contains("round trip passed"));

    assert!(dir.path().join("out.cbx").exists());
    assert_eq!(fs::read(dir.path().join("out.cbx.restored")).unwrap(), data);
}

#[test]
fn round_trip_honours_restore_path_and_codec() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_sample(&dir.path().join("in.bin"), 70_000);

    let out = chunkbox(
        &["in.bin", "out.cbx", "--codec", "zstd", "--level", "9", "--header-width", "4", "-r", "back.bin"],
        dir.path(),
    );
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(dir.path().join("back.bin")).unwrap(), data);
}

#[test]
fn compress_then_decompress() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_sample(&dir.path().join("in.bin"), 150_001);

    let out = chunkbox(&["compress", "in.bin", "c.cbx", "--header-width", "8"], dir.path());
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    let out = chunkbox(&["decompress", "c.cbx", "back.bin", "--header-width", "8"], dir.path());
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(dir.path().join("back.bin")).unwrap(), data);

    let out = chunkbox(&["inspect", "c.cbx", "--frames", "--header-width", "8"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("frames         : 3"), "{stdout}");
}

#[test]
fn usage_errors_exit_1() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(chunkbox(&[], dir.path()).status.code(), Some(1));
    assert_eq!(chunkbox(&["only-one"], dir.path()).status.code(), Some(1));
    assert_eq!(
        chunkbox(&["a", "b", "--header-width", "3"], dir.path()).status.code(),
        Some(1)
    );
    assert_eq!(chunkbox(&["--help"], dir.path()).status.code(), Some(0));
}

#[test]
fn missing_input_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let out = chunkbox(&["nope.bin", "out.cbx"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot open"));
}

#[test]
fn bad_codec_level_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(&dir.path().join("in.bin"), 10);
    let out = chunkbox(&["in.bin", "out.cbx", "--codec", "zstd", "--level", "1000"], dir.path());
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn truncated_container_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(&dir.path().join("in.bin"), 100_000);
    let out = chunkbox(&["compress", "in.bin", "c.cbx"], dir.path());
    assert_eq!(out.status.code(), Some(0));

    let mut container = fs::read(dir.path().join("c.cbx")).unwrap();
    container.truncate(container.len() - 1);
    fs::write(dir.path().join("c.cbx"), container).unwrap();

    let out = chunkbox(&["decompress", "c.cbx", "back.bin"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("truncated"));
}
