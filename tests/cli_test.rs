use assert_cmd::prelude::*; // Add methods on commands
use std::path::PathBuf;
use std::process::Command; // Run programs
type STDRESULT = Result<(), Box<dyn std::error::Error>>;

fn write_input(temp_dir: &tempfile::TempDir, name: &str, data: &[u8]) -> STDRESULT {
    std::fs::write(temp_dir.path().join(name), data)?;
    Ok(())
}

/// Compress then decompress through the binary and return the final bytes.
fn round_trip(temp_dir: &tempfile::TempDir, name: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let in_path: PathBuf = temp_dir.path().join(name);
    let compressed = temp_dir.path().join([name, ".compressed"].concat());
    let expanded = temp_dir.path().join([name, ".expanded"].concat());
    let mut cmd = Command::cargo_bin("threedo-lzss")?;
    cmd.arg("compress")
        .arg(&in_path)
        .arg(&compressed)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("threedo-lzss")?;
    cmd.arg("decompress")
        .arg(&compressed)
        .arg(&expanded)
        .assert()
        .success();
    Ok(std::fs::read(expanded)?)
}

#[test]
fn word_aligned_invertibility() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let data = b"Many hands make light work. ".repeat(100); // 2800 bytes
    write_input(&temp_dir, "aligned.txt", &data)?;
    let out = round_trip(&temp_dir, "aligned.txt")?;
    assert_eq!(out, data);
    Ok(())
}

#[test]
fn unaligned_file_comes_back_zero_padded() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let data = b"stray tail".to_vec(); // 10 bytes
    write_input(&temp_dir, "unaligned.bin", &data)?;
    let out = round_trip(&temp_dir, "unaligned.bin")?;
    assert_eq!(out.len(), 12);
    assert_eq!(&out[..10], &data[..]);
    assert_eq!(&out[10..], &[0, 0]);
    Ok(())
}

#[test]
fn compressed_file_is_word_sized() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let data = b"abcdabcdabcdabcd".repeat(64);
    write_input(&temp_dir, "phrases.bin", &data)?;
    let in_path = temp_dir.path().join("phrases.bin");
    let out_path = temp_dir.path().join("phrases.bin.compressed");
    let mut cmd = Command::cargo_bin("threedo-lzss")?;
    cmd.arg("compress").arg(&in_path).arg(&out_path).assert().success();
    let compressed = std::fs::read(&out_path)?;
    assert_eq!(compressed.len() % 4, 0);
    assert!(compressed.len() < data.len());
    Ok(())
}

#[test]
fn default_output_naming() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let data = b"default naming check 1234".repeat(8);
    write_input(&temp_dir, "noname.bin", &data)?;
    let in_path = temp_dir.path().join("noname.bin");
    let mut cmd = Command::cargo_bin("threedo-lzss")?;
    cmd.arg("compress").arg(&in_path).assert().success();
    assert!(temp_dir.path().join("noname.bin.compressed").exists());
    Ok(())
}

#[test]
fn check_subcommand_passes() -> STDRESULT {
    let mut cmd = Command::cargo_bin("threedo-lzss")?;
    cmd.arg("check").assert().success();
    Ok(())
}
