// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::SettingsFixture;

use anyhow::Result;
use assert_cmd::Command;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::{
    fs::{create_dir, read_dir, write, File},
    io::Read,
};
use tempfile::TempDir;

#[test]
fn list_prints_manifest_in_order() -> Result<()> {
    let dir = TempDir::new()?;
    let settings = SettingsFixture::backup(dir.path(), "/", &["/a", "/b", "/c"])?;

    Command::cargo_bin("backup")?
        .arg("--config")
        .arg(settings.as_path())
        .arg("list")
        .assert()
        .success()
        .stdout("/a\n/b\n/c\n");

    Ok(())
}

#[test]
fn missing_source_aborts_without_archive() -> Result<()> {
    let source = TempDir::new()?;
    let out = TempDir::new()?;
    write(source.path().join("a.txt"), "a")?;
    let settings = SettingsFixture::backup(source.path(), source.path(), &["a.txt", "missing"])?;

    Command::cargo_bin("backup")?
        .arg("--config")
        .arg(settings.as_path())
        .args(["all", "--filename", "x.tar.gz", "--destination"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
    assert_eq!(read_dir(out.path())?.count(), 0);

    Ok(())
}

#[test]
fn missing_destination_fails() -> Result<()> {
    let source = TempDir::new()?;
    write(source.path().join("a.txt"), "a")?;
    let settings = SettingsFixture::backup(source.path(), source.path(), &["a.txt"])?;

    Command::cargo_bin("backup")?
        .arg("--config")
        .arg(settings.as_path())
        .args(["all", "--filename", "x.tar.gz", "--destination"])
        .arg(source.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an existing directory"));

    Ok(())
}

#[test]
fn filename_with_directories_is_refused() -> Result<()> {
    let source = TempDir::new()?;
    let out = TempDir::new()?;
    write(source.path().join("a.txt"), "a")?;
    create_dir(out.path().join("nested"))?;
    let settings = SettingsFixture::backup(source.path(), source.path(), &["a.txt"])?;

    Command::cargo_bin("backup")?
        .arg("--config")
        .arg(settings.as_path())
        .args(["all", "--filename", "nested/x.tar.gz", "--destination"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not hold any directory component"));
    assert_eq!(read_dir(out.path().join("nested"))?.count(), 0);

    Ok(())
}

#[test]
fn archive_twice_refuses_overwrite() -> Result<()> {
    let source = TempDir::new()?;
    let out = TempDir::new()?;
    write(source.path().join("a.txt"), "hello")?;
    let settings = SettingsFixture::backup(source.path(), source.path(), &["a.txt"])?;

    let backup = || -> Result<Command> {
        let mut cmd = Command::cargo_bin("backup")?;
        cmd.arg("--config")
            .arg(settings.as_path())
            .args(["all", "--filename", "x.tar.gz", "--destination"])
            .arg(out.path());
        Ok(cmd)
    };

    backup()?.assert().success();
    let archive = out.path().join("x.tar.gz");
    let before = std::fs::read(&archive)?;

    backup()?
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(std::fs::read(&archive)?, before);

    let mut tarball = tar::Archive::new(GzDecoder::new(File::open(&archive)?));
    let mut names = Vec::new();
    for entry in tarball.entries()? {
        let mut entry = entry?;
        let mut contents = String::new();
        entry.read_to_string(&mut contents)?;
        names.push((entry.path()?.display().to_string(), contents));
    }
    assert_eq!(names, vec![("a.txt".to_string(), "hello".to_string())]);

    Ok(())
}
