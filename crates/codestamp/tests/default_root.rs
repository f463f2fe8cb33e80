//! The default template directory is resolved against the working directory,
//! so these tests change it and must not run concurrently.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use codestamp::{CodeGenerator, Context, Error, RegistryError, DEFAULT_TEMPLATE_DIR};
use serial_test::serial;
use tempfile::TempDir;

/// Restores the previous working directory on drop.
struct CwdGuard(PathBuf);

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        Self(previous)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.0);
    }
}

#[test]
#[serial]
fn test_default_template_dir() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join(DEFAULT_TEMPLATE_DIR);
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("hello.txt"), "hello {{ who }}\n").unwrap();

    let _cwd = CwdGuard::enter(dir.path());
    let generator = CodeGenerator::builder().build().unwrap();

    let rendered = generator
        .render("hello", &Context::new().with("who", "world"))
        .unwrap();
    assert_eq!(rendered, "hello world\n");
}

#[test]
#[serial]
fn test_missing_default_template_dir() {
    let dir = TempDir::new().unwrap();
    let _cwd = CwdGuard::enter(dir.path());

    let result = CodeGenerator::builder().build();
    assert!(matches!(
        result,
        Err(Error::Registry(RegistryError::RootNotFound { .. }))
    ));
}

#[test]
#[serial]
fn test_relative_output_path() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join(DEFAULT_TEMPLATE_DIR);
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("note.txt"), "{{ text }}").unwrap();

    let _cwd = CwdGuard::enter(dir.path());
    let generator = CodeGenerator::builder().build().unwrap();

    generator
        .generate_code("note", "note.md", &Context::new().with("text", "done"))
        .unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("note.md")).unwrap(), "done");
}
