use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Hook used by most tests: logs the call, fails for versions listed in a
/// `fail` file, otherwise creates the version directory.
#[allow(dead_code)]
pub const RECORDING_HOOK: &str = r#"#!/bin/sh
echo "$1 $2" >> calls.log
if [ -f fail ] && grep -qx "$1" fail; then
    echo "refusing to install $1" >&2
    exit 1
fi
mkdir -p "$1"
"#;

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("tools");
        fs::create_dir_all(&root).expect("Failed to create tools root");
        let config_path = temp_dir.path().join("config.json");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_toolshelf"));

        Self {
            _temp_dir: temp_dir,
            root,
            config_path,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("TOOLSHELF_CONFIG", &self.config_path);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_CONFIG_HOME", self._temp_dir.path().join("config"));
        for key in [
            "TOOLSHELF_DEBUG",
            "TOOLSHELF_STRICT",
            "TOOLSHELF_MANIFEST",
            "TOOLSHELF_HOOK",
            "TOOLSHELF_PLACEHOLDER",
            "TOOLSHELF_LATEST_SCOPE",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    /// Create `tools/<name>` with an optional manifest and hook script.
    pub fn tool(&self, name: &str, manifest: Option<&str>, hook: Option<&str>) -> PathBuf {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).expect("Failed to create tool dir");
        if let Some(manifest) = manifest {
            fs::write(dir.join("versions.txt"), manifest).expect("Failed to write manifest");
        }
        if let Some(hook) = hook {
            write_executable(&dir.join("install"), hook);
        }
        dir
    }
}

#[allow(dead_code)]
pub fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
    }
}

#[allow(dead_code)]
pub fn calls(tool_dir: &Path) -> Vec<String> {
    fs::read_to_string(tool_dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[allow(dead_code)]
pub fn link_target(path: &Path) -> String {
    fs::read_link(path)
        .unwrap_or_else(|e| panic!("{} is not a symlink: {}", path.display(), e))
        .to_string_lossy()
        .to_string()
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Unexpected exit status\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
