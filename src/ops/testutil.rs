//! Test doubles shared by the action tests.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::runtime::{ProcessOutput, RealRuntime, Runtime};

/// Runtime that performs real file system work (inside a tempdir) but
/// scripts away everything interactive: prompts, child processes, and
/// privilege checks.
pub struct ScriptedRuntime {
    pub inner: RealRuntime,
    pub confirm_answer: bool,
    pub command_code: i32,
    pub command_stdout: String,
    pub interactive_code: i32,
}

impl Default for ScriptedRuntime {
    fn default() -> Self {
        Self {
            inner: RealRuntime,
            confirm_answer: false,
            command_code: 0,
            command_stdout: "[]".to_string(),
            interactive_code: 0,
        }
    }
}

impl Runtime for ScriptedRuntime {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.inner.write(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.inner.read_to_string(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.inner.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.remove_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.rename(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }

    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>> {
        self.inner.create_file(path)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.inner.set_permissions(path, mode)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.inner.home_dir()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.inner.config_dir()
    }

    fn is_privileged(&self) -> bool {
        true
    }

    fn run_command(&self, _program: &str, _args: &[String]) -> Result<ProcessOutput> {
        Ok(ProcessOutput {
            code: Some(self.command_code),
            stdout: self.command_stdout.clone(),
            stderr: if self.command_code == 0 {
                String::new()
            } else {
                "scripted failure".to_string()
            },
        })
    }

    fn run_interactive(&self, _program: &str, _args: &[String]) -> Result<Option<i32>> {
        Ok(Some(self.interactive_code))
    }

    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(self.confirm_answer)
    }
}
