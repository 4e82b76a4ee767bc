//! @acp:module "Test Doubles"
//! @acp:summary "Scripted executor, in-memory filesystem and recording reporter"
//! @acp:domain cli
//! @acp:layer data

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, SoError};
use crate::filesystem::Filesystem;
use crate::runner::{ExecRequest, ExecutionResult, Executor};

/// Records every request and answers from a script keyed by rendered command.
/// Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: HashMap<String, (i32, String)>,
    requests: Mutex<Vec<ExecRequest>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, exit_code: i32, output: &str) -> Self {
        self.responses
            .insert(command.to_string(), (exit_code, output.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ExecRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.command).collect()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, request: &ExecRequest) -> Result<ExecutionResult> {
        self.requests.lock().unwrap().push(request.clone());
        let (code, output) = self
            .responses
            .get(&request.command)
            .cloned()
            .unwrap_or((0, String::new()));
        Ok(ExecutionResult::from_stdout(request.command.clone(), code, output))
    }
}

/// In-memory file tree; directories are implied by the files below them
/// plus any explicitly added with [`MemoryFilesystem::with_dir`].
#[derive(Default)]
pub struct MemoryFilesystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    dirs: Mutex<Vec<PathBuf>>,
    temp_counter: Mutex<u32>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.dirs.lock().unwrap().push(PathBuf::from(path));
        self
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

impl Filesystem for MemoryFilesystem {
    fn get(&self, path: &Path) -> Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| SoError::FileNotFound {
                path: path.to_path_buf(),
            })
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
            || files.keys().any(|f| f.starts_with(path))
            || self.dirs.lock().unwrap().iter().any(|d| d.starts_with(path))
    }

    fn replace(&self, path: &Path, content: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn temp_file(&self, prefix: &str) -> Result<PathBuf> {
        let mut counter = self.temp_counter.lock().unwrap();
        *counter += 1;
        let path = PathBuf::from(format!("/tmp/{}{}", prefix, counter));
        self.files.lock().unwrap().insert(path.clone(), String::new());
        Ok(path)
    }
}

/// Collects reported tasks
#[derive(Default)]
pub struct RecordingReporter {
    pub tasks: Mutex<Vec<(String, Option<bool>)>>,
}

impl RecordingReporter {
    pub fn tasks(&self) -> Vec<(String, Option<bool>)> {
        self.tasks.lock().unwrap().clone()
    }
}

impl crate::reporter::TaskReporter for RecordingReporter {
    fn task(&self, label: &str, outcome: Option<bool>) {
        self.tasks
            .lock()
            .unwrap()
            .push((label.to_string(), outcome));
    }
}
