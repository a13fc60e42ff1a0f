//! Task input assembly
//!
//! The effective inputs of a task, in a fixed order: the command argv,
//! declared input files, then imported packages. The task discovery layer
//! owns what goes in; this type only renders the set into fingerprint
//! inputs.

use crate::error::DroverResult;
use crate::fingerprint::{Fingerprint, FingerprintInput};
use crate::remote::ResolvedPackage;
use std::path::PathBuf;

/// Ordered input set for one task invocation
#[derive(Debug, Default)]
pub struct TaskInputs {
    /// Command and arguments the task executes
    pub command: Vec<String>,
    /// Declared file dependencies
    pub files: Vec<PathBuf>,
    /// Remote packages the task imported
    pub packages: Vec<ResolvedPackage>,
}

impl TaskInputs {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    pub fn with_packages(mut self, packages: Vec<ResolvedPackage>) -> Self {
        self.packages = packages;
        self
    }

    /// A short human-readable task label, for logs and errors
    pub fn label(&self) -> String {
        if self.command.is_empty() {
            "<empty>".to_string()
        } else {
            self.command.join(" ")
        }
    }

    /// Fingerprint of the complete input set
    pub fn fingerprint(&self) -> DroverResult<Fingerprint> {
        let mut inputs = Vec::new();

        for arg in &self.command {
            inputs.push(FingerprintInput::literal(arg.as_bytes()));
        }
        for file in &self.files {
            inputs.push(FingerprintInput::file(file));
        }
        for package in &self.packages {
            inputs.extend(package.fingerprint_inputs());
        }

        Fingerprint::compute(&inputs)
    }
}
