use crate::parsing::parser::parse_java;
use crate::parsing::syntax::SyntaxUnit;
use crate::project::file_info::FileInfo;
use crate::project::io::{ProcessingError, read_text_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Represents a file that was skipped during processing
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub file_path: String,
    pub reason: String,
    pub file_size: Option<u64>,
}

/// Represents a file that encountered an error during processing
#[derive(Debug, Clone)]
pub struct ErroredFile {
    pub file_path: String,
    pub error_message: String,
    pub error_stage: ProcessingStage,
}

/// Represents the stage where processing failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingStage {
    FileSystem, // Failed to read file metadata or content
    Parsing,    // Failed to produce an acceptable syntax tree
}

#[derive(Debug)]
pub struct FileProcessingResult {
    pub unit: Arc<SyntaxUnit>,
    pub file_size: u64,
    pub processing_time: Duration,
}

/// Result of processing a file that can be success, skipped, or error
#[derive(Debug)]
pub enum ProcessingResult {
    Success(FileProcessingResult),
    Skipped(SkippedFile),
    Error(ErroredFile),
}

impl ProcessingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ProcessingResult::Skipped(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ProcessingResult::Error(_))
    }

    /// Get the file path regardless of result type
    pub fn file_path(&self) -> String {
        match self {
            ProcessingResult::Success(result) => result.unit.path.to_string_lossy().to_string(),
            ProcessingResult::Skipped(skipped) => skipped.file_path.clone(),
            ProcessingResult::Error(errored) => errored.file_path.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileProcessor {
    pub path: PathBuf,
    pub content: String,
}

impl FileProcessor {
    pub fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }

    /// Read the file behind `file_info`, skipping oversized or non-text files.
    pub fn read(file_info: &FileInfo, max_file_size: usize) -> Result<Self, ProcessingResult> {
        match read_text_file(file_info.path(), max_file_size) {
            Ok(content) => Ok(Self::new(file_info.path.clone(), content)),
            Err(ProcessingError::Skipped(file_path, reason)) => {
                Err(ProcessingResult::Skipped(SkippedFile {
                    file_path,
                    reason,
                    file_size: file_size(file_info.path()),
                }))
            }
            Err(ProcessingError::Error(file_path, error_message)) => {
                Err(ProcessingResult::Error(ErroredFile {
                    file_path,
                    error_message,
                    error_stage: ProcessingStage::FileSystem,
                }))
            }
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Parse the content into a syntax unit.
    pub fn process(self, strict: bool) -> ProcessingResult {
        let start_time = Instant::now();
        let file_size = self.size();
        let file_path = self.path.to_string_lossy().to_string();

        match parse_java(&self.path, self.content, strict) {
            Ok(unit) => ProcessingResult::Success(FileProcessingResult {
                unit: Arc::new(unit),
                file_size,
                processing_time: start_time.elapsed(),
            }),
            Err(e) => ProcessingResult::Error(ErroredFile {
                file_path,
                error_message: e.to_string(),
                error_stage: ProcessingStage::Parsing,
            }),
        }
    }
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|metadata| metadata.len())
}

/// Read and parse one file. Anything that is not a `.java` file is skipped.
pub fn process_file(file_info: &FileInfo, max_file_size: usize, strict: bool) -> ProcessingResult {
    if !file_info.is_java_source() {
        return ProcessingResult::Skipped(SkippedFile {
            file_path: file_info.path.to_string_lossy().to_string(),
            reason: "Not a Java source file".to_string(),
            file_size: file_size(file_info.path()),
        });
    }

    match FileProcessor::read(file_info, max_file_size) {
        Ok(processor) => processor.process(strict),
        Err(result) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_process_success() {
        let processor = FileProcessor::new(
            PathBuf::from("/src/pkg/Foo.java"),
            "package pkg; public class Foo {}".to_string(),
        );

        match processor.process(true) {
            ProcessingResult::Success(result) => {
                assert_eq!(result.unit.package, "pkg");
                assert_eq!(result.file_size, 32);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_process_parse_error_is_isolated() {
        let processor = FileProcessor::new(
            PathBuf::from("/src/pkg/Broken.java"),
            "public class Broken {".to_string(),
        );

        let result = processor.process(true);
        assert!(result.is_error());
        if let ProcessingResult::Error(errored) = result {
            assert_eq!(errored.error_stage, ProcessingStage::Parsing);
            assert_eq!(errored.file_path, "/src/pkg/Broken.java");
        }
    }

    #[test]
    fn test_process_file_skips_large_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Big.java");
        std::fs::write(&path, "class Big {}").unwrap();

        let result = process_file(&FileInfo::from_path(path), 4, true);
        assert!(result.is_skipped());
    }

    #[test]
    fn test_process_file_skips_non_java_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("build.gradle");
        std::fs::write(&path, "apply plugin: 'java'").unwrap();

        match process_file(&FileInfo::from_path(path), 1024, true) {
            ProcessingResult::Skipped(skipped) => {
                assert_eq!(skipped.reason, "Not a Java source file");
                assert_eq!(skipped.file_size, Some(20));
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }
}
