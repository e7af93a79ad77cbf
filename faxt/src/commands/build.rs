//! Build command implementation.
//!
//! Parses a JSON document into a freshly allocated heap, sets the parsed
//! value as the heap's root, optionally runs a collection, and saves the
//! result to an output heap file.

use std::path::PathBuf;
use std::time::Instant;

use fgc::{GarbageCollector, Heap, HeapOptions};

use crate::commands::common::{error_messages, output_messages};
use crate::commands::traits::{Command, CommandDescription};
use crate::error::{FaxtError, Result};

/// Arguments for the build command.
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Enable verbose output.
    pub verbose: bool,
    /// Path to the JSON document to build from.
    pub input: PathBuf,
    /// Path to write the resulting heap file to.
    pub output: PathBuf,
    /// Capacity, in bytes, of the heap built from `input`.
    pub capacity: usize,
    /// Run the garbage collector before saving.
    pub gc: bool,
    /// Overwrite `output` if it already exists.
    pub force: bool,
}

/// Build command handler.
pub struct BuildCommand {
    args: BuildArgs,
}

impl BuildCommand {
    pub fn new(args: BuildArgs) -> Self {
        Self { args }
    }

    /// Execute the command.
    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();
        self.validate_input()?;
        self.validate_output()?;

        let json = std::fs::read_to_string(&self.args.input)?;

        let options = HeapOptions { verbose: self.args.verbose, ..HeapOptions::default() };
        let mut heap = Heap::with_options(self.args.capacity, options)?;
        let value = fgc::parse_json(&mut heap, &json)?;
        heap.set_root(value.val());

        if self.args.gc {
            let used_before = heap.used();
            GarbageCollector::run(&mut heap);
            if self.args.verbose {
                eprintln!("{} {} -> {} bytes used", output_messages::GC_RAN, used_before, heap.used());
            }
        }

        heap.save_to(&self.args.output)?;

        if self.args.verbose {
            eprintln!(
                "{} {} ({} bytes used of {} capacity)",
                output_messages::CREATED_FILE,
                self.args.output.display(),
                heap.used(),
                heap.capacity()
            );
            eprintln!("✅ Built in {:.3}s", start_time.elapsed().as_secs_f64());
        }

        Ok(())
    }

    fn validate_input(&self) -> Result<()> {
        if !self.args.input.exists() {
            return Err(FaxtError::Validation(format!(
                "{} {}",
                error_messages::INPUT_PATH_NOT_EXIST,
                self.args.input.display()
            )));
        }
        if !self.args.input.is_file() {
            return Err(FaxtError::Validation(format!(
                "{} {}",
                error_messages::INPUT_PATH_NOT_FILE,
                self.args.input.display()
            )));
        }
        Ok(())
    }

    fn validate_output(&self) -> Result<()> {
        if self.args.output.exists() && !self.args.force {
            return Err(FaxtError::Validation(format!(
                "{} {}",
                error_messages::OUTPUT_FILE_EXISTS,
                self.args.output.display()
            )));
        }
        Ok(())
    }
}

impl Command for BuildCommand {
    type Args = BuildArgs;
    type Output = ();

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "build"
    }
}

impl CommandDescription for BuildCommand {
    fn description() -> &'static str {
        "Build a heap file from a JSON document"
    }

    fn help() -> &'static str {
        "Parses a JSON document into a heap, optionally collects it, and \
         saves the result as a heap file."
    }
}

/// Run the build command.
pub fn run_build(args: BuildArgs) -> Result<()> {
    let command = BuildCommand::new(args);
    command.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgc::{ObjectKind, Vector};
    use tempfile::TempDir;

    #[test]
    fn test_build_command_name() {
        assert_eq!(<BuildCommand as Command>::name(), "build");
    }

    #[test]
    fn builds_a_heap_from_json() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("doc.json");
        let output = temp_dir.path().join("doc.fgc");
        std::fs::write(&input, r#"{"tags":["a","b","c"],"count":3}"#).unwrap();

        let args = BuildArgs {
            verbose: false,
            input,
            output: output.clone(),
            capacity: 100_000,
            gc: false,
            force: false,
        };
        assert!(BuildCommand::new(args).run().is_ok());

        let heap = Heap::load_from(&output, 100_000).unwrap();
        assert!(heap.valid());
        let dict = heap.root_value().as_kind::<fgc::Dict>().unwrap();
        assert_eq!(dict.count(), 2);
    }

    #[test]
    fn gc_flag_collects_before_saving() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("doc.json");
        let output = temp_dir.path().join("doc.fgc");
        std::fs::write(&input, r#"[1,2,3,4,5]"#).unwrap();

        let args =
            BuildArgs { verbose: false, input, output: output.clone(), capacity: 100_000, gc: true, force: false };
        assert!(BuildCommand::new(args).run().is_ok());

        let heap = Heap::load_from(&output, 100_000).unwrap();
        let vector = heap.root_value().as_kind::<Vector>().unwrap();
        assert_eq!(vector.count(), 5);
    }

    #[test]
    fn missing_input_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let args = BuildArgs {
            verbose: false,
            input: temp_dir.path().join("missing.json"),
            output: temp_dir.path().join("out.fgc"),
            capacity: 10_000,
            gc: false,
            force: false,
        };
        assert!(matches!(BuildCommand::new(args).run(), Err(FaxtError::Validation(_))));
    }

    #[test]
    fn refuses_to_overwrite_output_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("doc.json");
        let output = temp_dir.path().join("doc.fgc");
        std::fs::write(&input, "null").unwrap();
        std::fs::write(&output, "existing").unwrap();

        let args =
            BuildArgs { verbose: false, input, output, capacity: 10_000, gc: false, force: false };
        assert!(matches!(BuildCommand::new(args).run(), Err(FaxtError::Validation(_))));
    }
}
