//! Convert command implementation.
//!
//! Reopens an existing heap file, optionally runs a collection, and
//! serializes its root value back out as JSON.

use std::path::PathBuf;
use std::time::Instant;

use fgc::{GarbageCollector, Heap, HeapOptions};

use crate::commands::common::output_messages;
use crate::commands::traits::{Command, CommandDescription};
use crate::error::{FaxtError, Result};

/// Arguments for the convert command.
#[derive(Debug, Clone)]
pub struct ConvertArgs {
    /// Enable verbose output.
    pub verbose: bool,
    /// Path to the heap file to reopen.
    pub input: PathBuf,
    /// Path to write the JSON output to. Written to stdout if absent.
    pub output: Option<PathBuf>,
    /// Capacity, in bytes, to reopen the heap with (must be at least the
    /// file's size).
    pub capacity: usize,
    /// Run the garbage collector before converting.
    pub gc: bool,
}

/// Convert command handler.
pub struct ConvertCommand {
    args: ConvertArgs,
}

impl ConvertCommand {
    pub fn new(args: ConvertArgs) -> Self {
        Self { args }
    }

    /// Execute the command.
    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();

        let options = HeapOptions { verbose: self.args.verbose, ..HeapOptions::default() };
        let bytes = std::fs::read(&self.args.input)?;
        let mut heap = Heap::existing_with_options(bytes, self.args.capacity, options);
        if !heap.valid() {
            return Err(FaxtError::Validation(format!(
                "heap file failed validation (bad magic, root offset, or capacity too small): {}",
                self.args.input.display()
            )));
        }

        if self.args.verbose {
            eprintln!("{} {} ({} bytes used)", output_messages::LOADED_FILE, self.args.input.display(), heap.used());
        }

        if self.args.gc {
            let used_before = heap.used();
            GarbageCollector::run(&mut heap);
            if self.args.verbose {
                eprintln!("{} {} -> {} bytes used", output_messages::GC_RAN, used_before, heap.used());
            }
        }

        let json = fgc::to_json(&heap, heap.root_value())
            .ok_or_else(|| FaxtError::Validation("root value contains a Blob, which has no JSON representation".into()))?;

        match &self.args.output {
            Some(path) => std::fs::write(path, &json)?,
            None => println!("{json}"),
        }

        if self.args.verbose {
            eprintln!("✅ Converted in {:.3}s", start_time.elapsed().as_secs_f64());
        }

        Ok(())
    }
}

impl Command for ConvertCommand {
    type Args = ConvertArgs;
    type Output = ();

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "convert"
    }
}

impl CommandDescription for ConvertCommand {
    fn description() -> &'static str {
        "Convert a heap file back to JSON"
    }

    fn help() -> &'static str {
        "Reopens a heap file, optionally collects it, and writes its root \
         value out as a JSON document."
    }
}

/// Run the convert command.
pub fn run_convert(args: ConvertArgs) -> Result<()> {
    let command = ConvertCommand::new(args);
    command.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgc::HeapOptions as Options;
    use tempfile::TempDir;

    fn build_heap_file(path: &std::path::Path, json: &str) {
        let mut heap = Heap::with_options(100_000, Options::default()).unwrap();
        let value = fgc::parse_json(&mut heap, json).unwrap();
        heap.set_root(value.val());
        heap.save_to(path).unwrap();
    }

    #[test]
    fn test_convert_command_name() {
        assert_eq!(<ConvertCommand as Command>::name(), "convert");
    }

    #[test]
    fn round_trips_a_heap_file_to_json() {
        let temp_dir = TempDir::new().unwrap();
        let heap_path = temp_dir.path().join("doc.fgc");
        let json_path = temp_dir.path().join("doc.json");
        build_heap_file(&heap_path, r#"{"a":1,"b":[true,null,"x"]}"#);

        let args = ConvertArgs {
            verbose: false,
            input: heap_path,
            output: Some(json_path.clone()),
            capacity: 100_000,
            gc: false,
        };
        assert!(ConvertCommand::new(args).run().is_ok());

        let written = std::fs::read_to_string(&json_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        let expected: serde_json::Value = serde_json::from_str(r#"{"a":1,"b":[true,null,"x"]}"#).unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn gc_flag_collects_before_converting() {
        let temp_dir = TempDir::new().unwrap();
        let heap_path = temp_dir.path().join("doc.fgc");
        let json_path = temp_dir.path().join("doc.json");
        build_heap_file(&heap_path, "[1,2,3]");

        let args =
            ConvertArgs { verbose: false, input: heap_path, output: Some(json_path.clone()), capacity: 100_000, gc: true };
        assert!(ConvertCommand::new(args).run().is_ok());

        let written = std::fs::read_to_string(&json_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn capacity_smaller_than_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let heap_path = temp_dir.path().join("doc.fgc");
        build_heap_file(&heap_path, r#"{"a":1}"#);
        let file_len = std::fs::metadata(&heap_path).unwrap().len() as usize;

        let args =
            ConvertArgs { verbose: false, input: heap_path, output: None, capacity: file_len.saturating_sub(1), gc: false };
        assert!(matches!(ConvertCommand::new(args).run(), Err(FaxtError::Validation(_))));
    }
}
