//! Init command implementation.
//!
//! Creates a new, empty heap file on disk: a freshly constructed [`Heap`]
//! with nothing allocated in it beyond the 12-byte header, saved via
//! [`Heap::save_to`].

use std::path::PathBuf;
use std::time::Instant;

use fgc::{Heap, HeapOptions};

use crate::commands::common::output_messages;
use crate::commands::traits::{Command, CommandDescription};
use crate::error::{FaxtError, Result};

/// Arguments for the init command.
#[derive(Debug, Clone)]
pub struct InitArgs {
    /// Enable verbose output.
    pub verbose: bool,
    /// Path of the heap file to create.
    pub path: PathBuf,
    /// Capacity, in bytes, of the new heap.
    pub capacity: usize,
    /// Overwrite the path if a file already exists there.
    pub force: bool,
}

/// Init command handler.
pub struct InitCommand {
    args: InitArgs,
}

impl InitCommand {
    pub fn new(args: InitArgs) -> Self {
        Self { args }
    }

    /// Execute the command.
    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();

        if self.args.path.exists() && !self.args.force {
            return Err(FaxtError::Validation(format!(
                "{} already exists (use --force to overwrite)",
                self.args.path.display()
            )));
        }

        let options = HeapOptions { verbose: self.args.verbose, ..HeapOptions::default() };
        let heap = Heap::with_options(self.args.capacity, options)?;
        heap.save_to(&self.args.path)?;

        if self.args.verbose {
            eprintln!(
                "{} {} ({} bytes used, {} capacity)",
                output_messages::CREATED_FILE,
                self.args.path.display(),
                heap.used(),
                heap.capacity()
            );
            eprintln!("✅ Completed in {:.3}s", start_time.elapsed().as_secs_f64());
        }

        Ok(())
    }
}

impl Command for InitCommand {
    type Args = InitArgs;
    type Output = ();

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "init"
    }
}

impl CommandDescription for InitCommand {
    fn description() -> &'static str {
        "Create a new, empty heap file"
    }

    fn help() -> &'static str {
        "Allocates a fresh managed heap of the given capacity and saves its \
         (empty) contents to the given path."
    }
}

/// Run the init command.
pub fn run_init(args: InitArgs) -> Result<()> {
    let command = InitCommand::new(args);
    command.run()
}
