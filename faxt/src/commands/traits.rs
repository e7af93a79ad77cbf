//! Command trait and common types for the faxt CLI.
//!
//! This module defines the standard command traits that all commands
//! must implement to ensure consistency across the application.

#![allow(dead_code)]

use crate::error::Result;

/// Standard command trait that all faxt commands must implement.
///
/// This trait ensures consistent structure and behavior across all commands.
///
/// # Type Parameters
/// * `Args` - The arguments type for this command
/// * `Output` - The output type returned by this command
pub trait Command {
    /// The arguments type for this command.
    type Args;

    /// The output type returned by this command.
    type Output;

    /// Create a new command instance with the given arguments.
    ///
    /// # Arguments
    /// * `args` - Command arguments
    ///
    /// # Returns
    /// * `Self` - A new command instance
    fn new(args: Self::Args) -> Self;

    /// Execute the command.
    ///
    /// # Returns
    /// * `Result<Self::Output>` - The command output or an error
    fn execute(&self) -> Result<Self::Output>;

    /// Get the command name.
    ///
    /// # Returns
    /// * `&'static str` - The command name
    fn name() -> &'static str;
}

/// Trait for providing command descriptions and help text.
///
/// This trait allows commands to provide human-readable descriptions
/// and detailed help information for CLI documentation.
pub trait CommandDescription {
    /// Get a short description of the command.
    ///
    /// # Returns
    /// * `&'static str` - A brief one-line description
    fn description() -> &'static str;

    /// Get detailed help text for the command.
    ///
    /// # Returns
    /// * `&'static str` - Multi-line help text explaining usage
    fn help() -> &'static str;
}

