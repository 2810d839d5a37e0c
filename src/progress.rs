// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of ProgressPrinter structure for printing the progress of an analysis run.

use colored::{ColoredString, Colorize};
use std::io::Write;

/// Progress of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Trajectory reading is in progress.
    Running,
    /// Trajectory has been read completely.
    Completed,
    /// Trajectory reading or analysis failed.
    Failed,
}

/// String that can be used inside `ProgressPrinter`.
#[derive(Debug, Clone, PartialEq)]
struct ProgressMessage {
    msg: ColoredString,
}

impl ProgressMessage {
    /// Create new `ProgressMessage`.
    ///
    /// ## Panics
    /// Panics if the string is longer than 9 characters.
    fn new(string: ColoredString) -> Self {
        if string.chars().count() > 9 {
            panic!("FATAL TRAJAN ERROR | ProgressMessage::new | `ProgressMessage` can not be longer than 9 characters.");
        }

        ProgressMessage { msg: string }
    }

    /// Write formatted `ProgressMessage`.
    fn print(&self, out: &mut dyn Write, colored: bool) -> std::io::Result<()> {
        if colored {
            write!(out, "[{: ^9}]   ", self.msg)
        } else {
            write!(out, "[{: ^9}]   ", self.msg.as_ref() as &str)
        }
    }
}

/// Structure handling printing of progress of an analysis run.
/// Constructed using `ProgressPrinter::new()` and associated with
/// an `AnalysisEngine` using `AnalysisEngine::with_progress()`.
pub struct ProgressPrinter {
    /// Stream to write the progress info to.
    output: Box<dyn Write>,
    /// Current status of the run. Default: ProgressStatus::Running.
    status: ProgressStatus,
    /// Frequency of printing. Print every `print_freq`th frame. Default: 100 frames.
    print_freq: usize,
    /// If true, the output will be colored. Default: true.
    colored: bool,
    /// String to be printed with the number of frames read. Default: "Frame".cyan().
    frame_msg: ColoredString,
    /// String to be printed with the number of frames analyzed. Default: "Processed".bright_purple().
    processed_msg: ColoredString,
    /// String to be printed when the analysis is in progress. Default: "RUNNING".yellow().
    running_msg: ProgressMessage,
    /// String to be printed when the analysis is completed. Default: "COMPLETED".green().
    completed_msg: ProgressMessage,
    /// String to be printed when the analysis failed. Default: "FAILED!".red().
    failed_msg: ProgressMessage,
    /// String terminating the progress message. Default: `\r` (carriage return).
    terminating: String,
}

impl ProgressPrinter {
    /// Create an instance of `ProgressPrinter` with default parameters.
    ///
    /// The default values of the `ProgressPrinter` parameters.
    /// - `output`: `std::io::stderr()` (stream to write the progress info to)
    /// - `status`: `ProgressStatus::Running`
    /// - `print_freq`: `100` (progress info will be printed every 100 frames read)
    /// - `colored`: `true`
    /// - `frame_msg`: `"Frame".cyan()`
    /// - `processed_msg`: `"Processed".bright_purple()`
    /// - `running_msg`: `"RUNNING".yellow()`
    /// - `completed_msg`: `"COMPLETED".green()`
    /// - `failed_msg`: `"FAILED!".red()`
    /// - `terminating`: `\r` (useful to set to `\n` when printing to a file)
    ///
    /// ## Example
    /// ```no_run
    /// use trajan_rs::prelude::*;
    /// use colored::Colorize;
    ///
    /// let file = std::fs::File::create("progress.log").unwrap();
    /// let printer = ProgressPrinter::new()
    ///     .with_output(Box::from(file))
    ///     .with_print_freq(500)
    ///     .with_colored(false)
    ///     .with_running_msg("ANALYZING".yellow())
    ///     .with_terminating("\n");
    /// ```
    pub fn new() -> Self {
        ProgressPrinter {
            output: Box::from(std::io::stderr()),
            status: ProgressStatus::Running,
            print_freq: 100,
            colored: true,
            frame_msg: "Frame".cyan(),
            processed_msg: "Processed".bright_purple(),
            running_msg: ProgressMessage::new("RUNNING".yellow()),
            completed_msg: ProgressMessage::new("COMPLETED".green()),
            failed_msg: ProgressMessage::new("FAILED!".red()),
            terminating: String::from("\r"),
        }
    }

    /// Create new `ProgressPrinter` with specific `output` stream.
    pub fn with_output(mut self, stream: Box<dyn Write>) -> Self {
        self.output = stream;
        self
    }

    /// Set new status to an already constructed `ProgressPrinter`.
    pub fn set_status(&mut self, status: ProgressStatus) {
        self.status = status;
    }

    /// Create new `ProgressPrinter` with specific value for `print_freq`.
    /// Frequency of zero is treated as one.
    pub fn with_print_freq(mut self, print_freq: usize) -> Self {
        self.print_freq = print_freq.max(1);
        self
    }

    /// Create new `ProgressPrinter` with specific value for `colored`.
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Create new `ProgressPrinter` with specific value for `running_msg`.
    ///
    /// ## Panics
    /// Panics if the `running_msg` is longer than 9 characters.
    pub fn with_running_msg(mut self, running_msg: ColoredString) -> Self {
        self.running_msg = ProgressMessage::new(running_msg);
        self
    }

    /// Create new `ProgressPrinter` with specific value for `completed_msg`.
    ///
    /// ## Panics
    /// Panics if the `completed_msg` is longer than 9 characters.
    pub fn with_completed_msg(mut self, completed_msg: ColoredString) -> Self {
        self.completed_msg = ProgressMessage::new(completed_msg);
        self
    }

    /// Create new `ProgressPrinter` with specific value for `failed_msg`.
    ///
    /// ## Panics
    /// Panics if the `failed_msg` is longer than 9 characters.
    pub fn with_failed_msg(mut self, failed_msg: ColoredString) -> Self {
        self.failed_msg = ProgressMessage::new(failed_msg);
        self
    }

    /// Create new `ProgressPrinter` with specific value for `terminating`.
    pub fn with_terminating(mut self, string: &str) -> Self {
        self.terminating = string.to_string();
        self
    }

    /// Print progress info about the run.
    /// While running, info is only printed for every `print_freq`th frame.
    pub fn print(&mut self, frames_read: usize, frames_processed: usize) -> std::io::Result<()> {
        if self.status == ProgressStatus::Running && frames_read % self.print_freq != 0 {
            return Ok(());
        }

        match self.status {
            ProgressStatus::Running => self.running_msg.print(&mut self.output, self.colored)?,
            ProgressStatus::Completed => self.completed_msg.print(&mut self.output, self.colored)?,
            ProgressStatus::Failed => self.failed_msg.print(&mut self.output, self.colored)?,
        }

        if self.colored {
            write!(
                self.output,
                "{} {:12} | {} {:12}{}",
                self.frame_msg, frames_read, self.processed_msg, frames_processed, self.terminating
            )?;
        } else {
            write!(
                self.output,
                "{} {:12} | {} {:12}{}",
                self.frame_msg.as_ref() as &str,
                frames_read,
                self.processed_msg.as_ref() as &str,
                frames_processed,
                self.terminating
            )?;
        }

        if self.status != ProgressStatus::Running {
            writeln!(self.output)?;
        }

        self.output.flush()
    }
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
