use async_trait::async_trait;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Line-oriented user interaction
#[async_trait]
pub trait Console: Send + Sync {
    /// Show `prompt` without a newline and read one line.
    ///
    /// Returns `Ok(None)` once input is closed.
    async fn read_line(&self, prompt: &str) -> io::Result<Option<String>>;

    /// Print one line of output
    fn say(&self, message: &str);
}

/// Console over the process's stdin and stdout
pub struct StdConsole {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{}", prompt)?;
            stdout.flush()?;
        }
        self.lines.lock().await.next_line().await
    }

    fn say(&self, message: &str) {
        println!("{}", message);
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedConsole;

#[cfg(any(test, feature = "test-util"))]
mod scripted {
    use super::*;
    use std::collections::VecDeque;

    /// Console fed from a fixed list of input lines.
    ///
    /// Prompts and printed lines are recorded in order; input runs out as EOF.
    #[derive(Default)]
    pub struct ScriptedConsole {
        inputs: std::sync::Mutex<VecDeque<String>>,
        output: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedConsole {
        pub fn new<I, S>(inputs: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                inputs: std::sync::Mutex::new(inputs.into_iter().map(Into::into).collect()),
                output: std::sync::Mutex::new(Vec::new()),
            }
        }

        /// Everything prompted or printed so far
        pub fn output(&self) -> Vec<String> {
            self.output.lock().expect("console lock poisoned").clone()
        }

        /// Number of output entries containing `needle`
        pub fn count(&self, needle: &str) -> usize {
            self.output().iter().filter(|l| l.contains(needle)).count()
        }

        pub fn remaining_inputs(&self) -> usize {
            self.inputs.lock().expect("console lock poisoned").len()
        }
    }

    #[async_trait]
    impl Console for ScriptedConsole {
        async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
            self.output
                .lock()
                .expect("console lock poisoned")
                .push(prompt.to_string());
            Ok(self
                .inputs
                .lock()
                .expect("console lock poisoned")
                .pop_front())
        }

        fn say(&self, message: &str) {
            self.output
                .lock()
                .expect("console lock poisoned")
                .push(message.to_string());
        }
    }
}
