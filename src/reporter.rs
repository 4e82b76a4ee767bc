//! @acp:module "Task Reporter"
//! @acp:summary "Step-by-step progress reporting for host mutations"
//! @acp:domain cli
//! @acp:layer output

use console::style;

/// Receives one line per completed step.
///
/// `outcome` is `Some(true)` for success, `Some(false)` for failure and
/// `None` when the step needed no action.
pub trait TaskReporter {
    fn task(&self, label: &str, outcome: Option<bool>);
}

impl<F> TaskReporter for F
where
    F: Fn(&str, Option<bool>),
{
    fn task(&self, label: &str, outcome: Option<bool>) {
        self(label, outcome)
    }
}

/// Prints tasks to stdout with status glyphs
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl TaskReporter for ConsoleReporter {
    fn task(&self, label: &str, outcome: Option<bool>) {
        match outcome {
            Some(true) => println!("{} {}", style("✓").green(), label),
            Some(false) => println!("{} {}", style("✗").red(), style(label).red()),
            None => println!("{} {}", style("-").dim(), style(label).dim()),
        }
    }
}
