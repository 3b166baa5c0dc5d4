//! Output formatting for exec command results.

use super::execute::ExecResult;
use crate::output::Outputable;

impl Outputable for ExecResult {
    fn to_table(&self) -> String {
        let rows = match self.changed {
            1 => "1 row changed".to_string(),
            n => format!("{} rows changed", n),
        };
        match self.parameters {
            0 => format!("OK, {} ({})", rows, self.backend),
            1 => format!("OK, {} ({}, 1 parameter)", rows, self.backend),
            n => format!("OK, {} ({}, {} parameters)", rows, self.backend, n),
        }
    }
}
