//! The interactive shell: a menu loop that reads the operator's choices and
//! field values line by line and drives the [`Ledger`].
//!
//! Generic over the input and output streams so it can run against a
//! terminal or an in-memory script.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::warn;

use crate::ledger::{Applied, Ledger};
use crate::{Error, Result};

const MENU: &str = "\
1) Open account
2) Deposit money
3) Withdraw money
4) Inspect account
5) Exit";

enum Stop {
    EndOfInput,
    Failed(Error),
}

impl From<io::Error> for Stop {
    fn from(err: io::Error) -> Self {
        Stop::Failed(err.into())
    }
}

/// Runs the shell until `exit` or end of input, then saves the ledger.
///
/// # Errors
/// Returns an error if reading input or writing output fails, or if the
/// shutdown save fails. Operation errors are reported to the operator and
/// do not end the session.
pub fn run<R, W>(ledger: &mut Ledger, input: R, output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut shell = Shell {
        ledger,
        input,
        output,
    };
    match shell.session() {
        Ok(()) | Err(Stop::EndOfInput) => {}
        Err(Stop::Failed(err)) => return Err(err),
    }
    shell.shutdown()
}

struct Shell<'a, R, W> {
    ledger: &'a mut Ledger,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<'_, R, W> {
    fn session(&mut self) -> Result<(), Stop> {
        writeln!(self.output, "{MENU}")?;
        loop {
            let choice = self.ask("Select an option: ")?;
            match choice.trim().to_ascii_lowercase().as_str() {
                "1" | "open" => self.open()?,
                "2" | "deposit" => self.deposit()?,
                "3" | "withdraw" => self.withdraw()?,
                "4" | "inspect" => self.inspect()?,
                "5" | "exit" | "quit" => return Ok(()),
                "?" | "help" | "menu" => writeln!(self.output, "{MENU}")?,
                "" => {}
                other => writeln!(self.output, "Unknown option '{other}', type 'help' for the menu")?,
            }
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        self.ledger.save()?;
        writeln!(self.output, "Accounts saved to {}", self.ledger.path().display())?;
        self.output.flush()?;
        Ok(())
    }

    fn open(&mut self) -> Result<(), Stop> {
        let holder_name = self.ask("Holder name: ")?;
        let address = self.ask("Address: ")?;
        let kind = self.ask("Account kind, savings (s) or current (c): ")?;
        let Some(initial_deposit) = self.ask_number::<i64>("Initial deposit: ")? else {
            return Ok(());
        };
        match self
            .ledger
            .open(holder_name.trim(), address.trim(), &kind, initial_deposit)
        {
            Ok(applied) => {
                writeln!(self.output, "Account {} opened", applied.value)?;
                self.report_durability(&applied)
            }
            Err(err) => self.report_error(err),
        }
    }

    fn deposit(&mut self) -> Result<(), Stop> {
        let Some(id) = self.ask_number::<u32>("Account number: ")? else {
            return Ok(());
        };
        let Some(amount) = self.ask_number::<i64>("Amount to deposit: ")? else {
            return Ok(());
        };
        let result = self.ledger.deposit(id, amount);
        self.report_balance(id, result)
    }

    fn withdraw(&mut self) -> Result<(), Stop> {
        let Some(id) = self.ask_number::<u32>("Account number: ")? else {
            return Ok(());
        };
        let Some(amount) = self.ask_number::<i64>("Amount to withdraw: ")? else {
            return Ok(());
        };
        let result = self.ledger.withdraw(id, amount);
        self.report_balance(id, result)
    }

    fn inspect(&mut self) -> Result<(), Stop> {
        let Some(id) = self.ask_number::<u32>("Account number: ")? else {
            return Ok(());
        };
        match self.ledger.inspect(id) {
            Ok(view) => {
                writeln!(self.output, "Account: {id}")?;
                writeln!(self.output, "Name: {}", view.holder_name)?;
                writeln!(self.output, "Address: {}", view.address)?;
                writeln!(self.output, "Kind: {}", view.kind)?;
                writeln!(self.output, "Balance: {}", view.balance)?;
                Ok(())
            }
            Err(err) => self.report_error(err),
        }
    }

    fn report_balance(&mut self, id: u32, result: Result<Applied<u64>>) -> Result<(), Stop> {
        match result {
            Ok(applied) => {
                writeln!(self.output, "Account {id} balance: {}", applied.value)?;
                self.report_durability(&applied)
            }
            Err(err) => self.report_error(err),
        }
    }

    fn report_durability<T>(&mut self, applied: &Applied<T>) -> Result<(), Stop> {
        if let Some(err) = &applied.save_error {
            warn!(%err, "mutation kept in memory only");
            writeln!(
                self.output,
                "Warning: change not saved, durability not guaranteed ({err})"
            )?;
        }
        Ok(())
    }

    fn report_error(&mut self, err: Error) -> Result<(), Stop> {
        writeln!(self.output, "Error: {err}")?;
        Ok(())
    }

    /// Prompts and reads one line, without its line terminator.
    fn ask(&mut self, prompt: &str) -> Result<String, Stop> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Stop::EndOfInput);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(line)
    }

    /// Prompts for a number; an unparseable answer is reported and yields `None`.
    fn ask_number<T>(&mut self, prompt: &str) -> Result<Option<T>, Stop>
    where
        T: FromStr,
        T::Err: Display,
    {
        let answer = self.ask(prompt)?;
        let answer = answer.trim();
        match answer.parse() {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                writeln!(self.output, "Error: '{answer}' is not a valid number ({err})")?;
                Ok(None)
            }
        }
    }
}
