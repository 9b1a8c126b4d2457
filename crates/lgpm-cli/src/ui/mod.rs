//! Terminal presentation: status lines, tables and the install reporter.

use crossterm::style::Stylize;

mod reporter;
pub(crate) mod table;

pub(crate) use reporter::ConsoleReporter;

pub(crate) fn section(title: &str) {
    println!("{}", title.bold());
}

pub(crate) fn info(msg: &str) {
    println!("{} {msg}", "•".dark_grey());
}

pub(crate) fn success(msg: &str) {
    println!("{} {msg}", "✓".green());
}
