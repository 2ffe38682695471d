//! Prints a password hash for a `[[users]]` entry.

use std::io::{self, Write};

use tessera_core::CompositePasswordEncoder;

fn main() -> anyhow::Result<()> {
    eprint!("Enter password: ");
    io::stderr().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim();

    if password.is_empty() {
        eprintln!("Password cannot be empty");
        std::process::exit(1);
    }

    let hashed = CompositePasswordEncoder::default().encode(password)?;
    println!("{}", hashed.hash);
    Ok(())
}
