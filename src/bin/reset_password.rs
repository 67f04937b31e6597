use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use cuentas_rs::{PasswordHash, ValidatedPassword, get_user_by_username, update_password};

/// A utility for changing the password of a registered user.
///
/// Replaces the e-mail based reset flow: an operator with access to the
/// database file resets the password in place.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The username whose password should be replaced.
    #[arg(long)]
    username: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let connection = Connection::open(db_path)
        .unwrap_or_else(|_| panic!("Could not open the database at {db_path:?}"));

    let user = match get_user_by_username(&args.username, &connection) {
        Ok(user) => user,
        Err(error) => {
            print_error(format!("Could not load user \"{}\": {error}", args.username));
            exit(1);
        }
    };
    println!("Resetting password for {}", user.username);

    let password_hash = match prompt_new_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };

    update_password(&user.username, password_hash, &connection)?;
    println!("Password updated successfully!");

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }
}

fn prompt_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a new password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        let validated = match ValidatedPassword::new(&first_password) {
            Ok(validated) => validated,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(&validated) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
                continue;
            }
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
