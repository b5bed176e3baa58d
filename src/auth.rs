use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const PASSPHRASE_ENV: &str = "QR_PASSPHRASE";

/// Reads the sealing passphrase.
///
/// Sources, in order: `QR_PASSPHRASE`, one line of piped stdin, a TTY
/// prompt. With `confirm`, the TTY prompt asks twice.
pub fn read_passphrase(confirm: bool) -> Result<Zeroizing<String>> {
    //  Environment Variable (or .env)
    //  QR_PASSPHRASE="a-very-strong-passphrase" qrseal encode ...
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    //  stdin (Pipeline)
    //  printf "%s" "$SECRET" | qrseal decode v1....
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(buf);
        }
        bail!("missing passphrase: set {PASSPHRASE_ENV} or pipe it on stdin");
    }

    //  Interactive (TTY)
    let pw = Zeroizing::new(rpassword::prompt_password("Passphrase: ")?);
    if pw.is_empty() {
        bail!("missing passphrase: set {PASSPHRASE_ENV} or enter one when prompted");
    }

    if confirm {
        let again = Zeroizing::new(rpassword::prompt_password("Confirm passphrase: ")?);
        if pw != again {
            bail!("passphrases do not match");
        }
    }

    Ok(pw)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
