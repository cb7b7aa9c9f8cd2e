//! Redacting sensitive arguments
//!
//! Run with: cargo run --example redacted

use rust_log_router::prelude::*;
use std::fmt;

struct SecretCredentials {
    username: String,
    password: String,
}

// prints the password in cleartext
impl fmt::Display for SecretCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.username, self.password)
    }
}

impl Redactable for SecretCredentials {
    fn redacted(&self) -> String {
        format!("{}:********", self.username)
    }
}

fn main() -> Result<()> {
    let secret = SecretCredentials {
        username: "fooser".to_string(),
        password: "t0ps3cr3t".to_string(),
    };

    let logging = init()?;
    let logger = logging.logger("myapp");
    logger.noticef(
        "Note how the password gets redacted in the logs: {}",
        vec![Arg::redacted(secret)],
    )?;

    logging.close()
}
