use anyhow::Result;
use qrseal::KdfParams;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Args)]
pub struct ScryptArgs {
    /// scrypt CPU/memory cost N, a power of two (default: 16384)
    #[arg(long = "scrypt-n", env = "QR_SCRYPT_N", global = true)]
    n: Option<u32>,

    /// scrypt block size r (default: 8)
    #[arg(long = "scrypt-r", env = "QR_SCRYPT_R", global = true)]
    r: Option<u32>,

    /// scrypt parallelism p (default: 1)
    #[arg(long = "scrypt-p", env = "QR_SCRYPT_P", global = true)]
    p: Option<u32>,
}

impl ScryptArgs {
    pub fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();

        let kdf = KdfParams::new(
            self.n.unwrap_or(default.n()),
            self.r.unwrap_or(default.r()),
            self.p.unwrap_or(default.p()),
        )?;
        debug!(n = kdf.n(), r = kdf.r(), p = kdf.p(), "scrypt parameters");
        Ok(kdf)
    }
}

/// Loads `.env` from the working directory (or a parent) into the process
/// environment. Must run before argument parsing so clap sees the values.
pub fn load_env_file() -> dotenvy::Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn report_env_file(loaded: dotenvy::Result<Option<PathBuf>>) {
    match loaded {
        Ok(Some(path)) => debug!(path = %path.display(), "loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!("ignoring unreadable .env file: {e}"),
    }
}

/// Logs go to stderr so stdout stays clean for tokens and payloads.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
