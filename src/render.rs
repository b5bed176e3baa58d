use anyhow::{Context, Result, bail};
use image::Luma;
use qrcode::QrCode;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders `data` as a QR code and writes `<out_dir>/<name>.png`.
///
/// Creates `out_dir` if it doesn't exist.
pub fn save_qr_png(data: &str, out_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        bail!("invalid image name '{name}': expected a file name without extension");
    }

    let code = QrCode::new(data.as_bytes()).context("data too large for a QR code")?;
    let img = code.render::<Luma<u8>>().build();

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join(format!("{name}.png"));
    img.save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}
