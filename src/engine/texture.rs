//! Texture reference resolution and BMP upload.
//!
//! Material files in these models carry mangled diffuse map references
//! such as `" king_texture.2 "`, a bare stem with a numeric suffix left
//! over from export. [`resolve`] turns such a reference into the path of
//! the real `.bmp` under the assets tree; the suffix is validated and
//! discarded.

use std::path::{Path, PathBuf};

use glow::HasContext;
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture reference {reference:?} does not name a file")]
    Unresolvable { reference: String },
    #[error("failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to allocate a GL texture: {0}")]
    Allocate(String),
}

/// Maps a raw material reference onto `<root>/<dir>/<stem>.bmp`.
///
/// The reference is trimmed, then split at its last dot. The stem must be
/// non-empty and consist of ASCII alphanumerics and underscores; the
/// suffix must be alphanumeric and may be empty. The board diffuse stem
/// selects the board directory, everything else resolves under the pieces
/// directory.
pub fn resolve(assets_root: &Path, raw: &str) -> Result<PathBuf, TextureError> {
    let unresolvable = || TextureError::Unresolvable {
        reference: raw.to_string(),
    };

    let reference = raw.trim();
    let Some((stem, suffix)) = reference.rsplit_once('.') else {
        return Err(unresolvable());
    };
    let stem_ok = !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    let suffix_ok = suffix.chars().all(|c| c.is_ascii_alphanumeric());
    if !stem_ok || !suffix_ok {
        return Err(unresolvable());
    }

    let dir = if stem == config::BOARD_TEXTURE_STEM {
        config::BOARD_TEXTURE_DIR
    } else {
        config::PIECES_TEXTURE_DIR
    };
    Ok(assets_root.join(dir).join(format!("{stem}.bmp")))
}

/// Decodes the BMP at `path` and uploads it as a linearly filtered,
/// repeating RGBA texture.
pub fn load_bmp(gl: &glow::Context, path: &Path) -> Result<glow::Texture, TextureError> {
    let image = image::open(path).map_err(|source| TextureError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    // BMP rows are stored bottom-up, which is the orientation the model
    // UVs expect. The decoder reorders them top-down, so flip back.
    let pixels = image.flipv().to_rgba8();
    let (width, height) = pixels.dimensions();

    let texture = unsafe {
        let texture = gl.create_texture().map_err(TextureError::Allocate)?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            width as i32,
            height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&pixels)),
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
        gl.bind_texture(glow::TEXTURE_2D, None);
        texture
    };
    Ok(texture)
}
