//! Asset location settings.
//!
//! The model and texture files are looked up under a single assets root,
//! resolved once at startup. `CHESSVIEW_ASSETS_ROOT` overrides the search;
//! otherwise an `assets` directory next to the executable wins, then the
//! repository checkout layout.

use std::path::{Path, PathBuf};

use tracing::warn;

pub const CHESSVIEW_ASSETS_ROOT_ENV: &str = "CHESSVIEW_ASSETS_ROOT";

/// Board model, relative to the assets root.
pub const BOARD_MODEL_FILE: &str = "board/12951_Stone_Chess_Board_v1_L3.obj";
/// Piece set model, relative to the assets root.
pub const PIECES_MODEL_FILE: &str = "pieces/chess.obj";

/// Directory holding the board textures, relative to the assets root.
pub const BOARD_TEXTURE_DIR: &str = "board";
/// Directory holding the piece textures, relative to the assets root.
pub const PIECES_TEXTURE_DIR: &str = "pieces";
/// Texture references with this stem belong to the board directory.
pub const BOARD_TEXTURE_STEM: &str = "12951_Stone_Chess_Board_diff";

pub fn assets_root() -> PathBuf {
    if let Ok(explicit) = std::env::var(CHESSVIEW_ASSETS_ROOT_ENV) {
        let path = PathBuf::from(&explicit);
        if path.exists() {
            return path;
        }
        warn!(
            "{} points at {:?} which does not exist, falling back",
            CHESSVIEW_ASSETS_ROOT_ENV, explicit
        );
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let sibling_assets = exe_dir.join("assets");
            if sibling_assets.exists() {
                return sibling_assets;
            }
        }
    }

    let repo_assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
    if repo_assets.exists() {
        return repo_assets;
    }

    PathBuf::from("assets")
}
