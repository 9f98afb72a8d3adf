//! Chess piece identification for the loaded mesh components.
//!
//! The model files name their objects after the piece they contain: the
//! first player's meshes are `TORRE3`, `Object3`, `ALFIERE3`, `REGINA2`,
//! `RE2` and `PEDONE13`, the second player's are the `02`/`01`/`12`
//! variants. Classifying once at load time means the render path never
//! compares strings.

use glam::Vec3;

/// Object name of the board mesh in the board model file.
pub const BOARD_MESH_NAME: &str = "12951_Stone_Chess_Board";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

/// What a loaded mesh component represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Board,
    Piece { piece: PieceType, color: PieceColor },
    Other,
}

impl ComponentKind {
    pub fn from_mesh_name(name: &str) -> Self {
        use PieceColor::{Black, White};
        use PieceType::{Bishop, King, Knight, Pawn, Queen, Rook};

        match name {
            BOARD_MESH_NAME => ComponentKind::Board,
            "TORRE3" => ComponentKind::Piece { piece: Rook, color: White },
            "Object3" => ComponentKind::Piece { piece: Knight, color: White },
            "ALFIERE3" => ComponentKind::Piece { piece: Bishop, color: White },
            "REGINA2" => ComponentKind::Piece { piece: Queen, color: White },
            "RE2" => ComponentKind::Piece { piece: King, color: White },
            "PEDONE13" => ComponentKind::Piece { piece: Pawn, color: White },
            "TORRE02" => ComponentKind::Piece { piece: Rook, color: Black },
            "Object02" => ComponentKind::Piece { piece: Knight, color: Black },
            "ALFIERE02" => ComponentKind::Piece { piece: Bishop, color: Black },
            "REGINA01" => ComponentKind::Piece { piece: Queen, color: Black },
            "RE01" => ComponentKind::Piece { piece: King, color: Black },
            "PEDONE12" => ComponentKind::Piece { piece: Pawn, color: Black },
            _ => ComponentKind::Other,
        }
    }

    /// The white knight and bishop meshes face backwards in the model file
    /// and get an extra half turn about Z whenever they are rotated upright.
    pub fn needs_flip(&self) -> bool {
        matches!(
            self,
            ComponentKind::Piece {
                piece: PieceType::Knight | PieceType::Bishop,
                color: PieceColor::White,
            }
        )
    }

    /// Centering translation applied last in the model matrix. The board
    /// sinks by half its depth so its surface lands on the X/Y plane;
    /// everything else keeps its own base height.
    pub fn anchor_offset(&self, center: Vec3) -> Vec3 {
        match self {
            ComponentKind::Board => Vec3::new(-center.x, -center.y, -center.z / 2.0),
            _ => Vec3::new(-center.x, 0.0, -center.z),
        }
    }
}
