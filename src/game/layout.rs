//! The fixed opening layout of the scene.
//!
//! All distances derive from the board model: the board mesh scaled by
//! [`BOARD_SCALE`] has squares of [`SQUARE_SIZE`] world units per side, and
//! piece files/ranks are addressed in half-square multiples from the board
//! center. The second player's entries are mirrored, never written out.

use glam::Vec3;

use crate::engine::components::placement::{PlacementRule, PlacementTable};
use crate::game::pieces::BOARD_MESH_NAME;

/// Uniform scale applied to the board mesh.
pub const BOARD_SCALE: f32 = 0.6;
/// Side length of one board square in world units, after scaling.
pub const SQUARE_SIZE: f32 = BOARD_SCALE * 5.4;
/// Uniform scale applied to every piece mesh.
pub const PIECE_SCALE: f32 = 0.015;
/// Z of the platform the scene sits on.
pub const PLATFORM_HEIGHT: f32 = -3.0;

/// Builds the full placement table: the board, the first player's pieces,
/// and the second player's pieces derived by mirroring.
pub fn build_table() -> PlacementTable {
    let mut table = PlacementTable::new();

    table.insert(
        BOARD_MESH_NAME,
        PlacementRule {
            count: 1,
            stride: 0,
            angle: 0.0,
            axis: Vec3::X,
            scale: Vec3::splat(BOARD_SCALE),
            position: Vec3::new(0.0, 0.0, PLATFORM_HEIGHT),
        },
    );

    // name, mirrored name, count, stride, file (X), rank (Y), both in squares
    let pieces = [
        ("TORRE3", "TORRE02", 2, 7, -3.5, -3.5),
        ("Object3", "Object02", 2, 5, -2.5, -3.5),
        ("ALFIERE3", "ALFIERE02", 2, 3, -1.5, -3.5),
        ("REGINA2", "REGINA01", 1, 0, -0.5, -3.5),
        ("RE2", "RE01", 1, 0, 0.5, -3.5),
        ("PEDONE13", "PEDONE12", 8, 1, -3.5, -2.5),
    ];

    for (name, mirrored_name, count, stride, file, rank) in pieces {
        let rule = PlacementRule {
            count,
            stride,
            angle: 90.0,
            axis: Vec3::X,
            scale: Vec3::splat(PIECE_SCALE),
            position: Vec3::new(file * SQUARE_SIZE, rank * SQUARE_SIZE, PLATFORM_HEIGHT),
        };
        table.insert(name, rule);
        table.insert(mirrored_name, rule.mirrored());
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_the_board_and_both_players() {
        let table = build_table();
        assert_eq!(table.len(), 13);
        assert!(table.get(BOARD_MESH_NAME).is_some());
    }

    #[test]
    fn test_board_entry_is_a_single_unrotated_instance() {
        let table = build_table();
        let board = table.get(BOARD_MESH_NAME).unwrap();
        assert_eq!(board.count, 1);
        assert_eq!(board.stride, 0);
        assert_eq!(board.angle, 0.0);
        assert_eq!(board.scale, Vec3::splat(BOARD_SCALE));
        assert_eq!(board.position, Vec3::new(0.0, 0.0, PLATFORM_HEIGHT));
    }

    #[test]
    fn test_every_second_player_entry_mirrors_the_first() {
        let table = build_table();
        let pairs = [
            ("TORRE3", "TORRE02"),
            ("Object3", "Object02"),
            ("ALFIERE3", "ALFIERE02"),
            ("REGINA2", "REGINA01"),
            ("RE2", "RE01"),
            ("PEDONE13", "PEDONE12"),
        ];
        for (first, second) in pairs {
            let a = table.get(first).unwrap();
            let b = table.get(second).unwrap();
            assert_eq!(*b, a.mirrored(), "pair {first}/{second}");
            assert_eq!(b.position.y, -a.position.y, "pair {first}/{second}");
        }
    }

    #[test]
    fn test_pawns_fill_their_rank() {
        let table = build_table();
        let pawns = table.get("PEDONE13").unwrap();
        assert_eq!(pawns.count, 8);
        assert_eq!(pawns.stride, 1);
        assert_eq!(pawns.position.x, -3.5 * SQUARE_SIZE);
        assert_eq!(pawns.position.y, -2.5 * SQUARE_SIZE);

        let last = pawns.expand(SQUARE_SIZE).last().unwrap();
        assert!((last.position.x - 3.5 * SQUARE_SIZE).abs() < 1e-4);
    }

    #[test]
    fn test_rooks_sit_on_opposite_files() {
        let table = build_table();
        let rooks = table.get("TORRE3").unwrap();
        assert_eq!(rooks.count, 2);
        assert_eq!(rooks.stride, 7);

        let instances: Vec<_> = rooks.expand(SQUARE_SIZE).collect();
        assert_eq!(instances.len(), 2);
        assert!((instances[1].position.x - 3.5 * SQUARE_SIZE).abs() < 1e-4);
    }

    #[test]
    fn test_pieces_rotate_upright_about_x() {
        let table = build_table();
        for (name, rule) in table.iter() {
            if name == BOARD_MESH_NAME {
                continue;
            }
            assert_eq!(rule.angle, 90.0, "entry {name}");
            assert_eq!(rule.axis, Vec3::X, "entry {name}");
            assert_eq!(rule.scale, Vec3::splat(PIECE_SCALE), "entry {name}");
        }
    }
}
