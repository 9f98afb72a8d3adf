//! Pure helpers derived from a component's vertex positions.

use glam::Vec3;

/// Arithmetic mean of all vertex positions. An empty slice yields the origin.
pub fn geometric_center(vertices: &[Vec3]) -> Vec3 {
    if vertices.is_empty() {
        return Vec3::ZERO;
    }
    let sum: Vec3 = vertices.iter().copied().sum();
    sum / vertices.len() as f32
}

/// Componentwise axis-aligned bounding box. The caller must pass at least
/// one vertex; the first element seeds both limits.
pub fn bounding_box(vertices: &[Vec3]) -> (Vec3, Vec3) {
    let mut min = vertices[0];
    let mut max = vertices[0];
    for vertex in &vertices[1..] {
        min = min.min(*vertex);
        max = max.max(*vertex);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_the_arithmetic_mean() {
        let vertices = [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(3.0, 0.0, -3.0),
            Vec3::new(2.0, 4.0, 6.0),
        ];
        assert_eq!(geometric_center(&vertices), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_center_of_no_vertices_is_the_origin() {
        assert_eq!(geometric_center(&[]), Vec3::ZERO);
    }

    #[test]
    fn test_center_of_a_single_vertex_is_that_vertex() {
        let vertex = Vec3::new(-4.5, 0.25, 9.0);
        assert_eq!(geometric_center(&[vertex]), vertex);
    }

    #[test]
    fn test_bounding_box_contains_every_vertex() {
        let vertices = [
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-5.0, 4.0, 0.5),
            Vec3::new(2.0, 2.0, -7.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let (min, max) = bounding_box(&vertices);
        for vertex in &vertices {
            assert!(min.x <= vertex.x && vertex.x <= max.x);
            assert!(min.y <= vertex.y && vertex.y <= max.y);
            assert!(min.z <= vertex.z && vertex.z <= max.z);
        }
        assert_eq!(min, Vec3::new(-5.0, -2.0, -7.0));
        assert_eq!(max, Vec3::new(2.0, 4.0, 3.0));
    }

    #[test]
    fn test_bounding_box_of_a_single_vertex_is_degenerate() {
        let vertex = Vec3::new(5.0, -1.0, 2.5);
        assert_eq!(bounding_box(&[vertex]), (vertex, vertex));
    }
}
