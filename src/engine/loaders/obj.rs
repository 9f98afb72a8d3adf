//! Wavefront OBJ and MTL parsing into mesh components.
//!
//! Vertex data in an OBJ file is file-scoped while faces are grouped per
//! `o`/`g` section, so the parser keeps the shared arrays and remaps each
//! distinct `v/vt/vn` triple to one component-local vertex. Faces with
//! more than three corners are fan-triangulated.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::components::mesh::{MeshComponent, MeshProperties};

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
}

/// Reads the model at `path`, resolves its `mtllib` references relative to
/// the model directory and appends one [`MeshComponent`] per object section.
/// Returns how many components were appended.
pub fn load_into(path: &Path, components: &mut Vec<MeshComponent>) -> Result<usize, ObjError> {
    let text = fs::read_to_string(path).map_err(|source| ObjError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let materials = load_material_libraries(path, &text);
    parse_obj(&text, path, &materials, components)
}

fn load_material_libraries(obj_path: &Path, obj_text: &str) -> HashMap<String, String> {
    let mut materials = HashMap::new();
    let dir = obj_path.parent().unwrap_or_else(|| Path::new("."));
    for line in obj_text.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("mtllib") {
            continue;
        }
        for library in tokens {
            let lib_path = dir.join(library);
            match fs::read_to_string(&lib_path) {
                Ok(text) => {
                    let parsed = parse_mtl(&text);
                    debug!(
                        "material library {}: {} materials",
                        lib_path.display(),
                        parsed.len()
                    );
                    materials.extend(parsed);
                }
                Err(err) => {
                    warn!("material library {} unreadable: {}", lib_path.display(), err);
                }
            }
        }
    }
    materials
}

/// Maps material names to their raw `map_Kd` values. The reference is kept
/// exactly as written; the texture resolver owns all trimming and
/// validation.
pub fn parse_mtl(text: &str) -> HashMap<String, String> {
    let mut materials = HashMap::new();
    let mut current: Option<String> = None;
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("newmtl") => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                current = (!name.is_empty()).then_some(name);
            }
            Some("map_Kd") => {
                if let Some(name) = &current {
                    let raw = line
                        .trim_start()
                        .strip_prefix("map_Kd")
                        .and_then(|rest| rest.strip_prefix(char::is_whitespace))
                        .unwrap_or_default();
                    materials.insert(name.clone(), raw.to_string());
                }
            }
            _ => {}
        }
    }
    materials
}

struct ComponentBuilder {
    component: MeshComponent,
    remap: HashMap<(usize, Option<usize>, Option<usize>), u32>,
    faces: usize,
    missing_uv: bool,
    missing_normal: bool,
}

impl ComponentBuilder {
    fn new(name: &str, vertex_hint: usize, face_hint: usize) -> Self {
        let mut component = MeshComponent::new(name);
        component.reserve(vertex_hint, face_hint);
        Self {
            component,
            remap: HashMap::new(),
            faces: 0,
            missing_uv: false,
            missing_normal: false,
        }
    }

    /// Component-local vertex for one `v/vt/vn` triple, reusing the slot
    /// when the same triple appeared before.
    fn resolve(
        &mut self,
        key: (usize, Option<usize>, Option<usize>),
        positions: &[Vec3],
        uvs: &[Vec3],
        normals: &[Vec3],
    ) -> u32 {
        if let Some(&index) = self.remap.get(&key) {
            return index;
        }
        let index = self.component.vertex_count() as u32;
        self.component.add_vertex(positions[key.0]);
        match key.1 {
            Some(vt) => self.component.add_uv(uvs[vt]),
            None => {
                self.component.add_uv(Vec3::ZERO);
                self.missing_uv = true;
            }
        }
        match key.2 {
            Some(vn) => self.component.add_normal(normals[vn]),
            None => {
                self.component.add_normal(Vec3::Z);
                self.missing_normal = true;
            }
        }
        self.remap.insert(key, index);
        index
    }

    fn finish(mut self) -> Option<MeshComponent> {
        if self.faces == 0 {
            warn!(
                "object {:?} has no faces and was dropped",
                self.component.name()
            );
            return None;
        }
        self.component.set_properties(MeshProperties {
            has_positions: true,
            has_faces: true,
            has_normals: !self.missing_normal,
            has_uvs: !self.missing_uv,
            has_bones: false,
            has_tangents: false,
            has_vertex_colors: false,
            uv_channels: if self.missing_uv { 0 } else { 1 },
        });
        self.component.refresh_geometry();
        debug!(
            "object {:?}: {} vertices, {} faces",
            self.component.name(),
            self.component.vertex_count(),
            self.faces
        );
        Some(self.component)
    }
}

fn flush(
    builder: Option<ComponentBuilder>,
    components: &mut Vec<MeshComponent>,
    appended: &mut usize,
) {
    if let Some(builder) = builder {
        if let Some(component) = builder.finish() {
            components.push(component);
            *appended += 1;
        }
    }
}

fn parse_floats<'a>(
    tokens: impl Iterator<Item = &'a str>,
    want: usize,
    keyword: &str,
) -> Result<Vec<f32>, String> {
    let mut values = Vec::with_capacity(want + 1);
    for token in tokens {
        let value: f32 = token
            .parse()
            .map_err(|_| format!("bad {keyword} component {token:?}"))?;
        values.push(value);
    }
    if values.len() < want {
        return Err(format!(
            "{keyword} needs {want} components, found {}",
            values.len()
        ));
    }
    Ok(values)
}

/// 1-based from the front, negative counts from the back, zero invalid.
fn resolve_index(token: &str, len: usize) -> Option<usize> {
    let raw: i64 = token.parse().ok()?;
    let resolved = if raw < 0 { len as i64 + raw } else { raw - 1 };
    (0..len as i64).contains(&resolved).then(|| resolved as usize)
}

/// Parses OBJ text and appends the finished components, returning how many
/// were appended. `origin` only labels error messages.
pub fn parse_obj(
    text: &str,
    origin: &Path,
    materials: &HashMap<String, String>,
    components: &mut Vec<MeshComponent>,
) -> Result<usize, ObjError> {
    let parse_error = |line: usize, message: String| ObjError::Parse {
        path: origin.display().to_string(),
        line,
        message,
    };

    // Face counts per object section, section 0 being anything before the
    // first `o`/`g`. Used purely as capacity hints.
    let mut section_face_counts = vec![0usize];
    for line in text.lines() {
        match line.split_whitespace().next() {
            Some("o") | Some("g") => section_face_counts.push(0),
            Some("f") => {
                if let Some(last) = section_face_counts.last_mut() {
                    *last += 1;
                }
            }
            _ => {}
        }
    }

    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut current: Option<ComponentBuilder> = None;
    let mut section = 0usize;
    let mut appended = 0usize;
    let mut warned_unnamed = false;

    for (index, raw_line) in text.lines().enumerate() {
        let number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "v" => {
                let values =
                    parse_floats(tokens, 3, "v").map_err(|message| parse_error(number, message))?;
                positions.push(Vec3::new(values[0], values[1], values[2]));
            }
            "vt" => {
                let values = parse_floats(tokens, 2, "vt")
                    .map_err(|message| parse_error(number, message))?;
                let w = values.get(2).copied().unwrap_or(0.0);
                uvs.push(Vec3::new(values[0], values[1], w));
            }
            "vn" => {
                let values = parse_floats(tokens, 3, "vn")
                    .map_err(|message| parse_error(number, message))?;
                normals.push(Vec3::new(values[0], values[1], values[2]));
            }
            "o" | "g" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err(parse_error(number, format!("{keyword} without a name")));
                }
                flush(current.take(), components, &mut appended);
                section += 1;
                let face_hint = section_face_counts.get(section).copied().unwrap_or(0);
                current = Some(ComponentBuilder::new(&name, face_hint, face_hint));
            }
            "usemtl" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                match current.as_mut() {
                    Some(builder) => match materials.get(&name) {
                        Some(reference) => builder.component.set_texture_file(reference.clone()),
                        None => warn!("line {}: unknown material {:?}", number, name),
                    },
                    None => warn!("line {}: usemtl before any object", number),
                }
            }
            "f" => {
                if current.is_none() {
                    if !warned_unnamed {
                        warn!(
                            "line {}: face before any o or g, collecting into an unnamed object",
                            number
                        );
                        warned_unnamed = true;
                    }
                    let hint = section_face_counts.first().copied().unwrap_or(0);
                    current = Some(ComponentBuilder::new("", hint, hint));
                }
                let Some(builder) = current.as_mut() else {
                    continue;
                };

                let mut face: Vec<u32> = Vec::new();
                for token in tokens {
                    let mut parts = token.split('/');
                    let v_part = parts.next().unwrap_or_default();
                    let vt_part = parts.next();
                    let vn_part = parts.next();
                    if parts.next().is_some() {
                        return Err(parse_error(
                            number,
                            format!("malformed face vertex {token:?}"),
                        ));
                    }
                    let v = resolve_index(v_part, positions.len()).ok_or_else(|| {
                        parse_error(number, format!("vertex index {v_part:?} out of range"))
                    })?;
                    let vt = match vt_part {
                        None | Some("") => None,
                        Some(part) => Some(resolve_index(part, uvs.len()).ok_or_else(|| {
                            parse_error(number, format!("texture index {part:?} out of range"))
                        })?),
                    };
                    let vn = match vn_part {
                        None | Some("") => None,
                        Some(part) => Some(resolve_index(part, normals.len()).ok_or_else(
                            || parse_error(number, format!("normal index {part:?} out of range")),
                        )?),
                    };
                    face.push(builder.resolve((v, vt, vn), &positions, &uvs, &normals));
                }
                if face.len() < 3 {
                    return Err(parse_error(
                        number,
                        format!("face with {} vertices", face.len()),
                    ));
                }
                for i in 1..face.len() - 1 {
                    builder.component.add_triangle(face[0], face[i], face[i + 1]);
                }
                builder.faces += 1;
            }
            // mtllib is handled in its own pass; smoothing groups and
            // unknown keywords carry nothing we draw.
            _ => {}
        }
    }

    flush(current.take(), components, &mut appended);
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = "\
# chess fixture
mtllib chess.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
o TORRE3
usemtl stone
f 1/1/1 2/2/1 3/3/1 4/4/1
o PEDONE13
f 5/1/1 6/2/1 7/3/1
";

    fn stone_materials() -> HashMap<String, String> {
        let mut materials = HashMap::new();
        materials.insert("stone".to_string(), " rook_texture.2 ".to_string());
        materials
    }

    #[test]
    fn test_splits_objects_and_fan_triangulates() {
        let mut components = Vec::new();
        let appended = parse_obj(
            TWO_OBJECTS,
            Path::new("chess.obj"),
            &stone_materials(),
            &mut components,
        )
        .unwrap();

        assert_eq!(appended, 2);
        let rook = &components[0];
        assert_eq!(rook.name(), "TORRE3");
        assert_eq!(rook.vertex_count(), 4);
        assert_eq!(rook.uvs().len(), 4);
        assert_eq!(rook.normals().len(), 4);
        assert_eq!(rook.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(rook.texture_file(), " rook_texture.2 ");
        assert!(rook.properties().has_uvs);
        assert!(rook.properties().has_normals);
        assert_eq!(rook.center(), Vec3::new(0.5, 0.5, 0.0));

        let pawn = &components[1];
        assert_eq!(pawn.name(), "PEDONE13");
        assert_eq!(pawn.vertex_count(), 3);
        assert_eq!(pawn.indices(), &[0, 1, 2]);
        // Face indices are file-scoped, so the second object picked up the
        // later vertices.
        assert_eq!(pawn.positions()[0], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_repeated_triples_share_a_vertex() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
vt 0 0
vn 0 0 1
o QUAD
f 1/1/1 2/1/1 3/1/1
f 2/1/1 4/1/1 3/1/1
";
        let mut components = Vec::new();
        parse_obj(text, Path::new("quad.obj"), &HashMap::new(), &mut components).unwrap();
        assert_eq!(components[0].vertex_count(), 4);
        assert_eq!(components[0].index_count(), 6);
    }

    #[test]
    fn test_negative_indices_count_from_the_back() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
o TRI
f -3 -2 -1
";
        let mut components = Vec::new();
        parse_obj(text, Path::new("tri.obj"), &HashMap::new(), &mut components).unwrap();
        let tri = &components[0];
        assert_eq!(tri.positions()[0], Vec3::ZERO);
        assert_eq!(tri.positions()[2], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_out_of_range_index_reports_the_line() {
        let text = "\
v 0 0 0
o BAD
f 1 2 3
";
        let mut components = Vec::new();
        let err = parse_obj(text, Path::new("bad.obj"), &HashMap::new(), &mut components)
            .unwrap_err();
        match err {
            ObjError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_object_without_faces_is_dropped() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
o EMPTY
o REAL
f 1 2 3
";
        let mut components = Vec::new();
        let appended =
            parse_obj(text, Path::new("sparse.obj"), &HashMap::new(), &mut components).unwrap();
        assert_eq!(appended, 1);
        assert_eq!(components[0].name(), "REAL");
    }

    #[test]
    fn test_missing_texture_coordinates_are_padded() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
o FLAT
f 1//1 2//1 3//1
";
        let mut components = Vec::new();
        parse_obj(text, Path::new("flat.obj"), &HashMap::new(), &mut components).unwrap();
        let flat = &components[0];
        assert!(!flat.properties().has_uvs);
        assert_eq!(flat.properties().uv_channels, 0);
        assert!(flat.properties().has_normals);
        assert_eq!(flat.vertex_count(), 3);
    }

    #[test]
    fn test_faces_before_any_object_form_an_unnamed_component() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
        let mut components = Vec::new();
        let appended =
            parse_obj(text, Path::new("bare.obj"), &HashMap::new(), &mut components).unwrap();
        assert_eq!(appended, 1);
        assert_eq!(components[0].name(), "");
        assert_eq!(components[0].index_count(), 3);
    }

    #[test]
    fn test_mtl_keeps_references_raw() {
        let text = "newmtl stone\n\
                    Kd 0.8 0.8 0.8\n\
                    map_Kd 12951_Stone_Chess_Board_diff.1 \n\
                    newmtl wood\n\
                    map_Kd  king_texture.2\n";
        let materials = parse_mtl(text);
        assert_eq!(
            materials.get("stone").map(String::as_str),
            Some("12951_Stone_Chess_Board_diff.1 ")
        );
        assert_eq!(
            materials.get("wood").map(String::as_str),
            Some(" king_texture.2")
        );
    }

    #[test]
    fn test_index_resolution_rules() {
        assert_eq!(resolve_index("3", 5), Some(2));
        assert_eq!(resolve_index("-1", 5), Some(4));
        assert_eq!(resolve_index("0", 5), None);
        assert_eq!(resolve_index("6", 5), None);
        assert_eq!(resolve_index("-6", 5), None);
        assert_eq!(resolve_index("x", 5), None);
    }
}
