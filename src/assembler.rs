//! Per-corner vertex assembly.
//!
//! Source data arrives as flat arrays: positions indexed through the corner
//! index array, and normals/UVs stored one entry per corner. Assembly emits one
//! [`Vertex`] per corner and converts from a Z-up to a Y-up coordinate system.

use crate::types::Vertex;

/// Flat, caller-supplied mesh arrays.
#[derive(Debug, Clone, Copy)]
pub struct MeshArrays<'a> {
    /// Position triples, indexed through `indices`.
    pub positions: &'a [f32],
    /// Normal triples, one per corner. Their count is the number of corners.
    pub normals: &'a [f32],
    /// UV pairs, one per corner. Ignored unless every corner has one.
    pub uvs: &'a [f32],
    /// Position index for each corner.
    pub indices: &'a [u32],
}

/// Convert a Z-up vector to Y-up: `(x, y, z) -> (x, z, -y)`.
///
/// Negating the new depth axis keeps the handedness after the swap.
#[inline]
pub fn z_up_to_y_up(v: [f32; 3]) -> [f32; 3] {
    [v[0], v[2], -v[1]]
}

/// Assemble one vertex per corner.
///
/// Degenerate input is tolerated rather than rejected:
/// - assembly stops at the first corner beyond the end of `indices`;
/// - a corner whose position index is out of range is dropped;
/// - a corner without a normal gets the zero vector;
/// - UVs default to `(0, 0)` unless `uvs` covers every corner.
pub fn assemble_vertices(arrays: MeshArrays<'_>) -> Vec<Vertex> {
    let MeshArrays {
        positions,
        normals,
        uvs,
        indices,
    } = arrays;

    let corner_count = normals.len() / 3;
    let has_uvs = !uvs.is_empty() && uvs.len() >= corner_count * 2;

    let mut vertices = Vec::with_capacity(corner_count);
    let mut dropped = 0usize;

    for corner in 0..corner_count {
        let Some(&pos_index) = indices.get(corner) else {
            log::warn!(
                "Corner {} has no index ({} indices); stopping assembly",
                corner,
                indices.len()
            );
            break;
        };

        let base = pos_index as usize * 3;
        let Some(position) = positions.get(base..base + 3) else {
            dropped += 1;
            continue;
        };

        let normal = normals
            .get(corner * 3..corner * 3 + 3)
            .map(|n| z_up_to_y_up([n[0], n[1], n[2]]))
            .unwrap_or([0.0; 3]);

        let texcoord = if has_uvs {
            uvs.get(corner * 2..corner * 2 + 2)
                .map(|uv| [uv[0], uv[1]])
                .unwrap_or([0.0; 2])
        } else {
            [0.0; 2]
        };

        vertices.push(Vertex::new(
            z_up_to_y_up([position[0], position[1], position[2]]),
            normal,
            texcoord,
        ));
    }

    if dropped > 0 {
        log::warn!(
            "Dropped {} corner(s) with out-of-range position indices",
            dropped
        );
    }

    vertices
}
