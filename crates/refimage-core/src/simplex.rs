//! Opaque mesh-primitive identities and the registry that resolves them.
//!
//! The item buffer stores a [`SimplexKey`] per pixel. Everything else about a
//! primitive (its ownership, geometry, subdivision hierarchy) lives in the
//! mesh layer and is reached through [`SimplexRegistry`].

use std::fmt;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Integer key written into item-buffer pixels.
///
/// Key `0` is reserved for "nothing drawn here".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SimplexKey(pub u32);

impl SimplexKey {
    /// The reserved background key.
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl fmt::Display for SimplexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key#{:#x}", self.0)
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a mesh vertex.
    VertexId,
    "v"
);
id_type!(
    /// Identity of a mesh edge.
    EdgeId,
    "e"
);
id_type!(
    /// Identity of a mesh face.
    FaceId,
    "f"
);
id_type!(
    /// Identity of a patch, a group of faces sharing rendering attributes.
    PatchId,
    "patch"
);
id_type!(
    /// Identity of a mesh.
    MeshId,
    "mesh"
);

/// The kind of a [`Simplex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimplexKind {
    Vertex,
    Edge,
    Face,
}

/// A resolved mesh primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Simplex {
    Vertex(VertexId),
    Edge(EdgeId),
    Face(FaceId),
}

impl Simplex {
    #[must_use]
    pub fn kind(self) -> SimplexKind {
        match self {
            Self::Vertex(_) => SimplexKind::Vertex,
            Self::Edge(_) => SimplexKind::Edge,
            Self::Face(_) => SimplexKind::Face,
        }
    }

    #[must_use]
    pub fn as_vertex(self) -> Option<VertexId> {
        match self {
            Self::Vertex(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_edge(self) -> Option<EdgeId> {
        match self {
            Self::Edge(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_face(self) -> Option<FaceId> {
        match self {
            Self::Face(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for Simplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex(v) => v.fmt(f),
            Self::Edge(e) => e.fmt(f),
            Self::Face(face) => face.fmt(f),
        }
    }
}

impl From<VertexId> for Simplex {
    fn from(v: VertexId) -> Self {
        Self::Vertex(v)
    }
}

impl From<EdgeId> for Simplex {
    fn from(e: EdgeId) -> Self {
        Self::Edge(e)
    }
}

impl From<FaceId> for Simplex {
    fn from(f: FaceId) -> Self {
        Self::Face(f)
    }
}

/// The mesh layer, as seen from the item buffer.
///
/// Only [`resolve`](Self::resolve), [`patch_of`](Self::patch_of),
/// [`mesh_of`](Self::mesh_of) and [`face_of`](Self::face_of) are required.
/// The remaining capability queries default to "not supported", which makes
/// the corresponding picking queries return `None` or `false`.
pub trait SimplexRegistry {
    /// Maps a decoded key to the primitive it was drawn for. Unknown or stale
    /// keys resolve to `None`.
    fn resolve(&self, key: SimplexKey) -> Option<Simplex>;

    /// The patch owning a face or edge. Vertices have no patch.
    fn patch_of(&self, simplex: Simplex) -> Option<PatchId>;

    /// The mesh owning the primitive.
    fn mesh_of(&self, simplex: Simplex) -> Option<MeshId>;

    /// A face containing the primitive: the face itself, or one adjacent to
    /// an edge or vertex.
    fn face_of(&self, simplex: Simplex) -> Option<FaceId>;

    /// Whether the edge is currently a silhouette edge.
    fn is_silhouette(&self, _edge: EdgeId) -> bool {
        false
    }

    /// Whether the face is front-facing for the current camera.
    fn is_front_facing(&self, _face: FaceId) -> bool {
        true
    }

    /// Exact intersection of the view ray through `ndc` with `face`.
    ///
    /// Returns the primitive actually hit (the face, or one of its edges or
    /// vertices when the hit lands on it) and the hit point in object space.
    fn find_intersect(&self, _face: FaceId, _ndc: DVec2) -> Option<(Simplex, DVec3)> {
        None
    }

    /// Whether `simplex` lies on the boundary or interior of `face`.
    fn on_face(&self, simplex: Simplex, face: FaceId) -> bool {
        simplex == Simplex::Face(face)
    }

    /// Object-to-world transform applied to points returned by
    /// [`find_intersect`](Self::find_intersect) and
    /// [`face_centroid`](Self::face_centroid).
    fn to_world(&self, _face: FaceId, point: DVec3) -> DVec3 {
        point
    }

    /// Object-space centroid of the face.
    fn face_centroid(&self, _face: FaceId) -> Option<DVec3> {
        None
    }

    /// Barycentric coordinates of the point on `face` nearest the view ray
    /// through `ndc`.
    fn near_barycentric(&self, _face: FaceId, _ndc: DVec2) -> Option<DVec3> {
        None
    }

    /// The equivalent face and barycentric coordinate at subdivision `level`.
    fn face_at_level(&self, _face: FaceId, _level: u32, _bc: DVec3) -> Option<(FaceId, DVec3)> {
        None
    }

    /// The equivalent face and barycentric coordinate at the mesh edit level.
    fn face_at_edit_level(&self, _face: FaceId, _bc: DVec3) -> Option<(FaceId, DVec3)> {
        None
    }
}
