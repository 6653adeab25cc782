//! Predicates over decoded simplices, used by radius searches.

use crate::simplex::{MeshId, PatchId, Simplex, SimplexKind, SimplexRegistry};

/// Accept/reject test applied to each pixel's decoded simplex.
///
/// `None` is passed for background pixels and stale keys, so a filter can
/// deliberately search for empty space.
///
/// Any `Fn(Option<Simplex>, &dyn SimplexRegistry) -> bool` closure is a filter.
pub trait SimplexFilter {
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool;

    /// Accepts what both filters accept.
    fn and<B: SimplexFilter>(self, other: B) -> And<Self, B>
    where
        Self: Sized,
    {
        And(self, other)
    }

    /// Accepts what either filter accepts.
    fn or<B: SimplexFilter>(self, other: B) -> Or<Self, B>
    where
        Self: Sized,
    {
        Or(self, other)
    }

    /// Accepts what this filter rejects.
    fn invert(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }
}

impl<F> SimplexFilter for F
where
    F: Fn(Option<Simplex>, &dyn SimplexRegistry) -> bool,
{
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool {
        self(simplex, registry)
    }
}

/// Accepts every pixel, including background.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SimplexFilter for AcceptAll {
    fn accept(&self, _simplex: Option<Simplex>, _registry: &dyn SimplexRegistry) -> bool {
        true
    }
}

/// Accepts any resolved simplex.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnySimplex;

impl SimplexFilter for AnySimplex {
    fn accept(&self, simplex: Option<Simplex>, _registry: &dyn SimplexRegistry) -> bool {
        simplex.is_some()
    }
}

/// Accepts simplices of one kind.
#[derive(Debug, Clone, Copy)]
pub struct KindFilter(pub SimplexKind);

impl KindFilter {
    pub const VERTEX: Self = Self(SimplexKind::Vertex);
    pub const EDGE: Self = Self(SimplexKind::Edge);
    pub const FACE: Self = Self(SimplexKind::Face);
}

impl SimplexFilter for KindFilter {
    fn accept(&self, simplex: Option<Simplex>, _registry: &dyn SimplexRegistry) -> bool {
        simplex.is_some_and(|s| s.kind() == self.0)
    }
}

/// Accepts front-facing faces.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontFacingFace;

impl SimplexFilter for FrontFacingFace {
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool {
        simplex
            .and_then(Simplex::as_face)
            .is_some_and(|f| registry.is_front_facing(f))
    }
}

/// Accepts faces and edges owned by a patch.
#[derive(Debug, Clone, Copy)]
pub struct PatchFilter(pub PatchId);

impl SimplexFilter for PatchFilter {
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool {
        simplex.is_some_and(|s| registry.patch_of(s) == Some(self.0))
    }
}

/// Accepts simplices owned by a mesh.
#[derive(Debug, Clone, Copy)]
pub struct MeshFilter(pub MeshId);

impl SimplexFilter for MeshFilter {
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool {
        simplex.is_some_and(|s| registry.mesh_of(s) == Some(self.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(pub A, pub B);

impl<A: SimplexFilter, B: SimplexFilter> SimplexFilter for And<A, B> {
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool {
        self.0.accept(simplex, registry) && self.1.accept(simplex, registry)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Or<A, B>(pub A, pub B);

impl<A: SimplexFilter, B: SimplexFilter> SimplexFilter for Or<A, B> {
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool {
        self.0.accept(simplex, registry) || self.1.accept(simplex, registry)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Not<A>(pub A);

impl<A: SimplexFilter> SimplexFilter for Not<A> {
    fn accept(&self, simplex: Option<Simplex>, registry: &dyn SimplexRegistry) -> bool {
        !self.0.accept(simplex, registry)
    }
}
