use crate::InternalDataModelRef;

/// A handle into the model arena: an id plus the data model it resolves
/// against. Handles compare by id only.
///
/// The data model itself never stores handles, otherwise the `Arc` would
/// keep itself alive.
#[derive(Debug, Clone)]
pub struct Zipper<I> {
    pub id: I,
    pub dm: InternalDataModelRef,
}

impl<I: PartialEq> PartialEq for Zipper<I> {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq(&other.id)
    }
}

impl<I: Eq> Eq for Zipper<I> {}

impl<I: std::hash::Hash> std::hash::Hash for Zipper<I> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}
