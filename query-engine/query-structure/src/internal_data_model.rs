use crate::{DomainError, FieldData, Model, ModelId, Zipper};
use std::sync::Arc;

pub type InternalDataModelRef = Arc<InternalDataModel>;

/// The arena holding every declared model. Models and fields refer to each
/// other by id, so cycles in the relation graph never turn into reference
/// cycles.
#[derive(Debug)]
pub struct InternalDataModel {
    pub(crate) models: Vec<ModelData>,
}

#[derive(Debug)]
pub(crate) struct ModelData {
    pub(crate) name: String,
    pub(crate) db_name: String,
    pub(crate) fields: Vec<FieldData>,
    pub(crate) primary_key: usize,
}

pub trait Zip {
    fn zip<I>(self, id: I) -> Zipper<I>;
}

impl Zip for InternalDataModelRef {
    fn zip<I>(self, id: I) -> Zipper<I> {
        Zipper { id, dm: self }
    }
}

pub trait InternalDataModelExt {
    fn models(&self) -> Vec<Model>;

    fn find_model(&self, name: &str) -> crate::Result<Model>;

    fn model(&self, id: ModelId) -> Model;
}

impl InternalDataModelExt for InternalDataModelRef {
    fn models(&self) -> Vec<Model> {
        (0..self.models.len()).map(|idx| self.clone().zip(ModelId(idx))).collect()
    }

    fn find_model(&self, name: &str) -> crate::Result<Model> {
        self.models
            .iter()
            .position(|model| model.name == name)
            .map(|idx| self.clone().zip(ModelId(idx)))
            .ok_or_else(|| DomainError::ModelNotFound { name: name.to_owned() })
    }

    fn model(&self, id: ModelId) -> Model {
        self.clone().zip(id)
    }
}
