//! Statement building. Queries are assembled as an [ast] tree and turned
//! into SQL text by the [renderer::Renderer]; values always go through
//! positional parameters.

pub(crate) mod ast;
pub(crate) mod read;
pub(crate) mod renderer;
pub(crate) mod write;

use crate::error::SqlError;
use ast::{Column, Table};
use query_structure::{FieldData, Model, ScalarFieldData};

pub(crate) fn model_table(model: &Model) -> Table {
    Table::new(model.db_name())
}

pub(crate) fn aliased_column(alias: &str, column: &str) -> Column {
    Column::new(column).table(alias)
}

/// The stored column behind a field name. Foreign fields resolve to the
/// column holding their key.
pub(crate) fn column_data(model: &Model, name: &str) -> crate::Result<ScalarFieldData> {
    let field = model.field(name)?;

    match field.data() {
        FieldData::Scalar(data) => Ok(data.clone()),
        FieldData::Foreign(ff) => column_data(model, &ff.value_field),
        FieldData::Related(_) => Err(SqlError::ConversionError(format!(
            "{name} on {} is not stored in a column",
            model.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_structure::{DataModelBuilder, ForeignKeyBuilder, InternalDataModelExt, ModelBuilder, ScalarFieldBuilder};

    #[test]
    fn foreign_fields_resolve_to_their_key_column() {
        let dm = DataModelBuilder::new()
            .model(ModelBuilder::new("House").field(ScalarFieldBuilder::auto_id("id")))
            .model(
                ModelBuilder::new("Person")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ForeignKeyBuilder::new("home", "House").optional().related_name("tenants")),
            )
            .build()
            .unwrap();

        let person = dm.find_model("Person").unwrap();
        let house = dm.find_model("House").unwrap();

        assert_eq!(column_data(&person, "home").unwrap().db_name, "home_id");
        assert!(column_data(&house, "tenants").is_err());
    }
}
