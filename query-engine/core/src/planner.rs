//! Turns a selection into the plan the storage layer executes.
//!
//! Leaves become projected columns, selected foreign objects become
//! single-row joins and selected related collections become batches, each
//! with its own plan. Custom fields never reach storage.

use query_connector::{join_path, BatchPlan, ReadPlan};
use query_structure::{FieldData, Model, Selection, SelectionSet};
use schema::{ModelConfigs, Settings};

pub struct ReadPlanner<'a> {
    configs: &'a ModelConfigs,
    settings: &'a Settings,
}

impl<'a> ReadPlanner<'a> {
    pub fn new(configs: &'a ModelConfigs, settings: &'a Settings) -> Self {
        ReadPlanner { configs, settings }
    }

    pub fn plan(&self, model: &Model, selection: &SelectionSet) -> ReadPlan {
        let mut plan = ReadPlan::default();
        self.plan_into(&mut plan, model, selection, "");

        plan
    }

    fn plan_into(&self, plan: &mut ReadPlan, model: &Model, selection: &SelectionSet, prefix: &str) {
        let config = self.configs.for_model(model);

        plan.add_column(join_path(prefix, model.primary_key_name()));

        if !self.settings.restrict_queried_fields {
            for field in model.scalar_fields() {
                plan.add_column(join_path(prefix, field.name()));
            }
        }

        if let Some(config) = config {
            for name in &config.always_select {
                if let Some(field) = model.find_field(name) {
                    if let Some(foreign) = field.as_foreign() {
                        plan.add_column(join_path(prefix, &foreign.value_field));
                    } else if field.is_scalar() {
                        plan.add_column(join_path(prefix, name));
                    }
                }
            }
        }

        for (name, selection) in selection.iter() {
            if config.map(|config| config.fields_info.is_custom(name)).unwrap_or(false) {
                continue;
            }

            let Some(field) = model.find_field(name) else {
                continue;
            };

            match (field.data(), selection) {
                (FieldData::Scalar(_), _) => plan.add_column(join_path(prefix, name)),

                (FieldData::Foreign(foreign), Selection::Leaf) => {
                    plan.add_column(join_path(prefix, &foreign.value_field));
                }

                (FieldData::Foreign(foreign), Selection::Object(nested)) => {
                    let path = join_path(prefix, name);

                    plan.add_column(join_path(prefix, &foreign.value_field));
                    plan.add_join(path.clone());

                    if let Some(link) = field.link() {
                        self.plan_into(plan, &link.model, nested, &path);
                    }
                }

                (FieldData::Related(_), Selection::Leaf) => (),

                (FieldData::Related(related), Selection::Object(nested)) => {
                    let path = join_path(prefix, name);

                    if plan.batches.iter().any(|batch| batch.path == path) {
                        continue;
                    }

                    if let Some(link) = field.link() {
                        let mut child = self.plan(&link.model, nested);
                        child.add_column(related.value_field.clone());

                        plan.batches.push(BatchPlan { path, plan: child });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use query_structure::{
        DataModelBuilder, ForeignKeyBuilder, InternalDataModelExt, InternalDataModelRef, ModelBuilder,
        ScalarFieldBuilder,
    };
    use schema::{CustomField, ModelConfig, ModelExposition, TypeDecl};

    fn data_model() -> InternalDataModelRef {
        DataModelBuilder::new()
            .model(
                ModelBuilder::new("House")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("location"))
                    .field(ForeignKeyBuilder::new("owner", "Person").optional().related_name("houses")),
            )
            .model(
                ModelBuilder::new("Person")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("name"))
                    .field(ScalarFieldBuilder::int("age"))
                    .field(ForeignKeyBuilder::new("home", "House").optional().related_name("tenants")),
            )
            .build()
            .unwrap()
    }

    fn configs(dm: &InternalDataModelRef, settings: &Settings) -> ModelConfigs {
        let mut configs = ModelConfigs::default();

        let person = ModelExposition::new("Person")
            .always_select(["age"])
            .custom_field(CustomField::new("initials", TypeDecl::string()).read_one(|_| Ok("AB".into())));

        configs
            .push(ModelConfig::new(person, dm, settings).unwrap())
            .unwrap();
        configs
            .push(ModelConfig::new(ModelExposition::new("House"), dm, settings).unwrap())
            .unwrap();

        configs
    }

    #[test]
    fn foreign_objects_are_joined_and_collections_batched() {
        let dm = data_model();
        let settings = Settings::default();
        let configs = configs(&dm, &settings);
        let person = dm.find_model("Person").unwrap();

        let selection = SelectionSet::new()
            .leaf("name")
            .leaf("initials")
            .object(
                "home",
                SelectionSet::new()
                    .leaf("location")
                    .object("tenants", SelectionSet::new().leaf("name")),
            );

        let plan = ReadPlanner::new(&configs, &settings).plan(&person, &selection);

        assert_eq!(
            plan.columns,
            vec!["id", "age", "name", "home_id", "home__id", "home__location"]
        );
        assert_eq!(plan.joins, vec!["home"]);
        assert_eq!(plan.batches.len(), 1);
        assert_eq!(plan.batches[0].path, "home__tenants");
        assert_eq!(plan.batches[0].plan.columns, vec!["id", "age", "name", "home_id"]);
    }

    #[test]
    fn planning_is_deterministic() {
        let dm = data_model();
        let settings = Settings::default();
        let configs = configs(&dm, &settings);
        let house = dm.find_model("House").unwrap();

        let selection = SelectionSet::new()
            .object("owner", SelectionSet::new().leaf("name"))
            .object("tenants", SelectionSet::new().leaf("id"));

        let planner = ReadPlanner::new(&configs, &settings);
        assert_eq!(planner.plan(&house, &selection), planner.plan(&house, &selection));
    }

    #[test]
    fn unrestricted_plans_project_every_column() {
        let dm = data_model();
        let settings = Settings {
            restrict_queried_fields: false,
            ..Default::default()
        };
        let configs = configs(&dm, &settings);
        let house = dm.find_model("House").unwrap();

        let plan = ReadPlanner::new(&configs, &settings).plan(&house, &SelectionSet::new().leaf("location"));

        assert_eq!(plan.columns, vec!["id", "location", "owner_id"]);
        assert!(plan.joins.is_empty());
    }
}
