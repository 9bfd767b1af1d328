use query_structure::{Model, PATH_SEPARATOR};

/// How to fetch the records needed to answer one selection. Pure data: the
/// same selection always yields the same plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadPlan {
    /// Scalar field paths to project, relative to the planned model.
    pub columns: Vec<String>,

    /// Foreign field paths fetched with single-row joins, parents before
    /// children.
    pub joins: Vec<String>,

    /// Related collections fetched with a second query keyed by parent ids.
    pub batches: Vec<BatchPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Path of the related field, possibly below joined foreign fields.
    pub path: String,

    /// Plan for the related model. Always projects the column linking
    /// children back to their parent.
    pub plan: ReadPlan,
}

impl ReadPlan {
    /// Every scalar column of the model, without joins.
    pub fn all_columns(model: &Model) -> Self {
        ReadPlan {
            columns: model.scalar_fields().map(|field| field.name().to_owned()).collect(),
            joins: Vec::new(),
            batches: Vec::new(),
        }
    }

    pub fn add_column(&mut self, path: impl Into<String>) {
        let path = path.into();

        if !self.columns.contains(&path) {
            self.columns.push(path);
        }
    }

    pub fn add_join(&mut self, path: impl Into<String>) {
        let path = path.into();

        if !self.joins.contains(&path) {
            self.joins.push(path);
        }
    }
}

/// Joins path segments with [PATH_SEPARATOR].
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{name}")
    }
}

/// Splits `a__b__c` into (`a__b`, `c`).
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind(PATH_SEPARATOR) {
        Some(idx) => (&path[..idx], &path[idx + PATH_SEPARATOR.len()..]),
        None => ("", path),
    }
}
