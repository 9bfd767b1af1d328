use super::*;
use crate::protocols::graphql::document::root_type_name;
use indexmap::IndexMap;
use schema::{Direction, RootField};

pub(super) enum GqlObjectRenderer<'a> {
    Root(QueryTag, &'a IndexMap<String, RootField>),
    Object(&'a ObjectType),
}

impl<'a> Renderer for GqlObjectRenderer<'a> {
    fn render(&self, ctx: &mut RenderContext) -> String {
        match self {
            GqlObjectRenderer::Root(tag, fields) => self.render_root(*tag, fields, ctx),
            GqlObjectRenderer::Object(object) => self.render_object(object, ctx),
        }
    }
}

impl<'a> GqlObjectRenderer<'a> {
    fn render_root(&self, tag: QueryTag, fields: &IndexMap<String, RootField>, ctx: &mut RenderContext) -> String {
        let name = root_type_name(tag);

        if ctx.already_rendered(name) {
            return String::new();
        }

        ctx.mark_as_rendered(name.to_owned());

        let mut rendered_fields = Vec::with_capacity(fields.len());

        for field in fields.values() {
            let rendered = GqlFieldRenderer::new(&field.name, &field.output)
                .with_arguments(&field.arguments)
                .render(ctx);

            rendered_fields.push(rendered);
        }

        self.emit("type", name, rendered_fields, ctx)
    }

    fn render_object(&self, object: &ObjectType, ctx: &mut RenderContext) -> String {
        let name = object.name();

        if ctx.already_rendered(name) {
            return String::new();
        }

        // Recursive types stop here.
        ctx.mark_as_rendered(name.to_owned());

        let mut rendered_fields = Vec::with_capacity(object.fields().len());

        for (field_name, field_type) in object.fields() {
            rendered_fields.push(GqlFieldRenderer::new(field_name, field_type).render(ctx));
        }

        let keyword = match object.direction() {
            Direction::Input => "input",
            Direction::Output => "type",
        };

        self.emit(keyword, name, rendered_fields, ctx)
    }

    fn emit(&self, keyword: &str, name: &str, fields: Vec<String>, ctx: &mut RenderContext) -> String {
        let indent = ctx.indent();
        let fields: Vec<String> = fields.into_iter().map(|field| format!("{indent}{field}")).collect();
        let rendered = format!("{keyword} {name} {{\n{}\n}}", fields.join("\n"));

        ctx.add_output(rendered.clone());

        rendered
    }
}
