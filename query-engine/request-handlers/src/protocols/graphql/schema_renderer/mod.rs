mod enum_renderer;
mod field_renderer;
mod object_renderer;
mod type_renderer;

use enum_renderer::*;
use field_renderer::*;
use object_renderer::*;
use schema::{EnumType, ObjectType, QuerySchema, QueryTag, ScalarType, TypeNode};
use std::collections::{BTreeSet, HashSet};
use type_renderer::*;

/// Top level GraphQL schema renderer.
struct GqlSchemaRenderer<'a> {
    query_schema: &'a QuerySchema,
}

impl<'a> Renderer for GqlSchemaRenderer<'a> {
    fn render(&self, ctx: &mut RenderContext) -> String {
        for tag in [QueryTag::Query, QueryTag::Mutation] {
            let fields = self.query_schema.root_fields(tag);

            if !fields.is_empty() {
                GqlObjectRenderer::Root(tag, fields).render(ctx);
            }
        }

        String::new()
    }
}

impl<'a> GqlSchemaRenderer<'a> {
    fn new(query_schema: &'a QuerySchema) -> GqlSchemaRenderer<'a> {
        GqlSchemaRenderer { query_schema }
    }
}

/// Renders the schema as GraphQL SDL. Types are emitted in the order they are
/// first reached from the root fields, each after the types it references,
/// so the output only changes when the schema does.
pub fn render_graphql_schema(query_schema: &QuerySchema) -> String {
    let mut context = RenderContext::new();
    query_schema.as_renderer().render(&mut context);

    context.format()
}

trait Renderer {
    fn render(&self, ctx: &mut RenderContext) -> String;
}

struct RenderContext {
    /// Output queue for all (top level) elements that need to be rendered,
    output_queue: Vec<String>,

    /// Prevents double rendering of elements that are referenced multiple times.
    rendered: HashSet<String>,

    /// Custom scalars referenced anywhere, declared at the end.
    scalars: BTreeSet<ScalarType>,

    /// General indent level in spaces.
    indent: usize,

    /// Indent string.
    indent_str: &'static str,
}

impl RenderContext {
    fn new() -> Self {
        RenderContext {
            output_queue: Default::default(),
            rendered: Default::default(),
            scalars: Default::default(),
            indent: 2,
            indent_str: " ",
        }
    }

    fn format(mut self) -> String {
        if !self.scalars.is_empty() {
            let declarations: Vec<String> = self.scalars.iter().map(|scalar| format!("scalar {scalar}")).collect();
            self.output_queue.push(declarations.join("\n"));
        }

        self.output_queue.join("\n\n")
    }

    fn already_rendered(&self, cache_key: &str) -> bool {
        self.rendered.contains(cache_key)
    }

    fn mark_as_rendered(&mut self, cache_key: String) {
        self.rendered.insert(cache_key);
    }

    fn add_output(&mut self, output: String) {
        self.output_queue.push(output);
    }

    fn use_scalar(&mut self, scalar: ScalarType) {
        if scalar.is_custom() {
            self.scalars.insert(scalar);
        }
    }

    fn indent(&self) -> String {
        self.indent_str.repeat(self.indent)
    }
}

enum GqlRenderer<'a> {
    Schema(GqlSchemaRenderer<'a>),
    Object(GqlObjectRenderer<'a>),
    Type(GqlTypeRenderer<'a>),
    Enum(GqlEnumRenderer<'a>),
}

impl<'a> Renderer for GqlRenderer<'a> {
    fn render(&self, ctx: &mut RenderContext) -> String {
        match self {
            GqlRenderer::Schema(s) => s.render(ctx),
            GqlRenderer::Object(o) => o.render(ctx),
            GqlRenderer::Type(t) => t.render(ctx),
            GqlRenderer::Enum(e) => e.render(ctx),
        }
    }
}

trait AsRenderer<'a> {
    fn as_renderer(&self) -> GqlRenderer<'a>;
}

impl<'a> AsRenderer<'a> for &'a QuerySchema {
    fn as_renderer(&self) -> GqlRenderer<'a> {
        GqlRenderer::Schema(GqlSchemaRenderer::new(self))
    }
}

impl<'a> AsRenderer<'a> for &'a TypeNode {
    fn as_renderer(&self) -> GqlRenderer<'a> {
        GqlRenderer::Type(GqlTypeRenderer::new(self))
    }
}

impl<'a> AsRenderer<'a> for &'a ObjectType {
    fn as_renderer(&self) -> GqlRenderer<'a> {
        GqlRenderer::Object(GqlObjectRenderer::Object(self))
    }
}

impl<'a> AsRenderer<'a> for &'a EnumType {
    fn as_renderer(&self) -> GqlRenderer<'a> {
        GqlRenderer::Enum(GqlEnumRenderer::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_structure::{DataModelBuilder, ForeignKeyBuilder, ModelBuilder, Operation, ScalarFieldBuilder, Value};
    use schema::{ExposedMethod, ModelExposition, QuerySchemaRef, SchemaBuilder, Settings, TypeDecl};

    fn schema() -> QuerySchemaRef {
        let dm = DataModelBuilder::new()
            .model(
                ModelBuilder::new("House")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("location")),
            )
            .model(
                ModelBuilder::new("Person")
                    .field(ScalarFieldBuilder::auto_id("id"))
                    .field(ScalarFieldBuilder::string("name"))
                    .field(ForeignKeyBuilder::new("home", "House").related_name("tenants").optional()),
            )
            .build()
            .unwrap();

        let builder = SchemaBuilder::new(dm, Settings::default());
        builder.expose_model(ModelExposition::new("House")).unwrap();
        builder.expose_model(ModelExposition::new("Person")).unwrap();
        builder
            .expose_query(
                ExposedMethod::new("oldest", TypeDecl::model("person", Operation::Read))
                    .input("born_after", TypeDecl::date())
                    .input("extra", TypeDecl::json())
                    .resolver(|_| async { Ok(Value::Null) }),
            )
            .unwrap();

        builder.build().unwrap()
    }

    #[test]
    fn root_fields_with_several_arguments_span_lines() {
        let sdl = render_graphql_schema(&schema());

        assert!(sdl.contains(
            "  oldest(\n    born_after: Date\n    extra: JSON\n  ): person__output_type"
        ));
    }

    #[test]
    fn every_referenced_type_is_rendered_once() {
        let sdl = render_graphql_schema(&schema());

        assert_eq!(sdl.matches("type person__output_type {").count(), 1);
        assert!(sdl.contains("type Query {"));
        assert!(sdl.contains("type Mutation {"));
        assert!(sdl.contains("input create_person__home__input_type {\n  id: Int\n  location: String!\n}"));
        assert!(sdl.ends_with("scalar Date\nscalar JSON"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let schema = schema();

        assert_eq!(render_graphql_schema(&schema), render_graphql_schema(&schema));
    }
}
