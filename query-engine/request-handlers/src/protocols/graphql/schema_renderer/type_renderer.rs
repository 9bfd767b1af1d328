use super::*;

/// Renders a type reference, rendering the named type it points to on first
/// sight.
pub(super) struct GqlTypeRenderer<'a> {
    type_node: &'a TypeNode,
}

impl<'a> Renderer for GqlTypeRenderer<'a> {
    fn render(&self, ctx: &mut RenderContext) -> String {
        match self.type_node {
            TypeNode::Scalar(scalar) => {
                ctx.use_scalar(*scalar);
                scalar.name().to_owned()
            }

            TypeNode::Enum(enum_type) => {
                let enum_type: &EnumType = enum_type;
                enum_type.as_renderer().render(ctx);
                enum_type.name().to_owned()
            }

            TypeNode::Object(object) => {
                let object: &ObjectType = object;
                object.as_renderer().render(ctx);
                object.name().to_owned()
            }

            TypeNode::List(inner) => format!("[{}]", GqlTypeRenderer::new(inner).render(ctx)),

            TypeNode::Required(inner) => format!("{}!", GqlTypeRenderer::new(inner).render(ctx)),
        }
    }
}

impl<'a> GqlTypeRenderer<'a> {
    pub(super) fn new(type_node: &'a TypeNode) -> Self {
        GqlTypeRenderer { type_node }
    }
}
