use super::*;
use indexmap::IndexMap;

/// Renders one field line. Only root fields carry arguments.
pub(super) struct GqlFieldRenderer<'a> {
    name: &'a str,
    field_type: &'a TypeNode,
    arguments: Option<&'a IndexMap<String, TypeNode>>,
}

impl<'a> Renderer for GqlFieldRenderer<'a> {
    fn render(&self, ctx: &mut RenderContext) -> String {
        let rendered_args = self.render_arguments(ctx);
        let rendered_args = if rendered_args.is_empty() {
            "".into()
        } else if rendered_args.len() > 1 {
            // Multiline - double indent.
            format!(
                "({}\n{})",
                rendered_args
                    .into_iter()
                    .map(|arg| format!("\n{}{}", ctx.indent().repeat(2), arg))
                    .collect::<Vec<String>>()
                    .join(""),
                ctx.indent()
            )
        } else {
            format!("({})", rendered_args.join(", "))
        };

        let rendered_type = self.field_type.as_renderer().render(ctx);

        format!("{}{}: {}", self.name, rendered_args, rendered_type)
    }
}

impl<'a> GqlFieldRenderer<'a> {
    pub(super) fn new(name: &'a str, field_type: &'a TypeNode) -> Self {
        GqlFieldRenderer {
            name,
            field_type,
            arguments: None,
        }
    }

    pub(super) fn with_arguments(mut self, arguments: &'a IndexMap<String, TypeNode>) -> Self {
        self.arguments = Some(arguments);
        self
    }

    fn render_arguments(&self, ctx: &mut RenderContext) -> Vec<String> {
        let Some(arguments) = self.arguments else {
            return Vec::new();
        };

        let mut output = Vec::with_capacity(arguments.len());

        for (name, ty) in arguments {
            output.push(format!("{name}: {}", ty.as_renderer().render(ctx)));
        }

        output
    }
}
