use super::*;

pub(super) struct GqlEnumRenderer<'a> {
    enum_type: &'a EnumType,
}

impl<'a> Renderer for GqlEnumRenderer<'a> {
    fn render(&self, ctx: &mut RenderContext) -> String {
        let name = self.enum_type.name();

        if ctx.already_rendered(name) {
            return String::new();
        }

        let indent = ctx.indent();
        let values: Vec<String> = self
            .enum_type
            .values()
            .iter()
            .map(|value| match &value.description {
                Some(description) => format!("{indent}\"{}\"\n{indent}{}", escape(description), value.key),
                None => format!("{indent}{}", value.key),
            })
            .collect();

        let rendered = format!("enum {name} {{\n{}\n}}", values.join("\n"));

        ctx.add_output(rendered.clone());
        ctx.mark_as_rendered(name.to_owned());

        rendered
    }
}

impl<'a> GqlEnumRenderer<'a> {
    pub(super) fn new(enum_type: &'a EnumType) -> Self {
        GqlEnumRenderer { enum_type }
    }
}

fn escape(description: &str) -> String {
    description.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}
