use async_trait::async_trait;
use flowcore::{
    render_template, ExecutionContext, NodeError, NodeKind, NodeProcessor, NodeSpec, Value,
    ValueExt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
    Xml,
    /// Missing or unrecognised format: the source is returned as is.
    Raw,
}

impl OutputFormat {
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            Some("xml") => OutputFormat::Xml,
            _ => OutputFormat::Raw,
        }
    }
}

/// Formats the workflow result. The output of the last output node run
/// becomes the execution's final output.
pub struct OutputProcessor;

fn format_text(data: &Value, template: Option<&str>) -> String {
    if let Some(template) = template {
        return render_template(template, data);
    }

    match data {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) | Value::Null => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
        }
        other => other.to_display_string(),
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn write_xml(out: &mut String, tag: &str, value: &Value) {
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(tag);
            out.push_str("/>");
        }
        // Array elements become sibling <item> tags with no wrapper.
        Value::Array(items) => {
            for item in items {
                write_xml(out, "item", item);
            }
        }
        Value::Object(map) => {
            out.push_str(&format!("<{}>", tag));
            for (key, child) in map {
                write_xml(out, key, child);
            }
            out.push_str(&format!("</{}>", tag));
        }
        scalar => {
            out.push_str(&format!(
                "<{}>{}</{}>",
                tag,
                escape_xml(&scalar.to_display_string()),
                tag
            ));
        }
    }
}

/// Render a value as XML under `tag`.
pub fn object_to_xml(tag: &str, value: &Value) -> String {
    let mut out = String::new();
    write_xml(&mut out, tag, value);
    out
}

#[async_trait]
impl NodeProcessor for OutputProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Output
    }

    fn description(&self) -> &str {
        "Format the workflow result as json, text or xml"
    }

    async fn process(&self, node: &NodeSpec, ctx: &mut ExecutionContext) -> Result<Value, NodeError> {
        let data = match node.str_field("sourceNodeId") {
            Some(source) => ctx.node_response(source).cloned().unwrap_or(Value::Null),
            None => ctx.snapshot(),
        };

        let format = OutputFormat::from_name(node.str_field("format"));
        tracing::debug!(node_id = %node.id, "Output formatted as {:?}", format);

        Ok(match format {
            OutputFormat::Json | OutputFormat::Raw => data,
            OutputFormat::Text => Value::String(format_text(&data, node.str_field("template"))),
            OutputFormat::Xml => Value::String(object_to_xml("root", &data)),
        })
    }
}
