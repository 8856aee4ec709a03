use std::fmt;
use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::descriptor::parse_type_descriptor;
use crate::error::XamldocError;
use crate::model::{Argument, WorkflowMetadata};

/// Base activity namespace (the document's default namespace).
pub const ACTIVITIES_NS: &str = "http://schemas.microsoft.com/netfx/2009/xaml/activities";
/// XAML base-type namespace bound to `x:`.
pub const XAML_NS: &str = "http://schemas.microsoft.com/winfx/2006/xaml";
/// Designer metadata namespace bound to `sap2010:`; carries annotations.
pub const DESIGN_NS: &str = "http://schemas.microsoft.com/netfx/2010/xaml/activities/presentation";
/// Prefix under which a document binds its own class namespace.
pub const THIS_PREFIX: &str = "this";

const DISPLAY_NAME_ATTR: &str = "DisplayName";
const ANNOTATION_ATTR: &str = "Annotation.AnnotationText";

/// A recognizable top-level control structure of a workflow body.
pub trait RootShape: Send + Sync {
    fn label(&self) -> &str;
    fn matches(&self, node: Node<'_, '_>) -> bool;
}

/// Matches an element by namespace and local name.
#[derive(Clone, Debug)]
pub struct ElementShape {
    namespace: String,
    local_name: String,
}

impl ElementShape {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Shape for an element in the base activity namespace.
    pub fn activity(local_name: impl Into<String>) -> Self {
        Self::new(ACTIVITIES_NS, local_name)
    }
}

impl RootShape for ElementShape {
    fn label(&self) -> &str {
        &self.local_name
    }

    fn matches(&self, node: Node<'_, '_>) -> bool {
        node.is_element()
            && node.has_tag_name((self.namespace.as_str(), self.local_name.as_str()))
    }
}

/// Turns a parsed XAML document into [`WorkflowMetadata`].
///
/// Root shapes are tried in order against the direct children of the outermost
/// element; the first match is the workflow root. The default order is `Flowchart`,
/// then `Sequence`.
pub struct DocumentExtractor {
    shapes: Vec<Box<dyn RootShape>>,
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self {
            shapes: vec![
                Box::new(ElementShape::activity("Flowchart")),
                Box::new(ElementShape::activity("Sequence")),
            ],
        }
    }
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a root shape with the lowest priority.
    pub fn with_shape(mut self, shape: impl RootShape + 'static) -> Self {
        self.shapes.push(Box::new(shape));
        self
    }

    pub fn shape_labels(&self) -> Vec<&str> {
        self.shapes.iter().map(|shape| shape.label()).collect()
    }

    pub fn extract_file(&self, path: &Path) -> Result<WorkflowMetadata, XamldocError> {
        let raw = fs::read_to_string(path)?;
        self.extract_str(&raw, path)
    }

    pub fn extract_str(&self, xml: &str, source: &Path) -> Result<WorkflowMetadata, XamldocError> {
        let stripped = xml.trim_start_matches('\u{feff}');
        let document = Document::parse(stripped)
            .map_err(|err| XamldocError::from(err).context(source.display()))?;
        self.extract(&document, source)
    }

    /// Populates a fresh model in the order name, description, arguments.
    pub fn extract(
        &self,
        document: &Document<'_>,
        source: &Path,
    ) -> Result<WorkflowMetadata, XamldocError> {
        let root = self.locate_root(document, source)?;

        let mut metadata = WorkflowMetadata::new(source);
        metadata.set_name(extract_name(root, source)?)?;
        metadata.set_description(extract_annotation(root))?;
        for argument in enumerate_arguments(document, source)? {
            metadata.add_argument(argument);
        }
        Ok(metadata)
    }

    pub fn locate_root<'a, 'input>(
        &self,
        document: &'a Document<'input>,
        source: &Path,
    ) -> Result<Node<'a, 'input>, XamldocError> {
        let outer = document.root_element();
        self.shapes
            .iter()
            .find_map(|shape| outer.children().find(|child| shape.matches(*child)))
            .ok_or_else(|| {
                XamldocError::malformed(
                    source,
                    format!(
                        "no recognized workflow root (expected one of: {})",
                        self.shape_labels().join(", ")
                    ),
                )
            })
    }
}

/// Reads the required display name of the workflow root.
pub fn extract_name(root: Node<'_, '_>, source: &Path) -> Result<String, XamldocError> {
    root.attribute(DISPLAY_NAME_ATTR)
        .map(str::to_string)
        .ok_or_else(|| {
            XamldocError::malformed(
                source,
                format!(
                    "<{}> is missing the {DISPLAY_NAME_ATTR} attribute",
                    root.tag_name().name()
                ),
            )
        })
}

/// Reads the optional annotation of a node; absent annotations are empty.
pub fn extract_annotation(node: Node<'_, '_>) -> String {
    node.attribute((DESIGN_NS, ANNOTATION_ATTR))
        .unwrap_or_default()
        .to_string()
}

/// Reads `x:Class` from the outermost element.
pub fn extract_class_name(document: &Document<'_>, source: &Path) -> Result<String, XamldocError> {
    document
        .root_element()
        .attribute((XAML_NS, "Class"))
        .map(str::to_string)
        .ok_or_else(|| XamldocError::malformed(source, "outermost element has no x:Class"))
}

/// Reads every `x:Members/x:Property` declaration of the document.
///
/// A document without a members section declares no arguments. The class name is only
/// required once there is at least one property to resolve a default for.
pub fn enumerate_arguments(
    document: &Document<'_>,
    source: &Path,
) -> Result<Vec<Argument>, XamldocError> {
    let outer = document.root_element();
    let properties: Vec<Node<'_, '_>> = outer
        .children()
        .filter(|node| node.has_tag_name((XAML_NS, "Members")))
        .flat_map(|members| members.children())
        .filter(|node| node.has_tag_name((XAML_NS, "Property")))
        .collect();

    if properties.is_empty() {
        return Ok(Vec::new());
    }

    let class_name = extract_class_name(document, source)?;
    let mut arguments = Vec::with_capacity(properties.len());
    for property in properties {
        let name = required_attribute(property, "Name", source)?;
        let token = required_attribute(property, "Type", source)?;
        let descriptor = parse_type_descriptor(token)
            .map_err(|err| err.context(format!("argument '{name}'")))?;

        let key = format_default_value_key(&class_name, name);
        let default_value = resolve_default_value(outer, &key).unwrap_or_default();

        let argument = Argument::new(
            name,
            &descriptor.direction,
            descriptor.type_name,
            extract_annotation(property),
            default_value,
        )
        .map_err(|err| match err {
            XamldocError::Usage(message) => XamldocError::malformed(source, message),
            other => other,
        })?;
        arguments.push(argument);
    }
    Ok(arguments)
}

fn required_attribute<'a>(
    node: Node<'a, '_>,
    attribute: &str,
    source: &Path,
) -> Result<&'a str, XamldocError> {
    match node.attribute(attribute).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(XamldocError::malformed(
            source,
            format!("x:Property is missing the {attribute} attribute"),
        )),
    }
}

/// Name of the outermost-element attribute holding an argument's default value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultValueKey {
    pub prefix: String,
    pub local_name: String,
}

impl fmt::Display for DefaultValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local_name)
    }
}

/// Builds `this:<ClassName>.<ArgumentName>`.
pub fn format_default_value_key(class_name: &str, argument_name: &str) -> DefaultValueKey {
    DefaultValueKey {
        prefix: THIS_PREFIX.to_string(),
        local_name: format!("{class_name}.{argument_name}"),
    }
}

/// Looks up a default value on `outer`. `None` when the prefix is unbound or the
/// attribute is absent.
pub fn resolve_default_value<'a>(outer: Node<'a, '_>, key: &DefaultValueKey) -> Option<&'a str> {
    let namespace = outer.lookup_namespace_uri(Some(key.prefix.as_str()))?;
    outer.attribute((namespace, key.local_name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    const HEADER: &str = r#"xmlns="http://schemas.microsoft.com/netfx/2009/xaml/activities" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml" xmlns:sap2010="http://schemas.microsoft.com/netfx/2010/xaml/activities/presentation" xmlns:this="clr-namespace:""#;

    fn document(attributes: &str, body: &str) -> String {
        format!(r#"<Activity x:Class="Main" {attributes} {HEADER}>{body}</Activity>"#)
    }

    fn extract(xml: &str) -> Result<WorkflowMetadata, XamldocError> {
        DocumentExtractor::new().extract_str(xml, Path::new("Main.xaml"))
    }

    #[test]
    fn sequence_root_with_annotation() {
        let xml = document(
            "",
            r#"<Sequence DisplayName="uno" sap2010:Annotation.AnnotationText="Hello" />"#,
        );
        let metadata = extract(&xml).unwrap();
        assert_eq!(metadata.name().unwrap(), "uno");
        assert_eq!(metadata.description().unwrap(), "Hello");
        assert!(metadata.arguments().is_empty());
    }

    #[test]
    fn flowchart_and_sequence_read_the_same_attributes() {
        for shape in ["Flowchart", "Sequence"] {
            let xml = document(
                "",
                &format!(
                    r#"<{shape} DisplayName="dos" sap2010:Annotation.AnnotationText="Body" />"#
                ),
            );
            let metadata = extract(&xml).unwrap();
            assert_eq!(metadata.name().unwrap(), "dos", "{shape}");
            assert_eq!(metadata.description().unwrap(), "Body", "{shape}");
        }
    }

    #[test]
    fn flowchart_takes_priority_over_sequence() {
        let xml = document(
            "",
            r#"<Sequence DisplayName="seq" /><Flowchart DisplayName="flow" />"#,
        );
        assert_eq!(extract(&xml).unwrap().name().unwrap(), "flow");
    }

    #[test]
    fn missing_root_is_malformed() {
        let xml = document("", r#"<StateMachine DisplayName="tres" />"#);
        let err = extract(&xml).unwrap_err();
        assert!(matches!(err, XamldocError::MalformedDocument { .. }));
        assert!(err.to_string().contains("Flowchart, Sequence"));
    }

    #[test]
    fn custom_shape_extends_the_search() {
        let xml = document("", r#"<StateMachine DisplayName="tres" />"#);
        let extractor = DocumentExtractor::new().with_shape(ElementShape::activity("StateMachine"));
        let metadata = extractor.extract_str(&xml, Path::new("Main.xaml")).unwrap();
        assert_eq!(metadata.name().unwrap(), "tres");
    }

    #[test]
    fn root_in_foreign_namespace_is_not_recognized() {
        let xml = document(
            r#"xmlns:ui="http://schemas.uipath.com/workflow/activities""#,
            r#"<ui:Sequence DisplayName="imposter" />"#,
        );
        assert!(extract(&xml).is_err());
    }

    #[test]
    fn missing_display_name_is_malformed() {
        let xml = document("", "<Sequence />");
        let err = extract(&xml).unwrap_err();
        assert!(matches!(err, XamldocError::MalformedDocument { .. }));
    }

    #[test]
    fn missing_annotation_is_empty() {
        let xml = document("", r#"<Sequence DisplayName="cinco" />"#);
        assert_eq!(extract(&xml).unwrap().description().unwrap(), "");
    }

    #[test]
    fn arguments_with_defaults_and_annotations() {
        let xml = document(
            r#"this:Main.Ichi="A default string value" this:Main.Ni="[New DataTable]""#,
            r#"<x:Members>
                 <x:Property Name="Ichi" Type="InArgument(x:String)" sap2010:Annotation.AnnotationText="First" />
                 <x:Property Name="Ni" Type="OutArgument(sd:DataTable)" />
                 <x:Property Name="San" Type="InOutArgument(x:Int32)" />
               </x:Members>
               <Sequence DisplayName="Main" />"#,
        );
        let metadata = extract(&xml).unwrap();
        let names: Vec<_> = metadata.arguments().names().collect();
        assert_eq!(names, vec!["Ichi", "Ni", "San"]);

        let ichi = metadata.argument("Ichi").unwrap();
        assert_eq!(ichi.direction(), Direction::In);
        assert_eq!(ichi.type_name(), "String");
        assert_eq!(ichi.annotation(), "First");
        assert_eq!(ichi.default_value(), "A default string value");

        let ni = metadata.argument("Ni").unwrap();
        assert_eq!(ni.direction(), Direction::Out);
        assert_eq!(ni.default_value(), "New DataTable");

        let san = metadata.argument("San").unwrap();
        assert_eq!(san.direction(), Direction::InOut);
        assert_eq!(san.default_value(), "");
        assert_eq!(san.annotation(), "");
    }

    #[test]
    fn property_without_type_is_malformed() {
        let xml = document(
            "",
            r#"<x:Members><x:Property Name="Ichi" /></x:Members><Sequence DisplayName="Main" />"#,
        );
        let err = extract(&xml).unwrap_err();
        assert!(matches!(err, XamldocError::MalformedDocument { .. }));
    }

    #[test]
    fn malformed_type_token_fails_extraction() {
        let xml = document(
            "",
            r#"<x:Members><x:Property Name="Ichi" Type="InArgument" /></x:Members><Sequence DisplayName="Main" />"#,
        );
        let err = extract(&xml).unwrap_err();
        assert!(matches!(err, XamldocError::MalformedDescriptor { .. }));
        assert!(err.to_string().contains("argument 'Ichi'"));
    }

    #[test]
    fn unknown_direction_fails_with_legal_set() {
        let xml = document(
            "",
            r#"<x:Members><x:Property Name="Ichi" Type="Property(x:String)" /></x:Members><Sequence DisplayName="Main" />"#,
        );
        let err = extract(&xml).unwrap_err();
        assert!(matches!(err, XamldocError::InvalidDirection { .. }));
        assert!(err.to_string().contains("In, Out, InOut"));
    }

    #[test]
    fn default_value_key_format() {
        let key = format_default_value_key("Main", "Ichi");
        assert_eq!(key.to_string(), "this:Main.Ichi");
    }

    #[test]
    fn default_lookup_without_this_binding_is_none() {
        let xml = r#"<Activity xmlns="http://schemas.microsoft.com/netfx/2009/xaml/activities"><Sequence DisplayName="a" /></Activity>"#;
        let document = Document::parse(xml).unwrap();
        let key = format_default_value_key("Main", "Ichi");
        assert_eq!(resolve_default_value(document.root_element(), &key), None);
    }

    #[test]
    fn class_name_is_read_from_outermost_element() {
        let xml = document("", r#"<Sequence DisplayName="a" />"#);
        let document = Document::parse(&xml).unwrap();
        assert_eq!(
            extract_class_name(&document, Path::new("Main.xaml")).unwrap(),
            "Main"
        );
    }

    #[test]
    fn arguments_without_class_name_are_malformed() {
        let xml = format!(
            r#"<Activity {HEADER}><x:Members><x:Property Name="Ichi" Type="InArgument(x:String)" /></x:Members><Sequence DisplayName="Main" /></Activity>"#
        );
        let parsed = Document::parse(&xml).unwrap();
        let err = enumerate_arguments(&parsed, Path::new("Main.xaml")).unwrap_err();
        assert!(matches!(err, XamldocError::MalformedDocument { .. }));
        assert!(err.to_string().contains("x:Class"), "{err}");

        let err = extract(&xml).unwrap_err();
        assert!(matches!(err, XamldocError::MalformedDocument { .. }));
    }

    #[test]
    fn class_name_is_optional_without_arguments() {
        let xml = format!(
            r#"<Activity {HEADER}><Flowchart DisplayName="sin clase" sap2010:Annotation.AnnotationText="No members" /></Activity>"#
        );
        let metadata = extract(&xml).unwrap();
        assert_eq!(metadata.name().unwrap(), "sin clase");
        assert_eq!(metadata.description().unwrap(), "No members");
        assert!(metadata.arguments().is_empty());
    }

    #[test]
    fn blank_type_attribute_is_malformed() {
        let xml = document(
            "",
            r#"<x:Members><x:Property Name="Ichi" Type="   " /></x:Members><Sequence DisplayName="Main" />"#,
        );
        let err = extract(&xml).unwrap_err();
        assert!(matches!(err, XamldocError::MalformedDocument { .. }));
        assert!(err.is_malformed_document());
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let xml = format!("\u{feff}{}", document("", r#"<Sequence DisplayName="bom" />"#));
        assert_eq!(extract(&xml).unwrap().name().unwrap(), "bom");
    }

    #[test]
    fn invalid_xml_is_reported_with_source() {
        let err = extract("<Activity").unwrap_err();
        assert!(matches!(err, XamldocError::Xml(_)));
        assert!(err.to_string().contains("Main.xaml"));
    }
}
