pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod generate;
pub mod model;
pub mod output;
pub mod project;
pub mod render;

pub use descriptor::{TypeDescriptor, parse_type_descriptor};
pub use discovery::{DiscoveryOptions, discover_workflows, is_workflow_file};
pub use error::XamldocError;
pub use extractor::{
    DefaultValueKey, DocumentExtractor, ElementShape, RootShape, enumerate_arguments,
    extract_annotation, extract_class_name, extract_name, format_default_value_key,
    resolve_default_value,
};
pub use generate::{
    FailurePolicy, GenerationFailure, GenerationReport, GenerationRequest, generate,
};
pub use model::{Argument, ArgumentMap, Direction, WorkflowMetadata};
pub use output::{DocumentWriter, OutputDirectory, WrittenDocument};
pub use project::{Project, ProjectConfig, discover as discover_project, project_relative_path};
pub use render::{IndexEntry, MarkdownRenderer, RenderedDocument, output_file_name};

/// JSON schema describing the serialized form of [`WorkflowMetadata`].
pub fn metadata_schema() -> serde_json::Value {
    schemars::schema_for!(WorkflowMetadata).to_value()
}
