use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::XamldocError;

/// Data-flow direction of a workflow argument.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "In",
            Direction::Out => "Out",
            Direction::InOut => "InOut",
        }
    }
}

impl FromStr for Direction {
    type Err = XamldocError;

    /// Accepts both the descriptor spelling (`InArgument`) and the bare variant name (`In`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "In" | "InArgument" => Ok(Direction::In),
            "Out" | "OutArgument" => Ok(Direction::Out),
            "InOut" | "InOutArgument" => Ok(Direction::InOut),
            other => Err(XamldocError::InvalidDirection {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated workflow argument. Fields are fixed once constructed.
#[derive(Clone, Debug, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Argument {
    name: String,
    direction: Direction,
    #[serde(rename = "type")]
    type_name: String,
    annotation: String,
    default_value: String,
}

impl Argument {
    /// Validates and builds an argument. `direction` goes through [`Direction::from_str`],
    /// and a default value wrapped in one pair of list brackets is stored unwrapped.
    pub fn new(
        name: impl Into<String>,
        direction: &str,
        type_name: impl Into<String>,
        annotation: impl Into<String>,
        default_value: impl Into<String>,
    ) -> Result<Self, XamldocError> {
        let name = name.into();
        if name.is_empty() {
            return Err(XamldocError::Usage("argument name must not be empty".into()));
        }

        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(XamldocError::Usage(format!(
                "argument '{name}' must declare a type"
            )));
        }

        let direction = direction.parse::<Direction>()?;
        let default_value = strip_list_brackets(&default_value.into()).to_string();

        Ok(Self {
            name,
            direction,
            type_name,
            annotation: annotation.into(),
            default_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    /// Empty when the source declares no default.
    pub fn default_value(&self) -> &str {
        &self.default_value
    }
}

fn strip_list_brackets(value: &str) -> &str {
    value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(value)
}

/// Insertion-ordered map of arguments keyed by name. Re-inserting a name replaces the
/// earlier record in place.
#[derive(Clone, Debug, Default, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct ArgumentMap {
    entries: Vec<Argument>,
}

impl ArgumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `argument`, returning the record it replaced.
    pub fn insert(&mut self, argument: Argument) -> Option<Argument> {
        match self.entries.iter_mut().find(|a| a.name == argument.name) {
            Some(existing) => Some(std::mem::replace(existing, argument)),
            None => {
                self.entries.push(argument);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.entries.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|a| a.name.as_str())
    }
}

impl<'a> IntoIterator for &'a ArgumentMap {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Normalized metadata for a single workflow document.
///
/// `name` and `description` start unset. Reading them before the extractor populated
/// them yields [`XamldocError::UnsetField`]; an empty description is a valid value and
/// is distinct from an unset one.
#[derive(Clone, Debug, Serialize, JsonSchema, PartialEq, Eq)]
pub struct WorkflowMetadata {
    source_path: PathBuf,
    name: Option<String>,
    description: Option<String>,
    arguments: ArgumentMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    relative_path: Option<PathBuf>,
}

impl WorkflowMetadata {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            name: None,
            description: None,
            arguments: ArgumentMap::new(),
            relative_path: None,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn name(&self) -> Result<&str, XamldocError> {
        self.name.as_deref().ok_or(XamldocError::UnsetField("name"))
    }

    pub fn description(&self) -> Result<&str, XamldocError> {
        self.description
            .as_deref()
            .ok_or(XamldocError::UnsetField("description"))
    }

    /// Sets the workflow name once. Setting the same value again is a no-op; a
    /// different value is rejected.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), XamldocError> {
        assign_once(&mut self.name, name.into(), "name")
    }

    /// Sets the workflow description once, with the same rules as [`Self::set_name`].
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), XamldocError> {
        assign_once(&mut self.description, description.into(), "description")
    }

    pub fn arguments(&self) -> &ArgumentMap {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.get(name)
    }

    /// Adds an argument; a duplicate name replaces the previous record.
    pub fn add_argument(&mut self, argument: Argument) -> Option<Argument> {
        self.arguments.insert(argument)
    }

    pub fn relative_path(&self) -> Option<&Path> {
        self.relative_path.as_deref()
    }

    pub fn set_relative_path(&mut self, relative: impl Into<PathBuf>) {
        self.relative_path = Some(relative.into());
    }
}

fn assign_once(
    slot: &mut Option<String>,
    value: String,
    field: &'static str,
) -> Result<(), XamldocError> {
    match slot {
        Some(existing) if *existing == value => Ok(()),
        Some(existing) => Err(XamldocError::Usage(format!(
            "{field} is already set to '{existing}' and cannot be changed to '{value}'"
        ))),
        None => {
            *slot = Some(value);
            Ok(())
        }
    }
}
