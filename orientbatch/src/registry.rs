//! Class registry and command factories
//!
//! The schema layer maps class names to descriptors; each descriptor
//! yields a [`CommandFactory`] able to produce creation and retrieval
//! commands for that class. A batch enumerates the registry once at
//! construction and exposes a [`BatchFactory`] per class.

use crate::command::{render_literal, Command, ScriptCommand};
use crate::variable::{BatchVariable, VariableKind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Vertex or edge declaration of a registered class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Vertex,
    Edge,
}

/// Factory producing command objects for one domain class
pub trait CommandFactory: Send + Sync {
    /// Command creating a vertex of this class
    fn create_vertex_command(&self, properties: &Map<String, Value>) -> Box<dyn Command>;

    /// Command creating an edge of this class between two endpoints
    fn create_edge_command(
        &self,
        from: &Endpoint,
        to: &Endpoint,
        properties: &Map<String, Value>,
    ) -> Box<dyn Command>;

    /// Retrieval command over this class, optionally filtered
    fn query_command(&self, filter: Option<&str>) -> Box<dyn Command>;
}

/// An edge endpoint: a batch variable or a record id known up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Variable(BatchVariable),
    Id(String),
}

impl Endpoint {
    /// Render to dialect text (`$var` or a record id)
    pub fn render(&self) -> String {
        match self {
            Endpoint::Variable(variable) => variable.reference(),
            Endpoint::Id(id) => id.clone(),
        }
    }
}

impl From<BatchVariable> for Endpoint {
    fn from(variable: BatchVariable) -> Self {
        Endpoint::Variable(variable)
    }
}

impl From<&BatchVariable> for Endpoint {
    fn from(variable: &BatchVariable) -> Self {
        Endpoint::Variable(variable.clone())
    }
}

/// Source of a class's command factory
///
/// A descriptor either carries a broker directly or defers to the
/// element class, which resolves one on demand.
#[derive(Clone)]
pub enum FactorySource {
    Broker(Arc<dyn CommandFactory>),
    ElementClass(Arc<dyn ElementClass>),
}

/// A registered element class that can resolve its own factory
pub trait ElementClass: Send + Sync {
    fn factory(&self) -> Arc<dyn CommandFactory>;
}

/// Descriptor for one registered class
#[derive(Clone)]
pub struct ClassDescriptor {
    kind: ElementKind,
    source: FactorySource,
}

impl ClassDescriptor {
    pub fn with_broker(kind: ElementKind, broker: Arc<dyn CommandFactory>) -> Self {
        ClassDescriptor {
            kind,
            source: FactorySource::Broker(broker),
        }
    }

    pub fn with_element_class(kind: ElementKind, element: Arc<dyn ElementClass>) -> Self {
        ClassDescriptor {
            kind,
            source: FactorySource::ElementClass(element),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Resolve the command factory for this class
    pub fn factory(&self) -> Arc<dyn CommandFactory> {
        match &self.source {
            FactorySource::Broker(broker) => Arc::clone(broker),
            FactorySource::ElementClass(element) => element.factory(),
        }
    }
}

/// Enumerable mapping from class name to descriptor
#[derive(Default, Clone)]
pub struct Registry {
    classes: BTreeMap<String, ClassDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register(&mut self, name: impl Into<String>, descriptor: ClassDescriptor) {
        self.classes.insert(name.into(), descriptor);
    }

    pub fn lookup(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassDescriptor)> {
        self.classes
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }
}

/// Per-class command factory exposed on a batch
///
/// Thin adapter around the descriptor's resolved factory, named after
/// the commands it produces.
#[derive(Clone)]
pub struct BatchFactory {
    name: String,
    kind: ElementKind,
    factory: Arc<dyn CommandFactory>,
}

impl BatchFactory {
    pub(crate) fn new(name: &str, descriptor: &ClassDescriptor) -> Self {
        BatchFactory {
            name: name.to_string(),
            kind: descriptor.kind(),
            factory: descriptor.factory(),
        }
    }

    /// Class name this factory serves
    pub fn class_name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn create_vertex_command(&self, properties: &Map<String, Value>) -> Box<dyn Command> {
        self.factory.create_vertex_command(properties)
    }

    pub fn create_edge_command(
        &self,
        from: impl Into<Endpoint>,
        to: impl Into<Endpoint>,
        properties: &Map<String, Value>,
    ) -> Box<dyn Command> {
        self.factory
            .create_edge_command(&from.into(), &to.into(), properties)
    }

    pub fn query_command(&self, filter: Option<&str>) -> Box<dyn Command> {
        self.factory.query_command(filter)
    }
}

/// Edge-creation helper anchored on a vertex variable
///
/// Obtained from [`BatchVariable::vector`]; `to` and `from_origin`
/// produce the edge command through the edge class's factory.
pub struct VertexVector {
    origin: BatchVariable,
    factory: Arc<dyn CommandFactory>,
    properties: Map<String, Value>,
}

impl VertexVector {
    /// Attach edge properties
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Edge from the anchored vertex to `target`
    pub fn to(&self, target: impl Into<Endpoint>) -> Box<dyn Command> {
        self.factory.create_edge_command(
            &Endpoint::Variable(self.origin.clone()),
            &target.into(),
            &self.properties,
        )
    }

    /// Edge from `origin` to the anchored vertex
    ///
    /// Convenient when the origin vertex was created outside the batch.
    pub fn from_origin(&self, origin: impl Into<Endpoint>) -> Box<dyn Command> {
        self.factory.create_edge_command(
            &origin.into(),
            &Endpoint::Variable(self.origin.clone()),
            &self.properties,
        )
    }
}

impl BatchVariable {
    /// Anchor an edge-creation helper on this vertex variable
    ///
    /// Returns `None` unless this variable is vertex-kind and the
    /// descriptor declares an edge class.
    pub fn vector(&self, edge_class: &ClassDescriptor) -> Option<VertexVector> {
        if self.kind() != VariableKind::Vertex || edge_class.kind() != ElementKind::Edge {
            return None;
        }
        Some(VertexVector {
            origin: self.clone(),
            factory: edge_class.factory(),
            properties: Map::new(),
        })
    }
}

/// Stock factory rendering standard creation and retrieval commands for
/// a named class
#[derive(Debug, Clone)]
pub struct ClassCommandFactory {
    class_name: String,
}

impl ClassCommandFactory {
    pub fn new(class_name: impl Into<String>) -> Self {
        ClassCommandFactory {
            class_name: class_name.into(),
        }
    }

    fn render_set(properties: &Map<String, Value>) -> String {
        let assignments: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("{} = {}", key, render_literal(value)))
            .collect();
        assignments.join(", ")
    }
}

impl CommandFactory for ClassCommandFactory {
    fn create_vertex_command(&self, properties: &Map<String, Value>) -> Box<dyn Command> {
        let text = if properties.is_empty() {
            format!("CREATE VERTEX {}", self.class_name)
        } else {
            format!(
                "CREATE VERTEX {} SET {}",
                self.class_name,
                Self::render_set(properties)
            )
        };
        Box::new(ScriptCommand::create_vertex(text))
    }

    fn create_edge_command(
        &self,
        from: &Endpoint,
        to: &Endpoint,
        properties: &Map<String, Value>,
    ) -> Box<dyn Command> {
        let mut text = format!(
            "CREATE EDGE {} FROM {} TO {}",
            self.class_name,
            from.render(),
            to.render()
        );
        if !properties.is_empty() {
            text.push_str(" SET ");
            text.push_str(&Self::render_set(properties));
        }
        Box::new(ScriptCommand::create_edge(text))
    }

    fn query_command(&self, filter: Option<&str>) -> Box<dyn Command> {
        let text = match filter {
            Some(filter) => format!("SELECT FROM {} WHERE {}", self.class_name, filter),
            None => format!("SELECT FROM {}", self.class_name),
        };
        Box::new(ScriptCommand::retrieval(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_descriptor() -> ClassDescriptor {
        ClassDescriptor::with_broker(
            ElementKind::Vertex,
            Arc::new(ClassCommandFactory::new("Person")),
        )
    }

    fn knows_descriptor() -> ClassDescriptor {
        ClassDescriptor::with_broker(
            ElementKind::Edge,
            Arc::new(ClassCommandFactory::new("Knows")),
        )
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = Registry::new();
        registry.register("person", person_descriptor());
        assert!(registry.lookup("person").is_some());
        assert!(registry.lookup("animal").is_none());
    }

    #[test]
    fn test_class_factory_commands() {
        let factory = ClassCommandFactory::new("Person");

        let mut props = Map::new();
        props.insert("name".to_string(), json!("Ada"));
        let vertex = factory.create_vertex_command(&props);
        assert_eq!(vertex.render(), "CREATE VERTEX Person SET name = 'Ada'");

        let query = factory.query_command(Some("name = 'Ada'"));
        assert_eq!(query.render(), "SELECT FROM Person WHERE name = 'Ada'");
    }

    #[test]
    fn test_vertex_vector_edge_commands() {
        let origin = BatchVariable::new("a", VariableKind::Vertex, "CREATE VERTEX Person");
        let target = BatchVariable::new("b", VariableKind::Vertex, "CREATE VERTEX Person");

        let vector = origin.vector(&knows_descriptor()).expect("edge vector");
        let edge = vector.to(&target);
        assert_eq!(edge.render(), "CREATE EDGE Knows FROM $a TO $b");

        let reversed = vector.from_origin(Endpoint::Id("#9:0".to_string()));
        assert_eq!(reversed.render(), "CREATE EDGE Knows FROM #9:0 TO $a");
    }

    #[test]
    fn test_vector_requires_vertex_and_edge_class() {
        let plain = BatchVariable::new("p", VariableKind::Plain, "'x'");
        assert!(plain.vector(&knows_descriptor()).is_none());

        let origin = BatchVariable::new("a", VariableKind::Vertex, "CREATE VERTEX Person");
        assert!(origin.vector(&person_descriptor()).is_none());
    }
}
