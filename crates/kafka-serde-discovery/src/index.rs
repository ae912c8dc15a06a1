//! Type index
//!
//! Structural, pre-instantiation metadata about the application classes:
//! annotations, generic supertypes, methods and fields. Discovery only reads
//! it through the [`TypeIndex`] trait, so any indexer can stand behind it.
//! [`ClassIndex`] is the in-memory implementation used by the manifest loader
//! and the tests.

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::signature::{TypeSignature, WildcardBound};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// An annotation occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationInstance {
    /// Binary name of the annotation type
    pub name: String,
    /// The `value` member, when it is a string
    pub value: Option<String>,
    /// The `value` member, when it is an array of annotations (repeatable containers)
    pub nested: Vec<AnnotationInstance>,
}

impl AnnotationInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            nested: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_nested(mut self, nested: AnnotationInstance) -> Self {
        self.nested.push(nested);
        self
    }
}

/// Anything that can carry annotations
pub trait Annotated {
    fn annotations(&self) -> &[AnnotationInstance];

    fn annotation(&self, name: &str) -> Option<&AnnotationInstance> {
        self.annotations().iter().find(|a| a.name == name)
    }

    fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }
}

/// A method or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: Option<String>,
    pub signature: TypeSignature,
    pub annotations: Vec<AnnotationInstance>,
}

impl ParameterInfo {
    pub fn new(signature: TypeSignature) -> Self {
        Self {
            name: None,
            signature,
            annotations: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl Annotated for ParameterInfo {
    fn annotations(&self) -> &[AnnotationInstance] {
        &self.annotations
    }
}

/// A method declared by a class. Constructors are named `<init>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub return_type: TypeSignature,
    pub parameters: Vec<ParameterInfo>,
    pub annotations: Vec<AnnotationInstance>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, return_type: TypeSignature) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn constructor() -> Self {
        Self::new("<init>", TypeSignature::Void)
    }

    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl Annotated for MethodInfo {
    fn annotations(&self) -> &[AnnotationInstance] {
        &self.annotations
    }
}

/// A field declared by a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub signature: TypeSignature,
    pub annotations: Vec<AnnotationInstance>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, signature: TypeSignature) -> Self {
        Self {
            name: name.into(),
            signature,
            annotations: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl Annotated for FieldInfo {
    fn annotations(&self) -> &[AnnotationInstance] {
        &self.annotations
    }
}

/// Structural metadata of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Binary name (`com.acme.Outer$Inner`)
    pub name: String,
    /// Declared type parameters, in order
    pub type_parameters: Vec<String>,
    /// Generic superclass
    pub superclass: Option<TypeSignature>,
    /// Generic interfaces
    pub interfaces: Vec<TypeSignature>,
    pub annotations: Vec<AnnotationInstance>,
    pub methods: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_parameters: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn extends(mut self, superclass: TypeSignature) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeSignature) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    fn supertypes(&self) -> impl Iterator<Item = &TypeSignature> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}

impl Annotated for ClassInfo {
    fn annotations(&self) -> &[AnnotationInstance] {
        &self.annotations
    }
}

/// Where an annotation was found
#[derive(Debug, Clone, Copy)]
pub enum AnnotationTarget<'a> {
    Class(&'a ClassInfo),
    Method {
        class: &'a ClassInfo,
        method: &'a MethodInfo,
    },
    Field {
        class: &'a ClassInfo,
        field: &'a FieldInfo,
    },
    Parameter {
        class: &'a ClassInfo,
        method: &'a MethodInfo,
        position: usize,
    },
}

impl AnnotationTarget<'_> {
    pub fn class(&self) -> &ClassInfo {
        match self {
            AnnotationTarget::Class(class)
            | AnnotationTarget::Method { class, .. }
            | AnnotationTarget::Field { class, .. }
            | AnnotationTarget::Parameter { class, .. } => class,
        }
    }
}

impl fmt::Display for AnnotationTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationTarget::Class(class) => write!(f, "{}", class.name),
            AnnotationTarget::Method { class, method } => {
                write!(f, "{}#{}()", class.name, method.name)
            }
            AnnotationTarget::Field { class, field } => write!(f, "{}#{}", class.name, field.name),
            AnnotationTarget::Parameter {
                class,
                method,
                position,
            } => write!(f, "{}#{}()[{}]", class.name, method.name, position),
        }
    }
}

/// Read-only queries over the application classes
///
/// Implementors only provide lookup and iteration; hierarchy queries have
/// default implementations built on those two.
pub trait TypeIndex {
    fn class_by_name(&self, name: &str) -> Option<&ClassInfo>;

    fn classes(&self) -> Box<dyn Iterator<Item = &ClassInfo> + '_>;

    /// Every declaration annotated with `annotation`, in index order
    fn annotations(&self, annotation: &str) -> Vec<AnnotationTarget<'_>> {
        let mut targets = Vec::new();
        for class in self.classes() {
            if class.has_annotation(annotation) {
                targets.push(AnnotationTarget::Class(class));
            }
            for method in &class.methods {
                if method.has_annotation(annotation) {
                    targets.push(AnnotationTarget::Method { class, method });
                }
                for (position, parameter) in method.parameters.iter().enumerate() {
                    if parameter.has_annotation(annotation) {
                        targets.push(AnnotationTarget::Parameter {
                            class,
                            method,
                            position,
                        });
                    }
                }
            }
            for field in &class.fields {
                if field.has_annotation(annotation) {
                    targets.push(AnnotationTarget::Field { class, field });
                }
            }
        }
        targets
    }

    /// The supertype of `class` whose raw type is `base`, with the type
    /// arguments substituted along the way.
    ///
    /// For `class B extends A<Dto>` and `class A<T> extends Base<T>`,
    /// `generic_supertype(B, "Base")` is `Base<Dto>`.
    fn generic_supertype(&self, class: &ClassInfo, base: &str) -> Option<TypeSignature> {
        let mut visited = HashSet::new();
        find_supertype(self, class, &HashMap::new(), base, &mut visited)
    }

    fn is_subtype_of(&self, class: &ClassInfo, base: &str) -> bool {
        class.name != base && self.generic_supertype(class, base).is_some()
    }

    /// All classes in the index that extend or implement `base`, transitively
    fn known_subtypes(&self, base: &str) -> Vec<&ClassInfo> {
        self.classes()
            .filter(|class| self.is_subtype_of(class, base))
            .collect()
    }
}

fn find_supertype<I: TypeIndex + ?Sized>(
    index: &I,
    class: &ClassInfo,
    bindings: &HashMap<String, TypeSignature>,
    base: &str,
    visited: &mut HashSet<String>,
) -> Option<TypeSignature> {
    if !visited.insert(class.name.clone()) {
        return None;
    }

    for supertype in class.supertypes() {
        let bound = substitute(supertype, bindings);
        if bound.is(base) {
            return Some(bound);
        }

        let Some(parent) = bound.raw_name().and_then(|raw| index.class_by_name(raw)) else {
            continue;
        };
        let parent_bindings: HashMap<String, TypeSignature> = parent
            .type_parameters
            .iter()
            .cloned()
            .zip(bound.arguments().iter().cloned())
            .collect();
        if let Some(found) = find_supertype(index, parent, &parent_bindings, base, visited) {
            return Some(found);
        }
    }

    None
}

/// Replace type variables bound in `bindings`
fn substitute(signature: &TypeSignature, bindings: &HashMap<String, TypeSignature>) -> TypeSignature {
    match signature {
        TypeSignature::TypeVariable(name) => bindings
            .get(name)
            .cloned()
            .unwrap_or_else(|| signature.clone()),
        TypeSignature::Parameterized { raw, arguments } => TypeSignature::Parameterized {
            raw: raw.clone(),
            arguments: arguments.iter().map(|a| substitute(a, bindings)).collect(),
        },
        TypeSignature::Array(component) => {
            TypeSignature::Array(Box::new(substitute(component, bindings)))
        }
        TypeSignature::Wildcard(WildcardBound::Extends(bound)) => TypeSignature::Wildcard(
            WildcardBound::Extends(Box::new(substitute(bound, bindings))),
        ),
        TypeSignature::Wildcard(WildcardBound::Super(bound)) => TypeSignature::Wildcard(
            WildcardBound::Super(Box::new(substitute(bound, bindings))),
        ),
        other => other.clone(),
    }
}

/// In-memory index keyed by binary name
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    classes: BTreeMap<String, ClassInfo>,
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_classes(classes: impl IntoIterator<Item = ClassInfo>) -> DiscoveryResult<Self> {
        let mut index = Self::new();
        for class in classes {
            index.add(class)?;
        }
        Ok(index)
    }

    pub fn add(&mut self, class: ClassInfo) -> DiscoveryResult<()> {
        if self.classes.contains_key(&class.name) {
            return Err(DiscoveryError::DuplicateClass(class.name));
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeIndex for ClassIndex {
    fn class_by_name(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    fn classes(&self) -> Box<dyn Iterator<Item = &ClassInfo> + '_> {
        Box::new(self.classes.values())
    }
}
