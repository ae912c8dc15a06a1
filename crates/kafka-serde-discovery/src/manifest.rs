//! Index manifests
//!
//! A YAML or JSON description of the application classes, loaded into a
//! [`ClassIndex`]. Types are written as Java source signatures and
//! annotations as `Name` or `Name(value)`:
//!
//! ```yaml
//! imports:
//!   - com.acme.Price
//! classes:
//!   - name: com.acme.PriceConsumer
//!     methods:
//!       - name: consume
//!         returns: void
//!         annotations: ["Incoming(prices)"]
//!         parameters:
//!           - type: Message<Price>
//!   - name: com.acme.Price
//!     annotations: [AvroGenerated]
//! ```
//!
//! Simple names resolve through the listed imports, the simple names of the
//! manifest's own classes, and the messaging defaults.

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::index::{AnnotationInstance, ClassIndex, ClassInfo, FieldInfo, MethodInfo, ParameterInfo};
use crate::signature::{Imports, TypeSignature};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// `Name`, `@Name` or `Name(value)`
static ANNOTATION_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"^@?([A-Za-z_$][\w.$]*)\s*(?:\(\s*"?([^"]*?)"?\s*\))?$"#)
        .expect("annotation regex pattern is invalid - this is a bug")
});

/// Root of a manifest file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Fully qualified names importable by simple name
    #[serde(default)]
    pub imports: Vec<String>,

    #[serde(default)]
    pub classes: Vec<ClassSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,

    #[serde(default)]
    pub type_parameters: Vec<String>,

    #[serde(default)]
    pub extends: Option<String>,

    #[serde(default)]
    pub implements: Vec<String>,

    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,

    #[serde(default)]
    pub methods: Vec<MethodSpec>,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,

    #[serde(default = "default_return_type")]
    pub returns: String,

    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,

    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,
}

fn default_return_type() -> String {
    "void".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub type_signature: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub type_signature: String,

    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,
}

/// An annotation, in short or structured form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationSpec {
    Short(String),
    Full {
        name: String,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        nested: Vec<AnnotationSpec>,
    },
}

impl IndexManifest {
    /// Load from a file; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: impl AsRef<Path>) -> DiscoveryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn from_yaml(content: &str) -> DiscoveryResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> DiscoveryResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Import table used for every signature in this manifest
    pub fn imports(&self) -> Imports {
        let mut imports = Imports::default();
        for class in &self.classes {
            imports.import(&class.name);
        }
        for import in &self.imports {
            imports.import(import);
        }
        imports
    }

    pub fn to_index(&self) -> DiscoveryResult<ClassIndex> {
        let imports = self.imports();
        let mut index = ClassIndex::new();
        for class in &self.classes {
            index.add(class.to_class_info(&imports)?)?;
        }
        Ok(index)
    }
}

impl ClassSpec {
    fn to_class_info(&self, imports: &Imports) -> DiscoveryResult<ClassInfo> {
        let context = |what: &str| format!("class {}: {}", self.name, what);
        let mut class = ClassInfo::new(&self.name);
        class.type_parameters = self.type_parameters.clone();

        let scoped = self.scoped_imports(imports);
        if let Some(extends) = &self.extends {
            class.superclass = Some(parse(extends, &scoped, || context("extends"))?);
        }
        for interface in &self.implements {
            class
                .interfaces
                .push(parse(interface, &scoped, || context("implements"))?);
        }
        class.annotations = annotations(&self.annotations, imports, || context("annotation"))?;

        for method in &self.methods {
            let at = |what: &str| context(&format!("method {}: {}", method.name, what));
            let mut info = MethodInfo::new(&method.name, parse(&method.returns, &scoped, || at("returns"))?);
            info.annotations = annotations(&method.annotations, imports, || at("annotation"))?;
            for (position, parameter) in method.parameters.iter().enumerate() {
                let describe = || at(&format!("parameter {}", position));
                let mut param = ParameterInfo::new(parse(&parameter.type_signature, &scoped, describe)?);
                param.name = parameter.name.clone();
                param.annotations = annotations(&parameter.annotations, imports, describe)?;
                info.parameters.push(param);
            }
            class.methods.push(info);
        }

        for field in &self.fields {
            let at = || context(&format!("field {}", field.name));
            let mut info = FieldInfo::new(&field.name, parse(&field.type_signature, &scoped, at)?);
            info.annotations = annotations(&field.annotations, imports, at)?;
            class.fields.push(info);
        }

        Ok(class)
    }

    /// Declared type parameters shadow imports of the same simple name
    fn scoped_imports(&self, imports: &Imports) -> Imports {
        if self.type_parameters.is_empty() {
            return imports.clone();
        }
        let mut scoped = Imports::empty();
        for (simple, full) in imports.entries() {
            if !self.type_parameters.iter().any(|p| p == simple) {
                scoped.insert(simple, full);
            }
        }
        scoped
    }
}

fn parse(
    signature: &str,
    imports: &Imports,
    context: impl FnOnce() -> String,
) -> DiscoveryResult<TypeSignature> {
    TypeSignature::parse_with(signature, imports)
        .map_err(|e| DiscoveryError::Manifest(format!("{}: {}", context(), e)))
}

fn annotations(
    specs: &[AnnotationSpec],
    imports: &Imports,
    context: impl Fn() -> String,
) -> DiscoveryResult<Vec<AnnotationInstance>> {
    specs
        .iter()
        .map(|spec| annotation(spec, imports, &context))
        .collect()
}

fn annotation(
    spec: &AnnotationSpec,
    imports: &Imports,
    context: &dyn Fn() -> String,
) -> DiscoveryResult<AnnotationInstance> {
    match spec {
        AnnotationSpec::Short(text) => {
            let captures = ANNOTATION_REGEX.captures(text.trim()).ok_or_else(|| {
                DiscoveryError::Manifest(format!("{}: malformed annotation '{}'", context(), text))
            })?;
            let mut instance = AnnotationInstance::new(resolve_annotation(&captures[1], imports));
            instance.value = captures.get(2).map(|m| m.as_str().to_string());
            Ok(instance)
        }
        AnnotationSpec::Full {
            name,
            value,
            nested,
        } => {
            let mut instance = AnnotationInstance::new(resolve_annotation(name, imports));
            instance.value = value.clone();
            for inner in nested {
                instance.nested.push(annotation(inner, imports, context)?);
            }
            Ok(instance)
        }
    }
}

fn resolve_annotation(name: &str, imports: &Imports) -> String {
    let name = name.trim().trim_start_matches('@');
    if name.contains('.') {
        return name.to_string();
    }
    imports.resolve(name).unwrap_or(name).to_string()
}
