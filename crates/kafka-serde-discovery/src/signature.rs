//! Generic type signatures
//!
//! The structural form of a declared type as the index records it: a closed
//! set of variants that the classifier peels by recursive descent. The parser
//! accepts Java source-style signatures such as
//! `Publisher<Message<java.lang.Long>>`, `byte[]` or `? extends Foo`.
//!
//! Simple (undotted) names resolve through an [`Imports`] table. A simple
//! name that is neither a primitive, `void`, nor imported is a type variable.

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::names;
use std::collections::HashMap;
use std::fmt;

/// Java primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(Self::Boolean),
            "byte" => Some(Self::Byte),
            "char" => Some(Self::Char),
            "short" => Some(Self::Short),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

/// Bound of a wildcard type argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<TypeSignature>),
    Super(Box<TypeSignature>),
}

/// A declared (possibly generic) type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeSignature {
    Void,
    Primitive(Primitive),
    /// A raw or non-generic class, by binary name
    Class(String),
    Parameterized {
        raw: String,
        arguments: Vec<TypeSignature>,
    },
    Array(Box<TypeSignature>),
    Wildcard(WildcardBound),
    TypeVariable(String),
}

impl TypeSignature {
    pub fn class(name: impl Into<String>) -> Self {
        TypeSignature::Class(name.into())
    }

    pub fn parameterized(raw: impl Into<String>, arguments: Vec<TypeSignature>) -> Self {
        TypeSignature::Parameterized {
            raw: raw.into(),
            arguments,
        }
    }

    /// Parse a signature, resolving simple names through the default imports
    pub fn parse(signature: &str) -> DiscoveryResult<Self> {
        Self::parse_with(signature, &Imports::default())
    }

    pub fn parse_with(signature: &str, imports: &Imports) -> DiscoveryResult<Self> {
        SignatureParser::new(signature, imports).parse()
    }

    /// Class name for class and parameterized types
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            TypeSignature::Class(name) => Some(name),
            TypeSignature::Parameterized { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the raw class of this type is `name`
    pub fn is(&self, name: &str) -> bool {
        self.raw_name() == Some(name)
    }

    pub fn arguments(&self) -> &[TypeSignature] {
        match self {
            TypeSignature::Parameterized { arguments, .. } => arguments,
            _ => &[],
        }
    }

    pub fn argument(&self, index: usize) -> Option<&TypeSignature> {
        self.arguments().get(index)
    }

    /// Erased name used for payload lookups (`byte[]`, `long`, `java.util.List`).
    ///
    /// `None` for `void`, wildcards and type variables.
    pub fn erasure(&self) -> Option<String> {
        match self {
            TypeSignature::Class(name) => Some(name.clone()),
            TypeSignature::Parameterized { raw, .. } => Some(raw.clone()),
            TypeSignature::Primitive(p) => Some(p.keyword().to_string()),
            TypeSignature::Array(component) => component.erasure().map(|c| format!("{}[]", c)),
            TypeSignature::Void | TypeSignature::Wildcard(_) | TypeSignature::TypeVariable(_) => {
                None
            }
        }
    }

    /// Whether the type says nothing about a concrete payload
    pub fn is_unresolvable(&self) -> bool {
        match self {
            TypeSignature::Void
            | TypeSignature::TypeVariable(_)
            | TypeSignature::Wildcard(WildcardBound::Unbounded)
            | TypeSignature::Wildcard(WildcardBound::Super(_)) => true,
            TypeSignature::Wildcard(WildcardBound::Extends(bound)) => bound.is_unresolvable(),
            TypeSignature::Class(name) => name == names::OBJECT || name == names::VOID,
            _ => false,
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Void => write!(f, "void"),
            TypeSignature::Primitive(p) => write!(f, "{}", p.keyword()),
            TypeSignature::Class(name) => write!(f, "{}", name),
            TypeSignature::Parameterized { raw, arguments } => {
                write!(f, "{}<", raw)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ">")
            }
            TypeSignature::Array(component) => write!(f, "{}[]", component),
            TypeSignature::Wildcard(WildcardBound::Unbounded) => write!(f, "?"),
            TypeSignature::Wildcard(WildcardBound::Extends(bound)) => {
                write!(f, "? extends {}", bound)
            }
            TypeSignature::Wildcard(WildcardBound::Super(bound)) => write!(f, "? super {}", bound),
            TypeSignature::TypeVariable(name) => write!(f, "{}", name),
        }
    }
}

impl std::str::FromStr for TypeSignature {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeSignature::parse(s)
    }
}

/// Simple name → binary name table used while parsing
#[derive(Debug, Clone)]
pub struct Imports {
    names: HashMap<String, String>,
}

impl Default for Imports {
    fn default() -> Self {
        Self {
            names: names::DEFAULT_IMPORTS
                .iter()
                .map(|(simple, full)| (simple.to_string(), full.to_string()))
                .collect(),
        }
    }
}

impl Imports {
    /// An empty table: every simple name is a type variable
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Import a class under an explicit simple name
    pub fn with(mut self, simple: impl Into<String>, full: impl Into<String>) -> Self {
        self.insert(simple, full);
        self
    }

    pub fn insert(&mut self, simple: impl Into<String>, full: impl Into<String>) {
        self.names.insert(simple.into(), full.into());
    }

    /// Import a class under its own simple name
    pub fn import(&mut self, full: &str) {
        self.insert(names::simple_name(full), full);
    }

    pub fn resolve(&self, simple: &str) -> Option<&str> {
        self.names.get(simple).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(s, f)| (s.as_str(), f.as_str()))
    }
}

/// Type arguments and wildcard bounds nest at most this deep
const MAX_NESTING_DEPTH: usize = 128;

struct SignatureParser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    depth: usize,
    imports: &'a Imports,
}

impl<'a> SignatureParser<'a> {
    fn new(source: &'a str, imports: &'a Imports) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            depth: 0,
            imports,
        }
    }

    fn parse(mut self) -> DiscoveryResult<TypeSignature> {
        let signature = self.parse_type()?;
        self.skip_whitespace();
        if !self.at_end() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(signature)
    }

    fn parse_type(&mut self) -> DiscoveryResult<TypeSignature> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("type nesting too deep"));
        }
        self.depth += 1;
        let signature = self.parse_component();
        self.depth -= 1;
        signature
    }

    fn parse_component(&mut self) -> DiscoveryResult<TypeSignature> {
        self.skip_whitespace();
        if self.eat('?') {
            return self.parse_wildcard();
        }

        let name = self.parse_qualified_name()?;
        self.skip_whitespace();

        let mut signature = if self.peek() == Some('<') {
            self.pos += 1;
            let arguments = self.parse_arguments()?;
            let raw = self.resolve_class(&name);
            if name == "void" || Primitive::from_keyword(&name).is_some() {
                return Err(self.error(format!("'{}' cannot take type arguments", name)));
            }
            TypeSignature::Parameterized { raw, arguments }
        } else if name == "void" {
            TypeSignature::Void
        } else if let Some(primitive) = Primitive::from_keyword(&name) {
            TypeSignature::Primitive(primitive)
        } else if name.contains('.') {
            TypeSignature::Class(name)
        } else {
            match self.imports.resolve(&name) {
                Some(full) => TypeSignature::Class(full.to_string()),
                None => TypeSignature::TypeVariable(name),
            }
        };

        loop {
            self.skip_whitespace();
            if !self.eat('[') {
                break;
            }
            self.skip_whitespace();
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            if signature == TypeSignature::Void {
                return Err(self.error("'void' cannot be an array component"));
            }
            signature = TypeSignature::Array(Box::new(signature));
        }

        Ok(signature)
    }

    fn parse_wildcard(&mut self) -> DiscoveryResult<TypeSignature> {
        self.skip_whitespace();
        let checkpoint = self.pos;
        if self.peek().is_some_and(is_identifier_start) {
            let keyword = self.parse_identifier()?;
            match keyword.as_str() {
                "extends" => {
                    let bound = self.parse_type()?;
                    return Ok(TypeSignature::Wildcard(WildcardBound::Extends(Box::new(
                        bound,
                    ))));
                }
                "super" => {
                    let bound = self.parse_type()?;
                    return Ok(TypeSignature::Wildcard(WildcardBound::Super(Box::new(bound))));
                }
                _ => self.pos = checkpoint,
            }
        }
        Ok(TypeSignature::Wildcard(WildcardBound::Unbounded))
    }

    fn parse_arguments(&mut self) -> DiscoveryResult<Vec<TypeSignature>> {
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_type()?);
            self.skip_whitespace();
            match self.next() {
                Some(',') => continue,
                Some('>') => return Ok(arguments),
                Some(c) => return Err(self.error(format!("expected ',' or '>', found '{}'", c))),
                None => return Err(self.error("unexpected end of input")),
            }
        }
    }

    fn parse_qualified_name(&mut self) -> DiscoveryResult<String> {
        let mut name = self.parse_identifier()?;
        while self.peek() == Some('.') {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.parse_identifier()?);
        }
        Ok(name)
    }

    fn parse_identifier(&mut self) -> DiscoveryResult<String> {
        match self.peek() {
            Some(c) if is_identifier_start(c) => {}
            Some(c) => return Err(self.error(format!("unexpected character '{}'", c))),
            None => return Err(self.error("unexpected end of input")),
        }
        let mut identifier = String::new();
        while let Some(c) = self.peek().filter(|c| is_identifier_part(*c)) {
            identifier.push(c);
            self.pos += 1;
        }
        Ok(identifier)
    }

    fn resolve_class(&self, name: &str) -> String {
        if name.contains('.') {
            return name.to_string();
        }
        self.imports
            .resolve(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source.len())
    }

    fn error(&self, reason: impl Into<String>) -> DiscoveryError {
        DiscoveryError::signature(self.source, self.offset(), reason)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
