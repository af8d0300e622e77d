//! Schema resolution: `$ref` lookup and `allOf`/`oneOf`/`anyOf` merging.
//!
//! Both operations are pure over the registry. Composition policy:
//!
//! - `allOf`: union of every member's properties and `required`.
//! - `oneOf`: only the **first** variant is used. Tool inputs are flat
//!   parameter sets, so only one shape can be exposed.
//! - `anyOf`: treated like `allOf`, since any listed field may be supplied.
//!
//! On property conflicts later members override earlier ones and the
//! composing schema's own properties win over all members.

use crate::schema::{ObjectFacets, Schema, SchemaKind, SchemaRegistry};
use tracing::{debug, warn};

const COMPONENTS_PREFIX: &str = "#/components/schemas/";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Registry name a `$ref` points at, if it is a local schema reference.
pub fn reference_name(reference: &str) -> Option<&str> {
    reference
        .strip_prefix(COMPONENTS_PREFIX)
        .or_else(|| reference.strip_prefix(DEFINITIONS_PREFIX))
}

/// Look up `reference` in the registry. Unknown or foreign pointers are `None`.
pub fn resolve_reference<'r>(reference: &str, registry: &'r SchemaRegistry) -> Option<&'r Schema> {
    SchemaResolver::new(registry).resolve_reference(reference)
}

/// Merge the composition operators of `schema` into one concrete schema.
///
/// Composition inside properties is left alone; callers descending into a
/// property must resolve it again.
pub fn resolve_composition(schema: &Schema, registry: &SchemaRegistry) -> Schema {
    SchemaResolver::new(registry).resolve_composition(schema, &mut ResolutionPath::default())
}

/// Names of the registry schemas currently being resolved on the active call
/// path. Re-entering one of them means the graph is cyclic.
#[derive(Debug, Default, Clone)]
pub struct ResolutionPath {
    names: Vec<String>,
}

impl ResolutionPath {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Push `name`; returns false (and pushes nothing) if it is already active.
    pub fn enter(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn leave(&mut self) {
        self.names.pop();
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }
}

/// Outcome of following a schema's own `$ref`.
#[derive(Debug, Clone, PartialEq)]
pub enum Dereferenced<'r> {
    /// No `$ref`; the schema itself
    Inline,
    /// The registry entry the pointer names
    Found { name: &'r str, schema: &'r Schema },
    /// Dangling or foreign pointer
    Missing,
    /// The named schema is already being resolved further up
    Cycle { name: &'r str },
}

/// Resolver bound to one document's schema registry.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> SchemaResolver<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve_reference(&self, reference: &str) -> Option<&'r Schema> {
        let schema = reference_name(reference).and_then(|name| self.registry.get(name));
        if schema.is_none() {
            debug!("Reference '{}' does not resolve", reference);
        }
        schema
    }

    /// Classify the `$ref` of `schema` against the active `path`.
    pub fn dereference(&self, schema: &Schema, path: &ResolutionPath) -> Dereferenced<'r> {
        let Some(reference) = schema.reference.as_deref() else {
            return Dereferenced::Inline;
        };
        let Some((name, target)) = reference_name(reference)
            .and_then(|name| self.registry.get_key_value(name))
        else {
            warn!("Unresolvable schema reference '{}'", reference);
            return Dereferenced::Missing;
        };
        if path.contains(name) {
            Dereferenced::Cycle { name: name.as_str() }
        } else {
            Dereferenced::Found {
                name: name.as_str(),
                schema: target,
            }
        }
    }

    /// Merge the composition operators of `schema`.
    ///
    /// Each member's `$ref` is followed and the member's own composition is
    /// merged first, so inheritance chains resolve fully. Members whose name
    /// is already on `path` contribute nothing.
    pub fn resolve_composition(&self, schema: &Schema, path: &mut ResolutionPath) -> Schema {
        if !schema.has_composition() {
            return schema.clone();
        }

        let members: Vec<&Schema> = schema
            .all_of
            .iter()
            .chain(schema.one_of.first())
            .chain(schema.any_of.iter())
            .collect();

        let mut resolved = Vec::with_capacity(members.len());
        for member in members {
            match self.dereference(member, path) {
                Dereferenced::Inline => resolved.push(self.resolve_composition(member, path)),
                Dereferenced::Found { name, schema: target } => {
                    path.enter(name);
                    resolved.push(self.resolve_composition(target, path));
                    path.leave();
                }
                Dereferenced::Missing => {}
                Dereferenced::Cycle { name } => {
                    debug!("Skipping recursive composition member '{}'", name);
                }
            }
        }

        merge(schema, &resolved)
    }

    /// Follow `schema`'s own `$ref` (entering it on `path`) and resolve the
    /// composition of the result. Returns the resolved schema and whether a
    /// name was entered, so the caller can `leave` after descending.
    pub fn resolve(&self, schema: &Schema, path: &mut ResolutionPath) -> Resolved {
        match self.dereference(schema, path) {
            Dereferenced::Inline => Resolved::Schema {
                schema: self.resolve_composition(schema, path),
                entered: false,
            },
            Dereferenced::Found { name, schema: target } => {
                path.enter(name);
                let mut resolved = self.resolve_composition(target, path);
                overlay_annotations(&mut resolved, schema);
                Resolved::Schema {
                    schema: resolved,
                    entered: true,
                }
            }
            Dereferenced::Missing => Resolved::Missing,
            Dereferenced::Cycle { name } => Resolved::Cycle {
                name: name.to_string(),
            },
        }
    }
}

/// Result of [`SchemaResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Schema { schema: Schema, entered: bool },
    Missing,
    Cycle { name: String },
}

/// A `$ref` sibling description (allowed in 3.1) overrides the target's.
fn overlay_annotations(resolved: &mut Schema, referrer: &Schema) {
    if referrer.description.is_some() {
        resolved.description = referrer.description.clone();
    }
}

fn merge(container: &Schema, members: &[Schema]) -> Schema {
    let mut merged = Schema {
        all_of: Vec::new(),
        one_of: Vec::new(),
        any_of: Vec::new(),
        ..container.clone()
    };

    if merged.kind.is_none() {
        merged.kind = members.iter().find_map(|m| m.kind.clone());
    }
    if merged.description.is_none() {
        merged.description = members.iter().find_map(|m| m.description.clone());
    }
    if merged.enum_values.is_empty() {
        if let Some(values) = members.iter().find(|m| !m.enum_values.is_empty()) {
            merged.enum_values = values.enum_values.clone();
        }
    }
    merged.nullable = container.nullable || members.iter().any(|m| m.nullable);

    let mut facets = ObjectFacets::default();
    for source in members.iter().chain(std::iter::once(container)) {
        if let Some(SchemaKind::Object(object)) = &source.kind {
            for (name, property) in &object.properties {
                facets.properties.insert(name.clone(), property.clone());
            }
            for name in &object.required {
                if !facets.required.contains(name) {
                    facets.required.push(name.clone());
                }
            }
            if object.additional_properties.is_some() {
                facets.additional_properties = object.additional_properties;
            }
        }
    }

    if let Some(SchemaKind::Object(object)) = &mut merged.kind {
        *object = facets;
    } else if merged.kind.is_none() && !facets.properties.is_empty() {
        merged.kind = Some(SchemaKind::Object(facets));
    }
    merged
}
