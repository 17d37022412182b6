//! Resolved schema definitions.
//!
//! These are the already-loaded inputs of the binding layer: immutable once
//! built, and cheap to share behind an `Arc`.

use metabind_io::QName;

use crate::classify::MemberKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Scalar, attribute-like.
    Flag,
    /// Scalar content, optionally with flags.
    Field,
    /// Nested fields, assemblies and flags.
    Assembly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn is_multiple(self) -> bool {
        !matches!(self, MaxOccurs::Bounded(0 | 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlGroupAs {
    /// Items repeat inline under the parent.
    #[default]
    Ungrouped,
    /// Items are enclosed in a group element named after the group.
    Grouped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonGroupAs {
    None,
    /// Always an array.
    #[default]
    List,
    /// A lone item is written bare, several as an array.
    SingletonOrList,
    /// An object whose field names are the items' keys.
    Keyed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAs {
    pub name: String,
    /// Defaults to the property's namespace.
    pub namespace: Option<String>,
    pub xml: XmlGroupAs,
    pub json: JsonGroupAs,
}

impl GroupAs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            xml: XmlGroupAs::default(),
            json: JsonGroupAs::default(),
        }
    }

    pub fn grouped(mut self) -> Self {
        self.xml = XmlGroupAs::Grouped;
        self
    }

    pub fn json(mut self, json: JsonGroupAs) -> Self {
        self.json = json;
        self
    }

    pub fn keyed(self) -> Self {
        self.json(JsonGroupAs::Keyed)
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// An explicitly declared scalar adapter id.
    Adapter(String),
    /// A nested class, looked up among the registered definitions.
    Class(String),
}

impl ValueType {
    pub fn name(&self) -> &str {
        match self {
            ValueType::Adapter(id) | ValueType::Class(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub name: String,
    pub namespace: Option<String>,
    pub kind: PropertyKind,
    pub min_occurs: u32,
    pub max_occurs: Option<MaxOccurs>,
    pub group_as: Option<GroupAs>,
    pub value_type: ValueType,
    /// When false, and the adapter allows it, the value is written directly
    /// under the parent element instead of inside its own element.
    pub in_xml_wrapped: bool,
    /// Container the host declares for this property. Derived from the
    /// occurrence and grouping rules when absent.
    pub member: Option<MemberKind>,
}

impl PropertyDefinition {
    fn new(name: impl Into<String>, kind: PropertyKind, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind,
            min_occurs: 0,
            max_occurs: None,
            group_as: None,
            value_type,
            in_xml_wrapped: true,
            member: None,
        }
    }

    /// A string-valued flag.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Flag, ValueType::Adapter("string".to_string()))
    }

    /// A field whose value is the given scalar adapter.
    pub fn field(name: impl Into<String>, adapter: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Field, ValueType::Adapter(adapter.into()))
    }

    /// A field bound to a field class (scalar value plus flags).
    pub fn field_class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Field, ValueType::Class(class.into()))
    }

    pub fn assembly(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Assembly, ValueType::Class(class.into()))
    }

    pub fn adapter(mut self, adapter: impl Into<String>) -> Self {
        self.value_type = ValueType::Adapter(adapter.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn occurs(mut self, min: u32, max: MaxOccurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = Some(max);
        self
    }

    pub fn required(mut self) -> Self {
        self.min_occurs = self.min_occurs.max(1);
        self
    }

    pub fn group_as(mut self, group_as: GroupAs) -> Self {
        self.group_as = Some(group_as);
        self
    }

    pub fn unwrapped(mut self) -> Self {
        self.in_xml_wrapped = false;
        self
    }

    pub fn member(mut self, member: MemberKind) -> Self {
        self.member = Some(member);
        self
    }

    pub fn is_keyed(&self) -> bool {
        self.group_as
            .as_ref()
            .is_some_and(|g| g.json == JsonGroupAs::Keyed)
    }

    pub fn is_multiple(&self) -> bool {
        self.max_occurs.is_some_and(MaxOccurs::is_multiple)
    }

    pub fn json_group(&self) -> JsonGroupAs {
        self.group_as.as_ref().map_or(JsonGroupAs::None, |g| g.json)
    }

    /// The key/value field name: the group name for collections, else the
    /// property name.
    pub fn json_name(&self) -> &str {
        match &self.group_as {
            Some(group) if self.is_multiple() || self.is_keyed() => &group.name,
            _ => &self.name,
        }
    }

    /// Element (or attribute) name, inheriting `default_ns` when the
    /// property declares none. Flags never inherit.
    pub fn xml_name(&self, default_ns: Option<&str>) -> QName {
        let namespace = match self.kind {
            PropertyKind::Flag => self.namespace.clone(),
            _ => self
                .namespace
                .clone()
                .or_else(|| default_ns.map(str::to_string)),
        };
        QName {
            namespace,
            local_name: self.name.clone(),
        }
    }

    /// The group element name, for grouped collections only.
    pub fn xml_group_name(&self, default_ns: Option<&str>) -> Option<QName> {
        let group = self.group_as.as_ref()?;
        if group.xml != XmlGroupAs::Grouped || !(self.is_multiple() || self.is_keyed()) {
            return None;
        }
        let namespace = group
            .namespace
            .clone()
            .or_else(|| self.namespace.clone())
            .or_else(|| default_ns.map(str::to_string));
        Some(QName {
            namespace,
            local_name: group.name.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Field,
    Assembly,
}

/// How a field class labels its value in key/value documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JsonValueKey {
    /// The adapter's default key, e.g. `STRVALUE`.
    #[default]
    Default,
    Fixed(String),
    /// The named flag's value becomes the field name.
    Flag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValueDefinition {
    pub adapter: String,
    pub json_value_key: JsonValueKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub name: String,
    pub kind: ClassKind,
    pub namespace: Option<String>,
    /// Set on classes that may be a document root.
    pub root_name: Option<String>,
    pub flags: Vec<PropertyDefinition>,
    pub model: Vec<PropertyDefinition>,
    pub field_value: Option<FieldValueDefinition>,
    /// Flag whose value keys this class inside a keyed parent collection.
    pub json_key: Option<String>,
}

impl ClassDefinition {
    pub fn assembly(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Assembly,
            namespace: None,
            root_name: None,
            flags: Vec::new(),
            model: Vec::new(),
            field_value: None,
            json_key: None,
        }
    }

    pub fn field(name: impl Into<String>, adapter: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Field,
            field_value: Some(FieldValueDefinition {
                adapter: adapter.into(),
                json_value_key: JsonValueKey::Default,
            }),
            ..Self::assembly(name)
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn root(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = Some(root_name.into());
        self
    }

    pub fn with_flag(mut self, flag: PropertyDefinition) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.model.push(property);
        self
    }

    pub fn json_key(mut self, flag: impl Into<String>) -> Self {
        self.json_key = Some(flag.into());
        self
    }

    /// Set the value key of a field class; ignored on assemblies.
    pub fn json_value_key(mut self, key: JsonValueKey) -> Self {
        if let Some(value) = &mut self.field_value {
            value.json_value_key = key;
        }
        self
    }

    pub fn root_qname(&self) -> Option<QName> {
        self.root_name.as_ref().map(|root| QName {
            namespace: self.namespace.clone(),
            local_name: root.clone(),
        })
    }
}
