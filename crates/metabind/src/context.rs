//! The binding context: registered classes, adapters, options, and the
//! document-level entry points.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use metabind_io::markup::describe;
use metabind_io::QName;

use crate::adapter::{AdapterRegistry, ScalarAdapter};
use crate::binding::ClassBinding;
use crate::codec::{JsonReadContext, JsonWriteContext, MarkupReadContext, MarkupWriteContext};
use crate::definition::ClassDefinition;
use crate::error::{BindError, CodecError, DocumentError};
use crate::options::BindingOptions;
use crate::value::BoundObject;

/// Owns the class definitions and the cache of their bindings.
///
/// Bindings are created on first use and shared; the metadata each property
/// derives is computed once, however many threads read documents at the same
/// time.
#[derive(Debug, Default)]
pub struct BindingContext {
    adapters: AdapterRegistry,
    definitions: HashMap<String, Arc<ClassDefinition>>,
    bindings: RwLock<HashMap<String, Arc<ClassBinding>>>,
    options: BindingOptions,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BindingOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn with_class(mut self, definition: ClassDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ScalarAdapter>) -> Self {
        self.register_adapter(adapter);
        self
    }

    /// Register a class definition, replacing one with the same name.
    pub fn register(&mut self, definition: ClassDefinition) {
        self.definitions
            .insert(definition.name.clone(), Arc::new(definition));
        self.clear_bindings();
    }

    pub fn register_adapter(&mut self, adapter: Arc<dyn ScalarAdapter>) {
        self.adapters.register(adapter);
        self.clear_bindings();
    }

    fn clear_bindings(&mut self) {
        self.bindings
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn options(&self) -> &BindingOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut BindingOptions {
        &mut self.options
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub fn definition(&self, class: &str) -> Option<&Arc<ClassDefinition>> {
        self.definitions.get(class)
    }

    /// The shared binding of a registered class.
    pub fn class_binding(&self, class: &str) -> Result<Arc<ClassBinding>, BindError> {
        {
            let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(binding) = bindings.get(class) {
                return Ok(Arc::clone(binding));
            }
        }
        let definition = self
            .definitions
            .get(class)
            .ok_or_else(|| BindError::UnknownClass(class.to_string()))?;
        let binding = Arc::new(ClassBinding::new(Arc::clone(definition), &self.adapters)?);
        let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            bindings.entry(class.to_string()).or_insert(binding),
        ))
    }

    /// Bind every registered class and resolve every property, reporting the
    /// first configuration error.
    pub fn validate(&self) -> Result<(), BindError> {
        let mut names: Vec<&String> = self.definitions.keys().collect();
        names.sort();
        for name in names {
            let binding = self.class_binding(name)?;
            for property in binding.properties() {
                property.handler(self)?;
            }
        }
        Ok(())
    }

    pub fn new_instance(&self, class: &str) -> Result<BoundObject, BindError> {
        Ok(self.class_binding(class)?.new_instance())
    }

    fn root_binding(&self, class: &str) -> Result<(Arc<ClassBinding>, QName), BindError> {
        let binding = self.class_binding(class)?;
        let root = binding
            .definition()
            .root_qname()
            .ok_or_else(|| BindError::NotARoot(class.to_string()))?;
        Ok((binding, root))
    }

    /// Read a markup document whose root element is `class`'s root name.
    pub fn read_xml(&self, class: &str, input: &str) -> Result<BoundObject, CodecError> {
        let (binding, root) = self.root_binding(class)?;
        let mut ctx = MarkupReadContext::new(self, input);
        let start = ctx.reader().consume_start(&root)?;
        let object = binding.read_markup_body(&start, &mut ctx)?;
        ctx.reader().consume_end(&root)?;
        if !ctx.reader().is_eof()? {
            let reader = ctx.reader();
            let position = reader.position();
            let found = describe(reader.peek()?);
            return Err(DocumentError::UnexpectedContent {
                parent: "document".to_string(),
                found,
                position,
            }
            .into());
        }
        Ok(object)
    }

    pub fn write_xml(&self, object: &BoundObject) -> Result<String, CodecError> {
        let (binding, root) = self.root_binding(object.class_name())?;
        let mut ctx = MarkupWriteContext::new(self);
        if self.options.write.xml_declaration {
            ctx.writer().declaration()?;
        }
        binding.write_markup_element(object, &root, &mut ctx)?;
        ctx.finish()
    }

    /// Read a key/value document of the form `{"<root name>": {...}}`.
    pub fn read_json(&self, class: &str, input: &str) -> Result<BoundObject, CodecError> {
        let (binding, root) = self.root_binding(class)?;
        let mut ctx = JsonReadContext::new(self, input);
        ctx.reader().expect_start_object()?;
        let reader = ctx.reader();
        let position = reader.position();
        let name = reader.expect_field_name()?;
        if name != root.local_name {
            return Err(DocumentError::ExpectedField {
                expected: root.local_name,
                found: name,
                position,
            }
            .into());
        }
        let object = binding.read_json_object(None, &mut ctx)?;
        ctx.reader().expect_end_object()?;
        ctx.reader().finish()?;
        Ok(object)
    }

    pub fn write_json(&self, object: &BoundObject) -> Result<String, CodecError> {
        let (binding, root) = self.root_binding(object.class_name())?;
        let mut ctx = JsonWriteContext::new(self);
        ctx.writer().start_object()?;
        ctx.writer().field_name(&root.local_name)?;
        binding.write_json_object(object, false, &mut ctx)?;
        ctx.writer().end_object()?;
        ctx.finish()
    }

    pub fn deep_copy(&self, object: &BoundObject) -> Result<BoundObject, CodecError> {
        self.class_binding(object.class_name())?
            .deep_copy(object, self)
    }
}
