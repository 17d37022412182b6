use serde_json::Value;

use super::JsonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    kind: Container,
    count: usize,
}

/// Streaming JSON text writer.
///
/// Commas, separators and (optionally) indentation are inserted from the
/// container stack; callers only emit structure and leaves.
pub struct JsonWriter {
    out: String,
    indent: Option<usize>,
    stack: Vec<Frame>,
    after_name: bool,
    root_written: bool,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl JsonWriter {
    pub fn new(indent: Option<usize>) -> Self {
        Self {
            out: String::new(),
            indent,
            stack: Vec::new(),
            after_name: false,
            root_written: false,
        }
    }

    pub fn start_object(&mut self) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push('{');
        self.stack.push(Frame {
            kind: Container::Object,
            count: 0,
        });
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<(), JsonError> {
        self.close(Container::Object, '}')
    }

    pub fn start_array(&mut self) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push('[');
        self.stack.push(Frame {
            kind: Container::Array,
            count: 0,
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<(), JsonError> {
        self.close(Container::Array, ']')
    }

    pub fn field_name(&mut self, name: &str) -> Result<(), JsonError> {
        if self.after_name {
            return Err(JsonError::Write(format!("field {name:?} follows a field name")));
        }
        let count = match self.stack.last_mut() {
            Some(frame) if frame.kind == Container::Object => {
                frame.count += 1;
                frame.count
            }
            _ => return Err(JsonError::Write(format!("field {name:?} outside of an object"))),
        };
        if count > 1 {
            self.out.push(',');
        }
        self.newline(self.stack.len());
        self.push_string(name)?;
        self.out.push(':');
        if self.indent.is_some() {
            self.out.push(' ');
        }
        self.after_name = true;
        Ok(())
    }

    /// Write a scalar leaf. Containers inside `value` are written compactly.
    pub fn scalar(&mut self, value: &Value) -> Result<(), JsonError> {
        self.before_value()?;
        let text = serde_json::to_string(value).map_err(|e| JsonError::Write(e.to_string()))?;
        self.out.push_str(&text);
        Ok(())
    }

    pub fn finish(self) -> Result<String, JsonError> {
        if !self.stack.is_empty() || self.after_name {
            return Err(JsonError::Write("document left incomplete".to_string()));
        }
        Ok(self.out)
    }

    fn before_value(&mut self) -> Result<(), JsonError> {
        if self.after_name {
            self.after_name = false;
            return Ok(());
        }
        let depth = self.stack.len();
        match self.stack.last_mut() {
            Some(frame) if frame.kind == Container::Array => {
                frame.count += 1;
                if frame.count > 1 {
                    self.out.push(',');
                }
                self.newline(depth);
                Ok(())
            }
            Some(_) => Err(JsonError::Write("object member without a field name".to_string())),
            None if self.root_written => Err(JsonError::Write("more than one root value".to_string())),
            None => {
                self.root_written = true;
                Ok(())
            }
        }
    }

    fn close(&mut self, kind: Container, ch: char) -> Result<(), JsonError> {
        match self.stack.pop() {
            Some(frame) if frame.kind == kind && !self.after_name => {
                if frame.count > 0 {
                    self.newline(self.stack.len());
                }
                self.out.push(ch);
                Ok(())
            }
            _ => Err(JsonError::Write(format!("unbalanced `{ch}`"))),
        }
    }

    fn newline(&mut self, depth: usize) {
        if let Some(size) = self.indent {
            self.out.push('\n');
            for _ in 0..depth * size {
                self.out.push(' ');
            }
        }
    }

    fn push_string(&mut self, s: &str) -> Result<(), JsonError> {
        let text = serde_json::to_string(s).map_err(|e| JsonError::Write(e.to_string()))?;
        self.out.push_str(&text);
        Ok(())
    }
}
