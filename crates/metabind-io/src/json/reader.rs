use serde_json::{Number, Value};

use super::{describe, JsonError, JsonToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    Start,
    Key,
    Value,
    AfterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    Start,
    Value,
    AfterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object(ObjectState),
    Array(ArrayState),
}

/// Pull-based JSON tokenizer with one token of lookahead.
pub struct JsonReader<'i> {
    data: &'i [u8],
    x: usize,
    stack: Vec<Frame>,
    root_done: bool,
    peeked: Option<(Option<JsonToken>, usize)>,
}

impl<'i> JsonReader<'i> {
    pub fn new(input: &'i str) -> Self {
        Self {
            data: input.as_bytes(),
            x: 0,
            stack: Vec::new(),
            root_done: false,
            peeked: None,
        }
    }

    /// Byte offset of the upcoming token.
    pub fn position(&self) -> usize {
        match &self.peeked {
            Some((_, position)) => *position,
            None => self.x,
        }
    }

    pub fn peek(&mut self) -> Result<Option<&JsonToken>, JsonError> {
        if self.peeked.is_none() {
            self.skip_whitespace();
            let position = self.x;
            let token = self.read_token()?;
            self.peeked = Some((token, position));
        }
        Ok(self.peeked.as_ref().and_then(|(token, _)| token.as_ref()))
    }

    pub fn next_token(&mut self) -> Result<Option<JsonToken>, JsonError> {
        if let Some((token, _)) = self.peeked.take() {
            return Ok(token);
        }
        self.skip_whitespace();
        self.read_token()
    }

    /// The upcoming field name, if the next token is one.
    pub fn peek_field_name(&mut self) -> Result<Option<&str>, JsonError> {
        Ok(match self.peek()? {
            Some(JsonToken::FieldName(name)) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn is_start_object(&mut self) -> Result<bool, JsonError> {
        Ok(matches!(self.peek()?, Some(JsonToken::StartObject)))
    }

    pub fn is_start_array(&mut self) -> Result<bool, JsonError> {
        Ok(matches!(self.peek()?, Some(JsonToken::StartArray)))
    }

    pub fn is_end_object(&mut self) -> Result<bool, JsonError> {
        Ok(matches!(self.peek()?, Some(JsonToken::EndObject)))
    }

    pub fn is_end_array(&mut self) -> Result<bool, JsonError> {
        Ok(matches!(self.peek()?, Some(JsonToken::EndArray)))
    }

    pub fn is_scalar(&mut self) -> Result<bool, JsonError> {
        Ok(matches!(self.peek()?, Some(JsonToken::Scalar(_))))
    }

    pub fn expect_start_object(&mut self) -> Result<(), JsonError> {
        self.expect(&JsonToken::StartObject, "`{`")
    }

    pub fn expect_end_object(&mut self) -> Result<(), JsonError> {
        self.expect(&JsonToken::EndObject, "`}`")
    }

    pub fn expect_start_array(&mut self) -> Result<(), JsonError> {
        self.expect(&JsonToken::StartArray, "`[`")
    }

    pub fn expect_end_array(&mut self) -> Result<(), JsonError> {
        self.expect(&JsonToken::EndArray, "`]`")
    }

    pub fn expect_field_name(&mut self) -> Result<String, JsonError> {
        self.peek()?;
        let position = self.position();
        match self.next_token()? {
            Some(JsonToken::FieldName(name)) => Ok(name),
            other => Err(JsonError::UnexpectedToken {
                expected: "field name".to_string(),
                found: describe(other.as_ref()),
                position,
            }),
        }
    }

    pub fn expect_scalar(&mut self) -> Result<Value, JsonError> {
        self.peek()?;
        let position = self.position();
        match self.next_token()? {
            Some(JsonToken::Scalar(value)) => Ok(value),
            other => Err(JsonError::UnexpectedToken {
                expected: "scalar value".to_string(),
                found: describe(other.as_ref()),
                position,
            }),
        }
    }

    /// Consume one complete value (scalar, object or array).
    pub fn skip_value(&mut self) -> Result<(), JsonError> {
        let mut depth = 0usize;
        loop {
            self.peek()?;
            let position = self.position();
            match self.next_token()? {
                None => return Err(JsonError::UnexpectedEnd),
                Some(JsonToken::StartObject | JsonToken::StartArray) => depth += 1,
                Some(JsonToken::Scalar(_)) => {}
                Some(JsonToken::FieldName(_)) if depth > 0 => {}
                Some(token @ (JsonToken::EndObject | JsonToken::EndArray | JsonToken::FieldName(_))) => {
                    if depth == 0 {
                        return Err(JsonError::UnexpectedToken {
                            expected: "value".to_string(),
                            found: token.to_string(),
                            position,
                        });
                    }
                    depth -= 1;
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Require that no tokens remain.
    pub fn finish(&mut self) -> Result<(), JsonError> {
        self.peek()?;
        let position = self.position();
        match self.next_token()? {
            None => Ok(()),
            Some(token) => Err(JsonError::UnexpectedToken {
                expected: "end of input".to_string(),
                found: token.to_string(),
                position,
            }),
        }
    }

    fn expect(&mut self, wanted: &JsonToken, expected: &str) -> Result<(), JsonError> {
        self.peek()?;
        let position = self.position();
        match self.next_token()? {
            Some(token) if &token == wanted => Ok(()),
            other => Err(JsonError::UnexpectedToken {
                expected: expected.to_string(),
                found: describe(other.as_ref()),
                position,
            }),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.x < self.data.len() {
            match self.data[self.x] {
                b' ' | b'\t' | b'\n' | b'\r' => self.x += 1,
                _ => break,
            }
        }
    }

    fn byte(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    fn set_top(&mut self, frame: Frame) {
        if let Some(top) = self.stack.last_mut() {
            *top = frame;
        }
    }

    fn value_completed(&mut self) {
        match self.stack.last_mut() {
            Some(Frame::Object(state)) => *state = ObjectState::AfterValue,
            Some(Frame::Array(state)) => *state = ArrayState::AfterValue,
            None => self.root_done = true,
        }
    }

    fn close(&mut self, token: JsonToken) -> Option<JsonToken> {
        self.x += 1;
        self.stack.pop();
        self.value_completed();
        Some(token)
    }

    fn read_token(&mut self) -> Result<Option<JsonToken>, JsonError> {
        loop {
            self.skip_whitespace();
            let Some(frame) = self.stack.last().copied() else {
                if self.root_done {
                    if self.x < self.data.len() {
                        return Err(JsonError::Invalid(self.x));
                    }
                    return Ok(None);
                }
                return self.read_value().map(Some);
            };
            match frame {
                Frame::Object(ObjectState::Start) => {
                    if self.byte() == Some(b'}') {
                        return Ok(self.close(JsonToken::EndObject));
                    }
                    return self.read_key().map(Some);
                }
                Frame::Object(ObjectState::Key) => return self.read_key().map(Some),
                Frame::Object(ObjectState::Value) => return self.read_value().map(Some),
                Frame::Object(ObjectState::AfterValue) => match self.byte() {
                    Some(b',') => {
                        self.x += 1;
                        self.set_top(Frame::Object(ObjectState::Key));
                    }
                    Some(b'}') => return Ok(self.close(JsonToken::EndObject)),
                    Some(_) => return Err(JsonError::Invalid(self.x)),
                    None => return Err(JsonError::UnexpectedEnd),
                },
                Frame::Array(ArrayState::Start) => {
                    if self.byte() == Some(b']') {
                        return Ok(self.close(JsonToken::EndArray));
                    }
                    return self.read_value().map(Some);
                }
                Frame::Array(ArrayState::Value) => return self.read_value().map(Some),
                Frame::Array(ArrayState::AfterValue) => match self.byte() {
                    Some(b',') => {
                        self.x += 1;
                        self.set_top(Frame::Array(ArrayState::Value));
                    }
                    Some(b']') => return Ok(self.close(JsonToken::EndArray)),
                    Some(_) => return Err(JsonError::Invalid(self.x)),
                    None => return Err(JsonError::UnexpectedEnd),
                },
            }
        }
    }

    fn read_key(&mut self) -> Result<JsonToken, JsonError> {
        match self.byte() {
            Some(b'"') => {}
            Some(_) => return Err(JsonError::Invalid(self.x)),
            None => return Err(JsonError::UnexpectedEnd),
        }
        let name = self.read_str()?;
        self.skip_whitespace();
        match self.byte() {
            Some(b':') => self.x += 1,
            Some(_) => return Err(JsonError::Invalid(self.x)),
            None => return Err(JsonError::UnexpectedEnd),
        }
        self.set_top(Frame::Object(ObjectState::Value));
        Ok(JsonToken::FieldName(name))
    }

    fn read_value(&mut self) -> Result<JsonToken, JsonError> {
        let Some(ch) = self.byte() else {
            return Err(JsonError::UnexpectedEnd);
        };
        let value = match ch {
            b'{' => {
                self.x += 1;
                self.stack.push(Frame::Object(ObjectState::Start));
                return Ok(JsonToken::StartObject);
            }
            b'[' => {
                self.x += 1;
                self.stack.push(Frame::Array(ArrayState::Start));
                return Ok(JsonToken::StartArray);
            }
            b'"' => Value::String(self.read_str()?),
            b't' => self.read_literal(b"true", Value::Bool(true))?,
            b'f' => self.read_literal(b"false", Value::Bool(false))?,
            b'n' => self.read_literal(b"null", Value::Null)?,
            c if c.is_ascii_digit() || c == b'-' => Value::Number(self.read_num()?),
            _ => return Err(JsonError::Invalid(self.x)),
        };
        self.value_completed();
        Ok(JsonToken::Scalar(value))
    }

    fn read_literal(&mut self, literal: &[u8], value: Value) -> Result<Value, JsonError> {
        let end = self.x + literal.len();
        if end > self.data.len() || &self.data[self.x..end] != literal {
            return Err(JsonError::Invalid(self.x));
        }
        self.x = end;
        Ok(value)
    }

    fn read_num(&mut self) -> Result<Number, JsonError> {
        let start = self.x;
        let data = self.data;
        let len = data.len();
        let mut x = start;
        if x < len && data[x] == b'-' {
            x += 1;
        }
        while x < len && data[x].is_ascii_digit() {
            x += 1;
        }
        if x < len && data[x] == b'.' {
            x += 1;
            while x < len && data[x].is_ascii_digit() {
                x += 1;
            }
        }
        if x < len && (data[x] == b'e' || data[x] == b'E') {
            x += 1;
            if x < len && (data[x] == b'+' || data[x] == b'-') {
                x += 1;
            }
            while x < len && data[x].is_ascii_digit() {
                x += 1;
            }
        }
        let text = std::str::from_utf8(&data[start..x]).map_err(|_| JsonError::InvalidUtf8(start))?;
        let number = serde_json::from_str::<Number>(text).map_err(|_| JsonError::Invalid(start))?;
        self.x = x;
        Ok(number)
    }

    fn read_str(&mut self) -> Result<String, JsonError> {
        let start = self.x;
        self.x += 1; // opening quote
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let Some(ch) = self.byte() else {
                return Err(JsonError::UnexpectedEnd);
            };
            self.x += 1;
            match ch {
                b'"' => break,
                b'\\' => {
                    let Some(esc) = self.byte() else {
                        return Err(JsonError::UnexpectedEnd);
                    };
                    self.x += 1;
                    match esc {
                        b'"' => buf.push(b'"'),
                        b'\\' => buf.push(b'\\'),
                        b'/' => buf.push(b'/'),
                        b'b' => buf.push(0x08),
                        b'f' => buf.push(0x0c),
                        b'n' => buf.push(b'\n'),
                        b'r' => buf.push(b'\r'),
                        b't' => buf.push(b'\t'),
                        b'u' => {
                            let c = self.read_unicode_escape()?;
                            let mut tmp = [0u8; 4];
                            buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
                        }
                        _ => return Err(JsonError::Invalid(self.x - 1)),
                    }
                }
                c if c < 0x20 => return Err(JsonError::Invalid(self.x - 1)),
                c => buf.push(c),
            }
        }
        String::from_utf8(buf).map_err(|_| JsonError::InvalidUtf8(start))
    }

    /// Cursor is just past `\u`.
    fn read_unicode_escape(&mut self) -> Result<char, JsonError> {
        let hi = self.read_hex4()?;
        if (0xD800..0xDC00).contains(&hi) {
            if self.data.get(self.x) == Some(&b'\\') && self.data.get(self.x + 1) == Some(&b'u') {
                self.x += 2;
                let lo = self.read_hex4()?;
                if (0xDC00..0xE000).contains(&lo) {
                    let code = 0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00);
                    return char::from_u32(code).ok_or(JsonError::Invalid(self.x));
                }
            }
            return Err(JsonError::Invalid(self.x));
        }
        char::from_u32(hi).ok_or(JsonError::Invalid(self.x))
    }

    fn read_hex4(&mut self) -> Result<u32, JsonError> {
        let end = self.x + 4;
        if end > self.data.len() {
            return Err(JsonError::UnexpectedEnd);
        }
        let text = std::str::from_utf8(&self.data[self.x..end]).map_err(|_| JsonError::Invalid(self.x))?;
        let code = u32::from_str_radix(text, 16).map_err(|_| JsonError::Invalid(self.x))?;
        self.x = end;
        Ok(code)
    }
}
