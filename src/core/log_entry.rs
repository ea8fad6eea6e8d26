//! Log call descriptor and message conversion

use super::log_context::Fields;
use super::log_level::LogLevel;
use serde_json::Value;

/// One emission travelling through the assembly pipeline.
///
/// Built fresh for every call and consumed by `LogLayer::format_log`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogCall {
    pub level: LogLevel,
    pub messages: Vec<Value>,
    pub data: Option<Fields>,
}

impl LogCall {
    pub fn new(level: LogLevel, messages: Vec<Value>) -> Self {
        Self {
            level,
            messages,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Option<Fields>) -> Self {
        self.data = data;
        self
    }
}

/// Conversion into the positional message list of a log call
///
/// # Example
///
/// ```
/// use rust_log_layer::IntoMessages;
/// use serde_json::json;
///
/// assert_eq!("hello".into_messages(), vec![json!("hello")]);
/// assert_eq!(("retry", 3).into_messages(), vec![json!("retry"), json!(3)]);
/// assert!(().into_messages().is_empty());
/// ```
pub trait IntoMessages {
    fn into_messages(self) -> Vec<Value>;
}

impl IntoMessages for () {
    fn into_messages(self) -> Vec<Value> {
        Vec::new()
    }
}

impl IntoMessages for &str {
    fn into_messages(self) -> Vec<Value> {
        vec![Value::String(self.to_string())]
    }
}

impl IntoMessages for String {
    fn into_messages(self) -> Vec<Value> {
        vec![Value::String(self)]
    }
}

impl IntoMessages for &String {
    fn into_messages(self) -> Vec<Value> {
        vec![Value::String(self.clone())]
    }
}

impl IntoMessages for Value {
    fn into_messages(self) -> Vec<Value> {
        vec![self]
    }
}

impl IntoMessages for Vec<Value> {
    fn into_messages(self) -> Vec<Value> {
        self
    }
}

impl<const N: usize> IntoMessages for [Value; N] {
    fn into_messages(self) -> Vec<Value> {
        self.into_iter().collect()
    }
}

macro_rules! impl_into_messages_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> IntoMessages for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_messages(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_messages_for_tuple!(A);
impl_into_messages_for_tuple!(A, B);
impl_into_messages_for_tuple!(A, B, C);
impl_into_messages_for_tuple!(A, B, C, D);

/// Prepend `prefix` to the first message when that message is a string
pub(crate) fn apply_prefix(prefix: &str, messages: &mut [Value]) {
    if prefix.is_empty() {
        return;
    }

    if let Some(Value::String(first)) = messages.first_mut() {
        *first = format!("{} {}", prefix, first);
    }
}
