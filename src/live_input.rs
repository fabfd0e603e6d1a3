/// A text input validated as it is typed.
///
/// `text` is whatever the user last entered and is what gets displayed.
/// `value` is the last entry that parsed, and is the only thing computation
/// reads, so a half-typed entry never disturbs derived state.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveInput<T> {
    value: T,
    text: String,
}

impl<T> LiveInput<T> {
    pub fn new(value: T, text: impl Into<String>) -> Self {
        Self {
            value,
            text: text.into(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Store `text` verbatim; adopt the parsed value only if parsing succeeds.
    /// Returns whether the value was updated.
    pub fn edit<E>(
        &mut self,
        text: impl Into<String>,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> bool {
        let text = text.into();
        let accepted = match parse(text.as_str()) {
            Ok(value) => {
                self.value = value;
                true
            }
            Err(_) => false,
        };
        self.text = text;
        accepted
    }
}
