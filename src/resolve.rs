// resolve.rs
//
// Every optional setting goes through the same three states: it was given and
// checks out, it was given but is wrong, or it was never given. Each state maps
// to one action and none of them loops.

/// Outcome of checking a configured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Valid(T),
    Invalid(T),
    Absent,
}

impl<T> Resolution<T> {
    pub fn classify(configured: Option<T>, is_valid: impl FnOnce(&T) -> bool) -> Self {
        match configured {
            Some(value) if is_valid(&value) => Resolution::Valid(value),
            Some(value) => Resolution::Invalid(value),
            None => Resolution::Absent,
        }
    }

    /// Turns the resolution into a value: valid values are used as is, an
    /// invalid value goes through `recover` once, an absent one through `ask`.
    /// Whatever the two fallbacks return is trusted.
    pub fn resolve<C: ?Sized, E>(
        self,
        ctx: &mut C,
        recover: impl FnOnce(&mut C, T) -> Result<T, E>,
        ask: impl FnOnce(&mut C) -> Result<T, E>,
    ) -> Result<T, E> {
        match self {
            Resolution::Valid(value) => Ok(value),
            Resolution::Invalid(value) => recover(ctx, value),
            Resolution::Absent => ask(ctx),
        }
    }
}
