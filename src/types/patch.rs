/// An update to a nullable field that keeps "leave unchanged" distinct from
/// "clear back to inherit".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// Applies the patch to `target`. Returns true if `target` was touched.
    pub fn apply(self, target: &mut Option<T>) -> bool {
        match self {
            Patch::Keep => false,
            Patch::Clear => {
                *target = None;
                true
            }
            Patch::Set(value) => {
                *target = Some(value);
                true
            }
        }
    }

    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// The value being set, if any.
    #[must_use]
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }

    /// Builds a patch from a CLI-style pair: a new value and a clear flag.
    /// The clear flag wins.
    #[must_use]
    pub fn from_flags(value: Option<T>, clear: bool) -> Self {
        match (value, clear) {
            (_, true) => Patch::Clear,
            (Some(v), false) => Patch::Set(v),
            (None, false) => Patch::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_leaves_value() {
        let mut v = Some(3);
        assert!(!Patch::Keep.apply(&mut v));
        assert_eq!(v, Some(3));
    }

    #[test]
    fn test_clear_and_set() {
        let mut v = Some(3);
        assert!(Patch::Clear.apply(&mut v));
        assert_eq!(v, None);
        assert!(Patch::Set(5).apply(&mut v));
        assert_eq!(v, Some(5));
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Patch::from_flags(Some(1), true), Patch::Clear);
        assert_eq!(Patch::from_flags(Some(1), false), Patch::Set(1));
        assert_eq!(Patch::<i32>::from_flags(None, false), Patch::Keep);
    }
}
