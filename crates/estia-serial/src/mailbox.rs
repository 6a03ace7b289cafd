//! Single-slot mailbox for the latest decoded value.

/// Holds the most recent value together with a freshness flag.
///
/// [`Mailbox::put`] overwrites the value and marks it fresh; [`Mailbox::take`]
/// returns it and clears the flag in the same step.
#[derive(Debug, Clone, Default)]
pub struct Mailbox<T> {
    value: T,
    fresh: bool,
}

impl<T: Clone> Mailbox<T> {
    pub fn new(value: T) -> Self {
        Mailbox { value, fresh: false }
    }

    pub fn put(&mut self, value: T) {
        self.value = value;
        self.fresh = true;
    }

    /// Latest value and whether it is new, without clearing the flag.
    pub fn peek(&self) -> (&T, bool) {
        (&self.value, self.fresh)
    }

    /// Latest value and whether it was new; the flag is cleared.
    pub fn take(&mut self) -> (T, bool) {
        let fresh = std::mem::replace(&mut self.fresh, false);
        (self.value.clone(), fresh)
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_flag() {
        let mut mailbox = Mailbox::new(0u16);
        assert_eq!(mailbox.peek(), (&0, false));

        mailbox.put(7);
        assert_eq!(mailbox.peek(), (&7, true));
        assert_eq!(mailbox.peek(), (&7, true));

        assert_eq!(mailbox.take(), (7, true));
        assert_eq!(mailbox.take(), (7, false));
        assert!(!mailbox.is_fresh());
    }
}
