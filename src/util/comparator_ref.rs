use std::fmt;

type IsEqualFn<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync + 'static>;
type OnChangeFn = Box<dyn FnMut() + Send + 'static>;

/// Equality over optional handles: two absent handles are equal, absent and present are not,
/// otherwise `is_equal` decides.
pub fn nullable_equal<T, F>(left: Option<&T>, right: Option<&T>, is_equal: F) -> bool
where
    F: Fn(&T, &T) -> bool,
{
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => is_equal(left, right),
        _ => false,
    }
}

/// Picks the value a comparator ref should hold after seeing `value`.
///
/// Returns the previously stored value when the two are equivalent, otherwise `value`, along
/// with whether the stored value changed.
pub fn compare<T, F>(value: Option<T>, previous: Option<T>, is_equal: F) -> (Option<T>, bool)
where
    F: Fn(&T, &T) -> bool,
{
    if nullable_equal(value.as_ref(), previous.as_ref(), is_equal) {
        (previous, false)
    } else {
        (value, true)
    }
}

/// Holds the last non-equivalent reference a hook was given.
///
/// [`ComparatorRef::update`] is meant to run on every evaluation of the owning hook; the
/// `on_change` callback fires once per transition to a non-equivalent value and never on
/// construction.
pub struct ComparatorRef<T> {
    current: Option<T>,
    is_equal: IsEqualFn<T>,
    on_change: Option<OnChangeFn>,
}

impl<T> ComparatorRef<T> {
    pub fn new<F>(value: Option<T>, is_equal: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            current: value,
            is_equal: Box::new(is_equal),
            on_change: None,
        }
    }

    pub fn with_on_change<F>(mut self, on_change: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_change = Some(Box::new(on_change));
        self
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Feeds the latest value; returns `true` when it replaced the stored one.
    pub fn update(&mut self, value: Option<T>) -> bool {
        let previous = self.current.take();
        let (stored, changed) = compare(value, previous, |left, right| {
            (self.is_equal)(left, right)
        });
        self.current = stored;
        if changed {
            if let Some(on_change) = self.on_change.as_mut() {
                on_change();
            }
        }
        changed
    }
}

impl<T: fmt::Debug> fmt::Debug for ComparatorRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorRef")
            .field("current", &self.current)
            .finish()
    }
}
