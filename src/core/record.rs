// ============================================================================
// spark-observe - Records
// Property names, element identity, and the change records we emit
// ============================================================================

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

// =============================================================================
// PROPERTY NAME
// =============================================================================

/// Shared, cheap-to-clone property name.
///
/// The empty name is the wildcard: a change event carrying it means
/// "something on this instance changed, re-read everything".
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyName(Rc<str>);

impl PropertyName {
    /// The wildcard name.
    pub fn wildcard() -> Self {
        Self(Rc::from(""))
    }

    /// Returns true for the empty (wildcard) name.
    pub fn is_wildcard(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a change event reporting `reported` concerns this property.
    ///
    /// Matches on exact equality, or when the event reported no name at all.
    pub fn matches(&self, reported: Option<&str>) -> bool {
        match reported {
            None | Some("") => true,
            Some(name) => name == &*self.0,
        }
    }
}

impl Deref for PropertyName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyName {
    fn from(name: &str) -> Self {
        Self(Rc::from(name))
    }
}

impl From<String> for PropertyName {
    fn from(name: String) -> Self {
        Self(Rc::from(name))
    }
}

impl From<Rc<str>> for PropertyName {
    fn from(name: Rc<str>) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for PropertyName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for PropertyName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

// =============================================================================
// ELEMENT IDENTITY
// =============================================================================

/// Identity of a shared element: the address of its `Rc` allocation.
///
/// Two value-equal elements in different allocations have different keys.
/// The key is only meaningful while some `Rc` to the element is alive, so
/// holders of a key must also hold the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementKey(usize);

impl ElementKey {
    pub fn of<T: ?Sized>(element: &Rc<T>) -> Self {
        Self(Rc::as_ptr(element) as *const () as usize)
    }
}

// =============================================================================
// CHANGE RECORD
// =============================================================================

/// One entry of the unified element property stream.
///
/// `value` is read through the accessor when the record is produced, never
/// taken from the raw change event.
pub struct ChangeRecord<T, V> {
    instance: Rc<T>,
    property_name: PropertyName,
    value: V,
}

impl<T, V> ChangeRecord<T, V> {
    pub(crate) fn new(instance: Rc<T>, property_name: PropertyName, value: V) -> Self {
        Self {
            instance,
            property_name,
            value,
        }
    }

    /// The element whose property changed.
    pub fn instance(&self) -> &Rc<T> {
        &self.instance
    }

    /// The tracked property name.
    pub fn property_name(&self) -> &PropertyName {
        &self.property_name
    }

    /// The property value at the moment the record was produced.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Whether this record concerns exactly `element` (by identity).
    pub fn is_for(&self, element: &Rc<T>) -> bool {
        Rc::ptr_eq(&self.instance, element)
    }

    pub fn into_parts(self) -> (Rc<T>, PropertyName, V) {
        (self.instance, self.property_name, self.value)
    }
}

impl<T, V: Clone> Clone for ChangeRecord<T, V> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            property_name: self.property_name.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: fmt::Debug, V: fmt::Debug> fmt::Debug for ChangeRecord<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRecord")
            .field("instance", &self.instance)
            .field("property_name", &self.property_name)
            .field("value", &self.value)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_everything() {
        let age = PropertyName::from("age");

        assert!(age.matches(Some("age")));
        assert!(age.matches(None));
        assert!(age.matches(Some("")));
        assert!(!age.matches(Some("name")));
        assert!(!age.matches(Some("Age")));
    }

    #[test]
    fn wildcard_name() {
        assert!(PropertyName::wildcard().is_wildcard());
        assert!(PropertyName::from(String::new()).is_wildcard());
        assert!(!PropertyName::from("age").is_wildcard());
    }

    #[test]
    fn element_key_is_identity_not_equality() {
        let a = Rc::new(10);
        let b = Rc::new(10);
        let a2 = a.clone();

        assert_eq!(*a, *b);
        assert_ne!(ElementKey::of(&a), ElementKey::of(&b));
        assert_eq!(ElementKey::of(&a), ElementKey::of(&a2));
    }

    #[test]
    fn record_accessors() {
        let p = Rc::new("alice");
        let record = ChangeRecord::new(p.clone(), PropertyName::from("age"), 10);

        assert!(record.is_for(&p));
        assert!(!record.is_for(&Rc::new("alice")));
        assert_eq!(record.property_name(), "age");
        assert_eq!(*record.value(), 10);

        let (instance, name, value) = record.into_parts();
        assert!(Rc::ptr_eq(&instance, &p));
        assert_eq!(name.as_str(), "age");
        assert_eq!(value, 10);
    }
}
