#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_observe::{
    ChangeRecord, CollectionChange, EventSource, NotifyPropertyChanged, ObservableCollection,
    PropertyChanged, PropertyChangedSource,
};

pub struct Person {
    pub name: &'static str,
    age: Cell<u32>,
    changed: PropertyChangedSource,
    brittle: bool,
}

impl Person {
    pub fn new(name: &'static str, age: u32) -> Person {
        Person {
            name,
            age: Cell::new(age),
            changed: PropertyChangedSource::new(),
            brittle: false,
        }
    }

    pub fn shared(name: &'static str, age: u32) -> Rc<Person> {
        Rc::new(Person::new(name, age))
    }

    /// A person whose destructor panics.
    pub fn brittle(name: &'static str, age: u32) -> Rc<Person> {
        Rc::new(Person {
            name,
            age: Cell::new(age),
            changed: PropertyChangedSource::new(),
            brittle: true,
        })
    }

    pub fn age(&self) -> u32 {
        self.age.get()
    }

    pub fn aging(&self) {
        self.age.set(self.age.get() + 1);
        self.changed.notify("age");
    }

    /// Change the age and announce a wildcard instead of the name.
    pub fn set_age_quietly(&self, age: u32) {
        self.age.set(age);
        self.changed.notify_all();
    }

    pub fn listeners(&self) -> usize {
        self.changed.listener_count()
    }
}

impl Drop for Person {
    fn drop(&mut self) {
        if self.brittle && !std::thread::panicking() {
            panic!("{} could not be released", self.name);
        }
    }
}

impl NotifyPropertyChanged for Person {
    fn property_changed(&self) -> &EventSource<PropertyChanged> {
        self.changed.source()
    }
}

pub type Log = Rc<RefCell<Vec<(&'static str, u32)>>>;

pub fn logger(log: &Log) -> impl Fn(ChangeRecord<Person, u32>) + 'static {
    let log = log.clone();
    move |record| log.borrow_mut().push((record.instance().name, *record.value()))
}

/// A collection that lets tests raise arbitrary (even inconsistent) events.
#[derive(Default)]
pub struct ScriptedCollection {
    pub items: RefCell<Vec<Rc<Person>>>,
    changed: EventSource<CollectionChange<Person>>,
}

impl ScriptedCollection {
    pub fn with(items: Vec<Rc<Person>>) -> Rc<Self> {
        Rc::new(Self {
            items: RefCell::new(items),
            changed: EventSource::new(),
        })
    }

    pub fn raise(&self, change: CollectionChange<Person>) {
        self.changed.emit(&change);
    }

    pub fn hooks(&self) -> usize {
        self.changed.len()
    }
}

impl ObservableCollection for ScriptedCollection {
    type Item = Person;

    fn snapshot(&self) -> Vec<Rc<Person>> {
        self.items.borrow().clone()
    }

    fn collection_changed(&self) -> &EventSource<CollectionChange<Person>> {
        &self.changed
    }
}
