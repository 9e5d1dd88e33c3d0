use std::fmt::Display;

// the start and end offset of a node in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl Location {
    pub fn new(start: usize, end: usize) -> Location {
        Location { start, end }
    }

    // the smallest location covering both
    pub fn merge(&self, other: &Location) -> Location {
        Location::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        format!("[{}-{}]", self.start, self.end).fmt(f)
    }
}

#[derive(Debug, Clone)]
pub struct Located<T> {
    pub location: Location,
    pub data: T,
}

impl<T> Located<T> {
    pub fn new(location: Location, data: T) -> Located<T> {
        Located { location, data }
    }
}

/// An environment of bindings, looked up by De Bruijn index (0 is the most
/// recent binding). Extending copies, so older environments are never
/// disturbed by newer ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Env<A> {
    vec: Vec<A>,
}

impl<A> Env<A> {
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn get_index(&self, index: usize) -> &A {
        match self.vec.len().checked_sub(index + 1) {
            Some(level) => &self.vec[level],
            None => panic!("bad index in env!"),
        }
    }

    // iterate from the outermost binding to the innermost one
    pub fn iter(&self) -> std::slice::Iter<'_, A> {
        self.vec.iter()
    }

    pub fn map<B>(&self, f: impl FnMut(&A) -> B) -> Env<B> {
        Env {
            vec: self.vec.iter().map(f).collect(),
        }
    }
}

impl<A: Eq> Env<A> {
    // the index of the most recent binding equal to `a`
    pub fn find_index(&self, a: &A) -> Option<usize> {
        let level = self.vec.iter().rposition(|b| b.eq(a))?;
        Some(self.vec.len() - level - 1)
    }
}

impl<A: Clone> Env<A> {
    pub fn with(&self, a: A) -> Env<A> {
        let mut vec = self.vec.clone();
        vec.push(a);

        Env { vec }
    }
}

impl<A> Default for Env<A> {
    fn default() -> Self {
        Env { vec: vec![] }
    }
}

impl<A> FromIterator<A> for Env<A> {
    // bindings are given outermost first
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        Env {
            vec: iter.into_iter().collect(),
        }
    }
}
