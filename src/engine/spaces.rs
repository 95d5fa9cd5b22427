//! Gym-style space declarations handed to training harnesses.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrete {
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSpace {
    pub low: u8,
    pub high: u8,
    pub shape: Vec<usize>,
}

impl BoxSpace {
    pub fn new(low: u8, high: u8, shape: Vec<usize>) -> Self {
        Self { low, high, shape }
    }
}

/// Named sub-spaces, kept in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DictSpace {
    pub entries: Vec<(String, BoxSpace)>,
}

impl DictSpace {
    pub fn with(mut self, name: &str, space: BoxSpace) -> Self {
        self.entries.push((name.to_string(), space));
        self
    }

    pub fn get(&self, name: &str) -> Option<&BoxSpace> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, space)| space)
    }
}
